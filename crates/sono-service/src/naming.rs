//! Resource name handling: extension split, copy and trash suffixes.

use chrono::Utc;

/// Split a file name into stem and extension.
///
/// A leading dot does not start an extension (`.env` has none) and an
/// empty extension (`notes.`) counts as none.
pub fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(index) if index > 0 && index + 1 < name.len() => {
            (&name[..index], Some(&name[index + 1..]))
        }
        _ => (name, None),
    }
}

/// Extension of a resource name. Directories never have one.
pub fn extension(name: &str, is_directory: bool) -> Option<String> {
    if is_directory {
        return None;
    }
    split_name(name).1.map(str::to_string)
}

/// Media type of a resource name. Directories never have one.
pub fn media_type(name: &str, is_directory: bool) -> Option<String> {
    extension(name, is_directory).and_then(|ext| sono_storage::media::media_type(&ext))
}

/// Insert `suffix` between stem and extension.
fn with_suffix(name: &str, is_directory: bool, suffix: &str) -> String {
    if is_directory {
        return format!("{name} {suffix}");
    }
    match split_name(name) {
        (stem, Some(ext)) => format!("{stem} {suffix}.{ext}"),
        (stem, None) => format!("{stem} {suffix}"),
    }
}

/// The `attempt`-th candidate name for a copy: `a copy.txt`, `a copy 2.txt`, ...
pub fn copy_name(name: &str, is_directory: bool, attempt: u32) -> String {
    if attempt <= 1 {
        with_suffix(name, is_directory, "copy")
    } else {
        with_suffix(name, is_directory, &format!("copy {attempt}"))
    }
}

/// Name used for an entry parked in the trash next to a same-named one.
pub fn trash_name(name: &str, is_directory: bool, nanos: i64) -> String {
    with_suffix(name, is_directory, &nanos.to_string())
}

/// Current time in nanoseconds since the Unix epoch.
pub fn timestamp_nanos() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000))
}
