//! Media type detection by file extension.

/// Media type for a file extension (without the leading dot), if known.
pub fn media_type(extension: &str) -> Option<String> {
    mime_guess::from_ext(extension)
        .first()
        .map(|mime| mime.essence_str().to_string())
}
