//! Argument checks performed before any I/O.

use std::str::FromStr;

use sono_core::error::AppError;
use sono_core::result::AppResult;
use sono_core::types::IdError;

/// Longest accepted resource name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Longest accepted description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;

/// Parse a tagged identifier supplied for `field`.
pub fn id<T>(field: &str, value: &str) -> AppResult<T>
where
    T: FromStr<Err = IdError>,
{
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} cannot be empty")));
    }
    value
        .parse::<T>()
        .map_err(|_| AppError::validation(format!("{field} is incorrect")))
}

/// Check a resource name: 1 to 255 characters, a single path component.
pub fn name(field: &str, value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} cannot be empty")));
    }
    let length = value.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters (was {length})"
        )));
    }
    if value == "." || value == ".." || value.contains(['/', '\\', '\0']) {
        return Err(AppError::validation(format!("{field} is incorrect")));
    }
    Ok(())
}

/// Normalise a description: blank becomes `None`, long ones are rejected.
pub fn description(value: Option<String>) -> AppResult<Option<String>> {
    match value {
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => {
            let length = text.chars().count();
            if length > MAX_DESCRIPTION_LENGTH {
                return Err(AppError::validation(format!(
                    "description must be at most {MAX_DESCRIPTION_LENGTH} characters (was {length})"
                )));
            }
            Ok(Some(text))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sono_core::error::ErrorKind;
    use sono_core::types::{ParentRef, ResourceId, UserId};

    #[test]
    fn test_id_messages() {
        let err = id::<UserId>("user_id", "").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "user_id cannot be empty");

        let resource = ResourceId::new().to_string();
        let err = id::<UserId>("user_id", &resource).unwrap_err();
        assert_eq!(err.message, "user_id is incorrect");

        assert!(id::<ParentRef>("parent_id", &resource).is_ok());
        assert!(id::<ParentRef>("parent_id", &UserId::new().to_string()).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert!(name("name", "a.txt").is_ok());
        assert!(name("name", &"x".repeat(255)).is_ok());
        assert!(name("name", &"x".repeat(256)).is_err());
        assert!(name("name", "").is_err());
        assert!(name("name", "..").is_err());
        assert!(name("name", "a/b").is_err());
    }

    #[test]
    fn test_description_normalisation() {
        assert_eq!(description(None).unwrap(), None);
        assert_eq!(description(Some("   ".into())).unwrap(), None);
        assert_eq!(description(Some("hi".into())).unwrap(), Some("hi".into()));
        assert!(description(Some("d".repeat(1025))).is_err());
    }
}
