//! Input validation for account fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Invalid handle format.
    InvalidHandle(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Value too short.
    TooShort { field: String, min: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::TooShort { field, min, actual } => {
                write!(f, "{} is too short ({} chars, min {})", field, actual, min)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Password length bounds. The upper bound matches bcrypt's input limit.
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Display name length bounds.
pub const MIN_DISPLAY_NAME_LENGTH: usize = 2;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 60;

/// Handle length bounds.
pub const MIN_HANDLE_LENGTH: usize = 3;
pub const MAX_HANDLE_LENGTH: usize = 30;

/// Maximum allowed length for bios.
pub const MAX_BIO_LENGTH: usize = 160;

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before @
/// - Has at least one character after @
/// - Has at least one dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    // Basic format check: local@domain.tld
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain cannot start or end with a dot".to_string(),
        ));
    }

    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate a password's length bounds.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.len();

    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
            actual: len,
        });
    }

    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

/// Validate a display name.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    let len = name.chars().count();

    if len == 0 {
        return Err(ValidationError::Empty("display name".to_string()));
    }

    if len < MIN_DISPLAY_NAME_LENGTH {
        return Err(ValidationError::TooShort {
            field: "display name".to_string(),
            min: MIN_DISPLAY_NAME_LENGTH,
            actual: len,
        });
    }

    if len > MAX_DISPLAY_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "display name".to_string(),
            max: MAX_DISPLAY_NAME_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

/// Validate a handle: 3-30 characters, letters, digits, underscores,
/// dots, or dashes.
pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    let len = handle.chars().count();

    if len < MIN_HANDLE_LENGTH {
        return Err(ValidationError::TooShort {
            field: "handle".to_string(),
            min: MIN_HANDLE_LENGTH,
            actual: len,
        });
    }

    if len > MAX_HANDLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "handle".to_string(),
            max: MAX_HANDLE_LENGTH,
            actual: len,
        });
    }

    for c in handle.chars() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-') {
            return Err(ValidationError::InvalidHandle(format!(
                "invalid character '{}' (letters, digits, underscores, dots, or dashes only)",
                c
            )));
        }
    }

    Ok(())
}

/// Validate a bio's length.
pub fn validate_bio(bio: &str) -> Result<(), ValidationError> {
    let len = bio.chars().count();

    if len > MAX_BIO_LENGTH {
        return Err(ValidationError::TooLong {
            field: "bio".to_string(),
            max: MAX_BIO_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email(" test@example.com ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(matches!(validate_email(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example@com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example..com"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_email_too_long() {
        let long_local = "a".repeat(250);
        let email = format!("{}@example.com", long_local);
        assert!(matches!(
            validate_email(&email),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_password_bounds() {
        assert!(validate_password("password123").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_password(&"x".repeat(73)),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(validate_password(&"x".repeat(72)).is_ok());
    }

    #[test]
    fn test_validate_display_name_bounds() {
        assert!(validate_display_name("Bo").is_ok());
        assert!(validate_display_name("Alice Cooper").is_ok());
        assert!(matches!(
            validate_display_name(""),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            validate_display_name("A"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_display_name(&"x".repeat(61)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_handle() {
        assert!(validate_handle("alice").is_ok());
        assert!(validate_handle("a_b.c-d").is_ok());
        assert!(validate_handle("Alice99").is_ok());
        assert!(matches!(
            validate_handle("ab"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_handle(&"x".repeat(31)),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(matches!(
            validate_handle("has space"),
            Err(ValidationError::InvalidHandle(_))
        ));
        assert!(matches!(
            validate_handle("émile"),
            Err(ValidationError::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_validate_bio() {
        assert!(validate_bio("").is_ok());
        assert!(validate_bio(&"x".repeat(160)).is_ok());
        assert!(matches!(
            validate_bio(&"x".repeat(161)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidEmail("test message".to_string());
        assert_eq!(err.to_string(), "Invalid email: test message");

        let err = ValidationError::TooLong {
            field: "bio".to_string(),
            max: 160,
            actual: 300,
        };
        assert_eq!(err.to_string(), "bio is too long (300 chars, max 160)");
    }
}
