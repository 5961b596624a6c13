use crate::error::AppError;

/// Entry and tag names are non-empty runs of ASCII letters, digits, `-` and `_`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn validate_name(name: &str) -> Result<&str, AppError> {
    if is_valid_name(name) {
        Ok(name)
    } else {
        Err(AppError::InvalidName(name.to_string()))
    }
}
