//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::{
    generator::{CODE_LENGTH, is_game_code},
    state_machine::MAX_NAME_LEN,
};

/// Validates that a display name has between 1 and 32 characters once trimmed.
///
/// # Examples
///
/// ```ignore
/// validate_display_name("Ana")   // Ok
/// validate_display_name("   ")   // Err - blank
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len == 0 {
        let mut err = ValidationError::new("display_name_empty");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }

    if len > MAX_NAME_LEN {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("Name must be at most {MAX_NAME_LEN} characters (got {len})").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Trim and upper-case a join code taken from a URL, then check its shape.
pub fn normalize_game_code(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim().to_ascii_uppercase();
    if is_game_code(&code) {
        return Ok(code);
    }

    let mut err = ValidationError::new("game_code_format");
    err.message = Some(
        format!("Game code must be {CODE_LENGTH} characters from A-Z and 2-9, without I or O")
            .into(),
    );
    Err(err)
}
