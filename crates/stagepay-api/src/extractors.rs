//! # Request Extraction
//!
//! Request bodies arrive as `Result<Json<T>, JsonRejection>` so that
//! malformed JSON surfaces as a structured 422 instead of a framework
//! default. Field-level constraints are checked by the [`Validate`]
//! trait before a request reaches a handler's logic.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Field-level validation at the HTTP boundary. Rejects blank strings
/// and semantically invalid combinations early.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON extraction result and run the body's validation.
///
/// Both failure modes map to `AppError::Validation` (422).
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Shared field checks for request validation.
pub mod checks {
    /// Err unless `value` has non-whitespace content.
    pub fn non_blank(value: &str, field: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err(format!("{field} must not be blank"))
        } else {
            Ok(())
        }
    }

    /// Err unless `value` looks like an email address.
    pub fn email(value: &str) -> Result<(), String> {
        let trimmed = value.trim();
        let mut parts = trimmed.splitn(2, '@');
        let local = parts.next().unwrap_or("");
        let domain = parts.next().unwrap_or("");
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err("email must be a valid address".to_string());
        }
        Ok(())
    }

    /// Err unless `value` is digits with an optional leading `+`.
    pub fn phone(value: &str) -> Result<(), String> {
        let digits = value.strip_prefix('+').unwrap_or(value);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err("phone must be digits with an optional + prefix".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        name: String,
    }

    impl Validate for Probe {
        fn validate(&self) -> Result<(), String> {
            checks::non_blank(&self.name, "name")
        }
    }

    #[test]
    fn valid_body_passes_through() {
        let body = Ok(Json(Probe {
            name: "fine".to_string(),
        }));
        assert!(extract_validated_json(body).is_ok());
    }

    #[test]
    fn failed_validation_maps_to_validation_error() {
        let body = Ok(Json(Probe {
            name: "   ".to_string(),
        }));
        let err = extract_validated_json(body).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("name")));
    }

    #[test]
    fn check_email() {
        assert!(checks::email("jo@example.com").is_ok());
        assert!(checks::email("jo@example").is_err());
        assert!(checks::email("@example.com").is_err());
        assert!(checks::email("jo").is_err());
    }

    #[test]
    fn check_phone() {
        assert!(checks::phone("+12125551212").is_ok());
        assert!(checks::phone("2125551212").is_ok());
        assert!(checks::phone("+1 212").is_err());
        assert!(checks::phone("").is_err());
        assert!(checks::phone("+").is_err());
    }
}
