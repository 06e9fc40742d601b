use super::{Recomposition, derived_name};
use crate::constants::MIN_PASSWORD_LEN;
use crate::encode::{EncodeOptions, EncryptionDirective};
use crate::plan::CompositionPlan;
use crate::source::SourceDocument;
use crate::types::{Result, ValidationError};

pub(crate) fn validate_password(password: &str) -> std::result::Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Copy every page into a document that needs `password` to open and
/// permits nothing once opened.
pub fn protect(source: &SourceDocument, password: &str) -> Result<Recomposition> {
    validate_password(password)?;

    let plan = CompositionPlan::from_templates(derived_name("protected", source), source.import_all()?);
    Ok(Recomposition::single(
        plan,
        EncodeOptions::encrypted(EncryptionDirective::deny_all(password)),
        source.page_count(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_rules() {
        assert_eq!(
            validate_password("").unwrap_err().to_string(),
            "Password is required"
        );
        assert_eq!(
            validate_password("12345").unwrap_err().to_string(),
            "Password must be at least 6 characters long"
        );
        assert!(validate_password("123456").is_ok());
        // counted in characters, not bytes
        assert!(validate_password("ééééé").is_err());
    }
}
