// src/models/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

// ---
// Validações customizadas usadas pelos drafts
// ---
pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_percentage(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    if *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &100.0);
        err.message = Some("A porcentagem não pode passar de 100.".into());
        return Err(err);
    }
    Ok(())
}

/// Códigos de departamento: letras (sem maiúsculas), dígitos, `-` e `_`.
/// Letras CJK são aceitas ("行銷"); espaços e pontuação não.
pub fn validate_slug(code: &str) -> Result<(), ValidationError> {
    let valid = !code.is_empty()
        && code.chars().count() <= 40
        && code
            .chars()
            .all(|c| (c.is_alphanumeric() && !c.is_uppercase()) || c == '-' || c == '_');
    if !valid {
        let mut err = ValidationError::new("slug");
        err.message = Some("Use apenas letras minúsculas, números, '-' ou '_' (sem espaços).".into());
        return Err(err);
    }
    Ok(())
}

pub fn required_error(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("required");
    err.message = Some(message.into());
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(validate_not_negative(&Decimal::new(-1, 0)).is_err());
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_not_negative(&Decimal::new(1999, 2)).is_ok());
    }

    #[test]
    fn percentages_stay_between_zero_and_one_hundred() {
        assert!(validate_percentage(&Decimal::new(15, 0)).is_ok());
        assert!(validate_percentage(&Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_percentage(&Decimal::new(1001, 1)).is_err());
        assert!(validate_percentage(&Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn slugs_reject_uppercase_and_spaces() {
        assert!(validate_slug("marketing").is_ok());
        assert!(validate_slug("team-2_b").is_ok());
        assert!(validate_slug("Marketing").is_err());
        assert!(validate_slug("行銷").is_ok());
        assert!(validate_slug("sales team").is_err());
        assert!(validate_slug("").is_err());
    }
}
