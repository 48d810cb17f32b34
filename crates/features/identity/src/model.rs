use crate::error::IdentityError;
use serde::Serialize;
use surrealdb::types::SurrealValue;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 5;

/// A stored user, as read back from the datastore. Never carries the
/// password hash; credential checks go through the service.
#[derive(Debug, Clone, Serialize, SurrealValue)]
pub struct User {
    /// Key part of the record id (the `123` in `user:123`).
    pub id: String,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Registration input, validated and normalized by the service.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Credential row used only for verification; keeps the hash out of [`User`].
#[derive(Debug, SurrealValue)]
pub(crate) struct CredentialRow {
    pub id: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// Normalizes an email address the way the registration flow stores it:
/// the domain part is lowercased, the local part is preserved verbatim.
///
/// # Errors
/// Returns a validation error for an empty address or one without a
/// domain part.
pub fn normalize_email(email: &str) -> Result<String, IdentityError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::Validation {
            message: "email must not be empty".into(),
            context: None,
        });
    }

    let Some((local, domain)) = trimmed.rsplit_once('@') else {
        return Err(IdentityError::Validation {
            message: "email must contain a domain part".into(),
            context: None,
        });
    };

    if local.is_empty() || domain.is_empty() {
        return Err(IdentityError::Validation {
            message: "email must have both local and domain parts".into(),
            context: None,
        });
    }

    Ok(format!("{local}@{}", domain.to_lowercase()))
}

/// Rejects passwords below [`MIN_PASSWORD_LEN`].
pub(crate) fn validate_password(password: &str) -> Result<(), IdentityError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(IdentityError::Validation {
            message: format!("password must be at least {MIN_PASSWORD_LEN} characters").into(),
            context: None,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_domain_is_lowercased_local_part_preserved() {
        let cases = [
            ("testemail1@Example.com", "testemail1@example.com"),
            ("Testemail2@EXampLe.com", "Testemail2@example.com"),
            ("TESTEMAIL3@EXAMPLE.com", "TESTEMAIL3@example.com"),
            ("testemail4@example.COM", "testemail4@example.com"),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_email(raw).unwrap(), expected);
        }
    }

    #[test]
    fn empty_email_is_rejected() {
        assert!(normalize_email("").is_err());
        assert!(normalize_email("   ").is_err());
    }

    #[test]
    fn email_without_domain_is_rejected() {
        assert!(normalize_email("one").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("user@").is_err());
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_password("123").is_err());
        assert!(validate_password("12345").is_ok());
    }
}
