use crate::error::IdentityError;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Hashes a plaintext password into a self-describing PHC string.
pub(crate) fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt).map_err(|e| {
        IdentityError::Internal {
            message: e.to_string().into(),
            context: Some("Hashing password".into()),
        }
    })?;
    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC string.
///
/// A malformed stored hash is an internal error; a mismatch is simply `false`.
pub(crate) fn verify_password(password: &str, stored: &str) -> Result<bool, IdentityError> {
    let parsed = PasswordHash::new(stored).map_err(|e| IdentityError::Internal {
        message: e.to_string().into(),
        context: Some("Parsing stored password hash".into()),
    })?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("passer123").expect("hash");
        assert_ne!(hash, "passer123", "hash must not be the plaintext");
        assert!(verify_password("passer123", &hash).expect("verify"));
        assert!(!verify_password("wrongpass", &hash).expect("verify"));
    }

    #[test]
    fn malformed_stored_hash_is_internal_error() {
        let err = verify_password("passer123", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, IdentityError::Internal { .. }));
    }
}
