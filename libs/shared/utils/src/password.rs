use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use subtle::ConstantTimeEq;
use tracing::{debug, instrument};

/// Outcome of checking a login password against a stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordCheck {
    Valid,
    /// Stored value was a legacy plain-text password and it matched.
    /// Carries the Argon2 hash that should replace it.
    ValidLegacy(String),
    Invalid,
}

#[instrument(skip(password))]
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

#[instrument(skip(password, hash))]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Byte comparison whose timing does not depend on where the inputs differ.
pub fn secrets_match(given: &str, expected: &str) -> bool {
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}

pub fn is_argon2_hash(stored: &str) -> bool {
    stored.starts_with("$argon2")
}

/// Verifies `password` against whatever is stored. Values that are not
/// Argon2 hashes are compared as plain text and upgraded on a match.
#[instrument(skip(password, stored))]
pub fn check_password(password: &str, stored: &str) -> Result<PasswordCheck, argon2::password_hash::Error> {
    if is_argon2_hash(stored) {
        return Ok(if verify_password(password, stored)? {
            PasswordCheck::Valid
        } else {
            PasswordCheck::Invalid
        });
    }

    if !stored.is_empty() && secrets_match(password, stored) {
        debug!("Legacy plain-text credential matched, rehashing");
        return Ok(PasswordCheck::ValidLegacy(hash_password(password)?));
    }

    Ok(PasswordCheck::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("admin-pass", "admin-pass"));
        assert!(!secrets_match("admin-pasS", "admin-pass"));
        assert!(!secrets_match("admin", "admin-pass"));
        assert!(!secrets_match("", "admin-pass"));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(is_argon2_hash(&hash));
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_check_password_hashed() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert_eq!(check_password("s3cret-pass", &hash).unwrap(), PasswordCheck::Valid);
        assert_eq!(check_password("nope", &hash).unwrap(), PasswordCheck::Invalid);
    }

    #[test]
    fn test_legacy_plain_text_is_upgraded() {
        let outcome = check_password("plain", "plain").unwrap();
        assert_matches!(&outcome, PasswordCheck::ValidLegacy(hash) if verify_password("plain", hash).unwrap());
        assert_eq!(check_password("other", "plain").unwrap(), PasswordCheck::Invalid);
        assert_eq!(check_password("", "").unwrap(), PasswordCheck::Invalid);
    }
}
