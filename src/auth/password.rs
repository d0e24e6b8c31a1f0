//! Credential hashing with Argon2id
//!
//! Passwords are stored only as salted PHC strings. Verification cost is
//! kept uniform across "unknown account" and "wrong password" by burning a
//! verification against a fixed dummy hash when no account exists.

use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, Salt, SaltString};

use crate::auth::AuthError;

/// Syntactically valid Argon2id PHC string that no password hashes to.
///
/// Parameters match [`Argon2::default`] so a verification against it costs
/// the same as one against a real stored hash.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$AAAAAAAAAAAAAAAAAAAAAA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; Salt::RECOMMENDED_LENGTH];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::Hash(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hash(e.to_string()))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash.
///
/// A hash that fails to parse counts as a mismatch. The parse failure is
/// logged because it means a corrupted record, not a bad password.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(error = %e, "stored credential hash failed to parse");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Spend one verification's worth of work without a real hash.
///
/// Called on login for accounts that do not exist, so response timing does
/// not reveal whether an email is registered.
pub fn burn_dummy_verification(password: &str) {
    let _ = verify_password(password, DUMMY_HASH);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_round_trip() {
        let hash = hash_password("pw1234").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pw1234", &hash));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("pw1234").unwrap();
        assert!(!verify_password("pw1235", &hash));
    }

    #[test]
    fn test_salts_are_unique_per_hash() {
        let a = hash_password("pw1234").unwrap();
        let b = hash_password("pw1234").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_dummy_hash_parses_and_never_matches() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        assert!(!verify_password("pw1234", DUMMY_HASH));
        assert!(!verify_password("", DUMMY_HASH));
    }

    #[test]
    fn test_malformed_stored_hash_is_a_mismatch() {
        assert!(!verify_password("pw1234", "not-a-phc-string"));
    }
}
