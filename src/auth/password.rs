//! Password hashing
//!
//! Argon2id with a random per-password salt. Hashing is CPU bound, so both
//! functions hop onto the blocking thread pool.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tokio::sync::OnceCell;

use super::{generate_token, AuthError};

/// Hash of a random secret nobody knows, checked when the username is unknown
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Hash a password into a PHC string
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// Verify a password against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(&password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    })
    .await
    .map_err(|e| AuthError::Hashing(e.to_string()))?
}

/// Spend the same Argon2 work as [`verify_password`] without a stored hash.
///
/// Login calls this for unknown usernames so the response time does not
/// reveal whether the account exists. The result is always a mismatch.
pub async fn verify_dummy_password(password: String) -> Result<(), AuthError> {
    let dummy = DUMMY_HASH
        .get_or_try_init(|| hash_password(generate_token()))
        .await?
        .clone();

    verify_password(password, dummy).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        tokio_test::block_on(async {
            let hash = hash_password("pw1".to_string()).await.unwrap();
            assert!(hash.starts_with("$argon2id$"));
            assert!(!hash.contains("pw1"));

            assert!(verify_password("pw1".to_string(), hash.clone()).await.unwrap());
            assert!(!verify_password("pw2".to_string(), hash).await.unwrap());
        });
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        tokio_test::block_on(async {
            let a = hash_password("secret".to_string()).await.unwrap();
            let b = hash_password("secret".to_string()).await.unwrap();
            assert_ne!(a, b);
        });
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        tokio_test::block_on(async {
            let result = verify_password("pw".to_string(), "plaintext".to_string()).await;
            assert!(matches!(result, Err(AuthError::Hashing(_))));
        });
    }

    #[test]
    fn test_dummy_verification_reuses_one_hash() {
        tokio_test::block_on(async {
            verify_dummy_password("pw1".to_string()).await.unwrap();
            let first = DUMMY_HASH.get().cloned().unwrap();
            assert!(first.starts_with("$argon2id$"));

            verify_dummy_password("pw2".to_string()).await.unwrap();
            assert_eq!(DUMMY_HASH.get(), Some(&first));
        });
    }
}
