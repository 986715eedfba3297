//! Password-related utilities.

use libreauth::pass::{Algorithm, HashBuilder, Hasher};

use crate::error::AppError;

pub(crate) const PWD_ALGORITHM: Algorithm = Algorithm::Argon2;
pub(crate) const PWD_SCHEME_VERSION: usize = 1;

// If the Hasher changes, make sure to increment PWD_SCHEME_VERSION
fn hasher() -> Result<Hasher, AppError> {
    HashBuilder::new()
        .algorithm(PWD_ALGORITHM)
        .version(PWD_SCHEME_VERSION)
        .finalize()
        .map_err(|e| AppError::Hasher(format!("{:?}", e)))
}

/// Hash a plaintext password into PHC form.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hasher()?
        .hash(password)
        .map_err(|e| AppError::Hasher(format!("{:?}", e)))
}

/// The result of checking a candidate password against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PasswordCheck {
    Mismatch,
    Valid,
    /// Valid, but hashed under an older scheme and should be rehashed.
    ValidOutdated,
}

pub(crate) fn check_password(stored_hash: &str, candidate: &str) -> PasswordCheck {
    let checker = match HashBuilder::from_phc(stored_hash) {
        Ok(checker) => checker,
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {:?}", e);
            return PasswordCheck::Mismatch;
        }
    };

    if !checker.is_valid(candidate) {
        PasswordCheck::Mismatch
    } else if checker.needs_update(Some(PWD_SCHEME_VERSION)) {
        PasswordCheck::ValidOutdated
    } else {
        PasswordCheck::Valid
    }
}
