use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash a plaintext password with bcrypt at the default cost.
///
/// The salt is generated per call and embedded in the returned digest, so
/// nothing besides the digest needs to be stored.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)?)
}

/// Check a candidate password against a stored digest.
///
/// Never fails: a wrong password and an unparseable digest both come back
/// `false`.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}
