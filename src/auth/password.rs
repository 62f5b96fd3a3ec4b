use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Salted one-way password hashing (bcrypt) with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash with a fresh random salt. The result embeds salt and cost.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Constant-time check of `plaintext` against a stored hash. A malformed
    /// stored hash is a failed verification, not an error.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        bcrypt::verify(plaintext, stored_hash).unwrap_or(false)
    }

    /// [`PasswordHasher::hash`] on the blocking pool.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, HashError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext)).await?
    }

    /// [`PasswordHasher::verify`] on the blocking pool.
    pub async fn verify_blocking(
        &self,
        plaintext: String,
        stored_hash: String,
    ) -> Result<bool, HashError> {
        let hasher = *self;
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored_hash)).await?)
    }
}
