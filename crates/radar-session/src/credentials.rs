use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// The single configured admin account. The password is only ever held as
/// an Argon2id PHC string.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password_hash: String,
}

impl AdminCredentials {
    /// Hash a plaintext password at startup.
    pub fn from_password(username: impl Into<String>, password: &str) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash admin password: {}", e))?
            .to_string();

        Ok(Self {
            username: username.into(),
            password_hash,
        })
    }

    /// Use a precomputed PHC string, e.g. from `RADAR_ADMIN_PASSWORD_HASH`.
    pub fn from_hash(username: impl Into<String>, password_hash: impl Into<String>) -> Result<Self> {
        let password_hash = password_hash.into();
        PasswordHash::new(&password_hash).map_err(|e| anyhow!("Invalid admin password hash: {}", e))?;

        Ok(Self {
            username: username.into(),
            password_hash,
        })
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        // Verify even on a username mismatch so both failures cost the same
        let password_ok = match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        };
        password_ok && username == self.username
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
