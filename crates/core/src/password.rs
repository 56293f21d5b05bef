//! Argon2id password hashing, verification, and strength validation.
//!
//! All password hashes use the Argon2id variant with a cryptographically random
//! salt drawn from [`OsRng`]. The PHC string format is used for storage so
//! that algorithm parameters and salt are embedded in the hash itself, which
//! lets the work factor be raised later without invalidating stored hashes.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};

use crate::error::CoreError;

/// Salt length in bytes (the PHC recommended length).
const SALT_LEN: usize = 16;

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes over memory.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl HashCost {
    pub const fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }
}

impl Default for HashCost {
    /// The Argon2 recommended defaults: 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        Self::new(
            Params::DEFAULT_M_COST,
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST,
        )
    }
}

/// Hashes and verifies passwords with a fixed Argon2id cost.
///
/// Cheap to clone; hashing is CPU bound, so async callers should run it on
/// the blocking pool.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Build a hasher, rejecting cost parameters Argon2 does not accept.
    pub fn new(cost: HashCost) -> Result<Self, CoreError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| CoreError::Validation(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// Returns the PHC-formatted hash string (includes algorithm, params, salt, and hash).
    pub fn hash(&self, password: &str) -> Result<String, CoreError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng.try_fill_bytes(&mut salt_bytes).map_err(|e| {
            tracing::error!(error = %e, "OS random source failed while salting a password");
            CoreError::HashingFailure
        })?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|_| CoreError::HashingFailure)?;

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = %e, "Argon2 hashing failed");
                CoreError::HashingFailure
            })?;
        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored PHC-formatted hash.
    ///
    /// A malformed stored hash is reported as a mismatch so callers cannot
    /// tell the two apart. The comparison itself is constant time.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!("Stored password hash is not a valid PHC string");
                return false;
            }
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Validate that a password meets minimum strength requirements.
///
/// Currently enforces a minimum character length. Returns `Ok(())` when the
/// password is acceptable, or `Err` with a human-readable explanation.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!(
            "Password must be at least {min_length} characters long"
        ));
    }
    Ok(())
}
