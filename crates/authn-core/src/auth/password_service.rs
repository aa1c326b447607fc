//! Password Hashing Service
//!
//! Salted one-way hashing with Argon2id. Hashes are PHC strings that embed
//! the algorithm, cost parameters and a fresh random salt, so hashing the
//! same secret twice yields two different strings that both verify.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tracing::debug;

use crate::shared::error::{AuthError, PasswordError, Result};

/// Argon2id configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Config {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations) (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
    /// Output hash length in bytes (default: 32)
    pub output_len: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
            output_len: 32,
        }
    }
}

impl Argon2Config {
    /// Low memory config for testing (faster but less secure)
    pub fn testing() -> Self {
        Self {
            memory_cost: 4096, // 4 MiB
            time_cost: 1,
            parallelism: 1,
            output_len: 32,
        }
    }

    fn to_params(&self) -> Result<Params> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.output_len),
        )
        .map_err(|e| AuthError::configuration(format!("Invalid Argon2 parameters: {}", e)))
    }
}

/// Password hashing and verification
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    config: Argon2Config,
}

impl PasswordService {
    /// Fails only on invalid cost parameters, which is a startup
    /// misconfiguration.
    pub fn new(config: Argon2Config) -> Result<Self> {
        let params = config.to_params()?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Ok(Self { argon2, config })
    }

    pub fn config(&self) -> &Argon2Config {
        &self.config
    }

    /// Hash a secret with a freshly generated salt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing {
                message: e.to_string(),
            })?;

        Ok(hash.to_string())
    }

    /// Verify a secret against a stored hash.
    ///
    /// The digest is recomputed with the salt and parameters embedded in
    /// `hash` and compared in constant time. A hash that cannot be parsed is
    /// reported as a mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match self.try_verify(password, hash) {
            Ok(matched) => matched,
            Err(e) => {
                debug!(error = %e, "Treating unusable password hash as a mismatch");
                false
            }
        }
    }

    fn try_verify(&self, password: &str, hash: &str) -> std::result::Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::MalformedHash {
            message: e.to_string(),
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash {
                message: e.to_string(),
            }),
        }
    }

    /// Check whether a stored hash was produced with a different algorithm
    /// or different cost parameters than the current configuration.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };

        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(params) => {
                params.m_cost() != self.config.memory_cost
                    || params.t_cost() != self.config.time_cost
                    || params.p_cost() != self.config.parallelism
                    || params.output_len().is_some_and(|len| len != self.config.output_len)
            }
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(Argon2Config::testing()).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let service = service();

        let hash = service.hash_password("password").unwrap();

        // Hash is PHC format
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("password"));

        assert!(service.verify_password("password", &hash));
        assert!(!service.verify_password("wrong", &hash));
        assert!(!service.verify_password("", &hash));
    }

    #[test]
    fn test_hash_uniqueness() {
        let service = service();

        let hash1 = service.hash_password("password").unwrap();
        let hash2 = service.hash_password("password").unwrap();

        // Same password produces different hashes (due to random salt)
        assert_ne!(hash1, hash2);

        // But both verify correctly
        assert!(service.verify_password("password", &hash1));
        assert!(service.verify_password("password", &hash2));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        let service = service();

        assert!(!service.verify_password("password", ""));
        assert!(!service.verify_password("password", "not-a-phc-string"));
        assert!(!service.verify_password("password", "$argon2id$v=19$m=4096,t=1,p=1$garbage"));
        assert!(matches!(
            service.try_verify("password", "plaintext"),
            Err(PasswordError::MalformedHash { .. })
        ));
    }

    #[test]
    fn test_verify_uses_embedded_parameters() {
        let weak = service();
        let hash = weak.hash_password("password").unwrap();

        let strong = PasswordService::new(Argon2Config {
            memory_cost: 8192,
            time_cost: 2,
            ..Argon2Config::testing()
        })
        .unwrap();
        assert!(strong.verify_password("password", &hash));
    }

    #[test]
    fn test_needs_rehash() {
        let service = service();
        let hash = service.hash_password("password").unwrap();
        assert!(!service.needs_rehash(&hash));
        assert!(service.needs_rehash("garbage"));

        let stronger = PasswordService::new(Argon2Config {
            time_cost: 2,
            ..Argon2Config::testing()
        })
        .unwrap();
        assert!(stronger.needs_rehash(&hash));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordService::new(Argon2Config {
            memory_cost: 1,
            ..Argon2Config::testing()
        });
        assert!(matches!(result, Err(AuthError::Configuration { .. })));
    }
}
