//! Token lifecycle primitives: secret generation, name validation, masking.
//!
//! Secrets carry 256 bits of OS randomness, hex encoded. Uniqueness is
//! guaranteed by the birthday bound of the entropy budget; the unique index
//! on the column is defense in depth, not a retry loop.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::errors::AppError;

/// 32 random bytes -> 64 hex chars.
pub const SECRET_BYTES: usize = 32;

/// Minimum token name length after trimming.
pub const MIN_NAME_LEN: usize = 3;

/// Generate a fresh token secret from OS randomness.
pub fn generate_secret() -> String {
    secret_from_rng(&mut OsRng)
}

pub fn secret_from_rng<R: RngCore>(rng: &mut R) -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Validate an issuance name, returning the trimmed form.
pub fn validate_name(name: &str) -> Result<&str, AppError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(AppError::InvalidName);
    }
    Ok(trimmed)
}

/// Masked form shown in listings. The full secret is returned exactly once,
/// at issuance.
pub fn mask_secret(secret: &str) -> String {
    if secret.len() > 8 {
        format!("{}…{}", &secret[..4], &secret[secret.len() - 4..])
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn secret_is_fixed_length_hex() {
        let secret = generate_secret();
        assert_eq!(secret.len(), SECRET_BYTES * 2);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn secrets_unique_across_many_draws() {
        // Deterministic high-entropy stand-in for OsRng.
        let mut rng = StdRng::seed_from_u64(0x6e6f7465);
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(secret_from_rng(&mut rng)));
        }
    }

    #[test]
    fn short_names_rejected() {
        assert!(matches!(validate_name(""), Err(AppError::InvalidName)));
        assert!(matches!(validate_name("ab"), Err(AppError::InvalidName)));
        assert!(matches!(validate_name("  a  "), Err(AppError::InvalidName)));
    }

    #[test]
    fn names_are_trimmed() {
        assert_eq!(validate_name("  Postman  ").unwrap(), "Postman");
        // Whitespace does not count toward the minimum.
        assert!(matches!(validate_name(" CI  "), Err(AppError::InvalidName)));
    }

    #[test]
    fn mask_hides_the_middle() {
        let secret = "0123456789abcdef0123456789abcdef";
        let masked = mask_secret(secret);
        assert_eq!(masked, "0123…cdef");
        assert!(!masked.contains("456789"));
    }

    #[test]
    fn mask_never_echoes_short_secrets() {
        assert_eq!(mask_secret("abcd"), "****");
    }
}
