//! Salted tokens over canonical operation strings.
//!
//! Tokens are truncated hex digests. A short token keeps cache file names and
//! URLs readable but only carries `4 * length` bits; raise the length when the
//! token is the only thing standing between a client and arbitrary variants.

use indexmap::IndexMap;
use ring::digest;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use subtle::ConstantTimeEq;

use crate::error::{ImagineError, Result};
use crate::models::ImageVersions;
use crate::utils::serializer::{serialize, Separators};

pub const DEFAULT_HASH_LENGTH: usize = 8;

const MD5_HEX_LEN: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// 40 hex characters, the historical token width.
    #[default]
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    pub fn hex_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 40,
            DigestAlgorithm::Sha256 => 64,
        }
    }

    fn ring_algorithm(self) -> &'static digest::Algorithm {
        match self {
            DigestAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            DigestAlgorithm::Sha256 => &digest::SHA256,
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ImagineError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            other => Err(ImagineError::Config(format!(
                "unknown hash algorithm `{}` (expected sha1 or sha256)",
                other
            ))),
        }
    }
}

fn salted_hex(serialized: &str, salt: &str, algorithm: DigestAlgorithm) -> String {
    let mut ctx = digest::Context::new(algorithm.ring_algorithm());
    ctx.update(serialized.as_bytes());
    ctx.update(salt.as_bytes());
    hex::encode(ctx.finish())
}

fn check_length(length: usize, max: usize) -> Result<()> {
    if length == 0 || length > max {
        return Err(ImagineError::InvalidInput(format!(
            "hash length must be between 1 and {}, got {}",
            max, length
        )));
    }
    Ok(())
}

/// Lowercase hex of `digest(serialized || salt)`, cut to `length` characters.
pub fn hash_token(
    serialized: &str,
    salt: &str,
    length: usize,
    algorithm: DigestAlgorithm,
) -> Result<String> {
    check_length(length, algorithm.hex_len())?;

    let mut hex = salted_hex(serialized, salt, algorithm);
    hex.truncate(length);
    Ok(hex)
}

/// Produces and checks tokens for one salt and length.
#[derive(Clone)]
pub struct IntegrityHasher {
    salt: String,
    length: usize,
    algorithm: DigestAlgorithm,
}

impl std::fmt::Debug for IntegrityHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrityHasher")
            .field("salt", &"<redacted>")
            .field("length", &self.length)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl IntegrityHasher {
    pub fn new(salt: impl Into<String>, length: usize, algorithm: DigestAlgorithm) -> Result<Self> {
        let salt = salt.into();
        if salt.is_empty() {
            return Err(ImagineError::Config("a salt is required to sign operations".into()));
        }
        check_length(length, algorithm.hex_len())?;
        Ok(Self {
            salt,
            length,
            algorithm,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn hash(&self, serialized: &str) -> String {
        let mut hex = salted_hex(serialized, &self.salt, self.algorithm);
        hex.truncate(self.length);
        hex
    }

    pub fn matches(&self, serialized: &str, supplied: &str) -> bool {
        let expected = self.hash(serialized);
        bool::from(expected.as_bytes().ct_eq(supplied.as_bytes()))
    }

    pub fn verify(&self, serialized: &str, supplied: Option<&str>) -> Result<()> {
        let supplied = supplied.ok_or(ImagineError::MissingToken)?;
        if self.matches(serialized, supplied) {
            Ok(())
        } else {
            tracing::debug!("Token mismatch for `{}`", serialized);
            Err(ImagineError::InvalidToken)
        }
    }
}

/// md5 over the concatenated parts.
pub fn cache_key(parts: &[&str]) -> String {
    let mut combined = String::new();
    for part in parts {
        combined.push_str(part);
    }
    format!("{:x}", md5::compute(combined.as_bytes()))
}

/// Short md5 of every version's canonical string, keyed like the input.
pub fn hash_image_versions(
    versions: &ImageVersions,
    separators: &Separators,
    length: usize,
) -> Result<IndexMap<String, IndexMap<String, String>>> {
    check_length(length, MD5_HEX_LEN)?;

    let mut hashes = IndexMap::with_capacity(versions.len());
    for (model, model_versions) in versions {
        let mut model_hashes = IndexMap::with_capacity(model_versions.len());
        for (version, operations) in model_versions {
            let canonical = serialize(operations, separators)?;
            let mut hash = cache_key(&[&canonical]);
            hash.truncate(length);
            model_hashes.insert(version.clone(), hash);
        }
        hashes.insert(model.clone(), model_hashes);
    }
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{params, OperationSet};

    const SALT: &str = "this-is-a-nice-salt";
    const CANONICAL: &str = "thumbnail+width-200-height-150";

    #[test]
    fn pinned_sha1_token() {
        let token = hash_token(CANONICAL, SALT, 40, DigestAlgorithm::Sha1).unwrap();
        assert_eq!(token, "63385e727176545257a5863935594e5a5617ba6c");
        assert_eq!(hash_token(CANONICAL, SALT, 8, DigestAlgorithm::Sha1).unwrap(), "63385e72");
    }

    #[test]
    fn pinned_sha256_token() {
        let token = hash_token(CANONICAL, SALT, 64, DigestAlgorithm::Sha256).unwrap();
        assert_eq!(
            token,
            "4b4b4a57964d8b216379d001d7e4e22e06b6932e5215d90c4aed7f4bff897eeb"
        );
    }

    #[test]
    fn length_out_of_range() {
        assert!(hash_token(CANONICAL, SALT, 0, DigestAlgorithm::Sha1).is_err());
        assert!(hash_token(CANONICAL, SALT, 41, DigestAlgorithm::Sha1).is_err());
        assert!(hash_token(CANONICAL, SALT, 64, DigestAlgorithm::Sha256).is_ok());
        assert!(IntegrityHasher::new(SALT, 41, DigestAlgorithm::Sha1).is_err());
    }

    #[test]
    fn hasher_requires_salt() {
        assert!(matches!(
            IntegrityHasher::new("", 8, DigestAlgorithm::Sha1),
            Err(ImagineError::Config(_))
        ));
    }

    #[test]
    fn verify_distinguishes_missing_and_invalid() {
        let hasher = IntegrityHasher::new(SALT, 40, DigestAlgorithm::Sha1).unwrap();
        let token = hasher.hash(CANONICAL);

        assert!(hasher.verify(CANONICAL, Some(&token)).is_ok());
        assert!(matches!(hasher.verify(CANONICAL, None), Err(ImagineError::MissingToken)));
        assert!(matches!(
            hasher.verify(CANONICAL, Some("wrong-hash-value")),
            Err(ImagineError::InvalidToken)
        ));
        assert!(!hasher.matches(CANONICAL, &token[..39]));
    }

    #[test]
    fn comparison_is_exact() {
        let hasher = IntegrityHasher::new(SALT, 40, DigestAlgorithm::Sha1).unwrap();
        let token = hasher.hash(CANONICAL);

        assert!(hasher.matches(CANONICAL, &token));
        assert!(!hasher.matches(CANONICAL, &token.to_uppercase()));
        assert!(!hasher.matches(CANONICAL, &format!("{}0", token)));
        assert!(!hasher.matches(CANONICAL, ""));
    }

    #[test]
    fn debug_output_hides_salt() {
        let hasher = IntegrityHasher::new(SALT, 8, DigestAlgorithm::Sha1).unwrap();
        assert!(!format!("{:?}", hasher).contains(SALT));
    }

    #[test]
    fn algorithm_from_str() {
        assert_eq!("SHA256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert!("md5".parse::<DigestAlgorithm>().is_err());
    }

    #[test]
    fn image_version_hashes() {
        let mut versions = ImageVersions::new();
        let mut avatar = IndexMap::new();
        avatar.insert(
            "small".to_string(),
            OperationSet::new().with("thumbnail", params([("width", 200), ("height", 150)])),
        );
        versions.insert("Avatar".to_string(), avatar);

        let hashes = hash_image_versions(&versions, &Separators::default(), 8).unwrap();
        assert_eq!(hashes["Avatar"]["small"], "b5192b86");
        assert!(hash_image_versions(&versions, &Separators::default(), 33).is_err());
    }
}
