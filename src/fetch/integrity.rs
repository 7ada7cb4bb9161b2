//! Subresource integrity metadata
//!
//! Metadata is a whitespace separated list of `<alg>-<base64 digest>` tokens.
//! Only the strongest algorithm present is checked; the content matches if
//! any digest for that algorithm matches.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Supported digest algorithms, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntegrityAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl IntegrityAlgorithm {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "sha256" => Some(Self::Sha256),
            "sha384" => Some(Self::Sha384),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }

    fn digest(self, bytes: &[u8]) -> String {
        match self {
            Self::Sha256 => STANDARD.encode(Sha256::digest(bytes)),
            Self::Sha384 => STANDARD.encode(Sha384::digest(bytes)),
            Self::Sha512 => STANDARD.encode(Sha512::digest(bytes)),
        }
    }
}

/// One parsed `<alg>-<digest>` token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityEntry {
    pub algorithm: IntegrityAlgorithm,
    pub digest: String,
}

/// Parse integrity metadata, skipping unknown algorithms and options
pub fn parse_metadata(metadata: &str) -> Vec<IntegrityEntry> {
    metadata
        .split_whitespace()
        .filter_map(|token| {
            let (alg, rest) = token.split_once('-')?;
            let algorithm = IntegrityAlgorithm::from_prefix(&alg.to_ascii_lowercase())?;
            // `?opt` suffixes are reserved and ignored
            let digest = rest.split('?').next().unwrap_or_default();
            Some(IntegrityEntry {
                algorithm,
                digest: digest.to_string(),
            })
        })
        .collect()
}

/// Check `bytes` against integrity metadata
///
/// Metadata with no recognised algorithm places no constraint on the content.
pub fn verify(metadata: &str, bytes: &[u8]) -> Result<(), String> {
    let entries = parse_metadata(metadata);
    let Some(strongest) = entries.iter().map(|e| e.algorithm).max() else {
        return Ok(());
    };

    let actual = strongest.digest(bytes);
    if entries
        .iter()
        .filter(|e| e.algorithm == strongest)
        .any(|e| e.digest == actual)
    {
        Ok(())
    } else {
        Err(format!(
            "expected {:?} digest in \"{}\", computed {}",
            strongest, metadata, actual
        ))
    }
}

/// Integrity metadata for `bytes` using `algorithm`
pub fn integrity_for(algorithm: IntegrityAlgorithm, bytes: &[u8]) -> String {
    let prefix = match algorithm {
        IntegrityAlgorithm::Sha256 => "sha256",
        IntegrityAlgorithm::Sha384 => "sha384",
        IntegrityAlgorithm::Sha512 => "sha512",
    };
    format!("{}-{}", prefix, algorithm.digest(bytes))
}
