//! TLS certificate fingerprints.
//!
//! A [`Fingerprint`] is an immutable value: a hash-algorithm tag plus the
//! digest bytes. Two fingerprints with the same algorithm and digest are
//! interchangeable everywhere (trust decisions, allowed sets, dialog keys).

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Result, trust::TrustError};

/// Hash algorithm used to compute a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashType {
    #[serde(rename = "SHA-1")]
    Sha1,
    #[serde(rename = "SHA-256")]
    Sha256,
}

impl HashType {
    /// Digest length in bytes for this algorithm.
    pub fn digest_len(&self) -> usize {
        match self {
            HashType::Sha1 => 20,
            HashType::Sha256 => 32,
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashType::Sha1 => f.write_str("SHA-1"),
            HashType::Sha256 => f.write_str("SHA-256"),
        }
    }
}

/// Hash-algorithm-tagged digest of a TLS certificate.
///
/// Deserialization goes through [`Fingerprint::new`], so a stored digest of
/// the wrong length is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StoredFingerprint")]
pub struct Fingerprint {
    hash_type: HashType,
    #[serde(with = "hex_bytes")]
    bytes: Vec<u8>,
}

/// Unchecked serialized form of a [`Fingerprint`].
#[derive(Deserialize)]
struct StoredFingerprint {
    hash_type: HashType,
    #[serde(with = "hex_bytes")]
    bytes: Vec<u8>,
}

impl TryFrom<StoredFingerprint> for Fingerprint {
    type Error = crate::Error;

    fn try_from(stored: StoredFingerprint) -> Result<Self> {
        Fingerprint::new(stored.hash_type, stored.bytes)
    }
}

impl Fingerprint {
    /// Build a fingerprint from raw digest bytes.
    ///
    /// Fails if the digest length does not match the algorithm.
    pub fn new(hash_type: HashType, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() != hash_type.digest_len() {
            return Err(TrustError::InvalidFingerprint {
                reason: format!(
                    "{hash_type} digest must be {} bytes, got {}",
                    hash_type.digest_len(),
                    bytes.len()
                ),
            }
            .into());
        }
        Ok(Self { hash_type, bytes })
    }

    /// Compute the SHA-256 fingerprint of a DER-encoded certificate.
    pub fn sha256_of(certificate_der: &[u8]) -> Self {
        Self {
            hash_type: HashType::Sha256,
            bytes: Sha256::digest(certificate_der).to_vec(),
        }
    }

    /// Parse a hex digest, tolerating `:` and whitespace separators.
    pub fn from_hex(hash_type: HashType, hex_str: &str) -> Result<Self> {
        let cleaned: String = hex_str
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':')
            .collect();
        let bytes = hex::decode(&cleaned).map_err(|e| TrustError::InvalidFingerprint {
            reason: format!("invalid hex: {e}"),
        })?;
        Self::new(hash_type, bytes)
    }

    /// The hash algorithm of this fingerprint.
    pub fn hash_type(&self) -> HashType {
        self.hash_type
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Upper-case hex encoding of the digest, as shown to users.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hash_type, self.to_hex())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
