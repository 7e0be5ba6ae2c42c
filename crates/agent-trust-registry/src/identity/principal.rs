//! Principals: the parties that own agents and call the registry.
//!
//! A principal is an Ed25519 public key. Its textual form is
//! `apr_` + base58 of the full 32 key bytes, so the key can be recovered
//! from the string when checking a registration signature.

use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::crypto::keys::Ed25519KeyPair;
use crate::error::{RegistryError, Result};

const PRINCIPAL_PREFIX: &str = "apr_";

/// Textual principal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(pub String);

impl Principal {
    /// Principal for an Ed25519 public key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let encoded = bs58::encode(key.as_bytes()).into_string();
        Self(format!("{PRINCIPAL_PREFIX}{encoded}"))
    }

    /// Decode the public key this principal names.
    ///
    /// Fails with `InvalidKey` for strings that are not `apr_` + base58 of
    /// a valid 32-byte Ed25519 point.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        let encoded = self.0.strip_prefix(PRINCIPAL_PREFIX).ok_or_else(|| {
            RegistryError::InvalidKey(format!("principal must start with {PRINCIPAL_PREFIX}"))
        })?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| RegistryError::InvalidKey(format!("invalid base58 principal: {e}")))?;
        let key_bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| RegistryError::InvalidKey("principal key must be 32 bytes".into()))?;
        Ed25519KeyPair::verifying_key_from_bytes(&key_bytes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A principal together with its signing key.
pub struct PrincipalKey {
    key_pair: Ed25519KeyPair,
    /// Creation timestamp (microseconds since Unix epoch).
    pub created_at: u64,
    /// Local label (the key file name in the CLI).
    pub name: Option<String>,
}

impl PrincipalKey {
    /// Generate a fresh principal key.
    pub fn generate(name: Option<String>) -> Self {
        Self {
            key_pair: Ed25519KeyPair::generate(),
            created_at: crate::time::now_micros(),
            name,
        }
    }

    /// Reconstruct from stored key bytes and metadata.
    pub fn from_parts(signing_key_bytes: &[u8; 32], created_at: u64, name: Option<String>) -> Self {
        Self {
            key_pair: Ed25519KeyPair::from_signing_key_bytes(signing_key_bytes),
            created_at,
            name,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::from_verifying_key(self.key_pair.verifying_key())
    }

    pub fn signing_key(&self) -> &SigningKey {
        self.key_pair.signing_key()
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.key_pair.verifying_key()
    }

    /// Return the signing key bytes. Caller must zeroize after use.
    pub fn signing_key_bytes(&self) -> [u8; 32] {
        self.key_pair.signing_key_bytes()
    }
}
