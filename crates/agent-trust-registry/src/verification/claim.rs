//! Capability claims and their verification records.
//!
//! A claim is the SHA-256 of a capability string (e.g.
//! `"medical-diagnosis"`). Expiry is never written back: a record whose
//! `expires_at` has passed simply stops reading as verified.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::identity::agent::validate_identifier;
use crate::identity::Principal;

/// Hash identifying a capability claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimHash(pub String);

impl ClaimHash {
    /// Check that the hash is usable as a record key.
    pub fn validate(&self) -> Result<()> {
        validate_identifier("claim hash", &self.0)
    }
}

impl std::fmt::Display for ClaimHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClaimHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Hash a capability string into its claim id.
pub fn generate_claim_hash(capability: &str) -> ClaimHash {
    ClaimHash(hex::encode(Sha256::digest(capability.as_bytes())))
}

/// A verifier's attestation that an agent holds a capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Principal that issued (or last re-issued) the attestation.
    pub verifier: Principal,
    pub claim: ClaimHash,
    /// Off-system evidence for the claim.
    pub claim_uri: String,
    pub verified_at: u64,
    /// 0 = never expires.
    pub expires_at: u64,
    /// Cleared by revocation.
    pub is_valid: bool,
}

impl Verification {
    /// Whether the record still counts as verified at `now`.
    pub fn is_current(&self, now: u64) -> bool {
        self.is_valid && (self.expires_at == 0 || now < self.expires_at)
    }
}
