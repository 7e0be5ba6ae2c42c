//! Signed (relayed) registration.
//!
//! An owner signs a registration message off-line; any relayer may then
//! submit it. The message hash is a wire contract shared with external
//! signers and must not change:
//!
//! ```text
//! SHA-256(
//!     "agent-trust-registry/register/v1"
//!     || lp(agent_id) || lp(metadata_uri) || lp(agent_type) || lp(owner)
//!     || u64_be(deadline)
//!     || lp(registry_instance_id)
//! )
//! ```
//!
//! `lp(s)` is the big-endian u32 byte length of `s` followed by its UTF-8
//! bytes. The Ed25519 signature covers the 32-byte digest.

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::signing;
use crate::error::{RegistryError, Result};

use super::agent::{AgentId, AgentType};
use super::principal::Principal;

/// Domain tag prefixed to every registration message.
pub const REGISTRATION_DOMAIN: &[u8] = b"agent-trust-registry/register/v1";

/// The fields an owner signs to authorize a relayed registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub agent_id: AgentId,
    pub metadata_uri: String,
    pub agent_type: AgentType,
    pub owner: Principal,
    /// Last instant (microseconds since epoch) at which the request is accepted.
    pub deadline: u64,
}

impl RegistrationRequest {
    /// Digest signed by the owner for a given registry instance.
    pub fn message_hash(&self, registry_instance_id: &str) -> [u8; 32] {
        registration_message_hash(
            &self.agent_id,
            &self.metadata_uri,
            self.agent_type,
            &self.owner,
            self.deadline,
            registry_instance_id,
        )
    }

    /// Produce the base64 owner signature for this request.
    pub fn sign(&self, owner_key: &SigningKey, registry_instance_id: &str) -> String {
        signing::sign_to_base64(owner_key, &self.message_hash(registry_instance_id))
    }
}

/// Compute the registration message digest.
pub fn registration_message_hash(
    agent_id: &AgentId,
    metadata_uri: &str,
    agent_type: AgentType,
    owner: &Principal,
    deadline: u64,
    registry_instance_id: &str,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(REGISTRATION_DOMAIN);
    update_prefixed(&mut hasher, &agent_id.0);
    update_prefixed(&mut hasher, metadata_uri);
    update_prefixed(&mut hasher, agent_type.as_str());
    update_prefixed(&mut hasher, &owner.0);
    hasher.update(deadline.to_be_bytes());
    update_prefixed(&mut hasher, registry_instance_id);
    hasher.finalize().into()
}

fn update_prefixed(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u32).to_be_bytes());
    hasher.update(field.as_bytes());
}

/// Check that `signature_b64` over `message_hash` was produced by `owner`.
///
/// Any failure, including an owner string that does not name a valid
/// Ed25519 key, is reported as `InvalidSignature`.
pub fn verify_owner_signature(
    owner: &Principal,
    message_hash: &[u8; 32],
    signature_b64: &str,
) -> Result<()> {
    let key = owner
        .verifying_key()
        .map_err(|_| RegistryError::InvalidSignature)?;
    signing::verify_from_base64(&key, message_hash, signature_b64)
}
