//! Agent identity records.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{RegistryError, Result};

use super::principal::Principal;

/// Longest identifier accepted for agents and claims.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Unique identifier for a registered agent.
///
/// Usually produced by [`generate_agent_id`]: 64 lowercase hex chars of
/// SHA-256(name || owner).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Check that the id is usable as a record key.
    pub fn validate(&self) -> Result<()> {
        validate_identifier("agent id", &self.0)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Record keys are ASCII alphanumerics, `-` and `_`, 1..=128 chars.
pub(crate) fn validate_identifier(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.len() > MAX_IDENTIFIER_LEN {
        return Err(RegistryError::InvalidIdentifier(format!(
            "{kind} must be 1..={MAX_IDENTIFIER_LEN} characters"
        )));
    }
    if !value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(RegistryError::InvalidIdentifier(format!(
            "{kind} may only contain [A-Za-z0-9_-]: {value}"
        )));
    }
    Ok(())
}

/// Derive a stable agent id from a name and its owner.
pub fn generate_agent_id(name: &str, owner: &Principal) -> AgentId {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(owner.0.as_bytes());
    AgentId(hex::encode(hasher.finalize()))
}

/// Kind of agent being registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Ai,
    Mcp,
    Sdk,
    Autonomous,
}

impl AgentType {
    /// Return a stable string representation.
    ///
    /// This string is part of the registration signature payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Mcp => "mcp",
            Self::Sdk => "sdk",
            Self::Autonomous => "autonomous",
        }
    }
}

impl FromStr for AgentType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ai" => Ok(Self::Ai),
            "mcp" => Ok(Self::Mcp),
            "sdk" => Ok(Self::Sdk),
            "autonomous" => Ok(Self::Autonomous),
            other => Err(RegistryError::InvalidAgentType(other.to_string())),
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub id: AgentId,
    pub owner: Principal,
    pub metadata_uri: String,
    pub agent_type: AgentType,
    /// Registration timestamp (microseconds since epoch).
    pub registered_at: u64,
    /// Cleared on deactivation and never set again.
    pub is_active: bool,
}

impl AgentIdentity {
    pub fn new(
        id: AgentId,
        owner: Principal,
        metadata_uri: String,
        agent_type: AgentType,
        registered_at: u64,
    ) -> Self {
        Self {
            id,
            owner,
            metadata_uri,
            agent_type,
            registered_at,
            is_active: true,
        }
    }
}
