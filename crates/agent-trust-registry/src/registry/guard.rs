//! Authorization guards.
//!
//! Each guard runs before a mutation touches state and returns the typed
//! error for its role. Rejections are logged at `warn`.

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::identity::{AgentId, AgentIdentity, Principal};
use crate::verification::VerifierSet;

pub(crate) fn require_admin(config: &RegistryConfig, caller: &Principal, action: &str) -> Result<()> {
    if caller == &config.admin {
        return Ok(());
    }
    log::warn!("{caller} rejected for {action}: not the registry admin");
    Err(RegistryError::NotAuthorized(format!(
        "{action} requires the registry admin"
    )))
}

pub(crate) fn require_owner(agent: &AgentIdentity, caller: &Principal) -> Result<()> {
    if &agent.owner == caller {
        return Ok(());
    }
    log::warn!("{caller} rejected: does not own agent {}", agent.id);
    Err(RegistryError::NotAgentOwner(agent.id.0.clone()))
}

/// Owner of the agent or the registry admin.
pub(crate) fn require_owner_or_admin(
    config: &RegistryConfig,
    agent: &AgentIdentity,
    caller: &Principal,
) -> Result<()> {
    if &agent.owner == caller || caller == &config.admin {
        return Ok(());
    }
    log::warn!("{caller} rejected: neither owner of {} nor admin", agent.id);
    Err(RegistryError::NotAuthorized(format!(
        "only the owner or admin may deactivate {}",
        agent.id
    )))
}

pub(crate) fn require_trusted_verifier(verifiers: &VerifierSet, caller: &Principal) -> Result<()> {
    if verifiers.contains(caller) {
        return Ok(());
    }
    log::warn!("{caller} rejected: not a trusted verifier");
    Err(RegistryError::NotTrustedVerifier(caller.0.clone()))
}

/// Look up an agent that must exist and be active.
pub(crate) fn require_active<'a>(
    agent: Option<&'a AgentIdentity>,
    agent_id: &AgentId,
) -> Result<&'a AgentIdentity> {
    match agent {
        Some(agent) if agent.is_active => Ok(agent),
        _ => Err(RegistryError::AgentNotActive(agent_id.0.clone())),
    }
}

pub(crate) fn require_known<'a>(
    agent: Option<&'a AgentIdentity>,
    agent_id: &AgentId,
) -> Result<&'a AgentIdentity> {
    agent.ok_or_else(|| RegistryError::AgentNotFound(agent_id.0.clone()))
}
