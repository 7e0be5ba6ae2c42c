//! Agent registration, metadata updates and deactivation.

use crate::error::{RegistryError, Result};
use crate::identity::{
    verify_owner_signature, AgentId, AgentIdentity, AgentType, Principal, RegistrationRequest,
};
use crate::reputation::ReputationData;

use super::guard::{require_known, require_owner, require_owner_or_admin};
use super::{RegistryEvent, RegistryState, TrustRegistry};

impl TrustRegistry {
    /// Register `agent_id` with the caller as owner.
    ///
    /// # Errors
    ///
    /// `AlreadyRegistered` if the id exists, `InvalidMetadata` for an empty
    /// URI, `InvalidIdentifier` for an id that is not a valid record key.
    pub fn register_agent(
        &self,
        caller: &Principal,
        agent_id: &AgentId,
        metadata_uri: &str,
        agent_type: AgentType,
    ) -> Result<AgentIdentity> {
        let mut state = self.write();
        self.commit_registration(&mut state, caller, agent_id, metadata_uri, agent_type)
    }

    /// Register on behalf of `request.owner`, authorized by the owner's
    /// signature over the registration message.
    ///
    /// `caller` is only the relayer; the agent belongs to `request.owner`.
    ///
    /// # Errors
    ///
    /// `SignatureExpired` if the deadline has passed, `InvalidSignature` if
    /// the signature does not verify under the owner's key, then the same
    /// errors as [`register_agent`](Self::register_agent).
    pub fn register_agent_with_signature(
        &self,
        caller: &Principal,
        request: &RegistrationRequest,
        signature: &str,
    ) -> Result<AgentIdentity> {
        let mut state = self.write();

        let now = self.clock.now_micros();
        if now > request.deadline {
            return Err(RegistryError::SignatureExpired {
                deadline: request.deadline,
                now,
            });
        }

        let message_hash = request.message_hash(&state.config.registry_instance_id);
        if let Err(e) = verify_owner_signature(&request.owner, &message_hash, signature) {
            log::warn!(
                "relayed registration of {} by {caller} rejected: bad owner signature",
                request.agent_id
            );
            return Err(e);
        }

        let agent = self.commit_registration(
            &mut state,
            &request.owner,
            &request.agent_id,
            &request.metadata_uri,
            request.agent_type,
        )?;
        log::debug!("registration of {} relayed by {caller}", agent.id);
        Ok(agent)
    }

    /// Replace an agent's metadata URI. Owner only.
    pub fn update_agent_metadata(
        &self,
        caller: &Principal,
        agent_id: &AgentId,
        metadata_uri: &str,
    ) -> Result<AgentIdentity> {
        let mut state = self.write();
        let agent = require_known(state.agents.get(agent_id), agent_id)?;
        require_owner(agent, caller)?;
        if !agent.is_active {
            return Err(RegistryError::AgentNotActive(agent_id.0.clone()));
        }
        validate_metadata_uri(metadata_uri)?;

        let mut updated = agent.clone();
        updated.metadata_uri = metadata_uri.to_string();
        self.persist(|txn| txn.save_agent(&updated))?;

        state.agents.insert(agent_id.clone(), updated.clone());
        let now = self.clock.now_micros();
        state.events.push(
            now,
            RegistryEvent::AgentMetadataUpdated {
                agent_id: agent_id.clone(),
                metadata_uri: metadata_uri.to_string(),
            },
        );
        log::info!("updated metadata of {agent_id}");
        Ok(updated)
    }

    /// Permanently deactivate an agent. Owner or admin.
    ///
    /// An inactive agent leaves the ranking, accepts no new interactions or
    /// claims, and can never be reactivated.
    pub fn deactivate_agent(&self, caller: &Principal, agent_id: &AgentId) -> Result<()> {
        let mut state = self.write();
        let agent = require_known(state.agents.get(agent_id), agent_id)?;
        require_owner_or_admin(&state.config, agent, caller)?;
        if !agent.is_active {
            return Err(RegistryError::AlreadyInactive(agent_id.0.clone()));
        }

        let mut updated = agent.clone();
        updated.is_active = false;
        self.persist(|txn| txn.save_agent(&updated))?;

        state.agents.insert(agent_id.clone(), updated);
        state.ranking.remove(agent_id);
        let now = self.clock.now_micros();
        state.events.push(
            now,
            RegistryEvent::AgentDeactivated {
                agent_id: agent_id.clone(),
                by: caller.clone(),
            },
        );
        log::info!("deactivated agent {agent_id} (by {caller})");
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub fn get_agent_metadata(&self, agent_id: &AgentId) -> Result<AgentIdentity> {
        self.read()
            .agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| RegistryError::AgentNotFound(agent_id.0.clone()))
    }

    /// Agents owned by `owner`, in registration order. Includes inactive ones.
    pub fn get_agents_by_owner(&self, owner: &Principal) -> Vec<AgentId> {
        self.read().owners.get(owner).cloned().unwrap_or_default()
    }

    /// `false` for unknown agents.
    pub fn is_agent_active(&self, agent_id: &AgentId) -> bool {
        self.read()
            .agents
            .get(agent_id)
            .is_some_and(|a| a.is_active)
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    fn commit_registration(
        &self,
        state: &mut RegistryState,
        owner: &Principal,
        agent_id: &AgentId,
        metadata_uri: &str,
        agent_type: AgentType,
    ) -> Result<AgentIdentity> {
        agent_id.validate()?;
        validate_metadata_uri(metadata_uri)?;
        if state.agents.contains_key(agent_id) {
            return Err(RegistryError::AlreadyRegistered(agent_id.0.clone()));
        }

        let now = self.clock.now_micros();
        let agent = AgentIdentity::new(
            agent_id.clone(),
            owner.clone(),
            metadata_uri.to_string(),
            agent_type,
            now,
        );
        let reputation = ReputationData::default();
        let mut owned = state.owners.get(owner).cloned().unwrap_or_default();
        owned.push(agent_id.clone());

        self.persist(|txn| {
            txn.save_agent(&agent)?;
            txn.save_reputation(agent_id, &reputation)?;
            txn.save_owned_agents(owner, &owned)
        })?;

        state.agents.insert(agent_id.clone(), agent.clone());
        state.reputations.insert(agent_id.clone(), reputation);
        state.owners.insert(owner.clone(), owned);
        state.ranking.upsert(agent_id, 0);
        state.events.push(
            now,
            RegistryEvent::AgentRegistered {
                agent_id: agent_id.clone(),
                owner: owner.clone(),
                agent_type,
            },
        );
        log::info!("registered agent {agent_id} ({agent_type}) for {owner}");
        Ok(agent)
    }
}

fn validate_metadata_uri(uri: &str) -> Result<()> {
    if uri.trim().is_empty() {
        return Err(RegistryError::InvalidMetadata(
            "metadata URI must not be empty".into(),
        ));
    }
    Ok(())
}
