//! Reputation: recording interactions and reading scores.

use crate::error::{RegistryError, Result};
use crate::identity::{AgentId, Principal};
use crate::reputation::{
    paginate, validate_weight, Interaction, RankedAgent, ReputationData, ReputationSummary,
};

use super::guard::{require_active, require_admin, require_known};
use super::{RegistryEvent, TrustRegistry};

impl TrustRegistry {
    /// Record an interaction from `from_agent` against `to_agent` and fold
    /// its outcome into the target's reputation.
    ///
    /// A success adds `weight` to the score; a failure subtracts
    /// `weight / 2`.
    ///
    /// # Errors
    ///
    /// `NotAgentOwner` unless the caller owns `from_agent`,
    /// `AgentNotActive` unless `to_agent` is active, `InvalidWeight` for a
    /// weight outside `1..=100`.
    pub fn record_interaction(
        &self,
        caller: &Principal,
        from_agent: &AgentId,
        to_agent: &AgentId,
        success: bool,
        weight: u32,
        interaction_type: &str,
    ) -> Result<ReputationSummary> {
        let mut state = self.write();

        match state.agents.get(from_agent) {
            Some(source) if &source.owner == caller => {}
            _ => {
                log::warn!("{caller} rejected: does not own source agent {from_agent}");
                return Err(RegistryError::NotAgentOwner(from_agent.0.clone()));
            }
        }
        require_active(state.agents.get(to_agent), to_agent)?;
        validate_weight(weight)?;

        let now = self.clock.now_micros();
        let mut reputation = state.reputations.get(to_agent).cloned().unwrap_or_default();
        reputation.apply(success, weight, now);
        let interaction = Interaction {
            from_agent: from_agent.clone(),
            to_agent: to_agent.clone(),
            success,
            weight,
            timestamp: now,
            interaction_type: interaction_type.to_string(),
        };

        self.persist(|txn| {
            txn.append_interaction(&interaction)?;
            txn.save_reputation(to_agent, &reputation)
        })?;

        let summary = reputation.summary();
        state.ranking.upsert(to_agent, reputation.score);
        state.reputations.insert(to_agent.clone(), reputation);
        state
            .interactions
            .entry(to_agent.clone())
            .or_default()
            .push(interaction);
        state.events.push(
            now,
            RegistryEvent::InteractionRecorded {
                from_agent: from_agent.clone(),
                to_agent: to_agent.clone(),
                success,
                weight,
                score: summary.score,
            },
        );
        log::info!(
            "interaction {from_agent} -> {to_agent} success={success} weight={weight} score={}",
            summary.score
        );
        Ok(summary)
    }

    /// Reputation summary of an agent, including inactive ones.
    pub fn get_reputation(&self, agent_id: &AgentId) -> Result<ReputationSummary> {
        self.get_reputation_data(agent_id).map(|r| r.summary())
    }

    /// Full reputation totals, including weights and the last interaction time.
    pub fn get_reputation_data(&self, agent_id: &AgentId) -> Result<ReputationData> {
        let state = self.read();
        require_known(state.agents.get(agent_id), agent_id)?;
        Ok(state.reputations.get(agent_id).cloned().unwrap_or_default())
    }

    /// Page through the interactions recorded against `agent_id`, oldest
    /// first. Empty when `offset` is past the end or the agent is unknown.
    pub fn get_interaction_history(
        &self,
        agent_id: &AgentId,
        offset: usize,
        limit: usize,
    ) -> Vec<Interaction> {
        let state = self.read();
        state
            .interactions
            .get(agent_id)
            .map(|history| paginate(history, offset, limit))
            .unwrap_or_default()
    }

    /// Number of interactions in an agent's live history.
    pub fn interaction_count(&self, agent_id: &AgentId) -> usize {
        self.read().interactions.get(agent_id).map_or(0, Vec::len)
    }

    /// The `limit` highest-scoring active agents, ties by ascending id.
    pub fn get_top_agents(&self, limit: usize) -> Vec<RankedAgent> {
        self.read().ranking.top(limit)
    }

    /// Archive all but the newest `keep_last` interactions of an agent.
    ///
    /// Archived entries move to the store's archive log; retained entries
    /// are not modified and reputation totals are unchanged. Returns the
    /// number of interactions archived. Admin only.
    pub fn compact_interactions(
        &self,
        caller: &Principal,
        agent_id: &AgentId,
        keep_last: usize,
    ) -> Result<usize> {
        let mut state = self.write();
        require_admin(&state.config, caller, "compact_interactions")?;
        require_known(state.agents.get(agent_id), agent_id)?;

        let history = state.interactions.get(agent_id).map_or(&[][..], Vec::as_slice);
        let split = history.len().saturating_sub(keep_last);
        if split == 0 {
            return Ok(0);
        }
        let (archived, retained) = history.split_at(split);
        self.persist(|txn| txn.archive_interactions(agent_id, archived, retained))?;

        let retained = retained.to_vec();
        state.interactions.insert(agent_id.clone(), retained);
        log::info!("archived {split} interactions of {agent_id}");
        Ok(split)
    }

    /// Interactions moved out of the live history by
    /// [`compact_interactions`](Self::compact_interactions), oldest first.
    /// Always empty for in-memory registries.
    pub fn get_archived_interactions(&self, agent_id: &AgentId) -> Result<Vec<Interaction>> {
        match self.store() {
            Some(store) => store.load_archived_interactions(agent_id),
            None => Ok(Vec::new()),
        }
    }
}
