//! Score-ordered secondary index backing `get_top_agents`.
//!
//! Kept in step with reputation updates so ranking never scans every
//! agent. Order is descending score, ties broken by ascending agent id.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::identity::AgentId;

/// One entry of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedAgent {
    pub agent_id: AgentId,
    pub score: i64,
}

#[derive(Debug, Default)]
pub struct ScoreIndex {
    ordered: BTreeSet<(Reverse<i64>, AgentId)>,
    scores: HashMap<AgentId, i64>,
}

impl ScoreIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an agent or move it to its new score.
    pub fn upsert(&mut self, agent_id: &AgentId, score: i64) {
        if let Some(old) = self.scores.insert(agent_id.clone(), score) {
            self.ordered.remove(&(Reverse(old), agent_id.clone()));
        }
        self.ordered.insert((Reverse(score), agent_id.clone()));
    }

    /// Drop an agent from the ranking. No-op if absent.
    pub fn remove(&mut self, agent_id: &AgentId) {
        if let Some(old) = self.scores.remove(agent_id) {
            self.ordered.remove(&(Reverse(old), agent_id.clone()));
        }
    }

    /// The `limit` highest-scoring agents.
    pub fn top(&self, limit: usize) -> Vec<RankedAgent> {
        self.ordered
            .iter()
            .take(limit)
            .map(|(Reverse(score), id)| RankedAgent {
                agent_id: id.clone(),
                score: *score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
