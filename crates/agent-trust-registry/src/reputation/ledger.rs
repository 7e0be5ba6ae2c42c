//! Reputation accounting: weighted interaction outcomes.
//!
//! A success adds its full weight to the score; a failure subtracts half
//! of it (integer division), so reputation is harder to lose than to gain.

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::identity::AgentId;

/// Smallest accepted interaction weight.
pub const MIN_WEIGHT: u32 = 1;
/// Largest accepted interaction weight.
pub const MAX_WEIGHT: u32 = 100;

/// Reject weights outside `MIN_WEIGHT..=MAX_WEIGHT`.
pub fn validate_weight(weight: u32) -> Result<()> {
    if (MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
        Ok(())
    } else {
        Err(RegistryError::InvalidWeight(weight))
    }
}

/// Running reputation totals for one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationData {
    pub total_interactions: u64,
    pub successful_interactions: u64,
    pub total_weight: u64,
    pub success_weight: u64,
    /// Timestamp of the latest recorded interaction (0 if none).
    pub last_interaction_at: u64,
    pub score: i64,
}

impl ReputationData {
    /// Fold one interaction outcome into the totals.
    ///
    /// `weight` must already have passed [`validate_weight`].
    pub fn apply(&mut self, success: bool, weight: u32, now: u64) {
        let weight = u64::from(weight);
        self.total_interactions += 1;
        self.total_weight += weight;
        self.last_interaction_at = now;

        if success {
            self.successful_interactions += 1;
            self.success_weight += weight;
            self.score += weight as i64;
        } else {
            self.score -= (weight / 2) as i64;
        }
    }

    /// Percentage of successful interactions, rounded down. 0 when empty.
    pub fn success_rate(&self) -> u64 {
        if self.total_interactions == 0 {
            0
        } else {
            self.successful_interactions * 100 / self.total_interactions
        }
    }

    pub fn summary(&self) -> ReputationSummary {
        ReputationSummary {
            total_interactions: self.total_interactions,
            successful_interactions: self.successful_interactions,
            success_rate: self.success_rate(),
            score: self.score,
        }
    }
}

/// Public view returned by `get_reputation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationSummary {
    pub total_interactions: u64,
    pub successful_interactions: u64,
    /// `successful * 100 / total`, 0 when there are no interactions.
    pub success_rate: u64,
    pub score: i64,
}

/// One recorded interaction. Never edited once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub from_agent: AgentId,
    pub to_agent: AgentId,
    pub success: bool,
    pub weight: u32,
    /// Recording timestamp (microseconds since epoch).
    pub timestamp: u64,
    pub interaction_type: String,
}

/// Return `history[offset..offset + limit]`, clamped; empty past the end.
pub fn paginate<T: Clone>(history: &[T], offset: usize, limit: usize) -> Vec<T> {
    if offset >= history.len() {
        return Vec::new();
    }
    let end = offset.saturating_add(limit).min(history.len());
    history[offset..end].to_vec()
}
