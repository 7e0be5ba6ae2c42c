//! Reputation ledger: weighted scores, interaction history, ranking.

pub mod ledger;
pub mod ranking;

pub use ledger::{
    paginate, validate_weight, Interaction, ReputationData, ReputationSummary, MAX_WEIGHT,
    MIN_WEIGHT,
};
pub use ranking::{RankedAgent, ScoreIndex};
