//! AgentTrustRegistry: identity, reputation and capability verification
//! for autonomous agents.
//!
//! Agents are registered by an owning principal (directly, or relayed with
//! the owner's Ed25519 signature), accrue a weighted reputation score from
//! recorded interactions, and carry capability claims issued by trusted
//! verifiers with expiry and revocation.

pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod registry;
pub mod reputation;
pub mod storage;
pub mod time;
pub mod verification;

// Re-export primary types
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use identity::{
    generate_agent_id, registration_message_hash, AgentId, AgentIdentity, AgentType, Principal,
    PrincipalKey, RegistrationRequest,
};
pub use registry::{EventRecord, RegistryEvent, TrustRegistry, TrustRegistryBuilder};
pub use reputation::{Interaction, RankedAgent, ReputationData, ReputationSummary};
pub use time::{Clock, ManualClock, SystemClock};
pub use verification::{generate_claim_hash, ClaimHash, Verification};
