//! Identity store types: principals, agent records, signed registration.
//!
//! A [`Principal`] is a caller. An [`AgentIdentity`] binds an [`AgentId`]
//! to its owning principal; [`RegistrationRequest`] lets an owner authorize
//! a relayer to register on its behalf.

pub mod agent;
pub mod principal;
pub mod registration;

pub use agent::{generate_agent_id, AgentId, AgentIdentity, AgentType};
pub use principal::{Principal, PrincipalKey};
pub use registration::{registration_message_hash, verify_owner_signature, RegistrationRequest};
