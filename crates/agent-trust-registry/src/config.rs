//! Registry configuration.
//!
//! Fixed at initialization and persisted alongside the registry data so
//! that a reopened registry keeps its administrator and instance id.

use serde::{Deserialize, Serialize};

use crate::crypto::random::random_instance_id;
use crate::identity::Principal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Bound into every registration signature; distinguishes this
    /// registry from any other deployment.
    pub registry_instance_id: String,
    /// Bootstrapping principal. Holds admin rights and starts out as a
    /// trusted verifier.
    pub admin: Principal,
    /// Initialization timestamp (microseconds since epoch).
    pub created_at: u64,
}

impl RegistryConfig {
    /// Configuration with a freshly generated instance id.
    pub fn new(admin: Principal, created_at: u64) -> Self {
        Self::with_instance_id(admin, random_instance_id(), created_at)
    }

    pub fn with_instance_id(
        admin: Principal,
        registry_instance_id: impl Into<String>,
        created_at: u64,
    ) -> Self {
        Self {
            registry_instance_id: registry_instance_id.into(),
            admin,
            created_at,
        }
    }
}
