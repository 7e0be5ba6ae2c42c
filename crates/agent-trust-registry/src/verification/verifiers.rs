//! The trusted verifier set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::identity::Principal;

/// Principals allowed to issue and revoke capability claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierSet {
    members: BTreeSet<Principal>,
}

impl VerifierSet {
    /// A set seeded with the bootstrap principal.
    pub fn bootstrap(admin: &Principal) -> Self {
        let mut set = Self::default();
        set.add(admin.clone());
        set
    }

    /// Returns `false` if already present.
    pub fn add(&mut self, principal: Principal) -> bool {
        self.members.insert(principal)
    }

    /// Returns `false` if not present.
    pub fn remove(&mut self, principal: &Principal) -> bool {
        self.members.remove(principal)
    }

    pub fn contains(&self, principal: &Principal) -> bool {
        self.members.contains(principal)
    }

    /// Members in sorted order.
    pub fn members(&self) -> Vec<Principal> {
        self.members.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
