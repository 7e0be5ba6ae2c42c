//! The trust registry handle.
//!
//! [`TrustRegistry`] owns every collection behind a single `RwLock`.
//! Mutations take the write lock, run all checks, persist to the store
//! (when one is attached), and only then apply the change in memory, so a
//! rejected or failed operation leaves state untouched. Reads take the
//! read lock and see a consistent snapshot.
//!
//! Operations are split by area:
//!
//! - [`agents`]: registration, metadata, deactivation.
//! - [`interactions`]: reputation and interaction history.
//! - [`capabilities`]: trusted verifiers and capability claims.

pub mod agents;
pub mod capabilities;
pub mod events;
pub(crate) mod guard;
pub mod interactions;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::identity::{AgentId, AgentIdentity, Principal};
use crate::reputation::{Interaction, ReputationData, ScoreIndex};
use crate::storage::{RegistryStore, StoreTransaction};
use crate::time::{Clock, SystemClock};
use crate::verification::{ClaimHash, Verification, VerifierSet};

pub use events::{EventJournal, EventRecord, RegistryEvent};

// ── In-memory state ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct RegistryState {
    pub(crate) config: RegistryConfig,
    pub(crate) agents: HashMap<AgentId, AgentIdentity>,
    pub(crate) reputations: HashMap<AgentId, ReputationData>,
    /// Owned agents in registration order.
    pub(crate) owners: HashMap<Principal, Vec<AgentId>>,
    /// Per-target interaction log, insertion order.
    pub(crate) interactions: HashMap<AgentId, Vec<Interaction>>,
    pub(crate) verifications: HashMap<AgentId, BTreeMap<ClaimHash, Verification>>,
    /// Every claim ever verified per agent, duplicates kept.
    pub(crate) claim_index: HashMap<AgentId, Vec<ClaimHash>>,
    pub(crate) verifiers: VerifierSet,
    /// Active agents by score.
    pub(crate) ranking: ScoreIndex,
    pub(crate) events: EventJournal,
}

impl RegistryState {
    fn new(config: RegistryConfig) -> Self {
        let verifiers = VerifierSet::bootstrap(&config.admin);
        Self {
            config,
            agents: HashMap::new(),
            reputations: HashMap::new(),
            owners: HashMap::new(),
            interactions: HashMap::new(),
            verifications: HashMap::new(),
            claim_index: HashMap::new(),
            verifiers,
            ranking: ScoreIndex::new(),
            events: EventJournal::default(),
        }
    }
}

// ── TrustRegistry ─────────────────────────────────────────────────────────────

/// Identity, reputation and capability-verification registry.
///
/// Share between threads with `Arc<TrustRegistry>`; all methods take
/// `&self`.
pub struct TrustRegistry {
    state: RwLock<RegistryState>,
    store: Option<RegistryStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TrustRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustRegistry")
            .field("data_dir", &self.data_dir())
            .finish_non_exhaustive()
    }
}

impl TrustRegistry {
    /// Start configuring a registry administered by `admin`.
    pub fn builder(admin: Principal) -> TrustRegistryBuilder {
        TrustRegistryBuilder::new(admin)
    }

    /// An ephemeral registry with a fixed instance id and the system clock.
    pub fn in_memory(admin: Principal, registry_instance_id: impl Into<String>) -> Self {
        let config =
            RegistryConfig::with_instance_id(admin, registry_instance_id, crate::time::now_micros());
        Self::from_parts(RegistryState::new(config), None, Arc::new(SystemClock))
    }

    /// Open the registry stored under `dir`, initializing it with `admin`
    /// if the directory holds no registry yet.
    ///
    /// A registry that already exists keeps its persisted admin and
    /// instance id.
    pub fn open(dir: impl Into<PathBuf>, admin: Principal) -> Result<Self> {
        Self::builder(admin).data_dir(dir).build()
    }

    fn from_parts(state: RegistryState, store: Option<RegistryStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(state),
            store,
            clock,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn config(&self) -> RegistryConfig {
        self.read().config.clone()
    }

    pub fn admin(&self) -> Principal {
        self.read().config.admin.clone()
    }

    pub fn registry_instance_id(&self) -> String {
        self.read().config.registry_instance_id.clone()
    }

    /// Directory backing this registry, `None` when in memory.
    pub fn data_dir(&self) -> Option<&Path> {
        self.store.as_ref().map(|s| s.base_dir())
    }

    /// Current time as seen by this registry.
    pub fn now(&self) -> u64 {
        self.clock.now_micros()
    }

    /// Number of registered agents, active or not.
    pub fn agent_count(&self) -> usize {
        self.read().agents.len()
    }

    // ── Event journal ─────────────────────────────────────────────────────────

    /// Events with a sequence number greater than `after`, oldest first.
    ///
    /// The journal is bounded; a follower that falls too far behind sees a
    /// gap in sequence numbers.
    pub fn events_since(&self, after: u64) -> Vec<EventRecord> {
        self.read().events.since(after)
    }

    /// Sequence number of the newest event, 0 if none yet.
    pub fn last_event_seq(&self) -> u64 {
        self.read().events.last_seq()
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` inside a store transaction, committing only if it succeeds.
    /// No-op for in-memory registries.
    pub(crate) fn persist(
        &self,
        f: impl FnOnce(&mut StoreTransaction<'_>) -> Result<()>,
    ) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let mut txn = store.transaction();
        f(&mut txn)?;
        txn.commit();
        Ok(())
    }

    pub(crate) fn store(&self) -> Option<&RegistryStore> {
        self.store.as_ref()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Configures and opens a [`TrustRegistry`].
pub struct TrustRegistryBuilder {
    admin: Principal,
    registry_instance_id: Option<String>,
    clock: Arc<dyn Clock>,
    data_dir: Option<PathBuf>,
}

impl TrustRegistryBuilder {
    pub fn new(admin: Principal) -> Self {
        Self {
            admin,
            registry_instance_id: None,
            clock: Arc::new(SystemClock),
            data_dir: None,
        }
    }

    /// Fix the instance id instead of generating one. Ignored when
    /// reopening an existing registry.
    pub fn registry_instance_id(mut self, id: impl Into<String>) -> Self {
        self.registry_instance_id = Some(id.into());
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Persist to `dir`. Without this the registry lives in memory only.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<TrustRegistry> {
        let now = self.clock.now_micros();
        let Some(dir) = self.data_dir else {
            let config = match self.registry_instance_id {
                Some(id) => RegistryConfig::with_instance_id(self.admin, id, now),
                None => RegistryConfig::new(self.admin, now),
            };
            return Ok(TrustRegistry::from_parts(
                RegistryState::new(config),
                None,
                self.clock,
            ));
        };

        let store = RegistryStore::open(&dir)?;
        let state = match store.load_config()? {
            Some(config) => {
                if config.admin != self.admin {
                    log::warn!(
                        "registry at {} is administered by {}; ignoring {}",
                        dir.display(),
                        config.admin,
                        self.admin
                    );
                }
                if let Some(id) = &self.registry_instance_id {
                    if id != &config.registry_instance_id {
                        log::warn!(
                            "registry at {} keeps instance id {}; ignoring {id}",
                            dir.display(),
                            config.registry_instance_id
                        );
                    }
                }
                load_state(&store, config)?
            }
            None => {
                let config = match self.registry_instance_id {
                    Some(id) => RegistryConfig::with_instance_id(self.admin, id, now),
                    None => RegistryConfig::new(self.admin, now),
                };
                let state = RegistryState::new(config);
                // registry.json last: its presence marks a finished init.
                store.save_verifiers(&state.verifiers)?;
                store.save_config(&state.config)?;
                log::info!(
                    "initialized registry {} at {}",
                    state.config.registry_instance_id,
                    dir.display()
                );
                state
            }
        };

        Ok(TrustRegistry::from_parts(state, Some(store), self.clock))
    }
}

/// Rebuild in-memory state, including the ranking, from the store.
fn load_state(store: &RegistryStore, config: RegistryConfig) -> Result<RegistryState> {
    let mut state = RegistryState::new(config);
    if let Some(verifiers) = store.load_verifiers()? {
        state.verifiers = verifiers;
    }

    let stored = store.load_state()?;
    state.reputations = stored.reputations;
    state.owners = stored.owners;
    state.interactions = stored.interactions;
    state.claim_index = stored.claim_index;
    for (agent_id, records) in stored.verifications {
        let by_claim = records.into_iter().map(|v| (v.claim.clone(), v)).collect();
        state.verifications.insert(agent_id, by_claim);
    }
    for agent in stored.agents {
        let reputation = state.reputations.entry(agent.id.clone()).or_default();
        if agent.is_active {
            state.ranking.upsert(&agent.id, reputation.score);
        }
        state.agents.insert(agent.id.clone(), agent);
    }

    log::debug!(
        "reopened registry {} with {} agents",
        state.config.registry_instance_id,
        state.agents.len()
    );
    Ok(state)
}
