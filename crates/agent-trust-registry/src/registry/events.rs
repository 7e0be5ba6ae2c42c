//! Registry event journal.
//!
//! Every committed mutation appends one event. Collaborators that only
//! read registry state can follow changes with [`events_since`] instead of
//! re-reading every record.
//!
//! [`events_since`]: crate::registry::TrustRegistry::events_since

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::identity::{AgentId, AgentType, Principal};
use crate::verification::ClaimHash;

/// Events retained in memory. Older events are dropped first.
pub const EVENT_JOURNAL_CAPACITY: usize = 4096;

/// A committed registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    AgentRegistered {
        agent_id: AgentId,
        owner: Principal,
        agent_type: AgentType,
    },
    AgentMetadataUpdated {
        agent_id: AgentId,
        metadata_uri: String,
    },
    AgentDeactivated {
        agent_id: AgentId,
        by: Principal,
    },
    InteractionRecorded {
        from_agent: AgentId,
        to_agent: AgentId,
        success: bool,
        weight: u32,
        score: i64,
    },
    VerifierAdded {
        verifier: Principal,
    },
    VerifierRemoved {
        verifier: Principal,
    },
    CapabilityVerified {
        agent_id: AgentId,
        claim: ClaimHash,
        verifier: Principal,
        expires_at: u64,
    },
    CapabilityRevoked {
        agent_id: AgentId,
        claim: ClaimHash,
        by: Principal,
    },
}

/// An event with its position in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Starts at 1; strictly increasing.
    pub seq: u64,
    pub timestamp: u64,
    pub event: RegistryEvent,
}

/// Bounded in-memory journal.
#[derive(Debug)]
pub struct EventJournal {
    records: VecDeque<EventRecord>,
    next_seq: u64,
    capacity: usize,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::with_capacity(EVENT_JOURNAL_CAPACITY)
    }
}

impl EventJournal {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            next_seq: 1,
            capacity: capacity.max(1),
        }
    }

    /// Append an event and return its sequence number.
    pub fn push(&mut self, timestamp: u64, event: RegistryEvent) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(EventRecord {
            seq,
            timestamp,
            event,
        });
        seq
    }

    /// Retained events with `seq > after`, oldest first.
    pub fn since(&self, after: u64) -> Vec<EventRecord> {
        // Sequence numbers are contiguous within the deque.
        let skip = match self.records.front() {
            Some(first) if after >= first.seq => {
                (after - first.seq + 1).min(self.records.len() as u64) as usize
            }
            _ => 0,
        };
        self.records.iter().skip(skip).cloned().collect()
    }

    /// Sequence number of the newest event, 0 if none yet.
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
