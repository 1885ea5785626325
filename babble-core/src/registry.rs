//! The shared client registry: a many-readers/few-writers map from client key
//! to client bundle.
//!
//! Generalized from the original's fixed `MAX_CLIENT`-sized array with a
//! linear scan (`registration_table` in `babble_registration.c`) to a hash map
//! under a [`WriterPreferringLock`], preserving the same capacity check and
//! the same reader/writer exclusion, without the O(n) lookup.
//!
//! One behavioral change from the source, noted rather than silently carried:
//! the original's `registration_insert` *replaces* an existing entry with the
//! same key ("Warning: Replacing existing client entry"); this registry
//! instead rejects the insert with [`RegistryError::Duplicate`], matching the
//! contract `spec.md` §4.A actually specifies and scenario S3.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::command::{Answer, AnswerSink};
use crate::error::RegistryError;
use crate::hash::hash_name;

/// A client's 64-bit identifier. Key `0` is reserved "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientKey(pub u64);

impl ClientKey {
    pub const UNSET: ClientKey = ClientKey(0);

    pub fn from_name(name: &str) -> ClientKey {
        hash_name(name)
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One publication in a client's own timeline.
#[derive(Debug, Clone)]
pub struct Publication {
    pub author: String,
    pub text: String,
    /// Global monotonic sequence, used to merge several clients' timelines
    /// into one newest-first stream without relying on wall-clock time.
    pub seq: u64,
}

/// Fields mutated by business logic while a client is live. Guarded
/// independently of the registry lock: ownership of these fields is
/// established by shard serialization for the client's own commands, and by
/// this per-bundle mutex for the rarer cross-client touch (FOLLOW updating a
/// target's `followers`).
#[derive(Debug, Default)]
pub struct ClientState {
    pub followers: HashSet<ClientKey>,
    pub followed: HashSet<ClientKey>,
    pub timeline: VecDeque<Publication>,
}

/// A registered client and everything the server needs to reach it.
pub struct ClientBundle {
    pub key: ClientKey,
    pub name: String,
    pub sink: Arc<dyn AnswerSink>,
    pub state: Mutex<ClientState>,
}

impl ClientBundle {
    pub fn new(key: ClientKey, name: String, sink: Arc<dyn AnswerSink>) -> Self {
        ClientBundle {
            key,
            name,
            sink,
            state: Mutex::new(ClientState::default()),
        }
    }

    pub fn push_answer(&self, answer: Answer) {
        self.sink.send_answer(&answer);
    }
}

/// Thread-safe mapping of client key to client bundle.
pub struct Registry {
    table: crate::rwlock::WriterPreferringLock<HashMap<ClientKey, Arc<ClientBundle>>>,
    capacity: usize,
    next_seq: AtomicU64,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Registry {
            table: crate::rwlock::WriterPreferringLock::new(HashMap::new()),
            capacity,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Insert a newly logged-in client. Fails with `Full` at capacity, or
    /// `Duplicate` if the key is already registered.
    pub fn insert(&self, bundle: Arc<ClientBundle>) -> Result<(), RegistryError> {
        let mut table = self.table.write();
        if table.len() >= self.capacity {
            return Err(RegistryError::Full);
        }
        if table.contains_key(&bundle.key) {
            return Err(RegistryError::Duplicate);
        }
        table.insert(bundle.key, bundle);
        Ok(())
    }

    /// Look up a registered client. Never blocks other concurrent lookups.
    pub fn lookup(&self, key: ClientKey) -> Option<Arc<ClientBundle>> {
        if key == ClientKey::UNSET {
            return None;
        }
        self.table.read().get(&key).cloned()
    }

    /// Remove a registered client. Succeeds exactly once per key.
    pub fn remove(&self, key: ClientKey) -> Option<Arc<ClientBundle>> {
        self.table.write().remove(&key)
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate the next sequence number for a freshly published message.
    pub fn next_publication_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}
