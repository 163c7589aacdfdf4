use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Op, PutAppendArgs};

/// Entries to install on a replica: store values plus dedup records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// key -> value.
    pub entries: HashMap<String, String>,
    /// client -> uuid of its last committed write.
    pub seen: HashMap<String, String>,
}

impl Delta {
    /// Fold `other` into `self`, its entries winning.
    pub fn merge(&mut self, other: Delta) {
        self.entries.extend(other.entries);
        self.seen.extend(other.seen);
    }
}

/// The logical store of one replica and its dedup ledger.
///
/// The two live in separate maps, so any string is a valid key.
#[derive(Debug, Default)]
pub struct ReplicaState {
    store: HashMap<String, String>,
    seen: HashMap<String, String>,
}

impl ReplicaState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key`, empty when absent.
    pub fn get(&self, key: &str) -> String {
        self.store.get(key).cloned().unwrap_or_default()
    }

    /// Whether `uuid` is the last write committed for `client`.
    pub fn is_duplicate(&self, client: &str, uuid: &str) -> bool {
        self.seen.get(client).map_or(false, |last| last == uuid)
    }

    /// Build the delta committing `args` without touching the state.
    pub fn stage(&self, args: &PutAppendArgs) -> Delta {
        let value = match args.op {
            Op::Put => args.value.clone(),
            Op::Append => self.get(&args.key) + &args.value,
        };
        let mut delta = Delta::default();
        delta.entries.insert(args.key.clone(), value);
        delta.seen.insert(args.client.clone(), args.uuid.clone());
        delta
    }

    /// Merge `delta` key by key.
    pub fn apply(&mut self, delta: Delta) {
        self.store.extend(delta.entries);
        self.seen.extend(delta.seen);
    }

    /// Become exactly `snapshot`.
    pub fn replace(&mut self, snapshot: Delta) {
        self.store = snapshot.entries;
        self.seen = snapshot.seen;
    }

    /// Copy of everything, in the shape a full resync sends.
    pub fn snapshot(&self) -> Delta {
        Delta {
            entries: self.store.clone(),
            seen: self.seen.clone(),
        }
    }

    /// Number of keys in the store.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
