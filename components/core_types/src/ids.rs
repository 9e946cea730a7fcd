//! Identifiers that tie host handles to the isolate and callback they belong to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ISOLATE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an isolate.
///
/// Every handle produced by an isolate carries this id, so a handle presented
/// to the wrong isolate can be rejected instead of dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IsolateId(u64);

impl IsolateId {
    /// Allocate a fresh id. Ids are never reused within a process.
    pub fn next() -> Self {
        IsolateId(NEXT_ISOLATE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IsolateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "isolate#{}", self.0)
    }
}

/// Integer identifier bound to a host closure.
///
/// The id is stored as the bound data of the engine function, and the
/// callback bridge uses it to find which closure to invoke. Ids are scoped to
/// one isolate: the same number may name different closures in two isolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallbackId(pub i32);

impl From<i32> for CallbackId {
    fn from(id: i32) -> Self {
        CallbackId(id)
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callback#{}", self.0)
    }
}
