#![deny(missing_docs)]
#![deny(clippy::all)]
//! Key-value store replicated on a primary/backup pair.
//!
//! Which server is primary and which is backup comes from a view service.
//! The primary forwards every write to the backup before applying it, and
//! pushes its whole state to a backup that has just been assigned.

use serde::{Deserialize, Serialize};

/// Why a request was refused. Success is `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PbError {
    /// The server is not primary in its current view.
    #[error("wrong server")]
    WrongServer,
    /// The primary could not forward the write, so nothing was applied.
    #[error("forward to backup failed")]
    ForwardFailed,
    /// The receiver of a forward is not backup or lacks a full copy yet,
    /// or the sender's view is stale.
    #[error("not backup")]
    NotBackup,
    /// The backup could not be reached.
    #[error("backup unreachable")]
    Unreachable,
}

/// Whether a write replaces or extends the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Overwrite.
    Put,
    /// Concatenate onto the current value.
    Append,
}

/// A client write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutAppendArgs {
    /// Key to write.
    pub key: String,
    /// Value to put or append.
    pub value: String,
    /// Put or Append.
    pub op: Op,
    /// Identity of the client issuing the write.
    pub client: String,
    /// Identifier of this request, kept across retries.
    pub uuid: String,
}

/// State pushed from primary to backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardArgs {
    /// View the primary was in when it sent this.
    pub viewnum: u64,
    /// Entries to install.
    pub delta: Delta,
    /// When set, `delta` is the primary's entire state and replaces the backup's.
    pub full: bool,
}

labrpc::service! {
    service pb_svc {
        fn get(key: String) -> Result<String, PbError>;
        fn put_append(args: PutAppendArgs) -> Result<(), PbError>;
        fn process_forward(args: ForwardArgs) -> Result<(), PbError>;
    }
}

pub use pb_svc::{Client as PbClient, Server as PbServer, Service as PbService};

/// Client of the replicated store.
pub mod client;
/// Timing knobs.
pub mod config;
/// Replica server.
pub mod kv;
mod role;
mod state;


pub use client::Clerk;
pub use config::Config;
pub use kv::Pbkv;
pub use role::Role;
pub use state::{Delta, ReplicaState};
