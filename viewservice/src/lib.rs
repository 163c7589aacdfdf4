#![deny(missing_docs)]
#![deny(clippy::all)]
//! Membership views for a primary/backup pair, and the interface used to poll them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often servers ping the view service.
pub const PING_INTERVAL: Duration = Duration::from_millis(100);

/// One membership assignment.
///
/// An empty `primary` or `backup` means there is no such server in this view.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    /// Increases every time the assignment changes.
    pub viewnum: u64,
    /// Server allowed to serve clients.
    pub primary: String,
    /// Server mirroring the primary.
    pub backup: String,
}

impl View {
    /// Whether a primary is assigned.
    pub fn has_primary(&self) -> bool {
        !self.primary.is_empty()
    }

    /// Whether a backup is assigned.
    pub fn has_backup(&self) -> bool {
        !self.backup.is_empty()
    }
}

labrpc::service! {
    service view_svc {
        fn ping(me: String, viewnum: u64) -> View;
        fn get() -> View;
    }
}

pub use view_svc::{Client as ViewClient, Server as ViewServer, Service as ViewService};

mod assigner;
mod clerk;

pub use assigner::ViewAssigner;
pub use clerk::{Clerk, Membership};
