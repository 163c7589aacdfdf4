use std::sync::{Arc, Mutex};

use super::{View, ViewService};

use labrpc::anyhow::{bail, Result};
use log::{info, trace};

/// A view service whose assignments are made by hand.
///
/// It never detects failures or promotes anyone; whoever holds a handle
/// decides each new view with [ViewAssigner::assign].
#[derive(Debug, Clone, Default)]
pub struct ViewAssigner {
    view: Arc<Mutex<View>>,
}

impl ViewAssigner {
    /// Start at view 0, which has neither primary nor backup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the next view. Empty strings leave a role unassigned.
    pub fn assign(&self, primary: &str, backup: &str) -> Result<View> {
        if !primary.is_empty() && primary == backup {
            bail!("{} cannot be both primary and backup", primary);
        }
        let mut view = self.view.lock().unwrap();
        *view = View {
            viewnum: view.viewnum + 1,
            primary: primary.to_owned(),
            backup: backup.to_owned(),
        };
        info!("assigned {:?}", *view);
        Ok(view.clone())
    }

    /// The view currently handed out.
    pub fn current(&self) -> View {
        self.view.lock().unwrap().clone()
    }
}

#[labrpc::async_trait]
impl ViewService for ViewAssigner {
    async fn ping(&self, me: String, viewnum: u64) -> View {
        let view = self.current();
        trace!("ping from {} at view {}, current {}", me, viewnum, view.viewnum);
        view
    }
    async fn get(&self) -> View {
        self.current()
    }
}
