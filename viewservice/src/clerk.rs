use super::{View, ViewClient};

use labrpc::anyhow::Result;

/// What a server or client needs from the membership authority.
#[labrpc::async_trait]
pub trait Membership: Send + Sync {
    /// Report liveness and learn the current view.
    ///
    /// `viewnum` is the latest view the caller has seen.
    async fn ping(&self, viewnum: u64) -> Result<View>;
    /// Fetch the current view without reporting liveness.
    async fn get(&self) -> Result<View>;
}

/// Talks to a view service over the network on behalf of `me`.
#[derive(Debug, Clone)]
pub struct Clerk {
    me: String,
    client: ViewClient,
}

impl Clerk {
    /// Create a clerk for server `me`.
    pub fn new(me: impl Into<String>, client: ViewClient) -> Self {
        Self {
            me: me.into(),
            client,
        }
    }
}

#[labrpc::async_trait]
impl Membership for Clerk {
    async fn ping(&self, viewnum: u64) -> Result<View> {
        self.client.ping(self.me.clone(), viewnum).await
    }
    async fn get(&self) -> Result<View> {
        self.client.get().await
    }
}
