use std::sync::Arc;

use super::{Config, Op, PbClient, PutAppendArgs};

use labrpc::{rand, tokio::time, Dialer};
use log::{debug, trace};
use viewservice::{Membership, View};

/// Client for a primary/backup pair.
///
/// Every call retries until the primary of the moment accepts it. A write
/// keeps its request id across retries, so it is applied at most once.
pub struct Clerk {
    me: String,
    membership: Arc<dyn Membership>,
    dialer: Dialer,
    config: Config,
    view: View,
}

impl Clerk {
    /// Create a clerk identified as `me`. Two clerks must not share an id.
    pub fn new(
        me: impl Into<String>,
        membership: impl Membership + 'static,
        dialer: Dialer,
        config: Config,
    ) -> Self {
        Self {
            me: me.into(),
            membership: Arc::new(membership),
            dialer,
            config,
            view: View::default(),
        }
    }

    /// Fetch the current value of `key`, empty if it was never written.
    pub async fn get(&mut self, key: impl Into<String>) -> String {
        let key = key.into();
        loop {
            if let Some(primary) = self.primary().await {
                match primary.get(key.clone()).await {
                    Ok(Ok(value)) => return value,
                    Ok(Err(e)) => debug!("{} get({}) refused by {}: {}", self.me, key, self.view.primary, e),
                    Err(e) => debug!("{} get({}) failed: {}", self.me, key, e),
                }
            }
            self.backoff().await;
        }
    }

    /// Set `key` to `value`.
    pub async fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put_append(key.into(), value.into(), Op::Put).await
    }

    /// Concatenate `value` onto the current value of `key`.
    pub async fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put_append(key.into(), value.into(), Op::Append).await
    }

    async fn put_append(&mut self, key: String, value: String, op: Op) {
        let args = PutAppendArgs {
            key,
            value,
            op,
            client: self.me.clone(),
            uuid: format!("{:032x}", rand::random::<u128>()),
        };
        loop {
            if let Some(primary) = self.primary().await {
                match primary.put_append(args.clone()).await {
                    Ok(Ok(())) => return,
                    Ok(Err(e)) => debug!("{} {:?}({}) refused by {}: {}", self.me, op, args.key, self.view.primary, e),
                    Err(e) => debug!("{} {:?}({}) failed: {}", self.me, op, args.key, e),
                }
            }
            self.backoff().await;
        }
    }

    async fn primary(&mut self) -> Option<PbClient> {
        if !self.view.has_primary() {
            self.refresh().await;
        }
        if self.view.has_primary() {
            let primary = self
                .dialer
                .dial::<PbClient>(&self.view.primary)
                .with_timeout(self.config.rpc_timeout());
            Some(primary)
        } else {
            None
        }
    }

    async fn refresh(&mut self) {
        match self.membership.get().await {
            Ok(view) => {
                trace!("{} sees {:?}", self.me, view);
                self.view = view;
            }
            Err(e) => debug!("{} cannot reach view service: {}", self.me, e),
        }
    }

    async fn backoff(&mut self) {
        time::sleep(self.config.retry_interval()).await;
        self.refresh().await;
    }
}
