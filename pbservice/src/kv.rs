use std::sync::Arc;

use super::{Config, Delta, ForwardArgs, PbClient, PbError, PbService, PutAppendArgs, ReplicaState, Role};

use labrpc::{
    tokio::{self, sync::Mutex, task::JoinHandle, time},
    Dialer,
};
use log::{debug, info, trace, warn};
use viewservice::{Membership, View};

struct Inner {
    view: View,
    state: ReplicaState,
    // Set while the current backup has not received a full copy of the state.
    resync_pending: bool,
    // Set once this replica, as backup, has installed a full copy since it
    // last became backup. Deltas are refused until then.
    backup_synced: bool,
}

/// One replica of the store.
///
/// Clones share the same state, so one clone can be served on the network
/// while another drives [Pbkv::tick].
#[derive(Clone)]
pub struct Pbkv {
    me: String,
    inner: Arc<Mutex<Inner>>,
    membership: Arc<dyn Membership>,
    dialer: Dialer,
    config: Config,
}

impl Pbkv {
    /// Create replica `me`, starting empty at view 0.
    pub fn new(
        me: impl Into<String>,
        membership: impl Membership + 'static,
        dialer: Dialer,
        config: Config,
    ) -> Self {
        Self {
            me: me.into(),
            inner: Arc::new(Mutex::new(Inner {
                view: View::default(),
                state: ReplicaState::new(),
                resync_pending: false,
                backup_synced: false,
            })),
            membership: Arc::new(membership),
            dialer,
            config,
        }
    }

    /// Identity of this replica.
    pub fn me(&self) -> &str {
        &self.me
    }

    /// The view this replica currently acts on.
    pub async fn view(&self) -> View {
        self.inner.lock().await.view.clone()
    }

    /// Role of this replica in its current view.
    pub async fn role(&self) -> Role {
        Role::resolve(&self.me, &self.inner.lock().await.view)
    }

    /// Copy of the store and dedup ledger.
    pub async fn snapshot(&self) -> Delta {
        self.inner.lock().await.state.snapshot()
    }

    /// Push `delta` to the backup of `view`. Succeeds trivially without one.
    async fn forward(&self, view: &View, delta: Delta, full: bool) -> Result<(), PbError> {
        if !view.has_backup() {
            return Ok(());
        }
        let backup = self
            .dialer
            .dial::<PbClient>(&view.backup)
            .with_timeout(self.config.rpc_timeout());
        let args = ForwardArgs {
            viewnum: view.viewnum,
            delta,
            full,
        };
        match backup.process_forward(args).await {
            Ok(status) => status,
            Err(e) => {
                debug!("{} cannot reach backup {}: {}", self.me, view.backup, e);
                Err(PbError::Unreachable)
            }
        }
    }

    /// Poll the view service once and move to the view it returns.
    ///
    /// A primary whose backup just changed sends it the whole state. If that
    /// transfer fails it is tried again on the next tick, and any write in
    /// between carries the whole state instead of a delta.
    pub async fn tick(&self) {
        let viewnum = self.inner.lock().await.view.viewnum;
        let view = match self.membership.ping(viewnum).await {
            Ok(view) => view,
            Err(e) => {
                warn!("{} failed to ping view service, keeping view {}: {}", self.me, viewnum, e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        if view.viewnum < inner.view.viewnum {
            debug!("{} ignores older view {:?}", self.me, view);
            return;
        }

        let me = self.me.as_str();
        let was_backup = Role::resolve(me, &inner.view) == Role::Backup;
        // Only a server primary in the new view that held the data in the old
        // one (as primary, or as the backup being promoted) pushes its state.
        let held_data = me == inner.view.primary || me == inner.view.backup;
        let needs_full_resync = view.has_backup()
            && view.backup != inner.view.backup
            && me == view.primary
            && held_data;
        if view != inner.view {
            info!("{} moves to {:?} as {:?}", me, view, Role::resolve(me, &view));
        }
        inner.view = view;

        if Role::resolve(me, &inner.view) != Role::Backup || !was_backup {
            inner.backup_synced = false;
        }
        if Role::resolve(me, &inner.view) != Role::Primary || !inner.view.has_backup() {
            inner.resync_pending = false;
        } else if needs_full_resync {
            inner.resync_pending = true;
        }

        if inner.resync_pending {
            let snapshot = inner.state.snapshot();
            info!(
                "{} transfers {} keys to backup {}",
                me,
                snapshot.entries.len(),
                inner.view.backup
            );
            let transferred = self.forward(&inner.view, snapshot, true).await;
            match transferred {
                Ok(()) => inner.resync_pending = false,
                Err(e) => warn!("{} failed to transfer state to {}: {}", me, inner.view.backup, e),
            }
        }
    }

    /// Run [Pbkv::tick] every ping interval until the task is aborted.
    pub fn spawn_ticker(&self) -> JoinHandle<()> {
        let kv = self.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(kv.config.ping_interval());
            loop {
                interval.tick().await;
                kv.tick().await;
            }
        })
    }
}

#[labrpc::async_trait]
impl PbService for Pbkv {
    async fn get(&self, key: String) -> Result<String, PbError> {
        let inner = self.inner.lock().await;
        if Role::resolve(&self.me, &inner.view) != Role::Primary {
            debug!("{} refuses get({}) at view {}", self.me, key, inner.view.viewnum);
            return Err(PbError::WrongServer);
        }
        Ok(inner.state.get(&key))
    }

    async fn put_append(&self, args: PutAppendArgs) -> Result<(), PbError> {
        let mut inner = self.inner.lock().await;
        if Role::resolve(&self.me, &inner.view) != Role::Primary {
            debug!("{} refuses {:?}({}) at view {}", self.me, args.op, args.key, inner.view.viewnum);
            return Err(PbError::WrongServer);
        }
        if inner.state.is_duplicate(&args.client, &args.uuid) {
            trace!("{} already applied {} from {}", self.me, args.uuid, args.client);
            return Ok(());
        }

        let delta = inner.state.stage(&args);
        let mut full = inner.resync_pending;
        let mut forwarded = self
            .forward(&inner.view, payload(&inner.state, &delta, full), full)
            .await;
        if forwarded == Err(PbError::NotBackup) && !full {
            // The backup may have restarted empty; give it everything.
            debug!("{} resends whole state to {}", self.me, inner.view.backup);
            inner.resync_pending = true;
            full = true;
            forwarded = self
                .forward(&inner.view, payload(&inner.state, &delta, full), full)
                .await;
        }
        if let Err(e) = forwarded {
            warn!("{} drops {:?}({}) from {}: {}", self.me, args.op, args.key, args.client, e);
            return Err(PbError::ForwardFailed);
        }

        inner.state.apply(delta);
        if full {
            inner.resync_pending = false;
        }
        Ok(())
    }

    async fn process_forward(&self, args: ForwardArgs) -> Result<(), PbError> {
        let mut inner = self.inner.lock().await;
        if Role::resolve(&self.me, &inner.view) != Role::Backup {
            debug!("{} is not backup at view {}, forward dropped", self.me, inner.view.viewnum);
            return Err(PbError::NotBackup);
        }
        if args.viewnum < inner.view.viewnum {
            debug!(
                "{} drops forward from view {}, now at {}",
                self.me, args.viewnum, inner.view.viewnum
            );
            return Err(PbError::NotBackup);
        }
        if args.full {
            inner.state.replace(args.delta);
            inner.backup_synced = true;
        } else if inner.backup_synced {
            inner.state.apply(args.delta);
        } else {
            debug!("{} has no full copy yet, delta dropped", self.me);
            return Err(PbError::NotBackup);
        }
        Ok(())
    }
}

/// What a write forwards: the bare delta, or the whole state with it merged in.
fn payload(state: &ReplicaState, delta: &Delta, full: bool) -> Delta {
    if full {
        let mut snapshot = state.snapshot();
        snapshot.merge(delta.clone());
        snapshot
    } else {
        delta.clone()
    }
}
