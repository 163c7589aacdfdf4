use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use futures::Future;
use log::{debug, info, trace, warn};
use rand::Rng;
use tokio::sync::{
    mpsc::{self, Receiver, Sender},
    oneshot,
};

use crate::{
    client::{Client, Dialer},
    server::Server,
};

/// Chance that a request to an unreliable node never reaches it.
const DROP_REQUEST: f64 = 0.1;
/// Chance that a delivered request to an unreliable node has its reply thrown away.
const DISCARD_REPLY: f64 = 0.2;

#[derive(Debug)]
pub struct NetworkPackage {
    pub to: String,
    pub reply: oneshot::Sender<String>,
    pub data: String,
}

#[derive(Debug)]
struct Node {
    tx: Sender<NetworkPackage>,
    unreliable: bool,
}

/// Control handle over the nodes plugged into a [Network].
#[derive(Debug, Clone, Default)]
pub struct Registry {
    nodes: Arc<Mutex<HashMap<String, Node>>>,
}

impl Registry {
    fn insert(&self, id: String, tx: Sender<NetworkPackage>) {
        let prev = self.nodes.lock().unwrap().insert(
            id.clone(),
            Node {
                tx,
                unreliable: false,
            },
        );
        if prev.is_some() {
            info!("node {} replaced", id);
        }
    }

    fn route(&self, to: &str) -> Option<(Sender<NetworkPackage>, bool)> {
        self.nodes
            .lock()
            .unwrap()
            .get(to)
            .map(|n| (n.tx.clone(), n.unreliable))
    }

    /// Plug `svc` in under `id` and return the routine serving it.
    ///
    /// The node is reachable as soon as this returns. Registering an id twice
    /// replaces the old node, which then stops.
    pub fn register<S>(&self, id: &str, svc: S::Service) -> impl Future<Output = ()>
    where
        S: Server + 'static,
    {
        let id = id.to_owned();
        let (mut server, tx) = S::from_service(svc);
        self.insert(id.clone(), tx);
        async move {
            if let Err(e) = server.run().await {
                info!("server {} stopped: {}", id, e);
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.lock().unwrap().contains_key(id)
    }

    /// Unplug a node. Its server routine ends and every later call to it fails.
    pub fn kill(&self, id: &str) -> bool {
        let killed = self.nodes.lock().unwrap().remove(id).is_some();
        if killed {
            info!("node {} killed", id);
        }
        killed
    }

    pub fn set_unreliable(&self, id: &str, unreliable: bool) {
        if let Some(n) = self.nodes.lock().unwrap().get_mut(id) {
            n.unreliable = unreliable;
        }
    }
}

pub struct Network {
    tx: Sender<NetworkPackage>,
    rx: Receiver<NetworkPackage>,
    registry: Registry,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(100);
        Self {
            tx,
            rx,
            registry: Registry::default(),
        }
    }

    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    pub fn dialer(&self) -> Dialer {
        Dialer::new(self.tx.clone())
    }

    pub fn client<C: Client>(&self, id: &str) -> C {
        self.dialer().dial(id)
    }

    /// See [Registry::register].
    pub fn register<S>(&self, id: &str, svc: S::Service) -> impl Future<Output = ()>
    where
        S: Server + 'static,
    {
        self.registry.register::<S>(id, svc)
    }

    pub async fn run(&mut self) {
        while let Some(p) = self.rx.recv().await {
            self.deliver(p).await;
        }
    }

    async fn deliver(&self, p: NetworkPackage) {
        let (node, unreliable) = match self.registry.route(&p.to) {
            Some(x) => x,
            None => {
                debug!("node {} not found, dropped", p.to);
                return;
            }
        };

        let p = if unreliable {
            let (drop_request, discard_reply) = {
                let mut rng = rand::thread_rng();
                (rng.gen_bool(DROP_REQUEST), rng.gen_bool(DISCARD_REPLY))
            };
            if drop_request {
                trace!("request to {} dropped", p.to);
                return;
            } else if discard_reply {
                trace!("reply from {} will be dropped", p.to);
                let (reply, _) = oneshot::channel();
                NetworkPackage { reply, ..p }
            } else {
                p
            }
        } else {
            p
        };

        if node.send(p).await.is_err() {
            warn!("send to node failed, dropped");
        }
    }
}
