use std::time::Duration;

use anyhow::{anyhow, Result};
use log::trace;
use tokio::{
    sync::{mpsc::Sender, oneshot},
    time,
};

use crate::network::NetworkPackage;

/// How long a call waits for its reply unless the client says otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

pub trait Client {
    fn from_server(server_id: String, net_tx: Sender<NetworkPackage>) -> Self;
}

/// Cloneable handle for creating clients after the network has been started.
#[derive(Debug, Clone)]
pub struct Dialer {
    tx: Sender<NetworkPackage>,
}

impl Dialer {
    pub(crate) fn new(tx: Sender<NetworkPackage>) -> Self {
        Self { tx }
    }

    pub fn dial<C: Client>(&self, server_id: &str) -> C {
        C::from_server(server_id.to_owned(), self.tx.clone())
    }
}

/// Send one request and wait for its reply.
///
/// Dropped requests, discarded replies, dead targets and slow servers all end
/// up as an error here; the caller cannot tell them apart.
pub async fn call(
    net_tx: &Sender<NetworkPackage>,
    to: &str,
    timeout: Duration,
    data: String,
) -> Result<String> {
    let (reply, rx) = oneshot::channel();
    net_tx
        .send(NetworkPackage {
            to: to.to_owned(),
            reply,
            data: data.clone(),
        })
        .await
        .map_err(|_| anyhow!("network is down"))?;

    match time::timeout(timeout, rx).await {
        Ok(Ok(resp)) => {
            trace!("req: {}, resp: {}", data, &resp);
            Ok(resp)
        }
        Ok(Err(_)) => Err(anyhow!("unable to receive from {}", to)),
        Err(_) => Err(anyhow!("call to {} timed out after {:?}", to, timeout)),
    }
}
