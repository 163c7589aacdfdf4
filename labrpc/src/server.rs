use crate::network::NetworkPackage;
use anyhow::Result;
use tokio::sync::mpsc::Sender;

#[async_trait::async_trait]
pub trait Server: Sized + Send {
    type Service;
    /// Wrap a service, returning the server and the channel the network delivers to.
    fn from_service(svc: Self::Service) -> (Self, Sender<NetworkPackage>);
    /// Accept one request. Fails once the node has been unplugged.
    async fn handle(&mut self) -> Result<()>;
    async fn run(&mut self) -> Result<()> {
        loop {
            self.handle().await?;
        }
    }
}
