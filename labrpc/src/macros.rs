#[macro_export]
macro_rules! service {
    () => {
        compile_error!("empty service is not allowed");
    };
    (
        $(#[$service_attr:meta])*
        service $svc_name:ident {
            $(
                $(#[$method_attr:meta])*
                fn $method_name:ident($($arg_id:ident: $arg_ty:ty),*) -> $output:ty;
            )*
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$service_attr])*
        pub mod $svc_name {
            use super::*;

            use std::sync::Arc;
            use std::time::Duration;

            use $crate::network::NetworkPackage;
            use $crate::{server, client};

            use $crate::tokio::sync::mpsc::{self, Sender, Receiver};
            use $crate::serde_json;
            use $crate::serde::{Serialize, Deserialize};
            use $crate::anyhow::anyhow;
            use $crate::async_trait;
            use $crate::log::{error, trace};


            #[derive(Debug, Deserialize, Serialize)]
            pub enum Request {
                $(
                    #[allow(non_camel_case_types)]
                    $method_name {  $($arg_id : $arg_ty),* }
                ),*
            }

            mod response {
                use super::*;
                $(
                    #[derive(Deserialize, Serialize)]
                    #[allow(non_camel_case_types)]
                    pub struct $method_name {
                        pub data: $output
                    }
                )*
            }

            /// Application status belongs in the output type; a service
            /// method cannot fail at the transport level.
            #[async_trait]
            pub trait Service: Send + Sync + 'static {
                $(
                    $(#[$method_attr])*
                    async fn $method_name(&self, $($arg_id : $arg_ty),* ) -> $output;
                )*
            }

            async fn dispatch<T: Service>(svc: &T, data: &str) -> $crate::anyhow::Result<String> {
                let req: Request = serde_json::from_str(data)?;
                match req {
                    $(
                        Request::$method_name { $($arg_id),* } => {
                            let data = svc.$method_name($($arg_id),* ).await;
                            Ok(serde_json::to_string(&response::$method_name { data })?)
                        }
                    )*
                }
            }

            #[derive(Debug, Clone)]
            pub struct Client {
                server_id: String,
                tx: Sender<NetworkPackage>,
                timeout: Duration,
            }

            impl Client {

                $(
                    pub async fn $method_name(&self, $($arg_id : $arg_ty),* ) -> $crate::anyhow::Result<$output> {
                        let req = Request::$method_name {
                            $($arg_id),*
                        };
                        let resp = self.call(serde_json::to_string(&req)?).await?;
                        let resp: response::$method_name = serde_json::from_str(&resp)?;
                        Ok(resp.data)
                    }
                )*

                pub fn server_id(&self) -> &str {
                    &self.server_id
                }

                pub fn with_timeout(mut self, timeout: Duration) -> Self {
                    self.timeout = timeout;
                    self
                }

                pub async fn call(&self, req: String) -> $crate::anyhow::Result<String> {
                    client::call(&self.tx, &self.server_id, self.timeout, req).await
                }
            }

            impl client::Client for Client {
                fn from_server(server_id: String, net_tx: Sender<NetworkPackage>) -> Self {
                    Self {
                        server_id,
                        tx: net_tx,
                        timeout: client::DEFAULT_TIMEOUT,
                    }
                }
            }

            /// Serves each request on its own task.
            pub struct Server<T: Service> {
                svc: Arc<T>,
                rx: Receiver<NetworkPackage>,
            }

            #[async_trait]
            impl<T: Service> server::Server for Server<T> {
                type Service = T;

                fn from_service(svc: Self::Service) -> (Self, Sender<NetworkPackage>) {
                    let (tx, rx) = mpsc::channel(100);
                    (Self { svc: Arc::new(svc), rx }, tx)
                }

                async fn handle(&mut self) -> $crate::anyhow::Result<()> {
                    let NetworkPackage { to, reply, data } = self
                        .rx
                        .recv()
                        .await
                        .ok_or_else(|| anyhow!("unplugged from network"))?;
                    trace!("{} recv: {}", to, &data);
                    let svc = self.svc.clone();
                    $crate::tokio::spawn(async move {
                        match dispatch(&*svc, &data).await {
                            Ok(resp) => {
                                trace!("{} send: {}", to, &resp);
                                if reply.send(resp).is_err() {
                                    trace!("{} reply discarded", to);
                                }
                            }
                            Err(e) => error!("{} failed to handle {}: {}", to, data, e),
                        }
                    });
                    Ok(())
                }
            }
        }
    };
}
