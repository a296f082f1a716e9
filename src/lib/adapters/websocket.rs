use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket},
        WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;
use crate::core::{encode_init, encode_update, SyncError, Todo, WireMessage};
use crate::storage::TodoStore;
use crate::transport::configure_tls;
use uuid::Uuid;

#[cfg(feature = "tracing")]
use tracing::{info, debug, instrument, warn};

type Snapshot = Arc<Vec<Todo>>;

#[derive(Clone)]
pub struct HostConfig {
    pub channel_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
        }
    }
}

/// Reference todo host: one list, an `init` for every new socket and every
/// accepted `update` rebroadcast to all sockets.
pub struct TodoHost<S: TodoStore + 'static> {
    store: Arc<S>,
    snapshots: broadcast::Sender<Snapshot>,
    write_gate: Arc<Mutex<()>>,
}

impl<S: TodoStore + 'static> TodoHost<S> {
    pub fn new(store: Arc<S>, config: HostConfig) -> Self {
        let (snapshots, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            store,
            snapshots,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// The socket lives at the origin root, where the client looks for it.
    pub fn router(&self) -> Router {
        let store = self.store.clone();
        let snapshots = self.snapshots.clone();
        let write_gate = self.write_gate.clone();
        Router::new().route("/", get(move |ws: WebSocketUpgrade| {
            Self::handle_ws(ws, store.clone(), snapshots.clone(), write_gate.clone())
        }))
    }

    pub async fn serve(&self, addr: &str) -> Result<(), SyncError> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener).await
    }

    pub async fn serve_listener(&self, listener: TcpListener) -> Result<(), SyncError> {
        #[cfg(feature = "tracing")]
        info!(addr = ?listener.local_addr().ok(), "Todo host started");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Serves `wss://` using a PEM certificate chain and private key.
    pub async fn serve_tls(
        &self,
        addr: SocketAddr,
        cert_path: PathBuf,
        key_path: PathBuf,
    ) -> Result<(), SyncError> {
        let tls = configure_tls(cert_path, key_path).await?;
        #[cfg(feature = "tracing")]
        info!(addr = %addr, "Todo host started with TLS");
        axum_server::bind_rustls(addr, tls)
            .serve(self.router().into_make_service())
            .await?;
        Ok(())
    }

    async fn handle_ws(
        ws: WebSocketUpgrade,
        store: Arc<S>,
        snapshots: broadcast::Sender<Snapshot>,
        write_gate: Arc<Mutex<()>>,
    ) -> Response {
        ws.on_upgrade(move |socket| {
            Self::handle_connection(socket, Uuid::new_v4(), store, snapshots, write_gate)
        })
    }

    #[cfg_attr(feature = "tracing", instrument(skip(socket, store, snapshots, write_gate)))]
    async fn handle_connection(
        socket: WebSocket,
        conn_id: Uuid,
        store: Arc<S>,
        snapshots: broadcast::Sender<Snapshot>,
        write_gate: Arc<Mutex<()>>,
    ) {
        let (mut sender, mut receiver) = socket.split();
        // Subscribe before loading so no update slips between init and the feed.
        let mut updates = snapshots.subscribe();

        #[cfg(feature = "tracing")]
        info!("New WebSocket connection established");

        let init = match store.load().await.and_then(|todos| encode_init(&todos)) {
            Ok(frame) => frame,
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, "Failed to build init frame");
                #[cfg(not(feature = "tracing"))]
                let _ = e;
                return;
            }
        };
        if sender.send(AxumMessage::Text(init.into())).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                msg = receiver.next() => match msg {
                    Some(Ok(AxumMessage::Text(text))) => {
                        #[cfg(feature = "tracing")]
                        debug!(message = %text.as_str(), "Received WebSocket message");
                        Self::handle_frame(&store, &snapshots, &write_gate, text.as_str()).await;
                    }
                    Some(Ok(AxumMessage::Close(_))) | None => {
                        #[cfg(feature = "tracing")]
                        info!("WebSocket connection closed");
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        #[cfg(feature = "tracing")]
                        warn!(error = %e, "WebSocket message error");
                        #[cfg(not(feature = "tracing"))]
                        let _ = e;
                        break;
                    }
                },
                snapshot = updates.recv() => match snapshot {
                    Ok(todos) => {
                        let frame = match encode_update(&todos) {
                            Ok(frame) => frame,
                            Err(e) => {
                                #[cfg(feature = "tracing")]
                                warn!(error = %e, "Failed to encode update");
                                #[cfg(not(feature = "tracing"))]
                                let _ = e;
                                continue;
                            }
                        };
                        if sender.send(AxumMessage::Text(frame.into())).await.is_err() {
                            #[cfg(feature = "tracing")]
                            warn!("Failed to forward update to client");
                            break;
                        }
                    }
                    // Every snapshot is complete, so skipping to the newest is enough.
                    Err(RecvError::Lagged(skipped)) => {
                        #[cfg(feature = "tracing")]
                        debug!(skipped, "Connection lagged behind updates");
                        #[cfg(not(feature = "tracing"))]
                        let _ = skipped;
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    async fn handle_frame(
        store: &Arc<S>,
        snapshots: &broadcast::Sender<Snapshot>,
        write_gate: &Mutex<()>,
        text: &str,
    ) {
        match WireMessage::decode(text) {
            Ok(WireMessage::Update { data }) => {
                let _order = write_gate.lock().await;
                if let Err(e) = store.replace(data.clone()).await {
                    #[cfg(feature = "tracing")]
                    warn!(error = %e, "Failed to store update");
                    #[cfg(not(feature = "tracing"))]
                    let _ = e;
                    return;
                }
                #[cfg(feature = "tracing")]
                debug!(count = data.len(), "Broadcasting update");
                let _ = snapshots.send(Arc::new(data));
            }
            Ok(other) => {
                #[cfg(feature = "tracing")]
                debug!(message = ?other, "Ignoring client frame");
                #[cfg(not(feature = "tracing"))]
                let _ = other;
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, message = %text, "Failed to deserialize WebSocket message");
                #[cfg(not(feature = "tracing"))]
                let _ = e;
            }
        }
    }
}
