use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};

use crate::client::ClientConfig;
use crate::core::{ConnectionState, SyncError, TodoSession};
use crate::render::{DateFormatter, Renderer};

#[cfg(feature = "tracing")]
use tracing::{debug, info, instrument, warn};

type WsConnection = WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
enum Command {
    Toggle(i64),
    Shutdown,
}

enum Next {
    Reconnect,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStatus {
    pub state: ConnectionState,
    pub attempts: u64,
}

/// Cheap, cloneable way to drive a running [`TodoSyncClient`].
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ClientStatus>,
}

impl ClientHandle {
    /// Asks the client to toggle the todo with this id, as a checkbox change would.
    pub fn toggle(&self, id: i64) -> Result<(), SyncError> {
        self.commands
            .send(Command::Toggle(id))
            .map_err(|_| SyncError::Closed)
    }

    /// Closes the connection and stops reconnecting.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    pub fn status(&self) -> ClientStatus {
        *self.status.borrow()
    }

    pub async fn wait_for(
        &mut self,
        mut ready: impl FnMut(&ClientStatus) -> bool,
    ) -> Result<ClientStatus, SyncError> {
        self.status
            .wait_for(|status| ready(status))
            .await
            .map(|status| *status)
            .map_err(|_| SyncError::Closed)
    }
}

/// Keeps one WebSocket open to the todo host, re-rendering on every snapshot
/// and reconnecting after a fixed delay whenever the socket goes away.
pub struct TodoSyncClient<R: Renderer> {
    config: ClientConfig,
    session: TodoSession<R>,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ClientStatus>,
}

impl<R: Renderer> TodoSyncClient<R> {
    pub fn new(config: ClientConfig, renderer: R) -> Result<(Self, ClientHandle), SyncError> {
        let dates = DateFormatter::for_locale(&config.locale)?;
        Ok(Self::with_formatter(config, renderer, dates))
    }

    pub fn with_formatter(
        config: ClientConfig,
        renderer: R,
        dates: DateFormatter,
    ) -> (Self, ClientHandle) {
        let session = TodoSession::new(renderer, dates);
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(ClientStatus {
            state: session.state(),
            attempts: session.attempts(),
        });
        let client = Self { config, session, commands, status };
        let handle = ClientHandle { commands: commands_tx, status: status_rx };
        (client, handle)
    }

    pub fn session(&self) -> &TodoSession<R> {
        &self.session
    }

    /// Runs until shut down, then hands back the renderer.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(url = %self.config.url)))]
    pub async fn run(mut self) -> R {
        loop {
            self.session.begin_connect();
            self.publish_status();

            let url = self.config.url.clone();
            let connecting = connect_async(url.as_str());
            tokio::pin!(connecting);

            // Toggles that arrive mid-handshake wait for the outcome.
            let mut pending = Vec::new();
            let connected = loop {
                tokio::select! {
                    result = &mut connecting => break Some(result),
                    command = self.commands.recv() => match command {
                        Some(Command::Toggle(id)) => pending.push(id),
                        Some(Command::Shutdown) | None => break None,
                    },
                }
            };

            let next = match connected {
                None => {
                    #[cfg(feature = "tracing")]
                    debug!("Shutdown requested while connecting");
                    Next::Stop
                }
                Some(Ok((ws, _))) => {
                    self.session.opened();
                    self.publish_status();
                    #[cfg(feature = "tracing")]
                    info!(attempt = self.session.attempts(), "Connected to todo host");
                    self.pump(ws, pending).await
                }
                Some(Err(source)) => {
                    let err = SyncError::Connect { url: self.config.url.clone(), source };
                    #[cfg(feature = "tracing")]
                    warn!(error = %err, attempt = self.session.attempts(), "Connection attempt failed");
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                    for id in pending {
                        self.toggle(id);
                    }
                    Next::Reconnect
                }
            };

            self.session.closed();
            self.publish_status();

            if let Next::Stop = next {
                break;
            }
            if let Next::Stop = self.wait_to_reconnect().await {
                break;
            }
        }

        #[cfg(feature = "tracing")]
        info!("Sync client stopped");
        self.session.into_renderer()
    }

    async fn pump(&mut self, ws: WsConnection, pending: Vec<i64>) -> Next {
        let (mut sender, mut receiver) = ws.split();
        for id in pending {
            let Some(frame) = self.toggle(id) else { continue };
            if sender.send(WsMessage::Text(frame)).await.is_err() {
                return Next::Reconnect;
            }
        }
        loop {
            tokio::select! {
                frame = receiver.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => self.on_frame(&text),
                    Some(Ok(WsMessage::Binary(_))) => {
                        #[cfg(feature = "tracing")]
                        debug!("Binary frames are not part of the todo protocol; ignoring");
                    }
                    // Close replies and pongs are queued by the transport and
                    // flushed on the next poll; the stream ends after that.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        #[cfg(feature = "tracing")]
                        warn!(error = %SyncError::Transport(e), "Connection lost");
                        #[cfg(not(feature = "tracing"))]
                        let _ = e;
                        return Next::Reconnect;
                    }
                    None => {
                        #[cfg(feature = "tracing")]
                        info!("Connection closed by host");
                        return Next::Reconnect;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(Command::Toggle(id)) => {
                        let Some(frame) = self.toggle(id) else { continue };
                        if let Err(e) = sender.send(WsMessage::Text(frame)).await {
                            #[cfg(feature = "tracing")]
                            warn!(error = %e, "Failed to send update");
                            #[cfg(not(feature = "tracing"))]
                            let _ = e;
                            return Next::Reconnect;
                        }
                    }
                    Some(Command::Shutdown) | None => {
                        let _ = sender.send(WsMessage::Close(None)).await;
                        return Next::Stop;
                    }
                },
            }
        }
    }

    async fn wait_to_reconnect(&mut self) -> Next {
        let delay = tokio::time::sleep(self.config.reconnect_interval);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = &mut delay => return Next::Reconnect,
                command = self.commands.recv() => match command {
                    Some(Command::Toggle(id)) => {
                        if self.toggle(id).is_some() {
                            #[cfg(feature = "tracing")]
                            debug!(id, "Not connected; update kept locally until the next snapshot");
                        }
                    }
                    Some(Command::Shutdown) | None => return Next::Stop,
                },
            }
        }
    }

    fn on_frame(&mut self, text: &str) {
        match self.session.apply_frame(text) {
            Ok(Some(count)) => {
                #[cfg(feature = "tracing")]
                debug!(count, "Applied snapshot");
                #[cfg(not(feature = "tracing"))]
                let _ = count;
            }
            Ok(None) => {
                #[cfg(feature = "tracing")]
                debug!(frame = %text, "Ignoring frame with unhandled type");
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, frame = %text, "Ignoring malformed frame");
                #[cfg(not(feature = "tracing"))]
                let _ = e;
            }
        }
    }

    fn toggle(&mut self, id: i64) -> Option<String> {
        match self.session.toggle(id) {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                #[cfg(feature = "tracing")]
                debug!(id, "Toggle for unknown todo ignored");
                None
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, id, "Failed to encode update");
                #[cfg(not(feature = "tracing"))]
                let _ = e;
                None
            }
        }
    }

    fn publish_status(&self) {
        self.status.send_replace(ClientStatus {
            state: self.session.state(),
            attempts: self.session.attempts(),
        });
    }
}
