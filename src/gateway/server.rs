//! Gateway TCP server
//!
//! This module implements the server that listens for client connections,
//! admits at most one session at a time and drives the per-session event
//! loop. Each inbound frame is dispatched as its own task so a suspended
//! command (movement, calibration) never blocks the session from handling
//! further events; replies flow through a single writer task.

use crate::error::{LinkError, Result};
use crate::facility::DeviceFacility;
use crate::gateway::CommandRouter;
use crate::monitoring::Monitor;
use crate::protocol::{EventFrame, ReplyFrame};
use crate::session::SessionGuard;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Replies buffered per session before dispatch tasks backpressure
const REPLY_BUFFER_SIZE: usize = 64;

/// Gateway server managing the listener and the single active session
pub struct GatewayServer {
    /// Bound TCP listener
    listener: TcpListener,
    /// Single-session admission guard
    guard: Arc<SessionGuard>,
    /// Command router shared by all session tasks
    router: Arc<CommandRouter>,
    /// Facility boundary, reset on every disconnect
    facility: Arc<dyn DeviceFacility>,
    /// Shared activity monitor
    monitor: Arc<Monitor>,
}

impl GatewayServer {
    /// Bind the gateway listener on `addr`
    pub async fn bind(
        addr: &str,
        facility: Arc<dyn DeviceFacility>,
        monitor: Arc<Monitor>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| LinkError::Transport(format!("Failed to bind {}: {}", addr, e)))?;

        let router = Arc::new(CommandRouter::new(facility.clone(), monitor.clone()));

        Ok(Self {
            listener,
            guard: Arc::new(SessionGuard::new()),
            router,
            facility,
            monitor,
        })
    }

    /// Address the gateway is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| LinkError::Transport(format!("Failed to read local address: {}", e)))
    }

    /// Run the accept loop.
    ///
    /// A connection is admitted only when no session is active; every other
    /// attempt is refused at the transport level by closing the socket, with
    /// no Result Protocol reply. The loop keeps accepting (and refusing)
    /// while a session runs, so a concurrent attempt is turned away
    /// promptly rather than parked in the backlog.
    pub async fn run(self) -> Result<()> {
        info!("Gateway listening on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    if !self.guard.try_attach() {
                        info!(
                            "Refusing connection from {}: a session is already active",
                            peer
                        );
                        self.monitor.record_session_rejected();
                        drop(stream);
                        continue;
                    }

                    info!("Session attached: {}", peer);
                    self.monitor.record_session_attached();

                    let router = self.router.clone();
                    let facility = self.facility.clone();
                    let guard = self.guard.clone();
                    let monitor = self.monitor.clone();
                    tokio::spawn(async move {
                        handle_session(stream, peer, router, facility, guard, monitor).await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Drive one admitted session until the client disconnects.
///
/// On disconnect the cleanup order is load-bearing: in-flight command tasks
/// are abandoned first (their replies are never sent), then the facility is
/// reset, and only then is the guard released, so the next session can
/// never observe stale device bookkeeping.
async fn handle_session(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<CommandRouter>,
    facility: Arc<dyn DeviceFacility>,
    guard: Arc<SessionGuard>,
    monitor: Arc<Monitor>,
) {
    let (reader, writer) = stream.into_split();
    let (reply_tx, reply_rx) = mpsc::channel(REPLY_BUFFER_SIZE);
    let writer_task = tokio::spawn(write_replies(writer, reply_rx));
    let mut in_flight = JoinSet::new();

    read_events(reader, &router, &monitor, &reply_tx, &mut in_flight).await;

    in_flight.abort_all();
    while in_flight.join_next().await.is_some() {}
    drop(reply_tx);
    let _ = writer_task.await;

    facility.reset_all().await;
    guard.release();
    monitor.record_session_detached();
    info!("Session detached: {}", peer);
}

/// Read newline-delimited frames until the client disconnects, spawning one
/// dispatch task per event
async fn read_events(
    reader: OwnedReadHalf,
    router: &Arc<CommandRouter>,
    monitor: &Arc<Monitor>,
    reply_tx: &mpsc::Sender<ReplyFrame>,
    in_flight: &mut JoinSet<()>,
) {
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();

        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("Client closed the connection");
                break;
            }
            Ok(_) => {
                let frame_str = line.trim();
                if frame_str.is_empty() {
                    continue;
                }

                match EventFrame::from_json(frame_str) {
                    Ok(frame) => {
                        let router = router.clone();
                        let reply_tx = reply_tx.clone();
                        in_flight.spawn(async move {
                            if let Some(reply) = router.dispatch(frame).await {
                                if reply_tx.send(reply).await.is_err() {
                                    debug!("Reply channel closed before send");
                                }
                            }
                        });

                        // Reap dispatch tasks that have already finished
                        while in_flight.try_join_next().is_some() {}
                    }
                    Err(e) => {
                        // No event name to acknowledge; treat like an
                        // unknown event and keep the session alive
                        info!("Ignoring unparseable frame: {}", e);
                        monitor.record_protocol_error();
                    }
                }
            }
            Err(e) => {
                warn!("Failed to read from client: {}", e);
                break;
            }
        }
    }
}

/// Write reply frames to the client until the channel closes
async fn write_replies(mut writer: OwnedWriteHalf, mut replies: mpsc::Receiver<ReplyFrame>) {
    while let Some(reply) = replies.recv().await {
        let reply_str = match reply.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize reply: {}", e);
                continue;
            }
        };

        if let Err(e) = writer.write_all(reply_str.as_bytes()).await {
            warn!("Failed to write reply: {}", e);
            break;
        }
        if let Err(e) = writer.write_all(b"\n").await {
            warn!("Failed to write frame delimiter: {}", e);
            break;
        }
        if let Err(e) = writer.flush().await {
            warn!("Failed to flush reply: {}", e);
            break;
        }
    }
}
