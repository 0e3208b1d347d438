//! TCP transport: newline-delimited JSON frames bridging clients to rooms.
//!
//! Each connection gets a reader loop (decode frames, route to the registry)
//! and a writer task fed by an unbounded channel — the same channel the room
//! broadcasts into. The first frame must be `JOIN`; `VISIT` reuses the
//! identity captured at join time.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::logutil::escape_log;
use crate::room::messages::{ClientMessage, ServerMessage};
use crate::room::session::{ClientHandle, RoomDeps, SystemClock};
use crate::room::{Grid, RoomRegistry};
use crate::store::GameStore;
use crate::validation::validate_owner_id;

/// The assembled server: storage, catalog, and the room registry behind one
/// TCP listener.
pub struct GameServer {
    config: Config,
    registry: Arc<RoomRegistry>,
}

impl GameServer {
    pub fn new(config: Config) -> Result<Self> {
        let store = GameStore::open(&config.storage.data_dir)
            .with_context(|| format!("opening store at {}", config.storage.data_dir))?;
        let deps = RoomDeps {
            catalog: Arc::new(Catalog::standard()),
            store: Arc::new(store),
            clock: Arc::new(SystemClock),
            grid: Grid::new(config.server.grid_width, config.server.grid_height),
        };
        let registry = Arc::new(RoomRegistry::new(deps, config.server.max_clients_per_room));
        Ok(Self { config, registry })
    }

    /// Accept loop; runs until the listener fails.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.server.bind)
            .await
            .with_context(|| format!("binding {}", self.config.server.bind))?;
        info!("listening on {}", self.config.server.bind);

        loop {
            let (stream, addr) = listener.accept().await?;
            debug!("connection from {}", addr);
            let registry = self.registry.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, registry).await {
                    debug!("connection {} ended: {}", addr, err);
                }
            });
        }
    }
}

async fn handle_connection(stream: TcpStream, registry: Arc<RoomRegistry>) -> Result<()> {
    let session_id = Uuid::new_v4().to_string();
    let (reader, writer) = stream.into_split();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let writer_task = tokio::spawn(async move {
        let mut writer = BufWriter::new(writer);
        while let Some(message) = rx.recv().await {
            let mut line = match serde_json::to_string(&message) {
                Ok(line) => line,
                Err(err) => {
                    warn!("failed to encode server message: {}", err);
                    continue;
                }
            };
            line.push('\n');
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    // Identity captured from the first JOIN, reused for VISIT.
    let mut identity: Option<(String, Option<String>)> = None;

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let message: ClientMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(err) => {
                debug!(
                    "session {}: malformed frame: {} ({})",
                    escape_log(&session_id),
                    err,
                    escape_log(&line)
                );
                let _ = tx.send(ServerMessage::Error {
                    message: format!("Malformed message: {}", err),
                    retryable: false,
                });
                continue;
            }
        };

        match message {
            ClientMessage::Join(join) => {
                if let Err(err) = validate_owner_id(&join.owner_id) {
                    debug!(
                        "session {}: rejected owner id {}: {}",
                        escape_log(&session_id),
                        escape_log(&join.owner_id),
                        err
                    );
                    let _ = tx.send(ServerMessage::Error {
                        message: format!("Invalid owner id: {}", err),
                        retryable: false,
                    });
                    continue;
                }
                identity = Some((join.discord_id.clone(), join.display_name.clone()));
                registry
                    .join(
                        &join.owner_id,
                        ClientHandle {
                            session_id: session_id.clone(),
                            tx: tx.clone(),
                        },
                        &join.discord_id,
                        join.display_name,
                    )
                    .await;
            }
            ClientMessage::Visit(visit) => match identity.clone() {
                Some((discord_id, display_name)) => {
                    if let Err(err) = validate_owner_id(&visit.owner_id) {
                        let _ = tx.send(ServerMessage::Error {
                            message: format!("Invalid owner id: {}", err),
                            retryable: false,
                        });
                        continue;
                    }
                    registry
                        .visit(
                            ClientHandle {
                                session_id: session_id.clone(),
                                tx: tx.clone(),
                            },
                            &visit.owner_id,
                            &discord_id,
                            display_name,
                        )
                        .await;
                }
                None => {
                    let _ = tx.send(ServerMessage::Error {
                        message: "Join a room before visiting".to_string(),
                        retryable: false,
                    });
                }
            },
            other => {
                if !registry.dispatch(&session_id, other).await {
                    let _ = tx.send(ServerMessage::Error {
                        message: "Join a room first".to_string(),
                        retryable: false,
                    });
                }
            }
        }
    }

    registry.leave(&session_id).await;
    drop(tx); // lets the writer drain and exit
    let _ = writer_task.await;
    Ok(())
}
