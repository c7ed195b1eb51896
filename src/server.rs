use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::field::display;
use tracing::{debug, error, info, instrument};

use crate::codec::{FrameCodec, DEFAULT_MAX_FRAME_SIZE};
use crate::commands;
use crate::connection::Connection;
use crate::store::Store;
use crate::Error;

pub const DEFAULT_PORT: u16 = 6359;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Upper bound on concurrently served connections. `None` serves every accepted connection
    /// right away.
    pub max_connections: Option<NonZeroUsize>,
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_connections: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let store = Store::new();

    info!("Server listening on {}", listener.local_addr()?);

    serve(listener, store, &config).await
}

/// Accepts connections forever, handling each one on its own task.
///
/// Failing to accept a connection is logged and does not stop the loop.
pub async fn serve(listener: TcpListener, store: Store, config: &Config) -> Result<(), Error> {
    let limit = config
        .max_connections
        .map(|n| Arc::new(Semaphore::new(n.get())));

    loop {
        let permit = match &limit {
            Some(limit) => Some(limit.clone().acquire_owned().await?),
            None => None,
        };

        let (socket, client_address) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let store = store.clone();
        let codec = FrameCodec::new(config.max_frame_size);
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, store, codec).await {
                error!("Connection with {} failed: {}", client_address, e);
            }
            drop(permit);
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, store, codec),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
    codec: FrameCodec,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream, client_address, codec);

    tracing::Span::current()
        .record("connection_id", display(conn.id))
        .record("client_address", display(client_address));

    while let Some(frame) = conn.read_frame().await? {
        debug!("Received frame from client: {:?}", frame);

        if let Some(reply) = commands::dispatch(frame, &store) {
            conn.write_frame(&reply).await?;
        }
    }

    info!("Connection closed");
    Ok(())
}
