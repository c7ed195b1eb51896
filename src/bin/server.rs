use clap::Parser;
use std::num::NonZeroUsize;
use respkv::codec::DEFAULT_MAX_FRAME_SIZE;
use respkv::server::{self, Config, DEFAULT_PORT};
use respkv::Error;

#[derive(Parser, Debug)]
struct Args {
    /// The address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// The port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Serve at most this many connections at once
    #[arg(long)]
    max_connections: Option<NonZeroUsize>,

    /// Close connections whose buffered frame grows past this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    server::run(Config {
        host: args.host,
        port: args.port,
        max_connections: args.max_connections,
        max_frame_size: args.max_frame_size,
    })
    .await
}
