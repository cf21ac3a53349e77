use clap::Parser;
use log::info;
use server::network::{Server, ServerMessage};
use shared::DEFAULT_GRID_SIZE;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Relay pairing two snake clients", long_about = None)]
struct Args {
    /// Relay IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Relay port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Grid size used when drawing the initial food cell
    #[arg(short, long, default_value_t = DEFAULT_GRID_SIZE)]
    grid_size: i32,

    /// Seconds of silence after which a participant is dropped
    #[arg(short, long, default_value = "5")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    let mut server = Server::new(
        &address,
        args.grid_size,
        Duration::from_secs(args.timeout_secs),
    )
    .await?;

    let shutdown = server.shutdown_sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            let _ = shutdown.send(ServerMessage::Shutdown);
        }
    });

    server.run().await?;

    Ok(())
}
