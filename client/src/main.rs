use clap::Parser;
use client::game::Game;
use client::network::{Client, UdpConnector};
use client::persistence::JsonLinesStore;
use client::rendering::{window_size, Renderer};
use client::scheduler::IntervalScheduler;
use client::sync::Synchronizer;
use log::{error, info};
use macroquad::window::Conf;
use shared::{GameConfig, GameMode, PlayerId, DEFAULT_GRID_SIZE, DEFAULT_REFRESH_RATE_MS};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay address to connect to in multiplayer
    #[arg(short = 's', long, default_value = "127.0.0.1:3001")]
    server: SocketAddr,

    /// Milliseconds between two ticks
    #[arg(short = 'r', long, default_value_t = DEFAULT_REFRESH_RATE_MS)]
    refresh_rate: u64,

    /// Number of cells per side of the square board
    #[arg(short = 'g', long, default_value_t = DEFAULT_GRID_SIZE)]
    grid_size: i32,

    /// Start in multiplayer mode
    #[arg(short = 'm', long)]
    multi: bool,

    /// File that finished single-player results are appended to
    #[arg(long, default_value = "snake-results.jsonl")]
    results: PathBuf,

    /// Cell size in pixels
    #[arg(long, default_value_t = 25.0)]
    cell_size: f32,
}

fn window_conf() -> Conf {
    // Parsed again in main; clap exits here on bad arguments before a window opens
    let args = Args::parse();
    let (width, height) = window_size(args.grid_size, args.cell_size);

    Conf {
        window_title: "Snake".to_string(),
        window_width: width,
        window_height: height,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    if let Err(e) = run(Args::parse()).await {
        error!("Client failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = GameConfig::new(args.refresh_rate, args.grid_size);
    config.validate()?;

    let mode = if args.multi {
        GameMode::Multi
    } else {
        GameMode::Single
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let handle = runtime.handle().clone();

    let player_id = PlayerId::generate();
    info!("Starting client as {}", player_id);
    info!("Relay: {}", args.server);
    info!("Results file: {}", args.results.display());
    info!("Controls: arrows to steer, Space/Enter to play or pause, M to switch mode, Esc to quit");

    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let scheduler = IntervalScheduler::new(handle.clone(), events_tx.clone());
    let connector = UdpConnector::new(handle.clone(), args.server, events_tx);
    let sync = Synchronizer::new(player_id, Box::new(connector));
    let results = JsonLinesStore::new(args.results, handle);

    let game = Game::new(config, mode, scheduler, sync, Box::new(results));
    let renderer = Renderer::new(args.grid_size, args.cell_size);

    let mut client = Client::new(game, events_rx, renderer);
    client.run().await;
    drop(client);

    // Background tasks are cancelled on shutdown, so give the final
    // disconnect and result write a moment to go out first
    std::thread::sleep(SHUTDOWN_GRACE);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    Ok(())
}
