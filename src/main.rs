//! Pin Pilot - Remote GPIO Control Binary
//!
//! A standalone binary serving the pin control API and live event stream.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pin_pilot::{
    default_adapter, edge_channel, read_host_telemetry, AccessRegistry, AppState, EventNotifier,
    MemoryAuditSink, PinStore, WebConfig, DEFAULT_BOARD, DEFAULT_WEB_PORT,
};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "pin_pilot")]
#[command(about = "📌 Pin Pilot - Remote GPIO Control for Raspberry Pi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Austin Couch")]
#[command(long_about = "Remote GPIO pin control for Raspberry Pi with a web API and live updates")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Force the simulated hardware backend (useful off-Pi)
    #[arg(long)]
    simulated: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve(ServeArgs),

    /// Print the board's pin capability table and exit
    Board,

    /// Print host telemetry and exit
    Info,
}

#[derive(Args)]
struct ServeArgs {
    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Maximum WebSocket connections
    #[arg(long, default_value_t = 100)]
    max_connections: usize,

    /// Require a bearer token, given as actor=token (repeatable)
    #[arg(long = "token", value_name = "ACTOR=TOKEN")]
    tokens: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    init_logging(&cli)?;

    // Print banner
    print_banner();

    match &cli.command {
        Some(Commands::Serve(args)) => {
            serve_command(&cli, args).await?;
        }
        Some(Commands::Board) => {
            board_command();
        }
        Some(Commands::Info) => {
            info_command();
        }
        None => {
            // Default to serve command
            let serve_args = ServeArgs {
                no_cors: false,
                max_connections: 100,
                tokens: Vec::new(),
            };
            serve_command(&cli, &serve_args).await?;
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn print_banner() {
    println!("📌 Pin Pilot - Remote GPIO Control");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!("   Built for live Raspberry Pi pin control");
    println!();
}

fn parse_tokens(raw: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(actor, token)| (actor.to_string(), token.to_string()))
                .with_context(|| format!("token '{}' is not in actor=token form", entry))
        })
        .collect()
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    info!("Starting Pin Pilot...");

    let board = Arc::new(DEFAULT_BOARD.clone());
    info!("Board map loaded: {} managed pins", board.len());

    let (edge_tx, edge_rx) = edge_channel();
    let adapter = default_adapter(cli.simulated, edge_tx)?;

    if cli.simulated {
        info!("Hardware backend: simulated (forced)");
    } else {
        #[cfg(feature = "gpio")]
        info!("Hardware backend: rppal");

        #[cfg(not(feature = "gpio"))]
        info!("Hardware backend: simulated (gpio feature not compiled)");
    }

    let registry = if args.tokens.is_empty() {
        AccessRegistry::open()
    } else {
        AccessRegistry::with_tokens(parse_tokens(&args.tokens)?)
    };

    let audit = Arc::new(MemoryAuditSink::default());
    let store = PinStore::new(board, adapter, EventNotifier::default(), audit.clone());
    let state = Arc::new(AppState {
        store,
        registry,
        audit,
    });

    let web_config = WebConfig::new(&cli.host, cli.port)
        .with_cors(!args.no_cors)
        .with_max_websocket_connections(args.max_connections);

    info!("Web server configuration:");
    info!("  - Bind address: {}:{}", cli.host, cli.port);
    info!("  - CORS enabled: {}", !args.no_cors);
    info!("  - Max WebSocket connections: {}", args.max_connections);
    info!("  - Authorization: {}", if state.registry.is_open() { "open" } else { "bearer tokens" });

    info!("Starting web server...");
    pin_pilot::start_web_server(web_config, state, edge_rx).await?;

    Ok(())
}

fn board_command() {
    println!("📌 Pin Capability Table");
    println!("=======================");
    println!();

    for entry in DEFAULT_BOARD.entries() {
        let roles: Vec<String> = entry
            .roles
            .iter()
            .map(|r| format!("{:?}", r))
            .collect();
        match &entry.bus {
            Some(bus) => println!(
                "  GPIO{:<3} {:<40} {}/{}",
                entry.pin,
                roles.join(", "),
                bus.bus,
                bus.signal
            ),
            None => println!("  GPIO{:<3} {}", entry.pin, roles.join(", ")),
        }
    }

    println!();
    println!("{} managed pins", DEFAULT_BOARD.len());
}

fn info_command() {
    println!("📌 Host Telemetry");
    println!("=================");
    println!();

    let mut telemetry: Vec<(String, String)> = read_host_telemetry().into_iter().collect();
    telemetry.sort();
    for (key, value) in telemetry {
        println!("  {:<28} {}", key, value);
    }
}
