//! Belay chat terminal client entry point.

use std::{fs::File, io, path::PathBuf, sync::Mutex, time::Duration};

use belay_client::{ConnectionConfig, SessionConfig};
use belay_core::{BackoffPolicy, Environment, connection::DEFAULT_ENDPOINT};
use belay_tui::{AppEvent, ChatProvider, ProviderConfig, Runtime, SystemEnv, TerminalDriver, history};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Belay room chat terminal client
#[derive(Parser, Debug)]
#[command(name = "belay-chat")]
#[command(about = "Real-time room chat from the terminal")]
#[command(version)]
struct Args {
    /// Chat endpoint; the room id is appended as `<endpoint>/<room>`
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Room to open on start. Without it, use `/room <id>`.
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    room: Option<u64>,

    /// Sender id of the authenticated user. Random if omitted.
    #[arg(short, long)]
    sender: Option<u64>,

    /// JSON array of messages to seed the first room's log with
    #[arg(long, requires = "room")]
    history: Option<PathBuf>,

    /// Reconnect attempts before giving up
    #[arg(long, default_value = "5")]
    max_attempts: u32,

    /// Delay before the first reconnect, in milliseconds
    #[arg(long, default_value = "500")]
    backoff_ms: u64,

    /// Give up on a dial whose handshake takes longer, in milliseconds
    #[arg(long, default_value = "5000")]
    connect_timeout_ms: u64,

    /// Write logs to this file. The terminal is owned by the UI, so nothing
    /// is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(args: &Args) -> io::Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let env = SystemEnv::new();
    let sender_id = args.sender.unwrap_or_else(|| env.random_u64());

    let history = match (&args.history, args.room) {
        (Some(path), Some(room_id)) => history::load(path, room_id)?,
        _ => Vec::new(),
    };

    let config = ProviderConfig {
        session: SessionConfig {
            connection: ConnectionConfig {
                endpoint: args.endpoint,
                backoff: BackoffPolicy {
                    base: Duration::from_millis(args.backoff_ms),
                    ..BackoffPolicy::default()
                },
                max_attempts: args.max_attempts,
            },
            ..SessionConfig::default()
        },
    };

    tracing::info!(sender_id, room = ?args.room, "belay chat starting");

    let provider = ChatProvider::new(env, sender_id, config);
    let driver = TerminalDriver::new(Duration::from_millis(args.connect_timeout_ms))?;
    let mut runtime = Runtime::new(driver, provider);

    if let Some(room_id) = args.room {
        runtime.dispatch(AppEvent::OpenRoom { room_id, history }).await?;
    }

    Ok(runtime.run().await?)
}
