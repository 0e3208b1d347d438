//! Binary entrypoint for the Homestead room server.
//!
//! Commands:
//! - `start [--bind <addr>]` - run the room server
//! - `init` - create a starter `config.toml`
//! - `status` - print store statistics for the configured data directory
//!
//! See the library crate docs for module-level details: `homestead::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use homestead::config::Config;
use homestead::net::GameServer;
use homestead::store::GameStore;

#[derive(Parser)]
#[command(name = "homestead")]
#[command(about = "Authoritative room server for a social house-decorating game")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the room server
    Start {
        /// Listen address (overrides config), e.g. 0.0.0.0:2567
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Initialize a new server configuration
    Init,
    /// Show store statistics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start { bind } => {
            let mut config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            if let Some(bind) = bind {
                config.server.bind = bind;
                config.validate()?;
            }
            info!("Starting Homestead v{}", env!("CARGO_PKG_VERSION"));
            let server = GameServer::new(config)?;
            server.run().await?;
        }
        Commands::Init => {
            if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                eprintln!("Refusing to overwrite existing {}", cli.config);
                std::process::exit(1);
            }
            Config::create_default(&cli.config).await?;
            println!("Wrote default configuration to {}", cli.config);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let store = GameStore::open(&config.storage.data_dir)?;
            let stats = store.stats()?;
            println!("Homestead store at {}", config.storage.data_dir);
            println!("  placed items:      {}", stats.house_items);
            println!("  inventory entries: {}", stats.inventory_entries);
            println!("  users:             {}", stats.users);
            println!("  pets:              {}", stats.pets);
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // Base level from CLI verbosity overrides config
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level.as_str())
            .and_then(|level| level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    if let Some(file) = config.as_ref().and_then(|c| c.logging.file.clone()) {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // When stdout is a terminal, echo log lines to the console too.
            let is_tty = atty::is(atty::Stream::Stdout);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }

    let _ = builder.try_init();
}
