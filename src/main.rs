//! filesync-server binary entry point.
//!
//! Usage:
//! ```bash
//! filesync-server -p 4500
//! filesync-server -p 4500 -d /srv/music --log-file serverLog.txt
//! filesync-server --help
//! ```
//!
//! Fatal startup errors (unusable directory, failure to bind or listen)
//! print a diagnostic and exit nonzero; once serving, per-client errors
//! never terminate the process.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use filesync_protocol::config::{ServerConfig, DEFAULT_LOG_FILE};
use filesync_protocol::transport::Server;
use filesync_protocol::utils::logging;

/// File synchronization server for a single flat directory.
#[derive(Parser, Debug)]
#[command(name = "filesync-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short = 'p', long)]
    port: u16,

    /// Directory whose files are served to clients
    #[arg(short = 'd', long, default_value = ".")]
    directory: PathBuf,

    /// Path of the append-only event log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Optional TOML configuration file; command-line flags take
    /// precedence over its values
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_tracing();

    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => match ServerConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };

    let config = {
        let mut config = base;
        config.port = cli.port;
        config.directory = cli.directory;
        config.log_file = cli.log_file;
        config
    };

    if let Err(e) = serve(config).await {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn serve(config: ServerConfig) -> filesync_protocol::Result<()> {
    let server = Server::bind(config).await?;
    server.run().await
}
