//! policyd — the policygrid daemon.
//!
//! Serves the policy binding API over a redb store, keeping the scheduler
//! service in step with every bind and unbind.
//!
//! # Usage
//!
//! ```text
//! policyd serve --config /etc/policygrid/policyd.toml
//! policyd serve --listen 127.0.0.1:8080 --scheduler-url http://scheduler:8083
//! policyd check-policy policy.json
//! ```

mod check;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use policygrid_core::PolicydConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,policyd=debug,policygrid=debug";

#[derive(Parser)]
#[command(name = "policyd", about = "policygrid daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the policy binding API.
    Serve {
        /// Path to policyd.toml. Defaults apply when omitted.
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Address to listen on, overriding `[server] listen`.
        #[arg(long)]
        listen: Option<String>,

        /// Policy database file, overriding `[store] path`.
        #[arg(long)]
        store_path: Option<PathBuf>,

        /// Scheduler base URL, overriding `[scheduler] url`.
        #[arg(long)]
        scheduler_url: Option<String>,
    },

    /// Validate a policy JSON file without contacting anything.
    CheckPolicy {
        /// Policy document to check.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            listen,
            store_path,
            scheduler_url,
        } => {
            let mut config = match config {
                Some(path) => PolicydConfig::from_file(&path)?,
                None => PolicydConfig::default(),
            };
            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            if let Some(path) = store_path {
                config.store.path = path;
            }
            if let Some(url) = scheduler_url {
                config.scheduler.url = url;
            }

            init_tracing(config.log.json);
            serve::run(config).await
        }
        Command::CheckPolicy { file } => {
            init_tracing(false);
            check::run(&file)
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
