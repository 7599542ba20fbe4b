use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use appstate_server::comms::local_api;
use appstate_server::config::{Config, ConfigOverrides};
use appstate_server::utils::logging;

#[derive(Parser)]
#[command(name = "appstate-server", version, about = "Exchange account credentials for a session app state")]
struct AppCli {
    /// Optional JSON config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(flatten)]
    serve: ServeArgs,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server (default)
    Serve,
}

#[derive(Args)]
struct ServeArgs {
    /// Listening port
    #[arg(long, global = true, env = "PORT")]
    port: Option<u16>,

    /// Directory with index.html and static assets
    #[arg(long, global = true, env = "APPSTATE_PUBLIC_DIR")]
    public_dir: Option<PathBuf>,

    /// Directory receiving appstate_<millis>.json records
    #[arg(long, global = true, env = "APPSTATE_STATES_DIR")]
    states_dir: Option<PathBuf>,

    /// Login endpoint of the remote authenticator
    #[arg(long, global = true, env = "APPSTATE_AUTH_URL")]
    auth_url: Option<String>,

    /// Exit on the first panic instead of continuing
    #[arg(long, global = true, env = "APPSTATE_FAIL_FAST")]
    fail_fast: bool,
}

impl From<ServeArgs> for ConfigOverrides {
    fn from(args: ServeArgs) -> Self {
        Self {
            port: args.port,
            public_dir: args.public_dir,
            states_dir: args.states_dir,
            auth_url: args.auth_url,
            fail_fast: args.fail_fast,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args = AppCli::parse();
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match args.command {
        Some(Commands::Serve) | None => config.apply(args.serve.into()),
    }

    logging::install_panic_hook(config.fail_fast);
    if config.fail_fast {
        info!("fail-fast enabled: a panic terminates the process");
    }

    local_api::serve(config).await
}
