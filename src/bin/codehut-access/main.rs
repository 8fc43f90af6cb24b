//! codehut-access CLI entry point.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use codehut_access::{AccessResolver, Snippet};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = cli.to_config()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("codehut-access v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Check {
            snippet,
            price,
            user,
        } => {
            let resolver = AccessResolver::from_config(&config)?;
            let snippet = Snippet::new(snippet, price);
            let decision = resolver.resolve(&snippet, user.as_deref()).await;
            let verdict = if decision.is_accessible() {
                "accessible"
            } else {
                "locked"
            };
            println!("{} {verdict} ({decision})", snippet.id);
        }
        Command::Record { snippet, user } => {
            let resolver = AccessResolver::from_config(&config)?;
            if resolver.record_local_purchase(&snippet, &user)? {
                println!("recorded {snippet} for {user}");
            } else {
                println!("{snippet} already recorded for {user}");
            }
        }
        Command::List { user } => {
            let resolver = AccessResolver::from_config(&config)?;
            for id in resolver.cache().purchased(&user)? {
                println!("{id}");
            }
        }
        Command::InitConfig { path } => {
            config.to_file(&path)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}
