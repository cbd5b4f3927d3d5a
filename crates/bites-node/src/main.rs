use bites_node::{Cli, Command, NodeConfig, logging, run};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = NodeConfig::load(cli.config.as_deref())?.apply(cli.overrides());
    logging::init(&config.log_level, config.log_format)?;

    let work = async {
        match cli.command {
            Command::Storage { .. } => run::storage(config).await,
            Command::Gateway { .. } => run::gateway_only(config).await,
            Command::Standalone { direct, .. } => run::standalone(config, direct).await,
        }
    };

    tokio::select! {
        result = work => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
