use anyhow::Context;
use clap::Parser;
use vestibule_kernel::config::load_config;
use vestibule_logger::Logger;
use vestibule_server::cli::{AppCommands, Cli};
use vestibule_server::{Server, wait_for_datastore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _log = Logger::builder(env!("CARGO_PKG_NAME")).init()?;

    let cfg = load_config(cli.config.as_deref())
        .context("Critical: Configuration is malformed")?;

    match cli.command.unwrap_or_default() {
        AppCommands::Serve => Server::builder().config(cfg).build().await?.run().await,
        AppCommands::WaitForDb => wait_for_datastore(&cfg).await,
    }
}
