use clap::Parser;
use magento_api::cli::{self, Cli};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr; stdout carries only the JSON envelope
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("magento-api v{}", magento_api::VERSION);

    let envelope = cli::run(cli).await;
    println!("{}", envelope.to_json()?);

    Ok(if envelope.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
