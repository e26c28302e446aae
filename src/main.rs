use clap::Parser;
use offline_deal_dl::scheduler_task::PollingTask;
use offline_deal_dl::{Config, DealOrchestrator, Result, logging, run_with_shutdown};
use std::path::PathBuf;

/// Offline deal download orchestrator for an aria2 daemon.
#[derive(Debug, Parser)]
#[command(name = "offline-deal-dl")]
#[command(about = "Downloads offline deal payloads through aria2 and reports progress to the deal registry", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, value_name = "PATH", default_value = "offline-deal-dl.toml")]
    config: PathBuf,

    /// Run a single sweep and admission pass, then exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = logging::init_logging() {
        eprintln!("offline-deal-dl: {}", err);
    }

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "offline-deal-dl exited with an error");
        eprintln!("offline-deal-dl error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    config.validate()?;

    tracing::info!(
        config = %cli.config.display(),
        provider_id = %config.provider.provider_id,
        rpc_url = %config.engine.rpc_url,
        download_dir = %config.engine.download_dir.display(),
        max_concurrent_downloads = config.orchestrator.max_concurrent_downloads,
        "Configuration loaded"
    );

    let orchestrator = DealOrchestrator::from_config(&config)?;
    let task = PollingTask::new(orchestrator, config.orchestrator.poll_interval);

    if cli.once {
        task.tick().await;
        return Ok(());
    }

    run_with_shutdown(task).await
}
