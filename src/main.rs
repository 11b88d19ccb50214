use anyhow::{Context, Result};
use clap::Parser;
use logs2influx_client::HttpConnector;
use logs2influx_config::{LoggingConfig, RuntimeConfig};
use logs2influx_sink::InfluxSink;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{info, warn};

mod ingest;
mod init;

/// Ship newline-delimited JSON log events from stdin to InfluxDB v2
#[derive(Parser)]
#[command(name = "logs2influx")]
#[command(version)]
#[command(about = "Ship newline-delimited JSON log events from stdin to InfluxDB v2", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Events per write (overrides config file)
    #[arg(short = 'b', long, value_name = "N")]
    batch_size: Option<usize>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Step 1: Read configuration (file, then environment)
    let config = if let Some(config_path) = &cli.config {
        logs2influx_config::read_config_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        logs2influx_config::read_config().context("Failed to load configuration")?
    };

    // Step 2: CLI overrides, logging, then validation so its warnings are seen
    let config = prepare_config(config, &cli, init::init_tracing)?;

    // Step 3: Provision and connect
    let sink = InfluxSink::open(&config.sink, &HttpConnector::new())
        .await
        .context("Failed to open InfluxDB sink")?;

    // Step 4: Stream stdin until EOF or Ctrl-C
    let reader = BufReader::new(tokio::io::stdin());
    let outcome = tokio::select! {
        result = ingest::ingest(reader, &sink, config.batch.max_events) => result.map(Some),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; pending events are dropped");
            Ok(None)
        }
    };

    sink.close();

    if let Some(stats) = outcome? {
        info!(
            events = stats.events,
            batches = stats.batches,
            skipped = stats.skipped_lines,
            "Done"
        );
    }
    Ok(())
}

fn prepare_config(
    mut config: RuntimeConfig,
    cli: &Cli,
    init_logging: impl FnOnce(&LoggingConfig),
) -> Result<RuntimeConfig> {
    apply_cli_overrides(&mut config, cli)?;
    init_logging(&config.logging);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) -> Result<()> {
    if let Some(size) = cli.batch_size {
        if size == 0 {
            anyhow::bail!("--batch-size must be greater than 0");
        }
        config.batch.max_events = size;
    }

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    Ok(())
}
