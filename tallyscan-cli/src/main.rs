use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tallyscan::{CancellationToken, ScanCoordinator, ScanJobSpec, ScanStatus};
use tallyscan_dynamodb::DynamoDbStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod output;

use cli::{Cli, LogFormat};
use config::AppConfig;

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Process exit status for a finished scan
fn exit_code(status: ScanStatus) -> u8 {
    match status {
        ScanStatus::Complete => 0,
        ScanStatus::Partial | ScanStatus::Failed => 2,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = AppConfig::resolve(&cli)?;
    let store = Arc::new(DynamoDbStore::connect(&config.dynamodb).await);
    let coordinator = ScanCoordinator::new(store, config.scan)?;

    if cli.list_tables {
        let names = coordinator.list_tables().await?;
        println!("{}", output::tables(&names, cli.output)?.trim_end());
        return Ok(ExitCode::SUCCESS);
    }

    let job = if cli.unsegmented {
        ScanJobSpec::unsegmented(&cli.table)?
    } else {
        ScanJobSpec::new(&cli.table, cli.segments)?
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping scan");
            on_signal.cancel();
        }
    });

    let status = if cli.compare {
        let comparison = coordinator.compare_with_unsegmented(&job, &cancel).await;
        println!("{}", output::comparison(&comparison, cli.output)?);
        worst(comparison.unsegmented.status, comparison.parallel.status)
    } else {
        let report = coordinator.run_with_cancel(&job, &cancel).await;
        println!("{}", output::report(&report, cli.output)?);
        report.status
    };

    Ok(ExitCode::from(exit_code(status)))
}

fn worst(a: ScanStatus, b: ScanStatus) -> ScanStatus {
    match (a, b) {
        (ScanStatus::Complete, ScanStatus::Complete) => ScanStatus::Complete,
        (ScanStatus::Failed, ScanStatus::Failed) => ScanStatus::Failed,
        _ => ScanStatus::Partial,
    }
}
