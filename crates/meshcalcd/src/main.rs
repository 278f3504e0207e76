//! meshcalcd — the MeshCalc daemon.
//!
//! Single binary that assembles the whole demo mesh:
//! - In-process broker (routing, discovery callbacks)
//! - Orchestrator registry + member table
//! - Calculator and linalg workers
//! - Periodic scheduler driving remote calls
//!
//! # Usage
//!
//! ```text
//! meshcalcd standalone --calc-workers 2 --linalg-workers 1
//! ```

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use meshcalc_orchestrator::Scheduler;
use meshcalc_registry::{MemberTable, ServiceDescriptor, ServiceKind, ServiceRegistry};
use meshcalc_rpc::{LocalBroker, RpcClient};
use meshcalc_services::{calc_registry, linalg_registry};

use crate::config::Config;

/// Implementation tag reported in arithmetic responses.
const IMPL_TAG: &str = "rust";

#[derive(Parser)]
#[command(name = "meshcalcd", about = "MeshCalc daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run orchestrator and workers in one process.
    Standalone {
        /// Number of calculator workers to host.
        #[arg(long, default_value = "2")]
        calc_workers: usize,

        /// Number of linalg workers to host.
        #[arg(long, default_value = "1")]
        linalg_workers: usize,

        /// Calculation round interval in seconds.
        #[arg(long, default_value = "2")]
        calc_interval: u64,

        /// Linalg round interval in seconds.
        #[arg(long, default_value = "3")]
        linalg_interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,meshcalc=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Standalone {
            calc_workers,
            linalg_workers,
            calc_interval,
            linalg_interval,
        } => {
            run_standalone(
                calc_workers,
                linalg_workers,
                Duration::from_secs(calc_interval),
                Duration::from_secs(linalg_interval),
            )
            .await
        }
    }
}

async fn run_standalone(
    calc_workers: usize,
    linalg_workers: usize,
    calc_interval: Duration,
    linalg_interval: Duration,
) -> anyhow::Result<()> {
    info!("MeshCalc daemon starting in standalone mode");

    // Configuration is validated before anything else starts.
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    info!(
        broker = %format!("{}:{}", config.broker.host, config.broker.port),
        host_id = %config.host_id,
        "configuration loaded"
    );

    // ── Orchestrator side ──────────────────────────────────────

    let broker = LocalBroker::new();
    let table = Arc::new(MemberTable::new());
    let registry = Arc::new(ServiceRegistry::new(table.clone()));

    {
        let registry = registry.clone();
        broker.set_on_join(Arc::new(move |descriptor: &ServiceDescriptor| {
            registry.handle_join(descriptor).map_err(|e| e.to_string())
        }));
    }
    {
        let registry = registry.clone();
        broker.set_on_leave(Arc::new(
            move |descriptor: &ServiceDescriptor, zombie: bool| {
                registry
                    .handle_leave(descriptor, zombie)
                    .map_err(|e| e.to_string())
            },
        ));
    }
    info!("service registry initialized");

    // ── Workers ────────────────────────────────────────────────

    for i in 0..calc_workers {
        let descriptor =
            ServiceDescriptor::new(ServiceKind::Calculator.tag(), format!("{}-{i}", config.host_id));
        broker.serve(&descriptor, calc_registry(IMPL_TAG));
        broker
            .register_with_discovery(&descriptor, 30, Duration::from_secs(3))
            .await?;
    }
    for i in 0..linalg_workers {
        let descriptor =
            ServiceDescriptor::new(ServiceKind::Linalg.tag(), format!("{}-{i}", config.host_id));
        broker.serve(&descriptor, linalg_registry());
        broker
            .register_with_discovery(&descriptor, 30, Duration::from_secs(3))
            .await?;
    }
    info!(calc_workers, linalg_workers, "workers registered");

    // ── Scheduler ──────────────────────────────────────────────

    let scheduler = Scheduler::new(table, RpcClient::new(broker))
        .with_intervals(calc_interval, linalg_interval);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = scheduler_handle.await;
    info!("MeshCalc daemon stopped");
    Ok(())
}
