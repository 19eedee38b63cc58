use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod alerts;
mod client;
mod config;
mod error;
mod export;
mod logging;
mod metrics;
mod models;
mod render;
mod report;
mod scheduler;
mod selection;
mod session;
#[cfg(test)]
mod testing;
mod views;
mod watch;

use alerts::ResolveOutcome;
use client::{ApiClient, DashboardSource};
use config::MonitorConfig;
use models::AnalyticsSnapshot;
use session::{Session, SessionEvent};
use views::WorkerView;
use watch::ViewCommand;

#[derive(Parser)]
#[command(name = "production-monitor")]
#[command(about = "Live production monitoring for the plant floor", long_about = None)]
struct Cli {
    /// Backend base URL; `/api` is appended when missing
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Bearer token for the backend
    #[arg(long, global = true)]
    token: Option<String>,
    /// Refresh cadence in milliseconds
    #[arg(long, global = true)]
    refresh_ms: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a live dashboard view
    Watch {
        #[command(subcommand)]
        view: View,
    },
    /// Generate a markdown analytics report
    Report {
        #[arg(long, default_value = "analytics.md")]
        out: PathBuf,
    },
    /// Export the worker roster as CSV
    Export {
        #[arg(long, default_value = "workers.csv")]
        out: PathBuf,
    },
    /// Mark an alert as resolved
    ResolveAlert { alert_id: String },
    /// Ask the backend to start its production simulator
    Simulate,
}

#[derive(Subcommand)]
enum View {
    Owner,
    Manager {
        #[arg(long)]
        manager_id: String,
    },
    Flow,
    Workers {
        #[arg(long)]
        station: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },
    Analytics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let config = MonitorConfig::from_env()?.with_overrides(cli.api_url, cli.token, cli.refresh_ms);
    let session = Arc::new(Session::new(config.token.clone()));
    let client = ApiClient::new(&config, Arc::clone(&session)).context("failed to build HTTP client")?;
    let source: Arc<dyn DashboardSource> = Arc::new(client);
    info!(api_url = %config.api_url, "backend configured");

    match cli.command {
        Commands::Watch { view } => run_view(view, source, &config, &session).await?,
        Commands::Report { out } => {
            let (productivity, wastage, costs) =
                tokio::try_join!(source.productivity(), source.wastage(), source.costs())
                    .map_err(|e| anyhow::anyhow!(e.display_message()))
                    .context("failed to load analytics")?;
            let snapshot = AnalyticsSnapshot {
                productivity,
                wastage,
                costs,
            };
            let report = report::build_report(chrono::Local::now(), &snapshot);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { out } => {
            let workers = source
                .workers()
                .await
                .map_err(|e| anyhow::anyhow!(e.display_message()))
                .context("failed to load workers")?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let written = export::write_workers(file, &workers)?;
            println!("Exported {written} workers to {}.", out.display());
        }
        Commands::ResolveAlert { alert_id } => match alerts::resolve(source.as_ref(), &alert_id).await {
            ResolveOutcome::Resolved => println!("Alert {alert_id} resolved."),
            ResolveOutcome::Rejected { message, .. } | ResolveOutcome::Failed(message) => {
                anyhow::bail!("could not resolve alert {alert_id}: {message}")
            }
        },
        Commands::Simulate => {
            let message = source
                .run_simulator()
                .await
                .map_err(|e| anyhow::anyhow!(e.display_message()))
                .context("failed to start simulator")?;
            println!("{message}");
        }
    }

    if session.is_expired() {
        anyhow::bail!("session expired, log in again");
    }
    Ok(())
}

async fn run_view(
    view: View,
    source: Arc<dyn DashboardSource>,
    config: &MonitorConfig,
    session: &Session,
) -> anyhow::Result<()> {
    let (tx, commands) = mpsc::channel(16);
    // Held so that closing stdin leaves the view running until Ctrl-C.
    let _keepalive = tx.clone();
    spawn_command_reader(tx);
    let period = config.refresh_interval;

    match view {
        View::Owner => {
            supervise(
                session,
                watch::watch_owner(source, period, commands, |v| show(render::render_owner(v))),
            )
            .await
        }
        View::Manager { manager_id } => {
            supervise(
                session,
                watch::watch_manager(source, manager_id, period, commands, |v| {
                    show(render::render_manager(v))
                }),
            )
            .await
        }
        View::Flow => {
            supervise(
                session,
                watch::watch_flow(source, period, commands, |v| show(render::render_flow(v))),
            )
            .await
        }
        View::Workers { station, search } => {
            supervise(
                session,
                watch::watch_workers(source, period, WorkerView::new(station, search), commands, |v| {
                    show(render::render_workers(v))
                }),
            )
            .await
        }
        View::Analytics => {
            supervise(
                session,
                watch::watch_analytics(source, period, commands, |v| show(render::render_analytics(v))),
            )
            .await
        }
    }
}

/// Runs a view until it quits, the operator hits Ctrl-C or the session expires.
async fn supervise(session: &Session, view: impl Future<Output = ()>) -> anyhow::Result<()> {
    let mut events = session.subscribe();
    tokio::select! {
        _ = view => Ok(()),
        _ = events.wait_for(|event| *event == SessionEvent::Expired) => {
            error!("session expired");
            anyhow::bail!("session expired, log in again")
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            info!("interrupted");
            Ok(())
        }
    }
}

/// Stdin is read on a plain thread so exiting never waits on a pending read.
fn spawn_command_reader(tx: mpsc::Sender<ViewCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "stdin closed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match ViewCommand::parse(&line) {
                Some(command) => {
                    if tx.blocking_send(command).is_err() {
                        break;
                    }
                }
                None => warn!(input = %line.trim(), "unrecognized command"),
            }
        }
    });
}

fn show(frame: String) {
    println!("{frame}");
}
