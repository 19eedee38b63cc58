use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::alerts::{self, ResolveOutcome};
use crate::client::DashboardSource;
use crate::error::FetchError;
use crate::models::{AnalyticsSnapshot, BatchProgress};
use crate::scheduler::{Poller, Tick};
use crate::selection::SelectionChange;
use crate::views::{AnalyticsView, FlowView, ManagerView, OwnerView, PolledView, WorkerView};

/// Input typed by the operator while a view is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Resolve(String),
    Select(String),
    Refresh,
    Dismiss,
    Quit,
}

impl ViewCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next()?;
        let arg = parts.next().map(String::from);
        match (verb, arg) {
            ("resolve" | "r", Some(id)) => Some(ViewCommand::Resolve(id)),
            ("select" | "s", Some(id)) => Some(ViewCommand::Select(id)),
            ("refresh", None) => Some(ViewCommand::Refresh),
            ("dismiss" | "d", None) => Some(ViewCommand::Dismiss),
            ("quit" | "q" | "exit", None) => Some(ViewCommand::Quit),
            _ => None,
        }
    }
}

pub async fn watch_owner(
    source: Arc<dyn DashboardSource>,
    period: Duration,
    commands: mpsc::Receiver<ViewCommand>,
    present: impl FnMut(&OwnerView),
) {
    let view_id = Uuid::new_v4();
    info!(%view_id, "owner dashboard opened");
    let fetcher = Arc::clone(&source);
    let poller = Poller::spawn("owner-dashboard", view_id, period, move || {
        let source = Arc::clone(&fetcher);
        async move { source.owner_dashboard().await }
    });
    drive(source, poller, OwnerView::new(), commands, no_patches(), present).await;
    info!(%view_id, "owner dashboard closed");
}

pub async fn watch_manager(
    source: Arc<dyn DashboardSource>,
    manager_id: String,
    period: Duration,
    commands: mpsc::Receiver<ViewCommand>,
    present: impl FnMut(&ManagerView),
) {
    let view_id = Uuid::new_v4();
    info!(%view_id, manager_id = %manager_id, "manager dashboard opened");
    let fetcher = Arc::clone(&source);
    let id = manager_id.clone();
    let poller = Poller::spawn("manager-dashboard", view_id, period, move || {
        let source = Arc::clone(&fetcher);
        let id = id.clone();
        async move { source.manager_dashboard(&id).await }
    });
    drive(source, poller, ManagerView::new(manager_id), commands, no_patches(), present).await;
    info!(%view_id, "manager dashboard closed");
}

pub async fn watch_workers(
    source: Arc<dyn DashboardSource>,
    period: Duration,
    view: WorkerView,
    commands: mpsc::Receiver<ViewCommand>,
    present: impl FnMut(&WorkerView),
) {
    let view_id = Uuid::new_v4();
    info!(%view_id, "worker tracking opened");
    let fetcher = Arc::clone(&source);
    let poller = Poller::spawn("workers", view_id, period, move || {
        let source = Arc::clone(&fetcher);
        async move { source.workers().await }
    });

    // Station names are read once per view; the roster is what moves.
    let (patch_tx, patches) = mpsc::unbounded_channel::<Patch<WorkerView>>();
    let stations_source = Arc::clone(&source);
    tokio::spawn(async move {
        match stations_source.stations().await {
            Ok(stations) => {
                let _ = patch_tx.send(Box::new(move |view: &mut WorkerView| view.stations = stations));
            }
            Err(err) => warn!(error = %err, "station list unavailable"),
        }
    });

    drive(source, poller, view, commands, patches, present).await;
    info!(%view_id, "worker tracking closed");
}

/// All three aggregates must arrive before a cycle is applied.
pub async fn watch_analytics(
    source: Arc<dyn DashboardSource>,
    period: Duration,
    commands: mpsc::Receiver<ViewCommand>,
    present: impl FnMut(&AnalyticsView),
) {
    let view_id = Uuid::new_v4();
    info!(%view_id, "analytics opened");
    let fetcher = Arc::clone(&source);
    let poller = Poller::spawn("analytics", view_id, period, move || {
        let source = Arc::clone(&fetcher);
        async move {
            let (productivity, wastage, costs) =
                tokio::try_join!(source.productivity(), source.wastage(), source.costs())?;
            Ok::<_, FetchError>(AnalyticsSnapshot {
                productivity,
                wastage,
                costs,
            })
        }
    });
    drive(source, poller, AnalyticsView::new(), commands, no_patches(), present).await;
    info!(%view_id, "analytics closed");
}

/// One-off update applied to a view from outside its poller.
type Patch<V> = Box<dyn FnOnce(&mut V) + Send>;

fn no_patches<V>() -> mpsc::UnboundedReceiver<Patch<V>> {
    mpsc::unbounded_channel().1
}

async fn drive<V: PolledView>(
    source: Arc<dyn DashboardSource>,
    mut poller: Poller<V::Snapshot>,
    mut view: V,
    mut commands: mpsc::Receiver<ViewCommand>,
    mut patches: mpsc::UnboundedReceiver<Patch<V>>,
    mut present: impl FnMut(&V),
) {
    // Resolves run on their own tasks; outcomes come back through this channel.
    let (outcome_tx, mut outcomes) = mpsc::unbounded_channel::<ResolveOutcome>();
    present(&view);
    loop {
        tokio::select! {
            Some(tick) = poller.next() => {
                debug!(poller = poller.name(), seq = tick.seq, "applying refresh");
                view.apply(tick.result);
                present(&view);
            }
            Some(patch) = patches.recv() => {
                patch(&mut view);
                present(&view);
            }
            Some(outcome) = outcomes.recv() => {
                if outcome.needs_refresh() {
                    poller.refresh_now();
                } else if let ResolveOutcome::Rejected { message, .. } | ResolveOutcome::Failed(message) = outcome {
                    view.note_error(message);
                    present(&view);
                }
            }
            command = commands.recv() => match command {
                None | Some(ViewCommand::Quit) => break,
                Some(ViewCommand::Resolve(alert_id)) if view.has_alerts() => {
                    let source = Arc::clone(&source);
                    let outcome_tx = outcome_tx.clone();
                    tokio::spawn(async move {
                        let _ = outcome_tx.send(alerts::resolve(source.as_ref(), &alert_id).await);
                    });
                }
                Some(ViewCommand::Refresh) => poller.refresh_now(),
                Some(ViewCommand::Dismiss) => {
                    view.dismiss_error();
                    present(&view);
                }
                Some(other) => debug!(?other, "command not available in this view"),
            },
        }
    }
}

type ProgressSlot = Option<(String, Poller<BatchProgress>)>;

/// Batch list plus a companion progress poller that follows the selection.
pub async fn watch_flow(
    source: Arc<dyn DashboardSource>,
    period: Duration,
    mut commands: mpsc::Receiver<ViewCommand>,
    mut present: impl FnMut(&FlowView),
) {
    let view_id = Uuid::new_v4();
    info!(%view_id, "production flow opened");
    let fetcher = Arc::clone(&source);
    let mut batches = Poller::spawn("batches", view_id, period, move || {
        let source = Arc::clone(&fetcher);
        async move { source.batches().await }
    });
    let mut progress: ProgressSlot = None;
    let mut view = FlowView::new();
    present(&view);

    loop {
        tokio::select! {
            Some(tick) = batches.next() => {
                let change = view.apply_batches(tick.result);
                follow_selection(&source, view_id, period, &mut progress, change);
                present(&view);
            }
            Some((batch_id, tick)) = next_progress(&mut progress) => {
                if view.apply_progress(&batch_id, tick.result) {
                    present(&view);
                }
            }
            command = commands.recv() => match command {
                None | Some(ViewCommand::Quit) => break,
                Some(ViewCommand::Select(batch_id)) => {
                    let change = view.select(&batch_id);
                    follow_selection(&source, view_id, period, &mut progress, change);
                    present(&view);
                }
                Some(ViewCommand::Refresh) => {
                    batches.refresh_now();
                    if let Some((_, poller)) = &progress {
                        poller.refresh_now();
                    }
                }
                Some(ViewCommand::Dismiss) => {
                    view.batches.dismiss_error();
                    present(&view);
                }
                Some(other) => debug!(?other, "command not available in this view"),
            },
        }
    }
    info!(%view_id, "production flow closed");
}

fn follow_selection(
    source: &Arc<dyn DashboardSource>,
    view_id: Uuid,
    period: Duration,
    slot: &mut ProgressSlot,
    change: SelectionChange,
) {
    match change {
        SelectionChange::Unchanged => {}
        SelectionChange::Cleared => {
            debug!("selection cleared, stopping progress poll");
            if let Some((_, poller)) = slot.take() {
                poller.stop();
            }
        }
        SelectionChange::Changed(batch_id) => {
            debug!(batch_id = %batch_id, "selection changed, restarting progress poll");
            let fetcher = Arc::clone(source);
            let id = batch_id.clone();
            let poller = Poller::spawn("batch-progress", view_id, period, move || {
                let source = Arc::clone(&fetcher);
                let id = id.clone();
                async move { source.batch_progress(&id).await }
            });
            *slot = Some((batch_id, poller));
        }
    }
}

async fn next_progress(slot: &mut ProgressSlot) -> Option<(String, Tick<BatchProgress>)> {
    match slot {
        Some((batch_id, poller)) => poller.next().await.map(|tick| (batch_id.clone(), tick)),
        None => std::future::pending().await,
    }
}
