use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::metrics::{
    self, CostSlice, FlowSummary, StationShare, StationStatusCounts, WorkerStats, TOP_PERFORMERS,
};
use crate::models::{
    AnalyticsSnapshot, Batch, BatchProgress, ManagerDashboard, OwnerDashboard, StageProgress, Station,
    Worker,
};
use crate::selection::{Selection, SelectionChange};

/// Last-known-good snapshot of one resource plus its inline error.
#[derive(Debug, Clone)]
pub struct ViewState<T> {
    snapshot: Option<T>,
    error: Option<String>,
    loading: bool,
    last_update: Option<DateTime<Local>>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            snapshot: None,
            error: None,
            loading: true,
            last_update: None,
        }
    }
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the snapshot was replaced.
    pub fn apply(&mut self, result: Result<T, FetchError>) -> bool {
        self.loading = false;
        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.error = None;
                self.last_update = Some(Local::now());
                true
            }
            Err(err) => {
                if err.is_unauthorized() {
                    debug!("refresh rejected, waiting for session handling");
                } else {
                    warn!(error = %err, kept_snapshot = self.snapshot.is_some(), "refresh cycle failed");
                }
                self.error = Some(err.display_message());
                false
            }
        }
    }

    pub fn note_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn snapshot(&self) -> Option<&T> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }
}

/// A view driven by exactly one poller.
pub trait PolledView {
    type Snapshot: Send + 'static;

    fn apply(&mut self, result: Result<Self::Snapshot, FetchError>);
    fn note_error(&mut self, message: String);
    fn dismiss_error(&mut self);

    fn has_alerts(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct OwnerView {
    pub state: ViewState<OwnerDashboard>,
}

impl OwnerView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolledView for OwnerView {
    type Snapshot = OwnerDashboard;

    fn apply(&mut self, result: Result<OwnerDashboard, FetchError>) {
        self.state.apply(result);
    }

    fn note_error(&mut self, message: String) {
        self.state.note_error(message);
    }

    fn dismiss_error(&mut self) {
        self.state.dismiss_error();
    }

    fn has_alerts(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
pub struct ManagerView {
    pub manager_id: String,
    pub state: ViewState<ManagerDashboard>,
    pub status_counts: StationStatusCounts,
}

impl ManagerView {
    pub fn new(manager_id: impl Into<String>) -> Self {
        Self {
            manager_id: manager_id.into(),
            ..Self::default()
        }
    }
}

impl PolledView for ManagerView {
    type Snapshot = ManagerDashboard;

    fn apply(&mut self, result: Result<ManagerDashboard, FetchError>) {
        if self.state.apply(result) {
            if let Some(dashboard) = self.state.snapshot() {
                self.status_counts = StationStatusCounts::from_stations(&dashboard.stations);
            }
        }
    }

    fn note_error(&mut self, message: String) {
        self.state.note_error(message);
    }

    fn dismiss_error(&mut self) {
        self.state.dismiss_error();
    }

    fn has_alerts(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
pub struct WorkerView {
    pub state: ViewState<Vec<Worker>>,
    pub stations: Vec<Station>,
    pub station_filter: Option<String>,
    pub search: String,
    pub stats: WorkerStats,
    pub distribution: Vec<StationShare>,
}

impl WorkerView {
    pub fn new(station_filter: Option<String>, search: impl Into<String>) -> Self {
        Self {
            station_filter,
            search: search.into(),
            ..Self::default()
        }
    }

    pub fn visible_workers(&self) -> Vec<&Worker> {
        match self.state.snapshot() {
            Some(workers) => metrics::filter_workers(workers, self.station_filter.as_deref(), &self.search),
            None => Vec::new(),
        }
    }
}

impl PolledView for WorkerView {
    type Snapshot = Vec<Worker>;

    fn apply(&mut self, result: Result<Vec<Worker>, FetchError>) {
        if self.state.apply(result) {
            if let Some(workers) = self.state.snapshot() {
                self.stats = WorkerStats::from_workers(workers);
                self.distribution = metrics::station_distribution(workers);
            }
        }
    }

    fn note_error(&mut self, message: String) {
        self.state.note_error(message);
    }

    fn dismiss_error(&mut self) {
        self.state.dismiss_error();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub active_workers: usize,
    pub average_station_productivity: f64,
    pub mean_worker_productivity: f64,
    pub total_wastage: f64,
    pub total_cost: f64,
    pub wastage_cost: f64,
    pub cost_slices: [CostSlice; 3],
    pub station_averages: Vec<(String, f64, usize)>,
    pub wastage_by_station: Vec<(String, f64)>,
    pub top_performers: Vec<Worker>,
}

impl AnalyticsSummary {
    pub fn from_snapshot(snapshot: &AnalyticsSnapshot) -> Self {
        let productivity = &snapshot.productivity;
        Self {
            active_workers: productivity.workers.len(),
            average_station_productivity: metrics::average_station_productivity(
                &productivity.station_productivity,
            ),
            mean_worker_productivity: metrics::mean_worker_productivity(&productivity.workers),
            total_wastage: metrics::total_wastage(&snapshot.wastage),
            total_cost: snapshot.costs.total_cost,
            wastage_cost: snapshot.costs.wastage_cost,
            cost_slices: metrics::cost_distribution(&snapshot.costs),
            station_averages: productivity
                .station_productivity
                .iter()
                .map(|(station, data)| (station.clone(), data.average_score, data.workers.len()))
                .collect(),
            wastage_by_station: snapshot
                .wastage
                .iter()
                .map(|(station, data)| (station.clone(), data.average_wastage))
                .collect(),
            top_performers: metrics::top_performers(&productivity.workers, TOP_PERFORMERS),
        }
    }
}

#[derive(Debug, Default)]
pub struct AnalyticsView {
    pub state: ViewState<AnalyticsSnapshot>,
    pub summary: Option<AnalyticsSummary>,
}

impl AnalyticsView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PolledView for AnalyticsView {
    type Snapshot = AnalyticsSnapshot;

    fn apply(&mut self, result: Result<AnalyticsSnapshot, FetchError>) {
        if self.state.apply(result) {
            self.summary = self.state.snapshot().map(AnalyticsSummary::from_snapshot);
        }
    }

    fn note_error(&mut self, message: String) {
        self.state.note_error(message);
    }

    fn dismiss_error(&mut self) {
        self.state.dismiss_error();
    }
}

/// Batch list with a stable selection and the selected batch's stages.
#[derive(Debug, Default)]
pub struct FlowView {
    pub batches: ViewState<Vec<Batch>>,
    pub selection: Selection,
    pub progress: Vec<StageProgress>,
    pub summary: FlowSummary,
}

impl FlowView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_batches(&mut self, result: Result<Vec<Batch>, FetchError>) -> SelectionChange {
        if !self.batches.apply(result) {
            return SelectionChange::Unchanged;
        }
        let batches = self.batches.snapshot().map(Vec::as_slice).unwrap_or(&[]);
        let change = self.selection.reconcile(batches);
        if change != SelectionChange::Unchanged {
            self.clear_progress();
        }
        change
    }

    pub fn select(&mut self, batch_id: &str) -> SelectionChange {
        let batches = self.batches.snapshot().map(Vec::as_slice).unwrap_or(&[]);
        let change = self.selection.choose(batch_id, batches);
        if change != SelectionChange::Unchanged {
            self.clear_progress();
        }
        change
    }

    /// Progress for anything but the current selection is dropped. A failed
    /// fetch keeps the last stages and shows the error inline.
    pub fn apply_progress(&mut self, batch_id: &str, result: Result<BatchProgress, FetchError>) -> bool {
        if self.selection.current() != Some(batch_id) {
            return false;
        }
        match result {
            Ok(progress) => {
                self.summary = FlowSummary::from_stages(&progress.progress);
                self.progress = progress.progress;
                true
            }
            Err(err) => {
                warn!(batch_id, error = %err, "progress refresh failed");
                self.batches.note_error(err.display_message());
                true
            }
        }
    }

    pub fn current_batch(&self) -> Option<&Batch> {
        let selected = self.selection.current()?;
        self.batches.snapshot()?.iter().find(|b| b.id == selected)
    }

    fn clear_progress(&mut self) {
        self.progress.clear();
        self.summary = FlowSummary::default();
    }
}
