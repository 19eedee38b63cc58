use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::DashboardSource;
use crate::error::FetchError;
use crate::models::{
    Alert, Batch, BatchProgress, BatchStatus, CostBreakdown, ManagerDashboard, OwnerDashboard,
    ProductivityAggregate, StageProgress, StageStatus, Station, WastageAggregate, Worker,
};

/// In-memory backend with scripted responses for view and surface tests.
#[derive(Default)]
pub struct FakeSource {
    batches: Mutex<Vec<Batch>>,
    workers: Mutex<Vec<Worker>>,
    stations: Mutex<Vec<Station>>,
    alerts: Mutex<Vec<Alert>>,
    productivity: Mutex<ProductivityAggregate>,
    wastage: Mutex<WastageAggregate>,
    costs: Mutex<CostBreakdown>,
    progress_requests: Mutex<Vec<String>>,
    resolve_rejection: Mutex<Option<(u16, String)>>,
    fail_costs: AtomicBool,
    hang_resolves: AtomicBool,
    hang_stations: AtomicBool,
    owner_calls: AtomicUsize,
}

pub fn batch(id: &str, current: f64, target: f64) -> Batch {
    Batch {
        id: id.to_string(),
        batch_number: format!("B-{id}"),
        product_name: "ABC Powder".to_string(),
        start_date: None,
        end_date: None,
        target_quantity_kg: target,
        current_quantity_kg: current,
        current_station: Some("STATION_1".to_string()),
        overall_status: BatchStatus::InProgress,
    }
}

impl FakeSource {
    pub fn set_batches(&self, batches: Vec<Batch>) {
        *self.batches.lock().unwrap() = batches;
    }

    pub fn set_stations(&self, stations: Vec<Station>) {
        *self.stations.lock().unwrap() = stations;
    }

    pub fn set_alerts(&self, alerts: Vec<Alert>) {
        *self.alerts.lock().unwrap() = alerts;
    }

    pub fn set_costs(&self, costs: CostBreakdown) {
        *self.costs.lock().unwrap() = costs;
    }

    pub fn set_wastage(&self, wastage: WastageAggregate) {
        *self.wastage.lock().unwrap() = wastage;
    }

    pub fn fail_costs(&self, fail: bool) {
        self.fail_costs.store(fail, Ordering::SeqCst);
    }

    /// Resolve requests never complete.
    pub fn hang_resolves(&self) {
        self.hang_resolves.store(true, Ordering::SeqCst);
    }

    /// The station list request never completes.
    pub fn hang_stations(&self) {
        self.hang_stations.store(true, Ordering::SeqCst);
    }

    pub fn reject_resolves_with(&self, status: u16, body: &str) {
        *self.resolve_rejection.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn progress_requests(&self) -> Vec<String> {
        self.progress_requests.lock().unwrap().clone()
    }

    pub fn owner_calls(&self) -> usize {
        self.owner_calls.load(Ordering::SeqCst)
    }

    pub fn unresolved_alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| !a.is_resolved)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DashboardSource for FakeSource {
    async fn owner_dashboard(&self) -> Result<OwnerDashboard, FetchError> {
        self.owner_calls.fetch_add(1, Ordering::SeqCst);
        Ok(OwnerDashboard {
            stations: self.stations.lock().unwrap().clone(),
            batches: self.batches.lock().unwrap().clone(),
            workers: self.workers.lock().unwrap().clone(),
            alerts: self.unresolved_alerts(),
            ..OwnerDashboard::default()
        })
    }

    async fn manager_dashboard(&self, _manager_id: &str) -> Result<ManagerDashboard, FetchError> {
        Ok(ManagerDashboard {
            stations: self.stations.lock().unwrap().clone(),
            alerts: self.unresolved_alerts(),
            ..ManagerDashboard::default()
        })
    }

    async fn batches(&self) -> Result<Vec<Batch>, FetchError> {
        Ok(self.batches.lock().unwrap().clone())
    }

    async fn batch_progress(&self, batch_id: &str) -> Result<BatchProgress, FetchError> {
        self.progress_requests.lock().unwrap().push(batch_id.to_string());
        Ok(BatchProgress {
            batch: None,
            progress: vec![StageProgress {
                id: format!("{batch_id}-1"),
                batch_id: batch_id.to_string(),
                station_id: "STATION_1".to_string(),
                station_name: Some("Cleaning".to_string()),
                input_quantity_kg: 100.0,
                output_quantity_kg: 96.0,
                wastage_kg: 4.0,
                start_time: None,
                end_time: None,
                status: StageStatus::Completed,
            }],
        })
    }

    async fn workers(&self) -> Result<Vec<Worker>, FetchError> {
        Ok(self.workers.lock().unwrap().clone())
    }

    async fn stations(&self) -> Result<Vec<Station>, FetchError> {
        if self.hang_stations.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(self.stations.lock().unwrap().clone())
    }

    async fn productivity(&self) -> Result<ProductivityAggregate, FetchError> {
        Ok(self.productivity.lock().unwrap().clone())
    }

    async fn wastage(&self) -> Result<WastageAggregate, FetchError> {
        Ok(self.wastage.lock().unwrap().clone())
    }

    async fn costs(&self) -> Result<CostBreakdown, FetchError> {
        if self.fail_costs.load(Ordering::SeqCst) {
            return Err(FetchError::Server {
                status: 500,
                message: "inventory table locked".to_string(),
            });
        }
        Ok(self.costs.lock().unwrap().clone())
    }

    async fn resolve_alert(&self, alert_id: &str) -> Result<(), FetchError> {
        if self.hang_resolves.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if let Some((status, message)) = self.resolve_rejection.lock().unwrap().clone() {
            return Err(FetchError::Server { status, message });
        }
        for alert in self.alerts.lock().unwrap().iter_mut() {
            if alert.id == alert_id {
                alert.is_resolved = true;
            }
        }
        Ok(())
    }

    async fn run_simulator(&self) -> Result<String, FetchError> {
        Ok("Simulation started in background".to_string())
    }
}
