use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    Active,
    Completed,
    Delayed,
    Stopped,
    Idle,
    #[default]
    #[serde(other)]
    Unknown,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationStatus::Active => "active",
            StationStatus::Completed => "completed",
            StationStatus::Delayed => "delayed",
            StationStatus::Stopped => "stopped",
            StationStatus::Idle => "idle",
            StationStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    NotStarted,
    InProgress,
    Completed,
    Stopped,
    #[default]
    #[serde(other)]
    Other,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::NotStarted => "not_started",
            BatchStatus::InProgress => "in_progress",
            BatchStatus::Completed => "completed",
            BatchStatus::Stopped => "stopped",
            BatchStatus::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Completed,
    Delayed,
    Stopped,
    #[default]
    #[serde(other)]
    Other,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::InProgress => "in_progress",
            StageStatus::Completed => "completed",
            StageStatus::Delayed => "delayed",
            StageStatus::Stopped => "stopped",
            StageStatus::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Station {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub station_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub station_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expected_time_minutes: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_status: StationStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Batch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub batch_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_quantity_kg: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_quantity_kg: f64,
    #[serde(default)]
    pub current_station: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overall_status: BatchStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StageProgress {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub batch_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub station_id: String,
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_quantity_kg: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_quantity_kg: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wastage_kg: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: StageStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchProgress {
    #[serde(default)]
    pub batch: Option<Batch>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: Vec<StageProgress>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Worker {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub worker_id: String,
    #[serde(default)]
    pub worker_name: Option<String>,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub productivity_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_tasks_completed: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Alert {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub alert_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: AlertSeverity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StationProductivity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub workers: Vec<Worker>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub average_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_tasks: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ProductivityAggregate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub workers: Vec<Worker>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub station_productivity: BTreeMap<String, StationProductivity>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StationWastage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_wastage: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub average_wastage: f64,
}

/// Per-station wastage keyed by station identifier.
pub type WastageAggregate = BTreeMap<String, StationWastage>;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CostBreakdown {
    #[serde(default, deserialize_with = "null_as_default")]
    pub raw_material_cost: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub packaging_cost: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wastage_cost: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DashboardStatistics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_workers: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_stations: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delayed_stations: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_batches: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct OwnerDashboard {
    #[serde(default, deserialize_with = "null_as_default")]
    pub stations: Vec<Station>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub batches: Vec<Batch>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workers: Vec<Worker>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alerts: Vec<Alert>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub statistics: DashboardStatistics,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ManagerDashboard {
    #[serde(default, deserialize_with = "null_as_default")]
    pub assigned_stations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stations: Vec<Station>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub batches: Vec<Batch>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workers: Vec<Worker>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alerts: Vec<Alert>,
}

/// The three analytics aggregates taken from one refresh cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyticsSnapshot {
    pub productivity: ProductivityAggregate,
    pub wastage: WastageAggregate,
    pub costs: CostBreakdown,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
