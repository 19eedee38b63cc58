use std::collections::{BTreeMap, HashMap};

use crate::models::{
    Batch, CostBreakdown, Station, StationProductivity, StationStatus, StageProgress,
    WastageAggregate, Worker,
};

pub const TOP_PERFORMERS: usize = 10;
pub const UNKNOWN_STATION: &str = "unknown";

pub fn batch_progress_percent(batch: &Batch) -> f64 {
    if batch.target_quantity_kg <= 0.0 {
        return 0.0;
    }
    batch.current_quantity_kg / batch.target_quantity_kg * 100.0
}

/// Mean of per-station averages. Stations without workers are left out.
pub fn average_station_productivity(stations: &BTreeMap<String, StationProductivity>) -> f64 {
    let averages: Vec<f64> = stations
        .values()
        .filter(|station| !station.workers.is_empty())
        .map(|station| station.average_score)
        .collect();

    if averages.is_empty() {
        0.0
    } else {
        averages.iter().sum::<f64>() / averages.len() as f64
    }
}

pub fn mean_worker_productivity(workers: &[Worker]) -> f64 {
    if workers.is_empty() {
        return 0.0;
    }
    workers.iter().map(|w| w.productivity_score).sum::<f64>() / workers.len() as f64
}

/// Sum that starts from +0.0, so an empty input formats as `0.0`.
fn total(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, value| acc + value)
}

pub fn total_wastage(wastage: &WastageAggregate) -> f64 {
    total(wastage.values().map(|station| station.total_wastage))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostSlice {
    pub label: &'static str,
    pub value: f64,
    pub share_percent: f64,
}

/// Raw material, packaging and wastage slices, passed through unvalidated.
pub fn cost_distribution(costs: &CostBreakdown) -> [CostSlice; 3] {
    let parts = [
        ("Raw Materials", costs.raw_material_cost),
        ("Packaging", costs.packaging_cost),
        ("Wastage", costs.wastage_cost),
    ];
    let sum = total(parts.iter().map(|(_, value)| *value));

    parts.map(|(label, value)| CostSlice {
        label,
        value,
        share_percent: if sum == 0.0 { 0.0 } else { value / sum * 100.0 },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowSummary {
    pub total_input: f64,
    pub total_output: f64,
    pub total_wastage: f64,
    pub efficiency: f64,
}

impl FlowSummary {
    pub fn from_stages(stages: &[StageProgress]) -> Self {
        let total_input = total(stages.iter().map(|s| s.input_quantity_kg));
        let total_output = total(stages.iter().map(|s| s.output_quantity_kg));
        let total_wastage = total(stages.iter().map(|s| s.wastage_kg));
        let efficiency = if total_input > 0.0 {
            (total_input - total_wastage) / total_input * 100.0
        } else {
            0.0
        };

        Self {
            total_input,
            total_output,
            total_wastage,
            efficiency,
        }
    }
}

pub fn top_performers(workers: &[Worker], limit: usize) -> Vec<Worker> {
    let mut ranked = workers.to_vec();
    ranked.sort_by(|a, b| {
        b.productivity_score
            .partial_cmp(&a.productivity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationShare {
    pub station_id: String,
    pub count: usize,
    pub percent: f64,
}

/// Worker head-count per station in first-seen order.
pub fn station_distribution(workers: &[Worker]) -> Vec<StationShare> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut shares: Vec<StationShare> = Vec::new();

    for worker in workers {
        let station = worker
            .station_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(UNKNOWN_STATION);
        let slot = *index.entry(station).or_insert_with(|| {
            shares.push(StationShare {
                station_id: station.to_string(),
                count: 0,
                percent: 0.0,
            });
            shares.len() - 1
        });
        shares[slot].count += 1;
    }

    let total = workers.len();
    for share in shares.iter_mut() {
        share.percent = if total == 0 {
            0.0
        } else {
            share.count as f64 / total as f64 * 100.0
        };
    }
    shares
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorkerStats {
    pub total: usize,
    pub active: usize,
    pub average_productivity: f64,
    pub tasks_completed: i64,
}

impl WorkerStats {
    pub fn from_workers(workers: &[Worker]) -> Self {
        Self {
            total: workers.len(),
            active: workers.iter().filter(|w| w.is_active).count(),
            average_productivity: mean_worker_productivity(workers),
            tasks_completed: workers.iter().map(|w| w.total_tasks_completed).sum(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StationStatusCounts {
    pub active: usize,
    pub delayed: usize,
    pub stopped: usize,
}

impl StationStatusCounts {
    pub fn from_stations(stations: &[Station]) -> Self {
        let mut counts = Self::default();
        for station in stations {
            match station.current_status {
                StationStatus::Active => counts.active += 1,
                StationStatus::Delayed => counts.delayed += 1,
                StationStatus::Stopped => counts.stopped += 1,
                _ => {}
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductivityBand {
    High,
    Medium,
    Low,
}

impl ProductivityBand {
    pub fn for_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => ProductivityBand::High,
            s if s >= 60.0 => ProductivityBand::Medium,
            _ => ProductivityBand::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductivityBand::High => "high",
            ProductivityBand::Medium => "medium",
            ProductivityBand::Low => "low",
        }
    }
}

/// Station filter (`None` keeps all) plus case-insensitive name/id search.
pub fn filter_workers<'a>(workers: &'a [Worker], station: Option<&str>, search: &str) -> Vec<&'a Worker> {
    let needle = search.to_lowercase();
    workers
        .iter()
        .filter(|worker| station.map_or(true, |s| worker.station_id.as_deref() == Some(s)))
        .filter(|worker| {
            let name = worker.worker_name.as_deref().unwrap_or("").to_lowercase();
            name.contains(&needle) || worker.worker_id.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StationWastage;

    fn worker(id: &str, station: Option<&str>, score: f64) -> Worker {
        Worker {
            id: format!("uuid-{id}"),
            worker_id: id.to_string(),
            worker_name: Some(format!("Worker {id}")),
            station_id: station.map(String::from),
            productivity_score: score,
            total_tasks_completed: 4,
            is_active: true,
        }
    }

    fn batch(current: f64, target: f64) -> Batch {
        Batch {
            id: "b1".to_string(),
            batch_number: "B-001".to_string(),
            product_name: "ABC Powder".to_string(),
            start_date: None,
            end_date: None,
            target_quantity_kg: target,
            current_quantity_kg: current,
            current_station: Some("STATION_3".to_string()),
            overall_status: crate::models::BatchStatus::InProgress,
        }
    }

    fn stage(input: f64, output: f64, wastage: f64) -> StageProgress {
        StageProgress {
            id: "p".to_string(),
            batch_id: "b1".to_string(),
            station_id: "STATION_1".to_string(),
            station_name: None,
            input_quantity_kg: input,
            output_quantity_kg: output,
            wastage_kg: wastage,
            start_time: None,
            end_time: None,
            status: crate::models::StageStatus::Completed,
        }
    }

    #[test]
    fn progress_is_ratio_of_current_to_target() {
        assert!((batch_progress_percent(&batch(40.0, 100.0)) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn zero_target_gives_zero_progress() {
        let pct = batch_progress_percent(&batch(25.0, 0.0));
        assert_eq!(pct, 0.0);
        assert!(pct.is_finite());
    }

    #[test]
    fn station_average_excludes_empty_stations() {
        let mut stations = BTreeMap::new();
        stations.insert(
            "STATION_1".to_string(),
            StationProductivity {
                workers: vec![worker("W1", Some("STATION_1"), 90.0), worker("W2", Some("STATION_1"), 70.0)],
                average_score: 80.0,
                total_tasks: 8,
            },
        );
        stations.insert(
            "STATION_2".to_string(),
            StationProductivity {
                workers: vec![worker("W3", Some("STATION_2"), 60.0)],
                average_score: 60.0,
                total_tasks: 4,
            },
        );
        stations.insert("STATION_3".to_string(), StationProductivity::default());

        assert!((average_station_productivity(&stations) - 70.0).abs() < 1e-9);
        assert_eq!(average_station_productivity(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn station_average_is_mean_of_means_not_global_mean() {
        let mut stations = BTreeMap::new();
        stations.insert(
            "A".to_string(),
            StationProductivity {
                workers: vec![worker("W1", Some("A"), 100.0); 3],
                average_score: 100.0,
                total_tasks: 0,
            },
        );
        stations.insert(
            "B".to_string(),
            StationProductivity {
                workers: vec![worker("W2", Some("B"), 40.0)],
                average_score: 40.0,
                total_tasks: 0,
            },
        );
        assert!((average_station_productivity(&stations) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn total_wastage_sums_station_totals() {
        let mut wastage = WastageAggregate::new();
        wastage.insert(
            "STATION_1".to_string(),
            StationWastage { total_wastage: 5.2, count: 2, average_wastage: 2.6 },
        );
        wastage.insert(
            "STATION_2".to_string(),
            StationWastage { total_wastage: 3.8, count: 1, average_wastage: 3.8 },
        );
        assert_eq!(format!("{:.1}", total_wastage(&wastage)), "9.0");
    }

    #[test]
    fn empty_inputs_format_as_positive_zero() {
        assert_eq!(format!("{:.1} kg", total_wastage(&WastageAggregate::new())), "0.0 kg");

        let summary = FlowSummary::from_stages(&[]);
        assert_eq!(format!("{:.2}", summary.total_input), "0.00");
        assert_eq!(format!("{:.2}", summary.total_output), "0.00");
        assert_eq!(format!("{:.2}", summary.total_wastage), "0.00");
        assert!(summary.total_input.is_sign_positive());
    }

    #[test]
    fn cost_slices_pass_backend_values_through() {
        let costs = CostBreakdown {
            raw_material_cost: 100000.0,
            packaging_cost: 20000.0,
            wastage_cost: 15000.0,
            total_cost: 135000.0,
        };
        let slices = cost_distribution(&costs);
        let values: Vec<f64> = slices.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![100000.0, 20000.0, 15000.0]);
        assert!((slices.iter().map(|s| s.share_percent).sum::<f64>() - 100.0).abs() < 1e-9);

        let empty = cost_distribution(&CostBreakdown::default());
        assert!(empty.iter().all(|s| s.share_percent == 0.0));
    }

    #[test]
    fn efficiency_accounts_for_wastage() {
        let summary = FlowSummary::from_stages(&[stage(100.0, 95.0, 5.0), stage(95.0, 90.0, 5.0)]);
        assert_eq!(summary.total_input, 195.0);
        assert_eq!(summary.total_output, 185.0);
        assert_eq!(summary.total_wastage, 10.0);
        assert!((summary.efficiency - 185.0 / 195.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_input_gives_zero_efficiency() {
        assert_eq!(FlowSummary::from_stages(&[]).efficiency, 0.0);
        assert_eq!(FlowSummary::from_stages(&[stage(0.0, 0.0, 0.0)]).efficiency, 0.0);
    }

    #[test]
    fn top_performers_sorts_descending_and_keeps_tie_order() {
        let workers = vec![
            worker("W1", Some("S1"), 70.0),
            worker("W2", Some("S1"), 95.0),
            worker("W3", Some("S2"), 70.0),
            worker("W4", Some("S2"), 120.0),
        ];
        let ranked = top_performers(&workers, TOP_PERFORMERS);
        let ids: Vec<&str> = ranked.iter().map(|w| w.worker_id.as_str()).collect();
        assert_eq!(ids, vec!["W4", "W2", "W1", "W3"]);
    }

    #[test]
    fn top_performers_truncates_to_limit() {
        let workers: Vec<Worker> = (0..25).map(|i| worker(&format!("W{i}"), None, i as f64)).collect();
        let ranked = top_performers(&workers, TOP_PERFORMERS);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].worker_id, "W24");
        assert_eq!(ranked[9].worker_id, "W15");
    }

    #[test]
    fn distribution_has_unknown_bucket() {
        let workers = vec![
            worker("W1", Some("STATION_1"), 80.0),
            worker("W2", None, 80.0),
            worker("W3", Some("STATION_1"), 80.0),
            worker("W4", Some(""), 80.0),
        ];
        let shares = station_distribution(&workers);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].station_id, "STATION_1");
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[0].percent, 50.0);
        assert_eq!(shares[1].station_id, UNKNOWN_STATION);
        assert_eq!(shares[1].count, 2);
        assert!(station_distribution(&[]).is_empty());
    }

    #[test]
    fn worker_stats_handle_empty_roster() {
        assert_eq!(WorkerStats::from_workers(&[]), WorkerStats::default());

        let mut idle = worker("W2", None, 50.0);
        idle.is_active = false;
        let stats = WorkerStats::from_workers(&[worker("W1", None, 90.0), idle]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.average_productivity, 70.0);
        assert_eq!(stats.tasks_completed, 8);
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ProductivityBand::for_score(80.0), ProductivityBand::High);
        assert_eq!(ProductivityBand::for_score(79.9), ProductivityBand::Medium);
        assert_eq!(ProductivityBand::for_score(-3.0), ProductivityBand::Low);
        assert_eq!(ProductivityBand::for_score(250.0), ProductivityBand::High);
    }

    #[test]
    fn filter_matches_station_and_search() {
        let mut workers = vec![
            worker("W1", Some("STATION_1"), 80.0),
            worker("W2", Some("STATION_2"), 80.0),
        ];
        workers[1].worker_name = Some("Priya Sharma".to_string());

        assert_eq!(filter_workers(&workers, None, "").len(), 2);
        assert_eq!(filter_workers(&workers, Some("STATION_1"), "").len(), 1);
        assert_eq!(filter_workers(&workers, None, "priya")[0].worker_id, "W2");
        assert_eq!(filter_workers(&workers, None, "w1")[0].worker_id, "W1");
        assert!(filter_workers(&workers, Some("STATION_1"), "priya").is_empty());
    }
}
