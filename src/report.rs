use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::metrics::{self, ProductivityBand};
use crate::models::{AnalyticsSnapshot, Worker};
use crate::views::AnalyticsSummary;

#[derive(Debug, Clone, PartialEq)]
pub struct BandSummary {
    pub band: ProductivityBand,
    pub count: usize,
    pub avg_score: f64,
}

pub fn summarize_by_band(workers: &[Worker]) -> Vec<BandSummary> {
    let mut summaries: Vec<BandSummary> = [
        ProductivityBand::High,
        ProductivityBand::Medium,
        ProductivityBand::Low,
    ]
    .into_iter()
    .map(|band| {
        let scores: Vec<f64> = workers
            .iter()
            .filter(|w| ProductivityBand::for_score(w.productivity_score) == band)
            .map(|w| w.productivity_score)
            .collect();
        BandSummary {
            band,
            count: scores.len(),
            avg_score: if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            },
        }
    })
    .filter(|summary| summary.count > 0)
    .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

pub fn build_report(generated_at: DateTime<Local>, snapshot: &AnalyticsSnapshot) -> String {
    let summary = AnalyticsSummary::from_snapshot(snapshot);
    let bands = summarize_by_band(&snapshot.productivity.workers);

    let mut output = String::new();

    let _ = writeln!(output, "# Production Analytics Report");
    let _ = writeln!(output, "Generated {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(output);
    let _ = writeln!(output, "- Active workers: {}", summary.active_workers);
    let _ = writeln!(
        output,
        "- Average productivity: {:.1}%",
        summary.average_station_productivity
    );
    let _ = writeln!(output, "- Total costs: {:.2}", summary.total_cost);
    let _ = writeln!(output, "- Total wastage: {:.1} kg", summary.total_wastage);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Productivity by Station");

    let mut stations = summary.station_averages.clone();
    stations.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    if stations.is_empty() {
        let _ = writeln!(output, "No station productivity recorded.");
    } else {
        for (station, average, workers) in stations.iter() {
            let _ = writeln!(
                output,
                "- {}: {:.1}% across {} workers",
                station, average, workers
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Productivity Bands");

    if bands.is_empty() {
        let _ = writeln!(output, "No workers reported.");
    } else {
        for band in bands.iter() {
            let _ = writeln!(
                output,
                "- {}: {} workers (avg {:.1}%)",
                band.band.as_str(),
                band.count,
                band.avg_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Wastage by Station");

    if snapshot.wastage.is_empty() {
        let _ = writeln!(output, "No wastage recorded.");
    } else {
        for (station, wastage) in snapshot.wastage.iter() {
            let _ = writeln!(
                output,
                "- {}: {:.2} kg total, {:.2} kg avg over {} stages",
                station, wastage.total_wastage, wastage.average_wastage, wastage.count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Cost Breakdown");
    for slice in summary.cost_slices.iter() {
        let _ = writeln!(
            output,
            "- {}: {:.2} ({:.1}%)",
            slice.label, slice.value, slice.share_percent
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Performers");

    if summary.top_performers.is_empty() {
        let _ = writeln!(output, "No workers reported.");
    } else {
        for (rank, worker) in summary.top_performers.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} ({}) {:.1}% across {} tasks",
                rank + 1,
                worker.worker_name.as_deref().unwrap_or(&worker.worker_id),
                worker.station_id.as_deref().unwrap_or(metrics::UNKNOWN_STATION),
                worker.productivity_score,
                worker.total_tasks_completed
            );
        }
    }

    output
}
