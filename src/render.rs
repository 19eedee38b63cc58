use std::fmt::Write;

use crate::alerts;
use crate::metrics::{self, ProductivityBand};
use crate::models::{Batch, Station, StationStatus, StageStatus, Worker};
use crate::views::{AnalyticsView, FlowView, ManagerView, OwnerView, ViewState, WorkerView};

const BAR_WIDTH: usize = 20;

pub fn format_kg(value: f64) -> String {
    format!("{value:.1} kg")
}

pub fn progress_text(batch: &Batch) -> String {
    format!("{:.1}% Complete", metrics::batch_progress_percent(batch))
}

pub fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn station_marker(status: StationStatus) -> &'static str {
    match status {
        StationStatus::Active => "RUN ",
        StationStatus::Completed => "DONE",
        StationStatus::Delayed => "LATE",
        StationStatus::Stopped => "STOP",
        StationStatus::Idle | StationStatus::Unknown => "IDLE",
    }
}

fn stage_marker(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Completed => "DONE",
        StageStatus::InProgress => "RUN ",
        StageStatus::Delayed => "LATE",
        StageStatus::Stopped => "STOP",
        StageStatus::Pending | StageStatus::Other => "WAIT",
    }
}

/// Writes the loading or freshness line. Returns true when there is data to draw.
fn status_header<T>(output: &mut String, state: &ViewState<T>) -> bool {
    if state.is_loading() {
        let _ = writeln!(output, "Loading...");
        return false;
    }
    if let Some(ts) = state.last_update() {
        let _ = writeln!(output, "Last updated: {}", ts.format("%H:%M:%S"));
    }
    if let Some(error) = state.error() {
        let _ = writeln!(output, "! {error}  (type `dismiss` to hide)");
    }
    state.snapshot().is_some()
}

fn station_lines(output: &mut String, stations: &[Station]) {
    for station in stations {
        let _ = writeln!(
            output,
            "  [{}] {} {} ({}, {:.0} min)",
            station_marker(station.current_status),
            station.station_id,
            station.station_name,
            station.current_status.as_str(),
            station.expected_time_minutes
        );
    }
}

fn batch_lines(output: &mut String, batches: &[Batch]) {
    if batches.is_empty() {
        let _ = writeln!(output, "  No active batches.");
    }
    for batch in batches {
        let _ = writeln!(
            output,
            "  {} {} @ {} {} {} ({})",
            batch.batch_number,
            batch.product_name,
            batch.current_station.as_deref().unwrap_or("-"),
            progress_bar(metrics::batch_progress_percent(batch)),
            progress_text(batch),
            batch.overall_status.as_str()
        );
    }
}

fn worker_line(worker: &Worker) -> String {
    format!(
        "  {} {} @ {} {:.1}% ({}) tasks={} {}",
        worker.worker_id,
        worker.worker_name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Unknown"),
        worker.station_id.as_deref().unwrap_or("N/A"),
        worker.productivity_score,
        ProductivityBand::for_score(worker.productivity_score).as_str(),
        worker.total_tasks_completed,
        if worker.is_active { "active" } else { "inactive" }
    )
}

fn alert_section(output: &mut String, alerts: &[crate::models::Alert]) {
    if alerts.is_empty() {
        return;
    }
    let _ = writeln!(output, "\n## Alerts ({})", alerts.len());
    for line in alerts::alert_lines(alerts) {
        let _ = writeln!(output, "  {line}");
    }
}

pub fn render_owner(view: &OwnerView) -> String {
    let mut output = String::from("# Owner Dashboard\n");
    if !status_header(&mut output, &view.state) {
        return output;
    }
    let Some(dashboard) = view.state.snapshot() else {
        return output;
    };

    let stats = &dashboard.statistics;
    let _ = writeln!(
        output,
        "Workers {} | Active stations {} | Delayed stations {} | Batches {}",
        stats.total_workers, stats.active_stations, stats.delayed_stations, stats.total_batches
    );
    alert_section(&mut output, &dashboard.alerts);

    let _ = writeln!(output, "\n## Active Batches");
    batch_lines(&mut output, &dashboard.batches);

    let _ = writeln!(output, "\n## Stations");
    station_lines(&mut output, &dashboard.stations);

    let _ = writeln!(output, "\n## Workers");
    for worker in dashboard.workers.iter().take(metrics::TOP_PERFORMERS) {
        let _ = writeln!(output, "{}", worker_line(worker));
    }
    if dashboard.workers.len() > metrics::TOP_PERFORMERS {
        let _ = writeln!(
            output,
            "  ... and {} more",
            dashboard.workers.len() - metrics::TOP_PERFORMERS
        );
    }
    output
}

pub fn render_manager(view: &ManagerView) -> String {
    let mut output = format!("# Manager Dashboard ({})\n", view.manager_id);
    if !status_header(&mut output, &view.state) {
        return output;
    }
    let Some(dashboard) = view.state.snapshot() else {
        return output;
    };

    let _ = writeln!(output, "Assigned stations: {}", dashboard.assigned_stations.join(", "));
    let counts = view.status_counts;
    let _ = writeln!(
        output,
        "Active {} | Delayed {} | Stopped {}",
        counts.active, counts.delayed, counts.stopped
    );
    alert_section(&mut output, &dashboard.alerts);

    if !dashboard.batches.is_empty() {
        let _ = writeln!(output, "\n## Batches at assigned stations");
        batch_lines(&mut output, &dashboard.batches);
    }

    let _ = writeln!(output, "\n## Stations");
    station_lines(&mut output, &dashboard.stations);

    let _ = writeln!(output, "\n## Workers ({})", dashboard.workers.len());
    for worker in &dashboard.workers {
        let _ = writeln!(output, "{}", worker_line(worker));
    }
    output
}

pub fn render_flow(view: &FlowView) -> String {
    let mut output = String::from("# Production Flow\n");
    if !status_header(&mut output, &view.batches) {
        return output;
    }

    let batches = view.batches.snapshot().map(Vec::as_slice).unwrap_or(&[]);
    let _ = writeln!(output, "Batches:");
    for batch in batches {
        let marker = if view.selection.current() == Some(batch.id.as_str()) { '>' } else { ' ' };
        let _ = writeln!(
            output,
            " {marker} {} - {} ({}) id={}",
            batch.batch_number,
            batch.product_name,
            batch.overall_status.as_str(),
            batch.id
        );
    }

    let Some(batch) = view.current_batch() else {
        let _ = writeln!(output, "\nNo batch selected.");
        return output;
    };
    let _ = writeln!(
        output,
        "\n{} | {} | target {} | at {} | {}",
        batch.batch_number,
        batch.product_name,
        format_kg(batch.target_quantity_kg),
        batch.current_station.as_deref().unwrap_or("-"),
        progress_text(batch)
    );

    let _ = writeln!(output, "\n## Pipeline");
    for (index, stage) in view.progress.iter().enumerate() {
        let _ = write!(
            output,
            "  {}. [{}] {}",
            index + 1,
            stage_marker(stage.status),
            stage.station_name.as_deref().unwrap_or(&stage.station_id)
        );
        if stage.input_quantity_kg > 0.0 {
            let _ = write!(output, " in {}", format_kg(stage.input_quantity_kg));
        }
        if stage.output_quantity_kg > 0.0 {
            let _ = write!(output, " out {}", format_kg(stage.output_quantity_kg));
        }
        if stage.wastage_kg > 0.0 {
            let _ = write!(output, " waste {}", format_kg(stage.wastage_kg));
        }
        if let Some(start) = stage.start_time {
            let _ = write!(output, " started {}", start.with_timezone(&chrono::Local).format("%H:%M:%S"));
        }
        if let Some(end) = stage.end_time {
            let _ = write!(output, " ended {}", end.with_timezone(&chrono::Local).format("%H:%M:%S"));
        }
        let _ = writeln!(output);
    }

    let summary = view.summary;
    let _ = writeln!(output, "\n## Material Flow Summary");
    let _ = writeln!(
        output,
        "  Input {:.2} kg | Output {:.2} kg | Wastage {:.2} kg | Efficiency {:.1}%",
        summary.total_input, summary.total_output, summary.total_wastage, summary.efficiency
    );
    output
}

pub fn render_workers(view: &WorkerView) -> String {
    let mut output = String::from("# Worker Tracking\n");
    if !status_header(&mut output, &view.state) {
        return output;
    }

    let stats = view.stats;
    let _ = writeln!(
        output,
        "Total {} | Active {} | Avg productivity {:.1}% | Tasks completed {}",
        stats.total, stats.active, stats.average_productivity, stats.tasks_completed
    );

    let _ = writeln!(output, "\n## Station Distribution");
    for share in &view.distribution {
        let name = view
            .stations
            .iter()
            .find(|s| s.station_id == share.station_id)
            .map(|s| s.station_name.as_str())
            .unwrap_or("");
        let _ = writeln!(
            output,
            "  {:<12} {:<16} {} {:>3} ({:.0}%)",
            share.station_id,
            name,
            progress_bar(share.percent),
            share.count,
            share.percent
        );
    }

    let visible = view.visible_workers();
    let _ = writeln!(output, "\n## Workers ({})", visible.len());
    if visible.is_empty() {
        let _ = writeln!(output, "  No workers found matching your filters");
    }
    for worker in visible {
        let _ = writeln!(output, "{}", worker_line(worker));
    }
    output
}

pub fn render_analytics(view: &AnalyticsView) -> String {
    let mut output = String::from("# Analytics & Insights\n");
    if !status_header(&mut output, &view.state) {
        return output;
    }
    let Some(summary) = &view.summary else {
        return output;
    };

    let _ = writeln!(
        output,
        "Active workers {} | Avg productivity {:.1}% | Total costs {:.2} | Total wastage {}",
        summary.active_workers,
        summary.average_station_productivity,
        summary.total_cost,
        format_kg(summary.total_wastage)
    );

    let _ = writeln!(output, "\n## Productivity by Station");
    for (station, average, workers) in &summary.station_averages {
        let _ = writeln!(output, "  {station:<12} {average:>6.1}% ({workers} workers)");
    }

    let _ = writeln!(output, "\n## Wastage by Station (avg)");
    for (station, average) in &summary.wastage_by_station {
        let _ = writeln!(output, "  {station:<12} {average:>8.2} kg");
    }

    let _ = writeln!(output, "\n## Cost Distribution");
    for slice in &summary.cost_slices {
        let _ = writeln!(
            output,
            "  {:<14} {:>14.2} ({:.0}%)",
            slice.label, slice.value, slice.share_percent
        );
    }

    let _ = writeln!(output, "\n## Top Performers");
    for (rank, worker) in summary.top_performers.iter().enumerate() {
        let _ = writeln!(
            output,
            "  {:>2}. {} ({}) {:.1}%",
            rank + 1,
            worker.worker_name.as_deref().unwrap_or(&worker.worker_id),
            worker.station_id.as_deref().unwrap_or("N/A"),
            worker.productivity_score
        );
    }
    output
}
