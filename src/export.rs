use std::io;

use anyhow::Context;
use serde::Serialize;

use crate::metrics::ProductivityBand;
use crate::models::Worker;

#[derive(Debug, Serialize)]
struct WorkerRow<'a> {
    worker_id: &'a str,
    worker_name: &'a str,
    station_id: &'a str,
    productivity_score: f64,
    band: &'static str,
    total_tasks_completed: i64,
    is_active: bool,
}

/// Writes the roster as CSV with a header row. Returns the number of workers written.
pub fn write_workers<W: io::Write>(writer: W, workers: &[Worker]) -> anyhow::Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);

    for worker in workers {
        csv.serialize(WorkerRow {
            worker_id: &worker.worker_id,
            worker_name: worker.worker_name.as_deref().unwrap_or(""),
            station_id: worker.station_id.as_deref().unwrap_or(""),
            productivity_score: worker.productivity_score,
            band: ProductivityBand::for_score(worker.productivity_score).as_str(),
            total_tasks_completed: worker.total_tasks_completed,
            is_active: worker.is_active,
        })
        .with_context(|| format!("failed to write worker {}", worker.worker_id))?;
    }

    csv.flush().context("failed to flush worker export")?;
    Ok(workers.len())
}
