use tracing::{info, warn};

use crate::client::DashboardSource;
use crate::error::FetchError;
use crate::models::{Alert, AlertSeverity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved,
    /// The backend answered with a non-success status.
    Rejected { status: u16, message: String },
    Failed(String),
}

impl ResolveOutcome {
    /// Only a confirmed resolve warrants re-synchronizing the owning view.
    pub fn needs_refresh(&self) -> bool {
        matches!(self, ResolveOutcome::Resolved)
    }
}

/// Sends the resolve request; every failure is folded into the outcome.
pub async fn resolve(source: &dyn DashboardSource, alert_id: &str) -> ResolveOutcome {
    match source.resolve_alert(alert_id).await {
        Ok(()) => {
            info!(alert_id, "alert resolved");
            ResolveOutcome::Resolved
        }
        Err(FetchError::Server { status, message }) => {
            warn!(alert_id, status, "resolve rejected by backend");
            let message = FetchError::Server { status, message }.display_message();
            ResolveOutcome::Rejected { status, message }
        }
        Err(err) => {
            warn!(alert_id, error = %err, "resolve request failed");
            ResolveOutcome::Failed(err.display_message())
        }
    }
}

pub fn severity_glyph(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Critical => "[CRIT]",
        AlertSeverity::High => "[HIGH]",
        AlertSeverity::Medium => "[MED ]",
        AlertSeverity::Other => "[INFO]",
    }
}

/// One line per alert, in backend order.
pub fn alert_lines(alerts: &[Alert]) -> Vec<String> {
    alerts
        .iter()
        .map(|alert| {
            let station = alert.station_id.as_deref().unwrap_or("-");
            let when = alert
                .created_at
                .map(|ts| ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{} {} ({} • {}) id={}",
                severity_glyph(alert.severity),
                alert.message,
                station,
                when,
                alert.id
            )
        })
        .collect()
}
