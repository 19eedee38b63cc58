use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::MonitorConfig;
use crate::error::FetchError;
use crate::models::{
    Batch, BatchProgress, CostBreakdown, ManagerDashboard, OwnerDashboard, ProductivityAggregate,
    Station, WastageAggregate, Worker,
};
use crate::session::Session;

/// One read (or command) per backend resource.
#[async_trait]
pub trait DashboardSource: Send + Sync + 'static {
    async fn owner_dashboard(&self) -> Result<OwnerDashboard, FetchError>;
    async fn manager_dashboard(&self, manager_id: &str) -> Result<ManagerDashboard, FetchError>;
    async fn batches(&self) -> Result<Vec<Batch>, FetchError>;
    async fn batch_progress(&self, batch_id: &str) -> Result<BatchProgress, FetchError>;
    async fn workers(&self) -> Result<Vec<Worker>, FetchError>;
    async fn stations(&self) -> Result<Vec<Station>, FetchError>;
    async fn productivity(&self) -> Result<ProductivityAggregate, FetchError>;
    async fn wastage(&self) -> Result<WastageAggregate, FetchError>;
    async fn costs(&self) -> Result<CostBreakdown, FetchError>;
    async fn resolve_alert(&self, alert_id: &str) -> Result<(), FetchError>;
    async fn run_simulator(&self) -> Result<String, FetchError>;
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(config: &MonitorConfig, session: Arc<Session>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(&self, resp: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            error!(url = %resp.url(), "backend rejected credentials, expiring session");
            self.session.expire();
            return Err(FetchError::Unauthorized);
        }
        if !status.is_success() {
            let code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Server { status: code, message: body });
        }
        Ok(resp)
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, FetchError> {
        debug!(path, "GET");
        let req = self.authed(self.http.get(self.url(path)));
        let resp = self.check(req.send().await?).await?;
        resp.json::<R>()
            .await
            .map_err(|e| FetchError::Decode(format!("{path}: {e}")))
    }
}

#[async_trait]
impl DashboardSource for ApiClient {
    async fn owner_dashboard(&self) -> Result<OwnerDashboard, FetchError> {
        self.get_json("/dashboard/owner").await
    }

    async fn manager_dashboard(&self, manager_id: &str) -> Result<ManagerDashboard, FetchError> {
        self.get_json(&format!("/dashboard/manager/{manager_id}")).await
    }

    async fn batches(&self) -> Result<Vec<Batch>, FetchError> {
        self.get_json("/batches").await
    }

    async fn batch_progress(&self, batch_id: &str) -> Result<BatchProgress, FetchError> {
        self.get_json(&format!("/batches/{batch_id}/progress")).await
    }

    async fn workers(&self) -> Result<Vec<Worker>, FetchError> {
        self.get_json("/workers").await
    }

    async fn stations(&self) -> Result<Vec<Station>, FetchError> {
        self.get_json("/stations").await
    }

    async fn productivity(&self) -> Result<ProductivityAggregate, FetchError> {
        self.get_json("/analytics/productivity").await
    }

    async fn wastage(&self) -> Result<WastageAggregate, FetchError> {
        self.get_json("/analytics/wastage").await
    }

    async fn costs(&self) -> Result<CostBreakdown, FetchError> {
        self.get_json("/analytics/costs").await
    }

    async fn resolve_alert(&self, alert_id: &str) -> Result<(), FetchError> {
        debug!(alert_id, "PUT resolve");
        let req = self.authed(self.http.put(self.url(&format!("/alerts/{alert_id}/resolve"))));
        self.check(req.send().await?).await?;
        Ok(())
    }

    async fn run_simulator(&self) -> Result<String, FetchError> {
        let req = self.authed(self.http.post(self.url("/simulator/run")));
        let resp = self.check(req.send().await?).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(format!("/simulator/run: {e}")))?;
        Ok(body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("simulation requested")
            .to_string())
    }
}
