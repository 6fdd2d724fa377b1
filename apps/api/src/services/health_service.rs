//! Health check service.
//!
//! Liveness plus a database ping, for load balancers and monitoring.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::api_types::HealthResponse;
use crate::AppState;

pub struct HealthService {
    state: Arc<AppState>,
}

impl HealthService {
    pub fn new(state: Arc<AppState>) -> Self {
        HealthService { state }
    }

    /// `status` is `"ok"` when the database answers, `"degraded"` otherwise.
    pub async fn check(&self) -> HealthResponse {
        let database = self.state.db.health_check().await;
        if !database {
            warn!("Health check: database unreachable");
        }

        HealthResponse {
            status: if database { "ok" } else { "degraded" }.to_string(),
            database,
            version: env!("CARGO_PKG_VERSION").to_string(),
            server_time: Utc::now(),
        }
    }
}
