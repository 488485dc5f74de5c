/// Health and metrics endpoints shared by every service
use crate::metrics;
use axum::{
    extract::{FromRef, State},
    http::header,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity reported by `/health`
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    /// Service name, e.g. "blog-service"
    pub name: &'static str,
    pub version: String,
}

impl ServiceInfo {
    pub fn new(name: &'static str, version: impl Into<String>) -> Self {
        Self {
            name,
            version: version.into(),
        }
    }
}

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Build health check routes for any service state carrying a [`ServiceInfo`]
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ServiceInfo: FromRef<S>,
{
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
}

async fn health(State(info): State<ServiceInfo>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        service: info.name.to_string(),
        timestamp: Utc::now(),
        version: info.version,
    })
}

/// Prometheus text exposition
async fn metrics_text() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_service() {
        let app: Router = routes().with_state(ServiceInfo::new("blog-service", "1.0.0"));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: HealthStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(status.status, "healthy");
        assert_eq!(status.service, "blog-service");
        assert_eq!(status.version, "1.0.0");
    }
}
