//! Prometheus exporter for the `/metrics` endpoint.

use axum::{Router, routing::get};
use domain_notifications::metrics::DeliveryMetrics;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and describe the delivery metrics.
///
/// Subsequent calls return the handle installed by the first one.
pub fn init_metrics() -> eyre::Result<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| eyre::eyre!("Failed to install Prometheus recorder: {}", e))?;
        DeliveryMetrics::describe();
        info!("Prometheus metrics initialized");
        Ok(handle)
    })
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

/// Router with the `/metrics` endpoint
pub fn metrics_router() -> Router {
    Router::new().route("/metrics", get(|| async { render_metrics() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use domain_notifications::EventType;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_endpoint_renders_delivery_counters() {
        let first = init_metrics().unwrap() as *const PrometheusHandle;
        let second = init_metrics().unwrap() as *const PrometheusHandle;
        assert_eq!(first, second);

        DeliveryMetrics::record_dead_lettered(EventType::UserDeleted);
        DeliveryMetrics::record_delivered(EventType::UserCreated, 2);

        let response = metrics_router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("user_events_dead_lettered_total"));
        assert!(text.contains("event_type=\"user.deleted\""));
        assert!(text.contains("# HELP user_events_delivery_attempts"));
    }
}
