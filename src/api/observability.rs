//! Request spans, HTTP metrics and the health endpoint.
//!
//! [`request_span`] is installed as the `TraceLayer` span, so everything
//! below it (auth middleware, handlers, services) logs inside one span per
//! request. `user_id` is filled in by the auth middleware and `ticket_id`
//! by the path validation of the ticket and note routes.

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Span, field};
use uuid::Uuid;

use crate::api::AppState;

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.shared.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!("Health check failed: {e:#}");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

/// Span factory for `TraceLayer::make_span_with`.
pub fn request_span(req: &Request) -> Span {
    tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %req.method(),
        path = %req.uri().path(),
        resource = resource_of(req.uri().path()),
        user_id = field::Empty,
        ticket_id = field::Empty,
    )
}

/// Coarse domain area of a request path, used as a low-cardinality label.
fn resource_of(path: &str) -> &'static str {
    let path = path.trim_end_matches('/');
    if path.starts_with("/api/tickets") {
        if path.ends_with("/notes") {
            "notes"
        } else {
            "tickets"
        }
    } else if path.starts_with("/api/users") {
        "users"
    } else if path == "/health" || path == "/api/metrics" {
        "system"
    } else {
        "other"
    }
}

fn outcome_of(status: StatusCode) -> &'static str {
    match status.as_u16() {
        401 | 403 => "denied",
        404 => "not_found",
        409 => "conflict",
        400 | 422 => "rejected",
        s if s >= 500 => "error",
        _ => "success",
    }
}

/// Records the per-resource request counter and latency, then emits one
/// wide event inside the request span.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let resource = resource_of(req.uri().path());
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status();
    let outcome = outcome_of(status);

    let labels = [
        ("method", method),
        ("resource", resource.to_string()),
        ("outcome", outcome.to_string()),
    ];
    metrics::counter!("helpdesk_http_requests_total", &labels).increment(1);
    metrics::histogram!("helpdesk_http_request_duration_seconds", "resource" => resource)
        .record(elapsed.as_secs_f64());

    tracing::info!(
        event = "http_request_finished",
        route = route.as_deref().unwrap_or("unmatched"),
        status_code = status.as_u16(),
        duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        outcome,
        "Request finished"
    );

    response
}

/// Ticket and note bodies are private to their owner: never cache or frame them.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_map_to_resources() {
        assert_eq!(resource_of("/api/tickets"), "tickets");
        assert_eq!(resource_of("/api/tickets/7"), "tickets");
        assert_eq!(resource_of("/api/tickets/7/notes"), "notes");
        assert_eq!(resource_of("/api/tickets/7/notes/"), "notes");
        assert_eq!(resource_of("/api/users/login"), "users");
        assert_eq!(resource_of("/health"), "system");
        assert_eq!(resource_of("/favicon.ico"), "other");
    }

    #[test]
    fn statuses_map_to_outcomes() {
        assert_eq!(outcome_of(StatusCode::OK), "success");
        assert_eq!(outcome_of(StatusCode::CREATED), "success");
        assert_eq!(outcome_of(StatusCode::UNAUTHORIZED), "denied");
        assert_eq!(outcome_of(StatusCode::NOT_FOUND), "not_found");
        assert_eq!(outcome_of(StatusCode::CONFLICT), "conflict");
        assert_eq!(outcome_of(StatusCode::BAD_REQUEST), "rejected");
        assert_eq!(outcome_of(StatusCode::SERVICE_UNAVAILABLE), "error");
    }
}
