mod adaptive;
mod attempts;
mod certificates;
mod diagnostic;
mod health;
mod mastery;
mod modules;
mod progress;
mod topics;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let healthcheck_endpoint = normalize_healthcheck_endpoint(
        std::env::var("HEALTHCHECK_ENDPOINT")
            .ok()
            .as_deref()
            .unwrap_or("/health"),
    );

    let mut app = Router::new()
        .nest("/api/adaptive", adaptive::router())
        .nest("/api/attempts", attempts::router())
        .nest("/api/certificates", certificates::router())
        .nest("/api/diagnostic", diagnostic::router())
        .nest("/api/mastery", mastery::router())
        .nest("/api/modules", modules::router())
        .nest("/api/progress", progress::router())
        .nest("/api/subjects", certificates::subjects_router())
        .nest("/api/topics", topics::router())
        .nest("/verify", certificates::verify_router());

    let mut health_paths = vec!["/health".to_string()];
    if healthcheck_endpoint != "/health" && healthcheck_endpoint != "/" {
        health_paths.push(healthcheck_endpoint);
    }
    for path in &health_paths {
        app = app.nest(path.as_str(), health::router());
    }

    app.fallback(fallback_handler).with_state(state)
}

fn normalize_healthcheck_endpoint(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "/health".to_string();
    }

    let with_slash = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };

    if with_slash != "/" {
        with_slash.trim_end_matches('/').to_string()
    } else {
        "/".to_string()
    }
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Endpoint not found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_healthcheck_endpoint() {
        assert_eq!(normalize_healthcheck_endpoint(""), "/health");
        assert_eq!(normalize_healthcheck_endpoint("status/"), "/status");
        assert_eq!(normalize_healthcheck_endpoint("/api/health"), "/api/health");
        assert_eq!(normalize_healthcheck_endpoint("/"), "/");
    }
}
