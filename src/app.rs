use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{health, people};
use crate::state::AppState;

/// Build the full router for the given state
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health))
        .merge(people_routes())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    // Global middleware
    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn people_routes() -> Router<AppState> {
    Router::new()
        .route("/People", get(people::people_get).post(people::people_post))
        .route("/People/:id", delete(people::person_delete))
        .route(
            "/People/:id/tasks",
            get(people::person_tasks_get)
                .post(people::person_tasks_post)
                .delete(people::person_tasks_delete),
        )
        .route("/People/:id/task", post(people::task_post))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
