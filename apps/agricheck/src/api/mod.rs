//! # Agricheck HTTP API Module
//!
//! Serves the selector page, the printable checklist and the JSON API the
//! selector page talks to.
//!
//! ## Endpoints
//!
//! - `GET /` - Selector page
//! - `GET /checklist?groups=...` - Printable checklist page
//! - `GET /api/tree` - Selector tree
//! - `GET /api/search?q=...` - Search the selector tree
//! - `POST /api/compress` - Minimal selection and checklist link
//! - `GET /api/checklist?groups=...` - Checklist as JSON
//! - `GET /api/checklist.csv?groups=...` - Checklist as CSV
//! - `GET /health` - Health check
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `AGRICHECK_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `AGRICHECK_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `AGRICHECK_API_KEY`: If set, requires Bearer token authentication on `/api/*`

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::get_api_key_from_env;
pub use handlers::{CHECKLIST_PATH, NO_GROUPS_MESSAGE};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ChecklistResponse, CompressRequest, CompressResponse, ErrorResponse, HealthResponse,
    SearchParams, SearchResponse, TreeResponse,
};

use crate::source::RowSource;
use agricheck_core::AgricheckError;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// Holds no snapshot: each request loads its own from `source`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub source: RowSource,
    /// Namespace used to turn `groups` slugs back into ids.
    pub base_iri: String,
}

impl AppState {
    #[must_use]
    pub fn new(source: RowSource, base_iri: impl Into<String>) -> Self {
        Self {
            source,
            base_iri: base_iri.into(),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `AGRICHECK_CORS_ORIGINS`.
///
/// - `*`: any origin
/// - unset: localhost only
/// - otherwise: the comma-separated origins that parse as header values
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("AGRICHECK_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (AGRICHECK_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in AGRICHECK_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                cors_for(allowed_origins)
            }
        }
        None => {
            tracing::info!("CORS: No AGRICHECK_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn cors_for(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn build_localhost_cors() -> CorsLayer {
    let origins = [
        "http://localhost:8080",
        "http://127.0.0.1:8080",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    cors_for(origins)
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit, rate
/// limiting (if enabled), authentication (if configured).
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled for /api/*");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - the JSON API is publicly accessible. \
             Set AGRICHECK_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/", get(handlers::selector_page_handler))
        .route(CHECKLIST_PATH, get(handlers::checklist_page_handler))
        .route("/health", get(handlers::health_handler))
        .route("/api/tree", get(handlers::tree_handler))
        .route("/api/search", get(handlers::search_handler))
        .route("/api/compress", post(handlers::compress_handler))
        .route("/api/checklist", get(handlers::checklist_json_handler))
        .route("/api/checklist.csv", get(handlers::checklist_csv_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), AgricheckError> {
    tracing::info!(source = %state.source.describe(), "Serving checklists");
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AgricheckError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Agricheck HTTP server listening on http://{}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| AgricheckError::IoError(format!("Server error: {}", e)))
}
