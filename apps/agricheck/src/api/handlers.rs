//! # API Endpoint Handlers
//!
//! Every handler that needs taxonomy data loads a fresh snapshot from the
//! row source. A failed load is reported as `502 Bad Gateway`.

use super::{
    AppState,
    types::{
        ChecklistResponse, CompressRequest, CompressResponse, ErrorResponse, HealthResponse,
        SearchParams, SearchResponse, TreeResponse,
    },
};
use crate::render::{checklist_csv, checklist_html, error_html, selector_html};
use agricheck_core::{
    AgricheckError, Checklist, NodeId, NodeKind, NodeMap, breadcrumbs, build_checklist,
    build_tree, encode_groups, parse_groups_query, primitives::NO_GROUPS, search_tree,
};
use axum::{
    Json,
    extract::{Query, RawQuery, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

/// Path of the printable checklist page.
pub const CHECKLIST_PATH: &str = "/checklist";

/// Message shown when a checklist is requested without usable groups.
pub const NO_GROUPS_MESSAGE: &str = "Keine Gruppen angegeben.";

/// HTTP status for a core error.
fn status_for(err: &AgricheckError) -> StatusCode {
    match err {
        AgricheckError::InvalidGroups(_)
        | AgricheckError::InvalidLanguage(_)
        | AgricheckError::SerializationError(_) => StatusCode::BAD_REQUEST,
        AgricheckError::NodeNotFound(_) => StatusCode::NOT_FOUND,
        AgricheckError::FetchFailed(_) | AgricheckError::MalformedRow { .. } => {
            StatusCode::BAD_GATEWAY
        }
        AgricheckError::IoError(_) | AgricheckError::ConfigError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Message for a failed checklist request, in the page's language.
fn checklist_error_message(err: &AgricheckError) -> String {
    match err {
        AgricheckError::InvalidGroups(reason) if reason == NO_GROUPS => {
            NO_GROUPS_MESSAGE.to_string()
        }
        AgricheckError::InvalidGroups(reason) => format!("Ungültige Gruppen: {}", reason),
        other => format!("Fehler beim Laden der Daten: {}", other),
    }
}

/// Parse the groups parameter, load a snapshot and expand the checklist.
async fn load_checklist(
    state: &AppState,
    raw_query: Option<&str>,
) -> Result<(Vec<NodeId>, Checklist), AgricheckError> {
    let groups = parse_groups_query(raw_query, &state.base_iri)?;
    let nodes = state.source.load().await?;
    let checklist = build_checklist(&groups, &nodes);
    if !checklist.missing.is_empty() {
        tracing::debug!(missing = checklist.missing.len(), "Unknown groups skipped");
    }
    Ok((groups, checklist))
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// PAGES
// =============================================================================

/// `GET /`: the selector page.
pub async fn selector_page_handler() -> impl IntoResponse {
    Html(selector_html())
}

/// `GET /checklist?groups=...`: the printable checklist.
pub async fn checklist_page_handler(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Response {
    match load_checklist(&state, raw_query.as_deref()).await {
        Ok((groups, checklist)) => {
            let today = chrono::Local::now().date_naive();
            Html(checklist_html(&checklist, today, &encode_groups(&groups))).into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Checklist page failed");
            (
                status_for(&e),
                Html(error_html("Kontrollcheckliste", &checklist_error_message(&e))),
            )
                .into_response()
        }
    }
}

// =============================================================================
// TREE & SEARCH HANDLERS
// =============================================================================

/// `GET /api/tree`: the selector tree.
pub async fn tree_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.source.load().await {
        Ok(nodes) => (
            StatusCode::OK,
            Json(TreeResponse::success(
                build_tree(&nodes),
                nodes.count_kind(NodeKind::Collection),
                nodes.count_kind(NodeKind::InspectionPoint),
            )),
        ),
        Err(e) => (status_for(&e), Json(TreeResponse::error(e.to_string()))),
    }
}

fn trails_for(hits: &[NodeId], nodes: &NodeMap) -> Vec<Vec<String>> {
    hits.iter().map(|id| breadcrumbs(id, nodes)).collect()
}

/// `GET /api/search?q=...`: search the selector tree.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = match params.validate() {
        Ok(q) => q.to_string(),
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SearchResponse::error(String::new(), e.to_string())),
            );
        }
    };

    match state.source.load().await {
        Ok(nodes) => {
            let hits = search_tree(&build_tree(&nodes), &query);
            let trails = trails_for(&hits.hits, &nodes);
            (
                StatusCode::OK,
                Json(SearchResponse::success(query, hits, trails)),
            )
        }
        Err(e) => (
            status_for(&e),
            Json(SearchResponse::error(query, e.to_string())),
        ),
    }
}

// =============================================================================
// COMPRESS HANDLER
// =============================================================================

/// `POST /api/compress`: reduce a selection and build the checklist link.
pub async fn compress_handler(
    State(state): State<AppState>,
    Json(request): Json<CompressRequest>,
) -> impl IntoResponse {
    let selection = match request.to_selection() {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(CompressResponse::error(e.to_string())),
            );
        }
    };

    match state.source.load().await {
        Ok(nodes) => {
            let compressed = selection.compressed(&nodes);
            let link = selection.checklist_link(&nodes, CHECKLIST_PATH);
            tracing::debug!(
                selected = selection.len(),
                compressed = compressed.len(),
                "Selection compressed"
            );
            (
                StatusCode::OK,
                Json(CompressResponse::success(&compressed, link)),
            )
        }
        Err(e) => (status_for(&e), Json(CompressResponse::error(e.to_string()))),
    }
}

// =============================================================================
// CHECKLIST API HANDLERS
// =============================================================================

/// `GET /api/checklist?groups=...`: the expanded checklist as JSON.
pub async fn checklist_json_handler(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> impl IntoResponse {
    match load_checklist(&state, raw_query.as_deref()).await {
        Ok((_, checklist)) => (StatusCode::OK, Json(ChecklistResponse::success(checklist))),
        Err(e) => (
            status_for(&e),
            Json(ChecklistResponse::error(checklist_error_message(&e))),
        ),
    }
}

/// `GET /api/checklist.csv?groups=...`: the expanded checklist as CSV.
pub async fn checklist_csv_handler(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Response {
    let result = load_checklist(&state, raw_query.as_deref())
        .await
        .and_then(|(_, checklist)| checklist_csv(&checklist));

    match result {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"kontrollcheckliste.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (
            status_for(&e),
            Json(ErrorResponse::new(checklist_error_message(&e))),
        )
            .into_response(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
