//! Integration tests for the Agricheck HTTP API and pages.
//!
//! Uses axum-test against an in-memory snapshot, so no endpoint is needed.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use agricheck::api::{
    AppState, ChecklistResponse, CompressResponse, HealthResponse, NO_GROUPS_MESSAGE,
    SearchResponse, TreeResponse, create_router,
};
use agricheck::config::AppConfig;
use agricheck::source::RowSource;
use agricheck_core::sparql::{Binding, BindingValue};
use agricheck_core::{NodeId, SparqlResults};
use axum::http::HeaderValue;
use axum_test::TestServer;
use serde_json::json;
use std::sync::Mutex;

/// Mutex to serialize tests since some of them modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

const BASE: &str = "https://agriculture.ld.admin.ch/inspection/";
const COLLECTION: &str = "http://purl.org/dc/terms/Collection";
const POINT: &str = "https://agriculture.ld.admin.ch/inspection/InspectionPoint";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn iri(slug: &str) -> String {
    format!("{BASE}{slug}")
}

fn id(slug: &str) -> NodeId {
    NodeId::new(iri(slug))
}

fn row(pairs: &[(&str, BindingValue)]) -> Binding {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn uri(slug: &str) -> BindingValue {
    BindingValue::uri(iri(slug))
}

fn lit(text: &str) -> BindingValue {
    BindingValue::literal(text)
}

/// Two roots: "Tierwohl" with two sub-groups, and "Gewässerschutz".
fn taxonomy() -> SparqlResults {
    SparqlResults::from_bindings(vec![
        row(&[
            ("s", uri("A")),
            ("sType", BindingValue::uri(COLLECTION)),
            ("sLabel", lit("Tierwohl")),
            ("sComment", lit("Tierschutz allgemein")),
            ("subGroup", uri("A1")),
            ("inspectionPoint", uri("P0")),
            ("inspectionPointLabel", lit("Dokumentation")),
        ]),
        row(&[
            ("s", uri("A")),
            ("sType", BindingValue::uri(COLLECTION)),
            ("subGroup", uri("A2")),
        ]),
        row(&[
            ("s", uri("A1")),
            ("sType", BindingValue::uri(COLLECTION)),
            ("sLabel", lit("Rinder")),
            ("superGroup", uri("A")),
            ("inspectionPoint", uri("P1")),
            ("inspectionPointLabel", lit("Auslauf")),
            ("inspectionPointComment", lit("Regelmässiger Auslauf")),
        ]),
        row(&[
            ("s", uri("A2")),
            ("sType", BindingValue::uri(COLLECTION)),
            ("sLabel", lit("Schweine")),
            ("superGroup", uri("A")),
            ("inspectionPoint", uri("P2")),
            ("inspectionPointLabel", lit("Einstreu")),
        ]),
        row(&[
            ("s", uri("B")),
            ("sType", BindingValue::uri(COLLECTION)),
            ("sLabel", lit("Gewässerschutz")),
            ("inspectionPoint", uri("P3")),
            ("inspectionPointLabel", lit("Hofdünger")),
        ]),
        row(&[("s", uri("P1")), ("sType", BindingValue::uri(POINT))]),
    ])
}

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("AGRICHECK_API_KEY") };
    }
}

fn server_for(source: RowSource) -> TestServer {
    let state = AppState::new(source, BASE);
    TestServer::new(create_router(state)).unwrap()
}

/// Test server over the sample taxonomy, authentication disabled.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("AGRICHECK_API_KEY") };
    (
        server_for(RowSource::snapshot(taxonomy())),
        TestGuard { _guard: guard },
    )
}

/// Test server whose endpoint refuses connections.
fn create_unreachable_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("AGRICHECK_API_KEY") };
    let config = AppConfig {
        endpoint: "http://127.0.0.1:9/query".to_string(),
        timeout_secs: 2,
        ..AppConfig::default()
    };
    (
        server_for(RowSource::endpoint(&config).unwrap()),
        TestGuard { _guard: guard },
    )
}

/// Test server with `AGRICHECK_API_KEY` set.
fn create_auth_test_server(api_key: &str) -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("AGRICHECK_API_KEY", api_key) };
    (
        server_for(RowSource::snapshot(taxonomy())),
        TestGuard { _guard: guard },
    )
}

// =============================================================================
// HEALTH & PAGES
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_selector_page_served() {
    let (server, _guard) = create_test_server();

    let response = server.get("/").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Kontrollpunkte auswählen"));
    assert!(html.contains("/api/tree"));
    assert!(html.contains("/api/compress"));
}

#[tokio::test]
async fn test_checklist_page_renders_sections() {
    let (server, _guard) = create_test_server();

    let response = server.get("/checklist?groups=A,B").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("<span class=\"section-number\">1</span>Tierwohl</h1>"));
    assert!(html.contains("<span class=\"section-number\">1.1</span>Rinder</h2>"));
    assert!(html.contains("<span class=\"section-number\">1.2</span>Schweine</h2>"));
    assert!(html.contains("<span class=\"section-number\">2</span>Gewässerschutz</h1>"));
    assert!(html.contains("<strong>Auslauf</strong> – Regelmässiger Auslauf"));
    assert!(html.contains("/api/checklist.csv?groups=A,B"));
    assert!(html.contains("Drucken"));
}

#[tokio::test]
async fn test_checklist_page_without_groups() {
    let (server, _guard) = create_test_server();

    let response = server.get("/checklist").await;

    response.assert_status_bad_request();
    assert!(response.text().contains(NO_GROUPS_MESSAGE));
}

#[tokio::test]
async fn test_checklist_page_with_empty_groups() {
    let (server, _guard) = create_test_server();

    let response = server.get("/checklist?groups=").await;

    response.assert_status_bad_request();
    assert!(response.text().contains(NO_GROUPS_MESSAGE));
}

// =============================================================================
// TREE & SEARCH
// =============================================================================

#[tokio::test]
async fn test_tree_roots_sorted_by_label() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/tree").await;

    response.assert_status_ok();
    let tree: TreeResponse = response.json();
    assert!(tree.success);
    assert_eq!(tree.collection_count, 4);
    assert_eq!(tree.inspection_point_count, 4);

    let texts: Vec<&str> = tree.roots.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, ["Gewässerschutz", "Tierwohl"]);

    let tierwohl = &tree.roots[1];
    assert_eq!(tierwohl.children.len(), 2);
    assert_eq!(tierwohl.point_count, 3);
}

#[tokio::test]
async fn test_search_by_group_label() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/search").add_query_param("q", "RINDER").await;

    response.assert_status_ok();
    let result: SearchResponse = response.json();
    assert!(result.success);
    assert_eq!(result.hits, vec![id("A1")]);
    assert_eq!(result.trails, vec![vec!["Tierwohl".to_string(), "Rinder".to_string()]]);
    assert!(result.open.contains(&id("A")));
}

#[tokio::test]
async fn test_search_matches_inspection_point_text() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/search").add_query_param("q", "einstreu").await;

    let result: SearchResponse = response.json();
    assert_eq!(result.hits, vec![id("A2")]);
}

#[tokio::test]
async fn test_search_blank_query_matches_nothing() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/search").add_query_param("q", "   ").await;

    response.assert_status_ok();
    let result: SearchResponse = response.json();
    assert!(result.hits.is_empty());
    assert!(result.open.is_empty());
}

#[tokio::test]
async fn test_search_rejects_oversized_query() {
    let (server, _guard) = create_test_server();

    let long = "x".repeat(1000);
    let response = server.get("/api/search").add_query_param("q", &long).await;

    response.assert_status_bad_request();
    let result: SearchResponse = response.json();
    assert!(!result.success);
}

// =============================================================================
// COMPRESS
// =============================================================================

#[tokio::test]
async fn test_compress_drops_covered_descendants() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/compress")
        .json(&json!({ "selected": [iri("A"), iri("A1"), iri("A2"), iri("B")] }))
        .await;

    response.assert_status_ok();
    let result: CompressResponse = response.json();
    assert!(result.success);
    assert_eq!(result.compressed, vec![id("A"), id("B")]);
    assert_eq!(result.groups, "A,B");
    assert_eq!(result.link.as_deref(), Some("/checklist?groups=A,B"));
}

#[tokio::test]
async fn test_compress_keeps_siblings() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/compress")
        .json(&json!({ "selected": [iri("A1"), iri("A2")] }))
        .await;

    let result: CompressResponse = response.json();
    assert_eq!(result.compressed, vec![id("A1"), id("A2")]);
}

#[tokio::test]
async fn test_compress_empty_selection_has_no_link() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/compress")
        .json(&json!({ "selected": [] }))
        .await;

    response.assert_status_ok();
    let result: CompressResponse = response.json();
    assert!(result.compressed.is_empty());
    assert!(result.link.is_none());
}

// =============================================================================
// CHECKLIST API
// =============================================================================

#[tokio::test]
async fn test_checklist_json_numbering() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/checklist?groups=A").await;

    response.assert_status_ok();
    let result: ChecklistResponse = response.json();
    assert!(result.success);
    assert_eq!(result.item_count, 3);

    let checklist = result.checklist.unwrap();
    let numbers: Vec<String> = checklist.sections.iter().map(|s| s.number_label()).collect();
    assert_eq!(numbers, ["1", "1.1", "1.2"]);
    assert_eq!(checklist.sections[0].comment.as_deref(), Some("Tierschutz allgemein"));
}

#[tokio::test]
async fn test_checklist_skips_unknown_groups() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/checklist?groups=Nope,B").await;

    response.assert_status_ok();
    let checklist = response.json::<ChecklistResponse>().checklist.unwrap();
    assert_eq!(checklist.sections.len(), 1);
    // "B" keeps the number of its position in the link.
    assert_eq!(checklist.sections[0].number, vec![2]);
    assert_eq!(checklist.missing, vec![id("Nope")]);
}

#[tokio::test]
async fn test_checklist_json_without_groups() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/checklist").await;

    response.assert_status_bad_request();
    let result: ChecklistResponse = response.json();
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some(NO_GROUPS_MESSAGE));
}

#[tokio::test]
async fn test_checklist_json_too_many_groups_names_reason() {
    let (server, _guard) = create_test_server();
    let groups: Vec<String> = (0..600).map(|i| format!("G{i}")).collect();

    let response = server
        .get(&format!("/api/checklist?groups={}", groups.join(",")))
        .await;

    response.assert_status_bad_request();
    let result: ChecklistResponse = response.json();
    let error = result.error.unwrap();
    assert_ne!(error, NO_GROUPS_MESSAGE);
    assert!(error.starts_with("Ungültige Gruppen"));
    assert!(error.contains("more than 512 groups"));
}

#[tokio::test]
async fn test_checklist_csv_download() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/checklist.csv?groups=B").await;

    response.assert_status_ok();
    let content_type = response.header(axum::http::header::CONTENT_TYPE);
    assert_eq!(content_type.to_str().unwrap(), "text/csv; charset=utf-8");
    let body = response.text();
    assert!(body.starts_with("Abschnitt,Gruppe,Kontrollpunkt"));
    assert!(body.contains("1,Gewässerschutz,Hofdünger,"));
}

// =============================================================================
// UPSTREAM FAILURE
// =============================================================================

#[tokio::test]
async fn test_unreachable_endpoint_is_bad_gateway() {
    let (server, _guard) = create_unreachable_server();

    let response = server.get("/api/tree").await;

    assert_eq!(response.status_code().as_u16(), 502);
    let tree: TreeResponse = response.json();
    assert!(!tree.success);
    assert!(tree.error.is_some());
}

#[tokio::test]
async fn test_unreachable_endpoint_checklist_page() {
    let (server, _guard) = create_unreachable_server();

    let response = server.get("/checklist?groups=A").await;

    assert_eq!(response.status_code().as_u16(), 502);
    assert!(response.text().contains("Fehler beim Laden der Daten"));
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let (server, _guard) = create_auth_test_server("secret-key");

    let response = server.get("/api/tree").await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let (server, _guard) = create_auth_test_server(api_key);

    let response = server
        .get("/api/tree")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let (server, _guard) = create_auth_test_server("correct-key");

    let response = server
        .get("/api/checklist?groups=A")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_auth_pages_and_health_stay_public() {
    let (server, _guard) = create_auth_test_server("secret-key");

    server.get("/health").await.assert_status_ok();
    server.get("/").await.assert_status_ok();
    server.get("/checklist?groups=A").await.assert_status_ok();
}
