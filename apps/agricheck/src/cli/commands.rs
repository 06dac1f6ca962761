//! # CLI Command Implementations

use crate::api::{self, AppState, CHECKLIST_PATH};
use crate::cli::ChecklistFormat;
use crate::config::AppConfig;
use crate::render::{checklist_csv, checklist_html, checklist_text};
use crate::source::RowSource;
use agricheck_core::{
    AgricheckError, NodeId, NodeKind, Selection, TreeNode, breadcrumbs, build_checklist,
    build_tree, encode_groups, hierarchy_query, parse_groups_param, primitives::NO_GROUPS,
    search_tree,
};
use std::path::{Path, PathBuf};

// =============================================================================
// PATH HELPERS
// =============================================================================

/// Resolve an input file, rejecting directories and missing paths.
fn validate_file_path(path: &Path) -> Result<PathBuf, AgricheckError> {
    let canonical = path.canonicalize().map_err(|e| {
        AgricheckError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AgricheckError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output file: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, AgricheckError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        AgricheckError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(AgricheckError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| AgricheckError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Write `content` to `output`, or print it.
fn write_output(output: Option<&Path>, content: &str) -> Result<(), AgricheckError> {
    match output {
        Some(path) => {
            let path = validate_output_path(path)?;
            std::fs::write(&path, content)
                .map_err(|e| AgricheckError::IoError(format!("Write failed: {}", e)))?;
            println!("Written to {}", path.display());
            Ok(())
        }
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), AgricheckError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AgricheckError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

/// Saved results if `--bindings` was given, otherwise the live endpoint.
pub fn make_source(config: &AppConfig, bindings: Option<&Path>) -> Result<RowSource, AgricheckError> {
    match bindings {
        Some(path) => RowSource::from_file(&validate_file_path(path)?),
        None => RowSource::endpoint(config),
    }
}

/// Accept either a full id or a slug under the configured namespace.
fn resolve_id(raw: &str, base_iri: &str) -> NodeId {
    let raw = raw.trim();
    if raw.contains("://") {
        NodeId::new(raw)
    } else {
        let slug = urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned());
        NodeId::new(format!("{}{}", base_iri, slug))
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: &AppConfig,
    bindings: Option<&Path>,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<(), AgricheckError> {
    let source = make_source(config, bindings)?;
    let host = host.unwrap_or(&config.server.host);
    let port = port.unwrap_or(config.server.port);

    println!("Agricheck Checklist Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Source:   {}", source.describe());
    println!("  Language: {}", config.language);
    println!();
    println!("Pages:");
    println!("  GET  /                     - Select groups");
    println!("  GET  /checklist?groups=... - Printable checklist");
    println!();
    println!("API:");
    println!("  GET  /api/tree             - Selector tree");
    println!("  GET  /api/search?q=...     - Search groups");
    println!("  POST /api/compress         - Selection to checklist link");
    println!("  GET  /api/checklist        - Checklist (JSON)");
    println!("  GET  /api/checklist.csv    - Checklist (CSV)");
    println!("  GET  /health               - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, AppState::new(source, config.base_iri.clone())).await
}

// =============================================================================
// TREE COMMAND
// =============================================================================

fn print_tree(node: &TreeNode, depth: usize) {
    println!("{}{} ({})", "  ".repeat(depth), node.text, node.point_count);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

/// Print the collection hierarchy.
pub async fn cmd_tree(
    config: &AppConfig,
    bindings: Option<&Path>,
    json_mode: bool,
) -> Result<(), AgricheckError> {
    let nodes = make_source(config, bindings)?.load().await?;
    let tree = build_tree(&nodes);

    if json_mode {
        return print_json(&tree);
    }

    println!("Inspection Point Groups");
    println!("=======================");
    println!(
        "{} collections, {} inspection points",
        nodes.count_kind(NodeKind::Collection),
        nodes.count_kind(NodeKind::InspectionPoint)
    );
    println!();
    for root in &tree {
        print_tree(root, 0);
    }
    Ok(())
}

// =============================================================================
// SEARCH COMMAND
// =============================================================================

/// Search collections and print each hit with its trail.
pub async fn cmd_search(
    config: &AppConfig,
    bindings: Option<&Path>,
    json_mode: bool,
    query: &str,
) -> Result<(), AgricheckError> {
    let nodes = make_source(config, bindings)?.load().await?;
    let hits = search_tree(&build_tree(&nodes), query);

    if json_mode {
        let output: Vec<serde_json::Value> = hits
            .hits
            .iter()
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "trail": breadcrumbs(id, &nodes),
                })
            })
            .collect();
        return print_json(&output);
    }

    if hits.is_empty() {
        println!("No groups match {:?}", query);
        return Ok(());
    }

    println!("{} group(s) match {:?}:", hits.hits.len(), query);
    for id in &hits.hits {
        println!("  {}", breadcrumbs(id, &nodes).join(" > "));
        println!("    {}", id);
    }
    Ok(())
}

// =============================================================================
// COMPRESS COMMAND
// =============================================================================

/// Compress a selection and print the checklist link.
pub async fn cmd_compress(
    config: &AppConfig,
    bindings: Option<&Path>,
    json_mode: bool,
    select: &[String],
) -> Result<(), AgricheckError> {
    let ids = select
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| resolve_id(s, &config.base_iri));
    let selection = Selection::from_ids(ids)?;
    if selection.is_empty() {
        return Err(AgricheckError::InvalidGroups(NO_GROUPS.to_string()));
    }

    let nodes = make_source(config, bindings)?.load().await?;
    for id in selection.ids().iter().filter(|id| !nodes.contains(id)) {
        tracing::warn!(id = %id, "Selected id is not in the snapshot");
    }

    let compressed = selection.compressed(&nodes);
    let groups = compressed.to_groups_param();
    let link = selection.checklist_link(&nodes, CHECKLIST_PATH);

    if json_mode {
        return print_json(&serde_json::json!({
            "selected": selection.len(),
            "compressed": compressed.ids(),
            "groups": groups,
            "link": link,
        }));
    }

    println!("Selected:   {}", selection.len());
    println!("Compressed: {}", compressed.len());
    for id in compressed.ids() {
        let label = nodes.get(id).map_or_else(|| id.slug(), |n| n.display_label());
        println!("  {}  {}", id.slug(), label);
    }
    println!();
    println!("groups={}", groups);
    if let Some(link) = link {
        println!("Link: {}", link);
    }
    Ok(())
}

// =============================================================================
// CHECKLIST COMMAND
// =============================================================================

/// Build a checklist and write it in the requested format.
pub async fn cmd_checklist(
    config: &AppConfig,
    bindings: Option<&Path>,
    groups: &str,
    format: ChecklistFormat,
    output: Option<&Path>,
) -> Result<(), AgricheckError> {
    let ids = parse_groups_param(Some(groups), &config.base_iri)?;
    let nodes = make_source(config, bindings)?.load().await?;
    let checklist = build_checklist(&ids, &nodes);

    for id in &checklist.missing {
        tracing::warn!(id = %id, "Group not found, skipped");
    }

    let content = match format {
        ChecklistFormat::Text => checklist_text(&checklist),
        ChecklistFormat::Html => {
            let today = chrono::Local::now().date_naive();
            checklist_html(&checklist, today, &encode_groups(&ids))
        }
        ChecklistFormat::Json => serde_json::to_string_pretty(&checklist)
            .map_err(|e| AgricheckError::SerializationError(e.to_string()))?,
        ChecklistFormat::Csv => checklist_csv(&checklist)?,
    };

    write_output(output, &content)
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// Print the query text for the configured language.
pub fn cmd_query(config: &AppConfig) -> Result<(), AgricheckError> {
    println!("{}", hierarchy_query(&config.language)?);
    Ok(())
}

// =============================================================================
// FETCH COMMAND
// =============================================================================

/// Save the raw results document.
pub async fn cmd_fetch(
    config: &AppConfig,
    bindings: Option<&Path>,
    output: &Path,
) -> Result<(), AgricheckError> {
    let source = make_source(config, bindings)?;
    let results = source.fetch_results().await?;
    let json = results.to_json_pretty()?;

    let path = validate_output_path(output)?;
    std::fs::write(&path, json)
        .map_err(|e| AgricheckError::IoError(format!("Write failed: {}", e)))?;

    println!(
        "Saved {} rows from {} to {}",
        results.row_count(),
        source.describe(),
        path.display()
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
