//! # Agricheck - Inspection Checklist Generator
//!
//! Builds printable inspection checklists from the agricultural control
//! point taxonomy published as linked data.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                  apps/agricheck (THE BINARY)                  │
//! │                                                               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │  SPARQL client   │   │
//! │  │  (clap)     │    │   (axum)    │    │    (reqwest)     │   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘   │
//! │         │                  │                    │             │
//! │         └──────────────────┼────────────────────┘             │
//! │                            ▼                                  │
//! │                   ┌─────────────────┐                         │
//! │                   │ agricheck-core  │                         │
//! │                   │   (THE LOGIC)   │                         │
//! │                   └─────────────────┘                         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! agricheck server --host 0.0.0.0 --port 8080
//!
//! # Work offline from a saved snapshot
//! agricheck fetch -o snapshot.json
//! agricheck --bindings snapshot.json tree
//! agricheck --bindings snapshot.json checklist -g Tierwohl,Gewaesserschutz -t html -o liste.html
//! ```

use agricheck::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // AGRICHECK_LOG_FORMAT=json switches to machine-parseable output.
    let log_format =
        std::env::var("AGRICHECK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "agricheck=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    eprintln!(
        r#"
  ╔═══════════════════════════════════════╗
  ║   AGRICHECK  Kontrollcheckliste v{:<5}║
  ╚═══════════════════════════════════════╝
"#,
        env!("CARGO_PKG_VERSION")
    );
}
