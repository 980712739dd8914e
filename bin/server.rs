// Finance Dashboard - Web Server
// REST API over one in-memory session ledger

use anyhow::{Context, Result};
use finance_dashboard::api::{build_router, AppState};
use finance_dashboard::{Config, GeminiClient, GenerativeModel, Ledger};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    println!("🌐 Finance Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = match Config::load_default() {
        Ok(Some(config)) => {
            println!("✓ Config loaded");
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            warn!("Failed to load config, using defaults: {:#}", e);
            Config::default()
        }
    };

    // The ledger works without a model; only import and advice need one
    let model: Option<Arc<dyn GenerativeModel>> = match GeminiClient::from_config(&config.ai) {
        Ok(client) => {
            println!("✓ AI model: {}", config.ai.model);
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("AI features disabled: {:#}", e);
            None
        }
    };

    let state = AppState::new(Ledger::new(), model, &config.display);
    let app = build_router(state);

    let addr = config.server.bind.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);
    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/summary", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
