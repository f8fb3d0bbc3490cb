//! Taskboard Server Binary
//!
//! Reads configuration from the standard locations (see
//! `taskboard_core::config`) and serves the board API.

use std::sync::Arc;

use taskboard_core::BoardConfig;
use taskboard_server::{serve, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let project_root = std::env::current_dir().ok();
    let config = BoardConfig::load_standard(project_root.as_deref())?;
    let state = Arc::new(AppState::from_config(&config)?);

    serve(&config.server.address, state).await
}
