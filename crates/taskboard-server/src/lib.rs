//! Taskboard Server - Project board API
//!
//! HTTP surface over [`BoardService`]: projects, their ordered tasks, and
//! moves between projects.

pub mod error;
pub mod http;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use taskboard_core::{
    BoardConfig, BoardService, BoardStore, ItemConfig, MemoryStore, SqliteStore, StorageBackend,
};

pub use error::ApiError;

/// Shared application state
pub struct AppState {
    pub service: BoardService<Box<dyn BoardStore>>,
}

impl AppState {
    /// In-memory state with default item settings
    pub fn new() -> Self {
        Self::with_store(Box::new(MemoryStore::new()), &ItemConfig::default())
    }

    pub fn with_store(store: Box<dyn BoardStore>, items: &ItemConfig) -> Self {
        Self {
            service: BoardService::with_config(store, items),
        }
    }

    /// Open the store the configuration names
    pub fn from_config(config: &BoardConfig) -> taskboard_core::Result<Self> {
        let store: Box<dyn BoardStore> = match config.storage.backend {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory storage; boards are lost on restart");
                Box::new(MemoryStore::new())
            }
            StorageBackend::Sqlite => {
                let path = &config.storage.database_path;
                tracing::info!("Opening SQLite store at {}", path.display());
                Box::new(SqliteStore::open(path)?)
            }
        };
        Ok(Self::with_store(store, &config.items))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Project endpoints
        .route("/projects", get(http::list_projects).post(http::create_project))
        .route(
            "/projects/{id}",
            get(http::get_project)
                .put(http::replace_project)
                .delete(http::delete_project),
        )
        .route("/projects/{id}/reindex", post(http::reindex_project))
        // Task endpoints
        .route("/projects/{id}/tasks", post(http::create_task))
        .route(
            "/projects/{id}/tasks/{task_id}",
            put(http::update_task).delete(http::delete_task),
        )
        .route("/tasks/{task_id}/move", put(http::move_task))
        // System endpoints
        .route("/health", get(http::health))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Taskboard server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
