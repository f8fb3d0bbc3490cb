//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use taskboard_core::{
    BoardService, BoardStore, Container, ContainerId, ItemDraft, ItemId, ItemPatch, NewItem,
};

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

fn container_id(raw: &str) -> ApiResult<ContainerId> {
    raw.parse()
        .map_err(|_| ApiError::MalformedId(raw.to_string()))
}

fn item_id(raw: &str) -> ApiResult<ItemId> {
    ItemId::parse(raw).map_err(|_| ApiError::MalformedId(raw.to_string()))
}

/// Run a service call on the blocking pool. The SQLite store holds a
/// synchronous connection behind a mutex.
async fn run<T, F>(state: Arc<AppState>, call: F) -> ApiResult<T>
where
    F: FnOnce(&BoardService<Box<dyn BoardStore>>) -> taskboard_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || call(&state.service)).await?;
    Ok(result?)
}

// ==================== Health ====================

/// Liveness response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: taskboard_core::version(),
    })
}

// ==================== Projects ====================

/// List projects, newest first
pub async fn list_projects(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Container>>> {
    Ok(Json(run(state, |service| service.list_containers()).await?))
}

/// Request to create a project
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub title: String,
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Container>)> {
    let Json(request) = body?;
    let container = run(state, move |service| service.create_container(&request.title)).await?;
    Ok((StatusCode::CREATED, Json(container)))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Container>> {
    let id = container_id(&id)?;
    Ok(Json(run(state, move |service| service.get_container(id)).await?))
}

/// Bulk update of a project. Omitted fields are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct ReplaceProjectRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tasks: Option<Vec<ItemDraft>>,
}

pub async fn replace_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<ReplaceProjectRequest>, JsonRejection>,
) -> ApiResult<Json<Container>> {
    let id = container_id(&id)?;
    let Json(request) = body?;
    let container = run(state, move |service| {
        service.replace_container(id, request.title.as_deref(), request.tasks)
    })
    .await?;
    Ok(Json(container))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = container_id(&id)?;
    let removed = run(state, move |service| service.delete_container(id)).await?;
    Ok(Json(json!({
        "success": true,
        "project": removed,
    })))
}

/// Renumber a project's tasks to `0..n`
pub async fn reindex_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Container>> {
    let id = container_id(&id)?;
    Ok(Json(run(state, move |service| service.reindex(id)).await?))
}

// ==================== Tasks ====================

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<NewItem>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = container_id(&id)?;
    let Json(request) = body?;
    let change = run(state, move |service| service.add_item(id, request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "task": change.item,
            "project": change.container,
        })),
    ))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path((id, task_id)): Path<(String, String)>,
    body: Result<Json<ItemPatch>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let (id, task_id) = (container_id(&id)?, item_id(&task_id)?);
    let Json(patch) = body?;
    let change = run(state, move |service| service.update_item(id, task_id, patch)).await?;
    Ok(Json(json!({
        "success": true,
        "task": change.item,
        "project": change.container,
    })))
}

/// Remove a task. Removing a task that is already gone still succeeds.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path((id, task_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let (id, task_id) = (container_id(&id)?, item_id(&task_id)?);
    let container = run(state, move |service| service.remove_item(id, task_id)).await?;
    Ok(Json(json!({
        "success": true,
        "project": container,
    })))
}

/// Request to move a task
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub source_project_id: ContainerId,
    pub destination_project_id: ContainerId,
    #[serde(default)]
    pub position: usize,
}

pub async fn move_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let task_id = item_id(&task_id)?;
    let Json(request) = body?;
    let outcome = run(state, move |service| {
        service.move_item(
            task_id,
            request.source_project_id,
            request.destination_project_id,
            request.position,
        )
    })
    .await?;
    Ok(Json(json!({
        "success": true,
        "task": outcome.item,
        "sourceProject": outcome.source,
        "destinationProject": outcome.destination,
    })))
}
