use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use trajview_api::dir::TrajectoryDir;
use trajview_api::{FilesResponse, ModelsResponse, TrajectoryQuery, TrajectoryStore};

use crate::error::ApiErr;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// GET /api/files: every trajectory filename, sorted.
pub async fn list_files(State(store): State<TrajectoryDir>) -> Result<Json<FilesResponse>, ApiErr> {
    let files = store.list_files().await?;
    Ok(Json(FilesResponse { files }))
}

/// GET /api/models: filenames grouped by model.
pub async fn list_models(
    State(store): State<TrajectoryDir>,
) -> Result<Json<ModelsResponse>, ApiErr> {
    let models = store.catalog().await?;
    Ok(Json(ModelsResponse { models }))
}

// ---------------------------------------------------------------------------
// Trajectory bodies
// ---------------------------------------------------------------------------

/// GET /api/trajectory/{id}
pub async fn get_trajectory(
    State(store): State<TrajectoryDir>,
    Path(id): Path<String>,
) -> Result<Response, ApiErr> {
    serve_trajectory(&store, Some(id.as_str())).await
}

/// GET /api/trajectory?id=..
pub async fn get_trajectory_query(
    State(store): State<TrajectoryDir>,
    Query(query): Query<TrajectoryQuery>,
) -> Result<Response, ApiErr> {
    serve_trajectory(&store, query.id()).await
}

/// POST /api/trajectory: legacy form taking `{"id": ..}` in the body.
pub async fn post_trajectory(
    State(store): State<TrajectoryDir>,
    Json(query): Json<TrajectoryQuery>,
) -> Result<Response, ApiErr> {
    serve_trajectory(&store, query.id()).await
}

async fn serve_trajectory(store: &TrajectoryDir, id: Option<&str>) -> Result<Response, ApiErr> {
    let id = id.ok_or_else(|| ApiErr::bad_request("missing trajectory id"))?;
    let body = store.fetch(id).await?;
    tracing::debug!("serving {id} ({} bytes)", body.len());
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}
