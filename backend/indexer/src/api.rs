//! Axum REST API handlers over the event log and the project mirror.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;

use crate::db;
use crate::errors::IndexerError;
use crate::events::{ContributionRecord, EventRecord, ProjectRecord};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventsResponse {
    pub project_id: i64,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct ProjectsResponse {
    pub count: usize,
    pub projects: Vec<ProjectRecord>,
}

#[derive(Serialize)]
pub struct ContributionsResponse {
    pub project_id: i64,
    pub count: usize,
    pub contributions: Vec<ContributionRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

fn internal(e: IndexerError) -> Response {
    error!("API query failed: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn project_not_found(project_id: i64) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("project {project_id} not found"),
    )
}

/// Sub-resources of an unknown project answer 404 rather than an empty list.
async fn ensure_project(pool: &SqlitePool, project_id: i64) -> Result<(), Response> {
    match db::get_project(pool, project_id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(project_not_found(project_id)),
        Err(e) => Err(internal(e)),
    }
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
///
/// Returns all indexed events across all projects.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_all_events(&state.pool).await {
        Ok(events) => Json(AllEventsResponse {
            count: events.len(),
            events,
        })
        .into_response(),
        Err(e) => internal(e),
    }
}

/// `GET /projects`
pub async fn list_projects(State(state): State<Arc<ApiState>>) -> Response {
    match db::list_projects(&state.pool).await {
        Ok(projects) => Json(ProjectsResponse {
            count: projects.len(),
            projects,
        })
        .into_response(),
        Err(e) => internal(e),
    }
}

/// `GET /projects/:id`
pub async fn get_project(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<i64>,
) -> Response {
    match db::get_project(&state.pool, project_id).await {
        Ok(Some(project)) => Json(project).into_response(),
        Ok(None) => project_not_found(project_id),
        Err(e) => internal(e),
    }
}

/// `GET /projects/:id/contributions`
pub async fn get_project_contributions(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<i64>,
) -> Response {
    if let Err(resp) = ensure_project(&state.pool, project_id).await {
        return resp;
    }
    match db::get_contributions(&state.pool, project_id).await {
        Ok(contributions) => Json(ContributionsResponse {
            project_id,
            count: contributions.len(),
            contributions,
        })
        .into_response(),
        Err(e) => internal(e),
    }
}

/// `GET /projects/:id/events`
///
/// Returns all indexed events for the given project identifier.
pub async fn get_project_events(
    State(state): State<Arc<ApiState>>,
    Path(project_id): Path<i64>,
) -> Response {
    if let Err(resp) = ensure_project(&state.pool, project_id).await {
        return resp;
    }
    match db::get_events_for_project(&state.pool, project_id).await {
        Ok(events) => Json(EventsResponse {
            project_id,
            count: events.len(),
            events,
        })
        .into_response(),
        Err(e) => internal(e),
    }
}
