use axum::{
    Json,
    extract::{Query, State},
};
use logoforge_db::models::{LogoParams, LogoTask, TaskResult, TaskStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 50))]
    pub company_name: String,
    #[validate(length(max = 30))]
    #[serde(default)]
    pub industry: String,
    #[validate(length(min = 1, max = 5))]
    pub styles: Vec<String>,
    #[validate(length(min = 1, max = 3))]
    pub colors: Vec<String>,
    #[validate(length(max = 200))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub task_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: u8,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub logos: Vec<String>,
    pub company_name: String,
    pub industry: String,
    pub styles: Vec<String>,
    pub colors: Vec<String>,
    pub description: Option<String>,
    pub create_time: String,
    pub message: String,
}

fn status_message(task: &LogoTask) -> String {
    match (&task.status, &task.result) {
        (TaskStatus::Pending, _) => "Task is queued".to_string(),
        (TaskStatus::Processing, _) => "Logos are being generated".to_string(),
        (TaskStatus::Success, _) => "Logo generation complete".to_string(),
        (TaskStatus::Fail, Some(TaskResult::Error { message })) => message.clone(),
        (TaskStatus::Fail, _) => "Logo generation failed".to_string(),
    }
}

pub async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    body.validate()?;

    let params = LogoParams {
        company_name: body.company_name,
        industry: body.industry,
        styles: body.styles,
        colors: body.colors,
        description: body.description.filter(|d| !d.is_empty()),
    };
    let task = state.logos.create(&auth.owner_id, params).await?;

    Ok(Json(GenerateResponse {
        task_id: task.id,
        status: task.status,
        message: "Logo generation task submitted".to_string(),
    }))
}

pub async fn status(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TaskQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let task = state.logos.status(&auth.owner_id, &query.task_id).await?;

    Ok(Json(StatusResponse {
        message: status_message(&task),
        progress: task.status.progress_hint(),
        status: task.status,
        task_id: task.id,
    }))
}

pub async fn result(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TaskQuery>,
) -> Result<Json<ResultResponse>, ApiError> {
    let task = state.logos.result(&auth.owner_id, &query.task_id).await?;

    let message = status_message(&task);
    let logos = match (task.status, task.result) {
        (TaskStatus::Success, Some(TaskResult::Assets { images, .. })) => images,
        _ => Vec::new(),
    };

    Ok(Json(ResultResponse {
        task_id: task.id,
        status: task.status,
        logos,
        company_name: task.params.company_name,
        industry: task.params.industry,
        styles: task.params.styles,
        colors: task.params.colors,
        description: task.params.description,
        create_time: task.created_at.to_rfc3339(),
        message,
    }))
}
