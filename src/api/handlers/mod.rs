use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_core::models::*;
use taskboard_core::TaskError;

use crate::board::Board;
use crate::persist::PersistError;

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Body of the set-status endpoints. Kept as a string so an unknown value is
/// a 400 with a readable message rather than a deserialization rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInput {
    pub status: String,
}

// ============================================================
// Error Handling
// ============================================================

fn task_error(e: TaskError) -> (StatusCode, String) {
    let status = match &e {
        TaskError::NotFound(_) | TaskError::InvalidReference(_) => StatusCode::NOT_FOUND,
        // every refused schedule is a conflict, whatever the reason
        TaskError::ScheduleConflict { .. }
        | TaskError::InvalidSchedule(_)
        | TaskError::DuplicateId(_) => StatusCode::CONFLICT,
    };
    tracing::warn!("Refused: {}", e);
    (status, e.to_string())
}

/// The change is applied in memory but could not be saved. Details are logged,
/// not returned.
fn persist_error(e: PersistError) -> (StatusCode, String) {
    tracing::error!("Persistence error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn not_found(kind: ItemKind) -> (StatusCode, String) {
    let name = match kind {
        ItemKind::Task => "Task",
        ItemKind::Epic => "Epic",
        ItemKind::Subtask => "Subtask",
    };
    (StatusCode::NOT_FOUND, format!("{name} not found"))
}

fn parse_status(input: &StatusInput) -> ApiResult<Status> {
    Status::from_str(input.status.trim()).ok_or((
        StatusCode::BAD_REQUEST,
        "Unknown status. Use NEW | IN_PROGRESS | DONE".to_string(),
    ))
}

/// Whether the item ended up with the schedule the update asked for.
fn schedule_applied(
    requested: Option<ScheduleInput>,
    start_time: Option<chrono::NaiveDateTime>,
    duration: Option<chrono::Duration>,
) -> bool {
    requested.map_or(true, |s| s.start_time == start_time && s.duration == duration)
}

/// 200 when the update applied in full, 409 when the schedule was refused.
/// The body is always the item as stored, text edits included.
fn update_status(applied: bool) -> StatusCode {
    if applied {
        StatusCode::OK
    } else {
        tracing::warn!("Schedule refused on update, previous schedule kept");
        StatusCode::CONFLICT
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Tasks
// ============================================================

pub async fn list_tasks(State(board): State<Board>) -> Json<Vec<Task>> {
    Json(board.read(|m| m.list_tasks()))
}

pub async fn create_task(
    State(board): State<Board>,
    Json(input): Json<CreateTaskInput>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    board
        .write(|m| {
            let id = m.create_task(input)?;
            m.find_task(id).ok_or(TaskError::NotFound(id))
        })
        .await
        .map_err(persist_error)?
        .map(|task| (StatusCode::CREATED, Json(task)))
        .map_err(task_error)
}

pub async fn delete_all_tasks(State(board): State<Board>) -> ApiResult<StatusCode> {
    board
        .write(|m| m.delete_all_tasks())
        .await
        .map_err(persist_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_task(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Task>> {
    board
        .write(|m| m.get_task(id))
        .await
        .map_err(persist_error)?
        .map(Json)
        .ok_or_else(|| not_found(ItemKind::Task))
}

pub async fn update_task(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
    Json(input): Json<UpdateTaskInput>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let requested = input.schedule;
    let task = board
        .write(|m| {
            if m.update_task(id, input) {
                m.find_task(id)
            } else {
                None
            }
        })
        .await
        .map_err(persist_error)?
        .ok_or_else(|| not_found(ItemKind::Task))?;

    let applied = schedule_applied(requested, task.start_time, task.duration);
    Ok((update_status(applied), Json(task)))
}

pub async fn delete_task(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
) -> ApiResult<StatusCode> {
    match board.write(|m| m.delete_task(id)).await.map_err(persist_error)? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(not_found(ItemKind::Task)),
    }
}

pub async fn set_task_status(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Json<Task>> {
    let status = parse_status(&input)?;
    board
        .write(|m| {
            m.set_task_status(id, status)?;
            m.find_task(id).ok_or(TaskError::NotFound(id))
        })
        .await
        .map_err(persist_error)?
        .map(Json)
        .map_err(task_error)
}

// ============================================================
// Subtasks
// ============================================================

pub async fn list_subtasks(State(board): State<Board>) -> Json<Vec<Subtask>> {
    Json(board.read(|m| m.list_subtasks()))
}

pub async fn create_subtask(
    State(board): State<Board>,
    Json(input): Json<CreateSubtaskInput>,
) -> ApiResult<(StatusCode, Json<Subtask>)> {
    board
        .write(|m| {
            let id = m.create_subtask(input)?;
            m.find_subtask(id).ok_or(TaskError::NotFound(id))
        })
        .await
        .map_err(persist_error)?
        .map(|subtask| (StatusCode::CREATED, Json(subtask)))
        .map_err(task_error)
}

pub async fn delete_all_subtasks(State(board): State<Board>) -> ApiResult<StatusCode> {
    board
        .write(|m| m.delete_all_subtasks())
        .await
        .map_err(persist_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_subtask(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Subtask>> {
    board
        .write(|m| m.get_subtask(id))
        .await
        .map_err(persist_error)?
        .map(Json)
        .ok_or_else(|| not_found(ItemKind::Subtask))
}

pub async fn update_subtask(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
    Json(input): Json<UpdateTaskInput>,
) -> ApiResult<(StatusCode, Json<Subtask>)> {
    let requested = input.schedule;
    let subtask = board
        .write(|m| {
            if m.update_subtask(id, input) {
                m.find_subtask(id)
            } else {
                None
            }
        })
        .await
        .map_err(persist_error)?
        .ok_or_else(|| not_found(ItemKind::Subtask))?;

    let applied = schedule_applied(requested, subtask.start_time, subtask.duration);
    Ok((update_status(applied), Json(subtask)))
}

pub async fn delete_subtask(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
) -> ApiResult<StatusCode> {
    match board
        .write(|m| m.delete_subtask(id))
        .await
        .map_err(persist_error)?
    {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(not_found(ItemKind::Subtask)),
    }
}

pub async fn set_subtask_status(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Json<Subtask>> {
    let status = parse_status(&input)?;
    board
        .write(|m| {
            m.set_subtask_status(id, status)?;
            m.find_subtask(id).ok_or(TaskError::NotFound(id))
        })
        .await
        .map_err(persist_error)?
        .map(Json)
        .map_err(task_error)
}

// ============================================================
// Epics
// ============================================================

pub async fn list_epics(State(board): State<Board>) -> Json<Vec<Epic>> {
    Json(board.read(|m| m.list_epics()))
}

pub async fn create_epic(
    State(board): State<Board>,
    Json(input): Json<CreateEpicInput>,
) -> ApiResult<(StatusCode, Json<Epic>)> {
    board
        .write(|m| {
            let id = m.create_epic(input);
            m.find_epic(id)
        })
        .await
        .map_err(persist_error)?
        .map(|epic| (StatusCode::CREATED, Json(epic)))
        .ok_or_else(|| not_found(ItemKind::Epic))
}

pub async fn delete_all_epics(State(board): State<Board>) -> ApiResult<StatusCode> {
    board
        .write(|m| m.delete_all_epics())
        .await
        .map_err(persist_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_epic(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Epic>> {
    board
        .write(|m| m.get_epic(id))
        .await
        .map_err(persist_error)?
        .map(Json)
        .ok_or_else(|| not_found(ItemKind::Epic))
}

pub async fn update_epic(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
    Json(input): Json<UpdateEpicInput>,
) -> ApiResult<Json<Epic>> {
    board
        .write(|m| {
            if m.update_epic(id, input) {
                m.find_epic(id)
            } else {
                None
            }
        })
        .await
        .map_err(persist_error)?
        .map(Json)
        .ok_or_else(|| not_found(ItemKind::Epic))
}

pub async fn delete_epic(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
) -> ApiResult<StatusCode> {
    match board.write(|m| m.delete_epic(id)).await.map_err(persist_error)? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(not_found(ItemKind::Epic)),
    }
}

pub async fn list_epic_subtasks(
    State(board): State<Board>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Vec<Subtask>>> {
    board
        .read(|m| m.epic_subtasks(id))
        .map(Json)
        .map_err(|_| not_found(ItemKind::Epic))
}

// ============================================================
// Views
// ============================================================

pub async fn history(State(board): State<Board>) -> Json<Vec<Item>> {
    Json(board.read(|m| m.history()))
}

pub async fn prioritized(State(board): State<Board>) -> Json<Vec<Item>> {
    Json(board.read(|m| m.prioritized()))
}
