mod handlers;

pub use handlers::StatusInput;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::board::Board;

pub fn create_router(board: Board) -> Router {
    let api = Router::new()
        // Tasks
        .route(
            "/tasks",
            get(handlers::list_tasks)
                .post(handlers::create_task)
                .delete(handlers::delete_all_tasks),
        )
        .route(
            "/tasks/{id}",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/tasks/{id}/status", post(handlers::set_task_status))
        // Subtasks
        .route(
            "/subtasks",
            get(handlers::list_subtasks)
                .post(handlers::create_subtask)
                .delete(handlers::delete_all_subtasks),
        )
        .route(
            "/subtasks/{id}",
            get(handlers::get_subtask)
                .put(handlers::update_subtask)
                .delete(handlers::delete_subtask),
        )
        .route("/subtasks/{id}/status", post(handlers::set_subtask_status))
        // Epics
        .route(
            "/epics",
            get(handlers::list_epics)
                .post(handlers::create_epic)
                .delete(handlers::delete_all_epics),
        )
        .route(
            "/epics/{id}",
            get(handlers::get_epic)
                .put(handlers::update_epic)
                .delete(handlers::delete_epic),
        )
        .route("/epics/{id}/subtasks", get(handlers::list_epic_subtasks))
        // Views
        .route("/history", get(handlers::history))
        .route("/prioritized", get(handlers::prioritized))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(board)
}
