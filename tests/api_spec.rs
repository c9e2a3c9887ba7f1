use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use taskboard::api::{create_router, StatusInput};
use taskboard::Board;
use taskboard_core::models::*;
use taskboard_core::ManagerConfig;

fn setup() -> TestServer {
    let board = Board::in_memory(ManagerConfig::for_year(2026)).expect("Failed to create board");
    let app = create_router(board);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_task(server: &TestServer, name: &str, start: Option<&str>, minutes: Option<i64>) -> Task {
    server
        .post("/api/v1/tasks")
        .json(&json!({
            "name": name,
            "start_time": start,
            "duration": minutes,
        }))
        .await
        .json::<Task>()
}

async fn create_epic(server: &TestServer, name: &str) -> Epic {
    server
        .post("/api/v1/epics")
        .json(&CreateEpicInput {
            name: name.to_string(),
            description: String::new(),
        })
        .await
        .json::<Epic>()
}

async fn create_subtask(server: &TestServer, epic_id: TaskId, name: &str, start: Option<&str>, minutes: Option<i64>) -> Subtask {
    server
        .post("/api/v1/subtasks")
        .json(&json!({
            "epic_id": epic_id,
            "name": name,
            "start_time": start,
            "duration": minutes,
        }))
        .await
        .json::<Subtask>()
}

mod health {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn router_answers_a_single_request() {
        let board = Board::in_memory(ManagerConfig::for_year(2026)).unwrap();
        let app = create_router(board);

        let response = app
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "status": "ok" }));
    }
}

mod tasks {
    use super::*;

    #[tokio::test]
    async fn create_returns_201_with_the_task() {
        let server = setup();

        let response = server
            .post("/api/v1/tasks")
            .json(&json!({ "name": "Report", "start_time": "2026-03-10T10:00:00", "duration": 30 }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let task: Task = response.json();
        assert_eq!(task.name, "Report");
        assert_eq!(task.status, Status::New);
        assert_eq!(task.duration, Some(chrono::Duration::minutes(30)));
    }

    #[tokio::test]
    async fn overlapping_create_is_409() {
        let server = setup();
        create_task(&server, "A", Some("2026-03-10T10:00:00"), Some(30)).await;

        let response = server
            .post("/api/v1/tasks")
            .json(&json!({ "name": "B", "start_time": "2026-03-10T10:15:00", "duration": 30 }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn out_of_year_create_is_409() {
        let server = setup();

        let response = server
            .post("/api/v1/tasks")
            .json(&json!({ "name": "Late", "start_time": "2027-01-01T00:00:00", "duration": 15 }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn negative_duration_create_is_409() {
        let server = setup();

        server
            .post("/api/v1/tasks")
            .json(&json!({ "name": "Backwards", "start_time": "2026-03-10T10:00:00", "duration": -30 }))
            .await
            .assert_status(StatusCode::CONFLICT);

        let epic = create_epic(&server, "Move").await;
        server
            .post("/api/v1/subtasks")
            .json(&json!({ "epic_id": epic.id, "name": "Pack", "start_time": "2026-03-10T10:00:00", "duration": -15 }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn huge_duration_is_rejected_without_creating() {
        let server = setup();

        let response = server
            .post("/api/v1/tasks")
            .json(&json!({ "name": "Forever", "start_time": "2026-03-10T10:00:00", "duration": 99_999_999_999_999_999_i64 }))
            .await;

        assert!(response.status_code().is_client_error());
        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert!(tasks.is_empty());

        // still serving, and the slot is untouched
        server
            .post("/api/v1/tasks")
            .json(&json!({ "name": "Next", "start_time": "2026-03-10T10:00:00", "duration": 15 }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn unknown_id_is_404() {
        let server = setup();

        server.get("/api/v1/tasks/42").await.assert_status_not_found();
        server.delete("/api/v1/tasks/42").await.assert_status_not_found();
        server
            .put("/api/v1/tasks/42")
            .json(&UpdateTaskInput::default())
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn update_changes_name_and_schedule() {
        let server = setup();
        let task = create_task(&server, "Draft", Some("2026-03-10T10:00:00"), Some(30)).await;

        let response = server
            .put(&format!("/api/v1/tasks/{}", task.id))
            .json(&json!({
                "name": "Final",
                "schedule": { "start_time": "2026-03-10T11:00:00", "duration": 15 }
            }))
            .await;

        response.assert_status_ok();
        let updated: Task = response.json();
        assert_eq!(updated.name, "Final");
        assert_eq!(updated.start_time, Some("2026-03-10T11:00:00".parse().unwrap()));

        // the old slot is free again
        create_task(&server, "Other", Some("2026-03-10T10:00:00"), Some(30))
            .await;
        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn conflicting_reschedule_is_409_and_keeps_old_schedule() {
        let server = setup();
        let a = create_task(&server, "A", Some("2026-03-10T10:00:00"), Some(60)).await;
        let b = create_task(&server, "B", Some("2026-03-10T12:00:00"), Some(30)).await;

        let response = server
            .put(&format!("/api/v1/tasks/{}", b.id))
            .json(&json!({
                "name": "B renamed",
                "schedule": { "start_time": "2026-03-10T10:30:00", "duration": 30 }
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        // the body is the item as stored: text edit applied, schedule kept
        let body: Task = response.json();
        assert_eq!(body.name, "B renamed");
        assert_eq!(body.start_time, b.start_time);
        assert_eq!(body.duration, b.duration);

        let b_now: Task = server.get(&format!("/api/v1/tasks/{}", b.id)).await.json();
        assert_eq!(b_now.name, "B renamed");
        assert_eq!(b_now.start_time, b.start_time);
        let a_now: Task = server.get(&format!("/api/v1/tasks/{}", a.id)).await.json();
        assert_eq!(a_now.start_time, a.start_time);
    }

    #[tokio::test]
    async fn set_status_accepts_known_values_only() {
        let server = setup();
        let task = create_task(&server, "A", None, None).await;

        let response = server
            .post(&format!("/api/v1/tasks/{}/status", task.id))
            .json(&StatusInput {
                status: "IN_PROGRESS".into(),
            })
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Task>().status, Status::InProgress);

        server
            .post(&format!("/api/v1/tasks/{}/status", task.id))
            .json(&StatusInput {
                status: "FINISHED".into(),
            })
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_all_empties_the_list() {
        let server = setup();
        create_task(&server, "A", None, None).await;
        create_task(&server, "B", None, None).await;

        server
            .delete("/api/v1/tasks")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert!(tasks.is_empty());
    }
}

mod epics {
    use super::*;

    #[tokio::test]
    async fn subtask_against_unknown_epic_is_404() {
        let server = setup();

        let response = server
            .post("/api/v1/subtasks")
            .json(&json!({ "epic_id": 99, "name": "Orphan" }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn epic_rolls_up_subtask_status_and_time() {
        let server = setup();
        let epic = create_epic(&server, "Move").await;
        let first = create_subtask(&server, epic.id, "Pack", Some("2026-03-10T10:00:00"), Some(30)).await;
        create_subtask(&server, epic.id, "Drive", Some("2026-03-10T12:00:00"), Some(60)).await;

        server
            .post(&format!("/api/v1/subtasks/{}/status", first.id))
            .json(&StatusInput {
                status: "DONE".into(),
            })
            .await
            .assert_status_ok();

        let epic: Epic = server.get(&format!("/api/v1/epics/{}", epic.id)).await.json();
        assert_eq!(epic.status(), Status::InProgress);
        assert_eq!(epic.start_time(), Some("2026-03-10T10:00:00".parse().unwrap()));
        assert_eq!(epic.duration(), Some(chrono::Duration::minutes(90)));
    }

    #[tokio::test]
    async fn lists_subtasks_in_creation_order() {
        let server = setup();
        let epic = create_epic(&server, "Move").await;
        let a = create_subtask(&server, epic.id, "A", None, None).await;
        let b = create_subtask(&server, epic.id, "B", None, None).await;

        let subtasks: Vec<Subtask> = server
            .get(&format!("/api/v1/epics/{}/subtasks", epic.id))
            .await
            .json();

        let ids: Vec<TaskId> = subtasks.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);

        server
            .get("/api/v1/epics/999/subtasks")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn deleting_an_epic_deletes_its_subtasks() {
        let server = setup();
        let epic = create_epic(&server, "Move").await;
        let subtask = create_subtask(&server, epic.id, "Pack", Some("2026-03-10T10:00:00"), Some(30)).await;

        server
            .delete(&format!("/api/v1/epics/{}", epic.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/v1/subtasks/{}", subtask.id))
            .await
            .assert_status_not_found();

        // its slot is free again
        let response = server
            .post("/api/v1/tasks")
            .json(&json!({ "name": "Reuse", "start_time": "2026-03-10T10:00:00", "duration": 30 }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn update_edits_text_only() {
        let server = setup();
        let epic = create_epic(&server, "Move").await;

        let response = server
            .put(&format!("/api/v1/epics/{}", epic.id))
            .json(&UpdateEpicInput {
                name: Some("Relocate".into()),
                description: None,
            })
            .await;

        response.assert_status_ok();
        let epic: Epic = response.json();
        assert_eq!(epic.name, "Relocate");
        assert_eq!(epic.status(), Status::New);
    }
}

mod views {
    use super::*;

    #[tokio::test]
    async fn history_moves_refetched_items_to_the_end() {
        let server = setup();
        let a = create_task(&server, "A", None, None).await;
        let b = create_task(&server, "B", None, None).await;

        server.get(&format!("/api/v1/tasks/{}", a.id)).await;
        server.get(&format!("/api/v1/tasks/{}", b.id)).await;
        server.get(&format!("/api/v1/tasks/{}", a.id)).await;

        let history: Vec<Item> = server.get("/api/v1/history").await.json();
        let ids: Vec<TaskId> = history.iter().map(Item::id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn listing_does_not_record_history() {
        let server = setup();
        create_task(&server, "A", None, None).await;
        server.get("/api/v1/tasks").await;

        let history: Vec<Item> = server.get("/api/v1/history").await.json();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn prioritized_sorts_by_start_with_unscheduled_last() {
        let server = setup();
        let unscheduled = create_task(&server, "Someday", None, None).await;
        let late = create_task(&server, "Late", Some("2026-06-01T09:00:00"), Some(15)).await;
        let early = create_task(&server, "Early", Some("2026-02-01T09:00:00"), Some(15)).await;

        let items: Vec<Item> = server.get("/api/v1/prioritized").await.json();
        let ids: Vec<TaskId> = items.iter().map(Item::id).collect();
        assert_eq!(ids, vec![early.id, late.id, unscheduled.id]);
    }
}
