mod common;

use actix_web::http::StatusCode;
use futures::future::join;
use pretty_assertions::assert_eq;

use common::{create_project, create_task, init_app, send, signed_up, test_context};

#[actix_rt::test]
async fn test_project_crud_flow() {
    let app = init_app(test_context()).await;
    let alice = signed_up(&app, "alice").await;

    let id = create_project(&app, &alice, "P1").await.to_string();
    create_project(&app, &alice, "P2").await;

    let reply = send(&app, alice.get("/api/projects", &[])).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body.as_array().unwrap().len(), 2);

    let reply = send(
        &app,
        alice.put(
            "/api/update-project",
            &[("project_id", id.as_str()), ("name", "Renamed"), ("description", "new")],
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "Project updated successfully");

    let reply = send(&app, alice.get("/api/project", &[("project_id", id.as_str())])).await;
    assert_eq!(reply.body["name"], "Renamed");
    assert_eq!(reply.body["description"], "new");

    let reply = send(&app, alice.delete("/api/delete-project", &[("project_id", id.as_str())])).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["message"], "Project deleted successfully");

    let reply = send(&app, alice.get("/api/project", &[("project_id", id.as_str())])).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_other_users_project_is_not_found() {
    let app = init_app(test_context()).await;
    let alice = signed_up(&app, "alice").await;
    let bob = signed_up(&app, "bob").await;
    let id = create_project(&app, &alice, "P1").await.to_string();

    let read = send(&app, bob.get("/api/project", &[("project_id", id.as_str())])).await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);
    assert_eq!(read.body["error"], "Project not found for this user");

    let missing = send(&app, bob.get("/api/project", &[("project_id", "9999")])).await;
    assert_eq!(missing.status, read.status);
    assert_eq!(missing.body, read.body);

    let update = send(
        &app,
        bob.put(
            "/api/update-project",
            &[("project_id", id.as_str()), ("name", "mine"), ("description", "d")],
        ),
    )
    .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let delete = send(&app, bob.delete("/api/delete-project", &[("project_id", id.as_str())])).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let reply = send(&app, bob.get("/api/projects", &[])).await;
    assert!(reply.body.as_array().unwrap().is_empty());

    // alice's project is untouched
    let reply = send(&app, alice.get("/api/project", &[("project_id", id.as_str())])).await;
    assert_eq!(reply.body["name"], "P1");
}

#[actix_rt::test]
async fn test_malformed_input_is_bad_request() {
    let app = init_app(test_context()).await;
    let alice = signed_up(&app, "alice").await;

    for bad in ["", "abc", "0", "-1"] {
        let reply = send(&app, alice.get("/api/project", &[("project_id", bad)])).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "project_id={:?}", bad);
    }

    let reply = send(&app, alice.post("/api/add-project", &[("description", "d")])).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(
        &app,
        alice.post("/api/add-project", &[("name", "   "), ("description", "d")]),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    // validation comes before the gate
    let reply = send(&app, alice.claiming("nobody").get("/api/project", &[("project_id", "x")])).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_delete_project_removes_its_tasks() {
    let app = init_app(test_context()).await;
    let alice = signed_up(&app, "alice").await;
    let project = create_project(&app, &alice, "P1").await;
    let task = create_task(&app, &alice, project, "T1").await.to_string();

    let project = project.to_string();
    let reply = send(&app, alice.delete("/api/delete-project", &[("project_id", project.as_str())])).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = send(&app, alice.get("/api/task", &[("task_id", task.as_str())])).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_delete_racing_update_never_fails_internally() {
    let app = init_app(test_context()).await;
    let alice = signed_up(&app, "alice").await;
    let id = create_project(&app, &alice, "P1").await.to_string();

    let (update, delete) = join(
        send(
            &app,
            alice.put(
                "/api/update-project",
                &[("project_id", id.as_str()), ("name", "P2"), ("description", "d")],
            ),
        ),
        send(&app, alice.delete("/api/delete-project", &[("project_id", id.as_str())])),
    )
    .await;

    assert_eq!(delete.status, StatusCode::OK);
    assert!(
        update.status == StatusCode::OK || update.status == StatusCode::NOT_FOUND,
        "unexpected update status {}",
        update.status
    );
}
