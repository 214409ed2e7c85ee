
use axum::http::StatusCode;
use serde_json::json;
use test_support::{create_student, delete, get, post, register_professor, spawn_app};

#[tokio::test]
async fn create_then_fetch_preserves_name_and_owner() {
    let t = spawn_app();
    let (cookie, professor_id) = register_professor(&t.app, "ana").await;

    let (status, body) = post(
        &t.app,
        "/api/classes",
        Some(&cookie),
        json!({ "name": "Turma 9B" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let class_id = body["data"]["id"].as_str().expect("class id").to_string();
    // Owner defaults to the authenticated professor.
    assert_eq!(body["data"]["owner_id"], professor_id.as_str());

    let (status, fetched) = get(&t.app, &format!("/api/classes/{class_id}"), Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Turma 9B");
    assert_eq!(fetched["owner_id"], professor_id.as_str());
    assert_eq!(fetched["students"], json!([]));
    assert_eq!(fetched["members"], json!([]));
}

#[tokio::test]
async fn unknown_owner_is_a_validation_error() {
    let t = spawn_app();
    let (cookie, _) = register_professor(&t.app, "beto").await;

    let (status, body) = post(
        &t.app,
        "/api/classes",
        Some(&cookie),
        json!({ "name": "Turma 7A", "owner_id": "nao-existe" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn enrollment_add_and_remove_are_idempotent() {
    let t = spawn_app();
    let (cookie, _) = register_professor(&t.app, "carla").await;
    let student_id = create_student(&t.app, &cookie, "João Silva").await;

    let (_, body) = post(&t.app, "/api/classes", Some(&cookie), json!({ "name": "Turma 5C" })).await;
    let class_id = body["data"]["id"].as_str().expect("class id").to_string();

    // Removing a student who was never enrolled succeeds and changes nothing.
    let (status, _) = delete(
        &t.app,
        &format!("/api/classes/{class_id}/students/{student_id}"),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Enrolling twice leaves a single roster entry.
    for _ in 0..2 {
        let (status, _) = post(
            &t.app,
            &format!("/api/classes/{class_id}/students/{student_id}"),
            Some(&cookie),
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, fetched) = get(&t.app, &format!("/api/classes/{class_id}"), Some(&cookie)).await;
    assert_eq!(fetched["students"], json!([student_id.clone()]));

    let (status, _) = delete(
        &t.app,
        &format!("/api/classes/{class_id}/students/{student_id}"),
        Some(&cookie),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, fetched) = get(&t.app, &format!("/api/classes/{class_id}"), Some(&cookie)).await;
    assert_eq!(fetched["students"], json!([]));
}

#[tokio::test]
async fn membership_tracks_co_professors_and_counts() {
    let t = spawn_app();
    let (cookie, _) = register_professor(&t.app, "diego").await;
    let (_, colleague_id) = register_professor(&t.app, "eva").await;

    let (_, body) = post(&t.app, "/api/classes", Some(&cookie), json!({ "name": "Turma 3A" })).await;
    let class_id = body["data"]["id"].as_str().expect("class id").to_string();

    let (status, _) = post(
        &t.app,
        &format!("/api/classes/{class_id}/members/{colleague_id}"),
        Some(&cookie),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, classes) = get(&t.app, "/api/classes", Some(&cookie)).await;
    let row = classes
        .as_array()
        .and_then(|list| list.iter().find(|c| c["id"] == class_id.as_str()))
        .expect("class row")
        .clone();
    assert_eq!(row["member_count"], 1);
    assert_eq!(row["student_count"], 0);

    // Unknown professor cannot be added.
    let (status, _) = post(
        &t.app,
        &format!("/api/classes/{class_id}/members/nao-existe"),
        Some(&cookie),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_class_removes_it_and_unknown_ids_are_404() {
    let t = spawn_app();
    let (cookie, _) = register_professor(&t.app, "fabio").await;
    let student_id = create_student(&t.app, &cookie, "Maria Souza").await;

    let (_, body) = post(&t.app, "/api/classes", Some(&cookie), json!({ "name": "Turma 1A" })).await;
    let class_id = body["data"]["id"].as_str().expect("class id").to_string();
    post(
        &t.app,
        &format!("/api/classes/{class_id}/students/{student_id}"),
        Some(&cookie),
        json!({}),
    )
    .await;

    let (status, _) = delete(&t.app, &format!("/api/classes/{class_id}"), Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&t.app, &format!("/api/classes/{class_id}"), Some(&cookie)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The student survives their class.
    let (status, _) = get(&t.app, &format!("/api/students/{student_id}"), Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&t.app, "/api/classes/nao-existe", Some(&cookie)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
