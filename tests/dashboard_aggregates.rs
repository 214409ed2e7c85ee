
use axum::http::StatusCode;
use test_support::{create_student, get, ingest_log, register_professor, spawn_app};

#[tokio::test]
async fn stats_and_user_summaries_reflect_the_alert_buckets() {
    let t = spawn_app();
    let (cookie, _) = register_professor(&t.app, "ana").await;
    let monitored = create_student(&t.app, &cookie, "João Silva").await;
    let idle = create_student(&t.app, &cookie, "Maria Souza").await;

    ingest_log(&t.app, &monitored, "Rede Social", 10, "2026-03-10T09:00:00Z").await;
    ingest_log(&t.app, &monitored, "IA", 20, "2026-03-10T10:00:00Z").await;
    ingest_log(&t.app, &monitored, "Outros", 5, "2026-03-10T11:00:00Z").await;

    let (status, stats) = get(&t.app, "/api/dashboard/stats", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["totalLogs"], 3);
    assert_eq!(stats["totalAlerts"], 2);
    assert_eq!(stats["aiDetections"], 1);

    let (status, users) = get(&t.app, "/api/dashboard/users", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = users.as_array().expect("array");
    assert_eq!(rows.len(), 2);

    let summary = rows
        .iter()
        .find(|r| r["student_id"] == monitored.as_str())
        .expect("monitored summary");
    assert_eq!(summary["total_duration"], 35);
    assert_eq!(summary["log_count"], 3);
    assert_eq!(summary["has_red_alert"], true);
    assert_eq!(summary["has_blue_alert"], true);
    assert_eq!(summary["last_activity"], "2026-03-10T11:00:00Z");

    let idle_summary = rows
        .iter()
        .find(|r| r["student_id"] == idle.as_str())
        .expect("idle summary");
    assert_eq!(idle_summary["log_count"], 0);
    assert_eq!(idle_summary["has_red_alert"], false);
    assert_eq!(idle_summary["has_blue_alert"], false);
    assert!(idle_summary["last_activity"].is_null());
}

#[tokio::test]
async fn category_breakdown_percentages_cover_the_whole_log_set() {
    let t = spawn_app();
    let (cookie, _) = register_professor(&t.app, "beto").await;
    let student = create_student(&t.app, &cookie, "Pedro Lima").await;

    ingest_log(&t.app, &student, "Rede Social", 10, "2026-03-10T09:00:00Z").await;
    ingest_log(&t.app, &student, "Rede Social", 10, "2026-03-10T10:00:00Z").await;
    ingest_log(&t.app, &student, "IA", 10, "2026-03-10T11:00:00Z").await;
    ingest_log(&t.app, &student, "Outros", 10, "2026-03-10T12:00:00Z").await;

    let (status, breakdown) = get(&t.app, "/api/analytics/categories", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = breakdown.as_array().expect("array");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["category"], "Rede Social");
    assert_eq!(rows[0]["count"], 2);
    assert_eq!(rows[0]["percentage"], 50.0);

    let total: f64 = rows.iter().map(|r| r["percentage"].as_f64().unwrap()).sum();
    assert!((total - 100.0).abs() < 0.5, "percentages summed to {total}");
}

#[tokio::test]
async fn hourly_histogram_buckets_by_utc_hour() {
    let t = spawn_app();
    let (cookie, _) = register_professor(&t.app, "carla").await;
    let student = create_student(&t.app, &cookie, "Clara Nunes").await;

    ingest_log(&t.app, &student, "IA", 5, "2026-03-10T09:10:00Z").await;
    ingest_log(&t.app, &student, "IA", 5, "2026-03-10T09:50:00Z").await;
    ingest_log(&t.app, &student, "Outros", 5, "2026-03-10T14:00:00Z").await;

    let (status, hist) = get(&t.app, "/api/analytics/by-hour", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = hist.as_array().expect("array");
    assert_eq!(rows.len(), 24);
    assert_eq!(rows[9]["hour"], 9);
    assert_eq!(rows[9]["count"], 2);
    assert_eq!(rows[14]["count"], 1);
    assert_eq!(rows[0]["count"], 0);
}
