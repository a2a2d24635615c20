mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn stages_list_only_reminders_due_at_that_stage() {
    let app = TestApp::new().await;
    let first = app.insert_reminder(app.seed.vehicle_id, 30, [false; 3]).await;
    let second = app
        .insert_reminder(app.seed.second_vehicle_id, 10, [true, false, false])
        .await;

    let (status, body) = app.call(Method::GET, "/api/v1/reminders/stage/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], first.id);
    assert_eq!(rows[0]["stage"], "First Reminder");
    assert_eq!(rows[0]["customer_name"], "Laura Mendez");

    let (_, body) = app.call(Method::GET, "/api/v1/reminders/stage/2", None).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], second.id);

    let (_, body) = app.call(Method::GET, "/api/v1/reminders/stage/3", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reminders_beyond_the_horizon_are_not_listed() {
    let app = TestApp::new().await;
    app.insert_reminder(app.seed.vehicle_id, 200, [false; 3]).await;

    let (_, body) = app.call(Method::GET, "/api/v1/reminders/stage/1", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app.call(Method::GET, "/api/v1/reminders/summary", None).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn unknown_stage_is_a_bad_request() {
    let app = TestApp::new().await;
    let (status, _) = app.call(Method::GET, "/api/v1/reminders/stage/4", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mark_sent_advances_stages_in_order() {
    let app = TestApp::new().await;
    let reminder = app.insert_reminder(app.seed.vehicle_id, 30, [false; 3]).await;

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/v1/reminders/mark-sent",
            Some(json!({ "reminder_id": reminder.id, "stage": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "second before first");

    for stage in 1..=3 {
        let (status, body) = app
            .call(
                Method::PUT,
                "/api/v1/reminders/mark-sent",
                Some(json!({ "reminder_id": reminder.id, "stage": stage })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    let (status, body) = app
        .call(Method::GET, &format!("/api/v1/reminders/{}", reminder.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let detail = &body["data"];
    assert_eq!(detail["first_sent"], true);
    assert_eq!(detail["second_sent"], true);
    assert_eq!(detail["third_sent"], true);
    assert_eq!(detail["vin"], "1HGCM82633A004352");
    assert_eq!(detail["plates"], "ABC-123");

    let (_, body) = app.call(Method::GET, "/api/v1/reminders/summary", None).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn summary_counts_each_pending_stage() {
    let app = TestApp::new().await;
    app.insert_reminder(app.seed.vehicle_id, 15, [false; 3]).await;
    app.insert_reminder(app.seed.second_vehicle_id, 45, [true, true, false])
        .await;

    let (status, body) = app.call(Method::GET, "/api/v1/reminders/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"];
    assert_eq!(summary["first_pending"], 1);
    assert_eq!(summary["second_pending"], 0);
    assert_eq!(summary["third_pending"], 1);
    assert_eq!(summary["total"], 2);
}

#[tokio::test]
async fn missing_reminder_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app.call(Method::GET, "/api/v1/reminders/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/v1/reminders/mark-sent",
            Some(json!({ "reminder_id": 404, "stage": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
