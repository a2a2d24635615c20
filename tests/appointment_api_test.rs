mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use sea_orm::EntityTrait;
use serde_json::{json, Value};

use carsline_api::entities::next_service_reminder;
use common::{fmt, TestApp};

fn day_after_tomorrow_at(hour: u32, minute: u32) -> NaiveDateTime {
    (Local::now().date_naive() + Duration::days(2))
        .and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

fn appointment_payload(app: &TestApp, order_type_id: i32, vehicle_id: i32, at: NaiveDateTime) -> Value {
    json!({
        "order_type_id": order_type_id,
        "customer_id": app.seed.customer_id,
        "vehicle_id": vehicle_id,
        "service_type_id": if order_type_id == 1 { Some(1) } else { None },
        "scheduled_at": fmt(at),
        "work_items": [
            { "description": "Oil and filter change" },
            { "description": "Brake inspection", "instructions": "Customer hears squeaking" }
        ]
    })
}

async fn book(app: &TestApp, order_type_id: i32, vehicle_id: i32, at: NaiveDateTime) -> i32 {
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/appointments",
            Some(appointment_payload(app, order_type_id, vehicle_id, at)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "booking failed: {}", body);
    body["data"]["appointment_id"].as_i64().unwrap() as i32
}

#[tokio::test]
async fn create_and_fetch_appointment() {
    let app = TestApp::new().await;
    let at = day_after_tomorrow_at(9, 0);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/appointments",
            Some(appointment_payload(&app, 3, app.seed.vehicle_id, at)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["success"].as_bool().unwrap());
    assert_eq!(body["data"]["work_item_count"], 2);

    let id = body["data"]["appointment_id"].as_i64().unwrap();
    let (status, body) = app
        .call(Method::GET, &format!("/api/v1/appointments/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let detail = &body["data"];
    assert_eq!(detail["customer_name"], "Laura Mendez");
    assert_eq!(detail["order_type"], "Repair");
    assert_eq!(detail["vin"], "1HGCM82633A004352");
    assert_eq!(detail["scheduler"], "Ana Ruiz");
    assert_eq!(detail["work_items"].as_array().unwrap().len(), 2);
    assert_eq!(detail["work_items"][1]["instructions"], "Customer hears squeaking");
}

#[tokio::test]
async fn create_requires_staff_header_and_work_items() {
    let app = TestApp::new().await;
    let payload = appointment_payload(&app, 3, app.seed.vehicle_id, day_after_tomorrow_at(9, 0));

    let response = app
        .request_as(Method::POST, "/api/v1/appointments", Some(payload.clone()), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut empty = payload;
    empty["work_items"] = json!([]);
    let (status, _) = app.call(Method::POST, "/api/v1/appointments", Some(empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_rejects_unknown_vehicle() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/appointments",
            Some(appointment_payload(&app, 3, 9_999, day_after_tomorrow_at(9, 0))),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
}

#[tokio::test]
async fn list_by_date_returns_only_that_day_in_time_order() {
    let app = TestApp::new().await;
    book(&app, 3, app.seed.vehicle_id, day_after_tomorrow_at(15, 0)).await;
    book(&app, 2, app.seed.second_vehicle_id, day_after_tomorrow_at(9, 30)).await;
    book(&app, 3, app.seed.vehicle_id, day_after_tomorrow_at(9, 0) + Duration::days(1)).await;

    let date = day_after_tomorrow_at(0, 0).date();
    let (status, body) = app
        .call(Method::GET, &format!("/api/v1/appointments?date={}", date), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["order_type"], "Diagnostic");
    assert_eq!(rows[1]["order_type"], "Repair");
}

#[tokio::test]
async fn reschedule_respects_the_half_hour_window() {
    let app = TestApp::new().await;
    let first = book(&app, 3, app.seed.vehicle_id, day_after_tomorrow_at(10, 0)).await;
    book(&app, 3, app.seed.second_vehicle_id, day_after_tomorrow_at(10, 20)).await;

    let uri = format!("/api/v1/appointments/{}/reschedule", first);
    let (status, _) = app
        .call(
            Method::PUT,
            &uri,
            Some(json!({ "scheduled_at": fmt(day_after_tomorrow_at(10, 40)) })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Exactly thirty minutes apart does not collide.
    let (status, body) = app
        .call(
            Method::PUT,
            &uri,
            Some(json!({ "scheduled_at": fmt(day_after_tomorrow_at(10, 50)) })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body["data"]["previous_scheduled_at"],
        fmt(day_after_tomorrow_at(10, 0))
    );
}

#[tokio::test]
async fn reschedule_into_the_past_is_rejected() {
    let app = TestApp::new().await;
    let id = book(&app, 3, app.seed.vehicle_id, day_after_tomorrow_at(10, 0)).await;

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/appointments/{}/reschedule", id),
            Some(json!({ "scheduled_at": fmt(Local::now().naive_local() - Duration::hours(1)) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelled_appointment_disappears() {
    let app = TestApp::new().await;
    let id = book(&app, 3, app.seed.vehicle_id, day_after_tomorrow_at(10, 0)).await;

    let (status, body) = app
        .call(Method::PUT, &format!("/api/v1/appointments/{}/cancel", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["work_items_deactivated"], 2);
    assert_eq!(body["data"]["reminder_reactivated"], false);

    let (status, _) = app
        .call(Method::GET, &format!("/api/v1/appointments/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(Method::PUT, &format!("/api/v1/appointments/{}/cancel", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn service_booking_retires_and_cancellation_rearms_the_reminder() {
    let app = TestApp::new().await;
    let reminder = app.insert_reminder(app.seed.vehicle_id, 20, [false; 3]).await;

    let id = book(&app, 1, app.seed.vehicle_id, day_after_tomorrow_at(11, 0)).await;
    let stored = next_service_reminder::Entity::find_by_id(reminder.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.active);

    let (status, body) = app
        .call(Method::PUT, &format!("/api/v1/appointments/{}/cancel", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reminder_reactivated"], true);

    let stored = next_service_reminder::Entity::find_by_id(reminder.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.active);
    assert!(stored.first_sent && stored.second_sent && !stored.third_sent);
}
