mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Local};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::{decimal, fmt, TestApp};

/// Books an appointment with one work item and returns `(appointment_id, work_item_id)`.
async fn appointment_with_item(app: &TestApp) -> (i32, i32) {
    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/appointments",
            Some(json!({
                "order_type_id": 3,
                "customer_id": app.seed.customer_id,
                "vehicle_id": app.seed.vehicle_id,
                "scheduled_at": fmt(Local::now().naive_local() + Duration::days(3)),
                "work_items": [{ "description": "Replace timing belt" }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let appointment_id = body["data"]["appointment_id"].as_i64().unwrap() as i32;

    let (_, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/appointments/{}", appointment_id),
            None,
        )
        .await;
    let work_item_id = body["data"]["work_items"][0]["id"].as_i64().unwrap() as i32;
    (appointment_id, work_item_id)
}

fn parts(lines: &[(&str, i32, &str, Option<&str>)]) -> Value {
    Value::Array(
        lines
            .iter()
            .map(|(description, quantity, cost, sale)| {
                json!({
                    "description": description,
                    "quantity": quantity,
                    "unit_cost": cost,
                    "unit_sale_price": sale,
                })
            })
            .collect(),
    )
}

#[tokio::test]
async fn add_parts_to_appointment_item_and_list_totals() {
    let app = TestApp::new().await;
    let (appointment_id, item_id) = appointment_with_item(&app).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/parts",
            Some(json!({
                "work_item_id": item_id,
                "parts": parts(&[
                    ("Timing belt", 1, "120.00", Some("180.00")),
                    ("Tensioner", 2, "35.50", Some("50.00")),
                ]),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["owner"]["kind"], "appointment");
    assert_eq!(decimal(&body["data"]["total_cost"]), dec!(191.00));

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/parts/work-items/{}", item_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["part_count"], 2);
    assert_eq!(decimal(&body["data"]["total_sale"]), dec!(280.00));

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/parts/appointments/{}", appointment_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["work_items"][0]["parts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn sale_total_is_absent_until_every_part_is_priced() {
    let app = TestApp::new().await;
    let (_, item_id) = appointment_with_item(&app).await;

    let (_, body) = app
        .call(
            Method::POST,
            "/api/v1/parts",
            Some(json!({
                "work_item_id": item_id,
                "parts": parts(&[("Coolant", 2, "10.00", None), ("Hose", 1, "8.00", Some("12.00"))]),
            })),
        )
        .await;
    let unpriced = body["data"]["parts"][0]["id"].as_i64().unwrap();

    let uri = format!("/api/v1/parts/work-items/{}", item_id);
    let (_, body) = app.call(Method::GET, &uri, None).await;
    assert!(body["data"]["total_sale"].is_null());

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/parts/{}/sale-price", unpriced),
            Some(json!({ "unit_sale_price": "15.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.call(Method::GET, &uri, None).await;
    assert_eq!(decimal(&body["data"]["total_sale"]), dec!(42.00));
}

#[tokio::test]
async fn invalid_part_lines_are_rejected() {
    let app = TestApp::new().await;
    let (_, item_id) = appointment_with_item(&app).await;

    for bad in [
        parts(&[("Bolt", 0, "1.00", None)]),
        parts(&[("Bolt", 1, "-1.00", None)]),
        parts(&[("", 1, "1.00", None)]),
        parts(&[("Bolt", 1, "1.00", Some("0"))]),
    ] {
        let (status, body) = app
            .call(
                Method::POST,
                "/api/v1/parts",
                Some(json!({ "work_item_id": item_id, "parts": bad })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    }
}

#[tokio::test]
async fn removing_the_last_part_clears_parts_ready() {
    let app = TestApp::new().await;
    let (_, item_id) = appointment_with_item(&app).await;

    let (_, body) = app
        .call(
            Method::POST,
            "/api/v1/parts",
            Some(json!({ "work_item_id": item_id, "parts": parts(&[("Belt", 1, "90.00", None)]) })),
        )
        .await;
    let part_id = body["data"]["parts"][0]["id"].as_i64().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/v1/parts/work-items/{}/ready", item_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["parts_ready"], true);

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/v1/parts/{}", part_id), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["parts_ready_cleared"], true);

    let (_, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/parts/work-items/{}", item_id),
            None,
        )
        .await;
    assert_eq!(body["data"]["parts_ready"], false);
    assert_eq!(body["data"]["part_count"], 0);
}

#[tokio::test]
async fn parts_on_a_cancelled_appointment_are_refused() {
    let app = TestApp::new().await;
    let (appointment_id, item_id) = appointment_with_item(&app).await;
    app.call(
        Method::PUT,
        &format!("/api/v1/appointments/{}/cancel", appointment_id),
        None,
    )
    .await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/parts",
            Some(json!({ "work_item_id": item_id, "parts": parts(&[("Belt", 1, "90.00", None)]) })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transferred_parts_are_immutable() {
    let app = TestApp::new().await;
    let order_id = app.create_service_order(&["Brakes"]).await;
    let items = app.work_item_ids(order_id).await;

    let (_, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/orders/work-items/{}/parts", items[0]),
            Some(json!({ "parts": parts(&[("Pads", 1, "60.00", None)]) })),
        )
        .await;
    let part_id = body["data"]["parts"][0]["id"].as_i64().unwrap();

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/v1/parts/{}", part_id), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/parts/{}/sale-price", part_id),
            Some(json!({ "unit_sale_price": "90.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/parts/work-items/{}?order_scoped=true", items[0]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["owner"]["kind"], "order");
    assert_eq!(body["data"]["parts"][0]["transferred"], true);
}

#[tokio::test]
async fn order_scoped_parts_keep_the_item_total_current() {
    let app = TestApp::new().await;
    let order_id = app.create_service_order(&["Suspension"]).await;
    let items = app.work_item_ids(order_id).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/parts",
            Some(json!({
                "work_item_id": items[0],
                "order_scoped": true,
                "parts": parts(&[("Shock absorber", 2, "85.00", None)]),
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let part_id = body["data"]["parts"][0]["id"].as_i64().unwrap();

    let (_, body) = app
        .call(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(decimal(&body["data"]["work_items"][0]["parts_total"]), dec!(170));

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/v1/parts/{}", part_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(decimal(&body["data"]["work_items"][0]["parts_total"]), dec!(0));
}
