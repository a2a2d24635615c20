mod common;

use axum::{
    body,
    http::{header, Method, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Local;
use rust_decimal_macros::dec;
use serde_json::json;

use carsline_api::config::LicenseMode;
use common::TestApp;

/// A delivered-ready order: one item with a part and labor, costs finalized.
async fn finalized_order(app: &TestApp) -> i32 {
    let order_id = app.create_service_order(&["Brake service"]).await;
    let items = app.work_item_ids(order_id).await;
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/orders/work-items/{}/parts", items[0]),
            Some(json!({
                "parts": [{ "description": "Brake pad set", "quantity": 2, "unit_cost": "75.00" }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.finish_work_item(items[0], "300").await;
    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/orders/{}/finalize-costs", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    order_id
}

fn expected_file_name() -> String {
    format!("Order_SRV-000001_{}.pdf", Local::now().format("%Y%m%d"))
}

#[tokio::test]
async fn document_model_carries_order_totals() {
    let app = TestApp::new().await;
    let order_id = finalized_order(&app).await;

    let document = app
        .state
        .services
        .reports
        .build_model(order_id)
        .await
        .expect("document model");

    assert_eq!(document.header.order_number, "SRV-000001");
    assert_eq!(document.customer.name, "Laura Mendez");
    assert_eq!(document.vehicle.odometer, 15_000);
    assert_eq!(document.advisor.as_deref(), Some("Ana Ruiz"));
    assert_eq!(document.work_items.len(), 1);
    assert_eq!(document.work_items[0].parts.len(), 1);
    assert_eq!(document.work_items[0].parts[0].line_total, dec!(150));
    assert_eq!(document.totals.parts, dec!(150));
    assert_eq!(document.totals.labor, dec!(300));
    assert_eq!(document.totals.subtotal, dec!(450));
    assert_eq!(document.totals.tax, dec!(72));
    assert_eq!(document.totals.grand_total, dec!(522));
    assert!(document.edition_notice.is_none());
}

#[tokio::test]
async fn community_edition_reports_carry_the_notice() {
    let app = TestApp::with_license(LicenseMode::Community).await;
    let order_id = app.create_service_order(&["Inspection"]).await;

    let document = app
        .state
        .services
        .reports
        .build_model(order_id)
        .await
        .expect("document model");
    assert_eq!(document.edition_notice.as_deref(), Some("Community edition"));
}

#[tokio::test]
async fn download_returns_an_attachment() {
    let app = TestApp::new().await;
    let order_id = finalized_order(&app).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/reports/orders/{}/download", order_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "application/pdf"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(
        disposition,
        format!("attachment; filename=\"{}\"", expected_file_name())
    );

    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-stub SRV-000001"));
}

#[tokio::test]
async fn preview_returns_base64_of_the_document() {
    let app = TestApp::new().await;
    let order_id = finalized_order(&app).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/reports/orders/{}/preview", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["file_name"], expected_file_name());

    let decoded = STANDARD
        .decode(body["data"]["pdf_base64"].as_str().unwrap())
        .unwrap();
    let text = String::from_utf8(decoded).unwrap();
    let total = text
        .strip_prefix("%PDF-stub SRV-000001 items=1 total=")
        .expect("stub report text");
    assert_eq!(total.parse::<rust_decimal::Decimal>().unwrap(), dec!(522));
}

#[tokio::test]
async fn save_writes_under_the_order_directory() {
    let app = TestApp::new().await;
    let order_id = finalized_order(&app).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/reports/orders/{}/save", order_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let path = app
        .report_dir
        .path()
        .join("SRV-000001")
        .join(expected_file_name());
    assert_eq!(body["data"]["path"], path.display().to_string());
    let written = std::fs::read(&path).expect("saved report");
    assert_eq!(body["data"]["size_bytes"], written.len());
}

#[tokio::test]
async fn report_for_cancelled_or_unknown_order_is_not_found() {
    let app = TestApp::new().await;
    let order_id = app.create_service_order(&["Inspection"]).await;
    app.call(Method::PUT, &format!("/api/v1/orders/{}/cancel", order_id), None)
        .await;

    for id in [order_id, 9_999] {
        let response = app
            .request(
                Method::GET,
                &format!("/api/v1/reports/orders/{}/download", id),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"]["status"], "up");
}

#[tokio::test]
async fn responses_echo_the_request_id() {
    let app = TestApp::new().await;
    let order_id = app.create_service_order(&["Inspection"]).await;

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("request id header")
        .to_str()
        .unwrap()
        .to_string();
    let body = common::json_body(response).await;
    assert_eq!(body["meta"]["request_id"], request_id);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/orders/{id}/deliver"].is_object());
    assert!(body["paths"]["/api/v1/reminders/mark-sent"].is_object());
}
