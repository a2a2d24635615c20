#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Local, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use carsline_api::{
    config::{AppConfig, LicenseMode},
    db,
    entities::{customer, next_service_reminder, staff_member, vehicle},
    errors::ServiceError,
    handlers::{common::USER_ID_HEADER, AppServices},
    reports::{DocumentRenderer, OrderDocument, ReportComposer},
    AppState,
};

/// Renders a report as a small text blob so API tests do not depend on fonts.
pub struct StubRenderer;

impl DocumentRenderer for StubRenderer {
    fn render(&self, document: &OrderDocument) -> Result<Vec<u8>, ServiceError> {
        Ok(format!(
            "%PDF-stub {} items={} total={}",
            document.header.order_number,
            document.work_items.len(),
            document.totals.grand_total
        )
        .into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}

/// Ids of the reference rows every test starts with.
#[derive(Debug, Clone, Copy)]
pub struct Seed {
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub second_vehicle_id: i32,
    pub advisor_id: i32,
    pub technician_id: i32,
}

/// Application backed by a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub seed: Seed,
    pub report_dir: TempDir,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_license(LicenseMode::Professional).await
    }

    pub async fn with_license(license_mode: LicenseMode) -> Self {
        let db_dir = TempDir::new().expect("temp dir for database");
        let report_dir = TempDir::new().expect("temp dir for reports");
        let db_path = db_dir.path().join("carsline_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.reports.output_directory = report_dir.path().to_path_buf();
        cfg.reports.license_mode = license_mode;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let seed = seed_reference_rows(&db_arc).await;

        let reports = ReportComposer::with_renderer(
            db_arc.clone(),
            cfg.reports.clone(),
            cfg.tax_rate(),
            Arc::new(StubRenderer),
        );
        let services = AppServices::with_reports(db_arc.clone(), &cfg, reports);
        let state = AppState {
            db: db_arc,
            config: cfg,
            services,
        };

        Self {
            router: carsline_api::app_router(state.clone()),
            state,
            seed,
            report_dir,
            _db_dir: db_dir,
        }
    }

    /// Sends a request, acting as `staff_id` when given.
    pub async fn request_as(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        staff_id: Option<i32>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = staff_id {
            builder = builder.header(USER_ID_HEADER, id.to_string());
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request_as(method, uri, body, Some(self.seed.advisor_id))
            .await
    }

    /// Sends a request and returns the status with the parsed JSON body.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    /// Books a service order for the seeded vehicle and returns its id.
    pub async fn create_service_order(&self, work_items: &[&str]) -> i32 {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/orders",
                Some(self.order_payload(1, Some(1), work_items)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create order failed: {}", body);
        body["data"]["order_id"].as_i64().expect("order id") as i32
    }

    pub fn order_payload(
        &self,
        order_type_id: i32,
        service_type_id: Option<i32>,
        work_items: &[&str],
    ) -> Value {
        json!({
            "order_type_id": order_type_id,
            "customer_id": self.seed.customer_id,
            "vehicle_id": self.seed.vehicle_id,
            "service_type_id": service_type_id,
            "odometer": 15000,
            "promised_delivery_at": fmt(in_hours(8)),
            "advisor_notes": "Customer waits in lobby",
            "work_items": work_items
                .iter()
                .map(|d| json!({ "description": d }))
                .collect::<Vec<_>>(),
        })
    }

    /// Work item ids of an order, in creation order.
    pub async fn work_item_ids(&self, order_id: i32) -> Vec<i32> {
        let (status, body) = self
            .call(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
            .await;
        assert_eq!(status, StatusCode::OK, "get order failed: {}", body);
        body["data"]["work_items"]
            .as_array()
            .expect("work items")
            .iter()
            .map(|item| item["id"].as_i64().expect("work item id") as i32)
            .collect()
    }

    /// Assigns, starts and completes a work item with the given labor cost.
    pub async fn finish_work_item(&self, work_item_id: i32, labor_cost: &str) {
        let base = format!("/api/v1/orders/work-items/{}", work_item_id);
        let steps = [
            (
                format!("{}/assign", base),
                Some(json!({ "technician_id": self.seed.technician_id })),
            ),
            (format!("{}/start", base), None),
            (format!("{}/complete", base), Some(json!({ "comments": "done" }))),
            (
                format!("{}/labor-cost", base),
                Some(json!({ "labor_cost": labor_cost })),
            ),
        ];
        for (uri, body) in steps {
            let (status, response) = self.call(Method::PUT, &uri, body).await;
            assert_eq!(status, StatusCode::OK, "{} failed: {}", uri, response);
        }
    }

    /// Inserts a reminder row directly.
    pub async fn insert_reminder(
        &self,
        vehicle_id: i32,
        next_service_in_days: i64,
        sent: [bool; 3],
    ) -> next_service_reminder::Model {
        let today = Local::now().date_naive();
        next_service_reminder::ActiveModel {
            customer_id: Set(self.seed.customer_id),
            vehicle_id: Set(vehicle_id),
            last_service_name: Set("First Service".to_string()),
            next_service_label: Set("Second Service".to_string()),
            last_odometer: Set(10_000),
            last_service_date: Set(today - Duration::days(150)),
            next_service_date: Set(today + Duration::days(next_service_in_days)),
            next_service_odometer: Set(20_000),
            first_sent: Set(sent[0]),
            second_sent: Set(sent[1]),
            third_sent: Set(sent[2]),
            active: Set(true),
            modified_at: Set(Local::now().naive_local()),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("insert reminder")
    }
}

async fn seed_reference_rows(db: &db::DbPool) -> Seed {
    let now = Local::now().naive_local();

    let customer = customer::ActiveModel {
        full_name: Set("Laura Mendez".to_string()),
        tax_id: Set(Some("MELA800101AB1".to_string())),
        mobile_phone: Set("555-0101".to_string()),
        home_phone: Set(None),
        email: Set(Some("laura@example.com".to_string())),
        address: Set(Some("12 Elm Street".to_string())),
        active: Set(true),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed customer");

    let mut vehicle_ids = Vec::new();
    for (vin, plates) in [("1HGCM82633A004352", "ABC-123"), ("3VWFE21C04M000001", "XYZ-987")] {
        let vehicle = vehicle::ActiveModel {
            customer_id: Set(customer.id),
            make: Set("Honda".to_string()),
            model: Set("Civic".to_string()),
            year: Set(2019),
            color: Set(Some("Blue".to_string())),
            trim: Set(None),
            vin: Set(vin.to_string()),
            plates: Set(Some(plates.to_string())),
            odometer: Set(Some(14_500)),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed vehicle");
        vehicle_ids.push(vehicle.id);
    }

    let mut staff_ids = Vec::new();
    for (name, role) in [("Ana Ruiz", "advisor"), ("Carlos Vega", "technician")] {
        let staff = staff_member::ActiveModel {
            full_name: Set(name.to_string()),
            role: Set(role.to_string()),
            active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed staff member");
        staff_ids.push(staff.id);
    }

    Seed {
        customer_id: customer.id,
        vehicle_id: vehicle_ids[0],
        second_vehicle_id: vehicle_ids[1],
        advisor_id: staff_ids[0],
        technician_id: staff_ids[1],
    }
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    })
}

pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {}", other),
    }
}

pub fn in_hours(hours: i64) -> NaiveDateTime {
    Local::now().naive_local() + Duration::hours(hours)
}

pub fn fmt(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}
