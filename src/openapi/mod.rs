use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Carsline API",
        version = "1.0.0",
        description = r#"
# Carsline Repair Shop API

Backend for an automotive repair shop.

- **Appointments**: booking, rescheduling and cancelling visits
- **Work orders**: order boards, the technician workflow, cost finalization and delivery
- **Parts**: parts bought for appointment and order work items
- **Reminders**: next-service call lists after a delivered service
- **Reports**: PDF work-order reports

## Acting staff member

Endpoints that record who created something read the staff id from the `X-User-Id` header.

## Errors

Failures share one body:

```json
{
  "error": "Conflict",
  "message": "Conflict: Order SRV-000012 has already been delivered",
  "request_id": "1f0c…",
  "timestamp": "2025-01-10T09:30:00Z"
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    tags(
        (name = "appointments", description = "Appointment lifecycle"),
        (name = "orders", description = "Work order lifecycle"),
        (name = "technician workflow", description = "Work item state changes"),
        (name = "parts", description = "Purchased parts ledger"),
        (name = "reminders", description = "Next-service reminders"),
        (name = "reports", description = "Work-order reports"),
        (name = "health", description = "Health check")
    ),
    paths(
        crate::handlers::appointments::create_appointment,
        crate::handlers::appointments::list_appointments,
        crate::handlers::appointments::get_appointment,
        crate::handlers::appointments::reschedule_appointment,
        crate::handlers::appointments::cancel_appointment,

        crate::handlers::work_orders::create_order,
        crate::handlers::work_orders::list_for_advisor,
        crate::handlers::work_orders::list_for_shop_manager,
        crate::handlers::work_orders::list_technician_work,
        crate::handlers::work_orders::get_order,
        crate::handlers::work_orders::cancel_order,
        crate::handlers::work_orders::deliver_order,
        crate::handlers::work_orders::finalize_costs,
        crate::handlers::work_orders::upsert_checklist,
        crate::handlers::work_orders::add_parts,
        crate::handlers::work_orders::assign_technician,
        crate::handlers::work_orders::start_work,
        crate::handlers::work_orders::pause_work,
        crate::handlers::work_orders::resume_work,
        crate::handlers::work_orders::complete_work,
        crate::handlers::work_orders::set_labor_cost,
        crate::handlers::work_orders::set_shop_manager_comments,

        crate::handlers::parts::add_parts,
        crate::handlers::parts::mark_ready,
        crate::handlers::parts::list_for_work_item,
        crate::handlers::parts::list_for_appointment,
        crate::handlers::parts::remove_part,
        crate::handlers::parts::update_sale_price,

        crate::handlers::reminders::summary,
        crate::handlers::reminders::list_pending,
        crate::handlers::reminders::get_reminder,
        crate::handlers::reminders::mark_sent,

        crate::handlers::reports::download_report,
        crate::handlers::reports::preview_report,
        crate::handlers::reports::save_report,

        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::models::OrderStatus,
            crate::models::WorkStatus,
            crate::models::PartOwner,
            crate::models::OrderKind,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let json = serde_json::to_string(&ApiDocV1::openapi()).unwrap();
        assert!(json.contains("Carsline API"));
        for path in [
            "/api/v1/appointments/{id}/reschedule",
            "/api/v1/orders/work-items/{id}/complete",
            "/api/v1/parts/{id}/sale-price",
            "/api/v1/reminders/mark-sent",
            "/api/v1/reports/orders/{id}/download",
            "/health",
        ] {
            assert!(json.contains(path), "missing {path}");
        }
    }
}
