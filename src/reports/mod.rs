//! Work-order reports: a document model assembled from an order and rendered
//! to PDF.

pub mod model;
pub mod typst_renderer;

use std::path::PathBuf;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    config::{LicenseMode, ReportConfig},
    db::DbPool,
    entities::{order_work_item, purchased_part, service_checklist, work_order},
    errors::ServiceError,
    services::{local_now, lookups, work_orders::ChecklistView},
};

pub use model::OrderDocument;
pub use typst_renderer::TypstRenderer;

use model::{
    CustomerBlock, DocumentHeader, DocumentProgress, DocumentTotals, DocumentWorkItem, VehicleBlock,
};

const COMMUNITY_NOTICE: &str = "Community edition";

/// Turns a document model into bytes. Implementations are synchronous and
/// run on the blocking pool.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, document: &OrderDocument) -> Result<Vec<u8>, ServiceError>;

    fn content_type(&self) -> &'static str;
}

/// A rendered report ready to send.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub order_number: String,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportPreview {
    pub order_number: String,
    pub file_name: String,
    pub pdf_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedReport {
    pub order_number: String,
    pub file_name: String,
    #[schema(value_type = String)]
    pub path: PathBuf,
    pub size_bytes: usize,
}

/// `Order_{number}_{yyyyMMdd}.pdf`
pub fn report_file_name(order_number: &str, on: chrono::NaiveDate) -> String {
    format!("Order_{}_{}.pdf", order_number, on.format("%Y%m%d"))
}

#[derive(Clone)]
pub struct ReportComposer {
    db: Arc<DbPool>,
    config: ReportConfig,
    tax_rate: Decimal,
    renderer: Arc<dyn DocumentRenderer>,
}

impl ReportComposer {
    pub fn new(db: Arc<DbPool>, config: ReportConfig, tax_rate: Decimal) -> Self {
        Self::with_renderer(db, config, tax_rate, Arc::new(TypstRenderer))
    }

    pub fn with_renderer(
        db: Arc<DbPool>,
        config: ReportConfig,
        tax_rate: Decimal,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            db,
            config,
            tax_rate,
            renderer,
        }
    }

    /// Reads everything the report prints for an active order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn build_model(&self, order_id: i32) -> Result<OrderDocument, ServiceError> {
        let db = &*self.db;

        let order = work_order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| ServiceError::db("load work order for report", e))?
            .filter(|o| o.active)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let customer = lookups::require_customer(db, order.customer_id).await?;
        let vehicle = lookups::require_vehicle(db, order.vehicle_id).await?;
        let advisor = lookups::staff_name(db, Some(order.advisor_id)).await?;
        let order_type = lookups::order_type_name(db, order.order_type_id).await?;
        let styles = lookups::work_status_styles(db).await?;

        let items = order_work_item::Entity::find()
            .filter(order_work_item::Column::WorkOrderId.eq(order_id))
            .filter(order_work_item::Column::Active.eq(true))
            .order_by_asc(order_work_item::Column::Id)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("load work items for report", e))?;

        let parts = purchased_part::Entity::find()
            .filter(purchased_part::Column::OrderWorkItemId.is_in(items.iter().map(|i| i.id)))
            .order_by_asc(purchased_part::Column::Id)
            .all(db)
            .await
            .map_err(|e| ServiceError::db("load parts for report", e))?;

        let technicians =
            lookups::staff_names_by_id(db, items.iter().filter_map(|i| i.technician_id)).await?;

        let checklist = service_checklist::Entity::find()
            .filter(service_checklist::Column::WorkOrderId.eq(order_id))
            .one(db)
            .await
            .map_err(|e| ServiceError::db("load checklist for report", e))?
            .map(ChecklistView::from);

        let work_items: Vec<DocumentWorkItem> = items
            .iter()
            .map(|item| {
                let item_parts: Vec<purchased_part::Model> = parts
                    .iter()
                    .filter(|p| p.order_work_item_id == Some(item.id))
                    .cloned()
                    .collect();
                let status = sea_orm::ActiveEnum::to_value(&item.status);
                let status_name = styles
                    .get(&status)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_else(|| item.status.label().to_string());
                DocumentWorkItem::new(
                    item,
                    item.technician_id
                        .and_then(|id| technicians.get(&id).cloned()),
                    status_name,
                    &item_parts,
                )
            })
            .collect();

        let totals = DocumentTotals::new(
            &work_items,
            order.cost_total,
            order.cost_total_with_tax,
            self.tax_rate,
        );

        Ok(OrderDocument {
            header: DocumentHeader {
                order_number: order.order_number,
                order_type,
                status: order.status.label().to_string(),
                created_at: order.created_at,
                promised_delivery_at: order.promised_delivery_at,
                finished_at: order.finished_at,
                delivered_at: order.delivered_at,
            },
            customer: CustomerBlock {
                name: customer.full_name,
                tax_id: customer.tax_id,
                phone: customer.mobile_phone,
                email: customer.email,
                address: customer.address,
            },
            vehicle: VehicleBlock {
                description: vehicle.short_description(),
                vin: vehicle.vin,
                plates: vehicle.plates,
                color: vehicle.color,
                odometer: order.odometer,
            },
            advisor,
            work_items,
            checklist,
            totals,
            advisor_notes: order.advisor_notes,
            shop_manager_notes: order.shop_manager_notes,
            progress: DocumentProgress {
                total_work_items: order.total_work_items,
                completed_work_items: order.completed_work_items,
                percent: order.progress,
            },
            edition_notice: match self.config.license_mode {
                LicenseMode::Community => Some(COMMUNITY_NOTICE.to_string()),
                LicenseMode::Professional => None,
            },
            generated_at: local_now(),
        })
    }

    async fn render(&self, document: OrderDocument) -> Result<Vec<u8>, ServiceError> {
        let renderer = Arc::clone(&self.renderer);
        tokio::task::spawn_blocking(move || renderer.render(&document))
            .await
            .map_err(|e| ServiceError::ReportError(format!("render task failed: {}", e)))?
    }

    /// Builds and renders the report for an order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn download(&self, order_id: i32) -> Result<RenderedReport, ServiceError> {
        let document = self.build_model(order_id).await?;
        let order_number = document.header.order_number.clone();
        let file_name = report_file_name(&order_number, document.generated_at.date());

        let bytes = self.render(document).await?;
        info!(order_number = %order_number, size = bytes.len(), "work order report rendered");

        Ok(RenderedReport {
            order_number,
            file_name,
            content_type: self.renderer.content_type(),
            bytes,
        })
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn preview(&self, order_id: i32) -> Result<ReportPreview, ServiceError> {
        let report = self.download(order_id).await?;
        Ok(ReportPreview {
            order_number: report.order_number,
            file_name: report.file_name,
            pdf_base64: STANDARD.encode(&report.bytes),
        })
    }

    /// Writes the report under `{output_directory}/{order_number}/`.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn save(&self, order_id: i32) -> Result<SavedReport, ServiceError> {
        let report = self.download(order_id).await?;
        let directory = self.config.output_directory.join(&report.order_number);
        tokio::fs::create_dir_all(&directory).await.map_err(|e| {
            ServiceError::ReportError(format!("create {}: {}", directory.display(), e))
        })?;

        let path = directory.join(&report.file_name);
        tokio::fs::write(&path, &report.bytes)
            .await
            .map_err(|e| ServiceError::ReportError(format!("write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), "work order report saved");
        Ok(SavedReport {
            order_number: report.order_number,
            file_name: report.file_name,
            path,
            size_bytes: report.bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn file_name_carries_number_and_date() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(
            report_file_name("SRV-000012", day),
            "Order_SRV-000012_20250110.pdf"
        );
    }
}
