//! Data handed to a [`DocumentRenderer`](super::DocumentRenderer) for one
//! work-order report. Every block is present; absent values are `None`.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::entities::{order_work_item, purchased_part};
use crate::services::work_orders::ChecklistView;

#[derive(Debug, Clone, Serialize)]
pub struct OrderDocument {
    pub header: DocumentHeader,
    pub customer: CustomerBlock,
    pub vehicle: VehicleBlock,
    pub advisor: Option<String>,
    pub work_items: Vec<DocumentWorkItem>,
    pub checklist: Option<ChecklistView>,
    pub totals: DocumentTotals,
    pub advisor_notes: Option<String>,
    pub shop_manager_notes: Option<String>,
    pub progress: DocumentProgress,
    /// Footer line printed by community installations
    pub edition_notice: Option<String>,
    pub generated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentHeader {
    pub order_number: String,
    pub order_type: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub promised_delivery_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    pub delivered_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerBlock {
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleBlock {
    pub description: String,
    pub vin: String,
    pub plates: Option<String>,
    pub color: Option<String>,
    pub odometer: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentPart {
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<&purchased_part::Model> for DocumentPart {
    fn from(part: &purchased_part::Model) -> Self {
        Self {
            description: part.description.clone(),
            quantity: part.quantity,
            unit_price: part.unit_cost,
            line_total: part.total_cost().round_dp(2),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentWorkItem {
    pub description: String,
    pub technician: Option<String>,
    pub status: String,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
    /// "Xh Ym"
    pub duration: Option<String>,
    pub labor_cost: Decimal,
    pub parts_total: Decimal,
    pub parts: Vec<DocumentPart>,
    pub technician_comments: Option<String>,
}

impl DocumentWorkItem {
    pub fn new(
        item: &order_work_item::Model,
        technician: Option<String>,
        status: String,
        parts: &[purchased_part::Model],
    ) -> Self {
        Self {
            description: item.description.clone(),
            technician,
            status,
            started_at: item.started_at,
            finished_at: item.finished_at,
            duration: item.duration_label(),
            labor_cost: item.labor_cost,
            parts_total: item.parts_total,
            parts: parts.iter().map(DocumentPart::from).collect(),
            technician_comments: item.technician_comments.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentTotals {
    pub parts: Decimal,
    pub labor: Decimal,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

impl DocumentTotals {
    /// Parts and labor are summed from the printed items. Subtotal and grand
    /// total are the order's finalized figures, so an order whose costs were
    /// never finalized prints zero there.
    pub fn new(
        items: &[DocumentWorkItem],
        subtotal: Decimal,
        grand_total: Decimal,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            parts: items.iter().map(|i| i.parts_total).sum::<Decimal>().round_dp(2),
            labor: items.iter().map(|i| i.labor_cost).sum::<Decimal>().round_dp(2),
            subtotal,
            tax_rate,
            tax: (subtotal * tax_rate).round_dp(2),
            grand_total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentProgress {
    pub total_work_items: i32,
    pub completed_work_items: i32,
    pub percent: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn work_item(labor: Decimal, parts: Decimal) -> DocumentWorkItem {
        DocumentWorkItem {
            description: "Brake pads".into(),
            technician: None,
            status: "Completed".into(),
            started_at: None,
            finished_at: None,
            duration: None,
            labor_cost: labor,
            parts_total: parts,
            parts: Vec::new(),
            technician_comments: None,
        }
    }

    #[test]
    fn totals_split_parts_and_labor() {
        let items = vec![work_item(dec!(300), dec!(150)), work_item(dec!(0), dec!(0))];
        let totals = DocumentTotals::new(&items, dec!(450.00), dec!(522.00), dec!(0.16));

        assert_eq!(totals.parts, dec!(150));
        assert_eq!(totals.labor, dec!(300));
        assert_eq!(totals.tax, dec!(72.00));
        assert_eq!(totals.grand_total, dec!(522.00));
    }

    #[test]
    fn part_lines_use_unit_cost() {
        let part = purchased_part::Model {
            id: 1,
            appointment_work_item_id: None,
            order_work_item_id: Some(2),
            description: "Oil filter".into(),
            quantity: 3,
            unit_cost: dec!(12.50),
            unit_sale_price: Some(dec!(20)),
            purchased_at: NaiveDate::from_ymd_opt(2025, 1, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            transferred: true,
        };
        let line = DocumentPart::from(&part);
        assert_eq!(line.unit_price, dec!(12.50));
        assert_eq!(line.line_total, dec!(37.50));
    }
}
