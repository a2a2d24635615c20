//! PDF rendering through an embedded Typst template.
//!
//! The template is compiled against a sandboxed [`World`] that exposes the
//! bundled fonts and nothing from the filesystem. The report data is bound
//! to the global `data` before compilation.

use std::cell::RefCell;

use chrono::NaiveDateTime;
use comemo::Prehashed;
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};
use typst::{
    diag::{FileError, FileResult},
    eval::Tracer,
    foundations::{Bytes, Datetime, Smart, Value},
    syntax::{FileId, Source},
    text::{Font, FontBook},
    Library, World,
};

use super::model::{DocumentPart, DocumentWorkItem, OrderDocument};
use super::DocumentRenderer;
use crate::errors::ServiceError;

const TEMPLATE: &str = include_str!("../../templates/work_order.typ");

thread_local! {
    static WORLD: RefCell<Sandbox> = RefCell::new(Sandbox::new());
}

#[derive(Clone)]
struct Sandbox {
    source: Source,
    library: Prehashed<Library>,
    book: Prehashed<FontBook>,
    fonts: Vec<Font>,
    time: time::OffsetDateTime,
}

impl Sandbox {
    fn new() -> Self {
        let mut book = FontBook::new();
        let mut fonts = Vec::new();
        for data in typst_assets::fonts() {
            for font in Font::iter(Bytes::from_static(data)) {
                book.push(font.info().clone());
                fonts.push(font);
            }
        }

        Self {
            source: Source::detached(TEMPLATE),
            library: Prehashed::new(Library::builder().build()),
            book: Prehashed::new(book),
            fonts,
            time: time::OffsetDateTime::now_utc(),
        }
    }

    fn with_data(&self, data: Value) -> Self {
        let mut world = self.clone();
        world
            .library
            .update(|l| l.global.scope_mut().define("data", data));
        world.time = time::OffsetDateTime::now_utc();
        world
    }
}

impl World for Sandbox {
    fn library(&self) -> &Prehashed<Library> {
        &self.library
    }

    fn book(&self) -> &Prehashed<FontBook> {
        &self.book
    }

    fn main(&self) -> Source {
        self.source.clone()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.source.id() {
            Ok(self.source.clone())
        } else {
            Err(FileError::AccessDenied)
        }
    }

    fn file(&self, _id: FileId) -> FileResult<Bytes> {
        Err(FileError::AccessDenied)
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let offset = time::UtcOffset::from_hms(offset.unwrap_or(0).try_into().ok()?, 0, 0).ok()?;
        let time = self.time.checked_to_offset(offset)?;
        Some(Datetime::Date(time.date()))
    }
}

fn money(value: Decimal) -> String {
    let value = value.round_dp(2);
    let negative = value.is_sign_negative();
    let text = format!("{:.2}", value.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, cents)
}

fn date_time(value: NaiveDateTime) -> String {
    value.format("%d/%m/%Y %H:%M").to_string()
}

fn opt_date_time(value: Option<NaiveDateTime>) -> Option<String> {
    value.map(date_time)
}

fn part_json(part: &DocumentPart) -> JsonValue {
    json!({
        "description": part.description,
        "quantity": part.quantity,
        "unit_price": money(part.unit_price),
        "line_total": money(part.line_total),
    })
}

fn work_item_json(item: &DocumentWorkItem) -> JsonValue {
    json!({
        "description": item.description,
        "technician": item.technician,
        "status": item.status,
        "started_at": opt_date_time(item.started_at),
        "finished_at": opt_date_time(item.finished_at),
        "duration": item.duration,
        "labor_cost": money(item.labor_cost),
        "parts_total": money(item.parts_total),
        "parts": item.parts.iter().map(part_json).collect::<Vec<_>>(),
        "technician_comments": item.technician_comments,
    })
}

/// Display-ready view of the document, bound as `data` in the template.
fn template_data(doc: &OrderDocument) -> JsonValue {
    let tax_percent = (doc.totals.tax_rate * Decimal::ONE_HUNDRED).normalize();
    json!({
        "header": {
            "order_number": doc.header.order_number,
            "order_type": doc.header.order_type,
            "status": doc.header.status,
            "created_at": date_time(doc.header.created_at),
            "promised_delivery_at": date_time(doc.header.promised_delivery_at),
            "finished_at": opt_date_time(doc.header.finished_at),
            "delivered_at": opt_date_time(doc.header.delivered_at),
        },
        "customer": doc.customer,
        "vehicle": {
            "description": doc.vehicle.description,
            "vin": doc.vehicle.vin,
            "plates": doc.vehicle.plates,
            "color": doc.vehicle.color,
            "odometer": format!("{} km", doc.vehicle.odometer),
        },
        "advisor": doc.advisor,
        "work_items": doc.work_items.iter().map(work_item_json).collect::<Vec<_>>(),
        "checklist": doc.checklist,
        "totals": {
            "parts": money(doc.totals.parts),
            "labor": money(doc.totals.labor),
            "subtotal": money(doc.totals.subtotal),
            "tax_label": format!("Tax ({}%)", tax_percent),
            "tax": money(doc.totals.tax),
            "grand_total": money(doc.totals.grand_total),
        },
        "advisor_notes": doc.advisor_notes,
        "shop_manager_notes": doc.shop_manager_notes,
        "progress": {
            "completed": doc.progress.completed_work_items,
            "total": doc.progress.total_work_items,
            "percent": format!("{}%", doc.progress.percent.normalize()),
        },
        "edition_notice": doc.edition_notice,
        "generated_at": date_time(doc.generated_at),
    })
}

/// Renders work-order reports to PDF with Typst.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypstRenderer;

impl DocumentRenderer for TypstRenderer {
    fn render(&self, document: &OrderDocument) -> Result<Vec<u8>, ServiceError> {
        let data: Value = serde_json::from_value(template_data(document))
            .map_err(|e| ServiceError::ReportError(format!("report data: {}", e)))?;

        let world = WORLD.with_borrow(|w| w.with_data(data));
        let mut tracer = Tracer::default();
        let compiled = typst::compile(&world, &mut tracer).map_err(|diagnostics| {
            let messages: Vec<String> = diagnostics
                .iter()
                .map(|d| d.message.to_string())
                .collect();
            ServiceError::ReportError(format!("template compilation: {}", messages.join("; ")))
        })?;

        Ok(typst_pdf::pdf(&compiled, Smart::Auto, None))
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0), "$0.00")]
    #[case(dec!(522), "$522.00")]
    #[case(dec!(1234.5), "$1,234.50")]
    #[case(dec!(1234567.891), "$1,234,567.89")]
    #[case(dec!(-80.1), "-$80.10")]
    fn money_formatting(#[case] value: Decimal, #[case] expected: &str) {
        assert_eq!(money(value), expected);
    }
}
