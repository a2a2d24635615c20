pub mod appointments;
pub mod common;
pub mod health;
pub mod parts;
pub mod reminders;
pub mod reports;
pub mod work_orders;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    reports::ReportComposer,
    services::{
        appointments::AppointmentService, parts::PartsService, reminders::ReminderService,
        work_orders::WorkOrderService,
    },
};

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub appointments: Arc<AppointmentService>,
    pub work_orders: Arc<WorkOrderService>,
    pub parts: Arc<PartsService>,
    pub reminders: Arc<ReminderService>,
    pub reports: Arc<ReportComposer>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        let tax_rate = config.tax_rate();
        Self::with_reports(
            db_pool.clone(),
            config,
            ReportComposer::new(db_pool, config.reports.clone(), tax_rate),
        )
    }

    /// Same as [`AppServices::new`] with a caller-supplied report composer,
    /// typically one with a different renderer.
    pub fn with_reports(db_pool: Arc<DbPool>, config: &AppConfig, reports: ReportComposer) -> Self {
        Self {
            appointments: Arc::new(AppointmentService::new(db_pool.clone())),
            work_orders: Arc::new(WorkOrderService::new(
                db_pool.clone(),
                config.tax_rate(),
                config.reminders.clone(),
            )),
            parts: Arc::new(PartsService::new(db_pool.clone())),
            reminders: Arc::new(ReminderService::new(db_pool, config.reminders.clone())),
            reports: Arc::new(reports),
        }
    }
}
