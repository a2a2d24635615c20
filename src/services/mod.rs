// Shop-floor lifecycles
pub mod appointments;
pub mod work_orders;

// Parts purchasing
pub mod parts;

// Maintenance reminders
pub mod reminders;

pub(crate) mod lookups;

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Shop-local wall clock. Scheduled times are stored without a zone and are
/// compared against this.
pub(crate) fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// `[date 00:00, date+1 00:00)` as naive bounds.
pub(crate) fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(chrono::NaiveTime::MIN);
    (start, start + chrono::Duration::days(1))
}
