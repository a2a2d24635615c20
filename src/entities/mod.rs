// Reference data
pub mod customer;
pub mod order_status;
pub mod order_type;
pub mod service_type;
pub mod staff_member;
pub mod vehicle;
pub mod work_status;

// Appointments
pub mod appointment;
pub mod appointment_work_item;

// Work orders
pub mod order_work_item;
pub mod service_checklist;
pub mod work_order;

// Parts and reminders
pub mod next_service_reminder;
pub mod purchased_part;
