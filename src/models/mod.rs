//! Domain codes shared by entities, services and handlers.

pub mod order_kind;
pub mod part_owner;
pub mod reminder_stage;
pub mod status;

pub use order_kind::OrderKind;
pub use part_owner::PartOwner;
pub use reminder_stage::ReminderStage;
pub use status::{OrderStatus, WorkStatus};
