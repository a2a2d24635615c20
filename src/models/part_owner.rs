use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The work item a purchased part belongs to. Storage keeps two nullable
/// columns; exactly one of them is set, which this type makes structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "work_item_id", rename_all = "snake_case")]
pub enum PartOwner {
    #[serde(rename = "appointment")]
    AppointmentScoped(i32),
    #[serde(rename = "order")]
    OrderScoped(i32),
}

impl PartOwner {
    pub fn new(work_item_id: i32, order_scoped: bool) -> Self {
        if order_scoped {
            Self::OrderScoped(work_item_id)
        } else {
            Self::AppointmentScoped(work_item_id)
        }
    }

    /// Builds the owner from the two storage columns; `None` if both or neither are set.
    pub fn from_columns(
        appointment_work_item_id: Option<i32>,
        order_work_item_id: Option<i32>,
    ) -> Option<Self> {
        match (appointment_work_item_id, order_work_item_id) {
            (Some(id), None) => Some(Self::AppointmentScoped(id)),
            (None, Some(id)) => Some(Self::OrderScoped(id)),
            _ => None,
        }
    }

    /// `(appointment_work_item_id, order_work_item_id)`
    pub fn columns(self) -> (Option<i32>, Option<i32>) {
        match self {
            Self::AppointmentScoped(id) => (Some(id), None),
            Self::OrderScoped(id) => (None, Some(id)),
        }
    }

    pub fn work_item_id(self) -> i32 {
        match self {
            Self::AppointmentScoped(id) | Self::OrderScoped(id) => id,
        }
    }

    pub fn is_order_scoped(self) -> bool {
        matches!(self, Self::OrderScoped(_))
    }
}
