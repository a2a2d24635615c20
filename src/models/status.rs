use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Order status codes, seeded in `order_statuses`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(num_value = 1)]
    Pending,
    #[sea_orm(num_value = 2)]
    Assigned,
    #[sea_orm(num_value = 3)]
    InProgress,
    #[sea_orm(num_value = 4)]
    Delivered,
    #[sea_orm(num_value = 5)]
    Cancelled,
}

impl OrderStatus {
    /// Statuses shown on the advisor and shop-manager boards.
    pub const OPEN: [OrderStatus; 3] = [Self::Pending, Self::Assigned, Self::InProgress];

    pub fn is_open(self) -> bool {
        Self::OPEN.contains(&self)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Work item status codes, seeded with a colour in `work_statuses`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkStatus {
    #[sea_orm(num_value = 1)]
    Pending,
    #[sea_orm(num_value = 2)]
    Assigned,
    #[sea_orm(num_value = 3)]
    InProgress,
    #[sea_orm(num_value = 4)]
    Completed,
    #[sea_orm(num_value = 5)]
    Paused,
    #[sea_orm(num_value = 6)]
    Cancelled,
}

impl WorkStatus {
    /// Statuses that stay on the technician board regardless of date.
    pub const ON_BOARD: [WorkStatus; 3] = [Self::Assigned, Self::InProgress, Self::Paused];

    /// Statuses an order cancellation forces to `Cancelled`.
    pub const CANCELLABLE: [WorkStatus; 2] = [Self::Pending, Self::Assigned];

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Paused => "Paused",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Default badge colour, mirrored in the `work_statuses` seed.
    pub fn color(self) -> &'static str {
        match self {
            Self::Pending => "#9E9E9E",
            Self::Assigned => "#2196F3",
            Self::InProgress => "#FF9800",
            Self::Completed => "#4CAF50",
            Self::Paused => "#FFC107",
            Self::Cancelled => "#F44336",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveEnum;
    use std::str::FromStr;

    #[test]
    fn status_codes_match_reference_tables() {
        assert_eq!(OrderStatus::Pending.to_value(), 1);
        assert_eq!(OrderStatus::Delivered.to_value(), 4);
        assert_eq!(OrderStatus::Cancelled.to_value(), 5);
        assert_eq!(WorkStatus::Completed.to_value(), 4);
        assert_eq!(WorkStatus::Paused.to_value(), 5);
        assert_eq!(WorkStatus::Cancelled.to_value(), 6);
        assert_eq!(WorkStatus::try_from_value(&3).unwrap(), WorkStatus::InProgress);
    }

    #[test]
    fn board_membership() {
        assert!(OrderStatus::InProgress.is_open());
        assert!(!OrderStatus::Delivered.is_open());
        assert!(WorkStatus::ON_BOARD.contains(&WorkStatus::Paused));
        assert!(!WorkStatus::CANCELLABLE.contains(&WorkStatus::InProgress));
    }

    #[test]
    fn display_round_trips_through_strum() {
        assert_eq!(WorkStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            OrderStatus::from_str("delivered").unwrap(),
            OrderStatus::Delivered
        );
    }
}
