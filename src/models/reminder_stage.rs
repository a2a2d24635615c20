use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// The three reminder notices sent ahead of a vehicle's next service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStage {
    First,
    Second,
    Third,
}

impl ReminderStage {
    pub const ALL: [ReminderStage; 3] = [Self::First, Self::Second, Self::Third];

    pub fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::First => "First Reminder",
            Self::Second => "Second Reminder",
            Self::Third => "Third Reminder",
        }
    }
}

impl TryFrom<u8> for ReminderStage {
    type Error = ServiceError;

    fn try_from(stage: u8) -> Result<Self, Self::Error> {
        match stage {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            3 => Ok(Self::Third),
            other => Err(ServiceError::ValidationError(format!(
                "Invalid reminder stage {}; expected 1, 2 or 3",
                other
            ))),
        }
    }
}

/// The label of the service that follows `service_type_id`.
pub fn next_service_label(service_type_id: i32) -> &'static str {
    match service_type_id {
        1 => "Second Service",
        2 => "Third Service",
        _ => "External Service",
    }
}
