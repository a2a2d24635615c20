use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::{errors::ServiceError, ApiResponse};

/// Header naming the staff member acting on the request.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Acting staff member (scheduler or advisor), read from `X-User-Id`.
/// Identification only; requests are not authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for StaffId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ServiceError::ValidationError("X-User-Id header is required".into()))?;

        raw.to_str()
            .ok()
            .and_then(|value| value.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .map(StaffId)
            .ok_or_else(|| {
                ServiceError::ValidationError("X-User-Id must be a positive integer".into())
            })
    }
}

/// `?date=YYYY-MM-DD`; today when absent.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    #[param(value_type = Option<String>, example = "2025-01-10")]
    pub date: Option<NaiveDate>,
}

/// Selects which kind of work item a parts route addresses.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnerQuery {
    /// `true` for an order work item, `false` (default) for an appointment work item
    #[serde(default)]
    pub order_scoped: bool,
}

/// Standard success response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Standard created response
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<StaffId, ServiceError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        StaffId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_staff_id_from_header() {
        assert_eq!(extract(Some("7")).await.unwrap(), StaffId(7));
        assert_eq!(extract(Some(" 12 ")).await.unwrap(), StaffId(12));
    }

    #[tokio::test]
    async fn rejects_missing_or_malformed_header() {
        assert_matches!(extract(None).await, Err(ServiceError::ValidationError(_)));
        assert_matches!(extract(Some("abc")).await, Err(ServiceError::ValidationError(_)));
        assert_matches!(extract(Some("0")).await, Err(ServiceError::ValidationError(_)));
    }
}
