//! Reference checks shared by the lifecycle services.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::{customer, order_type, service_type, staff_member, vehicle, work_status};
use crate::errors::ServiceError;

pub(crate) async fn require_customer<C>(conn: &C, id: i32) -> Result<customer::Model, ServiceError>
where
    C: ConnectionTrait,
{
    customer::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load customer", e))?
        .filter(|c| c.active)
        .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))
}

pub(crate) async fn require_vehicle<C>(conn: &C, id: i32) -> Result<vehicle::Model, ServiceError>
where
    C: ConnectionTrait,
{
    vehicle::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load vehicle", e))?
        .filter(|v| v.active)
        .ok_or_else(|| ServiceError::NotFound(format!("Vehicle {} not found", id)))
}

pub(crate) async fn require_staff<C>(conn: &C, id: i32) -> Result<staff_member::Model, ServiceError>
where
    C: ConnectionTrait,
{
    staff_member::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load staff member", e))?
        .filter(|s| s.active)
        .ok_or_else(|| ServiceError::NotFound(format!("Staff member {} not found", id)))
}

pub(crate) async fn require_order_type<C>(
    conn: &C,
    id: i32,
) -> Result<order_type::Model, ServiceError>
where
    C: ConnectionTrait,
{
    order_type::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load order type", e))?
        .ok_or_else(|| ServiceError::NotFound(format!("Order type {} not found", id)))
}

pub(crate) async fn require_service_type<C>(
    conn: &C,
    id: Option<i32>,
) -> Result<Option<service_type::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let Some(id) = id else {
        return Ok(None);
    };
    service_type::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load service type", e))?
        .map(Some)
        .ok_or_else(|| ServiceError::NotFound(format!("Service type {} not found", id)))
}

/// Display name of an optional staff reference.
pub(crate) async fn staff_name<C>(conn: &C, id: Option<i32>) -> Result<Option<String>, ServiceError>
where
    C: ConnectionTrait,
{
    let Some(id) = id else {
        return Ok(None);
    };
    Ok(staff_member::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load staff name", e))?
        .map(|s| s.full_name))
}

pub(crate) async fn order_type_name<C>(conn: &C, id: i32) -> Result<String, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(order_type::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load order type name", e))?
        .map(|t| t.name)
        .unwrap_or_else(|| format!("Type {}", id)))
}

pub(crate) async fn service_type_name<C>(
    conn: &C,
    id: Option<i32>,
) -> Result<Option<String>, ServiceError>
where
    C: ConnectionTrait,
{
    let Some(id) = id else {
        return Ok(None);
    };
    Ok(service_type::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load service type name", e))?
        .map(|t| t.name))
}

/// Every order type name by id. The table is a short seeded list.
pub(crate) async fn order_type_names<C>(conn: &C) -> Result<HashMap<i32, String>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(order_type::Entity::find()
        .all(conn)
        .await
        .map_err(|e| ServiceError::db("load order types", e))?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect())
}

pub(crate) async fn service_type_names<C>(conn: &C) -> Result<HashMap<i32, String>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(service_type::Entity::find()
        .all(conn)
        .await
        .map_err(|e| ServiceError::db("load service types", e))?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect())
}

pub(crate) async fn customers_by_id<C>(
    conn: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, customer::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let ids: Vec<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(customer::Entity::find()
        .filter(customer::Column::Id.is_in(ids))
        .all(conn)
        .await
        .map_err(|e| ServiceError::db("load customers", e))?
        .into_iter()
        .map(|c| (c.id, c))
        .collect())
}

pub(crate) async fn vehicles_by_id<C>(
    conn: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, vehicle::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let ids: Vec<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(vehicle::Entity::find()
        .filter(vehicle::Column::Id.is_in(ids))
        .all(conn)
        .await
        .map_err(|e| ServiceError::db("load vehicles", e))?
        .into_iter()
        .map(|v| (v.id, v))
        .collect())
}

pub(crate) async fn staff_names_by_id<C>(
    conn: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, ServiceError>
where
    C: ConnectionTrait,
{
    let ids: Vec<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(staff_member::Entity::find()
        .filter(staff_member::Column::Id.is_in(ids))
        .all(conn)
        .await
        .map_err(|e| ServiceError::db("load staff names", e))?
        .into_iter()
        .map(|s| (s.id, s.full_name))
        .collect())
}

/// Display name and colour per work status code.
pub(crate) async fn work_status_styles<C>(
    conn: &C,
) -> Result<HashMap<i32, (String, String)>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(work_status::Entity::find()
        .all(conn)
        .await
        .map_err(|e| ServiceError::db("load work statuses", e))?
        .into_iter()
        .map(|s| (s.id, (s.name, s.color)))
        .collect())
}
