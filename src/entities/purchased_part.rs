use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};

use crate::models::PartOwner;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchased_parts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub appointment_work_item_id: Option<i32>,
    pub order_work_item_id: Option<i32>,
    pub description: String,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub unit_sale_price: Option<Decimal>,
    pub purchased_at: DateTime,
    /// Linked to an order-level work item; the row is immutable from then on
    pub transferred: bool,
}

impl Model {
    pub fn owner(&self) -> Option<PartOwner> {
        PartOwner::from_columns(self.appointment_work_item_id, self.order_work_item_id)
    }

    pub fn total_cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_cost
    }

    pub fn total_sale(&self) -> Option<Decimal> {
        self.unit_sale_price
            .map(|price| Decimal::from(self.quantity) * price)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::appointment_work_item::Entity",
        from = "Column::AppointmentWorkItemId",
        to = "super::appointment_work_item::Column::Id"
    )]
    AppointmentWorkItem,
    #[sea_orm(
        belongs_to = "super::order_work_item::Entity",
        from = "Column::OrderWorkItemId",
        to = "super::order_work_item::Column::Id"
    )]
    OrderWorkItem,
}

impl Related<super::appointment_work_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppointmentWorkItem.def()
    }
}

impl Related<super::order_work_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderWorkItem.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            let set = |v: &ActiveValue<Option<i32>>| matches!(v, ActiveValue::Set(Some(_)));
            if set(&self.appointment_work_item_id) == set(&self.order_work_item_id) {
                return Err(DbErr::Custom(
                    "a purchased part must belong to exactly one work item".into(),
                ));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn part(quantity: i32, unit_cost: Decimal, sale: Option<Decimal>) -> Model {
        Model {
            id: 1,
            appointment_work_item_id: Some(3),
            order_work_item_id: None,
            description: "Oil filter".into(),
            quantity,
            unit_cost,
            unit_sale_price: sale,
            purchased_at: NaiveDate::from_ymd_opt(2025, 1, 10)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            transferred: false,
        }
    }

    #[test]
    fn totals_multiply_by_quantity() {
        let p = part(3, dec!(12.50), Some(dec!(20)));
        assert_eq!(p.total_cost(), dec!(37.50));
        assert_eq!(p.total_sale(), Some(dec!(60)));
        assert_eq!(part(2, dec!(5), None).total_sale(), None);
    }

    #[test]
    fn owner_comes_from_whichever_column_is_set() {
        assert_eq!(
            part(1, dec!(1), None).owner(),
            Some(PartOwner::AppointmentScoped(3))
        );
    }
}
