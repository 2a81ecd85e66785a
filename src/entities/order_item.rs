//! Order item entity - A price snapshot of one product within an order.
//!
//! `unit_price` and `product_name` are copied at checkout so later catalog
//! edits never change a placed order. `subtotal == unit_price * quantity`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Parent order
    pub order_id: i64,
    /// Product sold; kept nullable so history survives product removal
    pub product_id: Option<i64>,
    /// Product name at the time of checkout
    pub product_name: String,
    /// Units sold
    pub quantity: i32,
    /// Price per unit at the time of checkout
    pub unit_price: f64,
    /// `unit_price * quantity`
    pub subtotal: f64,
}

/// Defines relationships between `OrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
