//! Sale entity - An in-person sale rung up by an agrovet.
//!
//! Mirrors the order/item split: `total_amount` equals the sum of the
//! sale's item subtotals.

use super::order::PaymentMethod;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Selling agrovet
    pub agrovet_id: i64,
    /// Known customer, if any
    pub customer_id: Option<i64>,
    /// Sum of item subtotals
    pub total_amount: f64,
    /// How the customer paid
    pub payment_method: PaymentMethod,
    /// Printed receipt number, unique
    #[sea_orm(unique)]
    pub receipt_number: String,
    /// When the sale happened
    pub sale_date: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale may belong to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// One sale has many items
    #[sea_orm(has_many = "super::sale_item::Entity")]
    SaleItems,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
