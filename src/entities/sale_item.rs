//! Sale item entity - Price snapshot of one product within a POS sale.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub sale_id: i64,
    /// Product sold; nullable so history survives product removal
    pub product_id: Option<i64>,
    /// Name at the time of sale
    pub product_name: String,
    pub quantity: i32,
    /// Price per unit at the time of sale
    pub unit_price: f64,
    /// `unit_price * quantity`
    pub subtotal: f64,
}

/// Defines relationships between `SaleItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one sale
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
