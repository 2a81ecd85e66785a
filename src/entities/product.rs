//! Product entity - An agrovet's inventory item.
//!
//! `quantity` is the sellable stock on hand and must never go negative; every
//! decrement goes through `core::product::adjust_stock`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning agrovet
    pub agrovet_id: i64,
    /// Product name (e.g., "DAP Fertilizer 50kg")
    pub name: String,
    /// Category (seeds, fertilizers, pesticides, tools, ...)
    pub category: Option<String>,
    /// Longer description shown in the catalog
    pub description: Option<String>,
    /// Units on hand
    pub quantity: i32,
    /// Selling unit (kg, litre, packet, ...)
    pub unit: Option<String>,
    /// Current selling price per unit
    pub price: f64,
    /// Purchase cost per unit
    pub cost_price: Option<f64>,
    /// Stock level at or below which the product counts as low
    pub reorder_level: i32,
    /// Supplier name
    pub supplier: Option<String>,
    /// Stock keeping unit, unique across the platform
    #[sea_orm(unique)]
    pub sku: String,
    /// Soft delete flag - hidden from the catalog, kept for order history
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one agrovet
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AgrovetId",
        to = "super::user::Column::Id"
    )]
    Agrovet,
    /// One product sits in many carts
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agrovet.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
