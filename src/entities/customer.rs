//! Customer entity - A walk-in customer recorded by one agrovet's point of sale.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Agrovet whose customer this is
    pub agrovet_id: i64,
    /// Customer name
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Postal or physical address
    pub address: Option<String>,
    /// regular, wholesale, retail...
    pub customer_type: Option<String>,
    /// Running total of recorded sales
    pub total_purchases: f64,
    /// Date of the most recent sale
    pub last_purchase: Option<DateTimeUtc>,
    /// Free-text notes
    pub notes: Option<String>,
    /// When the customer was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer has many sales
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
