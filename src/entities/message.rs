//! Message entity - Direct messages between two users, optionally about a product.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Message database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    /// Unique identifier for the message
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sender
    pub sender_id: i64,
    /// Receiver
    pub receiver_id: i64,
    /// Message body
    pub content: String,
    /// Product the message asks about, if any
    pub product_id: Option<i64>,
    /// Whether the receiver has read it
    pub is_read: bool,
    /// When it was sent
    pub created_at: DateTimeUtc,
}

/// Messages are looked up by sender/receiver ids only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
