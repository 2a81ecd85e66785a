//! Order entity - One buyer's purchase from exactly one agrovet.
//!
//! A checkout over a multi-seller cart produces one order per seller.
//! `total_amount` always equals the sum of the order's item subtotals.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of an order.
///
/// `pending -> processing -> shipped -> delivered`, and
/// `pending | processing -> cancelled`. `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    /// Placed, not yet handled by the agrovet
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Being prepared
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Handed to delivery
    #[sea_orm(string_value = "shipped")]
    Shipped,
    /// Received by the buyer
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Called off before shipping
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (Self::Pending | Self::Processing, Self::Cancelled)
        )
    }

    /// Stored lowercase value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

/// How the buyer pays; shared by online orders and POS sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentMethod {
    /// Cash on delivery or at the counter
    #[sea_orm(string_value = "cash")]
    Cash,
    /// M-Pesa mobile money
    #[sea_orm(string_value = "mpesa")]
    Mpesa,
    /// Card payment
    #[sea_orm(string_value = "card")]
    Card,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Buyer who placed the order
    pub buyer_id: i64,
    /// Agrovet fulfilling the order
    pub agrovet_id: i64,
    /// Human-facing order number, unique
    #[sea_orm(unique)]
    pub order_number: String,
    /// Sum of the item subtotals
    pub total_amount: f64,
    /// Where to deliver
    pub shipping_address: String,
    /// Buyer contact phone for delivery
    pub phone: Option<String>,
    /// Payment method chosen at checkout
    pub payment_method: PaymentMethod,
    /// Free-text notes from the buyer
    pub notes: Option<String>,
    /// Current status
    pub status: OrderStatus,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// When the status last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
