//! Notification entity - Append-only per-user messages with a read flag.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Severity/flavour of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum NotificationType {
    /// Neutral information
    #[sea_orm(string_value = "info")]
    Info,
    /// Something went well (answer accepted, order delivered)
    #[sea_orm(string_value = "success")]
    Success,
    /// Needs attention (low stock, cancellation)
    #[sea_orm(string_value = "warning")]
    Warning,
    /// Something failed
    #[sea_orm(string_value = "error")]
    Error,
}

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier for the notification
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient
    pub user_id: i64,
    /// Short headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Flavour
    pub notification_type: NotificationType,
    /// Optional in-app link
    pub link: Option<String>,
    /// Id of the order, post, report... that triggered it
    pub related_id: Option<i64>,
    /// Whether the recipient has seen it
    pub is_read: bool,
    /// When it was emitted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Notification and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each notification belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
