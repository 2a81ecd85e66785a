//! User review entity - A 1-5 star rating one user leaves on another.
//!
//! A unique index on `(user_id, reviewer_id)` allows one review per pair.

use super::user::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User review database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_reviews")]
pub struct Model {
    /// Unique identifier for the review
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User being reviewed
    pub user_id: i64,
    /// User writing the review
    pub reviewer_id: i64,
    /// Stars, 1 to 5
    pub rating: i32,
    /// Optional text
    pub review_text: Option<String>,
    /// Role of the reviewed user when the review was written
    pub user_role: Role,
    /// Moderation flag
    pub is_approved: bool,
    /// When the review was written
    pub created_at: DateTimeUtc,
}

/// `UserReview` has no navigable relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
