//! PostUpvote entity - One user's upvote on a post.
//!
//! A unique index on `(post_id, user_id)` makes this a set, not a counter.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `PostUpvote` database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post_upvotes")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Target post
    pub post_id: i64,
    /// Acting user
    pub user_id: i64,
    /// When the row was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `PostUpvote` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row points at one post
    #[sea_orm(
        belongs_to = "super::community_post::Entity",
        from = "Column::PostId",
        to = "super::community_post::Column::Id"
    )]
    Post,
}

impl Related<super::community_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
