//! Post answer entity - A reply to a community post.
//!
//! At most one answer per post has `is_accepted = true`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post answer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post_answers")]
pub struct Model {
    /// Unique identifier for the answer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Post being answered
    pub post_id: i64,
    /// Author of the answer
    pub author_id: i64,
    /// Answer text
    pub content: String,
    /// Whether the post author accepted this answer
    pub is_accepted: bool,
    /// When the answer was posted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `PostAnswer` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each answer belongs to one post
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
