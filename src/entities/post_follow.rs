//! Post follow entity - Subscribes a user to activity on a post.
//!
//! Followers receive a notification when the post gets a new answer or is
//! resolved. Authors follow their own posts automatically.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post follow database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post_follows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub post_id: i64,
    /// Follower
    pub user_id: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
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
