//! AnswerUpvote entity - One user's upvote on an answer.
//!
//! A unique index on `(answer_id, user_id)` makes this a set, not a counter.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `AnswerUpvote` database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "answer_upvotes")]
pub struct Model {
    /// Unique identifier for the row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Target answer
    pub answer_id: i64,
    /// Acting user
    pub user_id: i64,
    /// When the row was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `AnswerUpvote` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row points at one answer
    #[sea_orm(
        belongs_to = "super::post_answer::Entity",
        from = "Column::AnswerId",
        to = "super::post_answer::Column::Id"
    )]
    Answer,
}

impl Related<super::post_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
