//! Community post entity - A question, discussion, tip or announcement.
//!
//! Follower and upvote counts are never stored here; they are counted from
//! the `post_follows` and `post_upvotes` join tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What kind of post this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PostType {
    /// Asks for help; can be resolved by accepting an answer
    #[sea_orm(string_value = "question")]
    Question,
    /// Open-ended discussion
    #[sea_orm(string_value = "discussion")]
    Discussion,
    /// Farming tip
    #[sea_orm(string_value = "tip")]
    Tip,
    /// Announcement from an officer, institution or agrovet
    #[sea_orm(string_value = "announcement")]
    Announcement,
}

/// Community post database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "community_posts")]
pub struct Model {
    /// Unique identifier for the post
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Author
    pub author_id: i64,
    /// Headline
    pub title: String,
    /// Body
    pub content: String,
    /// Kind of post
    pub post_type: PostType,
    /// Topic (crops, livestock, marketing, ...)
    pub category: String,
    /// Number of times the post was opened
    pub views: i32,
    /// Set when an answer is accepted or the author marks it resolved
    pub is_resolved: bool,
    /// When the post was created
    pub created_at: DateTimeUtc,
    /// Last activity (edit or new answer)
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `CommunityPost` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One post has many answers
    #[sea_orm(has_many = "super::post_answer::Entity")]
    Answers,
    /// One post has many follows
    #[sea_orm(has_many = "super::post_follow::Entity")]
    Follows,
}

impl Related<super::post_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl Related<super::post_follow::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Follows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
