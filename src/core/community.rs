//! Community forum business logic - posts, answers, follows and upvotes.
//!
//! Follows and upvotes are uniqueness-constrained join rows; every count is
//! derived by counting rows. Operations that notify several users run in one
//! transaction together with the change that triggered them.

use crate::{
    core::{
        notification::{NewNotification, notify, notify_many},
        user::require_active,
    },
    entities::{
        AnswerUpvote, CommunityPost, NotificationType, PostAnswer, PostFollow, PostType,
        PostUpvote, answer_upvote, community_post, post_answer, post_follow, post_upvote, user,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info};

/// Fields for a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Headline
    pub title: String,
    /// Body
    pub content: String,
    /// Question, discussion, tip or announcement
    pub post_type: PostType,
    /// Topic (crops, livestock, ...)
    pub category: String,
}

/// Result of a follow or upvote toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggled {
    /// Whether the row exists after the toggle
    pub active: bool,
    /// Number of rows for the target after the toggle
    pub count: u64,
}

async fn get_post<C>(db: &C, post_id: i64) -> Result<community_post::Model>
where
    C: ConnectionTrait,
{
    CommunityPost::find_by_id(post_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("post", post_id))
}

async fn follower_ids<C>(db: &C, post_id: i64) -> Result<Vec<i64>>
where
    C: ConnectionTrait,
{
    let rows = PostFollow::find()
        .filter(post_follow::Column::PostId.eq(post_id))
        .order_by_asc(post_follow::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|f| f.user_id).collect())
}

/// Creates a post; its author automatically follows it.
pub async fn create_post(
    db: &DatabaseConnection,
    author: &user::Model,
    fields: NewPost,
) -> Result<community_post::Model> {
    require_active(author)?;
    let title = fields.title.trim().to_string();
    let content = fields.content.trim().to_string();
    if title.is_empty() || content.is_empty() {
        return Err(Error::validation("Title and content are required"));
    }

    let txn = db.begin().await?;
    let now = chrono::Utc::now();
    let post = community_post::ActiveModel {
        author_id: Set(author.id),
        title: Set(title),
        content: Set(content),
        post_type: Set(fields.post_type),
        category: Set(fields.category.trim().to_string()),
        views: Set(0),
        is_resolved: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    post_follow::ActiveModel {
        post_id: Set(post.id),
        user_id: Set(author.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(post_id = post.id, author_id = author.id, "Created post");
    Ok(post)
}

/// Counts one view of a post and returns the new total.
pub async fn record_view(db: &DatabaseConnection, post_id: i64) -> Result<i32> {
    let result = CommunityPost::update_many()
        .col_expr(
            community_post::Column::Views,
            Expr::col(community_post::Column::Views).add(1),
        )
        .filter(community_post::Column::Id.eq(post_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("post", post_id));
    }
    Ok(get_post(db, post_id).await?.views)
}

/// Adds an answer to a post.
///
/// The post's author is told about the answer unless they wrote it. Every
/// other follower except the answerer gets a follower notice.
pub async fn post_answer(
    db: &DatabaseConnection,
    author: &user::Model,
    post_id: i64,
    content: &str,
) -> Result<post_answer::Model> {
    require_active(author)?;
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::validation("Answer cannot be empty"));
    }

    let txn = db.begin().await?;
    let post = get_post(&txn, post_id).await?;
    let answer = post_answer::ActiveModel {
        post_id: Set(post.id),
        author_id: Set(author.id),
        content: Set(content.to_string()),
        is_accepted: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if post.author_id != author.id {
        let notice = NewNotification::info(
            "New Answer",
            format!("{} answered your post \"{}\"", author.full_name, post.title),
        )
        .related_to(post.id)
        .with_link(format!("/community/posts/{}", post.id));
        notify(&txn, post.author_id, notice).await?;
    }

    let recipients: Vec<i64> = follower_ids(&txn, post.id)
        .await?
        .into_iter()
        .filter(|&id| id != author.id && id != post.author_id)
        .collect();
    let notice = NewNotification::info(
        "New activity on a followed post",
        format!("{} answered \"{}\"", author.full_name, post.title),
    )
    .related_to(post.id)
    .with_link(format!("/community/posts/{}", post.id));
    notify_many(&txn, &recipients, &notice).await?;

    txn.commit().await?;
    debug!(post_id, answer_id = answer.id, notified = recipients.len(), "Answer posted");
    Ok(answer)
}

/// Flips a post between open and resolved. Author only.
pub async fn toggle_resolved(
    db: &DatabaseConnection,
    requester: &user::Model,
    post_id: i64,
) -> Result<bool> {
    require_active(requester)?;
    let post = get_post(db, post_id).await?;
    if post.author_id != requester.id {
        return Err(Error::forbidden("only the author can resolve this post"));
    }
    let resolved = !post.is_resolved;
    let mut active: community_post::ActiveModel = post.into();
    active.is_resolved = Set(resolved);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await?;
    Ok(resolved)
}

async fn mark_resolved<C>(db: &C, post: community_post::Model) -> Result<community_post::Model>
where
    C: ConnectionTrait,
{
    let mut active: community_post::ActiveModel = post.into();
    active.is_resolved = Set(true);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Marks `answer_id` as the accepted answer of its post and resolves the post.
///
/// Any previously accepted answer is un-accepted in the same transaction.
/// The answer's author is notified unless they are the requester; followers
/// other than the answer's author and the requester get one notice each.
/// Accepting the answer that is already accepted sends no notifications; it
/// only resolves the post again if it was reopened.
///
/// # Errors
/// `NotFound` when the post or answer is missing or the answer belongs to a
/// different post, `Forbidden` when the requester is inactive or not the
/// post's author.
#[tracing::instrument(skip(db, requester), fields(requester_id = requester.id))]
pub async fn accept_answer(
    db: &DatabaseConnection,
    requester: &user::Model,
    post_id: i64,
    answer_id: i64,
) -> Result<post_answer::Model> {
    require_active(requester)?;
    let txn = db.begin().await?;
    let post = get_post(&txn, post_id).await?;
    if post.author_id != requester.id {
        return Err(Error::forbidden("only the author can accept an answer"));
    }
    let answer = PostAnswer::find_by_id(answer_id)
        .filter(post_answer::Column::PostId.eq(post_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("answer", answer_id))?;
    if answer.is_accepted {
        if !post.is_resolved {
            mark_resolved(&txn, post).await?;
            txn.commit().await?;
            debug!(post_id, answer_id, "Post resolved again by its accepted answer");
        }
        return Ok(answer);
    }

    PostAnswer::update_many()
        .col_expr(post_answer::Column::IsAccepted, Expr::value(false))
        .filter(post_answer::Column::PostId.eq(post_id))
        .filter(post_answer::Column::IsAccepted.eq(true))
        .exec(&txn)
        .await?;

    let answer_author = answer.author_id;
    let mut active: post_answer::ActiveModel = answer.into();
    active.is_accepted = Set(true);
    let accepted = active.update(&txn).await?;

    let title = post.title.clone();
    mark_resolved(&txn, post).await?;

    let link = format!("/community/posts/{post_id}");
    if answer_author != requester.id {
        let notice = NewNotification::info(
            "Answer Accepted",
            format!("Your answer to \"{title}\" was accepted"),
        )
        .with_kind(NotificationType::Success)
        .related_to(post_id)
        .with_link(link.clone());
        notify(&txn, answer_author, notice).await?;
    }

    let recipients: Vec<i64> = follower_ids(&txn, post_id)
        .await?
        .into_iter()
        .filter(|&id| id != answer_author && id != requester.id)
        .collect();
    let notice = NewNotification::info(
        "Post Resolved",
        format!("\"{title}\" now has an accepted answer"),
    )
    .related_to(post_id)
    .with_link(link);
    notify_many(&txn, &recipients, &notice).await?;

    txn.commit().await?;
    info!(post_id, answer_id, "Answer accepted");
    Ok(accepted)
}

/// Follows or unfollows a post and returns the new follower count.
///
/// A new follow on someone else's post notifies its author.
pub async fn toggle_follow(
    db: &DatabaseConnection,
    user: &user::Model,
    post_id: i64,
) -> Result<Toggled> {
    require_active(user)?;
    let txn = db.begin().await?;
    let post = get_post(&txn, post_id).await?;

    let existing = PostFollow::find()
        .filter(post_follow::Column::PostId.eq(post_id))
        .filter(post_follow::Column::UserId.eq(user.id))
        .one(&txn)
        .await?;
    let active = if let Some(row) = existing {
        row.delete(&txn).await?;
        false
    } else {
        post_follow::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user.id),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| Error::from_unique_violation(e, "already following this post"))?;
        if post.author_id != user.id {
            let notice = NewNotification::info(
                "New Follower",
                format!("{} is now following \"{}\"", user.full_name, post.title),
            )
            .related_to(post_id);
            notify(&txn, post.author_id, notice).await?;
        }
        true
    };

    let count = PostFollow::find()
        .filter(post_follow::Column::PostId.eq(post_id))
        .count(&txn)
        .await?;
    txn.commit().await?;
    Ok(Toggled { active, count })
}

/// Adds or removes the user's upvote on a post and returns the new count.
///
/// A new upvote on someone else's post notifies its author.
pub async fn toggle_upvote(
    db: &DatabaseConnection,
    user: &user::Model,
    post_id: i64,
) -> Result<Toggled> {
    require_active(user)?;
    let txn = db.begin().await?;
    let post = get_post(&txn, post_id).await?;

    let existing = PostUpvote::find()
        .filter(post_upvote::Column::PostId.eq(post_id))
        .filter(post_upvote::Column::UserId.eq(user.id))
        .one(&txn)
        .await?;
    let active = if let Some(row) = existing {
        row.delete(&txn).await?;
        false
    } else {
        post_upvote::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user.id),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| Error::from_unique_violation(e, "post already upvoted"))?;
        if post.author_id != user.id {
            let notice = NewNotification::info(
                "New Upvote",
                format!("{} upvoted \"{}\"", user.full_name, post.title),
            )
            .related_to(post_id);
            notify(&txn, post.author_id, notice).await?;
        }
        true
    };

    let count = PostUpvote::find()
        .filter(post_upvote::Column::PostId.eq(post_id))
        .count(&txn)
        .await?;
    txn.commit().await?;
    Ok(Toggled { active, count })
}

/// Adds or removes the user's upvote on an answer and returns the new count.
pub async fn toggle_answer_upvote(
    db: &DatabaseConnection,
    user: &user::Model,
    answer_id: i64,
) -> Result<Toggled> {
    require_active(user)?;
    let txn = db.begin().await?;
    PostAnswer::find_by_id(answer_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("answer", answer_id))?;

    let existing = AnswerUpvote::find()
        .filter(answer_upvote::Column::AnswerId.eq(answer_id))
        .filter(answer_upvote::Column::UserId.eq(user.id))
        .one(&txn)
        .await?;
    let active = if let Some(row) = existing {
        row.delete(&txn).await?;
        false
    } else {
        answer_upvote::ActiveModel {
            answer_id: Set(answer_id),
            user_id: Set(user.id),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| Error::from_unique_violation(e, "answer already upvoted"))?;
        true
    };

    let count = AnswerUpvote::find()
        .filter(answer_upvote::Column::AnswerId.eq(answer_id))
        .count(&txn)
        .await?;
    txn.commit().await?;
    Ok(Toggled { active, count })
}

/// A post's answers: the accepted one first, then newest first.
pub async fn list_answers(db: &DatabaseConnection, post_id: i64) -> Result<Vec<post_answer::Model>> {
    PostAnswer::find()
        .filter(post_answer::Column::PostId.eq(post_id))
        .order_by_desc(post_answer::Column::IsAccepted)
        .order_by_desc(post_answer::Column::CreatedAt)
        .order_by_desc(post_answer::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Browses posts, newest first, optionally by category and a title/content fragment.
pub async fn list_posts(
    db: &DatabaseConnection,
    category: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<community_post::Model>> {
    let mut select = CommunityPost::find();
    if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) {
        select = select.filter(community_post::Column::Category.eq(category));
    }
    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(
            community_post::Column::Title
                .contains(term)
                .or(community_post::Column::Content.contains(term)),
        );
    }
    select
        .order_by_desc(community_post::Column::CreatedAt)
        .order_by_desc(community_post::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Posts the user follows, newest first.
pub async fn followed_posts(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<community_post::Model>> {
    CommunityPost::find()
        .inner_join(PostFollow)
        .filter(post_follow::Column::UserId.eq(user_id))
        .order_by_desc(community_post::Column::CreatedAt)
        .order_by_desc(community_post::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
