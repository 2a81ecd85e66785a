//! Notification business logic - per-user append-only message queue.
//!
//! Every triggering event creates exactly one row; there is no deduplication or
//! batching. [`notify`] is generic over the connection so callers can emit
//! notifications inside the same transaction as the event that caused them.

use crate::{
    core::user::require_active,
    entities::{Notification, NotificationType, notification, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};

/// Content of a notification before it is addressed to a user.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// Short headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Flavour
    pub kind: NotificationType,
    /// Optional in-app link
    pub link: Option<String>,
    /// Id of the triggering entity
    pub related_id: Option<i64>,
}

impl NewNotification {
    /// Informational notification with no link.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: NotificationType::Info,
            link: None,
            related_id: None,
        }
    }

    /// Same notification with a different flavour.
    #[must_use]
    pub const fn with_kind(mut self, kind: NotificationType) -> Self {
        self.kind = kind;
        self
    }

    /// Same notification pointing at the triggering entity.
    #[must_use]
    pub const fn related_to(mut self, related_id: i64) -> Self {
        self.related_id = Some(related_id);
        self
    }

    /// Same notification with an in-app link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Appends one notification for `user_id`.
pub async fn notify<C>(
    db: &C,
    user_id: i64,
    content: NewNotification,
) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    let row = notification::ActiveModel {
        user_id: Set(user_id),
        title: Set(content.title),
        message: Set(content.message),
        notification_type: Set(content.kind),
        link: Set(content.link),
        related_id: Set(content.related_id),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

/// Appends the same notification for each recipient, in order.
pub async fn notify_many<C>(
    db: &C,
    recipients: &[i64],
    content: &NewNotification,
) -> Result<usize>
where
    C: ConnectionTrait,
{
    for &user_id in recipients {
        notify(db, user_id, content.clone()).await?;
    }
    Ok(recipients.len())
}

/// Marks one notification read on behalf of its recipient.
///
/// # Errors
/// `NotFound` for an unknown id, `Forbidden` when the requester is inactive or
/// not the recipient.
pub async fn mark_read(
    db: &DatabaseConnection,
    requester: &user::Model,
    notification_id: i64,
) -> Result<notification::Model> {
    require_active(requester)?;
    let found = Notification::find_by_id(notification_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("notification", notification_id))?;

    if found.user_id != requester.id {
        return Err(Error::forbidden("notification belongs to another user"));
    }
    if found.is_read {
        return Ok(found);
    }

    let mut active: notification::ActiveModel = found.into();
    active.is_read = Set(true);
    active.update(db).await.map_err(Into::into)
}

/// Marks all of a user's notifications read and returns how many changed.
pub async fn mark_all_read(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    let result = Notification::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Number of unread notifications for a user.
pub async fn unread_count(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .filter(notification::Column::IsRead.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// A user's most recent notifications, newest first.
pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    limit: u64,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(notification::Column::UserId.eq(user_id))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}
