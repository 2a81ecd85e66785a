//! Direct messages between users, optionally about a product.

use crate::{
    core::{
        notification::{NewNotification, notify},
        user::{get_user_by_id, require_active},
    },
    entities::{Message, message, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Sends a message and notifies the receiver.
///
/// # Errors
/// Returns an error if:
/// - The content is empty or the sender writes to themselves
/// - The receiver does not exist or is deactivated (`NotFound`)
/// - The referenced product does not exist (`NotFound`)
pub async fn send_message(
    db: &DatabaseConnection,
    sender: &user::Model,
    receiver_id: i64,
    content: &str,
    product_id: Option<i64>,
) -> Result<message::Model> {
    require_active(sender)?;
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::validation("Message cannot be empty"));
    }
    if sender.id == receiver_id {
        return Err(Error::validation("You cannot message yourself"));
    }
    let receiver = get_user_by_id(db, receiver_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| Error::not_found("user", receiver_id))?;
    if let Some(product_id) = product_id {
        crate::core::product::get_active_product(db, product_id).await?;
    }

    let txn = db.begin().await?;
    let sent = message::ActiveModel {
        sender_id: Set(sender.id),
        receiver_id: Set(receiver.id),
        content: Set(content.to_string()),
        product_id: Set(product_id),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    notify(
        &txn,
        receiver.id,
        NewNotification::info("New Message", format!("{} sent you a message", sender.full_name))
            .related_to(sent.id)
            .with_link(format!("/messages/{}", sender.id)),
    )
    .await?;
    txn.commit().await?;
    Ok(sent)
}

/// Messages received by a user, newest first.
pub async fn inbox(db: &DatabaseConnection, user_id: i64) -> Result<Vec<message::Model>> {
    Message::find()
        .filter(message::Column::ReceiverId.eq(user_id))
        .order_by_desc(message::Column::CreatedAt)
        .order_by_desc(message::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Both directions of the thread between two users, oldest first.
pub async fn conversation(
    db: &DatabaseConnection,
    user_a: i64,
    user_b: i64,
) -> Result<Vec<message::Model>> {
    let a_to_b = message::Column::SenderId
        .eq(user_a)
        .and(message::Column::ReceiverId.eq(user_b));
    let b_to_a = message::Column::SenderId
        .eq(user_b)
        .and(message::Column::ReceiverId.eq(user_a));
    Message::find()
        .filter(a_to_b.or(b_to_a))
        .order_by_asc(message::Column::CreatedAt)
        .order_by_asc(message::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a message read. Only its receiver may do so.
pub async fn mark_message_read(
    db: &DatabaseConnection,
    requester: &user::Model,
    message_id: i64,
) -> Result<message::Model> {
    let found = Message::find_by_id(message_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("message", message_id))?;
    if found.receiver_id != requester.id {
        return Err(Error::forbidden("only the receiver can mark a message read"));
    }
    if found.is_read {
        return Ok(found);
    }
    let mut active: message::ActiveModel = found.into();
    active.is_read = Set(true);
    active.update(db).await.map_err(Into::into)
}

/// Number of unread messages waiting for a user.
pub async fn unread_message_count(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    Message::find()
        .filter(message::Column::ReceiverId.eq(user_id))
        .filter(message::Column::IsRead.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}
