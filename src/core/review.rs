//! User reviews - one star rating per (reviewer, reviewed user) pair.

use crate::{
    core::{
        notification::{NewNotification, notify},
        user::{get_user_by_id, require_active},
    },
    entities::{UserReview, user, user_review},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Allowed star ratings.
pub const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

/// Leaves a review of another user and notifies them.
///
/// # Errors
/// Returns an error if:
/// - The rating is outside 1..=5 or the reviewer targets themselves
/// - The reviewed user does not exist
/// - The reviewer already reviewed this user (`Conflict`)
pub async fn create_review(
    db: &DatabaseConnection,
    reviewer: &user::Model,
    user_id: i64,
    rating: i32,
    review_text: Option<String>,
) -> Result<user_review::Model> {
    require_active(reviewer)?;
    if !RATING_RANGE.contains(&rating) {
        return Err(Error::validation(format!(
            "Rating must be between 1 and 5, got {rating}"
        )));
    }
    if reviewer.id == user_id {
        return Err(Error::validation("You cannot review yourself"));
    }
    let reviewed = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    let txn = db.begin().await?;
    let review = user_review::ActiveModel {
        user_id: Set(reviewed.id),
        reviewer_id: Set(reviewer.id),
        rating: Set(rating),
        review_text: Set(review_text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())),
        user_role: Set(reviewed.role),
        is_approved: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| Error::from_unique_violation(e, "you have already reviewed this user"))?;

    notify(
        &txn,
        reviewed.id,
        NewNotification::info(
            "New Review",
            format!("{} rated you {rating}/5", reviewer.full_name),
        )
        .related_to(review.id),
    )
    .await?;
    txn.commit().await?;
    Ok(review)
}

/// Approved reviews of a user, newest first.
pub async fn list_reviews(db: &DatabaseConnection, user_id: i64) -> Result<Vec<user_review::Model>> {
    UserReview::find()
        .filter(user_review::Column::UserId.eq(user_id))
        .filter(user_review::Column::IsApproved.eq(true))
        .order_by_desc(user_review::Column::CreatedAt)
        .order_by_desc(user_review::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Mean rating of a user's approved reviews, or `None` when there are none.
pub async fn average_rating(db: &DatabaseConnection, user_id: i64) -> Result<Option<f64>> {
    let reviews = list_reviews(db, user_id).await?;
    if reviews.is_empty() {
        return Ok(None);
    }
    let sum: i32 = reviews.iter().map(|r| r.rating).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = reviews.len() as f64;
    Ok(Some(f64::from(sum) / count))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::notification::unread_count;
    use crate::entities::Role;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_reviews_and_average() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let first = create_test_user(&db, "first@example.com", Role::Farmer).await?;
        let second = create_test_user(&db, "second@example.com", Role::Farmer).await?;

        assert_eq!(average_rating(&db, seller.id).await?, None);

        let review = create_review(&db, &first, seller.id, 5, Some("Genuine seed".into())).await?;
        assert_eq!(review.user_role, Role::Agrovet);
        create_review(&db, &second, seller.id, 4, None).await?;

        assert_eq!(average_rating(&db, seller.id).await?, Some(4.5));
        assert_eq!(list_reviews(&db, seller.id).await?.len(), 2);
        assert_eq!(unread_count(&db, seller.id).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_review_rules() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let farmer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;

        let result = create_review(&db, &farmer, seller.id, 6, None).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_review(&db, &farmer, farmer.id, 5, None).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_review(&db, &farmer, 999, 5, None).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        create_review(&db, &farmer, seller.id, 3, None).await?;
        let result = create_review(&db, &farmer, seller.id, 4, None).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        assert_eq!(average_rating(&db, seller.id).await?, Some(3.0));
        Ok(())
    }
}
