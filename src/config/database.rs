//! Database configuration module for `AgriConnect`.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Composite uniqueness rules that a single
//! column attribute cannot express (one cart line per buyer and product, one follow or
//! upvote per user, one review per reviewer) are added as explicit unique indexes.

use crate::entities::{
    AnswerUpvote, CartItem, CommunityPost, Customer, DiseaseReport, Message, Notification, Order,
    OrderItem, PostAnswer, PostFollow, PostUpvote, Product, Sale, SaleItem, User, UserReview,
    WeatherData, answer_upvote, cart_item, post_follow, post_upvote, user_review,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/agriconnect.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns
/// the default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let statement = schema.create_table_from_entity(entity).if_not_exists().to_owned();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

fn unique_pair<E, A, B>(name: &str, entity: E, first: A, second: B) -> IndexCreateStatement
where
    E: EntityTrait,
    A: sea_orm::ColumnTrait,
    B: sea_orm::ColumnTrait,
{
    Index::create()
        .name(name)
        .table(entity)
        .col(first)
        .col(second)
        .unique()
        .if_not_exists()
        .to_owned()
}

/// Creates every table and unique index. Safe to run against an existing database.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, CartItem).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;
    create_table(db, &schema, Notification).await?;
    create_table(db, &schema, CommunityPost).await?;
    create_table(db, &schema, PostAnswer).await?;
    create_table(db, &schema, PostFollow).await?;
    create_table(db, &schema, PostUpvote).await?;
    create_table(db, &schema, AnswerUpvote).await?;
    create_table(db, &schema, Customer).await?;
    create_table(db, &schema, Sale).await?;
    create_table(db, &schema, SaleItem).await?;
    create_table(db, &schema, UserReview).await?;
    create_table(db, &schema, Message).await?;
    create_table(db, &schema, DiseaseReport).await?;
    create_table(db, &schema, WeatherData).await?;

    let indexes = [
        unique_pair(
            "idx_cart_items_user_product",
            CartItem,
            cart_item::Column::UserId,
            cart_item::Column::ProductId,
        ),
        unique_pair(
            "idx_post_follows_post_user",
            PostFollow,
            post_follow::Column::PostId,
            post_follow::Column::UserId,
        ),
        unique_pair(
            "idx_post_upvotes_post_user",
            PostUpvote,
            post_upvote::Column::PostId,
            post_upvote::Column::UserId,
        ),
        unique_pair(
            "idx_answer_upvotes_answer_user",
            AnswerUpvote,
            answer_upvote::Column::AnswerId,
            answer_upvote::Column::UserId,
        ),
        unique_pair(
            "idx_user_reviews_user_reviewer",
            UserReview,
            user_review::Column::UserId,
            user_review::Column::ReviewerId,
        ),
    ];
    for index in &indexes {
        db.execute(builder.build(index)).await?;
    }

    info!("Database schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{cart_item::Model as CartItemModel, product::Model as ProductModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<CartItemModel> = CartItem::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
