//! Cart business logic - a buyer's pending lines before checkout.
//!
//! At most one row exists per (buyer, product); re-adding a product increments
//! the existing line. Stock is checked against the live product row on every
//! add or update, but nothing is reserved until checkout.

use crate::{
    core::{
        product::get_active_product,
        user::{require_active, require_buyer},
    },
    entities::{CartItem, Product, cart_item, product, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// One cart line joined to its live product.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    /// The stored cart row
    pub item: cart_item::Model,
    /// The product as it is now
    pub product: product::Model,
}

impl CartLine {
    /// Whether the product can still be bought. Deleted products stay in the
    /// cart until the buyer removes them, but checkout rejects them.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !self.product.is_deleted
    }

    /// Live price times quantity.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.item.quantity)
    }
}

fn ensure_in_stock(product: &product::Model, requested: i32) -> Result<()> {
    if requested > product.quantity {
        return Err(Error::OutOfStock {
            product: product.name.clone(),
            requested,
            available: product.quantity,
        });
    }
    Ok(())
}

async fn get_own_item(
    db: &DatabaseConnection,
    buyer: &user::Model,
    item_id: i64,
) -> Result<cart_item::Model> {
    CartItem::find_by_id(item_id)
        .filter(cart_item::Column::UserId.eq(buyer.id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("cart item", item_id))
}

/// Adds `quantity` of a product to the buyer's cart.
///
/// # Errors
/// Returns an error if:
/// - The user cannot purchase
/// - The quantity is not positive
/// - The product does not exist or is deleted
/// - The resulting line quantity exceeds current stock (`OutOfStock`)
pub async fn add_item(
    db: &DatabaseConnection,
    buyer: &user::Model,
    product_id: i64,
    quantity: i32,
) -> Result<cart_item::Model> {
    require_buyer(buyer)?;
    if quantity <= 0 {
        return Err(Error::validation("Quantity must be positive"));
    }
    let product = get_active_product(db, product_id).await?;

    let existing = CartItem::find()
        .filter(cart_item::Column::UserId.eq(buyer.id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .one(db)
        .await?;

    match existing {
        Some(item) => {
            let combined = item.quantity.saturating_add(quantity);
            ensure_in_stock(&product, combined)?;
            let mut active: cart_item::ActiveModel = item.into();
            active.quantity = Set(combined);
            debug!(buyer_id = buyer.id, product_id, combined, "Incremented cart line");
            active.update(db).await.map_err(Into::into)
        }
        None => {
            ensure_in_stock(&product, quantity)?;
            let item = cart_item::ActiveModel {
                user_id: Set(buyer.id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                added_at: Set(chrono::Utc::now()),
                ..Default::default()
            };
            item.insert(db).await.map_err(|e| {
                Error::from_unique_violation(e, "product is already in the cart")
            })
        }
    }
}

/// Sets a cart line's quantity. A quantity of zero or less removes the line
/// and returns `None`.
pub async fn update_item(
    db: &DatabaseConnection,
    buyer: &user::Model,
    item_id: i64,
    quantity: i32,
) -> Result<Option<cart_item::Model>> {
    require_active(buyer)?;
    let item = get_own_item(db, buyer, item_id).await?;
    if quantity <= 0 {
        item.delete(db).await?;
        return Ok(None);
    }

    let product = get_active_product(db, item.product_id).await?;
    ensure_in_stock(&product, quantity)?;

    let mut active: cart_item::ActiveModel = item.into();
    active.quantity = Set(quantity);
    Ok(Some(active.update(db).await?))
}

/// Removes one line from the buyer's cart.
pub async fn remove_item(db: &DatabaseConnection, buyer: &user::Model, item_id: i64) -> Result<()> {
    require_active(buyer)?;
    let item = get_own_item(db, buyer, item_id).await?;
    item.delete(db).await?;
    Ok(())
}

/// Empties the buyer's cart and returns how many lines were removed.
pub async fn clear(db: &DatabaseConnection, buyer: &user::Model) -> Result<u64> {
    require_active(buyer)?;
    let result = CartItem::delete_many()
        .filter(cart_item::Column::UserId.eq(buyer.id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// The buyer's cart lines with their live products, oldest first.
///
/// Lines whose product was deleted are kept; see [`CartLine::is_available`].
pub async fn list_items(db: &DatabaseConnection, buyer: &user::Model) -> Result<Vec<CartLine>> {
    let rows = CartItem::find()
        .filter(cart_item::Column::UserId.eq(buyer.id))
        .order_by_asc(cart_item::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;

    rows.into_iter()
        .map(|(item, product)| {
            let product = product.ok_or_else(|| Error::not_found("product", item.product_id))?;
            Ok(CartLine { item, product })
        })
        .collect()
}

/// Cart total at live prices over the lines that can still be bought.
/// Display only; orders snapshot prices at checkout.
pub async fn total(db: &DatabaseConnection, buyer: &user::Model) -> Result<f64> {
    let lines = list_items(db, buyer).await?;
    Ok(lines
        .iter()
        .filter(|line| line.is_available())
        .map(CartLine::line_total)
        .sum())
}
