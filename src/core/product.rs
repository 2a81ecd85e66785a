//! Inventory business logic - Handles all product and stock operations.
//!
//! This module provides functions for creating, retrieving, updating, and deleting an
//! agrovet's products, and owns the single stock invariant of the system: a product's
//! `quantity` never goes below zero. Every decrement (checkout, POS sale, manual
//! adjustment) goes through [`adjust_stock`], which performs a conditional atomic
//! update so that concurrent requests cannot oversell.

use crate::{
    config::settings::DEFAULT_REORDER_LEVEL,
    core::user::{is_admin, require_active, require_seller},
    entities::{Product, product, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::{debug, info};

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Product name
    pub name: String,
    /// Category (seeds, fertilizers, ...)
    pub category: Option<String>,
    /// Catalog description
    pub description: Option<String>,
    /// Selling unit
    pub unit: Option<String>,
    /// Opening stock
    pub quantity: i32,
    /// Selling price per unit
    pub price: f64,
    /// Purchase cost per unit
    pub cost_price: Option<f64>,
    /// Low-stock threshold
    pub reorder_level: i32,
    /// Supplier name
    pub supplier: Option<String>,
    /// SKU; generated when absent
    pub sku: Option<String>,
}

impl Default for NewProduct {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: None,
            description: None,
            unit: None,
            quantity: 0,
            price: 0.0,
            cost_price: None,
            reorder_level: DEFAULT_REORDER_LEVEL,
            supplier: None,
            sku: None,
        }
    }
}

/// Editable product fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    /// New name
    pub name: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New selling price
    pub price: Option<f64>,
    /// New cost price
    pub cost_price: Option<f64>,
    /// New low-stock threshold
    pub reorder_level: Option<i32>,
}

fn validate_price(price: f64, label: &str) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::validation(format!(
            "{label} must be a non-negative number, got {price}"
        )));
    }
    Ok(())
}

fn generate_sku() -> String {
    let token = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("SKU-{}", &token[..10])
}

/// Whether the product is at or below its reorder level.
#[must_use]
pub const fn is_low_stock(product: &product::Model) -> bool {
    product.quantity <= product.reorder_level
}

/// Retrieves a specific product by its unique ID, including soft-deleted ones.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an active product or fails with `NotFound`.
pub async fn get_active_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    get_product_by_id(db, product_id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| Error::not_found("product", product_id))
}

async fn get_owned_product(
    db: &DatabaseConnection,
    actor: &user::Model,
    product_id: i64,
) -> Result<product::Model> {
    require_active(actor)?;
    let product = get_active_product(db, product_id).await?;
    if product.agrovet_id != actor.id && !is_admin(actor) {
        return Err(Error::forbidden("product belongs to another agrovet"));
    }
    Ok(product)
}

/// Creates a new product owned by `seller`, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The seller is not an active agrovet
/// - The name is empty or whitespace-only
/// - The price or cost price is negative or not finite
/// - The opening quantity or reorder level is negative
/// - The SKU is already taken (`Conflict`)
pub async fn create_product(
    db: &DatabaseConnection,
    seller: &user::Model,
    fields: NewProduct,
) -> Result<product::Model> {
    require_seller(seller)?;

    if fields.name.trim().is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    validate_price(fields.price, "Price")?;
    if let Some(cost) = fields.cost_price {
        validate_price(cost, "Cost price")?;
    }
    if fields.quantity < 0 {
        return Err(Error::validation("Quantity cannot be negative"));
    }
    if fields.reorder_level < 0 {
        return Err(Error::validation("Reorder level cannot be negative"));
    }

    let sku = fields
        .sku
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(generate_sku);
    let now = chrono::Utc::now();

    let product = product::ActiveModel {
        agrovet_id: Set(seller.id),
        name: Set(fields.name.trim().to_string()),
        category: Set(fields.category),
        description: Set(fields.description),
        quantity: Set(fields.quantity),
        unit: Set(fields.unit),
        price: Set(fields.price),
        cost_price: Set(fields.cost_price),
        reorder_level: Set(fields.reorder_level),
        supplier: Set(fields.supplier),
        sku: Set(sku.clone()),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = product
        .insert(db)
        .await
        .map_err(|e| Error::from_unique_violation(e, format!("SKU {sku} is already in use")))?;
    info!(product_id = created.id, agrovet_id = seller.id, "Created product");
    Ok(created)
}

/// Updates an existing product's descriptive fields and price.
///
/// Stock is not editable here; use [`restock`] or [`adjust_stock`].
///
/// # Errors
/// Returns an error if:
/// - The product does not exist or is deleted
/// - The actor neither owns the product nor is an admin
/// - A new name is empty or a new price is invalid
pub async fn update_product(
    db: &DatabaseConnection,
    actor: &user::Model,
    product_id: i64,
    changes: ProductUpdate,
) -> Result<product::Model> {
    let product = get_owned_product(db, actor, product_id).await?;
    let mut active: product::ActiveModel = product.into();

    if let Some(name) = changes.name {
        if name.trim().is_empty() {
            return Err(Error::validation("Product name cannot be empty"));
        }
        active.name = Set(name.trim().to_string());
    }
    if let Some(price) = changes.price {
        validate_price(price, "Price")?;
        active.price = Set(price);
    }
    if let Some(cost) = changes.cost_price {
        validate_price(cost, "Cost price")?;
        active.cost_price = Set(Some(cost));
    }
    if let Some(level) = changes.reorder_level {
        if level < 0 {
            return Err(Error::validation("Reorder level cannot be negative"));
        }
        active.reorder_level = Set(level);
    }
    if let Some(category) = changes.category {
        active.category = Set(Some(category));
    }
    if let Some(description) = changes.description {
        active.description = Set(Some(description));
    }
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Soft deletes a product, preserving order and sale history.
pub async fn delete_product(
    db: &DatabaseConnection,
    actor: &user::Model,
    product_id: i64,
) -> Result<product::Model> {
    let product = get_owned_product(db, actor, product_id).await?;
    let mut active: product::ActiveModel = product.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(chrono::Utc::now());

    let deleted = active.update(db).await?;
    info!(product_id, actor_id = actor.id, "Deleted product");
    Ok(deleted)
}

/// Changes a product's stock by `delta` and returns the new quantity.
///
/// Decrements are applied with a single conditional statement,
/// `UPDATE products SET quantity = quantity + delta WHERE id = ? AND quantity >= -delta`,
/// so a concurrent request that drained the stock first makes this update touch
/// zero rows instead of driving the quantity negative. Increments carry the
/// matching `quantity <= i32::MAX - delta` guard. Call it with a transaction
/// to make it part of a larger all-or-nothing operation.
///
/// # Errors
/// Returns `NotFound` for an unknown product, `InsufficientStock` when
/// `quantity + delta` would be negative and `Validation` when it would not fit
/// in an `i32`.
pub async fn adjust_stock<C>(db: &C, product_id: i64, delta: i32) -> Result<i32>
where
    C: ConnectionTrait,
{
    let product = get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?;

    if delta == 0 {
        return Ok(product.quantity);
    }
    let out_of_range =
        || Error::validation(format!("Stock for {} cannot exceed {}", product.name, i32::MAX));
    let needed = delta.checked_neg().ok_or_else(out_of_range)?;
    if product.quantity.checked_add(delta).is_none() {
        return Err(out_of_range());
    }

    let mut update = Product::update_many()
        .col_expr(
            product::Column::Quantity,
            Expr::col(product::Column::Quantity).add(delta),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product_id));
    update = if delta < 0 {
        update.filter(product::Column::Quantity.gte(needed))
    } else {
        update.filter(product::Column::Quantity.lte(i32::MAX - delta))
    };
    let result = update.exec(db).await?;

    if result.rows_affected == 0 {
        if delta > 0 {
            return Err(out_of_range());
        }
        let available = get_product_by_id(db, product_id)
            .await?
            .map_or(product.quantity, |p| p.quantity);
        return Err(Error::InsufficientStock {
            product: product.name,
            requested: needed,
            available,
        });
    }

    let quantity = get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))?
        .quantity;
    debug!(product_id, delta, quantity, "Adjusted stock");
    Ok(quantity)
}

/// Adds received stock to a product the actor owns.
pub async fn restock(
    db: &DatabaseConnection,
    actor: &user::Model,
    product_id: i64,
    quantity: i32,
) -> Result<i32> {
    if quantity <= 0 {
        return Err(Error::validation("Restock quantity must be positive"));
    }
    get_owned_product(db, actor, product_id).await?;
    adjust_stock(db, product_id, quantity).await
}

/// Lists a seller's active products, ordered alphabetically by name.
pub async fn list_products_by_seller(
    db: &DatabaseConnection,
    seller_id: i64,
) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::AgrovetId.eq(seller_id))
        .filter(product::Column::IsDeleted.eq(false))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists a seller's active products at or below their reorder level.
pub async fn list_low_stock(
    db: &DatabaseConnection,
    seller_id: i64,
) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::AgrovetId.eq(seller_id))
        .filter(product::Column::IsDeleted.eq(false))
        .filter(Expr::col(product::Column::Quantity).lte(Expr::col(product::Column::ReorderLevel)))
        .order_by_asc(product::Column::Quantity)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Browses the marketplace: active, in-stock products matching an optional name
/// fragment and category.
pub async fn search_catalog(
    db: &DatabaseConnection,
    query: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<product::Model>> {
    let mut select = Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .filter(product::Column::Quantity.gt(0));
    if let Some(term) = query.map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(product::Column::Name.contains(term));
    }
    if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) {
        select = select.filter(product::Column::Category.eq(category));
    }
    select
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Value of a seller's stock at cost: Σ quantity × `cost_price`.
pub async fn inventory_value(db: &DatabaseConnection, seller_id: i64) -> Result<f64> {
    let products = list_products_by_seller(db, seller_id).await?;
    Ok(products
        .iter()
        .map(|p| f64::from(p.quantity) * p.cost_price.unwrap_or(0.0))
        .sum())
}
