//! Point-of-sale business logic - an agrovet's walk-in customers and counter sales.
//!
//! A sale mirrors checkout on a smaller scale: every line must reference the
//! acting agrovet's own product, prices are snapshotted into sale items, and
//! stock is taken through [`adjust_stock`] inside one transaction.

use crate::{
    core::{product::adjust_stock, user::require_seller},
    entities::{Customer, PaymentMethod, Product, Sale, SaleItem, customer, sale, sale_item, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Fields for a new walk-in customer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    /// Display name
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Postal or physical address
    pub address: Option<String>,
    /// Free-form segment (farmer, wholesaler, ...)
    pub customer_type: Option<String>,
    /// Seller's private notes
    pub notes: Option<String>,
}

/// One requested line of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    /// Product sold
    pub product_id: i64,
    /// Units sold
    pub quantity: i32,
}

/// A recorded sale with its lines.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSale {
    /// The sale row
    pub sale: sale::Model,
    /// Its price-snapshotted lines
    pub items: Vec<sale_item::Model>,
}

fn generate_receipt_number() -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let token = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("RCP-{stamp}-{}", &token[..8])
}

/// Records a walk-in customer for the agrovet.
pub async fn create_customer(
    db: &DatabaseConnection,
    agrovet: &user::Model,
    fields: NewCustomer,
) -> Result<customer::Model> {
    require_seller(agrovet)?;
    let name = fields.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Customer name cannot be empty"));
    }

    customer::ActiveModel {
        agrovet_id: Set(agrovet.id),
        name: Set(name),
        email: Set(fields.email),
        phone: Set(fields.phone),
        address: Set(fields.address),
        customer_type: Set(fields.customer_type),
        total_purchases: Set(0.0),
        last_purchase: Set(None),
        notes: Set(fields.notes),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// The agrovet's customers, alphabetically.
pub async fn list_customers(
    db: &DatabaseConnection,
    agrovet: &user::Model,
) -> Result<Vec<customer::Model>> {
    require_seller(agrovet)?;
    Customer::find()
        .filter(customer::Column::AgrovetId.eq(agrovet.id))
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Rings up a counter sale.
///
/// Lines naming the same product are merged before stock is checked. Every
/// product must belong to the acting agrovet; products and customers outside
/// its scope are reported as `NotFound`. When a customer is given, their
/// running `total_purchases` and `last_purchase` are updated.
///
/// # Errors
/// Returns an error if:
/// - The actor is not an active agrovet
/// - No lines are given or a quantity is not positive
/// - A product or the customer is unknown or belongs to another agrovet
/// - Any merged line exceeds current stock (`InsufficientStock`)
#[instrument(skip(db, agrovet, lines), fields(agrovet_id = agrovet.id))]
pub async fn record_sale(
    db: &DatabaseConnection,
    agrovet: &user::Model,
    customer_id: Option<i64>,
    lines: &[SaleLine],
    payment_method: PaymentMethod,
) -> Result<RecordedSale> {
    require_seller(agrovet)?;
    if lines.is_empty() {
        return Err(Error::validation("A sale needs at least one item"));
    }
    let mut merged: BTreeMap<i64, i32> = BTreeMap::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(Error::validation("Quantity must be positive"));
        }
        let entry = merged.entry(line.product_id).or_default();
        *entry = entry.saturating_add(line.quantity);
    }

    let txn = db.begin().await?;

    let buyer = match customer_id {
        Some(id) => Some(
            Customer::find_by_id(id)
                .filter(customer::Column::AgrovetId.eq(agrovet.id))
                .one(&txn)
                .await?
                .ok_or_else(|| Error::not_found("customer", id))?,
        ),
        None => None,
    };

    let mut products = Vec::with_capacity(merged.len());
    for (&product_id, &quantity) in &merged {
        let product = Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .filter(|p| !p.is_deleted && p.agrovet_id == agrovet.id)
            .ok_or_else(|| Error::not_found("product", product_id))?;
        if quantity > product.quantity {
            return Err(Error::InsufficientStock {
                product: product.name,
                requested: quantity,
                available: product.quantity,
            });
        }
        products.push((product, quantity));
    }

    let total_amount: f64 = products
        .iter()
        .map(|(p, q)| p.price * f64::from(*q))
        .sum();
    let now = chrono::Utc::now();
    let sale = sale::ActiveModel {
        agrovet_id: Set(agrovet.id),
        customer_id: Set(buyer.as_ref().map(|c| c.id)),
        total_amount: Set(total_amount),
        payment_method: Set(payment_method),
        receipt_number: Set(generate_receipt_number()),
        sale_date: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(products.len());
    for (product, quantity) in products {
        let item = sale_item::ActiveModel {
            sale_id: Set(sale.id),
            product_id: Set(Some(product.id)),
            product_name: Set(product.name.clone()),
            quantity: Set(quantity),
            unit_price: Set(product.price),
            subtotal: Set(product.price * f64::from(quantity)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        adjust_stock(&txn, product.id, -quantity).await?;
        items.push(item);
    }

    if let Some(buyer) = buyer {
        let running = buyer.total_purchases + total_amount;
        let mut active: customer::ActiveModel = buyer.into();
        active.total_purchases = Set(running);
        active.last_purchase = Set(Some(now));
        active.update(&txn).await?;
    }

    txn.commit().await?;
    info!(sale_id = sale.id, total_amount, "Recorded sale");
    Ok(RecordedSale { sale, items })
}

/// The agrovet's sales, newest first.
pub async fn list_sales(db: &DatabaseConnection, agrovet: &user::Model) -> Result<Vec<sale::Model>> {
    require_seller(agrovet)?;
    Sale::find()
        .filter(sale::Column::AgrovetId.eq(agrovet.id))
        .order_by_desc(sale::Column::SaleDate)
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lines of one of the agrovet's sales.
pub async fn get_sale_items(
    db: &DatabaseConnection,
    agrovet: &user::Model,
    sale_id: i64,
) -> Result<Vec<sale_item::Model>> {
    Sale::find_by_id(sale_id)
        .filter(sale::Column::AgrovetId.eq(agrovet.id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("sale", sale_id))?;
    SaleItem::find()
        .filter(sale_item::Column::SaleId.eq(sale_id))
        .order_by_asc(sale_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::product::get_product_by_id;
    use crate::entities::Role;
    use crate::test_utils::*;

    fn walk_in(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            phone: Some("0711000000".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_record_sale_updates_stock_and_customer() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let seed = create_test_product(&db, &seller, "Bean seed", 180.0, 10).await?;
        let feed = create_test_product(&db, &seller, "Dairy meal", 2500.0, 4).await?;
        let customer = create_customer(&db, &seller, walk_in("Wanjiku")).await?;

        let lines = [
            SaleLine { product_id: seed.id, quantity: 2 },
            SaleLine { product_id: feed.id, quantity: 1 },
            SaleLine { product_id: seed.id, quantity: 1 },
        ];
        let recorded =
            record_sale(&db, &seller, Some(customer.id), &lines, PaymentMethod::Cash).await?;

        assert_eq!(recorded.items.len(), 2);
        assert_eq!(recorded.sale.total_amount, 3040.0);
        assert!(recorded.sale.receipt_number.starts_with("RCP-"));
        let sum: f64 = recorded.items.iter().map(|i| i.subtotal).sum();
        assert_eq!(sum, recorded.sale.total_amount);

        assert_eq!(get_product_by_id(&db, seed.id).await?.unwrap().quantity, 7);
        assert_eq!(get_product_by_id(&db, feed.id).await?.unwrap().quantity, 3);

        let customers = list_customers(&db, &seller).await?;
        assert_eq!(customers[0].total_purchases, 3040.0);
        assert!(customers[0].last_purchase.is_some());

        assert_eq!(list_sales(&db, &seller).await?.len(), 1);
        assert_eq!(get_sale_items(&db, &seller, recorded.sale.id).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_rejects_foreign_products() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let rival = create_test_user(&db, "rival@example.com", Role::Agrovet).await?;
        let theirs = create_test_product(&db, &rival, "Rival seed", 100.0, 10).await?;
        let rival_customer = create_customer(&db, &rival, walk_in("Otieno")).await?;
        let ours = create_test_product(&db, &seller, "Bean seed", 180.0, 10).await?;

        let lines = [SaleLine { product_id: theirs.id, quantity: 1 }];
        let result = record_sale(&db, &seller, None, &lines, PaymentMethod::Mpesa).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        let lines = [SaleLine { product_id: ours.id, quantity: 1 }];
        let result =
            record_sale(&db, &seller, Some(rival_customer.id), &lines, PaymentMethod::Mpesa).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        assert_eq!(get_product_by_id(&db, theirs.id).await?.unwrap().quantity, 10);
        assert!(list_customers(&db, &seller).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_is_all_or_nothing() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let seed = create_test_product(&db, &seller, "Bean seed", 180.0, 10).await?;
        let feed = create_test_product(&db, &seller, "Dairy meal", 2500.0, 2).await?;

        // Merged quantity of 3 exceeds the 2 on hand
        let lines = [
            SaleLine { product_id: seed.id, quantity: 1 },
            SaleLine { product_id: feed.id, quantity: 2 },
            SaleLine { product_id: feed.id, quantity: 1 },
        ];
        let result = record_sale(&db, &seller, None, &lines, PaymentMethod::Card).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));
        assert_eq!(get_product_by_id(&db, seed.id).await?.unwrap().quantity, 10);
        assert!(list_sales(&db, &seller).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_input_validation() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let farmer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;
        let seed = create_test_product(&db, &seller, "Bean seed", 180.0, 10).await?;

        let result = record_sale(&db, &seller, None, &[], PaymentMethod::Cash).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let lines = [SaleLine { product_id: seed.id, quantity: 0 }];
        let result = record_sale(&db, &seller, None, &lines, PaymentMethod::Cash).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let lines = [SaleLine { product_id: seed.id, quantity: 1 }];
        let result = record_sale(&db, &farmer, None, &lines, PaymentMethod::Cash).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        let result = create_customer(&db, &seller, walk_in(" ")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }
}
