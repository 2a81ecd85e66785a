//! Order business logic - checkout and the order status state machine.
//!
//! Checkout turns a buyer's whole cart into one order per seller inside a
//! single database transaction. Every line is validated against the live
//! product row before anything is written, and every decrement goes through
//! [`adjust_stock`]'s conditional update, so a checkout either places all of
//! its orders or leaves no trace.

use crate::{
    core::{
        notification::{NewNotification, notify},
        product::adjust_stock,
        user::{is_admin, require_active, require_buyer},
    },
    entities::{
        CartItem, NotificationType, Order, OrderItem, OrderStatus, PaymentMethod, Product,
        cart_item, order, order_item, product, user,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Buyer-supplied checkout details.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Where the goods should go
    pub shipping_address: String,
    /// Contact phone for delivery
    pub phone: Option<String>,
    /// How the buyer will pay
    pub payment_method: PaymentMethod,
    /// Free-form notes to the seller
    pub notes: Option<String>,
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    /// The order row
    pub order: order::Model,
    /// Its price-snapshotted lines
    pub items: Vec<order_item::Model>,
}

fn generate_order_number(buyer_id: i64, seller_id: i64) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let token = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ORD-{stamp}-{buyer_id}-{seller_id}-{}", &token[..6])
}

/// Places one order per seller for everything in the buyer's cart.
///
/// All lines are validated against the live stock of their products before any
/// order is written. Any failure rolls back the whole checkout: no orders, no
/// stock changes, and the cart is left as it was. On success the entire cart is
/// emptied and each seller receives a "New Order Received" notification.
///
/// # Errors
/// Returns an error if:
/// - The user cannot purchase
/// - The shipping address is empty
/// - The cart is empty (`EmptyCart`)
/// - A product in the cart was deleted (`NotFound`)
/// - Any line asks for more than is in stock (`InsufficientStock`)
#[instrument(skip(db, buyer, request), fields(buyer_id = buyer.id))]
pub async fn checkout(
    db: &DatabaseConnection,
    buyer: &user::Model,
    request: CheckoutRequest,
) -> Result<Vec<PlacedOrder>> {
    require_buyer(buyer)?;
    let shipping_address = request.shipping_address.trim().to_string();
    if shipping_address.is_empty() {
        return Err(Error::validation("Shipping address cannot be empty"));
    }

    let txn = db.begin().await?;

    let lines = CartItem::find()
        .filter(cart_item::Column::UserId.eq(buyer.id))
        .order_by_asc(cart_item::Column::Id)
        .find_also_related(Product)
        .all(&txn)
        .await?;
    if lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    // Validate every line of every seller before the first write
    let mut by_seller: BTreeMap<i64, Vec<(cart_item::Model, product::Model)>> = BTreeMap::new();
    for (item, product) in lines {
        let product = product
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| Error::not_found("product", item.product_id))?;
        if item.quantity > product.quantity {
            warn!(
                product_id = product.id,
                requested = item.quantity,
                available = product.quantity,
                "Checkout rejected for insufficient stock"
            );
            return Err(Error::InsufficientStock {
                product: product.name,
                requested: item.quantity,
                available: product.quantity,
            });
        }
        by_seller.entry(product.agrovet_id).or_default().push((item, product));
    }

    let now = chrono::Utc::now();
    let mut placed = Vec::with_capacity(by_seller.len());
    for (seller_id, seller_lines) in by_seller {
        let total_amount: f64 = seller_lines
            .iter()
            .map(|(item, product)| product.price * f64::from(item.quantity))
            .sum();

        let order = order::ActiveModel {
            buyer_id: Set(buyer.id),
            agrovet_id: Set(seller_id),
            order_number: Set(generate_order_number(buyer.id, seller_id)),
            total_amount: Set(total_amount),
            shipping_address: Set(shipping_address.clone()),
            phone: Set(request.phone.clone()),
            payment_method: Set(request.payment_method),
            notes: Set(request.notes.clone()),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(seller_lines.len());
        for (item, product) in seller_lines {
            let line = order_item::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(Some(product.id)),
                product_name: Set(product.name.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(product.price),
                subtotal: Set(product.price * f64::from(item.quantity)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            adjust_stock(&txn, product.id, -item.quantity).await?;
            items.push(line);
        }

        notify(
            &txn,
            seller_id,
            NewNotification::info(
                "New Order Received",
                format!(
                    "Order {} from {} totalling KES {:.2}",
                    order.order_number, buyer.full_name, order.total_amount
                ),
            )
            .with_kind(NotificationType::Success)
            .related_to(order.id)
            .with_link(format!("/orders/{}", order.id)),
        )
        .await?;

        placed.push(PlacedOrder { order, items });
    }

    CartItem::delete_many()
        .filter(cart_item::Column::UserId.eq(buyer.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(orders = placed.len(), "Checkout completed");
    Ok(placed)
}

async fn load_items<C>(db: &C, order_id: i64) -> Result<Vec<order_item::Model>>
where
    C: ConnectionTrait,
{
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves an order along its state machine on behalf of the owning agrovet.
///
/// Cancelling returns every line's quantity to stock. The buyer is notified
/// of each change.
///
/// # Errors
/// Returns an error if:
/// - The order does not exist (`NotFound`)
/// - The actor is not the order's seller (`Forbidden`)
/// - The transition is not allowed (`InvalidTransition`)
#[instrument(skip(db, actor), fields(actor_id = actor.id))]
pub async fn update_order_status(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model> {
    require_active(actor)?;
    let txn = db.begin().await?;

    let existing = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;
    if existing.agrovet_id != actor.id {
        return Err(Error::forbidden("only the selling agrovet can update this order"));
    }
    if !existing.status.can_transition_to(status) {
        return Err(Error::InvalidTransition {
            from: existing.status.as_str().to_string(),
            to: status.as_str().to_string(),
        });
    }

    if status == OrderStatus::Cancelled {
        for item in load_items(&txn, order_id).await? {
            if let Some(product_id) = item.product_id {
                adjust_stock(&txn, product_id, item.quantity).await?;
            }
        }
    }

    let buyer_id = existing.buyer_id;
    let order_number = existing.order_number.clone();
    let mut active: order::ActiveModel = existing.into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(&txn).await?;

    let kind = if status == OrderStatus::Cancelled {
        NotificationType::Warning
    } else {
        NotificationType::Info
    };
    notify(
        &txn,
        buyer_id,
        NewNotification::info(
            "Order Status Updated",
            format!("Order {order_number} is now {}", status.as_str()),
        )
        .with_kind(kind)
        .related_to(order_id)
        .with_link(format!("/orders/{order_id}")),
    )
    .await?;

    txn.commit().await?;
    info!(order_id, status = status.as_str(), "Order status changed");
    Ok(updated)
}

/// Fetches an order with its items for its buyer, its seller or an admin.
///
/// Anyone else gets `NotFound`, so order ids outside the caller's scope are
/// indistinguishable from missing ones.
pub async fn get_order(
    db: &DatabaseConnection,
    viewer: &user::Model,
    order_id: i64,
) -> Result<PlacedOrder> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .filter(|o| o.buyer_id == viewer.id || o.agrovet_id == viewer.id || is_admin(viewer))
        .ok_or_else(|| Error::not_found("order", order_id))?;
    let items = load_items(db, order.id).await?;
    Ok(PlacedOrder { order, items })
}

/// A buyer's orders, newest first.
pub async fn list_orders_for_buyer(
    db: &DatabaseConnection,
    buyer_id: i64,
) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::BuyerId.eq(buyer_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Orders received by a seller, optionally narrowed to one status, newest first.
pub async fn list_orders_for_seller(
    db: &DatabaseConnection,
    seller_id: i64,
    status: Option<OrderStatus>,
) -> Result<Vec<order::Model>> {
    let mut select = Order::find().filter(order::Column::AgrovetId.eq(seller_id));
    if let Some(status) = status {
        select = select.filter(order::Column::Status.eq(status));
    }
    select
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{
        cart,
        notification::{list_for_user, unread_count},
        product::{ProductUpdate, get_product_by_id, update_product},
    };
    use crate::entities::Role;
    use crate::test_utils::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: "Plot 12, Nakuru".to_string(),
            phone: Some("0700000000".to_string()),
            payment_method: PaymentMethod::Mpesa,
            notes: None,
        }
    }

    async fn stock(db: &DatabaseConnection, product_id: i64) -> i32 {
        get_product_by_id(db, product_id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_checkout_splits_by_seller() -> Result<()> {
        let (db, seller_a) = setup_with_agrovet().await?;
        let seller_b = create_test_user(&db, "second@example.com", Role::Agrovet).await?;
        let buyer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;
        let product_a = create_test_product(&db, &seller_a, "Product A", 100.0, 5).await?;
        let product_b = create_test_product(&db, &seller_b, "Product B", 50.0, 3).await?;
        cart::add_item(&db, &buyer, product_a.id, 2).await?;
        cart::add_item(&db, &buyer, product_b.id, 1).await?;

        let placed = checkout(&db, &buyer, request()).await?;
        assert_eq!(placed.len(), 2);

        let order_a = placed.iter().find(|p| p.order.agrovet_id == seller_a.id).unwrap();
        assert_eq!(order_a.order.total_amount, 200.0);
        assert_eq!(order_a.items.len(), 1);
        assert_eq!(order_a.items[0].quantity, 2);
        assert_eq!(order_a.items[0].unit_price, 100.0);
        assert_eq!(order_a.items[0].product_name, "Product A");

        let order_b = placed.iter().find(|p| p.order.agrovet_id == seller_b.id).unwrap();
        assert_eq!(order_b.order.total_amount, 50.0);
        assert_eq!(order_b.items[0].quantity, 1);

        for p in &placed {
            assert_eq!(p.order.status, OrderStatus::Pending);
            assert!(p.order.order_number.starts_with("ORD-"));
            let sum: f64 = p.items.iter().map(|i| i.subtotal).sum();
            assert_eq!(p.order.total_amount, sum);
        }
        assert_ne!(placed[0].order.order_number, placed[1].order.order_number);

        assert_eq!(stock(&db, product_a.id).await, 3);
        assert_eq!(stock(&db, product_b.id).await, 2);
        assert!(cart::list_items(&db, &buyer).await?.is_empty());

        // One notification per seller
        assert_eq!(unread_count(&db, seller_a.id).await?, 1);
        assert_eq!(unread_count(&db, seller_b.id).await?, 1);
        let notice = &list_for_user(&db, seller_a.id, 5).await?[0];
        assert_eq!(notice.title, "New Order Received");
        assert_eq!(notice.related_id, Some(order_a.order.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_is_all_or_nothing() -> Result<()> {
        let (db, seller_a) = setup_with_agrovet().await?;
        let seller_b = create_test_user(&db, "second@example.com", Role::Agrovet).await?;
        let buyer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;
        let rival = create_test_user(&db, "rival@example.com", Role::Farmer).await?;
        let product_a = create_test_product(&db, &seller_a, "Product A", 100.0, 5).await?;
        let product_b = create_test_product(&db, &seller_b, "Product B", 50.0, 3).await?;

        cart::add_item(&db, &buyer, product_b.id, 1).await?;
        cart::add_item(&db, &buyer, product_a.id, 5).await?;

        // Another buyer drains two units after the cart was filled
        cart::add_item(&db, &rival, product_a.id, 2).await?;
        checkout(&db, &rival, request()).await?;
        assert_eq!(stock(&db, product_a.id).await, 3);

        let result = checkout(&db, &buyer, request()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientStock {
                requested: 5,
                available: 3,
                ..
            }
        ));

        assert!(list_orders_for_buyer(&db, buyer.id).await?.is_empty());
        assert!(list_orders_for_seller(&db, seller_b.id, None).await?.is_empty());
        assert_eq!(stock(&db, product_a.id).await, 3);
        assert_eq!(stock(&db, product_b.id).await, 3);
        assert_eq!(cart::list_items(&db, &buyer).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_cart_and_bad_request() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let buyer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;

        let result = checkout(&db, &buyer, request()).await;
        assert!(matches!(result.unwrap_err(), Error::EmptyCart));

        let mut blank = request();
        blank.shipping_address = "   ".to_string();
        let result = checkout(&db, &buyer, blank).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = checkout(&db, &seller, request()).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_price_change_does_not_touch_placed_order() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let buyer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;
        let product = create_test_product(&db, &seller, "Urea", 3000.0, 10).await?;
        cart::add_item(&db, &buyer, product.id, 2).await?;
        let placed = checkout(&db, &buyer, request()).await?;

        let changes = ProductUpdate {
            price: Some(3500.0),
            name: Some("Urea 50kg".to_string()),
            ..Default::default()
        };
        update_product(&db, &seller, product.id, changes).await?;

        let reloaded = get_order(&db, &buyer, placed[0].order.id).await?;
        assert_eq!(reloaded.order.total_amount, 6000.0);
        assert_eq!(reloaded.items[0].unit_price, 3000.0);
        assert_eq!(reloaded.items[0].subtotal, 6000.0);
        assert_eq!(reloaded.items[0].product_name, "Urea");
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_never_oversell() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let first = create_test_user(&db, "first@example.com", Role::Farmer).await?;
        let second = create_test_user(&db, "second@example.com", Role::Farmer).await?;
        let product = create_test_product(&db, &seller, "Maize seed", 100.0, 5).await?;
        cart::add_item(&db, &first, product.id, 3).await?;
        cart::add_item(&db, &second, product.id, 3).await?;

        let (a, b) = tokio::join!(
            checkout(&db, &first, request()),
            checkout(&db, &second, request())
        );

        let outcomes = [a, b];
        let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(Error::InsufficientStock { .. })))
        );
        assert_eq!(stock(&db, product.id).await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_transitions() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let buyer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;
        let product = create_test_product(&db, &seller, "Urea", 3000.0, 10).await?;
        cart::add_item(&db, &buyer, product.id, 1).await?;
        let order_id = checkout(&db, &buyer, request()).await?[0].order.id;

        // Buyers cannot move their own orders
        let result = update_order_status(&db, &buyer, order_id, OrderStatus::Processing).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));

        let result = update_order_status(&db, &seller, order_id, OrderStatus::Delivered).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidTransition { .. }));

        for next in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let updated = update_order_status(&db, &seller, order_id, next).await?;
            assert_eq!(updated.status, next);
        }

        let result = update_order_status(&db, &seller, order_id, OrderStatus::Cancelled).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidTransition { .. }));
        assert_eq!(unread_count(&db, buyer.id).await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let buyer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;
        let product = create_test_product(&db, &seller, "Urea", 3000.0, 10).await?;
        cart::add_item(&db, &buyer, product.id, 4).await?;
        let order_id = checkout(&db, &buyer, request()).await?[0].order.id;
        assert_eq!(stock(&db, product.id).await, 6);

        let cancelled = update_order_status(&db, &seller, order_id, OrderStatus::Cancelled).await?;
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock(&db, product.id).await, 10);

        let pending = list_orders_for_seller(&db, seller.id, Some(OrderStatus::Pending)).await?;
        assert!(pending.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_order_scoping() -> Result<()> {
        let (db, seller) = setup_with_agrovet().await?;
        let buyer = create_test_user(&db, "farmer@example.com", Role::Farmer).await?;
        let stranger = create_test_user(&db, "stranger@example.com", Role::Farmer).await?;
        let admin = create_test_user(&db, "admin@example.com", Role::Admin).await?;
        let product = create_test_product(&db, &seller, "Urea", 3000.0, 10).await?;
        cart::add_item(&db, &buyer, product.id, 1).await?;
        let order_id = checkout(&db, &buyer, request()).await?[0].order.id;

        assert_eq!(get_order(&db, &buyer, order_id).await?.items.len(), 1);
        assert_eq!(get_order(&db, &seller, order_id).await?.order.id, order_id);
        assert_eq!(get_order(&db, &admin, order_id).await?.order.id, order_id);
        let result = get_order(&db, &stranger, order_id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
