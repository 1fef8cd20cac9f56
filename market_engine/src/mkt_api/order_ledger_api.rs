use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Money, NewOrder, NewOrderLine, Order, OrderId, OrderStatusType, PaymentMethod, UserId},
    events::{EventProducers, OrderCreatedEvent},
    mkt_api::order_objects::CheckoutRequest,
    traits::{CartManagement, CatalogLookup, OrderLedgerError, OrderManagement},
};

/// `OrderLedgerApi` converts carts into orders and serves each user's order history.
pub struct OrderLedgerApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderLedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderLedgerApi")
    }
}

impl<B> OrderLedgerApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderLedgerApi<B>
where B: CartManagement + CatalogLookup + OrderManagement
{
    /// Turns the user's cart into a `pending` order.
    ///
    /// The request is validated first: both addresses must be non-empty, the payment method must be `credit_card`
    /// or `paypal`, and the cart must not be empty. Each cart line is then priced from the catalog. A product that
    /// has disappeared or is unavailable fails the whole checkout.
    ///
    /// The order is written and the cart emptied in one transaction (see [`OrderManagement::checkout_cart`]). If the
    /// cart changed after it was priced, [`OrderLedgerError::CartChanged`] is returned and nothing is written.
    ///
    /// The stored order is returned, with its lines, frozen unit prices and total.
    pub async fn create_order(&self, user_id: &UserId, request: CheckoutRequest) -> Result<Order, OrderLedgerError> {
        let shipping_address = request.shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(OrderLedgerError::MissingShippingAddress);
        }
        let billing_address = request.billing_address.trim();
        if billing_address.is_empty() {
            return Err(OrderLedgerError::MissingBillingAddress);
        }
        let payment_method = request
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| OrderLedgerError::InvalidPaymentMethod(request.payment_method.clone()))?;
        let snapshot = self.db.fetch_cart_snapshot(user_id).await?;
        if snapshot.is_empty() {
            return Err(OrderLedgerError::EmptyCart);
        }
        let mut lines = Vec::with_capacity(snapshot.len());
        let mut total_price = Money::default();
        for line in snapshot {
            let entry =
                self.db.resolve(line.product_id).await?.ok_or(OrderLedgerError::ProductNotFound(line.product_id))?;
            if !entry.is_available {
                return Err(OrderLedgerError::ProductUnavailable(line.product_id));
            }
            let line_total = entry.unit_price.checked_mul(line.quantity).ok_or(OrderLedgerError::TotalOverflow)?;
            total_price = total_price.checked_add(line_total).ok_or(OrderLedgerError::TotalOverflow)?;
            lines.push(NewOrderLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: entry.unit_price,
            });
        }
        let new_order = NewOrder {
            user_id: user_id.clone(),
            shipping_address: shipping_address.to_string(),
            billing_address: billing_address.to_string(),
            payment_method,
            total_price,
            lines,
        };
        let order = self.db.checkout_cart(new_order).await?;
        info!("📦️ Order #{} created for {user_id} with a total of {}", order.id, order.total_price);
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(order)
    }

    /// Fetches one of the user's orders. Orders belonging to someone else are reported as not found.
    pub async fn fetch_order(&self, user_id: &UserId, order_id: OrderId) -> Result<Order, OrderLedgerError> {
        self.db.fetch_order_for_user(user_id, order_id).await?.ok_or(OrderLedgerError::OrderNotFound(order_id))
    }

    /// The user's orders, newest first.
    pub async fn fetch_orders(&self, user_id: &UserId) -> Result<Vec<Order>, OrderLedgerError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    /// Sets an order's status by hand.
    ///
    /// This is an administrative path: the status is validated against the set of known statuses, but no transition
    /// rules are applied. Moving a paid (or later) order back to `pending` is allowed, but logged as a warning.
    pub async fn update_status(
        &self,
        user_id: &UserId,
        order_id: OrderId,
        status: &str,
    ) -> Result<Order, OrderLedgerError> {
        let status =
            status.parse::<OrderStatusType>().map_err(|_| OrderLedgerError::InvalidStatus(status.to_string()))?;
        let (old_status, order) = self
            .db
            .set_order_status(user_id, order_id, status)
            .await?
            .ok_or(OrderLedgerError::OrderNotFound(order_id))?;
        if status == OrderStatusType::Pending && !old_status.accepts_payment() {
            warn!("📦️ Order #{order_id} was manually moved from {old_status} back to {status}");
        } else {
            info!("📦️ Order #{order_id} was manually moved from {old_status} to {status}");
        }
        Ok(order)
    }
}
