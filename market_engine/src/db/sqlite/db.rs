use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{carts, db_url, new_pool, orders, payments, products, SqliteDatabaseError};
use crate::{
    db_types::{
        CartLine,
        CatalogEntry,
        Money,
        NewOrder,
        NewPayment,
        NewProduct,
        Order,
        OrderId,
        OrderStatusType,
        Payment,
        PaymentStatusType,
        ProductId,
        UserId,
    },
    traits::{
        same_cart_contents,
        CartApiError,
        CartManagement,
        CatalogError,
        CatalogLookup,
        OrderLedgerError,
        OrderManagement,
        PaymentFailureOutcome,
        PaymentManagement,
        PaymentManagementError,
        PaymentSuccessOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `MKT_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        Self::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Connection pool to {url} opened");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date using the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }

    /// Adds a product to the catalog.
    pub async fn add_product(&self, product: NewProduct) -> Result<ProductId, SqliteDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let id = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Product {id} added to the catalog");
        Ok(id)
    }

    /// Changes the live price of a product. Existing orders are unaffected. Returns false if the product is unknown.
    pub async fn update_product_price(&self, product_id: ProductId, price: Money) -> Result<bool, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::update_price(product_id, price, &mut conn).await?)
    }

    /// Returns false if the product is unknown.
    pub async fn set_product_availability(
        &self,
        product_id: ProductId,
        is_available: bool,
    ) -> Result<bool, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::update_availability(product_id, is_available, &mut conn).await?)
    }
}

impl CatalogLookup for SqliteDatabase {
    async fn resolve(&self, product_id: ProductId) -> Result<Option<CatalogEntry>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let entry = products::fetch_catalog_entry(product_id, &mut conn).await?;
        Ok(entry)
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart_snapshot(&self, user_id: &UserId) -> Result<Vec<CartLine>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let lines = carts::fetch_cart_lines(user_id, &mut conn).await?;
        Ok(lines)
    }

    async fn add_item(&self, user_id: &UserId, line: CartLine) -> Result<CartLine, CartApiError> {
        if line.quantity < 1 {
            return Err(CartApiError::InvalidQuantity(line.quantity));
        }
        let mut tx = self.pool.begin().await?;
        let cart_id = carts::fetch_or_create_cart_id(user_id, &mut tx).await?;
        let line = carts::upsert_item(cart_id, line, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Cart #{cart_id} now has {} of product {}", line.quantity, line.product_id);
        Ok(line)
    }

    async fn set_item_quantity(&self, user_id: &UserId, line: CartLine) -> Result<CartLine, CartApiError> {
        if line.quantity < 1 {
            return Err(CartApiError::InvalidQuantity(line.quantity));
        }
        let product_id = line.product_id;
        let mut tx = self.pool.begin().await?;
        let line =
            carts::update_quantity(user_id, line, &mut tx).await?.ok_or(CartApiError::ItemNotInCart(product_id))?;
        tx.commit().await?;
        Ok(line)
    }

    async fn remove_item(&self, user_id: &UserId, product_id: ProductId) -> Result<(), CartApiError> {
        let mut conn = self.pool.acquire().await?;
        match carts::delete_item(user_id, product_id, &mut conn).await? {
            0 => Err(CartApiError::ItemNotInCart(product_id)),
            _ => Ok(()),
        }
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<u64, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = carts::take_all_items(user_id, &mut conn).await?;
        Ok(removed.len() as u64)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn checkout_cart(&self, order: NewOrder) -> Result<Order, OrderLedgerError> {
        let mut tx = self.pool.begin().await?;
        let removed = carts::take_all_items(&order.user_id, &mut tx).await?;
        if !same_cart_contents(&removed, &order.cart_lines()) {
            warn!(
                "🗃️ The cart for {} changed while their order was being priced. Rolling back checkout.",
                order.user_id
            );
            tx.rollback().await?;
            return Err(OrderLedgerError::CartChanged);
        }
        let id = orders::insert_order(&order, &mut tx).await?;
        for line in &order.lines {
            orders::insert_order_line(id, line, &mut tx).await?;
        }
        let stored = orders::fetch_order(id, &mut tx).await?.ok_or(OrderLedgerError::OrderNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Order #{id} for {} has been saved with {} lines", stored.user_id, stored.lines.len());
        Ok(stored)
    }

    async fn fetch_order_for_user(
        &self,
        user_id: &UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_for_user(user_id, order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderLedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn set_order_status(
        &self,
        user_id: &UserId,
        order_id: OrderId,
        status: OrderStatusType,
    ) -> Result<Option<(OrderStatusType, Order)>, OrderLedgerError> {
        let mut tx = self.pool.begin().await?;
        let old_status = match orders::fetch_order_for_user(user_id, order_id, &mut tx).await? {
            Some(order) => order.status,
            None => return Ok(None),
        };
        orders::update_order_status(order_id, status, &mut tx).await?;
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(OrderLedgerError::OrderNotFound(order_id))?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} status changed from {old_status} to {status}");
        Ok(Some((old_status, order)))
    }
}

impl PaymentManagement for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentManagementError> {
        let mut tx = self.pool.begin().await?;
        let intent_id = payment.gateway_intent_id.clone();
        let payment =
            payments::insert_payment(payment, &mut tx).await.map_err(|e| match PaymentManagementError::from(e) {
                PaymentManagementError::DuplicateIntent(_) => PaymentManagementError::DuplicateIntent(intent_id),
                e => e,
            })?;
        tx.commit().await?;
        debug!("🗃️ Payment #{} for order #{} recorded as pending", payment.id, payment.order_id);
        Ok(payment)
    }

    async fn fetch_payment_by_intent_id(&self, intent_id: &str) -> Result<Option<Payment>, PaymentManagementError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_by_intent_id(intent_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, PaymentManagementError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments_for_order(order_id, &mut conn).await?;
        Ok(payments)
    }

    async fn apply_payment_success(
        &self,
        intent_id: &str,
        order_id: OrderId,
    ) -> Result<PaymentSuccessOutcome, PaymentManagementError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_payment_by_intent_id(intent_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentManagementError::PaymentNotFound(intent_id.to_string()))?;
        if payment.order_id != order_id {
            warn!(
                "🗃️ Payment {intent_id} was issued for order #{}, but the gateway says it paid for order #{order_id}. \
                 Applying it to order #{order_id}",
                payment.order_id
            );
        }
        match payment.status {
            PaymentStatusType::Success => {
                debug!("🗃️ Payment {intent_id} is already marked as successful. No action to take");
                return Ok(PaymentSuccessOutcome::AlreadyApplied(payment));
            },
            PaymentStatusType::Failed => {
                info!("🗃️ Payment {intent_id} previously failed and has now succeeded");
            },
            PaymentStatusType::Pending | PaymentStatusType::Cancelled | PaymentStatusType::Refunded => {},
        }
        let order =
            orders::fetch_order(order_id, &mut tx).await?.ok_or(PaymentManagementError::OrderNotFound(order_id))?;
        let payment = payments::update_payment_status(payment.id, PaymentStatusType::Success, None, &mut tx).await?;
        let order_updated = order.status.accepts_payment();
        let order = if order_updated {
            orders::update_order_status(order_id, OrderStatusType::Paid, &mut tx).await?;
            orders::fetch_order(order_id, &mut tx).await?.ok_or(PaymentManagementError::OrderNotFound(order_id))?
        } else {
            info!("🗃️ Order #{order_id} is already {}. Its status is left unchanged", order.status);
            order
        };
        tx.commit().await?;
        debug!("🗃️ Payment {intent_id} marked as successful. Order #{order_id} is {}", order.status);
        Ok(PaymentSuccessOutcome::Applied { payment, order, order_updated })
    }

    async fn apply_payment_failure(
        &self,
        intent_id: &str,
        detail: Option<String>,
    ) -> Result<PaymentFailureOutcome, PaymentManagementError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::fetch_payment_by_intent_id(intent_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentManagementError::PaymentNotFound(intent_id.to_string()))?;
        match payment.status {
            PaymentStatusType::Failed => {
                debug!("🗃️ Payment {intent_id} is already marked as failed. No action to take");
                Ok(PaymentFailureOutcome::AlreadyApplied(payment))
            },
            PaymentStatusType::Success => {
                warn!("🗃️ Payment {intent_id} has already succeeded. Ignoring the late failure notification");
                Ok(PaymentFailureOutcome::Superseded(payment))
            },
            PaymentStatusType::Pending | PaymentStatusType::Cancelled | PaymentStatusType::Refunded => {
                let payment = payments::update_payment_status(
                    payment.id,
                    PaymentStatusType::Failed,
                    detail.as_deref(),
                    &mut tx,
                )
                .await?;
                tx.commit().await?;
                debug!("🗃️ Payment {intent_id} marked as failed");
                Ok(PaymentFailureOutcome::Applied(payment))
            },
        }
    }
}
