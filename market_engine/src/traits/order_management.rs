use thiserror::Error;

use crate::{
    db_types::{CartLine, NewOrder, Order, OrderId, OrderStatusType, ProductId, UserId},
    traits::{CartApiError, CatalogError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderLedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("A shipping address is required")]
    MissingShippingAddress,
    #[error("A billing address is required")]
    MissingBillingAddress,
    #[error("Invalid payment method '{0}'. Use credit_card or paypal")]
    InvalidPaymentMethod(String),
    #[error("Invalid order status '{0}'")]
    InvalidStatus(String),
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Product {0} in the cart does not exist")]
    ProductNotFound(ProductId),
    #[error("Product {0} in the cart is no longer available")]
    ProductUnavailable(ProductId),
    #[error("The order total is too large to represent")]
    TotalOverflow,
    #[error("The catalog could not be queried. {0}")]
    CatalogError(String),
    #[error("The cart changed while the order was being created")]
    CartChanged,
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for OrderLedgerError {
    fn from(e: sqlx::Error) -> Self {
        OrderLedgerError::DatabaseError(e.to_string())
    }
}

impl From<CartApiError> for OrderLedgerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::DatabaseError(s) => OrderLedgerError::DatabaseError(s),
            CartApiError::ProductNotFound(id) => OrderLedgerError::ProductNotFound(id),
            CartApiError::ProductUnavailable(id) => OrderLedgerError::ProductUnavailable(id),
            CartApiError::CatalogError(s) => OrderLedgerError::CatalogError(s),
            e => OrderLedgerError::DatabaseError(e.to_string()),
        }
    }
}

impl From<CatalogError> for OrderLedgerError {
    fn from(e: CatalogError) -> Self {
        OrderLedgerError::CatalogError(e.to_string())
    }
}

/// The order ledger.
///
/// Orders are written exactly once, from a cart snapshot. After creation only the status may change.
/// All reads are scoped to the owning user: another user's order is indistinguishable from a missing one.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Converts the user's cart into an order in a single atomic transaction:
    ///
    /// * Every line is removed from the user's cart.
    /// * The removed lines are compared with `order.cart_lines()`, the snapshot the order was priced from. If they
    ///   differ, the transaction is rolled back and [`OrderLedgerError::CartChanged`] is returned.
    /// * The order is inserted with status `pending`, followed by one order line per cart line.
    ///
    /// On any failure nothing is written and the cart is left untouched.
    async fn checkout_cart(&self, order: NewOrder) -> Result<Order, OrderLedgerError>;

    /// Fetches the order, with its lines, if it exists and belongs to `user_id`.
    async fn fetch_order_for_user(&self, user_id: &UserId, order_id: OrderId)
        -> Result<Option<Order>, OrderLedgerError>;

    /// All orders belonging to `user_id`, newest first, with their lines.
    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderLedgerError>;

    /// Overwrites the status of the user's order without consulting any transition rules.
    ///
    /// Returns the previous status alongside the updated order, or `None` if the order does not belong to the user.
    async fn set_order_status(
        &self,
        user_id: &UserId,
        order_id: OrderId,
        status: OrderStatusType,
    ) -> Result<Option<(OrderStatusType, Order)>, OrderLedgerError>;
}

/// Two cart snapshots describe the same cart if they contain the same lines, irrespective of order.
pub fn same_cart_contents(a: &[CartLine], b: &[CartLine]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by_key(|l| l.product_id);
    b.sort_by_key(|l| l.product_id);
    a == b
}
