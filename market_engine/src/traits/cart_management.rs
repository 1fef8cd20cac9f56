use thiserror::Error;

use crate::{
    db_types::{CartLine, ProductId, UserId},
    traits::CatalogError,
};

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Product {0} is not available")]
    ProductUnavailable(ProductId),
    #[error("Product {0} is not in the cart")]
    ItemNotInCart(ProductId),
    #[error("The catalog could not be queried. {0}")]
    CatalogError(String),
    #[error("The cart total is too large to represent")]
    TotalOverflow,
}

impl From<sqlx::Error> for CartApiError {
    fn from(e: sqlx::Error) -> Self {
        CartApiError::DatabaseError(e.to_string())
    }
}

impl From<CatalogError> for CartApiError {
    fn from(e: CatalogError) -> Self {
        CartApiError::CatalogError(e.to_string())
    }
}

/// Storage for per-user carts.
///
/// Every user has at most one cart, created on first access. Cart lines are kept in insertion order.
#[allow(async_fn_in_trait)]
pub trait CartManagement: Clone {
    /// The current lines in the user's cart, in the order they were added. An empty cart is not an error.
    async fn fetch_cart_snapshot(&self, user_id: &UserId) -> Result<Vec<CartLine>, CartApiError>;

    /// Adds `quantity` of a product to the cart. If the product is already in the cart, the quantities are summed.
    ///
    /// Returns the resulting cart line.
    async fn add_item(&self, user_id: &UserId, line: CartLine) -> Result<CartLine, CartApiError>;

    /// Sets the quantity of a product that is already in the cart.
    ///
    /// Returns [`CartApiError::ItemNotInCart`] if the product is not in the user's cart.
    async fn set_item_quantity(&self, user_id: &UserId, line: CartLine) -> Result<CartLine, CartApiError>;

    /// Removes a product from the cart.
    ///
    /// Returns [`CartApiError::ItemNotInCart`] if the product is not in the user's cart.
    async fn remove_item(&self, user_id: &UserId, product_id: ProductId) -> Result<(), CartApiError>;

    /// Removes every line from the user's cart, returning the number of lines removed.
    async fn clear_cart(&self, user_id: &UserId) -> Result<u64, CartApiError>;
}
