use thiserror::Error;

use crate::db_types::{CatalogEntry, ProductId};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Catalog lookup failed: {0}")]
    LookupFailed(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::LookupFailed(e.to_string())
    }
}

/// Resolves products to their *current* price and availability.
///
/// Prices returned here are live values. The order ledger freezes them into order lines at checkout time.
#[allow(async_fn_in_trait)]
pub trait CatalogLookup {
    /// Returns `None` if the product does not exist.
    async fn resolve(&self, product_id: ProductId) -> Result<Option<CatalogEntry>, CatalogError>;
}
