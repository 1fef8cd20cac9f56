use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartLine, Money, ProductId, UserId},
    mkt_api::order_objects::{CartView, CartViewLine},
    traits::{CartApiError, CartManagement, CatalogLookup},
};

/// `CartApi` lets users build up the cart that [`crate::OrderLedgerApi`] later turns into an order.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CartApi<B>
where B: CartManagement + CatalogLookup
{
    /// The user's cart with live prices. Products that have disappeared from the catalog are still listed, without a
    /// price, so that the user can remove them.
    pub async fn cart(&self, user_id: &UserId) -> Result<CartView, CartApiError> {
        let snapshot = self.db.fetch_cart_snapshot(user_id).await?;
        let mut lines = Vec::with_capacity(snapshot.len());
        let mut total = Money::default();
        for line in snapshot {
            let entry = self.db.resolve(line.product_id).await?;
            let unit_price = entry.as_ref().map(|e| e.unit_price);
            let is_available = entry.as_ref().map(|e| e.is_available).unwrap_or(false);
            let line_total = match unit_price {
                Some(price) => Some(price.checked_mul(line.quantity).ok_or(CartApiError::TotalOverflow)?),
                None => None,
            };
            if let (true, Some(amount)) = (is_available, line_total) {
                total = total.checked_add(amount).ok_or(CartApiError::TotalOverflow)?;
            }
            lines.push(CartViewLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
                is_available,
                line_total,
            });
        }
        Ok(CartView { lines, total })
    }

    /// Adds a product to the cart. Only products that exist and are available can be added.
    pub async fn add_item(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartLine, CartApiError> {
        if quantity < 1 {
            return Err(CartApiError::InvalidQuantity(quantity));
        }
        match self.db.resolve(product_id).await? {
            None => return Err(CartApiError::ProductNotFound(product_id)),
            Some(entry) if !entry.is_available => return Err(CartApiError::ProductUnavailable(product_id)),
            Some(_) => {},
        }
        let line = self.db.add_item(user_id, CartLine::new(product_id, quantity)).await?;
        debug!("🛒️ {user_id} added {quantity} of product {product_id} to their cart");
        Ok(line)
    }

    /// Changes the quantity of a product in the cart. A quantity of zero removes the line, in which case `None` is
    /// returned.
    pub async fn update_item(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<CartLine>, CartApiError> {
        match quantity {
            0 => {
                self.remove_item(user_id, product_id).await?;
                Ok(None)
            },
            q if q < 0 => Err(CartApiError::InvalidQuantity(q)),
            q => {
                let line = self.db.set_item_quantity(user_id, CartLine::new(product_id, q)).await?;
                debug!("🛒️ {user_id} set the quantity of product {product_id} to {q}");
                Ok(Some(line))
            },
        }
    }

    pub async fn remove_item(&self, user_id: &UserId, product_id: ProductId) -> Result<(), CartApiError> {
        self.db.remove_item(user_id, product_id).await?;
        debug!("🛒️ {user_id} removed product {product_id} from their cart");
        Ok(())
    }

    pub async fn clear_cart(&self, user_id: &UserId) -> Result<u64, CartApiError> {
        let removed = self.db.clear_cart(user_id).await?;
        debug!("🛒️ {user_id} cleared {removed} lines from their cart");
        Ok(removed)
    }
}
