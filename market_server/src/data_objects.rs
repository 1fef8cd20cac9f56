use std::fmt::Display;

use market_engine::db_types::{OrderId, ProductId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItem {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Path of the admin status route: `/admin/orders/{user_id}/{order_id}/status`
#[derive(Debug, Clone, Deserialize)]
pub struct UserOrderPath {
    pub user_id: String,
    pub order_id: OrderId,
}
