//! # Campus market server
//! This crate hosts the HTTP front end of the campus marketplace. It is responsible for:
//! * Authenticating callers with a bearer JWT and checking their roles.
//! * Exposing the cart, order ledger and payment intent APIs of [`market_engine`] to the storefront.
//! * Receiving Stripe webhook events and handing them to the reconciler.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/cart`, `/api/cart/items[/{product_id}]`: The caller's shopping cart.
//! * `/api/orders[/{order_id}]`: Checkout, and the caller's order history.
//! * `/api/orders/{order_id}/payments`: The payment attempts recorded against one of the caller's orders.
//! * `/api/admin/orders/{user_id}/{order_id}/status`: Manual order status changes. Admins only.
//! * `/api/payments/create-intent`: Starts a Stripe payment for a pending order.
//! * `/webhook/stripe`: Signed payment outcome events from Stripe.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;
