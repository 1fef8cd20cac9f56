//! #  Backend contracts
//!
//! This module defines the interface contracts that storage backends and external collaborators must satisfy so that
//! the market engine APIs can be built on top of them.
//!
//! ## Storage
//! * [`CartManagement`] reads and mutates the per-user carts.
//! * [`OrderManagement`] writes the order ledger. Its [`OrderManagement::checkout_cart`] method is the single atomic
//!   cart-to-order conversion.
//! * [`PaymentManagement`] records payment attempts and applies gateway outcomes to payments and orders, each in one
//!   transaction.
//!
//! ## External collaborators
//! * [`CatalogLookup`] resolves a product id to its current price and availability.
//! * [`PaymentGateway`] authorizes payment intents and authenticates the events the gateway pushes back to us.
mod cart_management;
mod catalog;
mod data_objects;
mod order_management;
mod payment_gateway;
mod payment_management;

pub use cart_management::{CartApiError, CartManagement};
pub use catalog::{CatalogError, CatalogLookup};
pub use data_objects::{PaymentFailureOutcome, PaymentSuccessOutcome};
pub(crate) use order_management::same_cart_contents;
pub use order_management::{OrderLedgerError, OrderManagement};
pub use payment_gateway::{AuthorizedIntent, GatewayError, GatewayEvent, IntentRequest, PaymentGateway};
pub use payment_management::{PaymentManagement, PaymentManagementError};
