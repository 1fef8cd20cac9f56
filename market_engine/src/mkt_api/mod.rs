//! # Campus market public API
//!
//! The `mkt_api` module exposes the programmatic API of the market engine. Each API covers one part of the
//! checkout-and-pay workflow, so clients can pick the pieces they need:
//!
//! * [`cart_api`] reads and edits a user's cart, deriving prices from the catalog at read time.
//! * [`order_ledger_api`] turns a cart into an immutable order, and serves the user's order history.
//! * [`payment_intent_api`] asks the payment gateway to authorize an order's total and records the pending payment.
//! * [`reconciler_api`] authenticates and applies the asynchronous events the gateway pushes back.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the traits the API needs, plus any external
//! collaborators (such as the payment gateway).
//!
//! ```rust,ignore
//! use market_engine::{events::EventProducers, OrderLedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements CartManagement, CatalogLookup and OrderManagement
//! let api = OrderLedgerApi::new(db, EventProducers::default());
//! let order = api.create_order(&user_id, checkout_request).await?;
//! ```
pub mod cart_api;
pub mod errors;
pub mod order_ledger_api;
pub mod order_objects;
pub mod payment_intent_api;
pub mod payment_objects;
pub mod reconciler_api;
