//! Campus Market Engine
//!
//! The engine is the provider-agnostic core of the campus marketplace backend. It owns the two workflows that must
//! never lose or duplicate money: turning a mutable cart into an immutable order, and reconciling that order's payment
//! state from the signed events an external payment gateway sends back.
//!
//! The library is divided into three main sections:
//! 1. The backend contracts ([`mod@traits`]). Storage backends implement these to support the engine, and external
//!    collaborators (the product catalog, the payment gateway) are described by them too. SQLite is the supported
//!    storage backend. The data types shared by all backends are defined in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@mkt_api`]): carts, the order ledger, payment intents, and the event reconciler.
//! 3. Event hooks ([`mod@events`]). Handlers can subscribe to orders being created, orders being paid, and payments
//!    failing.
mod db;

pub mod db_types;
pub mod events;
pub mod mkt_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use mkt_api::{
    cart_api::CartApi,
    errors::{PaymentIntentError, ReconcileError},
    order_ledger_api::OrderLedgerApi,
    order_objects,
    payment_intent_api::{PaymentIntentApi, DEFAULT_GATEWAY_TIMEOUT},
    payment_objects,
    reconciler_api::ReconcilerApi,
};
pub use traits::{
    CartApiError,
    CartManagement,
    CatalogLookup,
    OrderLedgerError,
    OrderManagement,
    PaymentGateway,
    PaymentManagement,
};
