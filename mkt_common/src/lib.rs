//! Value types shared by every crate in the campus market workspace.
//!
//! * [`Money`] is an amount of currency in minor units (cents). All prices, totals and payment amounts use it.
//! * [`Secret`] wraps configuration values that must never end up in logs.
mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, DEFAULT_CURRENCY_CODE};
pub use secret::Secret;
