//! Real-estate portfolio tracker: amortization and cashflow simulations,
//! ranking of saved scenarios, and a per-user record store behind an
//! HTTP API.

pub mod api;
pub mod config;
pub mod core;
pub mod store;
