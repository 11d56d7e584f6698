//! Shared types and stock rules for the kitchen inventory service
//!
//! This crate holds the pure parts of the system: ledger movement types,
//! projection folds, cost rules and status classification. It is used by the
//! backend and, through WASM, by client code.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
