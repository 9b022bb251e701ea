//! Wallet Module
//!
//! Candidate selection and transaction planning.

pub mod planner;
pub mod utxo;

pub use planner::plan_transaction;
pub use utxo::{select_utxos, FeeModel, SelectionError, SelectionPolicy};
