//! Fee Estimation Module
//!
//! Virtual-size fee model used by the selector.

mod estimator;

pub use estimator::TxFeeModel;
