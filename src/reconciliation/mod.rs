//! Reconciliation engine for settlement-network cash movements
//!
//! Stages run in dependency order over an immutable input:
//! classification, aggregation, flow verification, anomaly detection.

pub mod aggregator;
pub mod anomaly;
pub mod classifier;
pub mod core;
pub mod flow;

pub use aggregator::*;
pub use anomaly::*;
pub use classifier::*;
pub use self::core::*;
pub use flow::*;
