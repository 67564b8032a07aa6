//! # Settlement Reconciliation
//!
//! Reconciliation engine for a settlement account that collects income from
//! payer banks (PAC) and pays it out to merchants on the next business day.
//!
//! ## Features
//!
//! - **Classification**: typed income/settlement records with the bank or merchant name
//! - **Aggregation**: signed daily sums and per-counterparty totals
//! - **Flow verification**: income on day N against settlements on the next business day
//! - **Anomaly detection**: global imbalance, atypically small amounts, merchant name variants
//! - **Reporting**: executive, detailed and combined text reports plus CSV exports
//! - **Source abstraction**: trait-based transaction sources (CSV, in-memory)
//!
//! ## Quick Start
//!
//! ```rust
//! use settlement_reconciliation::{ReconciliationEngine, Transaction};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2022, 9, 1).unwrap();
//! let transactions = vec![
//!     Transaction::new(date, "Ingreso por PAC Multibanco Banco Santander", BigDecimal::from(3286922)),
//!     Transaction::new(date.succ_opt().unwrap(), "Liquidacion a: NoPayments", BigDecimal::from(-3286922)),
//! ];
//!
//! let report = ReconciliationEngine::default()
//!     .reconcile_transactions(&transactions)
//!     .unwrap();
//! assert!(report.is_balanced());
//! assert!(report.flow_verification[0].is_matched());
//! ```

pub mod config;
pub mod reconciliation;
pub mod report;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use reconciliation::*;
pub use report::{format_amount, ReportFormat};
pub use traits::*;
pub use types::*;
