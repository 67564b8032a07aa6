//! Traits for input abstraction and extensibility

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::reconciliation::Aggregates;
use crate::types::*;

/// Transactions read from a source, split into usable and rejected rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadedRecords {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RecordParseError>,
}

impl LoadedRecords {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.rejected.is_empty()
    }

    /// Fail on the first rejected row instead of skipping it
    pub fn into_strict(self) -> ReconciliationResult<Vec<Transaction>> {
        match self.rejected.into_iter().next() {
            Some(err) => Err(err.into()),
            None => Ok(self.transactions),
        }
    }
}

/// Source of raw transactions
///
/// This trait lets the engine work with any feed (CSV export, bank API,
/// in-memory fixtures) by implementing a single load method.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Load every record of the feed. Malformed rows are returned in
    /// `rejected`, never silently dropped.
    async fn load(&self) -> ReconciliationResult<LoadedRecords>;

    /// Short label used in logs
    fn describe(&self) -> String;
}

/// Read-only view handed to every anomaly rule
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    pub classified: &'a [ClassifiedTransaction],
    pub aggregates: &'a Aggregates,
    pub flow_verification: &'a [FlowVerificationEntry],
}

/// An anomaly before the detector assigns its sequential id
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub category: AnomalyCategory,
    pub description: String,
    pub impact_magnitude: ImpactMagnitude,
    pub variants: Vec<CounterpartyVariant>,
}

impl Finding {
    pub fn new(
        category: AnomalyCategory,
        description: String,
        impact_magnitude: ImpactMagnitude,
    ) -> Self {
        Self {
            category,
            description,
            impact_magnitude,
            variants: Vec::new(),
        }
    }

    pub(crate) fn into_anomaly(self, id: usize) -> Anomaly {
        Anomaly {
            id,
            category: self.category,
            description: self.description,
            impact_magnitude: self.impact_magnitude,
            variants: self.variants,
        }
    }
}

/// Trait for implementing anomaly detection rules
///
/// Rules are total: they never fail, and an empty result means nothing of
/// their category was found. Output order must not depend on traversal order.
pub trait AnomalyRule: Send + Sync {
    fn category(&self) -> AnomalyCategory;

    fn detect(&self, input: &DetectionInput<'_>) -> Vec<Finding>;
}
