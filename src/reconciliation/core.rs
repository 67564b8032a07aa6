//! Reconciliation engine that runs classification, aggregation, flow
//! verification and anomaly detection in order

use serde::{Deserialize, Serialize};

use crate::config::{ReconciliationConfig, UnclassifiedPolicy};
use crate::reconciliation::{
    aggregate, small_amount_transactions, AnomalyDetector, Classifier, FlowVerifier,
};
use crate::traits::*;
use crate::types::*;

/// Classified transactions and the ones that matched no rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub classified: Vec<ClassifiedTransaction>,
    pub rejected: Vec<ClassificationError>,
}

/// Main reconciliation engine. Holds configuration only; every run works on
/// the data passed in and returns a fresh report.
pub struct ReconciliationEngine {
    config: ReconciliationConfig,
    classifier: Classifier,
    verifier: FlowVerifier,
    detector: AnomalyDetector,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(ReconciliationConfig::default())
    }
}

impl ReconciliationEngine {
    /// Create an engine from a configuration
    pub fn new(config: ReconciliationConfig) -> Self {
        Self {
            classifier: Classifier::from_config(&config),
            verifier: FlowVerifier::new(config.tolerance()),
            detector: AnomalyDetector::new(&config),
            config,
        }
    }

    /// Create an engine after validating the configuration
    pub fn try_new(config: ReconciliationConfig) -> ReconciliationResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Replace the standard anomaly rules
    pub fn with_detector(mut self, detector: AnomalyDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Classify every transaction, keeping the failures alongside
    pub fn classify_all(&self, transactions: &[Transaction]) -> ClassificationOutcome {
        let mut outcome = ClassificationOutcome::default();

        for transaction in transactions {
            match self.classifier.classify(transaction) {
                Ok(classified) => outcome.classified.push(classified),
                Err(err) => {
                    tracing::warn!(
                        date = %transaction.date,
                        description = %transaction.description,
                        "Unclassified transaction"
                    );
                    outcome.rejected.push(err);
                }
            }
        }

        tracing::debug!(
            classified = outcome.classified.len(),
            rejected = outcome.rejected.len(),
            "Classification complete"
        );
        outcome
    }

    /// Build the report for an already-classified set
    pub fn reconcile(&self, classified: &[ClassifiedTransaction]) -> ReconciliationReport {
        let aggregates = aggregate(classified);
        let flow_verification = self.verifier.verify(&aggregates);
        let anomalies = self.detector.detect(&DetectionInput {
            classified,
            aggregates: &aggregates,
            flow_verification: &flow_verification,
        });

        let report = ReconciliationReport {
            period: aggregates.period(),
            total_income: aggregates.total_income(),
            total_settlements: aggregates.total_settlements(),
            difference: aggregates.difference(),
            income_count: aggregates.count(TransactionKind::Income),
            settlement_count: aggregates.count(TransactionKind::Settlement),
            income_by_counterparty: aggregates.ranked(TransactionKind::Income),
            settlements_by_counterparty: aggregates.ranked(TransactionKind::Settlement),
            flow_verification,
            anomalies,
            daily_balances: aggregates.daily_balances(),
            small_amount_transactions: small_amount_transactions(
                classified,
                &self.config.small_amount_cutoff,
            ),
            unclassified: Vec::new(),
        };

        tracing::info!(
            total_income = %report.total_income,
            total_settlements = %report.total_settlements,
            difference = %report.difference,
            anomalies = report.anomalies.len(),
            "Reconciliation complete"
        );
        report
    }

    /// Classify raw transactions and reconcile them. Unclassified
    /// transactions abort the run or land in `report.unclassified`,
    /// depending on the configured policy.
    pub fn reconcile_transactions(
        &self,
        transactions: &[Transaction],
    ) -> ReconciliationResult<ReconciliationReport> {
        let outcome = self.classify_all(transactions);

        if self.config.unclassified == UnclassifiedPolicy::Abort {
            if let Some(err) = outcome.rejected.into_iter().next() {
                return Err(err.into());
            }
            return Ok(self.reconcile(&outcome.classified));
        }

        let mut report = self.reconcile(&outcome.classified);
        report.unclassified = outcome.rejected;
        Ok(report)
    }

    /// Load from a source and reconcile what it yields. Rejected rows are
    /// logged and skipped; use [`LoadedRecords::into_strict`] beforehand to
    /// abort on them instead.
    pub async fn reconcile_source<S: TransactionSource + ?Sized>(
        &self,
        source: &S,
    ) -> ReconciliationResult<ReconciliationReport> {
        let loaded = source.load().await?;
        if !loaded.rejected.is_empty() {
            tracing::warn!(
                source = %source.describe(),
                rejected = loaded.rejected.len(),
                "Skipping malformed rows"
            );
        }
        self.reconcile_transactions(&loaded.transactions)
    }
}
