//! Anomaly detection rules and the detector that runs them in order

use bigdecimal::BigDecimal;
use std::collections::BTreeMap;

use crate::config::ReconciliationConfig;
use crate::traits::*;
use crate::types::*;
use crate::utils::amount::format_amount;

/// Emits one anomaly when total income and total settlements differ at all
#[derive(Debug, Clone, Copy, Default)]
pub struct ImbalanceRule;

impl AnomalyRule for ImbalanceRule {
    fn category(&self) -> AnomalyCategory {
        AnomalyCategory::ImbalanceDetected
    }

    fn detect(&self, input: &DetectionInput<'_>) -> Vec<Finding> {
        let total_income = input.aggregates.total_income();
        let total_settlements = input.aggregates.total_settlements();
        if total_income == total_settlements {
            return Vec::new();
        }

        let gap = (&total_income - &total_settlements).abs();
        vec![Finding::new(
            self.category(),
            format!(
                "Difference of ${} between income (${}) and settlements (${})",
                format_amount(&gap),
                format_amount(&total_income),
                format_amount(&total_settlements)
            ),
            ImpactMagnitude::Amount(gap),
        )]
    }
}

/// Flags every movement with `|amount| < cutoff`, as a single anomaly
#[derive(Debug, Clone)]
pub struct SmallAmountRule {
    cutoff: BigDecimal,
}

impl SmallAmountRule {
    pub fn new(cutoff: BigDecimal) -> Self {
        Self { cutoff }
    }
}

impl AnomalyRule for SmallAmountRule {
    fn category(&self) -> AnomalyCategory {
        AnomalyCategory::SmallAmountOutlier
    }

    fn detect(&self, input: &DetectionInput<'_>) -> Vec<Finding> {
        let count = input
            .classified
            .iter()
            .filter(|txn| txn.amount.abs() < self.cutoff)
            .count();
        if count == 0 {
            return Vec::new();
        }

        vec![Finding::new(
            self.category(),
            format!(
                "{} movements with amounts below ${}",
                count,
                format_amount(&self.cutoff)
            ),
            ImpactMagnitude::Count(count),
        )]
    }
}

/// The records behind [`SmallAmountRule`], in input order
pub fn small_amount_transactions(
    classified: &[ClassifiedTransaction],
    cutoff: &BigDecimal,
) -> Vec<ClassifiedTransaction> {
    classified
        .iter()
        .filter(|txn| txn.amount.abs() < *cutoff)
        .cloned()
        .collect()
}

/// Groups merchant names that only differ by case
///
/// Variant totals are recomputed over every transaction whose description
/// contains the variant verbatim. When one variant is a substring of
/// another, the longer variant's records are counted under both.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateCounterpartyRule;

impl DuplicateCounterpartyRule {
    fn variant_totals(name: &str, classified: &[ClassifiedTransaction]) -> CounterpartyVariant {
        let matching: Vec<&ClassifiedTransaction> = classified
            .iter()
            .filter(|txn| txn.description.contains(name))
            .collect();
        let signed: BigDecimal = matching.iter().map(|txn| &txn.amount).sum();

        CounterpartyVariant {
            name: name.to_string(),
            total: signed.abs(),
            count: matching.len(),
        }
    }
}

impl AnomalyRule for DuplicateCounterpartyRule {
    fn category(&self) -> AnomalyCategory {
        AnomalyCategory::DuplicateCounterpartyName
    }

    fn detect(&self, input: &DetectionInput<'_>) -> Vec<Finding> {
        let mut groups: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for name in input
            .aggregates
            .by_counterparty(TransactionKind::Settlement)
            .keys()
        {
            groups.entry(name.to_lowercase()).or_default().push(name.as_str());
        }

        groups
            .into_values()
            .filter(|names| names.len() > 1)
            .map(|names| {
                let variants: Vec<CounterpartyVariant> = names
                    .iter()
                    .map(|name| Self::variant_totals(name, input.classified))
                    .collect();

                let listing = variants
                    .iter()
                    .map(|v| {
                        format!(
                            "'{}' (${} in {} movements)",
                            v.name,
                            format_amount(&v.total),
                            v.count
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let records = variants.iter().map(|v| v.count).sum();

                Finding {
                    category: self.category(),
                    description: format!(
                        "Merchant recorded under {} spellings: {}",
                        variants.len(),
                        listing
                    ),
                    impact_magnitude: ImpactMagnitude::Count(records),
                    variants,
                }
            })
            .collect()
    }
}

/// Runs every rule, in order, and numbers the results
pub struct AnomalyDetector {
    rules: Vec<Box<dyn AnomalyRule>>,
}

impl AnomalyDetector {
    /// Detector with the standard rules: imbalance, small amounts, duplicate names
    pub fn new(config: &ReconciliationConfig) -> Self {
        Self::with_rules(vec![
            Box::new(ImbalanceRule),
            Box::new(SmallAmountRule::new(config.small_amount_cutoff.clone())),
            Box::new(DuplicateCounterpartyRule),
        ])
    }

    /// Detector with custom rules, evaluated in the given order
    pub fn with_rules(rules: Vec<Box<dyn AnomalyRule>>) -> Self {
        Self { rules }
    }

    pub fn detect(&self, input: &DetectionInput<'_>) -> Vec<Anomaly> {
        let anomalies: Vec<Anomaly> = self
            .rules
            .iter()
            .flat_map(|rule| rule.detect(input))
            .enumerate()
            .map(|(index, finding)| finding.into_anomaly(index + 1))
            .collect();

        tracing::debug!(anomalies = anomalies.len(), "Anomaly detection complete");
        anomalies
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(&ReconciliationConfig::default())
    }
}
