//! Record classification: kind and counterparty from the free-text description

use crate::config::{ClassificationRule, ReconciliationConfig};
use crate::types::*;

/// Classifies raw transactions with an ordered list of rules
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&ReconciliationConfig::default())
    }
}

impl Classifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &ReconciliationConfig) -> Self {
        Self::new(config.rules.clone())
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Classify one transaction. The first rule whose marker appears in the
    /// description decides the kind; there is no fallback kind.
    pub fn classify(
        &self,
        transaction: &Transaction,
    ) -> Result<ClassifiedTransaction, ClassificationError> {
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.matches(&transaction.description))
            .ok_or_else(|| ClassificationError {
                transaction: transaction.clone(),
                reason: "description matches no income or settlement marker".to_string(),
            })?;

        let counterparty = extract_counterparty(rule, &transaction.description);
        if counterparty.is_empty() {
            return Err(ClassificationError {
                transaction: transaction.clone(),
                reason: format!(
                    "no counterparty left after removing the {} prefix",
                    rule.kind.label().to_lowercase()
                ),
            });
        }

        Ok(ClassifiedTransaction {
            date: transaction.date,
            description: transaction.description.clone(),
            amount: transaction.amount.clone(),
            kind: rule.kind,
            counterparty,
        })
    }
}

/// Remove every prefix variant, in rule order.
/// Without any variant the whole description names the counterparty.
fn extract_counterparty(rule: &ClassificationRule, description: &str) -> String {
    rule.strip_prefixes
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .fold(description.to_string(), |name, prefix| {
            name.replace(prefix.as_str(), "")
        })
        .trim()
        .to_string()
}

/// Classify with the default PAC income / merchant settlement rules
pub fn classify(transaction: &Transaction) -> Result<ClassifiedTransaction, ClassificationError> {
    Classifier::default().classify(transaction)
}
