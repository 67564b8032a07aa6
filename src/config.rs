//! Engine configuration: thresholds and description classification rules

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::*;

/// Default flow-verification tolerance, in minor currency units
pub const DEFAULT_TOLERANCE_MINOR_UNITS: i64 = 100_000;

/// Default number of decimal places between minor and major currency units
pub const DEFAULT_MINOR_UNIT_EXPONENT: u32 = 2;

/// Default cutoff below which a movement is flagged as atypically small
pub const DEFAULT_SMALL_AMOUNT_CUTOFF: i64 = 50;

/// Maps descriptions containing `marker` to `kind`, stripping `strip_prefixes`
/// in order to recover the counterparty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub kind: TransactionKind,
    pub marker: String,
    pub strip_prefixes: Vec<String>,
}

impl ClassificationRule {
    pub fn new(kind: TransactionKind, marker: impl Into<String>) -> Self {
        Self {
            kind,
            marker: marker.into(),
            strip_prefixes: Vec::new(),
        }
    }

    /// Add a prefix variant to strip from matching descriptions
    pub fn strip(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefixes.push(prefix.into());
        self
    }

    pub fn matches(&self, description: &str) -> bool {
        description.contains(&self.marker)
    }

    /// Income collected through the multibank PAC channel.
    /// The feed abbreviates the prefix in some rows.
    pub fn pac_income() -> Self {
        Self::new(TransactionKind::Income, "Ingreso por PAC")
            .strip("Ingreso por PAC Multibanco ")
            .strip("Ingreso por PAC Multibco.")
    }

    /// Payout to a merchant
    pub fn merchant_settlement() -> Self {
        Self::new(TransactionKind::Settlement, "Liquidacion a:")
            .strip("Liquidacion a: ")
            .strip("Liquidacion a:")
    }
}

/// What the engine does with transactions that match no rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnclassifiedPolicy {
    /// Fail the run on the first unclassified transaction
    Abort,
    /// Keep going and list the failures in the report
    #[default]
    Collect,
}

/// Reconciliation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Income/settlement gap, in minor units, from which a day is mismatched
    pub tolerance_minor_units: i64,
    /// Decimal places of the minor unit (2 for cents)
    pub minor_unit_exponent: u32,
    /// Movements with `|amount|` strictly below this are outliers
    pub small_amount_cutoff: BigDecimal,
    /// Classification rules, first match wins
    pub rules: Vec<ClassificationRule>,
    pub unclassified: UnclassifiedPolicy,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            tolerance_minor_units: DEFAULT_TOLERANCE_MINOR_UNITS,
            minor_unit_exponent: DEFAULT_MINOR_UNIT_EXPONENT,
            small_amount_cutoff: BigDecimal::from(DEFAULT_SMALL_AMOUNT_CUTOFF),
            rules: vec![
                ClassificationRule::pac_income(),
                ClassificationRule::merchant_settlement(),
            ],
            unclassified: UnclassifiedPolicy::default(),
        }
    }
}

impl ReconciliationConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> ReconciliationResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Flow-verification tolerance in currency units
    pub fn tolerance(&self) -> BigDecimal {
        BigDecimal::new(self.tolerance_minor_units.into(), i64::from(self.minor_unit_exponent))
    }

    pub fn with_tolerance_minor_units(mut self, tolerance: i64) -> Self {
        self.tolerance_minor_units = tolerance;
        self
    }

    pub fn with_small_amount_cutoff(mut self, cutoff: BigDecimal) -> Self {
        self.small_amount_cutoff = cutoff;
        self
    }

    pub fn with_unclassified_policy(mut self, policy: UnclassifiedPolicy) -> Self {
        self.unclassified = policy;
        self
    }

    /// Validate thresholds and rules
    pub fn validate(&self) -> ReconciliationResult<()> {
        if self.tolerance_minor_units < 0 {
            return Err(ReconciliationError::Config(format!(
                "tolerance cannot be negative: {}",
                self.tolerance_minor_units
            )));
        }

        if self.minor_unit_exponent > 6 {
            return Err(ReconciliationError::Config(format!(
                "minor unit exponent out of range: {}",
                self.minor_unit_exponent
            )));
        }

        if self.small_amount_cutoff < BigDecimal::from(0) {
            return Err(ReconciliationError::Config(format!(
                "small amount cutoff cannot be negative: {}",
                self.small_amount_cutoff
            )));
        }

        if self.rules.is_empty() {
            return Err(ReconciliationError::Config(
                "at least one classification rule is required".to_string(),
            ));
        }

        if let Some(rule) = self.rules.iter().find(|r| r.marker.trim().is_empty()) {
            return Err(ReconciliationError::Config(format!(
                "{} rule has an empty marker",
                rule.kind.label()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReconciliationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tolerance_minor_units, 100000);
        assert_eq!(config.tolerance(), BigDecimal::from(1000));
        assert_eq!(config.small_amount_cutoff, BigDecimal::from(50));
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.unclassified, UnclassifiedPolicy::Collect);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = ReconciliationConfig::default().with_tolerance_minor_units(-1);
        assert!(matches!(
            config.validate(),
            Err(ReconciliationError::Config(_))
        ));
    }

    #[test]
    fn test_empty_marker_rejected() {
        let mut config = ReconciliationConfig::default();
        config
            .rules
            .push(ClassificationRule::new(TransactionKind::Settlement, "  "));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ReconciliationConfig =
            serde_json::from_str(r#"{"minor_unit_exponent": 0, "unclassified": "abort"}"#)
                .unwrap();
        assert_eq!(config.tolerance(), BigDecimal::from(100000));
        assert_eq!(config.small_amount_cutoff, BigDecimal::from(50));
        assert_eq!(config.unclassified, UnclassifiedPolicy::Abort);
        assert_eq!(config.rules[0], ClassificationRule::pac_income());
    }
}
