//! Core types and data structures for the reconciliation engine

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a cash movement on the settlement account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Inbound collection from a payer's bank (PAC income)
    Income,
    /// Outbound payout to a merchant
    Settlement,
}

impl TransactionKind {
    /// Human-readable label used by the renderers
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Settlement => "Settlement",
        }
    }
}

/// Raw transaction as read from the source feed
///
/// Income carries a positive amount and settlements a negative one, by
/// convention of the feed. Immutable once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Calendar date of the movement
    pub date: NaiveDate,
    /// Free-text description, including the bank or merchant name
    pub description: String,
    /// Signed amount
    pub amount: BigDecimal,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
        }
    }
}

/// Transaction tagged with its kind and counterparty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    pub date: NaiveDate,
    pub description: String,
    /// Signed amount, exactly as in the feed
    pub amount: BigDecimal,
    pub kind: TransactionKind,
    /// Payer bank (income) or merchant (settlement), never empty
    pub counterparty: String,
}

impl ClassifiedTransaction {
    /// Amount as shown externally: signed for income, absolute for settlements
    pub fn exposed_amount(&self) -> BigDecimal {
        match self.kind {
            TransactionKind::Income => self.amount.clone(),
            TransactionKind::Settlement => self.amount.abs(),
        }
    }
}

/// Signed sum and count of all transactions of one kind on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    /// Signed sum, as stored in the feed
    pub amount: BigDecimal,
    pub count: usize,
}

impl DailyAggregate {
    /// Amount as shown externally: signed for income, absolute for settlements
    pub fn exposed_amount(&self) -> BigDecimal {
        match self.kind {
            TransactionKind::Income => self.amount.clone(),
            TransactionKind::Settlement => self.amount.abs(),
        }
    }
}

/// Totals for one counterparty name, keyed by its exact original casing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyAggregate {
    pub counterparty: String,
    /// Absolute value of the summed amounts
    pub total: BigDecimal,
    pub count: usize,
}

/// Outcome of comparing a day's income with the next business day's settlements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowStatus {
    Matched,
    Mismatched,
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowStatus::Matched => write!(f, "OK"),
            FlowStatus::Mismatched => write!(f, "ERROR"),
        }
    }
}

/// One row of the income -> next-business-day settlement check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowVerificationEntry {
    pub income_date: NaiveDate,
    pub income_amount: BigDecimal,
    pub expected_settlement_date: NaiveDate,
    /// Absolute settled amount on the expected date, zero when nothing settled
    pub actual_settled_amount: BigDecimal,
    pub status: FlowStatus,
}

impl FlowVerificationEntry {
    /// Income minus what was settled on the expected date
    pub fn difference(&self) -> BigDecimal {
        &self.income_amount - &self.actual_settled_amount
    }

    pub fn is_matched(&self) -> bool {
        self.status == FlowStatus::Matched
    }
}

/// Categories of anomalies, in the order the detector evaluates them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnomalyCategory {
    /// Total income differs from total settlements
    ImbalanceDetected,
    /// Movements below the small-amount cutoff
    SmallAmountOutlier,
    /// Merchant names that only differ by case
    DuplicateCounterpartyName,
}

impl AnomalyCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyCategory::ImbalanceDetected => "Financial imbalance",
            AnomalyCategory::SmallAmountOutlier => "Atypical amounts",
            AnomalyCategory::DuplicateCounterpartyName => "Data quality",
        }
    }
}

/// Size of an anomaly, typed per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImpactMagnitude {
    /// Currency amount
    Amount(BigDecimal),
    /// Number of records
    Count(usize),
}

impl fmt::Display for ImpactMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactMagnitude::Amount(amount) => {
                write!(f, "${}", crate::utils::amount::format_amount(amount))
            }
            ImpactMagnitude::Count(1) => write!(f, "1 record"),
            ImpactMagnitude::Count(count) => write!(f, "{} records", count),
        }
    }
}

/// One casing variant of a merchant name inside a duplicate-name group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyVariant {
    pub name: String,
    /// Absolute sum over every description containing `name`
    pub total: BigDecimal,
    pub count: usize,
}

/// A detected anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Sequential within a run, starting at 1
    pub id: usize,
    pub category: AnomalyCategory,
    pub description: String,
    pub impact_magnitude: ImpactMagnitude,
    /// Name variants for `DuplicateCounterpartyName`, empty otherwise
    pub variants: Vec<CounterpartyVariant>,
}

/// Net movement of one date and the balance accumulated up to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBalance {
    pub date: NaiveDate,
    pub net_movement: BigDecimal,
    pub running_balance: BigDecimal,
}

/// Immutable result bundle of one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// First and last transaction date, `None` for an empty run
    pub period: Option<(NaiveDate, NaiveDate)>,
    pub total_income: BigDecimal,
    /// Absolute value of all settlements
    pub total_settlements: BigDecimal,
    /// `total_income - total_settlements`
    pub difference: BigDecimal,
    pub income_count: usize,
    pub settlement_count: usize,
    /// Bank-side table, ranked by total descending
    pub income_by_counterparty: Vec<CounterpartyAggregate>,
    /// Merchant-side table, ranked by total descending
    pub settlements_by_counterparty: Vec<CounterpartyAggregate>,
    /// Ordered by income date ascending
    pub flow_verification: Vec<FlowVerificationEntry>,
    /// Ordered by detection rule
    pub anomalies: Vec<Anomaly>,
    pub daily_balances: Vec<DailyBalance>,
    /// Records behind the small-amount anomaly
    pub small_amount_transactions: Vec<ClassifiedTransaction>,
    /// Transactions that could not be classified, when collected
    pub unclassified: Vec<ClassificationError>,
}

impl ReconciliationReport {
    /// Whether income and settlements cancel out exactly
    pub fn is_balanced(&self) -> bool {
        self.difference == BigDecimal::from(0)
    }

    pub fn mismatched_flows(&self) -> impl Iterator<Item = &FlowVerificationEntry> {
        self.flow_verification.iter().filter(|e| !e.is_matched())
    }
}

/// Raw, unparsed fields of one input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: String,
    pub description: String,
    pub amount: String,
}

/// A raw row that could not be turned into a [`Transaction`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("Invalid record at line {line}: {reason}")]
pub struct RecordParseError {
    /// 1-based line in the source, header included
    pub line: usize,
    pub record: RawRecord,
    pub reason: String,
}

/// A transaction whose description matches no classification rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("Cannot classify '{}' on {}: {reason}", .transaction.description, .transaction.date)]
pub struct ClassificationError {
    pub transaction: Transaction,
    pub reason: String,
}

/// Errors that can occur while loading or reconciling a ledger
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    RecordParse(#[from] RecordParseError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for reconciliation operations
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(kind: TransactionKind, amount: i64) -> ClassifiedTransaction {
        ClassifiedTransaction {
            date: NaiveDate::from_ymd_opt(2022, 9, 1).unwrap(),
            description: "x".to_string(),
            amount: BigDecimal::from(amount),
            kind,
            counterparty: "x".to_string(),
        }
    }

    #[test]
    fn test_exposed_amount_is_absolute_for_settlements() {
        assert_eq!(
            classified(TransactionKind::Settlement, -102).exposed_amount(),
            BigDecimal::from(102)
        );
        assert_eq!(
            classified(TransactionKind::Income, 40).exposed_amount(),
            BigDecimal::from(40)
        );
    }

    #[test]
    fn test_impact_magnitude_display() {
        assert_eq!(
            ImpactMagnitude::Amount(BigDecimal::from(10004)).to_string(),
            "$10,004"
        );
        assert_eq!(ImpactMagnitude::Count(3).to_string(), "3 records");
        assert_eq!(ImpactMagnitude::Count(1).to_string(), "1 record");
    }

    #[test]
    fn test_classification_error_message() {
        let err = ClassificationError {
            transaction: Transaction::new(
                NaiveDate::from_ymd_opt(2022, 8, 8).unwrap(),
                "Transferencia",
                BigDecimal::from(5),
            ),
            reason: "no rule matched".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot classify 'Transferencia' on 2022-08-08: no rule matched"
        );
    }
}
