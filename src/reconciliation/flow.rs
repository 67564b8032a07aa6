//! Flow verification: income on day D must settle on the next business day

use bigdecimal::BigDecimal;

use crate::reconciliation::Aggregates;
use crate::types::*;
use crate::utils::calendar::next_business_day;

/// Compares each income day with the settlements of its next business day
#[derive(Debug, Clone, PartialEq)]
pub struct FlowVerifier {
    tolerance: BigDecimal,
}

impl FlowVerifier {
    /// Create a verifier; gaps strictly below `tolerance` count as matched
    pub fn new(tolerance: BigDecimal) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> &BigDecimal {
        &self.tolerance
    }

    /// One entry per date with nonzero income, ordered by income date.
    ///
    /// Income days sharing an expected settlement date are each compared
    /// against that date's full settled total, so one settlement can back
    /// several income days.
    pub fn verify(&self, aggregates: &Aggregates) -> Vec<FlowVerificationEntry> {
        let zero = BigDecimal::from(0);

        let entries: Vec<FlowVerificationEntry> = aggregates
            .daily_of_kind(TransactionKind::Income)
            .filter(|income| income.amount != zero)
            .map(|income| {
                let expected_settlement_date = next_business_day(income.date);
                let actual_settled_amount = aggregates
                    .daily_for(expected_settlement_date, TransactionKind::Settlement)
                    .map(|settled| settled.exposed_amount())
                    .unwrap_or_else(|| zero.clone());

                let gap = (&income.amount - &actual_settled_amount).abs();
                let status = if gap < self.tolerance {
                    FlowStatus::Matched
                } else {
                    FlowStatus::Mismatched
                };

                FlowVerificationEntry {
                    income_date: income.date,
                    income_amount: income.amount.clone(),
                    expected_settlement_date,
                    actual_settled_amount,
                    status,
                }
            })
            .collect();

        tracing::debug!(
            income_days = entries.len(),
            mismatched = entries.iter().filter(|e| !e.is_matched()).count(),
            "Flow verification complete"
        );

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconciliationConfig;
    use crate::reconciliation::aggregate;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, m, d).unwrap()
    }

    fn txn(date: NaiveDate, kind: TransactionKind, party: &str, amount: i64) -> ClassifiedTransaction {
        ClassifiedTransaction {
            date,
            description: party.to_string(),
            amount: BigDecimal::from(amount),
            kind,
            counterparty: party.to_string(),
        }
    }

    fn verifier() -> FlowVerifier {
        FlowVerifier::new(ReconciliationConfig::default().tolerance())
    }

    #[test]
    fn test_small_income_large_settlement_is_mismatched() {
        use TransactionKind::*;
        let agg = aggregate(&[
            txn(date(8, 30), Income, "Banco Falabella", 40),
            txn(date(8, 31), Settlement, "NoPayments", -10000),
            txn(date(8, 31), Settlement, "Mirador San Juan", -30),
        ]);

        let flow = verifier().verify(&agg);
        assert_eq!(flow.len(), 1);
        assert_eq!(flow[0].expected_settlement_date, date(8, 31));
        assert_eq!(flow[0].actual_settled_amount, BigDecimal::from(10030));
        assert_eq!(flow[0].difference(), BigDecimal::from(-9990));
        assert_eq!(flow[0].status, FlowStatus::Mismatched);

        let loose = FlowVerifier::new(BigDecimal::from(100000)).verify(&agg);
        assert_eq!(loose[0].status, FlowStatus::Matched);
    }

    #[test]
    fn test_bundled_settlements_match() {
        use TransactionKind::*;
        let agg = aggregate(&[
            txn(date(9, 1), Income, "Banco Santander", 3286922),
            txn(date(9, 2), Settlement, "NoPayments", -3286820),
            txn(date(9, 2), Settlement, "Mirador San Juan", -102),
        ]);

        let flow = verifier().verify(&agg);
        assert_eq!(flow[0].actual_settled_amount, BigDecimal::from(3286922));
        assert_eq!(flow[0].status, FlowStatus::Matched);
    }

    #[test]
    fn test_missing_settlement_counts_as_zero() {
        use TransactionKind::*;
        let agg = aggregate(&[txn(date(9, 8), Income, "BCI", 250000)]);

        let flow = verifier().verify(&agg);
        assert_eq!(flow[0].expected_settlement_date, date(9, 9));
        assert_eq!(flow[0].actual_settled_amount, BigDecimal::from(0));
        assert_eq!(flow[0].status, FlowStatus::Mismatched);
    }

    #[test]
    fn test_friday_and_weekend_income_share_monday() {
        use TransactionKind::*;
        let agg = aggregate(&[
            txn(date(9, 2), Income, "BCI", 500000),
            txn(date(9, 3), Income, "BCI", 500500),
            txn(date(9, 5), Settlement, "NoPayments", -500000),
        ]);

        let flow = verifier().verify(&agg);
        assert_eq!(flow.len(), 2);
        assert_eq!(flow[0].expected_settlement_date, date(9, 5));
        assert_eq!(flow[1].expected_settlement_date, date(9, 5));
        // both compared against the same Monday total
        assert_eq!(flow[0].status, FlowStatus::Matched);
        assert_eq!(flow[1].status, FlowStatus::Matched);
    }

    #[test]
    fn test_zero_income_day_is_skipped() {
        use TransactionKind::*;
        let agg = aggregate(&[
            txn(date(9, 6), Income, "BCI", 100),
            txn(date(9, 6), Income, "BCI", -100),
            txn(date(9, 7), Income, "BCI", 100),
        ]);

        let flow = verifier().verify(&agg);
        assert_eq!(flow.len(), 1);
        assert_eq!(flow[0].income_date, date(9, 7));
    }

    #[test]
    fn test_gap_equal_to_tolerance_is_mismatched() {
        use TransactionKind::*;
        let agg = aggregate(&[txn(date(9, 6), Income, "BCI", 1000)]);
        assert_eq!(verifier().verify(&agg)[0].status, FlowStatus::Mismatched);
    }

    #[test]
    fn test_entries_sorted_by_income_date() {
        use TransactionKind::*;
        let agg = aggregate(&[
            txn(date(9, 14), Income, "BCI", 1),
            txn(date(8, 8), Income, "BCI", 1),
            txn(date(8, 22), Income, "BCI", 1),
        ]);
        let dates: Vec<NaiveDate> = verifier().verify(&agg).iter().map(|e| e.income_date).collect();
        assert_eq!(dates, vec![date(8, 8), date(8, 22), date(9, 14)]);
    }
}
