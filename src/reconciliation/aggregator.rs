//! Day-level and counterparty-level aggregation of classified transactions

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::types::*;

/// Aggregated view of one run's classified transactions
///
/// Built once by [`aggregate`] and never mutated. Internal sums keep the
/// feed's sign; accessors documented as "exposed" return absolute
/// settlement values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    daily: BTreeMap<(NaiveDate, TransactionKind), DailyAggregate>,
    income_by_counterparty: BTreeMap<String, CounterpartyAggregate>,
    settlements_by_counterparty: BTreeMap<String, CounterpartyAggregate>,
}

impl Aggregates {
    /// All daily aggregates, ordered by date then kind
    pub fn daily(&self) -> impl Iterator<Item = &DailyAggregate> {
        self.daily.values()
    }

    /// Daily aggregate for one date and kind
    pub fn daily_for(&self, date: NaiveDate, kind: TransactionKind) -> Option<&DailyAggregate> {
        self.daily.get(&(date, kind))
    }

    /// Daily aggregates of one kind, ordered by date
    pub fn daily_of_kind(&self, kind: TransactionKind) -> impl Iterator<Item = &DailyAggregate> {
        self.daily.values().filter(move |agg| agg.kind == kind)
    }

    /// Sum of all income
    pub fn total_income(&self) -> BigDecimal {
        self.daily_of_kind(TransactionKind::Income)
            .map(|agg| &agg.amount)
            .sum()
    }

    /// Absolute value of the summed settlements
    pub fn total_settlements(&self) -> BigDecimal {
        let signed: BigDecimal = self
            .daily_of_kind(TransactionKind::Settlement)
            .map(|agg| &agg.amount)
            .sum();
        signed.abs()
    }

    /// `total_income - total_settlements`
    pub fn difference(&self) -> BigDecimal {
        self.total_income() - self.total_settlements()
    }

    pub fn count(&self, kind: TransactionKind) -> usize {
        self.daily_of_kind(kind).map(|agg| agg.count).sum()
    }

    /// Counterparty table for one side, keyed by exact name
    pub fn by_counterparty(&self, kind: TransactionKind) -> &BTreeMap<String, CounterpartyAggregate> {
        match kind {
            TransactionKind::Income => &self.income_by_counterparty,
            TransactionKind::Settlement => &self.settlements_by_counterparty,
        }
    }

    /// Counterparty table ranked by total descending, ties by name
    pub fn ranked(&self, kind: TransactionKind) -> Vec<CounterpartyAggregate> {
        let mut rows: Vec<CounterpartyAggregate> =
            self.by_counterparty(kind).values().cloned().collect();
        rows.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.counterparty.cmp(&b.counterparty))
        });
        rows
    }

    /// First and last date with any movement
    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.daily.keys().next()?.0;
        let last = self.daily.keys().next_back()?.0;
        Some((first, last))
    }

    /// Net movement per date and the running balance after it
    pub fn daily_balances(&self) -> Vec<DailyBalance> {
        let mut net: BTreeMap<NaiveDate, BigDecimal> = BTreeMap::new();
        for agg in self.daily.values() {
            *net.entry(agg.date).or_insert_with(|| BigDecimal::from(0)) += &agg.amount;
        }

        let mut running_balance = BigDecimal::from(0);
        net.into_iter()
            .map(|(date, net_movement)| {
                running_balance += &net_movement;
                DailyBalance {
                    date,
                    net_movement,
                    running_balance: running_balance.clone(),
                }
            })
            .collect()
    }
}

/// Group classified transactions by `(date, kind)` and by counterparty.
/// The result does not depend on input order.
pub fn aggregate(classified: &[ClassifiedTransaction]) -> Aggregates {
    let mut daily: BTreeMap<(NaiveDate, TransactionKind), DailyAggregate> = BTreeMap::new();
    let mut signed_by_counterparty: BTreeMap<(TransactionKind, &str), (BigDecimal, usize)> =
        BTreeMap::new();

    for txn in classified {
        let day = daily
            .entry((txn.date, txn.kind))
            .or_insert_with(|| DailyAggregate {
                date: txn.date,
                kind: txn.kind,
                amount: BigDecimal::from(0),
                count: 0,
            });
        day.amount += &txn.amount;
        day.count += 1;

        let party = signed_by_counterparty
            .entry((txn.kind, txn.counterparty.as_str()))
            .or_insert_with(|| (BigDecimal::from(0), 0));
        party.0 += &txn.amount;
        party.1 += 1;
    }

    let mut aggregates = Aggregates {
        daily,
        ..Aggregates::default()
    };

    for ((kind, counterparty), (signed, count)) in signed_by_counterparty {
        let row = CounterpartyAggregate {
            counterparty: counterparty.to_string(),
            total: signed.abs(),
            count,
        };
        let table = match kind {
            TransactionKind::Income => &mut aggregates.income_by_counterparty,
            TransactionKind::Settlement => &mut aggregates.settlements_by_counterparty,
        };
        table.insert(row.counterparty.clone(), row);
    }

    tracing::debug!(
        days = aggregates.daily.len(),
        banks = aggregates.income_by_counterparty.len(),
        merchants = aggregates.settlements_by_counterparty.len(),
        "Aggregated classified transactions"
    );

    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn sample() -> Vec<ClassifiedTransaction> {
        use TransactionKind::*;
        vec![
            txn(date(8, 30), Income, "Banco Falabella", 40),
            txn(date(8, 31), Settlement, "NoPayments", -10000),
            txn(date(8, 31), Settlement, "Mirador San Juan", -30),
            txn(date(8, 31), Income, "Banco Santander", 847860),
            txn(date(9, 1), Settlement, "NoPayments", -847860),
            txn(date(9, 1), Settlement, "nopayments", -5),
        ]
    }

    #[test]
    fn test_daily_sums_keep_sign() {
        let agg = aggregate(&sample());
        let settled = agg.daily_for(date(8, 31), TransactionKind::Settlement).unwrap();
        assert_eq!(settled.amount, BigDecimal::from(-10030));
        assert_eq!(settled.exposed_amount(), BigDecimal::from(10030));
        assert_eq!(settled.count, 2);
        assert!(agg.daily_for(date(8, 30), TransactionKind::Settlement).is_none());
    }

    #[test]
    fn test_totals() {
        let agg = aggregate(&sample());
        assert_eq!(agg.total_income(), BigDecimal::from(847900));
        assert_eq!(agg.total_settlements(), BigDecimal::from(857895));
        assert_eq!(agg.difference(), BigDecimal::from(-9995));
        assert_eq!(agg.count(TransactionKind::Income), 2);
        assert_eq!(agg.count(TransactionKind::Settlement), 4);
    }

    #[test]
    fn test_counterparty_names_not_normalized() {
        let agg = aggregate(&sample());
        let merchants = agg.by_counterparty(TransactionKind::Settlement);
        assert_eq!(merchants["NoPayments"].total, BigDecimal::from(857860));
        assert_eq!(merchants["NoPayments"].count, 2);
        assert_eq!(merchants["nopayments"].total, BigDecimal::from(5));
    }

    #[test]
    fn test_ranked_by_total_descending() {
        let agg = aggregate(&sample());
        let names: Vec<String> = agg
            .ranked(TransactionKind::Settlement)
            .into_iter()
            .map(|r| r.counterparty)
            .collect();
        assert_eq!(names, vec!["NoPayments", "Mirador San Juan", "nopayments"]);
    }

    #[test]
    fn test_order_independent() {
        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(aggregate(&sample()), aggregate(&reversed));
    }

    #[test]
    fn test_daily_balances_accumulate() {
        let balances = aggregate(&sample()).daily_balances();
        assert_eq!(balances.len(), 3);
        assert_eq!(balances[0].running_balance, BigDecimal::from(40));
        assert_eq!(balances[1].net_movement, BigDecimal::from(837830));
        assert_eq!(balances[2].running_balance, BigDecimal::from(-9995));
    }

    #[test]
    fn test_empty_input() {
        let agg = aggregate(&[]);
        assert_eq!(agg.total_income(), BigDecimal::from(0));
        assert_eq!(agg.total_settlements(), BigDecimal::from(0));
        assert!(agg.period().is_none());
        assert!(agg.daily_balances().is_empty());
    }
}
