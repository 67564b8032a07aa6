//! Delimited (CSV) exports of the report tables

use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::*;

pub const BANK_TABLE_FILE: &str = "by_bank.csv";
pub const MERCHANT_TABLE_FILE: &str = "by_merchant.csv";
pub const FLOW_TABLE_FILE: &str = "flow_verification.csv";
pub const SMALL_AMOUNTS_FILE: &str = "small_amounts.csv";

#[derive(Serialize)]
struct CounterpartyRow<'a> {
    counterparty: &'a str,
    total: String,
    count: usize,
}

#[derive(Serialize)]
struct FlowRow {
    income_date: String,
    income_amount: String,
    expected_settlement_date: String,
    actual_settled_amount: String,
    difference: String,
    status: String,
}

#[derive(Serialize)]
struct MovementRow<'a> {
    date: String,
    description: &'a str,
    amount: String,
}

/// Write a counterparty table (bank or merchant side)
pub fn write_counterparty_table<W: Write>(
    writer: W,
    rows: &[CounterpartyAggregate],
) -> ReconciliationResult<()> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    for row in rows {
        wrt.serialize(CounterpartyRow {
            counterparty: &row.counterparty,
            total: row.total.to_string(),
            count: row.count,
        })?;
    }
    wrt.flush()?;
    Ok(())
}

/// Write the flow-verification rows
pub fn write_flow_verification<W: Write>(
    writer: W,
    entries: &[FlowVerificationEntry],
) -> ReconciliationResult<()> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    for entry in entries {
        wrt.serialize(FlowRow {
            income_date: entry.income_date.format("%Y-%m-%d").to_string(),
            income_amount: entry.income_amount.to_string(),
            expected_settlement_date: entry.expected_settlement_date.format("%Y-%m-%d").to_string(),
            actual_settled_amount: entry.actual_settled_amount.to_string(),
            difference: entry.difference().to_string(),
            status: entry.status.to_string(),
        })?;
    }
    wrt.flush()?;
    Ok(())
}

/// Write raw movements (used for the small-amount annex)
pub fn write_movements<W: Write>(
    writer: W,
    transactions: &[ClassifiedTransaction],
) -> ReconciliationResult<()> {
    let mut wrt = WriterBuilder::new().from_writer(writer);
    for txn in transactions {
        wrt.serialize(MovementRow {
            date: txn.date.format("%Y-%m-%d").to_string(),
            description: &txn.description,
            amount: txn.amount.to_string(),
        })?;
    }
    wrt.flush()?;
    Ok(())
}

/// Write every table into `dir`, returning the created paths
pub fn export_tables(
    report: &ReconciliationReport,
    dir: impl AsRef<Path>,
) -> ReconciliationResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let bank = dir.join(BANK_TABLE_FILE);
    write_counterparty_table(std::fs::File::create(&bank)?, &report.income_by_counterparty)?;

    let merchant = dir.join(MERCHANT_TABLE_FILE);
    write_counterparty_table(
        std::fs::File::create(&merchant)?,
        &report.settlements_by_counterparty,
    )?;

    let flow = dir.join(FLOW_TABLE_FILE);
    write_flow_verification(std::fs::File::create(&flow)?, &report.flow_verification)?;

    let small = dir.join(SMALL_AMOUNTS_FILE);
    write_movements(std::fs::File::create(&small)?, &report.small_amount_transactions)?;

    tracing::debug!(dir = %dir.display(), "Exported report tables");
    Ok(vec![bank, merchant, flow, small])
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    #[test]
    fn test_counterparty_csv() {
        let rows = vec![
            CounterpartyAggregate {
                counterparty: "Banco Santander".to_string(),
                total: BigDecimal::from(3286922),
                count: 1,
            },
            CounterpartyAggregate {
                counterparty: "Banco, Falabella".to_string(),
                total: BigDecimal::from(40),
                count: 2,
            },
        ];
        let mut buf = Vec::new();
        write_counterparty_table(&mut buf, &rows).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "counterparty,total,count\nBanco Santander,3286922,1\n\"Banco, Falabella\",40,2\n"
        );
    }

    #[test]
    fn test_flow_csv() {
        let entries = vec![FlowVerificationEntry {
            income_date: NaiveDate::from_ymd_opt(2022, 8, 30).unwrap(),
            income_amount: BigDecimal::from(40),
            expected_settlement_date: NaiveDate::from_ymd_opt(2022, 8, 31).unwrap(),
            actual_settled_amount: BigDecimal::from(10030),
            status: FlowStatus::Mismatched,
        }];
        let mut buf = Vec::new();
        write_flow_verification(&mut buf, &entries).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("income_date,income_amount,expected_settlement_date,actual_settled_amount,difference,status")
        );
        assert_eq!(lines.next(), Some("2022-08-30,40,2022-08-31,10030,-9990,ERROR"));
    }
}
