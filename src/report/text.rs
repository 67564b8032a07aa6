//! Plain-text report layouts

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::fmt::{self, Write};

use crate::report::format_amount;
use crate::types::*;

const RULE: &str =
    "================================================================================";

fn banner<W: Write>(out: &mut W, report: &ReconciliationReport, layout: &str) -> fmt::Result {
    let period = match report.period {
        Some((first, last)) => format!("{} - {}", first.format("%b %d"), last.format("%b %d")),
        None => "no movements".to_string(),
    };
    writeln!(out, "{}", RULE)?;
    writeln!(out, "DIRECT DEBIT CLOSING | {} | {} FORMAT", period, layout)?;
    writeln!(out, "{}", RULE)
}

fn heading<W: Write>(out: &mut W, title: &str) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "-".repeat(title.chars().count()))
}

fn annex<W: Write>(out: &mut W, title: &str) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", RULE)
}

fn footer<W: Write>(out: &mut W) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}", RULE)
}

fn money(amount: &BigDecimal) -> String {
    format!("${:>15}", format_amount(amount))
}

fn flow_summary(report: &ReconciliationReport) -> String {
    let total = report.flow_verification.len();
    let matched = report
        .flow_verification
        .iter()
        .filter(|e| e.is_matched())
        .count();
    format!(
        "{} of {} income days settled on the next business day within tolerance.",
        matched, total
    )
}

fn totals<W: Write>(out: &mut W, report: &ReconciliationReport) -> fmt::Result {
    writeln!(
        out,
        "Total PAC income:       {} ({} movements)",
        money(&report.total_income),
        report.income_count
    )?;
    writeln!(
        out,
        "Total settlements:      {} ({} movements)",
        money(&report.total_settlements),
        report.settlement_count
    )
}

fn counterparty_table<W: Write>(
    out: &mut W,
    title: &str,
    rows: &[CounterpartyAggregate],
) -> fmt::Result {
    writeln!(out, "{:<40} {:>16} {:>8}", title, "Total", "Count")?;
    for row in rows {
        writeln!(
            out,
            "{:<40} {:>16} {:>8}",
            row.counterparty,
            format_amount(&row.total),
            row.count
        )?;
    }
    Ok(())
}

fn flow_table<W: Write>(out: &mut W, entries: &[FlowVerificationEntry]) -> fmt::Result {
    writeln!(
        out,
        "{:<12} {:>15} {:<12} {:>15} {:>15} {:<6}",
        "Income date", "Income", "Expected", "Settled", "Difference", "Status"
    )?;
    for entry in entries {
        writeln!(
            out,
            "{:<12} {:>15} {:<12} {:>15} {:>15} {:<6}",
            entry.income_date,
            format_amount(&entry.income_amount),
            entry.expected_settlement_date,
            format_amount(&entry.actual_settled_amount),
            format_amount(&entry.difference()),
            entry.status
        )?;
    }
    Ok(())
}

fn movement_row<W: Write>(
    out: &mut W,
    date: NaiveDate,
    description: &str,
    amount: &BigDecimal,
) -> fmt::Result {
    writeln!(
        out,
        "{:<12} {:<50} {:>12}",
        date,
        description,
        format_amount(amount)
    )
}

fn movement_table<W: Write>(out: &mut W, transactions: &[ClassifiedTransaction]) -> fmt::Result {
    writeln!(out, "{:<12} {:<50} {:>12}", "Date", "Description", "Amount")?;
    for txn in transactions {
        movement_row(out, txn.date, &txn.description, &txn.amount)?;
    }
    Ok(())
}

fn unclassified_section<W: Write>(out: &mut W, report: &ReconciliationReport) -> fmt::Result {
    if report.unclassified.is_empty() {
        return Ok(());
    }
    heading(out, "UNCLASSIFIED MOVEMENTS")?;
    for err in &report.unclassified {
        let txn = &err.transaction;
        movement_row(out, txn.date, &txn.description, &txn.amount)?;
    }
    Ok(())
}

/// Where the combined report sends the reader for each anomaly
fn annex_for(category: AnomalyCategory) -> char {
    match category {
        AnomalyCategory::ImbalanceDetected => 'D',
        AnomalyCategory::SmallAmountOutlier => 'C',
        AnomalyCategory::DuplicateCounterpartyName => 'B',
    }
}

/// Executive layout of a report, see [`render_executive`]
pub struct ExecutiveReport<'a>(pub &'a ReconciliationReport);

impl fmt::Display for ExecutiveReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        banner(out, report, "EXECUTIVE")?;

        heading(out, "FINANCIAL SUMMARY")?;
        totals(out, report)?;
        writeln!(out, "Imbalance:              {}", money(&report.difference))?;

        heading(out, "SETTLEMENT FLOW (income day N -> settlement N+1 business day)")?;
        writeln!(out, "{}", flow_summary(report))?;

        heading(out, "ANOMALIES DETECTED")?;
        if report.anomalies.is_empty() {
            writeln!(out, "None.")?;
        }
        for anomaly in &report.anomalies {
            writeln!(
                out,
                "{}. {}: {}",
                anomaly.id,
                anomaly.category.label().to_uppercase(),
                anomaly.description
            )?;
        }

        footer(out)
    }
}

/// Detailed layout of a report, see [`render_detailed`]
pub struct DetailedReport<'a>(pub &'a ReconciliationReport);

impl fmt::Display for DetailedReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        banner(out, report, "DETAILED")?;

        heading(out, "1. SUMMARY")?;
        totals(out, report)?;
        writeln!(
            out,
            "Final balance:          {}{}",
            money(&report.difference),
            if report.is_balanced() { "" } else { " (IMBALANCE)" }
        )?;

        heading(out, "2. INCOME BY BANK")?;
        counterparty_table(out, "Bank", &report.income_by_counterparty)?;

        heading(out, "3. SETTLEMENTS BY MERCHANT")?;
        counterparty_table(out, "Merchant", &report.settlements_by_counterparty)?;

        heading(out, "4. FLOW VERIFICATION")?;
        flow_table(out, &report.flow_verification)?;
        writeln!(out, "{}", flow_summary(report))?;

        heading(out, "5. ANOMALIES DETECTED")?;
        if report.anomalies.is_empty() {
            writeln!(out, "None.")?;
        }
        for anomaly in &report.anomalies {
            writeln!(out)?;
            writeln!(out, "Anomaly #{}: {}", anomaly.id, anomaly.category.label())?;
            writeln!(out, "  Description: {}", anomaly.description)?;
            writeln!(out, "  Impact: {}", anomaly.impact_magnitude)?;
        }

        unclassified_section(out, report)?;
        footer(out)
    }
}

/// Combined layout of a report, see [`render_combined`]
pub struct CombinedReport<'a>(pub &'a ReconciliationReport);

impl fmt::Display for CombinedReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        banner(out, report, "COMBINED")?;

        heading(out, "KEY FIGURES")?;
        writeln!(out, "Income:         {}", money(&report.total_income))?;
        writeln!(out, "Settlements:    {}", money(&report.total_settlements))?;
        writeln!(out, "Imbalance:      {}", money(&report.difference))?;
        writeln!(out)?;
        writeln!(out, "{}", flow_summary(report))?;

        heading(out, &format!("ANOMALIES DETECTED ({})", report.anomalies.len()))?;
        for anomaly in &report.anomalies {
            writeln!(
                out,
                "  #{} {}: {} (see Annex {})",
                anomaly.id,
                anomaly.category.label(),
                anomaly.impact_magnitude,
                annex_for(anomaly.category)
            )?;
        }

        annex(out, "ANNEX A: INCOME BY BANK")?;
        counterparty_table(out, "Bank", &report.income_by_counterparty)?;

        annex(out, "ANNEX B: SETTLEMENTS BY MERCHANT")?;
        counterparty_table(out, "Merchant", &report.settlements_by_counterparty)?;

        annex(out, "ANNEX C: ATYPICAL MOVEMENTS")?;
        movement_table(out, &report.small_amount_transactions)?;

        annex(out, "ANNEX D: DAILY BALANCE")?;
        writeln!(out, "{:<12} {:>16} {:>16}", "Date", "Net movement", "Balance")?;
        for day in &report.daily_balances {
            writeln!(
                out,
                "{:<12} {:>16} {:>16}",
                day.date,
                format_amount(&day.net_movement),
                format_amount(&day.running_balance)
            )?;
        }

        unclassified_section(out, report)?;
        footer(out)
    }
}

/// Headline figures, flow check and a numbered anomaly list
pub fn render_executive(report: &ReconciliationReport) -> String {
    ExecutiveReport(report).to_string()
}

/// Every table the engine produces, plus full anomaly detail
pub fn render_detailed(report: &ReconciliationReport) -> String {
    DetailedReport(report).to_string()
}

/// Key figures and an anomaly index, with the supporting tables as annexes
pub fn render_combined(report: &ReconciliationReport) -> String {
    CombinedReport(report).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::ReconciliationEngine;

    fn report() -> ReconciliationReport {
        let txn = |d: u32, description: &str, amount: i64| {
            Transaction::new(
                NaiveDate::from_ymd_opt(2022, 8, d).unwrap(),
                description,
                BigDecimal::from(amount),
            )
        };
        ReconciliationEngine::default()
            .reconcile_transactions(&[
                txn(30, "Ingreso por PAC Multibanco Banco Falabella", 40),
                txn(31, "Liquidacion a: NoPayments", -10000),
                txn(31, "Liquidacion a: nopayments", -30),
                txn(31, "Cargo desconocido", -7),
            ])
            .unwrap()
    }

    #[test]
    fn test_executive_lists_anomalies() {
        let text = render_executive(&report());
        assert!(text.contains("DIRECT DEBIT CLOSING | Aug 30 - Aug 31 | EXECUTIVE FORMAT"));
        assert!(text.contains("1. FINANCIAL IMBALANCE: Difference of $9,990"));
        assert!(text.contains("2. ATYPICAL AMOUNTS"));
        assert!(text.contains("3. DATA QUALITY"));
        assert!(text.contains("0 of 1 income days"));
    }

    #[test]
    fn test_detailed_has_all_sections() {
        let text = render_detailed(&report());
        for section in [
            "1. SUMMARY",
            "2. INCOME BY BANK",
            "3. SETTLEMENTS BY MERCHANT",
            "4. FLOW VERIFICATION",
            "5. ANOMALIES DETECTED",
            "UNCLASSIFIED MOVEMENTS",
        ] {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("(IMBALANCE)"));
        assert!(text.contains("Banco Falabella"));
        assert!(text.contains("ERROR"));
        assert!(text.contains("Cargo desconocido"));
    }

    #[test]
    fn test_combined_points_to_annexes() {
        let text = render_combined(&report());
        assert!(text.contains("ANOMALIES DETECTED (3)"));
        assert!(text.contains("(see Annex D)"));
        assert!(text.contains("(see Annex C)"));
        assert!(text.contains("ANNEX C: ATYPICAL MOVEMENTS"));
        assert!(text.contains("Liquidacion a: nopayments"));
        assert!(text.contains("ANNEX D: DAILY BALANCE"));
    }

    #[test]
    fn test_empty_report_renders() {
        let empty = ReconciliationEngine::default().reconcile(&[]);
        assert!(render_executive(&empty).contains("no movements"));
        assert!(render_detailed(&empty).contains("None."));
        assert!(render_combined(&empty).contains("ANOMALIES DETECTED (0)"));
    }

    #[test]
    fn test_layouts_write_into_any_sink() {
        let report = report();
        let mut sink = String::new();
        write!(sink, "{}", DetailedReport(&report)).unwrap();
        assert_eq!(sink, render_detailed(&report));
        assert!(sink.ends_with(&format!("{}\n", RULE)));
    }
}
