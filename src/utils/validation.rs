//! Validation and parsing of raw input rows

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use crate::types::*;

/// Accepted date layouts, ISO first
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y-%m-%d %H:%M:%S"];

/// Parse an ISO calendar date, tolerating a trailing midnight timestamp
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("date cannot be empty".to_string());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| {
            NaiveDate::parse_from_str(value, format).ok().or_else(|| {
                chrono::NaiveDateTime::parse_from_str(value, format)
                    .ok()
                    .map(|dt| dt.date())
            })
        })
        .ok_or_else(|| format!("invalid date '{}'", value))
}

/// Parse a signed decimal amount
pub fn parse_amount(value: &str) -> Result<BigDecimal, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("amount cannot be empty".to_string());
    }

    BigDecimal::from_str(value).map_err(|_| format!("invalid amount '{}'", value))
}

/// Validate that a description is usable
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.trim().is_empty() {
        return Err("description cannot be empty".to_string());
    }
    Ok(())
}

/// Turn the raw fields of one row into a [`Transaction`]
pub fn parse_record(line: usize, record: RawRecord) -> Result<Transaction, RecordParseError> {
    let parsed = parse_date(&record.date).and_then(|date| {
        validate_description(&record.description)?;
        let amount = parse_amount(&record.amount)?;
        Ok(Transaction::new(date, record.description.clone(), amount))
    });

    parsed.map_err(|reason| RecordParseError {
        line,
        record,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, description: &str, amount: &str) -> RawRecord {
        RawRecord {
            date: date.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn test_parse_valid_record() {
        let txn = parse_record(
            2,
            raw("2022-08-30", "Ingreso por PAC Multibanco Banco Falabella", "40"),
        )
        .unwrap();
        assert_eq!(txn.date, NaiveDate::from_ymd_opt(2022, 8, 30).unwrap());
        assert_eq!(txn.amount, BigDecimal::from(40));
    }

    #[test]
    fn test_parse_negative_decimal_amount() {
        assert_eq!(
            parse_amount(" -102.50 ").unwrap(),
            BigDecimal::from_str("-102.5").unwrap()
        );
    }

    #[test]
    fn test_parse_date_with_midnight_timestamp() {
        assert_eq!(
            parse_date("2022-09-01 00:00:00").unwrap(),
            NaiveDate::from_ymd_opt(2022, 9, 1).unwrap()
        );
    }

    #[test]
    fn test_bad_date_keeps_offending_row() {
        let err = parse_record(7, raw("01/09/2022", "Liquidacion a: NoPayments", "-10")).unwrap_err();
        assert_eq!(err.line, 7);
        assert_eq!(err.record.date, "01/09/2022");
        assert!(err.reason.contains("invalid date"));
    }

    #[test]
    fn test_bad_amount_rejected() {
        let err = parse_record(3, raw("2022-09-01", "Liquidacion a: NoPayments", "12,5x")).unwrap_err();
        assert!(err.reason.contains("invalid amount"));
    }

    #[test]
    fn test_empty_description_rejected() {
        let err = parse_record(4, raw("2022-09-01", "  ", "10")).unwrap_err();
        assert_eq!(err.reason, "description cannot be empty");
    }
}
