//! CSV feed reader: `date,description,amount` with a header row

use async_trait::async_trait;
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::traits::*;
use crate::types::*;
use crate::utils::validation::parse_record;

/// Transactions read from a CSV file on disk
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TransactionSource for CsvSource {
    async fn load(&self) -> ReconciliationResult<LoadedRecords> {
        let bytes = tokio::fs::read(&self.path).await?;
        let records = read_csv(bytes.as_slice())?;

        if records.is_empty() {
            return Err(ReconciliationError::EmptyDataset(self.describe()));
        }

        tracing::debug!(
            source = %self.path.display(),
            loaded = records.transactions.len(),
            rejected = records.rejected.len(),
            "CSV feed loaded"
        );
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
}

impl Columns {
    fn from_header(header: &StringRecord) -> ReconciliationResult<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    ReconciliationError::Config(format!("missing '{}' column in CSV header", name))
                })
        };

        Ok(Self {
            date: find("date")?,
            description: find("description")?,
            amount: find("amount")?,
        })
    }

    /// Decode the three fields of a row. Fields that are not valid UTF-8
    /// are decoded lossily and reported as the rejection reason.
    fn raw(&self, record: &ByteRecord) -> (RawRecord, Option<String>) {
        let mut invalid = Vec::new();
        let mut field = |i: usize, name: &'static str| {
            let bytes = record.get(i).unwrap_or_default();
            match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    invalid.push(name);
                    String::from_utf8_lossy(bytes).into_owned()
                }
            }
        };

        let raw = RawRecord {
            date: field(self.date, "date"),
            description: field(self.description, "description"),
            amount: field(self.amount, "amount"),
        };
        let reason = if invalid.is_empty() {
            None
        } else {
            Some(format!("invalid UTF-8 in {} field", invalid.join(", ")))
        };
        (raw, reason)
    }
}

/// Parse a whole CSV document. Rows that fail to parse, including rows that
/// are not valid UTF-8, are collected in `rejected` with their line number.
pub fn read_csv<R: Read>(reader: R) -> ReconciliationResult<LoadedRecords> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns = Columns::from_header(rdr.headers()?)?;
    let mut loaded = LoadedRecords::default();

    for (index, row) in rdr.byte_records().enumerate() {
        let record = row?;
        // header is line 1
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);

        let parsed = match columns.raw(&record) {
            (raw, None) => parse_record(line, raw),
            (raw, Some(reason)) => Err(RecordParseError {
                line,
                record: raw,
                reason,
            }),
        };

        match parsed {
            Ok(transaction) => loaded.transactions.push(transaction),
            Err(err) => {
                tracing::warn!(line = err.line, reason = %err.reason, "Rejected input row");
                loaded.rejected.push(err);
            }
        }
    }

    Ok(loaded)
}
