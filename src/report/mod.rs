//! Presentation layer over [`ReconciliationReport`]: text reports and
//! delimited exports. Every renderer is a total function of the report.

pub mod export;
pub mod text;

pub use export::*;
pub use text::*;

pub use crate::utils::amount::format_amount;

use serde::{Deserialize, Serialize};

use crate::types::ReconciliationReport;

/// Available text report layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Headline figures and the anomaly list
    Executive,
    /// Full tables: banks, merchants, flow verification, anomalies
    Detailed,
    /// Key figures with annexes
    Combined,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [
        ReportFormat::Executive,
        ReportFormat::Detailed,
        ReportFormat::Combined,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportFormat::Executive => "executive",
            ReportFormat::Detailed => "detailed",
            ReportFormat::Combined => "combined",
        }
    }

    /// Output file name, e.g. `report_executive.txt`
    pub fn file_name(&self) -> String {
        format!("report_{}.txt", self.name())
    }

    pub fn render(&self, report: &ReconciliationReport) -> String {
        match self {
            ReportFormat::Executive => render_executive(report),
            ReportFormat::Detailed => render_detailed(report),
            ReportFormat::Combined => render_combined(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_file_names() {
        let names: Vec<String> = ReportFormat::ALL.iter().map(|f| f.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "report_executive.txt",
                "report_detailed.txt",
                "report_combined.txt"
            ]
        );
    }
}
