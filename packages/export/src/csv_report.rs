//! Spreadsheet export of per-municipality metrics.

use serde::{Deserialize, Serialize};
use solar_map_analytics_models::AnalysisReport;

use crate::ExportError;

/// Column names, in order.
pub const CSV_HEADER: [&str; 6] = [
    "Municipio",
    "Clientes",
    "Ingreso Promedio",
    "Población",
    "Penetración %",
    "Categoría",
];

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    /// Municipality name.
    #[serde(rename = "Municipio")]
    pub name: String,
    /// Number of customers.
    #[serde(rename = "Clientes")]
    pub customers: u64,
    /// Mean household income, rounded.
    #[serde(rename = "Ingreso Promedio")]
    pub avg_income: i64,
    /// Mean population, rounded.
    #[serde(rename = "Población")]
    pub avg_population: i64,
    /// Penetration rate with two decimals.
    #[serde(rename = "Penetración %")]
    pub penetration: String,
    /// Market category label.
    #[serde(rename = "Categoría")]
    pub category: String,
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i64(value: f64) -> i64 {
    value.round() as i64
}

/// Builds the export rows in aggregation order.
#[must_use]
pub fn rows(report: &AnalysisReport) -> Vec<CsvRow> {
    report
        .municipalities
        .iter()
        .map(|m| CsvRow {
            name: m.name.clone(),
            customers: m.customers,
            avg_income: round_to_i64(m.avg_income),
            avg_population: round_to_i64(m.avg_population),
            penetration: format!("{:.2}", m.penetration_rate),
            category: report
                .classification_for(&m.name)
                .map(|c| c.category.to_string())
                .unwrap_or_default(),
        })
        .collect()
}

/// Renders the report as CSV with a header row.
///
/// # Errors
///
/// Returns [`ExportError`] if a row cannot be written.
pub fn to_csv(report: &AnalysisReport) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let rows = rows(report);

    if rows.is_empty() {
        writer.write_record(CSV_HEADER)?;
    }
    for row in &rows {
        writer.serialize(row)?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::CsvOutput {
        message: e.to_string(),
    })?;
    log::debug!("Exported {} municipalities to CSV", rows.len());

    String::from_utf8(bytes).map_err(|e| ExportError::CsvOutput {
        message: e.to_string(),
    })
}
