#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report export for the solar adoption analytics.
//!
//! [`to_csv`] writes one row per municipality in aggregation order and
//! [`to_pdf`] renders a one-page summary with the top growth predictions.

pub mod csv_report;
pub mod pdf_report;

pub use csv_report::{CSV_HEADER, to_csv};
pub use pdf_report::{to_pdf, to_pdf_at};

use thiserror::Error;

/// Errors that can occur while exporting a report.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The CSV writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV output could not be finalized.
    #[error("CSV output error: {message}")]
    CsvOutput {
        /// Description of what went wrong.
        message: String,
    },

    /// The PDF document could not be built.
    #[error("PDF error: {0}")]
    Pdf(#[from] printpdf::Error),
}
