#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reshapes analysis results into chart series and map layers.
//!
//! Nothing here computes new statistics; every value comes straight from
//! the analytics report.

pub mod heatmap;

pub use heatmap::{HeatmapMetric, heatmap};

use serde::{Deserialize, Serialize};
use solar_map_analytics_models::{MunicipalityMetrics, RegionBucket};

/// Maximum bars in the top municipalities chart.
pub const TOP_BARS: usize = 10;

/// Maximum points in the income vs. penetration scatter.
pub const MAX_SCATTER_POINTS: usize = 50;

const MAX_LABEL_CHARS: usize = 12;

/// One bar of the top municipalities chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarPoint {
    /// Display label, truncated for the axis.
    pub name: String,
    /// Number of customers.
    pub customers: u64,
    /// Mean income in thousands.
    pub income: f64,
    /// Penetration rate.
    pub penetration: f64,
}

/// One slice of the regional distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    /// Region label.
    pub name: String,
    /// Customers in the region.
    pub value: u64,
}

/// One point of the income vs. penetration scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    /// Mean income.
    pub income: f64,
    /// Penetration rate.
    pub penetration: f64,
    /// Number of customers.
    pub customers: u64,
    /// Municipality name.
    pub name: String,
}

/// All chart series of the analytics dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    /// Top municipalities by customers.
    pub top_municipalities: Vec<BarPoint>,
    /// Customers per region.
    pub regional_distribution: Vec<PieSlice>,
    /// Municipalities with income and penetration data.
    pub scatter_data: Vec<ScatterPoint>,
}

/// Shortens a label to 12 characters plus `"..."`.
#[must_use]
pub fn truncate_label(name: &str) -> String {
    if name.chars().count() > MAX_LABEL_CHARS {
        let head: String = name.chars().take(MAX_LABEL_CHARS).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// Builds the chart series from municipality metrics and regional buckets.
#[must_use]
pub fn to_chart_series(metrics: &[MunicipalityMetrics], regions: &[RegionBucket]) -> ChartSeries {
    let mut by_customers: Vec<&MunicipalityMetrics> = metrics.iter().collect();
    by_customers.sort_by(|a, b| b.customers.cmp(&a.customers));

    let top_municipalities = by_customers
        .into_iter()
        .take(TOP_BARS)
        .map(|m| BarPoint {
            name: truncate_label(&m.name),
            customers: m.customers,
            income: m.avg_income / 1_000.0,
            penetration: m.penetration_rate,
        })
        .collect();

    let regional_distribution = regions
        .iter()
        .map(|r| PieSlice {
            name: r.name.clone(),
            value: r.total_customers,
        })
        .collect();

    let scatter_data = metrics
        .iter()
        .filter(|m| m.avg_income > 0.0 && m.penetration_rate > 0.0)
        .take(MAX_SCATTER_POINTS)
        .map(|m| ScatterPoint {
            income: m.avg_income,
            penetration: m.penetration_rate,
            customers: m.customers,
            name: m.name.clone(),
        })
        .collect();

    ChartSeries {
        top_municipalities,
        regional_distribution,
        scatter_data,
    }
}
