//! Descriptive statistics: correlation, outliers and dataset totals.

use solar_map_analytics_models::{AnalysisSummary, Anomaly, Correlations, MunicipalityMetrics};

/// Standard score above which a customer count is an outlier.
pub const ANOMALY_Z_THRESHOLD: f64 = 2.0;

/// Maximum number of outliers reported.
pub const MAX_ANOMALIES: usize = 5;

/// Pearson product-moment correlation of two series.
///
/// Returns 0 when the series are empty, differ in length, or either has
/// zero variance. The result is clamped to `[-1, 1]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() || x.len() != y.len() || is_constant(x) || is_constant(y) {
        return 0.0;
    }

    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|b| b * b).sum();

    let numerator = n.mul_add(sum_xy, -(sum_x * sum_y));
    let denominator =
        (n.mul_add(sum_x2, -(sum_x * sum_x)) * n.mul_add(sum_y2, -(sum_y * sum_y))).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    (numerator / denominator).clamp(-1.0, 1.0)
}

#[allow(clippy::float_cmp)]
fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Correlations between income, population, penetration and customers,
/// over municipalities that have both income and population data.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn correlations(metrics: &[MunicipalityMetrics]) -> Correlations {
    let valid: Vec<&MunicipalityMetrics> = metrics
        .iter()
        .filter(|m| m.avg_income > 0.0 && m.avg_population > 0.0)
        .collect();

    let incomes: Vec<f64> = valid.iter().map(|m| m.avg_income).collect();
    let populations: Vec<f64> = valid.iter().map(|m| m.avg_population).collect();
    let penetrations: Vec<f64> = valid.iter().map(|m| m.penetration_rate).collect();
    let customers: Vec<f64> = valid.iter().map(|m| m.customers as f64).collect();

    Correlations {
        income_vs_penetration: pearson(&incomes, &penetrations),
        population_vs_customers: pearson(&populations, &customers),
        income_vs_customers: pearson(&incomes, &customers),
    }
}

/// Municipalities whose customer count lies more than two population
/// standard deviations from the mean, largest deviation first.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn anomalies(metrics: &[MunicipalityMetrics]) -> Vec<Anomaly> {
    if metrics.is_empty() {
        return Vec::new();
    }

    let n = metrics.len() as f64;
    let mean = metrics.iter().map(|m| m.customers as f64).sum::<f64>() / n;
    let variance = metrics
        .iter()
        .map(|m| (m.customers as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return Vec::new();
    }

    let mut outliers: Vec<Anomaly> = metrics
        .iter()
        .map(|m| Anomaly {
            name: m.name.clone(),
            customers: m.customers,
            z_score: (m.customers as f64 - mean) / std_dev,
        })
        .filter(|a| a.z_score.abs() > ANOMALY_Z_THRESHOLD)
        .collect();

    outliers.sort_by(|a, b| b.z_score.abs().total_cmp(&a.z_score.abs()));
    outliers.truncate(MAX_ANOMALIES);
    outliers
}

/// Dataset-wide totals and means. All zero for empty input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summary(metrics: &[MunicipalityMetrics]) -> AnalysisSummary {
    if metrics.is_empty() {
        return AnalysisSummary::default();
    }

    let n = metrics.len() as f64;
    AnalysisSummary {
        total_municipalities: metrics.len(),
        total_customers: metrics.iter().map(|m| m.customers).sum(),
        avg_penetration: metrics.iter().map(|m| m.penetration_rate).sum::<f64>() / n,
        avg_income: metrics.iter().map(|m| m.avg_income).sum::<f64>() / n,
    }
}
