//! Two-predictor linear model of customers from income and population.

use solar_map_analytics_models::{GrowthPrediction, MunicipalityMetrics};

/// Number of predictions returned.
pub const TOP_PREDICTIONS: usize = 10;

/// Fitted coefficients of `customers = alpha + b1 * income + b2 * population`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionModel {
    /// Intercept.
    pub alpha: f64,
    /// Income coefficient.
    pub income_beta: f64,
    /// Population coefficient.
    pub population_beta: f64,
}

impl RegressionModel {
    /// Predicted customers for the given income and population.
    #[must_use]
    pub fn predict(&self, income: f64, population: f64) -> f64 {
        self.population_beta
            .mul_add(population, self.income_beta.mul_add(income, self.alpha))
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Covariance over variance of `x`, or 0 when `x` has no variance.
fn slope(x: &[f64], y: &[f64], mean_x: f64, mean_y: f64) -> f64 {
    let covariance: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum();
    let variance: f64 = x.iter().map(|a| (a - mean_x).powi(2)).sum();
    if variance == 0.0 {
        0.0
    } else {
        covariance / variance
    }
}

/// Fits the model over municipalities with income and population data.
///
/// Each coefficient is the simple-regression slope of customers on that
/// predictor alone. Returns `None` with fewer than two usable records.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fit(metrics: &[MunicipalityMetrics]) -> Option<RegressionModel> {
    let valid: Vec<&MunicipalityMetrics> = metrics
        .iter()
        .filter(|m| m.avg_income > 0.0 && m.avg_population > 0.0)
        .collect();
    if valid.len() < 2 {
        return None;
    }

    let incomes: Vec<f64> = valid.iter().map(|m| m.avg_income).collect();
    let populations: Vec<f64> = valid.iter().map(|m| m.avg_population).collect();
    let customers: Vec<f64> = valid.iter().map(|m| m.customers as f64).collect();

    let mean_income = mean(&incomes);
    let mean_population = mean(&populations);
    let mean_customers = mean(&customers);

    let income_beta = slope(&incomes, &customers, mean_income, mean_customers);
    let population_beta = slope(&populations, &customers, mean_population, mean_customers);
    let alpha = population_beta.mul_add(
        -mean_population,
        income_beta.mul_add(-mean_income, mean_customers),
    );

    Some(RegressionModel {
        alpha,
        income_beta,
        population_beta,
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Municipalities with the largest predicted growth relative to their
/// current customer count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn predict_growth(metrics: &[MunicipalityMetrics]) -> Vec<GrowthPrediction> {
    let Some(model) = fit(metrics) else {
        return Vec::new();
    };
    log::debug!("Fitted growth model: {model:?}");

    let mut predictions: Vec<GrowthPrediction> = metrics
        .iter()
        .map(|m| {
            let actual = m.customers as f64;
            let predicted = model.predict(m.avg_income, m.avg_population);
            let potential = (predicted - actual).max(0.0);
            GrowthPrediction {
                name: m.name.clone(),
                customers: m.customers,
                avg_income: m.avg_income,
                avg_population: m.avg_population,
                predicted_customers: predicted.round(),
                growth_potential: potential.round(),
                growth_score: round1(potential / actual.max(1.0) * 100.0),
            }
        })
        .collect();

    predictions.sort_by(|a, b| b.growth_score.total_cmp(&a.growth_score));
    predictions.truncate(TOP_PREDICTIONS);
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::metric;

    #[test]
    fn fits_exact_linear_relation() {
        let metrics = vec![
            metric("A", 100, 10_000.0, 50_000.0),
            metric("B", 200, 20_000.0, 50_000.0),
            metric("C", 300, 30_000.0, 50_000.0),
        ];
        let model = fit(&metrics).unwrap();
        assert!((model.income_beta - 0.01).abs() < 1e-12);
        assert!(model.population_beta.abs() < f64::EPSILON);
        assert!(model.alpha.abs() < 1e-9);
        assert!((model.predict(40_000.0, 50_000.0) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_valid_records_gives_nothing() {
        let metrics = vec![
            metric("A", 100, 10_000.0, 50_000.0),
            metric("B", 200, 0.0, 50_000.0),
        ];
        assert!(fit(&metrics).is_none());
        assert!(predict_growth(&metrics).is_empty());
        assert!(predict_growth(&[]).is_empty());
    }

    #[test]
    fn growth_potential_is_never_negative() {
        let metrics = vec![
            metric("A", 100, 10_000.0, 50_000.0),
            metric("B", 50, 20_000.0, 50_000.0),
            metric("C", 300, 30_000.0, 50_000.0),
            metric("D", 10, 0.0, 0.0),
        ];
        let predictions = predict_growth(&metrics);
        assert_eq!(predictions.len(), 4);
        assert!(predictions.iter().all(|p| p.growth_potential >= 0.0));
        assert!(
            predictions
                .windows(2)
                .all(|w| w[0].growth_score >= w[1].growth_score)
        );
        // B sits below the fitted line
        assert_eq!(predictions[0].name, "B");
        assert!((predictions[0].predicted_customers - 150.0).abs() < f64::EPSILON);
        assert!((predictions[0].growth_score - 200.0).abs() < 1e-9);
    }

    #[test]
    fn returns_at_most_ten() {
        #[allow(clippy::cast_precision_loss)]
        let metrics: Vec<MunicipalityMetrics> = (1..=20)
            .map(|i| metric(&format!("M{i}"), i * 7 % 13 + 1, 10_000.0 + i as f64 * 1_000.0, 40_000.0))
            .collect();
        assert_eq!(predict_growth(&metrics).len(), TOP_PREDICTIONS);
    }
}
