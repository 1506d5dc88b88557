//! Fixed-weight two-neuron scoring formula.
//!
//! The weights are constants, not trained parameters. The output is a
//! heuristic score shaped like a prediction.

use solar_map_analytics_models::{MunicipalityMetrics, NeuralPrediction};

const W1: f64 = 0.3;
const W2: f64 = 0.4;
const W3: f64 = 0.2;
const W4: f64 = 0.5;
const W5: f64 = 0.3;
const W6: f64 = 0.6;
const BIAS: f64 = 0.1;

/// Minimum number of usable municipalities.
pub const MIN_RECORDS: usize = 3;

/// Number of predictions returned.
pub const TOP_PREDICTIONS: usize = 15;

/// Evaluates the formula for inputs normalized to `[0, 1]`.
#[must_use]
pub fn forward(income: f64, population: f64) -> f64 {
    let h1 = W1.mul_add(income, W2.mul_add(population, BIAS)).tanh();
    let h2 = W3.mul_add(income, W4.mul_add(population, BIAS)).tanh();
    W5.mul_add(h1, W6.mul_add(h2, BIAS)).max(0.0)
}

/// Scores municipalities with income and population data, largest
/// improvement first.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn predict(metrics: &[MunicipalityMetrics]) -> Vec<NeuralPrediction> {
    let valid: Vec<&MunicipalityMetrics> = metrics
        .iter()
        .filter(|m| m.avg_income > 0.0 && m.avg_population > 0.0)
        .collect();
    if valid.len() < MIN_RECORDS {
        return Vec::new();
    }

    let max_income = valid.iter().map(|m| m.avg_income).fold(0.0, f64::max);
    let max_population = valid.iter().map(|m| m.avg_population).fold(0.0, f64::max);
    let max_customers = valid.iter().map(|m| m.customers as f64).fold(0.0, f64::max);

    let mut predictions: Vec<NeuralPrediction> = valid
        .iter()
        .map(|m| {
            let actual = m.customers as f64;
            let predicted =
                forward(m.avg_income / max_income, m.avg_population / max_population)
                    * max_customers;
            let error = (predicted - actual).abs() / actual.max(1.0);
            let confidence = ((1.0 - error).abs() * 100.0).min(100.0);
            NeuralPrediction {
                name: m.name.clone(),
                customers: m.customers,
                neural_prediction: predicted.round(),
                confidence: (confidence * 10.0).round() / 10.0,
                improvement: (predicted - actual).round().max(0.0),
            }
        })
        .collect();

    predictions.sort_by(|a, b| b.improvement.total_cmp(&a.improvement));
    predictions.truncate(TOP_PREDICTIONS);
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::metric;

    #[test]
    fn forward_matches_hand_computation() {
        let h1 = (0.3_f64 + 0.4 + 0.1).tanh();
        let h2 = (0.2_f64 + 0.5 + 0.1).tanh();
        let expected = 0.3f64.mul_add(h1, 0.6f64.mul_add(h2, 0.1));
        assert!((forward(1.0, 1.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn forward_is_never_negative() {
        assert!(forward(0.0, 0.0) > 0.0);
        assert!(forward(-10.0, -10.0) >= 0.0);
    }

    #[test]
    fn needs_three_records() {
        let metrics = vec![
            metric("A", 10, 20_000.0, 1_000.0),
            metric("B", 20, 30_000.0, 2_000.0),
            metric("C", 30, 0.0, 3_000.0),
        ];
        assert!(predict(&metrics).is_empty());
    }

    #[test]
    fn predictions_are_sorted_and_bounded() {
        let metrics = vec![
            metric("A", 10, 20_000.0, 1_000.0),
            metric("B", 200, 30_000.0, 2_000.0),
            metric("C", 30, 40_000.0, 3_000.0),
            metric("D", 5, 10_000.0, 500.0),
        ];
        let predictions = predict(&metrics);
        assert_eq!(predictions.len(), 4);
        assert!(predictions.iter().all(|p| p.improvement >= 0.0));
        assert!(predictions.iter().all(|p| (0.0..=100.0).contains(&p.confidence)));
        assert!(
            predictions
                .windows(2)
                .all(|w| w[0].improvement >= w[1].improvement)
        );
        // the largest municipality cannot be predicted above max customers
        let b = predictions.iter().find(|p| p.name == "B").unwrap();
        assert!(b.improvement.abs() < f64::EPSILON);
    }
}
