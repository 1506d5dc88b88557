#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics engine for solar adoption by municipality.
//!
//! Features are grouped per municipality by [`aggregate`], turned into
//! [`MunicipalityMetrics`] and then fed through a set of independent pure
//! analyses. Degenerate input (no features, zero variance, missing
//! population) never fails; it produces empty results or zeros.

pub mod aggregate;
pub mod classify;
pub mod insights;
pub mod kmeans;
pub mod neural;
pub mod projections;
pub mod regions;
pub mod regression;
pub mod stats;

use chrono::Datelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solar_map_analytics_models::{AnalysisConfig, AnalysisReport, MunicipalityMetrics};
use solar_map_feature_models::FeatureCollection;

/// Aggregates features and derives per-municipality metrics in name order.
#[must_use]
pub fn municipality_metrics(features: &FeatureCollection) -> Vec<MunicipalityMetrics> {
    aggregate::derive_all(&aggregate::aggregate(&features.features))
}

/// Runs every analysis over `features`.
///
/// Clustering draws from `rng`; `current_month` (0 = January) anchors the
/// growth projection.
#[must_use]
pub fn analyze<R: Rng>(
    features: &FeatureCollection,
    config: &AnalysisConfig,
    rng: &mut R,
    current_month: u32,
) -> AnalysisReport {
    let municipalities = municipality_metrics(features);
    log::info!(
        "Analyzing {} features across {} municipalities",
        features.len(),
        municipalities.len()
    );

    let report = AnalysisReport {
        summary: stats::summary(&municipalities),
        clusters: kmeans::kmeans(&municipalities, config.k, rng),
        predictions: regression::predict_growth(&municipalities),
        correlations: stats::correlations(&municipalities),
        anomalies: stats::anomalies(&municipalities),
        regions: regions::bucket(&municipalities),
        segments: classify::segment(&municipalities),
        neural_predictions: neural::predict(&municipalities),
        decision_tree: classify::decision_tree(&municipalities, &config.thresholds),
        projections: projections::project(
            &municipalities,
            config.monthly_growth_rate,
            current_month,
        ),
        insights: insights::insights(&municipalities),
        municipalities,
    };

    log::debug!(
        "Analysis produced {} clusters, {} predictions, {} anomalies",
        report.clusters.len(),
        report.predictions.len(),
        report.anomalies.len()
    );

    report
}

/// Runs [`analyze`] with an RNG seeded from `config.seed` (or from entropy
/// when unset) and the current local month.
#[must_use]
pub fn analyze_now(features: &FeatureCollection, config: &AnalysisConfig) -> AnalysisReport {
    let mut rng = config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    analyze(features, config, &mut rng, chrono::Local::now().month0())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(json: &str) -> FeatureCollection {
        serde_json::from_str(json).unwrap()
    }

    fn sample() -> FeatureCollection {
        let mut features = Vec::new();
        let towns = [
            ("San Juan Municipio", -66.06, 18.42, 40_000.0, 300_000.0, 40),
            ("Ponce Municipio", -66.61, 18.01, 25_000.0, 150_000.0, 15),
            ("Mayagüez Municipio", -67.14, 18.20, 22_000.0, 80_000.0, 8),
            ("Caguas Municipio", -66.03, 18.23, 30_000.0, 120_000.0, 12),
            ("Fajardo Municipio", -65.65, 18.33, 28_000.0, 30_000.0, 5),
        ];
        for (county, lng, lat, income, pop, count) in towns {
            for i in 0..count {
                features.push(serde_json::json!({
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [lng + f64::from(i) * 0.001, lat]},
                    "properties": {"County": county, "Income": income, "TotalPop": pop}
                }));
            }
        }
        serde_json::from_value(serde_json::json!({"features": features})).unwrap()
    }

    #[test]
    fn empty_collection_produces_empty_report() {
        let fc = FeatureCollection::default();
        let report = analyze(
            &fc,
            &AnalysisConfig::default(),
            &mut StdRng::seed_from_u64(1),
            0,
        );
        assert!(report.municipalities.is_empty());
        assert!(report.clusters.is_empty());
        assert!(report.predictions.is_empty());
        assert!(report.anomalies.is_empty());
        assert!(report.neural_predictions.is_empty());
        assert!(report.decision_tree.classifications.is_empty());
        assert_eq!(report.summary.total_customers, 0);
        assert_eq!(report.regions.len(), 5);
        assert!(report.regions.iter().all(|r| r.total_customers == 0));
    }

    #[test]
    fn customers_add_up_to_feature_count() {
        let fc = sample();
        let report = analyze(
            &fc,
            &AnalysisConfig::default(),
            &mut StdRng::seed_from_u64(9),
            5,
        );
        assert_eq!(report.summary.total_customers, fc.len() as u64);
        assert_eq!(report.summary.total_municipalities, 5);
        let clustered: u64 = report
            .clusters
            .iter()
            .map(|c| c.characteristics.total_customers)
            .sum();
        assert_eq!(clustered, fc.len() as u64);
        assert_eq!(report.decision_tree.classifications.len(), 5);
        assert!(report.classification_for("Ponce").is_some());
    }

    #[test]
    fn same_seed_same_report() {
        let fc = sample();
        let config = AnalysisConfig {
            seed: Some(11),
            ..AnalysisConfig::default()
        };
        assert_eq!(analyze_now(&fc, &config).clusters, analyze_now(&fc, &config).clusters);
    }

    #[test]
    fn ponce_scenario() {
        let fc = collection(
            r#"{"features":[
                {"properties":{"County":"Ponce Municipio","Income":30000,"TotalPop":100000}},
                {"properties":{"County":"Ponce Municipio","Income":40000,"TotalPop":100000}}
            ]}"#,
        );
        let metrics = municipality_metrics(&fc);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name, "Ponce");
        assert_eq!(metrics[0].customers, 2);
        assert!((metrics[0].avg_income - 35_000.0).abs() < 1e-9);
        assert!((metrics[0].penetration_rate - 0.002).abs() < 1e-12);
    }

    #[test]
    fn malformed_features_are_still_counted() {
        let fc = collection(
            r#"{"features":[
                {"geometry":{"type":"Point","coordinates":[-66.61,18.01]},"properties":{"City":"Ponce"}},
                {"geometry":"bad","properties":{"City":"Ponce"}},
                {"geometry":{"type":null,"coordinates":[-66.62,18.02]},"properties":{"City":"Ponce"}},
                {"geometry":{"type":"Point","coordinates":[-66.63,18.03]},"properties":"oops"}
            ]}"#,
        );
        let metrics = municipality_metrics(&fc);
        let total: u64 = metrics.iter().map(|m| m.customers).sum();
        assert_eq!(total, 4);
        let ponce = metrics.iter().find(|m| m.name == "Ponce").unwrap();
        assert_eq!(ponce.customers, 3);
    }
}
