//! `GeoJSON` heatmap layer with one weighted point per municipality.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};
use solar_map_analytics_models::{GrowthPrediction, MunicipalityMetrics};
use strum_macros::{AsRefStr, Display, EnumString};

/// The value that weights each heatmap point.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HeatmapMetric {
    /// Number of customers.
    #[default]
    Customers,
    /// Penetration rate.
    Penetration,
    /// Mean household income.
    Income,
    /// Regression growth potential (0 outside the top predictions).
    Growth,
}

#[allow(clippy::cast_precision_loss)]
fn metric_value(
    metrics: &MunicipalityMetrics,
    predictions: &[GrowthPrediction],
    metric: HeatmapMetric,
) -> f64 {
    match metric {
        HeatmapMetric::Customers => metrics.customers as f64,
        HeatmapMetric::Penetration => metrics.penetration_rate,
        HeatmapMetric::Income => metrics.avg_income,
        HeatmapMetric::Growth => predictions
            .iter()
            .find(|p| p.name == metrics.name)
            .map_or(0.0, |p| p.growth_potential),
    }
}

/// Builds a point `FeatureCollection` at each located municipality's
/// mean coordinate, weighted by `metric`.
///
/// The collection carries a `maxValue` foreign member (at least 1) for
/// weight normalization on the client.
#[must_use]
pub fn heatmap(
    metrics: &[MunicipalityMetrics],
    predictions: &[GrowthPrediction],
    metric: HeatmapMetric,
) -> FeatureCollection {
    let mut max_value: f64 = 1.0;

    let features: Vec<Feature> = metrics
        .iter()
        .filter_map(|m| {
            let centroid = m.centroid?;
            let value = metric_value(m, predictions, metric);
            max_value = max_value.max(value);

            let properties = serde_json::json!({
                "value": value,
                "name": m.name,
                "customers": m.customers,
                "penetration": m.penetration_rate,
                "income": m.avg_income,
            });

            Some(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    centroid.lng,
                    centroid.lat,
                ]))),
                id: None,
                properties: properties.as_object().cloned(),
                foreign_members: None,
            })
        })
        .collect();

    log::debug!("Built {metric} heatmap with {} points", features.len());

    let mut foreign_members = JsonObject::new();
    foreign_members.insert("maxValue".to_string(), serde_json::json!(max_value));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    }
}
