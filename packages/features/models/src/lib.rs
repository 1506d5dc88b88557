#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed records for the solar customer `GeoJSON` dataset.
//!
//! Each feature in the source `FeatureCollection` is one solar customer
//! location. Property values in the published dataset are loosely typed
//! (numbers sometimes arrive as strings, empty strings stand in for
//! missing values), so every property is deserialized leniently: a value
//! of an unexpected shape is treated as missing rather than failing the
//! whole collection.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A longitude/latitude pair in WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// The raw geometry of a feature.
///
/// Only `Point` geometries carry a usable coordinate; anything else is
/// kept as opaque JSON. A missing or non-string `type` reads as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGeometry {
    /// Geometry type (`"Point"` for customer locations).
    #[serde(rename = "type", default, deserialize_with = "lenient_type")]
    pub geometry_type: String,
    /// Raw coordinates array.
    #[serde(default)]
    pub coordinates: Value,
}

/// Properties of a single customer feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    /// County name, usually suffixed with `" Municipio"`.
    #[serde(rename = "County", default, deserialize_with = "lenient_string")]
    pub county: Option<String>,
    /// City name.
    #[serde(rename = "City", default, deserialize_with = "lenient_string")]
    pub city: Option<String>,
    /// Municipality name.
    #[serde(rename = "Municipio", default, deserialize_with = "lenient_string")]
    pub municipio: Option<String>,
    /// Median household income.
    #[serde(rename = "Income", default, deserialize_with = "lenient_f64")]
    pub income: Option<f64>,
    /// Per-capita income, used when `Income` is missing.
    #[serde(rename = "IncomePerCap", default, deserialize_with = "lenient_f64")]
    pub income_per_cap: Option<f64>,
    /// Total population of the surrounding census area.
    #[serde(rename = "TotalPop", default, deserialize_with = "lenient_f64")]
    pub total_pop: Option<f64>,
    /// Population, used when `TotalPop` is missing.
    #[serde(rename = "Population", default, deserialize_with = "lenient_f64")]
    pub population: Option<f64>,
    /// Poverty percentage.
    #[serde(rename = "Poverty", default, deserialize_with = "lenient_f64")]
    pub poverty: Option<f64>,
    /// Unemployment percentage.
    #[serde(rename = "Unemployment", default, deserialize_with = "lenient_f64")]
    pub unemployment: Option<f64>,
    /// Percentage of residents in professional occupations.
    #[serde(rename = "Professional", default, deserialize_with = "lenient_f64")]
    pub professional: Option<f64>,
    /// Hispanic percentage.
    #[serde(rename = "Hispanic", default, deserialize_with = "lenient_f64")]
    pub hispanic: Option<f64>,
    /// Diameter-at-breast-height measurement carried by some datasets.
    #[serde(rename = "dbh", default, deserialize_with = "lenient_f64")]
    pub dbh: Option<f64>,
}

impl FeatureProperties {
    /// Income for this feature: `Income`, falling back to `IncomePerCap`
    /// when `Income` is missing or zero. Returns 0 when neither is set.
    #[must_use]
    pub fn income(&self) -> f64 {
        first_nonzero(self.income, self.income_per_cap)
    }

    /// Population for this feature: `TotalPop`, falling back to
    /// `Population`. Returns 0 when neither is set.
    #[must_use]
    pub fn population(&self) -> f64 {
        first_nonzero(self.total_pop, self.population)
    }
}

fn first_nonzero(primary: Option<f64>, fallback: Option<f64>) -> f64 {
    primary
        .filter(|v| *v != 0.0)
        .or(fallback)
        .unwrap_or(0.0)
}

/// One input record: a customer location and its census properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoFeature {
    /// Point geometry, if any. A geometry that is not an object reads as
    /// `None`.
    #[serde(default, deserialize_with = "lenient_geometry")]
    pub geometry: Option<FeatureGeometry>,
    /// Feature properties. A `null` or non-object value is treated as
    /// empty.
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: FeatureProperties,
}

impl GeoFeature {
    /// Returns the `[lng, lat]` pair of this feature's geometry, if the
    /// geometry has at least two finite numeric coordinates.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        let coords = self.geometry.as_ref()?.coordinates.as_array()?;
        let lng = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        if !lng.is_finite() || !lat.is_finite() {
            return None;
        }
        Some(Coordinate::new(lng, lat))
    }
}

/// A parsed collection of customer features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// All features in source order.
    pub features: Vec<GeoFeature>,
}

impl FeatureCollection {
    /// Number of features in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Extracts a finite number from a JSON number or numeric string.
#[must_use]
pub fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

fn lenient_geometry<'de, D>(deserializer: D) -> Result<Option<FeatureGeometry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

fn lenient_properties<'de, D>(deserializer: D) -> Result<FeatureProperties, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => FeatureProperties::default(),
    })
}
