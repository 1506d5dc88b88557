//! Conversion of raw JSON documents into typed feature collections.

use serde_json::Value;
use solar_map_feature_models::{FeatureCollection, GeoFeature};

use crate::FeatureError;

/// Parses a JSON string into a [`FeatureCollection`].
///
/// # Errors
///
/// Returns [`FeatureError::Parse`] if the text is not valid JSON or the
/// document does not contain features.
pub fn parse_str(text: &str, origin: &str) -> Result<FeatureCollection, FeatureError> {
    let value: Value = serde_json::from_str(text).map_err(|e| FeatureError::Parse {
        message: format!("{origin} is not valid JSON: {e}"),
    })?;
    parse_document(value, origin)
}

/// Extracts features from a parsed JSON document.
///
/// Accepts a `FeatureCollection` (or any object with a `features`
/// array) and a bare array of features. Entries that are not JSON
/// objects are skipped; a malformed `geometry` or `properties` inside an
/// object only clears that field.
///
/// # Errors
///
/// Returns [`FeatureError::Parse`] if the document has no features array.
pub fn parse_document(value: Value, origin: &str) -> Result<FeatureCollection, FeatureError> {
    let raw = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("features") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(FeatureError::Parse {
                    message: format!("No features array in {origin}"),
                });
            }
        },
        other => {
            return Err(FeatureError::Parse {
                message: format!(
                    "Expected a FeatureCollection in {origin}, found {}",
                    json_kind(&other)
                ),
            });
        }
    };

    let total = raw.len();
    let features: Vec<GeoFeature> = raw
        .into_iter()
        .filter_map(|item| {
            if !item.is_object() {
                log::debug!("Skipping {} entry in {origin}", json_kind(&item));
                return None;
            }
            match serde_json::from_value::<GeoFeature>(item) {
                Ok(feature) => Some(feature),
                Err(e) => {
                    log::debug!("Skipping malformed feature in {origin}: {e}");
                    None
                }
            }
        })
        .collect();

    if features.len() < total {
        log::warn!(
            "Skipped {} of {total} malformed features in {origin}",
            total - features.len()
        );
    }

    Ok(FeatureCollection { features })
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
