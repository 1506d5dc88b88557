//! Grouping of customer features by municipality.

use std::collections::BTreeMap;

use geo::{BoundingRect, Centroid, MultiPoint, Point};
use solar_map_analytics_models::{MunicipalityMetrics, MunicipalityRecord};
use solar_map_feature_models::{Coordinate, FeatureProperties, GeoFeature};

/// Name used when a feature carries no usable municipality name.
pub const UNKNOWN_MUNICIPALITY: &str = "Unknown";

const MUNICIPIO_SUFFIX: &str = " Municipio";

/// Resolves the municipality a feature belongs to.
///
/// Priority: `County` (trimmed, `" Municipio"` suffix stripped), then
/// `City`, then `Municipio`, then [`UNKNOWN_MUNICIPALITY`].
#[must_use]
pub fn resolve_name(properties: &FeatureProperties) -> String {
    if let Some(county) = non_blank(properties.county.as_deref()) {
        let stripped = county.strip_suffix(MUNICIPIO_SUFFIX).unwrap_or(county).trim();
        if !stripped.is_empty() {
            return stripped.to_string();
        }
    }

    non_blank(properties.city.as_deref())
        .or_else(|| non_blank(properties.municipio.as_deref()))
        .unwrap_or(UNKNOWN_MUNICIPALITY)
        .to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Groups features into one record per municipality, keyed by name.
#[must_use]
pub fn aggregate(features: &[GeoFeature]) -> BTreeMap<String, MunicipalityRecord> {
    let mut records: BTreeMap<String, MunicipalityRecord> = BTreeMap::new();

    for feature in features {
        let name = resolve_name(&feature.properties);
        let props = &feature.properties;
        let record = records
            .entry(name)
            .or_insert_with_key(|name| MunicipalityRecord::new(name.clone()));

        record.customers += 1;
        record.income.add(props.income());
        record.population.add(props.population());
        record.poverty.add(props.poverty.unwrap_or(0.0));
        record.unemployment.add(props.unemployment.unwrap_or(0.0));
        record.professional.add(props.professional.unwrap_or(0.0));
        record.hispanic.add(props.hispanic.unwrap_or(0.0));
        if let Some(dbh) = props.dbh.filter(|v| *v > 0.0) {
            record.dbh_total += dbh;
        }
        if let Some(coordinate) = feature.coordinate() {
            record.coordinates.push(coordinate);
        }
    }

    log::debug!(
        "Aggregated {} features into {} municipalities",
        features.len(),
        records.len()
    );

    records
}

/// Derives averages, penetration rate and location summary for a record.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn derive_metrics(record: &MunicipalityRecord) -> MunicipalityMetrics {
    let avg_population = record.population.average();
    let penetration_rate = if avg_population > 0.0 {
        record.customers as f64 / avg_population * 100.0
    } else {
        0.0
    };
    let avg_dbh = if record.customers == 0 {
        0.0
    } else {
        record.dbh_total / record.customers as f64
    };

    MunicipalityMetrics {
        name: record.name.clone(),
        customers: record.customers,
        avg_income: record.income.average(),
        avg_population,
        avg_poverty: record.poverty.average(),
        avg_unemployment: record.unemployment.average(),
        avg_professional: record.professional.average(),
        avg_hispanic: record.hispanic.average(),
        avg_dbh,
        penetration_rate,
        centroid: centroid(&record.coordinates),
        spread: spread(&record.coordinates),
    }
}

/// Derives metrics for every record, preserving map (name) order.
#[must_use]
pub fn derive_all(records: &BTreeMap<String, MunicipalityRecord>) -> Vec<MunicipalityMetrics> {
    records.values().map(derive_metrics).collect()
}

fn to_multi_point(coordinates: &[Coordinate]) -> MultiPoint<f64> {
    coordinates
        .iter()
        .map(|c| Point::new(c.lng, c.lat))
        .collect::<Vec<_>>()
        .into()
}

/// Mean of the coordinates, or `None` when there are none.
#[must_use]
pub fn centroid(coordinates: &[Coordinate]) -> Option<Coordinate> {
    if coordinates.is_empty() {
        return None;
    }
    to_multi_point(coordinates)
        .centroid()
        .map(|p| Coordinate::new(p.x(), p.y()))
}

/// Diagonal of the bounding box of the coordinates, in degrees.
///
/// Returns 0 for fewer than two coordinates.
#[must_use]
pub fn spread(coordinates: &[Coordinate]) -> f64 {
    if coordinates.len() < 2 {
        return 0.0;
    }
    to_multi_point(coordinates)
        .bounding_rect()
        .map_or(0.0, |rect| rect.width().hypot(rect.height()))
}
