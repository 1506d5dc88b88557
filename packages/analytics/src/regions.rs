//! Coarse geographic bucketing of municipalities.

use solar_map_analytics_models::{MunicipalityMetrics, Region, RegionBucket};
use solar_map_feature_models::Coordinate;

/// Assigns a coordinate to a region using fixed latitude/longitude cuts.
#[must_use]
pub fn region_for(coordinate: Coordinate) -> Region {
    let Coordinate { lng, lat } = coordinate;
    if lat > 18.3 {
        if lng > -66.2 { Region::East } else { Region::North }
    } else if lat < 18.1 {
        Region::South
    } else if lng < -66.5 {
        Region::West
    } else {
        Region::Central
    }
}

/// Buckets municipalities by the region of their mean coordinate.
///
/// Always returns the five regions in reporting order. Municipalities
/// without coordinates are left out.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bucket(metrics: &[MunicipalityMetrics]) -> Vec<RegionBucket> {
    Region::ALL
        .iter()
        .map(|&region| {
            let members: Vec<&MunicipalityMetrics> = metrics
                .iter()
                .filter(|m| m.centroid.is_some_and(|c| region_for(c) == region))
                .collect();
            let n = members.len() as f64;
            let (avg_penetration, avg_income) = if members.is_empty() {
                (0.0, 0.0)
            } else {
                (
                    members.iter().map(|m| m.penetration_rate).sum::<f64>() / n,
                    members.iter().map(|m| m.avg_income).sum::<f64>() / n,
                )
            };
            RegionBucket {
                region,
                name: region.label().to_string(),
                municipalities: members.iter().map(|m| m.name.clone()).collect(),
                total_customers: members.iter().map(|m| m.customers).sum(),
                avg_penetration,
                avg_income,
            }
        })
        .collect()
}
