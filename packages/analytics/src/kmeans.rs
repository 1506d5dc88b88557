//! K-means clustering of municipalities in normalized
//! (income, penetration, customers) space.

use rand::Rng;
use solar_map_analytics_models::{
    Cluster, ClusterCentroid, ClusterCharacteristics, MunicipalityMetrics,
};

/// Number of assignment/update rounds. There is no convergence check.
pub const ITERATIONS: usize = 10;

const INCOME_SCALE: f64 = 100_000.0;
const PENETRATION_SCALE: f64 = 100.0;
const CUSTOMER_SCALE: f64 = 1_000.0;

/// Projects a municipality into the normalized clustering space.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn normalize(metrics: &MunicipalityMetrics) -> ClusterCentroid {
    ClusterCentroid {
        income: metrics.avg_income / INCOME_SCALE,
        penetration: metrics.penetration_rate / PENETRATION_SCALE,
        customers: metrics.customers as f64 / CUSTOMER_SCALE,
    }
}

fn distance(a: &ClusterCentroid, b: &ClusterCentroid) -> f64 {
    let di = a.income - b.income;
    let dp = a.penetration - b.penetration;
    let dc = a.customers - b.customers;
    dc.mul_add(dc, di.mul_add(di, dp * dp)).sqrt()
}

/// Index of the nearest centroid. Ties go to the lowest index.
fn nearest(point: &ClusterCentroid, centroids: &[ClusterCentroid]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let d = distance(point, centroid);
        if d < best_distance {
            best = idx;
            best_distance = d;
        }
    }
    best
}

#[allow(clippy::cast_precision_loss)]
fn mean_point(points: &[ClusterCentroid], members: &[usize]) -> Option<ClusterCentroid> {
    if members.is_empty() {
        return None;
    }
    let n = members.len() as f64;
    let mut sum = ClusterCentroid::default();
    for &idx in members {
        sum.income += points[idx].income;
        sum.penetration += points[idx].penetration;
        sum.customers += points[idx].customers;
    }
    Some(ClusterCentroid {
        income: sum.income / n,
        penetration: sum.penetration / n,
        customers: sum.customers / n,
    })
}

/// Partitions municipalities into `k` clusters.
///
/// Centroids start at `k` municipalities drawn uniformly with
/// replacement using `rng`, so the result is only reproducible when the
/// caller seeds the generator. A cluster that loses all members keeps
/// its previous centroid. Returns no clusters when `k` is 0 or there are
/// fewer than `k` municipalities.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn kmeans<R: Rng>(
    metrics: &[MunicipalityMetrics],
    k: usize,
    rng: &mut R,
) -> Vec<Cluster> {
    if k == 0 || metrics.len() < k {
        log::debug!(
            "Skipping clustering: {} municipalities for k={k}",
            metrics.len()
        );
        return Vec::new();
    }

    let points: Vec<ClusterCentroid> = metrics.iter().map(normalize).collect();
    let mut centroids: Vec<ClusterCentroid> = (0..k)
        .map(|_| points[rng.gen_range(0..points.len())])
        .collect();
    let mut assignments: Vec<Vec<usize>> = vec![Vec::new(); k];

    for _ in 0..ITERATIONS {
        assignments = vec![Vec::new(); k];
        for (idx, point) in points.iter().enumerate() {
            assignments[nearest(point, &centroids)].push(idx);
        }

        for (centroid, members) in centroids.iter_mut().zip(&assignments) {
            if let Some(mean) = mean_point(&points, members) {
                *centroid = mean;
            }
        }
    }

    centroids
        .into_iter()
        .zip(assignments)
        .enumerate()
        .map(|(id, (centroid, members))| {
            let municipalities: Vec<MunicipalityMetrics> =
                members.iter().map(|&idx| metrics[idx].clone()).collect();
            let characteristics = if municipalities.is_empty() {
                ClusterCharacteristics::default()
            } else {
                let n = municipalities.len() as f64;
                ClusterCharacteristics {
                    avg_income: municipalities.iter().map(|m| m.avg_income).sum::<f64>() / n,
                    avg_penetration: municipalities
                        .iter()
                        .map(|m| m.penetration_rate)
                        .sum::<f64>()
                        / n,
                    total_customers: municipalities.iter().map(|m| m.customers).sum(),
                }
            };
            Cluster {
                id,
                name: format!("Cluster {}", id + 1),
                municipalities,
                centroid,
                characteristics,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::stats::tests::metric;

    fn sample() -> Vec<MunicipalityMetrics> {
        vec![
            metric("A", 10, 15_000.0, 50_000.0),
            metric("B", 12, 16_000.0, 52_000.0),
            metric("C", 900, 45_000.0, 60_000.0),
            metric("D", 950, 47_000.0, 61_000.0),
            metric("E", 400, 30_000.0, 40_000.0),
            metric("F", 420, 31_000.0, 41_000.0),
        ]
    }

    #[test]
    fn same_seed_gives_identical_clusters() {
        let metrics = sample();
        let a = kmeans(&metrics, 3, &mut StdRng::seed_from_u64(42));
        let b = kmeans(&metrics, 3, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn every_municipality_is_assigned_once() {
        let metrics = sample();
        let clusters = kmeans(&metrics, 3, &mut StdRng::seed_from_u64(7));
        assert_eq!(clusters.len(), 3);
        let assigned: usize = clusters.iter().map(|c| c.municipalities.len()).sum();
        assert_eq!(assigned, metrics.len());
        let customers: u64 = clusters.iter().map(|c| c.characteristics.total_customers).sum();
        assert_eq!(customers, metrics.iter().map(|m| m.customers).sum::<u64>());
    }

    #[test]
    fn clusters_are_named_in_order() {
        let clusters = kmeans(&sample(), 2, &mut StdRng::seed_from_u64(1));
        assert_eq!(clusters[0].name, "Cluster 1");
        assert_eq!(clusters[1].name, "Cluster 2");
        assert_eq!(clusters[1].id, 1);
    }

    #[test]
    fn too_few_records_gives_no_clusters() {
        let metrics = sample();
        assert!(kmeans(&metrics[..2], 3, &mut StdRng::seed_from_u64(1)).is_empty());
        assert!(kmeans(&metrics, 0, &mut StdRng::seed_from_u64(1)).is_empty());
        assert!(kmeans(&[], 4, &mut StdRng::seed_from_u64(1)).is_empty());
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let a = ClusterCentroid { income: 1.0, penetration: 0.0, customers: 0.0 };
        let point = ClusterCentroid::default();
        assert_eq!(nearest(&point, &[a, a, a]), 0);
    }

    #[test]
    fn duplicate_records_leave_one_cluster_empty() {
        let metrics = vec![metric("A", 10, 10_000.0, 1_000.0); 4];
        let clusters = kmeans(&metrics, 2, &mut StdRng::seed_from_u64(3));
        let mut sizes: Vec<usize> = clusters.iter().map(|c| c.municipalities.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, [0, 4]);
        let empty = clusters.iter().find(|c| c.municipalities.is_empty()).unwrap();
        assert_eq!(empty.characteristics, ClusterCharacteristics::default());
    }
}
