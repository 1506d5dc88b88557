//! Compound-growth customer projection over the calendar year.

use solar_map_analytics_models::{
    GrowthProjection, MonthlyProjection, MunicipalityMetrics, ProjectedGrowth,
};

/// Spanish month abbreviations, January first.
pub const MONTHS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

const TOP_GROWTH: usize = 10;

/// Projects total customers for every month of the year relative to
/// `current_month` (0 = January) at a fixed monthly `rate`.
///
/// Months before the current one are back-projected. `current` is only
/// set for the current month and `growth` only for future months.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]
pub fn project(metrics: &[MunicipalityMetrics], rate: f64, current_month: u32) -> GrowthProjection {
    let current_month = current_month.min(11) as i32;
    let total_customers: u64 = metrics.iter().map(|m| m.customers).sum();
    let total = total_customers as f64;
    let factor = 1.0 + rate;

    let monthly_projections = MONTHS
        .iter()
        .zip(0_i32..)
        .map(|(month, idx)| {
            let months_ahead = idx - current_month;
            let projected = total * factor.powi(months_ahead);
            let growth = (months_ahead > 0 && total > 0.0)
                .then(|| ((projected - total) / total * 100.0 * 10.0).round() / 10.0);
            MonthlyProjection {
                month: (*month).to_string(),
                current: (months_ahead == 0).then_some(total_customers),
                projected: projected.round(),
                growth,
            }
        })
        .collect();

    let yearly_factor = factor.powi(12);
    let mut top_growth: Vec<ProjectedGrowth> = metrics
        .iter()
        .map(|m| ProjectedGrowth {
            name: m.name.clone(),
            customers: m.customers,
            projected_growth: m.customers as f64 * yearly_factor,
            growth_rate: (yearly_factor - 1.0) * 100.0,
        })
        .collect();
    top_growth.sort_by(|a, b| b.projected_growth.total_cmp(&a.projected_growth));
    top_growth.truncate(TOP_GROWTH);

    GrowthProjection {
        monthly_projections,
        top_growth,
        avg_growth_rate: rate * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::metric;

    #[test]
    fn current_month_carries_the_total() {
        let metrics = vec![metric("A", 60, 0.0, 0.0), metric("B", 40, 0.0, 0.0)];
        let projection = project(&metrics, 0.05, 3);
        assert_eq!(projection.monthly_projections.len(), 12);

        let april = &projection.monthly_projections[3];
        assert_eq!(april.month, "Abr");
        assert_eq!(april.current, Some(100));
        assert!((april.projected - 100.0).abs() < f64::EPSILON);
        assert!(april.growth.is_none());

        let may = &projection.monthly_projections[4];
        assert!(may.current.is_none());
        assert!((may.projected - 105.0).abs() < f64::EPSILON);
        assert!((may.growth.unwrap() - 5.0).abs() < 1e-9);

        let march = &projection.monthly_projections[2];
        assert!((march.projected - 95.0).abs() < f64::EPSILON);
        assert!(march.growth.is_none());
    }

    #[test]
    fn top_growth_is_ordered_and_capped() {
        let metrics: Vec<MunicipalityMetrics> = (1..=12)
            .map(|i| metric(&format!("M{i}"), i, 0.0, 0.0))
            .collect();
        let projection = project(&metrics, 0.05, 0);
        assert_eq!(projection.top_growth.len(), 10);
        assert_eq!(projection.top_growth[0].name, "M12");
        assert!((projection.top_growth[0].growth_rate - 79.585_632_6).abs() < 1e-4);
        assert!((projection.avg_growth_rate - 5.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_projects_zero() {
        let projection = project(&[], 0.05, 6);
        assert!(projection.top_growth.is_empty());
        assert!(
            projection
                .monthly_projections
                .iter()
                .all(|m| m.projected.abs() < f64::EPSILON && m.growth.is_none())
        );
    }
}
