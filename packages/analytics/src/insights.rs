//! Headline insights about how customers are distributed.

use solar_map_analytics_models::{GrowthOpportunity, Insights, MunicipalityMetrics, NamedValue};

const TOP_OPPORTUNITIES: usize = 5;
const CONCENTRATION_TOP: usize = 3;

fn named(metrics: &MunicipalityMetrics, value: f64) -> NamedValue {
    NamedValue {
        name: metrics.name.clone(),
        customers: metrics.customers,
        value,
    }
}

/// Sorts by descending `value` (stable) and returns the first and last.
fn extremes(
    metrics: &[MunicipalityMetrics],
    include: impl Fn(&MunicipalityMetrics) -> bool,
    value: impl Fn(&MunicipalityMetrics) -> f64,
) -> (Option<NamedValue>, Option<NamedValue>) {
    let mut ranked: Vec<NamedValue> = metrics
        .iter()
        .filter(|m| include(m))
        .map(|m| named(m, value(m)))
        .collect();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    let lowest = ranked.last().cloned();
    (ranked.into_iter().next(), lowest)
}

/// Customers per degree of bounding-box diagonal. Municipalities with no
/// measurable spread count their customers as the density.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density(metrics: &MunicipalityMetrics) -> f64 {
    let spread = if metrics.spread > 0.0 { metrics.spread } else { 1.0 };
    metrics.customers as f64 / spread
}

/// Computes the insight panel values.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn insights(metrics: &[MunicipalityMetrics]) -> Insights {
    if metrics.is_empty() {
        return Insights::default();
    }

    let mut by_customers: Vec<&MunicipalityMetrics> = metrics.iter().collect();
    by_customers.sort_by(|a, b| b.customers.cmp(&a.customers));

    let total_customers: u64 = metrics.iter().map(|m| m.customers).sum();
    let top_customers: u64 = by_customers
        .iter()
        .take(CONCENTRATION_TOP)
        .map(|m| m.customers)
        .sum();
    let market_concentration = if total_customers == 0 {
        0.0
    } else {
        (top_customers as f64 / total_customers as f64 * 1_000.0).round() / 10.0
    };

    let (highest_penetration, lowest_penetration) =
        extremes(metrics, |m| m.avg_population > 0.0, |m| m.penetration_rate);
    let (highest_income, lowest_income) =
        extremes(metrics, |m| m.avg_income > 0.0, |m| m.avg_income);

    let mut densities: Vec<NamedValue> = metrics
        .iter()
        .filter(|m| m.customers > 0)
        .map(|m| named(m, density(m)))
        .collect();
    densities.sort_by(|a, b| b.value.total_cmp(&a.value));
    let most_concentrated = densities.first().cloned();
    densities.sort_by(|a, b| a.value.total_cmp(&b.value));
    let most_spread_out = densities.into_iter().next();

    let mut growth_potential: Vec<GrowthOpportunity> = metrics
        .iter()
        .filter(|m| m.avg_population > 0.0 && m.avg_income > 0.0)
        .map(|m| GrowthOpportunity {
            name: m.name.clone(),
            penetration_rate: m.penetration_rate,
            avg_income: m.avg_income,
            growth_score: (100.0 - m.penetration_rate) * m.avg_income / 10_000.0,
        })
        .collect();
    growth_potential.sort_by(|a, b| b.growth_score.total_cmp(&a.growth_score));
    growth_potential.truncate(TOP_OPPORTUNITIES);

    Insights {
        top_municipality: by_customers
            .first()
            .map(|m| named(m, m.customers as f64)),
        avg_customers_per_municipality: (total_customers as f64 / metrics.len() as f64).round(),
        highest_penetration,
        lowest_penetration,
        highest_income,
        lowest_income,
        most_concentrated,
        most_spread_out,
        growth_potential,
        market_concentration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::metric;

    fn sample() -> Vec<MunicipalityMetrics> {
        let mut a = metric("Aguadilla", 50, 20_000.0, 10_000.0);
        a.spread = 0.5;
        let mut b = metric("Bayamón", 300, 35_000.0, 20_000.0);
        b.spread = 0.1;
        let c = metric("Cidra", 20, 0.0, 0.0);
        let d = metric("Dorado", 30, 45_000.0, 1_000.0);
        vec![a, b, c, d]
    }

    #[test]
    fn top_municipality_and_average() {
        let i = insights(&sample());
        let top = i.top_municipality.unwrap();
        assert_eq!(top.name, "Bayamón");
        assert_eq!(top.customers, 300);
        assert!((i.avg_customers_per_municipality - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn penetration_extremes_ignore_missing_population() {
        let i = insights(&sample());
        assert_eq!(i.highest_penetration.unwrap().name, "Dorado");
        assert_eq!(i.lowest_penetration.unwrap().name, "Aguadilla");
    }

    #[test]
    fn income_extremes_ignore_missing_income() {
        let i = insights(&sample());
        assert_eq!(i.highest_income.unwrap().name, "Dorado");
        assert_eq!(i.lowest_income.unwrap().name, "Aguadilla");
    }

    #[test]
    fn density_uses_spread() {
        let i = insights(&sample());
        // Bayamón: 300 / 0.1 = 3000; Cidra: 20 / 1
        assert_eq!(i.most_concentrated.unwrap().name, "Bayamón");
        assert_eq!(i.most_spread_out.unwrap().name, "Cidra");
    }

    #[test]
    fn market_concentration_of_top_three() {
        let i = insights(&sample());
        // (300 + 50 + 30) / 400
        assert!((i.market_concentration - 95.0).abs() < 1e-9);
    }

    #[test]
    fn growth_potential_ranks_low_penetration_high_income() {
        let i = insights(&sample());
        assert_eq!(i.growth_potential.len(), 3);
        assert_eq!(i.growth_potential[0].name, "Dorado");
        assert!(i.growth_potential.iter().all(|g| g.avg_income > 0.0));
    }

    #[test]
    fn empty_input_has_no_insights() {
        assert_eq!(insights(&[]), Insights::default());
    }
}
