//! Rule-based market classification and segmentation.

use solar_map_analytics_models::{
    CategorySummary, ClassificationResult, ClassificationThresholds, DecisionTreeResult,
    MarketCategory, MarketSegments, MunicipalityMetrics, Priority,
};

/// Classifies one municipality. The first matching rule wins and every
/// comparison is strict.
#[must_use]
pub fn classify(
    metrics: &MunicipalityMetrics,
    thresholds: &ClassificationThresholds,
) -> ClassificationResult {
    let income = metrics.avg_income;
    let penetration = metrics.penetration_rate;

    let category = if income > thresholds.premium_income
        && penetration < thresholds.premium_penetration
    {
        MarketCategory::PremiumOpportunity
    } else if income > thresholds.high_value_income
        && penetration < thresholds.high_value_penetration
    {
        MarketCategory::HighValue
    } else if penetration > thresholds.mature_penetration {
        MarketCategory::MatureMarket
    } else if income > thresholds.emerging_income {
        MarketCategory::Emerging
    } else if metrics.customers < thresholds.underserved_customers {
        MarketCategory::Underserved
    } else {
        MarketCategory::Standard
    };

    let (priority, score) = rule_outcome(category);

    ClassificationResult {
        municipality: metrics.name.clone(),
        category,
        priority,
        score,
    }
}

/// Priority and score attached to each category.
#[must_use]
pub const fn rule_outcome(category: MarketCategory) -> (Priority, u8) {
    match category {
        MarketCategory::PremiumOpportunity => (Priority::High, 95),
        MarketCategory::HighValue => (Priority::High, 85),
        MarketCategory::MatureMarket => (Priority::Medium, 70),
        MarketCategory::Emerging => (Priority::Medium, 60),
        MarketCategory::Underserved => (Priority::Low, 40),
        MarketCategory::Standard => (Priority::Medium, 50),
    }
}

/// Classifies every municipality, sorted by descending score (stable), and
/// rolls the results up per category in order of first appearance.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn decision_tree(
    metrics: &[MunicipalityMetrics],
    thresholds: &ClassificationThresholds,
) -> DecisionTreeResult {
    let mut scored: Vec<(ClassificationResult, u64)> = metrics
        .iter()
        .map(|m| (classify(m, thresholds), m.customers))
        .collect();
    scored.sort_by(|(a, _), (b, _)| b.score.cmp(&a.score));

    let mut summary: Vec<CategorySummary> = Vec::new();
    for (result, customers) in &scored {
        let score = f64::from(result.score);
        if let Some(entry) = summary.iter_mut().find(|s| s.category == result.category) {
            entry.count += 1;
            entry.avg_score += score;
            entry.total_customers += customers;
        } else {
            summary.push(CategorySummary {
                category: result.category,
                count: 1,
                avg_score: score,
                total_customers: *customers,
            });
        }
    }
    for entry in &mut summary {
        entry.avg_score /= entry.count as f64;
    }

    DecisionTreeResult {
        classifications: scored.into_iter().map(|(result, _)| result).collect(),
        summary,
    }
}

fn names_where(
    metrics: &[MunicipalityMetrics],
    pred: impl Fn(&MunicipalityMetrics) -> bool,
) -> Vec<String> {
    metrics
        .iter()
        .filter(|m| pred(m))
        .map(|m| m.name.clone())
        .collect()
}

/// Groups municipalities into overlapping market segments.
#[must_use]
pub fn segment(metrics: &[MunicipalityMetrics]) -> MarketSegments {
    MarketSegments {
        high_value: names_where(metrics, |m| m.avg_income > 30_000.0 && m.penetration_rate < 5.0),
        mature: names_where(metrics, |m| m.penetration_rate > 10.0),
        emerging: names_where(metrics, |m| m.avg_income > 25_000.0 && m.penetration_rate < 3.0),
        underserved: names_where(metrics, |m| m.avg_income < 20_000.0 && m.customers < 50),
    }
}
