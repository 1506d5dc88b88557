#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and analysis result types for the solar adoption analytics.
//!
//! [`MunicipalityRecord`] is the running aggregate for one municipality.
//! [`MunicipalityMetrics`] holds the values derived from it, and every
//! other type here is the output of one analysis in the
//! `solar_map_analytics` crate. All of them are rebuilt on every
//! analysis pass and never persisted.

use serde::{Deserialize, Serialize};
use solar_map_feature_models::Coordinate;
use strum_macros::{AsRefStr, Display, EnumString};

/// Running sum and count of the positive samples of one metric.
///
/// Zero and missing values are excluded so they do not drag the
/// average down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAccumulator {
    /// Sum of all accepted samples.
    pub total: f64,
    /// Number of accepted samples.
    pub count: u64,
}

impl MetricAccumulator {
    /// Adds `value` if it is strictly positive.
    pub fn add(&mut self, value: f64) {
        if value > 0.0 {
            self.total += value;
            self.count += 1;
        }
    }

    /// Mean of the accepted samples, or 0 when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Aggregated customer data for one municipality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityRecord {
    /// Normalized municipality name.
    pub name: String,
    /// Number of features assigned to this municipality.
    pub customers: u64,
    /// Household income samples.
    pub income: MetricAccumulator,
    /// Population samples.
    pub population: MetricAccumulator,
    /// Poverty percentage samples.
    pub poverty: MetricAccumulator,
    /// Unemployment percentage samples.
    pub unemployment: MetricAccumulator,
    /// Professional occupation percentage samples.
    pub professional: MetricAccumulator,
    /// Hispanic percentage samples.
    pub hispanic: MetricAccumulator,
    /// Sum of positive `dbh` values.
    pub dbh_total: f64,
    /// Customer locations.
    pub coordinates: Vec<Coordinate>,
}

impl MunicipalityRecord {
    /// Creates an empty record for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Values derived from a [`MunicipalityRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityMetrics {
    /// Municipality name.
    pub name: String,
    /// Number of solar customers.
    pub customers: u64,
    /// Mean household income.
    pub avg_income: f64,
    /// Mean population.
    pub avg_population: f64,
    /// Mean poverty percentage.
    pub avg_poverty: f64,
    /// Mean unemployment percentage.
    pub avg_unemployment: f64,
    /// Mean professional occupation percentage.
    pub avg_professional: f64,
    /// Mean Hispanic percentage.
    pub avg_hispanic: f64,
    /// `dbh` total divided by the customer count.
    pub avg_dbh: f64,
    /// `customers / avg_population * 100`, or 0 without population data.
    pub penetration_rate: f64,
    /// Mean customer location.
    pub centroid: Option<Coordinate>,
    /// Diagonal of the customer locations' bounding box, in degrees.
    pub spread: f64,
}

/// A cluster centroid in normalized feature space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCentroid {
    /// Mean income / 100,000.
    pub income: f64,
    /// Mean penetration rate / 100.
    pub penetration: f64,
    /// Mean customers / 1,000.
    pub customers: f64,
}

/// Unnormalized summary of a cluster's members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCharacteristics {
    /// Mean of the members' average incomes.
    pub avg_income: f64,
    /// Mean of the members' penetration rates.
    pub avg_penetration: f64,
    /// Sum of the members' customers.
    pub total_customers: u64,
}

/// One K-means cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Zero-based cluster index.
    pub id: usize,
    /// Display name (`"Cluster 1"`, ...).
    pub name: String,
    /// Member municipalities.
    pub municipalities: Vec<MunicipalityMetrics>,
    /// Final centroid.
    pub centroid: ClusterCentroid,
    /// Member summary.
    pub characteristics: ClusterCharacteristics,
}

/// Pearson correlations between municipality metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlations {
    /// Average income vs. penetration rate.
    pub income_vs_penetration: f64,
    /// Average population vs. customer count.
    pub population_vs_customers: f64,
    /// Average income vs. customer count.
    pub income_vs_customers: f64,
}

/// A municipality whose customer count is an outlier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    /// Municipality name.
    pub name: String,
    /// Number of solar customers.
    pub customers: u64,
    /// Standard score of the customer count.
    pub z_score: f64,
}

/// Regression-based growth prediction for one municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPrediction {
    /// Municipality name.
    pub name: String,
    /// Actual customer count.
    pub customers: u64,
    /// Mean household income.
    pub avg_income: f64,
    /// Mean population.
    pub avg_population: f64,
    /// Predicted customer count, rounded.
    pub predicted_customers: f64,
    /// `max(0, predicted - actual)`, rounded.
    pub growth_potential: f64,
    /// Growth potential as a percentage of the actual count (1 decimal).
    pub growth_score: f64,
}

/// Market category assigned by the decision list.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketCategory {
    /// High income, very low penetration.
    #[strum(serialize = "Premium Opportunity")]
    PremiumOpportunity,
    /// Good income, low penetration.
    #[strum(serialize = "High Value")]
    HighValue,
    /// Already high penetration.
    #[strum(serialize = "Mature Market")]
    MatureMarket,
    /// Moderate income.
    #[strum(serialize = "Emerging")]
    Emerging,
    /// Few customers.
    #[strum(serialize = "Underserved")]
    Underserved,
    /// Everything else.
    #[strum(serialize = "Standard")]
    Standard,
}

/// Follow-up priority for a market category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Act first.
    High,
    /// Act when capacity allows.
    Medium,
    /// Monitor.
    Low,
}

/// Thresholds of the classification decision list.
///
/// The defaults are the values the dashboard has always used; they have
/// no documented derivation and are kept configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassificationThresholds {
    /// Income above which a low-penetration market is premium.
    pub premium_income: f64,
    /// Penetration below which a high-income market is premium.
    pub premium_penetration: f64,
    /// Income above which a low-penetration market is high value.
    pub high_value_income: f64,
    /// Penetration below which a market is high value.
    pub high_value_penetration: f64,
    /// Penetration above which a market is mature.
    pub mature_penetration: f64,
    /// Income above which a market is emerging.
    pub emerging_income: f64,
    /// Customer count below which a market is underserved.
    pub underserved_customers: u64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        Self {
            premium_income: 35_000.0,
            premium_penetration: 3.0,
            high_value_income: 30_000.0,
            high_value_penetration: 5.0,
            mature_penetration: 10.0,
            emerging_income: 25_000.0,
            underserved_customers: 50,
        }
    }
}

/// Classification of one municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Municipality name.
    pub municipality: String,
    /// Assigned category.
    pub category: MarketCategory,
    /// Follow-up priority.
    pub priority: Priority,
    /// Category score (40-95).
    pub score: u8,
}

/// Per-category roll-up of classifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// Category.
    pub category: MarketCategory,
    /// Number of municipalities in the category.
    pub count: usize,
    /// Mean score.
    pub avg_score: f64,
    /// Sum of customers.
    pub total_customers: u64,
}

/// Output of the batch classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionTreeResult {
    /// Classifications sorted by descending score.
    pub classifications: Vec<ClassificationResult>,
    /// Roll-up per category, in order of first appearance.
    pub summary: Vec<CategorySummary>,
}

/// Approximate geographic region of Puerto Rico.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum Region {
    /// North coast.
    North,
    /// South coast.
    South,
    /// East.
    East,
    /// West.
    West,
    /// Interior.
    Central,
}

impl Region {
    /// All regions in reporting order.
    pub const ALL: [Self; 5] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Central,
    ];

    /// Spanish display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::North => "Norte",
            Self::South => "Sur",
            Self::East => "Este",
            Self::West => "Oeste",
            Self::Central => "Central",
        }
    }
}

/// Municipalities grouped into one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionBucket {
    /// Region.
    pub region: Region,
    /// Spanish display label.
    pub name: String,
    /// Member municipality names.
    pub municipalities: Vec<String>,
    /// Sum of customers.
    pub total_customers: u64,
    /// Mean penetration rate, 0 when empty.
    pub avg_penetration: f64,
    /// Mean income, 0 when empty.
    pub avg_income: f64,
}

/// Rule-based market segments (a municipality may be in several).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSegments {
    /// Income > 30,000 and penetration < 5.
    pub high_value: Vec<String>,
    /// Penetration > 10.
    pub mature: Vec<String>,
    /// Income > 25,000 and penetration < 3.
    pub emerging: Vec<String>,
    /// Income < 20,000 and customers < 50.
    pub underserved: Vec<String>,
}

/// Output of the fixed-weight neural formula for one municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeuralPrediction {
    /// Municipality name.
    pub name: String,
    /// Actual customer count.
    pub customers: u64,
    /// Predicted customer count, rounded.
    pub neural_prediction: f64,
    /// Agreement between prediction and actual, 0-100 (1 decimal).
    pub confidence: f64,
    /// Predicted customers above the actual count, or 0.
    pub improvement: f64,
}

/// One month of the customer growth projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProjection {
    /// Spanish month abbreviation.
    pub month: String,
    /// Current customer total, set only for the current month.
    pub current: Option<u64>,
    /// Projected customer total, rounded.
    pub projected: f64,
    /// Growth over the current total in percent, set only for future months.
    pub growth: Option<f64>,
}

/// Twelve-month projection for one municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedGrowth {
    /// Municipality name.
    pub name: String,
    /// Current customers.
    pub customers: u64,
    /// Customers after twelve months.
    pub projected_growth: f64,
    /// Twelve-month growth rate in percent.
    pub growth_rate: f64,
}

/// Customer growth projection at a fixed monthly rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthProjection {
    /// One entry per calendar month.
    pub monthly_projections: Vec<MonthlyProjection>,
    /// Top 10 municipalities by projected customers.
    pub top_growth: Vec<ProjectedGrowth>,
    /// Monthly growth rate in percent.
    pub avg_growth_rate: f64,
}

/// A named value used by the insight panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedValue {
    /// Municipality name.
    pub name: String,
    /// Customer count.
    pub customers: u64,
    /// The metric the insight is about.
    pub value: f64,
}

/// Growth potential score for the insight panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthOpportunity {
    /// Municipality name.
    pub name: String,
    /// Penetration rate.
    pub penetration_rate: f64,
    /// Mean household income.
    pub avg_income: f64,
    /// `(100 - penetration) * income / 10,000`.
    pub growth_score: f64,
}

/// Headline insights about the customer distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// Municipality with the most customers.
    pub top_municipality: Option<NamedValue>,
    /// Mean customers per municipality, rounded.
    pub avg_customers_per_municipality: f64,
    /// Highest penetration rate (value = penetration).
    pub highest_penetration: Option<NamedValue>,
    /// Lowest penetration rate (value = penetration).
    pub lowest_penetration: Option<NamedValue>,
    /// Highest average income (value = income).
    pub highest_income: Option<NamedValue>,
    /// Lowest average income (value = income).
    pub lowest_income: Option<NamedValue>,
    /// Highest customer density (value = density).
    pub most_concentrated: Option<NamedValue>,
    /// Lowest customer density (value = density).
    pub most_spread_out: Option<NamedValue>,
    /// Top 5 growth opportunities.
    pub growth_potential: Vec<GrowthOpportunity>,
    /// Share of customers in the top 3 municipalities, in percent.
    pub market_concentration: f64,
}

/// Dataset-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// Number of municipalities.
    pub total_municipalities: usize,
    /// Number of customers.
    pub total_customers: u64,
    /// Mean penetration rate.
    pub avg_penetration: f64,
    /// Mean of the municipalities' average incomes.
    pub avg_income: f64,
}

/// Tunable parameters of an analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Number of K-means clusters.
    pub k: usize,
    /// Seed for the clustering RNG. `None` seeds from entropy, which makes
    /// cluster assignments vary between runs.
    pub seed: Option<u64>,
    /// Monthly growth rate of the projection (0.05 = 5 %).
    pub monthly_growth_rate: f64,
    /// Decision list thresholds.
    pub thresholds: ClassificationThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            k: 4,
            seed: None,
            monthly_growth_rate: 0.05,
            thresholds: ClassificationThresholds::default(),
        }
    }
}

/// Complete result of one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Dataset-wide totals.
    pub summary: AnalysisSummary,
    /// Per-municipality metrics in aggregation (name) order.
    pub municipalities: Vec<MunicipalityMetrics>,
    /// K-means clusters.
    pub clusters: Vec<Cluster>,
    /// Top growth predictions.
    pub predictions: Vec<GrowthPrediction>,
    /// Metric correlations.
    pub correlations: Correlations,
    /// Customer-count outliers.
    pub anomalies: Vec<Anomaly>,
    /// Regional buckets.
    pub regions: Vec<RegionBucket>,
    /// Market segments.
    pub segments: MarketSegments,
    /// Fixed-weight neural formula output.
    pub neural_predictions: Vec<NeuralPrediction>,
    /// Decision list classification.
    pub decision_tree: DecisionTreeResult,
    /// Monthly growth projection.
    pub projections: GrowthProjection,
    /// Headline insights.
    pub insights: Insights,
}

impl AnalysisReport {
    /// Looks up the classification of a municipality by name.
    #[must_use]
    pub fn classification_for(&self, name: &str) -> Option<&ClassificationResult> {
        self.decision_tree
            .classifications
            .iter()
            .find(|c| c.municipality == name)
    }
}
