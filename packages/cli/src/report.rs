//! Runs the analysis pipeline for CLI commands and renders its summary.

use std::fmt::Write as _;

use solar_map_analytics_models::{AnalysisConfig, AnalysisReport};
use solar_map_config::AppConfig;
use solar_map_features::FeatureError;

use crate::AnalysisArgs;

/// Applies command-line overrides to the configured analysis parameters.
fn analysis_config(config: &AppConfig, args: &AnalysisArgs) -> AnalysisConfig {
    let mut analysis = config.analysis;
    if let Some(seed) = args.seed {
        analysis.seed = Some(seed);
    }
    if let Some(k) = args.k {
        analysis.k = k;
    }
    analysis
}

/// Loads the dataset (honoring `--source`) and analyzes it.
///
/// # Errors
///
/// Returns [`FeatureError`] if no source strategy yields features.
pub async fn run(config: &AppConfig, args: &AnalysisArgs) -> Result<AnalysisReport, FeatureError> {
    let source = args
        .source
        .as_deref()
        .map_or_else(|| config.data_source(), |s| config.data_source_from(s));
    let features = source.load().await?;
    let analysis = analysis_config(config, args);

    log::info!(
        "Analyzing {} features with k={} (seed {:?})",
        features.len(),
        analysis.k,
        analysis.seed
    );
    Ok(solar_map_analytics::analyze_now(&features, &analysis))
}

/// Renders a plain-text overview of `report`.
#[must_use]
pub fn format_summary(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    let _ = writeln!(out, "Municipios:            {}", summary.total_municipalities);
    let _ = writeln!(out, "Clientes:              {}", summary.total_customers);
    let _ = writeln!(out, "Penetración promedio:  {:.2}%", summary.avg_penetration);
    let _ = writeln!(out, "Ingreso promedio:      ${:.0}", summary.avg_income);

    if !report.clusters.is_empty() {
        let _ = writeln!(out, "\nClusters:");
        for cluster in &report.clusters {
            let _ = writeln!(
                out,
                "  {:<12} {:>3} municipios  {:>6} clientes  ingreso ${:.0}",
                cluster.name,
                cluster.municipalities.len(),
                cluster.characteristics.total_customers,
                cluster.characteristics.avg_income,
            );
        }
    }

    if !report.predictions.is_empty() {
        let _ = writeln!(out, "\nMayor potencial de crecimiento:");
        for prediction in report.predictions.iter().take(5) {
            let _ = writeln!(
                out,
                "  {:<20} {:>6} -> {:>8.0}  (+{:.0})",
                prediction.name,
                prediction.customers,
                prediction.predicted_customers,
                prediction.growth_potential,
            );
        }
    }

    let _ = writeln!(
        out,
        "\nConcentración de mercado (top 3): {:.1}%",
        report.insights.market_concentration
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{"features":[
        {"geometry":{"type":"Point","coordinates":[-66.61,18.01]},
         "properties":{"County":"Ponce Municipio","Income":30000,"TotalPop":100000}},
        {"geometry":{"type":"Point","coordinates":[-66.06,18.42]},
         "properties":{"County":"San Juan Municipio","Income":45000,"TotalPop":300000}}
    ]}"#;

    #[test]
    fn overrides_replace_configured_values() {
        let config = AppConfig::default();
        let args = AnalysisArgs {
            seed: Some(9),
            k: Some(2),
            source: None,
        };
        let analysis = analysis_config(&config, &args);
        assert_eq!(analysis.seed, Some(9));
        assert_eq!(analysis.k, 2);

        let untouched = analysis_config(&config, &AnalysisArgs::default());
        assert_eq!(untouched, config.analysis);
    }

    #[tokio::test]
    async fn runs_inline_source_and_summarizes() {
        let mut config = AppConfig::default();
        config.data.fallbacks.clear();
        let args = AnalysisArgs {
            source: Some(DATASET.to_string()),
            seed: Some(1),
            k: Some(2),
        };

        let report = run(&config, &args).await.unwrap();
        assert_eq!(report.summary.total_municipalities, 2);
        assert_eq!(report.summary.total_customers, 2);

        let text = format_summary(&report);
        assert!(text.contains("Municipios:            2"));
        assert!(text.contains("Clientes:              2"));
    }

    #[test]
    fn empty_report_summary_has_no_sections() {
        let text = format_summary(&AnalysisReport::default());
        assert!(text.contains("Clientes:              0"));
        assert!(!text.contains("Clusters:"));
    }
}
