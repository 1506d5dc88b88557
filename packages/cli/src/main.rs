#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the solar map toolchain.
//!
//! ```text
//! solar_map analyze [--source S] [--seed N] [--k K] [--json]
//! solar_map export --format csv|pdf --output PATH [--source S] [--seed N]
//! solar_map heatmap [--metric M] --output PATH [--source S] [--seed N]
//! solar_map hash-password <PASSWORD>
//! solar_map serve
//! ```
//!
//! Every command reads the same configuration as the server
//! (`SOLAR_MAP_CONFIG` plus environment overrides).

mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use solar_map_charts::HeatmapMetric;
use solar_map_config::AppConfig;

#[derive(Parser)]
#[command(name = "solar_map", about = "Puerto Rico solar adoption analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Dataset and clustering overrides shared by the analysis commands.
#[derive(clap::Args, Debug, Clone, Default)]
struct AnalysisArgs {
    /// `GeoJSON` source (file path, URL or inline JSON)
    #[arg(long)]
    source: Option<String>,
    /// Seed for k-means initialization
    #[arg(long)]
    seed: Option<u64>,
    /// Number of clusters
    #[arg(long)]
    k: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Csv,
    Pdf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis and print a summary
    Analyze {
        #[command(flatten)]
        args: AnalysisArgs,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the report as CSV or PDF
    Export {
        #[command(flatten)]
        args: AnalysisArgs,
        /// Output format
        #[arg(long, value_enum)]
        format: ExportFormat,
        /// Output file
        #[arg(long)]
        output: PathBuf,
    },
    /// Write a heatmap `GeoJSON` layer
    Heatmap {
        #[command(flatten)]
        args: AnalysisArgs,
        /// Weighting metric: customers, penetration, income or growth
        #[arg(long, default_value_t = HeatmapMetric::Customers)]
        metric: HeatmapMetric,
        /// Output file
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the SHA-256 hash for `ADMIN_PASSWORD_HASH`
    HashPassword {
        /// Admin password
        password: String,
    },
    /// Start the HTTP server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { args, json } => {
            let config = AppConfig::load()?;
            let report = report::run(&config, &args).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report::format_summary(&report));
            }
        }
        Commands::Export {
            args,
            format,
            output,
        } => {
            let config = AppConfig::load()?;
            let report = report::run(&config, &args).await?;
            let bytes = match format {
                ExportFormat::Csv => solar_map_export::to_csv(&report)?.into_bytes(),
                ExportFormat::Pdf => solar_map_export::to_pdf(&report)?,
            };
            std::fs::write(&output, bytes)?;
            println!("Wrote {}", output.display());
        }
        Commands::Heatmap {
            args,
            metric,
            output,
        } => {
            let config = AppConfig::load()?;
            let report = report::run(&config, &args).await?;
            let layer =
                solar_map_charts::heatmap(&report.municipalities, &report.predictions, metric);
            std::fs::write(&output, serde_json::to_string_pretty(&layer)?)?;
            println!(
                "Wrote {} points ({metric}) to {}",
                layer.features.len(),
                output.display()
            );
        }
        Commands::HashPassword { password } => {
            let hash = solar_map_auth::hash_password(&password);
            println!("Hash: {hash}");
            println!();
            println!("Add this to your environment:");
            println!("ADMIN_PASSWORD_HASH={hash}");
        }
        Commands::Serve => {
            let config = AppConfig::load()?;
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(solar_map_server::run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "solar_map",
            "analyze",
            "--seed",
            "42",
            "--k",
            "3",
            "--json",
        ])
        .unwrap();
        let Commands::Analyze { args, json } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.k, Some(3));
        assert!(args.source.is_none());
        assert!(json);
    }

    #[test]
    fn parses_export_format() {
        let cli = Cli::try_parse_from([
            "solar_map",
            "export",
            "--format",
            "pdf",
            "--output",
            "out.pdf",
        ])
        .unwrap();
        let Commands::Export { format, output, .. } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(format, ExportFormat::Pdf);
        assert_eq!(output, PathBuf::from("out.pdf"));

        assert!(
            Cli::try_parse_from(["solar_map", "export", "--format", "xls", "--output", "x"])
                .is_err()
        );
    }

    #[test]
    fn heatmap_metric_defaults_to_customers() {
        let cli = Cli::try_parse_from(["solar_map", "heatmap", "--output", "h.geojson"]).unwrap();
        let Commands::Heatmap { metric, .. } = cli.command else {
            panic!("expected heatmap");
        };
        assert_eq!(metric, HeatmapMetric::Customers);

        let cli = Cli::try_parse_from([
            "solar_map",
            "heatmap",
            "--metric",
            "growth",
            "--output",
            "h.geojson",
        ])
        .unwrap();
        let Commands::Heatmap { metric, .. } = cli.command else {
            panic!("expected heatmap");
        };
        assert_eq!(metric, HeatmapMetric::Growth);
    }
}
