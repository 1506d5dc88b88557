#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Content generation for municipality pages.
//!
//! Wraps an [`providers::LlmProvider`] with the prompts used by the admin
//! dashboard: a Spanish long-form description and a small structured
//! bundle of tags, highlights and a fun fact.

pub mod providers;

use regex::Regex;
use serde::{Deserialize, Serialize};
use solar_map_analytics_models::MunicipalityMetrics;
use solar_map_editorial_models::AdditionalContent;
use thiserror::Error;

use crate::providers::{CompletionRequest, LlmProvider};

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

const DESCRIPTION_SYSTEM: &str = "Eres un experto en escribir descripciones atractivas sobre \
     municipios de Puerto Rico, con enfoque en energía solar y desarrollo sostenible.";

const ADDITIONAL_SYSTEM: &str = "Eres un experto en generar contenido estructurado sobre \
     municipios de Puerto Rico. Responde siempre con JSON válido.";

const TEMPERATURE: f32 = 0.7;
const DESCRIPTION_MAX_TOKENS: u32 = 300;
const ADDITIONAL_MAX_TOKENS: u32 = 200;

/// Statistics quoted in prompts. Missing values render as `N/A`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityStats {
    /// Number of solar customers.
    #[serde(default)]
    pub customers: Option<u64>,
    /// Mean household income.
    #[serde(default)]
    pub avg_income: Option<f64>,
    /// Penetration rate in percent.
    #[serde(default)]
    pub penetration_rate: Option<f64>,
    /// Mean population.
    #[serde(default)]
    pub avg_population: Option<f64>,
}

impl From<&MunicipalityMetrics> for MunicipalityStats {
    fn from(metrics: &MunicipalityMetrics) -> Self {
        let positive = |v: f64| (v > 0.0).then_some(v);
        Self {
            customers: (metrics.customers > 0).then_some(metrics.customers),
            avg_income: positive(metrics.avg_income),
            penetration_rate: positive(metrics.penetration_rate),
            avg_population: positive(metrics.avg_population),
        }
    }
}

/// Formats a whole number with comma thousands separators.
#[allow(clippy::cast_possible_truncation)]
fn grouped(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn or_na<T>(value: Option<T>, format: impl FnOnce(T) -> String) -> String {
    value.map_or_else(|| "N/A".to_string(), format)
}

/// Builds the description prompt.
#[must_use]
pub fn description_prompt(name: &str, stats: &MunicipalityStats) -> String {
    format!(
        "Escribe una descripción atractiva y profesional en español para el municipio de {name}, Puerto Rico.

Contexto:
- Clientes de energía solar: {customers}
- Ingreso promedio: ${income}
- Tasa de penetración solar: {penetration}%
- Población promedio: {population}

La descripción debe:
- Ser entre 150-250 palabras
- Destacar aspectos únicos del municipio
- Mencionar el potencial de energía solar
- Ser informativa pero atractiva
- Incluir información sobre la adopción de energía solar si es relevante

Escribe solo la descripción, sin títulos ni encabezados.",
        customers = or_na(stats.customers, |c| c.to_string()),
        income = or_na(stats.avg_income, grouped),
        penetration = or_na(stats.penetration_rate, |p| format!("{p:.2}")),
        population = or_na(stats.avg_population, grouped),
    )
}

/// Builds the structured-content prompt.
#[must_use]
pub fn additional_content_prompt(name: &str, stats: &MunicipalityStats) -> String {
    format!(
        "Para el municipio de {name}, Puerto Rico, genera un JSON con:
- tags: array de 3-5 palabras clave relevantes (ej: [\"Turismo\", \"Energía Solar\", \"Cultura\"])
- highlights: array de 2-3 puntos destacados en una frase cada uno
- funFact: un dato interesante sobre el municipio en una frase

Datos del municipio:
- Clientes solares: {customers}
- Ingreso promedio: ${income}
- Penetración solar: {penetration}%

Responde SOLO con un JSON válido, sin texto adicional.",
        customers = or_na(stats.customers, |c| c.to_string()),
        income = or_na(stats.avg_income, grouped),
        penetration = or_na(stats.penetration_rate, |p| format!("{p:.2}")),
    )
}

/// Parses the JSON object embedded in a model reply.
///
/// Takes the span from the first `{` to the last `}`, so surrounding
/// prose and markdown fences are ignored.
///
/// # Errors
///
/// Returns [`AiError::Json`] if no valid object can be parsed.
pub fn parse_additional_content(reply: &str) -> Result<AdditionalContent, AiError> {
    let object_re = Regex::new(r"(?s)\{.*\}").unwrap_or_else(|_| unreachable!());
    let reply = reply.trim();
    let json = object_re.find(reply).map_or(reply, |m| m.as_str());
    Ok(serde_json::from_str(json)?)
}

/// Generates municipality copy through an LLM provider.
pub struct ContentGenerator {
    provider: Box<dyn LlmProvider>,
}

impl std::fmt::Debug for ContentGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGenerator").finish_non_exhaustive()
    }
}

impl ContentGenerator {
    /// Wraps an existing provider.
    #[must_use]
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Builds a generator from the `AI_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if no provider is configured.
    pub fn from_env() -> Result<Self, AiError> {
        providers::create_provider_from_env().map(Self::new)
    }

    /// Generates a 150-250 word Spanish description.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the provider request fails.
    pub async fn generate_description(
        &self,
        name: &str,
        stats: &MunicipalityStats,
    ) -> Result<String, AiError> {
        let prompt = description_prompt(name, stats);
        let text = self
            .provider
            .complete(&CompletionRequest {
                system: DESCRIPTION_SYSTEM,
                prompt: &prompt,
                max_tokens: DESCRIPTION_MAX_TOKENS,
                temperature: TEMPERATURE,
            })
            .await?;

        log::debug!("Generated {} byte description for {name}", text.len());
        Ok(text.trim().to_string())
    }

    /// Generates tags, highlights and a fun fact.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the provider request fails or the reply has
    /// no parseable JSON object.
    pub async fn generate_additional_content(
        &self,
        name: &str,
        stats: &MunicipalityStats,
    ) -> Result<AdditionalContent, AiError> {
        let prompt = additional_content_prompt(name, stats);
        let text = self
            .provider
            .complete(&CompletionRequest {
                system: ADDITIONAL_SYSTEM,
                prompt: &prompt,
                max_tokens: ADDITIONAL_MAX_TOKENS,
                temperature: TEMPERATURE,
            })
            .await?;

        let reply = if text.trim().is_empty() { "{}" } else { &text };
        parse_additional_content(reply).inspect_err(|e| {
            log::warn!("Unparseable additional content for {name}: {e}");
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    struct ScriptedProvider {
        reply: String,
        seen: Arc<Mutex<Vec<(u32, String)>>>,
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError> {
            self.seen
                .lock()
                .unwrap()
                .push((request.max_tokens, request.prompt.to_string()));
            Ok(self.reply.clone())
        }
    }

    fn generator(reply: &str) -> ContentGenerator {
        ContentGenerator::new(Box::new(ScriptedProvider {
            reply: reply.to_string(),
            seen: Arc::default(),
        }))
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(grouped(35_000.4), "35,000");
        assert_eq!(grouped(1_234_567.0), "1,234,567");
        assert_eq!(grouped(999.0), "999");
        assert_eq!(grouped(0.0), "0");
    }

    #[test]
    fn prompt_quotes_stats_and_marks_missing() {
        let stats = MunicipalityStats {
            customers: Some(120),
            avg_income: Some(35_000.0),
            penetration_rate: None,
            avg_population: Some(100_000.0),
        };
        let prompt = description_prompt("Ponce", &stats);
        assert!(prompt.contains("municipio de Ponce, Puerto Rico"));
        assert!(prompt.contains("Clientes de energía solar: 120"));
        assert!(prompt.contains("Ingreso promedio: $35,000"));
        assert!(prompt.contains("Tasa de penetración solar: N/A%"));
        assert!(prompt.contains("150-250 palabras"));
    }

    #[test]
    fn parses_fenced_json() {
        let reply = "```json\n{\"tags\":[\"Turismo\",\"Café\"],\"highlights\":[\"Montañas\"],\"funFact\":\"Capital del café\"}\n```";
        let content = parse_additional_content(reply).unwrap();
        assert_eq!(content.tags, ["Turismo", "Café"]);
        assert_eq!(content.highlights, ["Montañas"]);
        assert_eq!(content.fun_fact.as_deref(), Some("Capital del café"));
    }

    #[test]
    fn parses_json_surrounded_by_prose() {
        let reply = "Aquí está: {\"tags\":[\"Playa\"]} ¡Listo!";
        let content = parse_additional_content(reply).unwrap();
        assert_eq!(content.tags, ["Playa"]);
        assert!(content.highlights.is_empty());
        assert!(content.fun_fact.is_none());
    }

    #[test]
    fn rejects_reply_without_json() {
        assert!(matches!(
            parse_additional_content("no hay datos"),
            Err(AiError::Json(_))
        ));
    }

    #[test]
    fn stats_from_metrics_drop_zero_values() {
        let metrics = MunicipalityMetrics {
            name: "Culebra".to_string(),
            customers: 3,
            avg_income: 0.0,
            penetration_rate: 0.0,
            ..MunicipalityMetrics::default()
        };
        let stats = MunicipalityStats::from(&metrics);
        assert_eq!(stats.customers, Some(3));
        assert!(stats.avg_income.is_none());
        assert!(stats.penetration_rate.is_none());
    }

    #[tokio::test]
    async fn description_is_trimmed() {
        let generator = generator("\n  Ponce es la Perla del Sur.  \n");
        let text = generator
            .generate_description("Ponce", &MunicipalityStats::default())
            .await
            .unwrap();
        assert_eq!(text, "Ponce es la Perla del Sur.");
    }

    #[tokio::test]
    async fn additional_content_uses_smaller_budget() {
        let seen = Arc::default();
        let generator = ContentGenerator::new(Box::new(ScriptedProvider {
            reply: r#"{"tags":["Solar"],"funFact":"Dato"}"#.to_string(),
            seen: Arc::clone(&seen),
        }));
        let content = generator
            .generate_additional_content("Lares", &MunicipalityStats::default())
            .await
            .unwrap();
        assert_eq!(content.tags, ["Solar"]);
        assert_eq!(content.fun_fact.as_deref(), Some("Dato"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, ADDITIONAL_MAX_TOKENS);
        assert!(seen[0].1.contains("municipio de Lares"));
    }

    #[tokio::test]
    async fn empty_reply_yields_empty_content() {
        let content = generator("   ")
            .generate_additional_content("Vieques", &MunicipalityStats::default())
            .await
            .unwrap();
        assert_eq!(content, AdditionalContent::default());
    }
}
