//! LLM provider abstraction and implementations.
//!
//! Supports `OpenAI` (and `OpenAI`-compatible servers via `AI_BASE_URL`)
//! and Anthropic Claude via a common trait.

pub mod anthropic;
pub mod openai;

use crate::AiError;

/// A single-turn completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionRequest<'a> {
    /// System prompt framing the assistant's role.
    pub system: &'a str,
    /// The user prompt.
    pub prompt: &'a str,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends a completion request and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the provider responds
    /// with an error.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError>;
}

/// Creates an LLM provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `OPENAI_API_KEY` set -> `OpenAI`
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, AiError> {
    create_provider(|key| std::env::var(key).ok())
}

/// Creates an LLM provider from an arbitrary variable lookup.
///
/// # Errors
///
/// Returns [`AiError::Config`] if the selected provider has no API key or
/// the provider name is unknown.
pub fn create_provider(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Box<dyn LlmProvider>, AiError> {
    let provider = lookup("AI_PROVIDER").unwrap_or_else(|| detect_provider(&lookup).to_string());

    match provider.to_lowercase().as_str() {
        "openai" | "gpt" => {
            let api_key = lookup("OPENAI_API_KEY").ok_or_else(|| AiError::Config {
                message: "OPENAI_API_KEY environment variable not set".to_string(),
            })?;
            let model = lookup("AI_MODEL").unwrap_or_else(|| openai::DEFAULT_MODEL.to_string());
            let mut provider = openai::OpenAiProvider::new(api_key, model);
            if let Some(base_url) = lookup("AI_BASE_URL") {
                provider = provider.with_base_url(base_url);
            }
            Ok(Box::new(provider))
        }
        "anthropic" | "claude" => {
            let api_key = lookup("ANTHROPIC_API_KEY").ok_or_else(|| AiError::Config {
                message: "ANTHROPIC_API_KEY environment variable not set".to_string(),
            })?;
            let model =
                lookup("AI_MODEL").unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string());
            Ok(Box::new(anthropic::AnthropicProvider::new(api_key, model)))
        }
        other => Err(AiError::Config {
            message: format!("Unknown AI provider: {other}. Use 'openai' or 'anthropic'."),
        }),
    }
}

/// Picks a provider name from whichever API key is present.
fn detect_provider(lookup: &impl Fn(&str) -> Option<String>) -> &'static str {
    if lookup("OPENAI_API_KEY").is_some() {
        log::info!("Auto-detected AI provider: OpenAI (OPENAI_API_KEY found)");
        return "openai";
    }

    if lookup("ANTHROPIC_API_KEY").is_some() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic";
    }

    log::warn!(
        "No AI credentials detected. Set OPENAI_API_KEY or ANTHROPIC_API_KEY, \
         or set AI_PROVIDER explicitly."
    );

    // Falls through to a clear missing-key error.
    "openai"
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let Err(err) = create_provider(lookup(&[])) else {
            panic!("expected a configuration error");
        };
        assert!(matches!(err, AiError::Config { .. }));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn explicit_provider_requires_its_own_key() {
        let Err(err) = create_provider(lookup(&[
            ("AI_PROVIDER", "anthropic"),
            ("OPENAI_API_KEY", "sk-test"),
        ])) else {
            panic!("expected a configuration error");
        };
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let Err(err) = create_provider(lookup(&[("AI_PROVIDER", "bard")])) else {
            panic!("expected a configuration error");
        };
        assert!(err.to_string().contains("bard"));
    }

    #[test]
    fn detects_from_available_key() {
        assert_eq!(detect_provider(&lookup(&[("ANTHROPIC_API_KEY", "k")])), "anthropic");
        assert_eq!(
            detect_provider(&lookup(&[("ANTHROPIC_API_KEY", "k"), ("OPENAI_API_KEY", "k")])),
            "openai"
        );
        assert!(create_provider(lookup(&[("OPENAI_API_KEY", "sk-test")])).is_ok());
    }
}
