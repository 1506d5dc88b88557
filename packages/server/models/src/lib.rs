#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the solar map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the storage and analysis types to allow independent evolution of
//! the API contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solar_map_editorial_models::MunicipalityContent;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned by every failing route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Short error summary.
    pub error: String,
    /// Underlying cause, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    /// An error with no detail message.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    /// An error with a detail message.
    #[must_use]
    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

/// `?name=` selector on the municipality routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MunicipalityQuery {
    /// Municipality name.
    pub name: Option<String>,
}

/// Result of a create-or-update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUpsertResponse {
    /// Always `true`.
    pub success: bool,
    /// `Municipality created` or `Municipality updated`.
    pub message: String,
    /// The stored record.
    pub data: MunicipalityContent,
}

/// Result of a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDeleteResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable status.
    pub message: String,
}

/// Admin login body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Plain-text admin password.
    pub password: String,
}

/// Issued admin session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for admin routes.
    pub token: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Query parameters for the analytics routes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQueryParams {
    /// Pins the clustering RNG.
    pub seed: Option<u64>,
}

/// Query parameters for the heatmap route.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapQueryParams {
    /// `customers`, `penetration`, `income` or `growth`.
    pub metric: Option<String>,
    /// Pins the clustering RNG.
    pub seed: Option<u64>,
}

/// Generated copy for one municipality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGeneratedContent {
    /// Municipality name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Short keyword tags.
    pub tags: Vec<String>,
    /// Notable facts.
    pub highlights: Vec<String>,
    /// A single fun fact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fun_fact: Option<String>,
}
