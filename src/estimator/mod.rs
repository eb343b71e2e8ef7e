//! Cost estimation collaborator
//!
//! The auto-responder asks an LLM for a rupee range before quoting. The trait
//! keeps the negotiation core independent of the provider; `GeminiEstimator`
//! is the production client.

mod client;
mod model;

pub use client::{GeminiEstimator, GeminiSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use model::{parse_amounts, Estimate};

use async_trait::async_trait;
use thiserror::Error;

use crate::pricing::ServiceCategory;

/// Estimator failures. The bridge recovers from all of them locally.
#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Cost estimator is not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Estimator API error: {0}")]
    Api(String),

    #[error("Failed to parse estimate: {0}")]
    Parse(String),

    #[error("Cost estimator timed out")]
    Timeout,
}

#[async_trait]
pub trait CostEstimator: Send + Sync {
    async fn estimate(
        &self,
        category: &ServiceCategory,
        description: &str,
        district: &str,
    ) -> Result<Estimate, EstimatorError>;
}
