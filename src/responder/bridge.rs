//! Estimator-backed auto-responder

use std::sync::Arc;
use std::time::Duration;

use crate::estimator::{CostEstimator, EstimatorError};
use crate::pricing::ServiceCategory;

use super::strategy::{opening_quote, Reply};

/// Stands in for the technician while no human is on the other end of the chat
#[derive(Clone)]
pub struct AutoResponder {
    estimator: Arc<dyn CostEstimator>,
    timeout: Duration,
    enabled: bool,
}

impl AutoResponder {
    pub fn new(estimator: Arc<dyn CostEstimator>, timeout: Duration) -> Self {
        Self {
            estimator,
            timeout,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn greeting(&self) -> Reply {
        Reply::Greeting
    }

    /// Quote for a customer's first description. Never fails: estimator errors
    /// and timeouts degrade to the category minimum.
    pub async fn first_quote(
        &self,
        category: &ServiceCategory,
        description: &str,
        district: &str,
    ) -> Reply {
        let outcome = match tokio::time::timeout(
            self.timeout,
            self.estimator.estimate(category, description, district),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(EstimatorError::Timeout),
        };

        if let Err(e) = &outcome {
            tracing::warn!(
                category = %category,
                district = %district,
                error = %e,
                "Cost estimator unavailable, quoting category minimum"
            );
        }

        opening_quote(category, outcome.as_ref())
    }
}
