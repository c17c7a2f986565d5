use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runtime dials for provider access during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub provider_timeout_ms: u64,
    pub max_concurrent_evaluations: usize,
}

impl EvaluationConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms.max(1))
    }

    pub fn concurrency_limit(&self) -> usize {
        self.max_concurrent_evaluations.max(1)
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 5_000,
            max_concurrent_evaluations: 16,
        }
    }
}
