//! Registered targets: models and evaluations.

use serde::{Deserialize, Serialize};

/// One target model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Upstream provider identity (`openai`, `anthropic`, `vercel`).
    pub provider: String,
    /// Provider-specific model identifier.
    pub name: String,
    /// Human-readable display name.
    pub label: String,
}

impl ModelInfo {
    pub fn new(provider: &str, name: &str, label: &str) -> Self {
        Self {
            provider: provider.to_string(),
            name: name.to_string(),
            label: label.to_string(),
        }
    }
}

/// One benchmark scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Evaluation {
    pub framework: String,
    pub category: String,
    /// Locator of the prompt and grader definitions, e.g. `evals/basic-setup`.
    pub path: String,
}

impl Evaluation {
    pub fn new(framework: &str, category: &str, path: &str) -> Self {
        Self {
            framework: framework.to_string(),
            category: category.to_string(),
            path: path.to_string(),
        }
    }
}
