//! Registered models and evaluations, and CLI selection against them.
//!
//! The registry is a plain value handed to the CLI and the task builder so
//! tests can substitute their own targets.

use tracing::info;

use crate::domain::error::SelectionError;
use crate::domain::model::{Evaluation, ModelInfo};

/// The set of targets a run may select from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    pub models: Vec<ModelInfo>,
    pub evaluations: Vec<Evaluation>,
}

impl Registry {
    pub fn new(models: Vec<ModelInfo>, evaluations: Vec<Evaluation>) -> Self {
        Self {
            models,
            evaluations,
        }
    }

    /// Models and evaluations shipped with the harness.
    pub fn builtin() -> Self {
        let models = vec![
            ModelInfo::new("openai", "gpt-4o", "GPT-4o"),
            ModelInfo::new("openai", "gpt-5", "GPT-5"),
            ModelInfo::new("openai", "gpt-5-chat-latest", "GPT-5 Chat"),
            ModelInfo::new("openai", "gpt-5-codex", "GPT-5 Codex"),
            ModelInfo::new("anthropic", "claude-sonnet-4-0", "Claude Sonnet 4"),
            ModelInfo::new("anthropic", "claude-sonnet-4-5", "Claude Sonnet 4.5"),
            ModelInfo::new("vercel", "v0-1.5-md", "v0-1.5-md"),
        ];

        let evaluations = vec![
            Evaluation::new("React", "Setup", "evals/basic-setup"),
            Evaluation::new("React", "Authentication", "evals/authentication"),
            Evaluation::new("React", "Embedded Wallets", "evals/embedded-wallets"),
            Evaluation::new("React", "Wallet Recovery", "evals/wallet-recovery"),
            Evaluation::new("React", "Wallet Actions", "evals/wallet-actions"),
            Evaluation::new("React", "Hooks", "evals/hooks-usage"),
        ];

        Self::new(models, evaluations)
    }

    /// Resolve `--eval`. `None` or a blank value selects every evaluation.
    pub fn select_evaluations(
        &self,
        requested: Option<&str>,
    ) -> Result<Vec<Evaluation>, SelectionError> {
        let raw = match requested.map(str::trim) {
            None | Some("") => return Ok(self.evaluations.clone()),
            Some(raw) => raw,
        };

        let normalized = normalize_eval_path(raw);
        let target = self.evaluations.iter().find(|e| {
            e.path == normalized
                || e.path.ends_with(&format!("/{normalized}"))
                || e.path.ends_with(&format!("/{raw}"))
        });

        match target {
            Some(target) => {
                info!(
                    "Running single evaluation \"{}\" for all registered models",
                    target.path
                );
                Ok(vec![target.clone()])
            }
            None => Err(SelectionError::UnknownEvaluation {
                requested: raw.to_string(),
                available: self
                    .evaluations
                    .iter()
                    .map(|e| e.path.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Resolve `--model`. An empty list selects every model.
    ///
    /// Each entry matches by `name` or `label`; output follows request order
    /// with duplicates dropped.
    pub fn select_models(&self, requested: &[String]) -> Result<Vec<ModelInfo>, SelectionError> {
        let requested: Vec<&str> = requested
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .collect();
        if requested.is_empty() {
            return Ok(self.models.clone());
        }

        let mut targets: Vec<ModelInfo> = Vec::with_capacity(requested.len());
        for arg in requested {
            let target = self
                .models
                .iter()
                .find(|m| m.name == arg || m.label == arg)
                .ok_or_else(|| SelectionError::UnknownModel {
                    requested: arg.to_string(),
                    available: self
                        .models
                        .iter()
                        .map(|m| format!("{} ({})", m.name, m.label))
                        .collect::<Vec<_>>()
                        .join(", "),
                })?;
            if !targets.contains(target) {
                targets.push(target.clone());
            }
        }

        if let [only] = targets.as_slice() {
            info!("Running for single model \"{}\" ({})", only.name, only.label);
        } else {
            info!(
                "Running for {} models: {}",
                targets.len(),
                targets
                    .iter()
                    .map(|m| m.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(targets)
    }

    /// Listing of available targets for `--help`.
    pub fn help_listing(&self) -> String {
        let mut out = String::from("Available models:\n");
        for m in &self.models {
            out.push_str(&format!("  - {} ({})\n", m.name, m.label));
        }
        out.push_str("\nAvailable evaluations:\n");
        for e in &self.evaluations {
            out.push_str(&format!("  - {} ({})\n", e.path, e.category));
        }
        out
    }
}

/// Normalize an `--eval` value: drop leading `./`, ensure an `evals/` prefix.
pub fn normalize_eval_path(value: &str) -> String {
    let mut value = value;
    while let Some(rest) = value.strip_prefix("./") {
        value = rest;
    }
    if value.starts_with("evals/") {
        value.to_string()
    } else {
        format!("evals/{value}")
    }
}
