//! Error taxonomy for the harness.

use evals_providers::ProviderError;

/// Per-task failures. Every variant is recoverable: the orchestrator records
/// it against the task and moves on.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("Unsupported: {provider}/{model}")]
    UnsupportedTarget { provider: String, model: String },

    #[error("failed to load prompt {path}: {source}")]
    PromptLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("provider call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("failed to load graders for {evaluation}: {reason}")]
    GraderLoad { evaluation: String, reason: String },

    #[error("grader {grader} failed: {reason}")]
    GraderExecution { grader: String, reason: String },

    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("task did not settle: {0}")]
    TaskNotSettled(String),
}

impl EvalError {
    /// Stable machine-readable category, used in `errors.json`.
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::UnsupportedTarget { .. } => "unsupported_target",
            EvalError::PromptLoad { .. } => "prompt_load",
            EvalError::Provider(_) => "provider",
            EvalError::GraderLoad { .. } => "grader_load",
            EvalError::GraderExecution { .. } => "grader_execution",
            EvalError::WorkerPanicked(_) => "worker_panicked",
            EvalError::TaskNotSettled(_) => "task_not_settled",
        }
    }
}

/// Fatal configuration errors raised while resolving `--eval` / `--model`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("No evaluation matching \"{requested}\". Available evaluations: {available}")]
    UnknownEvaluation { requested: String, available: String },

    #[error("No model matching \"{requested}\". Available models: {available}")]
    UnknownModel { requested: String, available: String },
}

/// Result type for a single task run.
pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = EvalError::UnsupportedTarget {
            provider: "mistral".to_string(),
            model: "large".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported: mistral/large");
        assert_eq!(err.kind(), "unsupported_target");
    }

    #[test]
    fn test_provider_error_converts() {
        let err: EvalError = ProviderError::Other("timeout".to_string()).into();
        assert_eq!(err.kind(), "provider");
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_selection_error_lists_available() {
        let err = SelectionError::UnknownModel {
            requested: "does-not-exist".to_string(),
            available: "gpt-4o (GPT-4o)".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("does-not-exist"));
        assert!(msg.contains("gpt-4o (GPT-4o)"));
    }
}
