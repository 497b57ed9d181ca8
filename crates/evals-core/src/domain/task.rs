//! Units of work and their outcomes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::Result;
use crate::domain::model::{Evaluation, ModelInfo};

/// One (model, evaluation) pair, resolved and ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub provider: String,
    pub model: String,
    pub label: String,
    pub framework: String,
    pub category: String,
    /// Registry path of the evaluation (`evals/basic-setup`).
    pub evaluation_path: String,
    /// Evaluation directory on disk, resolved against the evals root.
    pub eval_dir: PathBuf,
    pub debug: bool,
}

impl Task {
    pub fn new(model: &ModelInfo, evaluation: &Evaluation, eval_dir: PathBuf, debug: bool) -> Self {
        Self {
            provider: model.provider.clone(),
            model: model.name.clone(),
            label: model.label.clone(),
            framework: evaluation.framework.clone(),
            category: evaluation.category.clone(),
            evaluation_path: evaluation.path.clone(),
            eval_dir,
            debug,
        }
    }

    /// Identity of the task within a run: (provider, model, evaluation path).
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.provider, &self.model, &self.evaluation_path)
    }
}

/// Outcome of one named grader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraderResult {
    pub name: String,
    pub passed: bool,
}

impl GraderResult {
    pub fn new(name: &str, passed: bool) -> Self {
        Self {
            name: name.to_string(),
            passed,
        }
    }
}

/// Full prompt/response/grader trace of a successful task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerDebug {
    pub prompt: String,
    pub response: String,
    /// Grader outcomes in declaration order.
    pub graders: Vec<GraderResult>,
}

/// Success payload of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerOutput {
    /// Fraction of graders that passed, in `[0, 1]`.
    pub score: f64,
    pub debug: RunnerDebug,
}

/// Result of executing one [`Task`]. Failures are values, never panics.
pub type RunnerResult = Result<RunnerOutput>;
