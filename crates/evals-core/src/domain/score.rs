//! Reporting-ready scores and score folding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::task::{GraderResult, Task};

/// A finalized score for one (model, evaluation) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub model: String,
    pub label: String,
    pub framework: String,
    pub category: String,
    pub value: f64,
    pub updated_at: DateTime<Utc>,
}

impl Score {
    pub fn from_task(task: &Task, value: f64, updated_at: DateTime<Utc>) -> Self {
        Self {
            model: task.model.clone(),
            label: task.label.clone(),
            framework: task.framework.clone(),
            category: task.category.clone(),
            value,
            updated_at,
        }
    }
}

/// Fold grader outcomes into `passed / total`.
///
/// An empty grader set scores 0.0: the denominator is clamped to 1.
pub fn fold_score(results: &[GraderResult]) -> f64 {
    let passed = results.iter().filter(|r| r.passed).count();
    passed as f64 / results.len().max(1) as f64
}
