//! Openfort Evals core library
//!
//! Task planning, per-provider admission, isolated execution, grading and
//! reporting for the `openfort-evals` harness.

pub mod config;
pub mod debug_artifacts;
pub mod domain;
pub mod executor;
pub mod graders;
pub mod orchestrator;
pub mod pool;
pub mod prompts;
pub mod rate_limiter;
pub mod registry;
pub mod reporting;
pub mod telemetry;

pub use config::{parse_provider_limit, rate_limits_from, HarnessConfig, DEFAULT_MAX_WORKERS};

pub use debug_artifacts::{
    evaluation_slug, parse_artifact, render_artifact, sanitize_for_filename, DebugArtifact,
    DebugError, DebugRun, ParsedArtifact,
};

pub use domain::{
    fold_score, EvalError, Evaluation, GraderResult, ModelInfo, Result, RunnerDebug, RunnerOutput,
    RunnerResult, Score, SelectionError, Task,
};

pub use executor::{TaskExecutor, SYSTEM_PROMPT};

pub use graders::{GraderCatalog, GraderLoader, GraderSet, JudgeModel, ModelJudge};

pub use orchestrator::{build_tasks, plan_tasks, BatchOutcome, Orchestrator};
pub use pool::WorkerPool;
pub use prompts::{FsPromptSource, MemoryPromptSource, PromptSource, PROMPT_FILE};
pub use rate_limiter::{ProviderBudget, ProviderRateLimiter, RateLimitConfig};
pub use registry::{normalize_eval_path, Registry};
pub use reporting::{render_score_table, write_scores_json};
pub use telemetry::init_tracing;
