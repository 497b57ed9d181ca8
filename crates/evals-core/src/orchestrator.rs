//! Batch scheduling.
//!
//! [`Orchestrator::run`] submits every task at once. Each task waits for a
//! slot in its provider's lane, then for a worker, then executes. Outcomes
//! are collected as they settle into slots indexed by task position, so the
//! final score order follows the task list regardless of completion order.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::HarnessConfig;
use crate::debug_artifacts::{DebugArtifact, DebugError};
use crate::domain::error::{EvalError, SelectionError};
use crate::domain::model::{Evaluation, ModelInfo};
use crate::domain::score::Score;
use crate::domain::task::{RunnerResult, Task};
use crate::executor::TaskExecutor;
use crate::pool::WorkerPool;
use crate::rate_limiter::ProviderRateLimiter;
use crate::registry::Registry;

/// Cartesian product of `models` x `evaluations`, models outermost.
pub fn build_tasks(
    models: &[ModelInfo],
    evaluations: &[Evaluation],
    evals_root: &Path,
    debug: bool,
) -> Vec<Task> {
    models
        .iter()
        .flat_map(|model| {
            evaluations.iter().map(move |evaluation| {
                Task::new(
                    model,
                    evaluation,
                    evals_root.join(&evaluation.path),
                    debug,
                )
            })
        })
        .collect()
}

/// Resolve `--eval` and `--model` against `registry` and build the task
/// list. Fails before anything is scheduled if a selector matches nothing.
pub fn plan_tasks(
    registry: &Registry,
    eval: Option<&str>,
    models: &[String],
    config: &HarnessConfig,
) -> Result<Vec<Task>, SelectionError> {
    let evaluations = registry.select_evaluations(eval)?;
    let models = registry.select_models(models)?;
    Ok(build_tasks(
        &models,
        &evaluations,
        &config.evals_root,
        config.debug,
    ))
}

/// Everything a finished batch produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One entry per successful task, in task-list order.
    pub scores: Vec<Score>,
    /// Present only for tasks run with `debug` set.
    pub artifacts: Vec<DebugArtifact>,
    pub errors: Vec<DebugError>,
    pub succeeded: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

type Settled = (usize, RunnerResult, DateTime<Utc>);
type Slot = Option<(RunnerResult, DateTime<Utc>)>;

/// Drain `join_set` into slots indexed by task position. Every joined entry
/// advances the progress counter, including ones that failed to join; their
/// slot stays empty.
async fn settle(join_set: &mut JoinSet<Settled>, tasks: &[Task]) -> Vec<Slot> {
    let total = tasks.len();
    let mut slots: Vec<Slot> = (0..total).map(|_| None).collect();
    let mut completed = 0usize;

    while let Some(joined) = join_set.join_next().await {
        completed += 1;
        let (idx, result, finished_at) = match joined {
            Ok(settled) => settled,
            Err(e) => {
                warn!(error = %e, "task join error");
                info!("[done  {}/{}] (join error)", completed, total);
                continue;
            }
        };
        let task = &tasks[idx];
        info!(
            "[done  {}/{}] {} → {}",
            completed, total, task.model, task.evaluation_path
        );
        if let Err(e) = &result {
            warn!(
                provider = %task.provider,
                model = %task.model,
                eval = %task.evaluation_path,
                kind = e.kind(),
                error = %e,
                "Runner errored"
            );
        }
        slots[idx] = Some((result, finished_at));
    }

    debug_assert_eq!(completed, total);
    slots
}

/// Fans tasks out through the rate limiter and worker pool.
pub struct Orchestrator {
    executor: TaskExecutor,
    pool: WorkerPool,
    limiter: Arc<ProviderRateLimiter>,
}

impl Orchestrator {
    pub fn new(executor: TaskExecutor, config: &HarnessConfig) -> Self {
        Self::with_parts(
            executor,
            WorkerPool::new(config.max_workers),
            Arc::new(ProviderRateLimiter::new(config.rate_limits.clone())),
        )
    }

    pub fn with_parts(
        executor: TaskExecutor,
        pool: WorkerPool,
        limiter: Arc<ProviderRateLimiter>,
    ) -> Self {
        Self {
            executor,
            pool,
            limiter,
        }
    }

    /// Run every task to settlement. Task failures never abort the batch.
    #[instrument(skip(self, tasks), fields(tasks = tasks.len()))]
    pub async fn run(&self, tasks: Vec<Task>) -> BatchOutcome {
        let started = Instant::now();
        let total = tasks.len();
        info!(
            "Starting {} tasks (up to {} workers)",
            total,
            self.pool.capacity()
        );

        let mut join_set = JoinSet::new();
        for (idx, task) in tasks.iter().cloned().enumerate() {
            let executor = self.executor.clone();
            let pool = self.pool.clone();
            let limiter = Arc::clone(&self.limiter);
            join_set.spawn(async move {
                info!("[start {}/{}] {} → {}", idx + 1, total, task.model, task.evaluation_path);
                let provider = task.provider.clone();
                let result = limiter
                    .schedule(&provider, move || async move {
                        pool.run(async move { executor.execute(&task).await })
                            .await
                    })
                    .await
                    .and_then(|r| r);
                (idx, result, Utc::now())
            });
        }

        let slots = settle(&mut join_set, &tasks).await;

        let mut outcome = BatchOutcome::default();
        for (task, slot) in tasks.iter().zip(slots) {
            let (result, finished_at) = slot.unwrap_or_else(|| {
                (
                    Err(EvalError::TaskNotSettled(format!(
                        "{}/{} {}",
                        task.provider, task.model, task.evaluation_path
                    ))),
                    Utc::now(),
                )
            });

            match result {
                Ok(output) => {
                    outcome.succeeded += 1;
                    outcome
                        .scores
                        .push(Score::from_task(task, output.score, finished_at));
                    if task.debug {
                        outcome
                            .artifacts
                            .push(DebugArtifact::from_output(task, &output));
                    }
                }
                Err(e) => {
                    outcome.failed += 1;
                    if task.debug {
                        outcome.errors.push(DebugError::from_error(task, &e));
                    }
                }
            }
        }

        outcome.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            duration_ms = outcome.duration_ms,
            "batch finished"
        );
        outcome
    }
}
