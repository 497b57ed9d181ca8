//! Runs a single task end to end: resolve model, load prompt, generate,
//! grade, fold.

use std::sync::Arc;

use evals_providers::ProviderRegistry;
use tracing::{debug, instrument};

use crate::domain::error::EvalError;
use crate::domain::score::fold_score;
use crate::domain::task::{RunnerDebug, RunnerOutput, RunnerResult, Task};
use crate::graders::GraderLoader;
use crate::prompts::PromptSource;

/// System instruction sent with every evaluation prompt.
pub const SYSTEM_PROMPT: &str = "
YOU MUST output all files as fenced code blocks, like so

```lang file=\"path/to/file.ts\"

```";

/// Executes tasks against resolved providers. Cheap to clone.
#[derive(Clone)]
pub struct TaskExecutor {
    providers: Arc<ProviderRegistry>,
    prompts: Arc<dyn PromptSource>,
    graders: Arc<dyn GraderLoader>,
}

impl TaskExecutor {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        prompts: Arc<dyn PromptSource>,
        graders: Arc<dyn GraderLoader>,
    ) -> Self {
        Self {
            providers,
            prompts,
            graders,
        }
    }

    /// Run `task` and fold its grader outcomes into a score.
    ///
    /// An unresolvable (provider, model) pair fails before any prompt or
    /// network I/O. All failures come back as `Err`, never as panics.
    #[instrument(
        skip(self, task),
        fields(provider = %task.provider, model = %task.model, eval = %task.evaluation_path)
    )]
    pub async fn execute(&self, task: &Task) -> RunnerResult {
        let model = self
            .providers
            .resolve(&task.provider, &task.model)
            .ok_or_else(|| EvalError::UnsupportedTarget {
                provider: task.provider.clone(),
                model: task.model.clone(),
            })?;

        let prompt = self.prompts.load_prompt(task).await?;

        let response = model.generate(Some(SYSTEM_PROMPT), &prompt).await?.text;
        debug!(chars = response.len(), "generation received");

        let graders = self.graders.load(&task.evaluation_path)?;
        let results = graders.evaluate(&response).await?;
        let score = fold_score(&results);

        Ok(RunnerOutput {
            score,
            debug: RunnerDebug {
                prompt,
                response,
                graders: results,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Evaluation, ModelInfo};
    use crate::graders::{contains, GraderCatalog};
    use crate::prompts::MemoryPromptSource;
    use evals_providers::fakes::{FailingProvider, StubProvider};

    const EVAL: &str = "evals/basic-setup";

    fn task(provider: &str, model: &str) -> Task {
        Task::new(
            &ModelInfo::new(provider, model, model),
            &Evaluation::new("React", "Setup", EVAL),
            EVAL.into(),
            false,
        )
    }

    fn executor(providers: ProviderRegistry) -> TaskExecutor {
        let prompts = MemoryPromptSource::new().with_prompt(EVAL, "Set up Openfort in React");
        let graders = GraderCatalog::new().with_evaluation(
            EVAL,
            vec![
                contains("OpenfortProvider", "OpenfortProvider"),
                contains("WagmiProvider", "WagmiProvider"),
            ],
        );
        TaskExecutor::new(Arc::new(providers), Arc::new(prompts), Arc::new(graders))
    }

    #[tokio::test]
    async fn test_execute_scores_response() {
        let stub = Arc::new(StubProvider::new("openai", "<OpenfortProvider> only"));
        let exec = executor(ProviderRegistry::new().with_provider(stub.clone()));

        let out = exec.execute(&task("openai", "gpt-4o")).await.unwrap();
        assert_eq!(out.score, 0.5);
        assert_eq!(out.debug.prompt, "Set up Openfort in React");
        assert_eq!(out.debug.graders.len(), 2);
        assert!(out.debug.graders[0].passed);
        assert!(!out.debug.graders[1].passed);

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system.as_deref(), Some(SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_without_calls() {
        let stub = Arc::new(StubProvider::new("openai", "irrelevant"));
        let exec = executor(ProviderRegistry::new().with_provider(stub.clone()));

        let err = exec.execute(&task("mistral", "large")).await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported: mistral/large");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_captured() {
        let failing = Arc::new(FailingProvider::new("anthropic", "overloaded"));
        let exec = executor(ProviderRegistry::new().with_provider(failing.clone()));

        let err = exec
            .execute(&task("anthropic", "claude-sonnet-4-5"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "provider");
        assert_eq!(failing.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_graders_is_grader_load() {
        let stub = Arc::new(StubProvider::new("openai", "text"));
        let prompts = MemoryPromptSource::new().with_prompt(EVAL, "p");
        let exec = TaskExecutor::new(
            Arc::new(ProviderRegistry::new().with_provider(stub)),
            Arc::new(prompts),
            Arc::new(GraderCatalog::new()),
        );
        let err = exec.execute(&task("openai", "gpt-4o")).await.unwrap_err();
        assert_eq!(err.kind(), "grader_load");
    }
}
