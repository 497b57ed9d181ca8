//! LLM-judged checks.

use anyhow::Context;
use async_trait::async_trait;
use evals_providers::LanguageModel;
use tracing::debug;

const JUDGE_SYSTEM_PROMPT: &str = "You are grading a code sample produced by another model. \
Answer the question about the sample with a single word: YES or NO.";

/// Answers a natural-language yes/no question about a response.
#[async_trait]
pub trait JudgeModel: Send + Sync {
    async fn judge(&self, question: &str, response: &str) -> anyhow::Result<bool>;
}

/// [`JudgeModel`] backed by a secondary model call.
pub struct ModelJudge {
    model: LanguageModel,
}

impl ModelJudge {
    pub fn new(model: LanguageModel) -> Self {
        Self { model }
    }
}

#[async_trait]
impl JudgeModel for ModelJudge {
    async fn judge(&self, question: &str, response: &str) -> anyhow::Result<bool> {
        let prompt = render_judge_prompt(question, response);
        let answer = self
            .model
            .generate(Some(JUDGE_SYSTEM_PROMPT), &prompt)
            .await
            .with_context(|| {
                format!(
                    "judge call to {}/{} failed",
                    self.model.provider_id(),
                    self.model.model()
                )
            })?;
        let verdict = parse_verdict(&answer.text);
        debug!(question = %question, verdict, "judge verdict");
        Ok(verdict)
    }
}

fn render_judge_prompt(question: &str, response: &str) -> String {
    format!("Question: {question}\n\nCode sample:\n~~~\n{response}\n~~~\n\nAnswer YES or NO.")
}

/// `true` when the answer starts with "yes", ignoring case and surrounding
/// whitespace or markdown emphasis.
pub fn parse_verdict(answer: &str) -> bool {
    answer
        .trim()
        .trim_start_matches(&['*', '_', '`', '"'][..])
        .to_ascii_lowercase()
        .starts_with("yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use evals_providers::fakes::StubProvider;
    use evals_providers::ProviderRegistry;
    use std::sync::Arc;

    #[test]
    fn test_parse_verdict() {
        assert!(parse_verdict("YES"));
        assert!(parse_verdict("  yes, it does"));
        assert!(parse_verdict("**Yes**"));
        assert!(!parse_verdict("NO"));
        assert!(!parse_verdict("The answer is yes"));
        assert!(!parse_verdict(""));
    }

    #[test]
    fn test_judge_prompt_embeds_question_and_sample() {
        let prompt = render_judge_prompt("Is there a provider?", "<App/>");
        assert!(prompt.contains("Is there a provider?"));
        assert!(prompt.contains("<App/>"));
    }

    #[tokio::test]
    async fn test_model_judge_uses_secondary_model() {
        let stub = Arc::new(StubProvider::new("openai", "YES"));
        let registry = ProviderRegistry::new().with_provider(stub.clone());
        let judge = ModelJudge::new(registry.resolve("openai", "gpt-4o").unwrap());

        assert!(judge.judge("Does it wrap?", "code").await.unwrap());
        assert_eq!(stub.calls(), 1);
        let request = &stub.requests()[0];
        assert_eq!(request.system.as_deref(), Some(JUDGE_SYSTEM_PROMPT));
        assert!(request.prompt.contains("Does it wrap?"));
    }
}
