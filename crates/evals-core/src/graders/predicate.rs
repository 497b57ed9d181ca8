//! Grader predicates: `(response text) -> bool`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::graders::judge::JudgeModel;

/// A named boolean check against generated text.
///
/// Predicates may be synchronous (substring checks) or delegate to another
/// model call; the harness awaits each one uniformly.
#[async_trait]
pub trait Predicate: Send + Sync {
    async fn check(&self, text: &str) -> anyhow::Result<bool>;
}

/// Passes when `text` contains `needle` (case-sensitive).
#[derive(Debug, Clone)]
pub struct Contains {
    pub needle: String,
}

#[async_trait]
impl Predicate for Contains {
    async fn check(&self, text: &str) -> anyhow::Result<bool> {
        Ok(text.contains(self.needle.as_str()))
    }
}

/// Passes when `text` contains at least one of `needles`.
#[derive(Debug, Clone)]
pub struct ContainsAny {
    pub needles: Vec<String>,
}

#[async_trait]
impl Predicate for ContainsAny {
    async fn check(&self, text: &str) -> anyhow::Result<bool> {
        Ok(self.needles.iter().any(|n| text.contains(n.as_str())))
    }
}

/// Asks a judge model a yes/no question about `text`.
pub struct Judge {
    pub question: String,
    pub judge: Arc<dyn JudgeModel>,
}

#[async_trait]
impl Predicate for Judge {
    async fn check(&self, text: &str) -> anyhow::Result<bool> {
        self.judge.judge(&self.question, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_contains_is_case_sensitive() {
        let p = Contains {
            needle: "OpenfortProvider".to_string(),
        };
        assert!(p.check("<OpenfortProvider>").await.unwrap());
        assert!(!p.check("<openfortprovider>").await.unwrap());
    }

    #[tokio::test]
    async fn test_contains_any() {
        let p = ContainsAny {
            needles: vec!["WagmiProvider".to_string(), "WagmiConfig".to_string()],
        };
        assert!(p.check("uses WagmiConfig here").await.unwrap());
        assert!(!p.check("nothing relevant").await.unwrap());
    }

    #[tokio::test]
    async fn test_contains_any_empty_never_passes() {
        let p = ContainsAny { needles: vec![] };
        assert!(!p.check("anything").await.unwrap());
    }
}
