//! Prompt documents for evaluations.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::error::{EvalError, Result};
use crate::domain::task::Task;

/// File name of the prompt document inside an evaluation directory.
pub const PROMPT_FILE: &str = "PROMPT.md";

/// Supplies the prompt text for a task.
#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn load_prompt(&self, task: &Task) -> Result<String>;
}

/// Reads `<task.eval_dir>/PROMPT.md`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPromptSource;

#[async_trait]
impl PromptSource for FsPromptSource {
    async fn load_prompt(&self, task: &Task) -> Result<String> {
        let path = task.eval_dir.join(PROMPT_FILE);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| EvalError::PromptLoad {
                path: path.display().to_string(),
                source,
            })
    }
}

/// Prompts held in memory, keyed by evaluation path.
#[derive(Debug, Clone, Default)]
pub struct MemoryPromptSource {
    prompts: HashMap<String, String>,
}

impl MemoryPromptSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, evaluation_path: &str, prompt: &str) -> Self {
        self.prompts
            .insert(evaluation_path.to_string(), prompt.to_string());
        self
    }
}

#[async_trait]
impl PromptSource for MemoryPromptSource {
    async fn load_prompt(&self, task: &Task) -> Result<String> {
        self.prompts
            .get(&task.evaluation_path)
            .cloned()
            .ok_or_else(|| EvalError::PromptLoad {
                path: task.evaluation_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no prompt registered"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Evaluation, ModelInfo};

    fn task_in(dir: std::path::PathBuf) -> Task {
        Task::new(
            &ModelInfo::new("openai", "gpt-4o", "GPT-4o"),
            &Evaluation::new("React", "Setup", "evals/basic-setup"),
            dir,
            false,
        )
    }

    #[tokio::test]
    async fn test_fs_prompt_source_reads_prompt_md() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROMPT_FILE), "Set up Openfort").unwrap();
        let prompt = FsPromptSource
            .load_prompt(&task_in(dir.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(prompt, "Set up Openfort");
    }

    #[tokio::test]
    async fn test_fs_prompt_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsPromptSource
            .load_prompt(&task_in(dir.path().join("nope")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "prompt_load");
        assert!(err.to_string().contains(PROMPT_FILE));
    }

    #[tokio::test]
    async fn test_memory_prompt_source() {
        let source = MemoryPromptSource::new().with_prompt("evals/basic-setup", "hi");
        let prompt = source.load_prompt(&task_in("unused".into())).await.unwrap();
        assert_eq!(prompt, "hi");
    }
}
