//! Per-run debug output: one markdown document per successful task plus an
//! `errors.json` aggregate of captured failures.
//!
//! Layout:
//!
//! ```text
//! <base>/<timestamp>/
//!   evals__basic-setup/
//!     openai__gpt-4o.md
//!   errors.json
//! ```
//!
//! Every write error is returned to the caller; losing requested debug
//! output aborts the run.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::EvalError;
use crate::domain::task::{GraderResult, RunnerOutput, Task};

pub const ERRORS_FILE: &str = "errors.json";

const MIN_FENCE: usize = 3;
const GRADERS_HEADER: &str = "\n## Graders\n| name | passed |\n| --- | --- |\n";
const EMPTY_GRADERS_ROW: &str = "| (none) | - |";

/// Full trace of one successful task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugArtifact {
    pub provider: String,
    pub model: String,
    pub framework: String,
    pub category: String,
    pub evaluation_path: String,
    pub score: f64,
    pub prompt: String,
    pub response: String,
    pub graders: Vec<GraderResult>,
}

impl DebugArtifact {
    pub fn from_output(task: &Task, output: &RunnerOutput) -> Self {
        Self {
            provider: task.provider.clone(),
            model: task.model.clone(),
            framework: task.framework.clone(),
            category: task.category.clone(),
            evaluation_path: task.evaluation_path.clone(),
            score: output.score,
            prompt: output.debug.prompt.clone(),
            response: output.debug.response.clone(),
            graders: output.debug.graders.clone(),
        }
    }
}

/// A captured task failure, as written to `errors.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugError {
    pub provider: String,
    pub model: String,
    pub evaluation_path: String,
    pub kind: String,
    pub error: String,
}

impl DebugError {
    pub fn from_error(task: &Task, error: &EvalError) -> Self {
        Self {
            provider: task.provider.clone(),
            model: task.model.clone(),
            evaluation_path: task.evaluation_path.clone(),
            kind: error.kind().to_string(),
            error: error.to_string(),
        }
    }
}

/// A debug artifact document read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArtifact {
    pub provider: String,
    pub model: String,
    pub framework: String,
    pub category: String,
    pub evaluation: String,
    /// Score as persisted (two decimals).
    pub score: f64,
    pub run_at: String,
    pub prompt: String,
    pub response: String,
    pub graders: Vec<GraderResult>,
}

/// A run-scoped debug directory.
#[derive(Debug, Clone)]
pub struct DebugRun {
    dir: PathBuf,
    timestamp: String,
}

impl DebugRun {
    /// Create `<base>/<timestamp>` for the current time.
    pub fn create(base: &Path) -> Result<Self> {
        Self::with_timestamp(base, &timestamp_now())
    }

    pub fn with_timestamp(base: &Path, timestamp: &str) -> Result<Self> {
        let dir = base.join(timestamp);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create debug directory {:?}", dir))?;
        info!(dir = %dir.display(), "debug mode enabled");
        Ok(Self {
            dir,
            timestamp: timestamp.to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Path of the document for `artifact` inside this run.
    pub fn artifact_path(&self, artifact: &DebugArtifact) -> PathBuf {
        let name = sanitize_for_filename(&format!("{}__{}", artifact.provider, artifact.model));
        self.dir
            .join(evaluation_slug(&artifact.evaluation_path))
            .join(format!("{name}.md"))
    }

    /// Write one document per artifact, returning the written paths.
    pub fn write_artifacts(&self, artifacts: &[DebugArtifact]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let path = self.artifact_path(artifact);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {:?}", parent))?;
            }
            std::fs::write(&path, render_artifact(artifact, &self.timestamp))
                .with_context(|| format!("write {:?}", path))?;
            written.push(path);
        }
        Ok(written)
    }

    /// Write `errors.json` when there is at least one error.
    pub fn write_errors(&self, errors: &[DebugError]) -> Result<Option<PathBuf>> {
        if errors.is_empty() {
            return Ok(None);
        }
        let path = self.dir.join(ERRORS_FILE);
        let content = serde_json::to_string_pretty(errors).context("serialize debug errors")?;
        std::fs::write(&path, content).with_context(|| format!("write {:?}", path))?;
        Ok(Some(path))
    }

    /// Write all artifacts, then the error aggregate.
    pub fn flush(&self, artifacts: &[DebugArtifact], errors: &[DebugError]) -> Result<()> {
        let written = self.write_artifacts(artifacts)?;
        let errors_path = self.write_errors(errors)?;
        info!(
            dir = %self.dir.display(),
            artifacts = written.len(),
            errors = errors.len(),
            errors_file = errors_path.is_some(),
            "debug artifacts written"
        );
        Ok(())
    }
}

/// RFC 3339 UTC time with `:` and `.` replaced so it is a valid directory
/// name on every platform.
pub fn timestamp_now() -> String {
    Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(&[':', '.'][..], "-")
}

/// `evals/basic-setup` becomes `evals__basic-setup`.
pub fn evaluation_slug(evaluation_path: &str) -> String {
    evaluation_path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("__")
}

pub fn sanitize_for_filename(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Tilde fence longer than any tilde run in `text`, so a line holding only
/// the fence can never appear inside the block.
fn fence_for(text: &str) -> String {
    let longest = text
        .split(|c| c != '~')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "~".repeat(MIN_FENCE.max(longest + 1))
}

fn fenced(text: &str) -> String {
    let fence = fence_for(text);
    format!("{fence}\n{text}\n{fence}")
}

fn escape_cell(value: &str) -> String {
    value.replace('\\', "\\\\").replace('|', "\\|")
}

/// Split a `| a | b |` row on unescaped pipes and unescape each cell.
fn split_row(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    cell.push(next);
                }
            }
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    if !cell.trim().is_empty() {
        cells.push(cell.trim().to_string());
    }
    cells
}

/// Take the fenced block following `heading` at the start of `input`.
/// Returns the block body and whatever follows its closing fence line.
fn take_block<'a>(input: &'a str, heading: &str) -> Result<(&'a str, &'a str)> {
    let after = input
        .strip_prefix(heading)
        .ok_or_else(|| anyhow!("missing section {:?}", heading.trim()))?;
    let (fence, body) = after
        .split_once('\n')
        .ok_or_else(|| anyhow!("unterminated section {:?}", heading.trim()))?;
    if fence.len() < MIN_FENCE || !fence.chars().all(|c| c == '~') {
        bail!("expected fence after {:?}, found {fence:?}", heading.trim());
    }
    let close = format!("\n{fence}\n");
    body.split_once(close.as_str())
        .ok_or_else(|| anyhow!("unclosed fence in {:?}", heading.trim()))
}

/// Render the markdown document for one artifact.
pub fn render_artifact(artifact: &DebugArtifact, run_at: &str) -> String {
    let rows = if artifact.graders.is_empty() {
        EMPTY_GRADERS_ROW.to_string()
    } else {
        artifact
            .graders
            .iter()
            .map(|g| format!("| {} | {} |", escape_cell(&g.name), g.passed))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "---\n\
         provider: {provider}\n\
         model: {model}\n\
         framework: {framework}\n\
         category: {category}\n\
         evaluation: {evaluation}\n\
         score: {score:.2}\n\
         run_at: {run_at}\n\
         ---\n\
         \n\
         ## Prompt\n\
         {prompt}\n\
         \n\
         ## Response\n\
         {response}\n\
         {GRADERS_HEADER}\
         {rows}\n",
        provider = artifact.provider,
        model = artifact.model,
        framework = artifact.framework,
        category = artifact.category,
        evaluation = artifact.evaluation_path,
        score = artifact.score,
        prompt = fenced(artifact.prompt.trim_end()),
        response = fenced(artifact.response.trim_end()),
    )
}

/// Parse a document produced by [`render_artifact`].
pub fn parse_artifact(content: &str) -> Result<ParsedArtifact> {
    let body = content
        .strip_prefix("---\n")
        .ok_or_else(|| anyhow!("missing front matter"))?;
    let (front, rest) = body
        .split_once("\n---\n")
        .ok_or_else(|| anyhow!("unterminated front matter"))?;

    let field = |key: &str| -> Result<String> {
        front
            .lines()
            .find_map(|line| line.strip_prefix(key)?.strip_prefix(": "))
            .map(str::to_string)
            .ok_or_else(|| anyhow!("missing front matter field {key}"))
    };

    let score = field("score")?
        .parse::<f64>()
        .context("parse score")?;

    let (prompt, rest) = take_block(rest, "\n## Prompt\n")?;
    let (response, rest) = take_block(rest, "\n## Response\n")?;
    let table = rest
        .strip_prefix(GRADERS_HEADER)
        .ok_or_else(|| anyhow!("missing graders section"))?;

    let mut graders = Vec::new();
    for line in table.lines() {
        let line = line.trim();
        if line.is_empty() || line == EMPTY_GRADERS_ROW {
            continue;
        }
        let cells = split_row(line);
        let [name, passed] = cells.as_slice() else {
            bail!("malformed grader row {line:?}");
        };
        let passed = match passed.as_str() {
            "true" => true,
            "false" => false,
            other => bail!("invalid grader outcome {other:?}"),
        };
        graders.push(GraderResult::new(name, passed));
    }

    Ok(ParsedArtifact {
        provider: field("provider")?,
        model: field("model")?,
        framework: field("framework")?,
        category: field("category")?,
        evaluation: field("evaluation")?,
        score,
        run_at: field("run_at")?,
        prompt: prompt.to_string(),
        response: response.to_string(),
        graders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(graders: Vec<GraderResult>) -> DebugArtifact {
        DebugArtifact {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            framework: "React".to_string(),
            category: "Setup".to_string(),
            evaluation_path: "evals/basic-setup".to_string(),
            score: 2.0 / 3.0,
            prompt: "Set up Openfort\n\n".to_string(),
            response: "```tsx file=\"src/main.tsx\"\n<OpenfortProvider />\n```\n".to_string(),
            graders,
        }
    }

    #[test]
    fn test_slug_and_sanitize() {
        assert_eq!(evaluation_slug("evals/basic-setup"), "evals__basic-setup");
        assert_eq!(evaluation_slug("/evals//x/"), "evals__x");
        assert_eq!(
            sanitize_for_filename("vercel__v0-1.5-md"),
            "vercel__v0-1.5-md"
        );
        assert_eq!(sanitize_for_filename("a/b:c d"), "a_b_c_d");
    }

    #[test]
    fn test_timestamp_has_no_separators() {
        let ts = timestamp_now();
        assert!(!ts.contains(':'));
        assert!(!ts.contains('.'));
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn test_render_layout() {
        let doc = render_artifact(
            &artifact(vec![
                GraderResult::new("provider", true),
                GraderResult::new("wagmi", false),
            ]),
            "2026-01-01T00-00-00-000Z",
        );
        assert!(doc.starts_with("---\nprovider: openai\nmodel: gpt-4o\n"));
        assert!(doc.contains("score: 0.67\n"));
        assert!(doc.contains("## Prompt\n~~~\nSet up Openfort\n~~~\n"));
        assert!(doc.contains("| provider | true |\n| wagmi | false |\n"));
    }

    #[test]
    fn test_render_empty_graders() {
        let doc = render_artifact(&artifact(Vec::new()), "t");
        assert!(doc.contains("| --- | --- |\n| (none) | - |\n"));
    }

    #[test]
    fn test_parse_round_trip_preserves_grader_order() {
        let graders = vec![
            GraderResult::new("zeta", true),
            GraderResult::new("alpha", false),
            GraderResult::new("mid", true),
        ];
        let original = artifact(graders.clone());
        let parsed = parse_artifact(&render_artifact(&original, "run-1")).unwrap();

        assert_eq!(parsed.provider, "openai");
        assert_eq!(parsed.model, "gpt-4o");
        assert_eq!(parsed.evaluation, "evals/basic-setup");
        assert_eq!(parsed.score, 0.67);
        assert_eq!(parsed.run_at, "run-1");
        assert_eq!(parsed.prompt, "Set up Openfort");
        assert_eq!(parsed.response, original.response.trim_end());
        assert_eq!(parsed.graders, graders);
    }

    #[test]
    fn test_parse_empty_prompt_and_graders() {
        let mut a = artifact(Vec::new());
        a.prompt = String::new();
        let parsed = parse_artifact(&render_artifact(&a, "t")).unwrap();
        assert_eq!(parsed.prompt, "");
        assert!(parsed.graders.is_empty());
    }

    #[test]
    fn test_parse_content_that_looks_like_sections() {
        let mut a = artifact(vec![
            GraderResult::new("a|b", true),
            GraderResult::new("back\\slash", false),
        ]);
        a.prompt = "Use this:\n~~~\n\n## Response\n~~~\nfoo".to_string();
        a.response = "ok\n~~~~\n\n## Graders\n| x | true |".to_string();

        let doc = render_artifact(&a, "t");
        assert!(doc.contains("## Prompt\n~~~~\n"));
        assert!(doc.contains("## Response\n~~~~~\n"));
        assert!(doc.contains("| a\\|b | true |"));

        let parsed = parse_artifact(&doc).unwrap();
        assert_eq!(parsed.prompt, a.prompt);
        assert_eq!(parsed.response, a.response);
        assert_eq!(parsed.graders, a.graders);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_artifact("no front matter").is_err());
    }

    #[test]
    fn test_flush_writes_documents_and_errors() {
        let base = tempfile::tempdir().unwrap();
        let run = DebugRun::with_timestamp(base.path(), "2026-01-01T00-00-00-000Z").unwrap();
        let a = artifact(vec![GraderResult::new("provider", true)]);
        let e = DebugError {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            evaluation_path: "evals/basic-setup".to_string(),
            kind: "provider".to_string(),
            error: "overloaded".to_string(),
        };

        run.flush(std::slice::from_ref(&a), std::slice::from_ref(&e))
            .unwrap();

        let doc_path = run
            .dir()
            .join("evals__basic-setup")
            .join("openai__gpt-4o.md");
        assert_eq!(run.artifact_path(&a), doc_path);
        let parsed = parse_artifact(&std::fs::read_to_string(&doc_path).unwrap()).unwrap();
        assert_eq!(parsed.score, 0.67);

        let errors: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(run.dir().join(ERRORS_FILE)).unwrap())
                .unwrap();
        assert_eq!(errors[0]["evaluationPath"], "evals/basic-setup");
        assert_eq!(errors[0]["kind"], "provider");
    }

    #[test]
    fn test_no_errors_file_when_clean() {
        let base = tempfile::tempdir().unwrap();
        let run = DebugRun::with_timestamp(base.path(), "ts").unwrap();
        assert!(run.write_errors(&[]).unwrap().is_none());
        assert!(!run.dir().join(ERRORS_FILE).exists());
    }

    #[test]
    fn test_create_fails_on_file_base() {
        let base = tempfile::NamedTempFile::new().unwrap();
        assert!(DebugRun::create(base.path()).is_err());
    }
}
