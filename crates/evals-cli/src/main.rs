//! Openfort Evals - evaluate LLMs on Openfort code generation
//!
//! Runs every selected (model, evaluation) pair, grades each response and
//! writes `scores.json`. With `--debug`, full prompt/response/grader traces
//! are written under `debug-runs/<timestamp>/`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use tracing::{info, Level};

use evals_providers::ProviderRegistry;

use evals_core::{
    parse_provider_limit, plan_tasks, rate_limits_from, render_score_table, write_scores_json,
    DebugRun, FsPromptSource, GraderCatalog, HarnessConfig, ModelJudge, Orchestrator, Registry,
    Task, TaskExecutor, DEFAULT_MAX_WORKERS,
};

const EXAMPLES: &str = "\
Examples:
  openfort-evals                                      # Run all evals on all models
  openfort-evals --eval evals/basic-setup             # Run one eval on all models
  openfort-evals --model claude-sonnet-4-5            # Run all evals on one model
  openfort-evals --model gpt-4o,claude-sonnet-4-5     # Run all evals on multiple models
  openfort-evals --eval evals/basic-setup --model gpt-4o --debug";

#[derive(Parser, Debug)]
#[command(name = "openfort-evals")]
#[command(author = "Openfort")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Openfort Evals - Evaluate LLMs on Openfort code generation", long_about = None)]
struct Cli {
    /// Run a specific evaluation (e.g., evals/basic-setup)
    #[arg(short, long, value_name = "PATH")]
    eval: Option<String>,

    /// Run only for specific model(s) (e.g., gpt-4o or gpt-4o,claude-sonnet-4-5)
    #[arg(short, long, value_name = "MODELS", value_delimiter = ',')]
    model: Vec<String>,

    /// Enable debug mode (saves prompts, responses, and grading details)
    #[arg(
        short,
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        action = ArgAction::Set,
        value_parser = parse_bool_flag
    )]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Maximum number of tasks executing at once
    #[arg(long, env = "EVALS_MAX_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,

    /// Default in-flight budget per provider
    #[arg(long, env = "EVALS_PROVIDER_CONCURRENCY", default_value_t = 3)]
    provider_concurrency: usize,

    /// Minimum spacing between two calls to the same provider
    #[arg(long, env = "EVALS_PROVIDER_INTERVAL_MS", default_value_t = 0)]
    provider_interval_ms: u64,

    /// Per-provider concurrency override, e.g. anthropic=1 (repeatable)
    #[arg(long = "provider-limit", value_name = "PROVIDER=N", value_parser = parse_provider_limit)]
    provider_limits: Vec<(String, usize)>,

    /// Directory containing the evals/ tree
    #[arg(long, env = "EVALS_ROOT", default_value = ".")]
    evals_root: PathBuf,

    /// Where to write the score collection
    #[arg(short, long, env = "EVALS_SCORES_PATH", default_value = "scores.json")]
    output: PathBuf,

    /// Base directory for debug runs
    #[arg(long, env = "EVALS_DEBUG_DIR", default_value = "debug-runs")]
    debug_dir: PathBuf,

    /// Provider of the model answering LLM-judged graders
    #[arg(long, env = "EVALS_JUDGE_PROVIDER", default_value = "openai")]
    judge_provider: String,

    /// Model answering LLM-judged graders
    #[arg(long, env = "EVALS_JUDGE_MODEL", default_value = "gpt-4o")]
    judge_model: String,

    /// Per-request timeout for provider calls, in seconds
    #[arg(long, env = "EVALS_REQUEST_TIMEOUT_SECS", default_value_t = 300)]
    timeout_secs: u64,
}

impl Cli {
    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig::default()
            .with_max_workers(self.workers)
            .with_rate_limits(rate_limits_from(
                self.provider_concurrency,
                self.provider_interval_ms,
                &self.provider_limits,
            ))
            .with_evals_root(self.evals_root.clone())
            .with_debug(self.debug)
    }
}

/// `false`, `0` and `no` (any case) disable; any other value enables.
fn parse_bool_flag(raw: &str) -> Result<bool, String> {
    let value = raw.trim().to_ascii_lowercase();
    Ok(!matches!(value.as_str(), "false" | "0" | "no"))
}

fn parse_cli(registry: &Registry) -> Cli {
    let footer = format!("{}\n{}", registry.help_listing(), EXAMPLES);
    let matches = Cli::command().after_help(footer).get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Resolve selectors into a task list. Any mismatch is fatal and happens
/// before a single provider is contacted.
fn plan(cli: &Cli, registry: &Registry) -> Result<(HarnessConfig, Vec<Task>)> {
    let config = cli.harness_config();
    let tasks = plan_tasks(registry, cli.eval.as_deref(), &cli.model, &config)?;
    Ok((config, tasks))
}

async fn run(cli: Cli, registry: Registry) -> Result<()> {
    let providers = evals_providers::registry_from_env(Duration::from_secs(cli.timeout_secs))
        .context("Failed to configure model providers")?;
    run_with(cli, registry, Arc::new(providers)).await
}

async fn run_with(cli: Cli, registry: Registry, providers: Arc<ProviderRegistry>) -> Result<()> {
    let (config, tasks) = plan(&cli, &registry)?;

    let judge = providers
        .resolve(&cli.judge_provider, &cli.judge_model)
        .with_context(|| {
            format!(
                "Judge model {}/{} is not available",
                cli.judge_provider, cli.judge_model
            )
        })?;
    let graders = GraderCatalog::builtin().with_judge(Arc::new(ModelJudge::new(judge)));
    let executor = TaskExecutor::new(
        Arc::clone(&providers),
        Arc::new(FsPromptSource),
        Arc::new(graders),
    );

    let debug_run = if config.debug {
        let run = DebugRun::create(&cli.debug_dir)?;
        info!("Debug mode enabled. Saving outputs to {}", run.dir().display());
        Some(run)
    } else {
        None
    };

    let outcome = Orchestrator::new(executor, &config).run(tasks).await;

    if let Some(run) = &debug_run {
        run.flush(&outcome.artifacts, &outcome.errors)
            .context("Failed to write debug artifacts")?;
    }

    write_scores_json(&cli.output, &outcome.scores)?;
    if config.debug {
        println!("{}", render_score_table(&outcome.scores));
    } else {
        info!("Scores written to: {}", cli.output.display());
    }

    info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        duration_ms = outcome.duration_ms,
        "Run complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let registry = Registry::builtin();
    let cli = parse_cli(&registry);

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    evals_core::init_tracing(cli.json, level);

    run(cli, registry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use evals_providers::fakes::StubProvider;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["openfort-evals"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bool_flag() {
        for off in ["false", "FALSE", "0", "no", "No"] {
            assert_eq!(parse_bool_flag(off), Ok(false), "{off}");
        }
        for on in ["true", "1", "yes", "anything"] {
            assert_eq!(parse_bool_flag(on), Ok(true), "{on}");
        }
    }

    #[test]
    fn test_debug_flag_forms() {
        assert!(!parse(&[]).debug);
        assert!(parse(&["--debug"]).debug);
        assert!(parse(&["-d"]).debug);
        assert!(!parse(&["--debug=false"]).debug);
        assert!(!parse(&["--debug", "0"]).debug);
        assert!(!parse(&["-d", "no"]).debug);
        assert!(parse(&["--debug=yes"]).debug);

        let cli = parse(&["--debug", "--eval", "evals/basic-setup"]);
        assert!(cli.debug);
        assert_eq!(cli.eval.as_deref(), Some("evals/basic-setup"));
    }

    #[test]
    fn test_model_list_splits_on_commas() {
        let cli = parse(&["-m", "gpt-4o,claude-sonnet-4-5"]);
        assert_eq!(cli.model, vec!["gpt-4o", "claude-sonnet-4-5"]);

        let cli = parse(&["--model=gpt-5", "-e", "basic-setup"]);
        assert_eq!(cli.model, vec!["gpt-5"]);
        assert_eq!(cli.eval.as_deref(), Some("basic-setup"));
    }

    #[test]
    fn test_missing_eval_value_is_rejected() {
        assert!(Cli::try_parse_from(["openfort-evals", "--eval"]).is_err());
    }

    #[test]
    fn test_harness_config_from_flags() {
        let cli = parse(&[
            "--workers",
            "4",
            "--provider-concurrency",
            "2",
            "--provider-limit",
            "anthropic=1",
            "--evals-root",
            "/srv/evals",
            "-d",
        ]);
        let config = cli.harness_config();
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.rate_limits.budget_for("openai").max_concurrent, 2);
        assert_eq!(config.rate_limits.budget_for("anthropic").max_concurrent, 1);
        assert_eq!(config.evals_root, PathBuf::from("/srv/evals"));
        assert!(config.debug);
    }

    #[test]
    fn test_bad_provider_limit_is_rejected() {
        assert!(Cli::try_parse_from(["openfort-evals", "--provider-limit", "openai"]).is_err());
    }

    #[test]
    fn test_plan_unknown_model_fails() {
        let cli = parse(&["--model", "gpt-4o,llama"]);
        let err = plan(&cli, &Registry::builtin()).unwrap_err();
        assert!(err.to_string().starts_with("No model matching \"llama\""));
    }

    #[test]
    fn test_plan_unknown_eval_fails() {
        let cli = parse(&["--eval", "evals/missing"]);
        let err = plan(&cli, &Registry::builtin()).unwrap_err();
        assert!(err.to_string().contains("No evaluation matching"));
    }

    #[test]
    fn test_plan_defaults_to_everything() {
        let registry = Registry::builtin();
        let (config, tasks) = plan(&parse(&[]), &registry).unwrap();
        assert_eq!(
            tasks.len(),
            registry.models.len() * registry.evaluations.len()
        );
        assert!(!config.debug);
    }

    fn stub_registry(stub: &Arc<StubProvider>) -> Arc<ProviderRegistry> {
        let provider: Arc<dyn evals_providers::ModelProvider> = stub.clone();
        Arc::new(ProviderRegistry::new().with_provider(provider))
    }

    #[tokio::test]
    async fn test_unknown_model_fails_before_any_provider_call() {
        let stub = Arc::new(StubProvider::new("openai", "OpenfortProvider"));
        let out = tempfile::tempdir().unwrap();
        let scores = out.path().join("scores.json");
        let cli = parse(&[
            "--model",
            "does-not-exist",
            "--output",
            scores.to_str().unwrap(),
        ]);

        let err = run_with(cli, Registry::builtin(), stub_registry(&stub))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No model matching \"does-not-exist\""));
        assert_eq!(stub.calls(), 0);
        assert!(!scores.exists());
    }

    #[tokio::test]
    async fn test_single_pair_writes_scores() {
        let stub = Arc::new(StubProvider::new("openai", "useAccount useUser wagmi"));
        let root = tempfile::tempdir().unwrap();
        let eval_dir = root.path().join("evals/hooks-usage");
        std::fs::create_dir_all(&eval_dir).unwrap();
        std::fs::write(eval_dir.join("PROMPT.md"), "Use the hooks").unwrap();
        let scores = root.path().join("out/scores.json");

        let cli = parse(&[
            "-e",
            "evals/hooks-usage",
            "-m",
            "gpt-4o",
            "--evals-root",
            root.path().to_str().unwrap(),
            "--output",
            scores.to_str().unwrap(),
        ]);
        run_with(cli, Registry::builtin(), stub_registry(&stub))
            .await
            .unwrap();

        assert_eq!(stub.calls(), 1);
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&scores).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 1);
        assert_eq!(written[0]["model"], "gpt-4o");
    }
}
