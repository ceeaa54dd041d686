//! skill-cdc CLI: a thin command surface over the pipeline (§6.6).
//!
//! Commands:
//!
//! - `check`: run the CDC pipeline for one or all configured sources
//! - `status`: print freshness and budget for one or all configured skills
//! - `validate`: run the external validator against one or all skills
//! - `apply`: stage, apply, and gate an update for one skill
//!
//! Exit codes: 0 success, 1 validation/gate failure, 2 store or network
//! error.

mod check;
mod pool;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use cdc_core::config::{Config, RawConfig};
use cdc_store::Store;
use update_orchestrator::Mode;

#[derive(Parser)]
#[command(name = "cdc")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Change-data-capture pipeline for AI-assistant skill packages", long_about = None)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to the configuration document (§6.1)
    #[arg(long, global = true, default_value = "cdc.yaml")]
    config: PathBuf,

    /// Path to the on-disk store file
    #[arg(long, global = true, default_value = "cdc-store.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the CDC pipeline for one or all configured sources
    Check {
        /// Only check the named source (default: all sources)
        #[arg(long)]
        source: Option<String>,
    },

    /// Show freshness and budget for one or all configured skills
    Status {
        /// Only show the named skill (default: all skills)
        #[arg(long)]
        skill: Option<String>,
    },

    /// Run the external validator against one or all skills
    Validate {
        /// Path to a single skill directory to validate
        skill_path: Option<PathBuf>,

        /// Validate every configured skill instead
        #[arg(long)]
        all: bool,

        /// Validator command to invoke (§6.4)
        #[arg(long)]
        validator_command: String,
    },

    /// Stage, apply, and gate an update for one skill
    Apply {
        /// Name of the skill to update
        #[arg(long)]
        skill: String,

        /// Update mode
        #[arg(long, value_enum)]
        mode: ApplyMode,

        /// Validator command to invoke (§6.4)
        #[arg(long)]
        validator_command: String,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ApplyMode {
    ReportOnly,
    ApplyLocal,
    CreatePr,
}

impl From<ApplyMode> for Mode {
    fn from(mode: ApplyMode) -> Self {
        match mode {
            ApplyMode::ReportOnly => Mode::ReportOnly,
            ApplyMode::ApplyLocal => Mode::ApplyLocal,
            ApplyMode::CreatePr => Mode::CreatePr,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    cdc_core::telemetry::init_tracing(cli.json, level);

    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    match run_inner(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            2
        }
    }
}

fn run_inner(cli: &Cli) -> Result<i32> {
    let config = load_config(&cli.config)?;
    let store = Store::open_on_disk(&cli.db).context("failed to open store")?;
    store.sync_config(&config).context("failed to sync configuration")?;
    let store = Arc::new(store);

    match &cli.command {
        Commands::Check { source } => cmd_check(&store, &config, source.as_deref()),
        Commands::Status { skill } => cmd_status(&store, &config, skill.as_deref()),
        Commands::Validate {
            skill_path,
            all,
            validator_command,
        } => cmd_validate(&store, &config, skill_path.as_deref(), *all, validator_command),
        Commands::Apply {
            skill,
            mode,
            validator_command,
        } => cmd_apply(&store, &config, skill, (*mode).into(), validator_command),
    }
}

fn load_config(path: &std::path::Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file: {path:?}"))?;
    RawConfig::from_yaml_str(&text)
        .and_then(RawConfig::validate)
        .with_context(|| format!("failed to parse configuration file: {path:?}"))
}

fn cmd_check(store: &Arc<Store>, config: &Config, source_name: Option<&str>) -> Result<i32> {
    let sources: Vec<_> = match source_name {
        Some(name) => {
            let source = config
                .sources
                .iter()
                .find(|s| s.name == name)
                .cloned()
                .with_context(|| format!("unknown source '{name}'"))?;
            vec![source]
        }
        None => config.sources.clone(),
    };

    if sources.is_empty() {
        println!("no sources configured");
        return Ok(0);
    }

    let results = pool::run_checks(Arc::clone(store), sources);
    let mut any_error = false;
    let mut by_name: Vec<_> = results.iter().collect();
    by_name.sort_by(|a, b| a.source_name().cmp(b.source_name()));
    for outcome in &by_name {
        println!("{}", outcome.render());
        any_error |= outcome.is_err();
    }

    Ok(if any_error { 2 } else { 0 })
}

fn cmd_status(store: &Store, config: &Config, skill_name: Option<&str>) -> Result<i32> {
    let skills: Vec<_> = match skill_name {
        Some(name) => {
            let skill = config
                .skills
                .iter()
                .find(|s| s.name == name)
                .cloned()
                .with_context(|| format!("unknown skill '{name}'"))?;
            vec![skill]
        }
        None => config.skills.clone(),
    };

    if skills.is_empty() {
        println!("no skills configured");
        return Ok(0);
    }

    for skill in &skills {
        let freshness = view_layer::freshness(store, skill, config.freshness_threshold);
        println!(
            "{}: stale={} last_checked={:?} — {}",
            skill.name, freshness.is_stale, freshness.last_checked, freshness.message
        );
        for source_status in &freshness.per_source_status {
            println!(
                "  {}: last_checked={:?}",
                source_status.source_name, source_status.last_checked
            );
        }

        match view_layer::skill_budget(store, &skill.name, &config.budget_thresholds) {
            Ok(budget) => {
                println!("  budget: over_budget={}", budget.over_budget);
                for (filetype, detail) in &budget.by_filetype {
                    println!(
                        "    {filetype}: {} lines, ~{} tokens (threshold {:?}, over={})",
                        detail.line_count, detail.estimated_tokens, detail.threshold, detail.over_budget
                    );
                }
            }
            Err(e) => println!("  budget: unavailable ({e})"),
        }
    }

    Ok(0)
}

fn cmd_validate(
    store: &Store,
    config: &Config,
    skill_path: Option<&std::path::Path>,
    all: bool,
    validator_command: &str,
) -> Result<i32> {
    let targets: Vec<(String, PathBuf)> = if all {
        config
            .skills
            .iter()
            .map(|s| (s.name.clone(), s.path.clone()))
            .collect()
    } else {
        let path = skill_path.context("either a skill path or --all is required")?;
        let name = config
            .skills
            .iter()
            .find(|s| s.path.as_path() == path)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| path.display().to_string());
        vec![(name, path.to_path_buf())]
    };

    if targets.is_empty() {
        println!("no skills to validate");
        return Ok(0);
    }

    let mut any_invalid = false;
    for (name, path) in &targets {
        let outcome = update_orchestrator::validate_skill(validator_command, path)
            .with_context(|| format!("validator failed for skill '{name}'"))?;
        store.record_validation(
            name,
            chrono::Utc::now(),
            outcome.is_valid(),
            outcome.errors.len() as u32,
            outcome.warnings.len() as u32,
            &outcome.errors.join("; "),
        )?;
        println!(
            "{name}: valid={} errors={} warnings={}",
            outcome.is_valid(),
            outcome.errors.len(),
            outcome.warnings.len()
        );
        any_invalid |= !outcome.is_valid();
    }

    Ok(if any_invalid { 1 } else { 0 })
}

fn cmd_apply(store: &Store, config: &Config, skill_name: &str, mode: Mode, validator_command: &str) -> Result<i32> {
    let skill = config
        .skills
        .iter()
        .find(|s| s.name == skill_name)
        .with_context(|| format!("unknown skill '{skill_name}'"))?;

    let outcome = update_orchestrator::run(store, skill, mode, validator_command)
        .with_context(|| format!("update orchestration failed for skill '{skill_name}'"))?;

    match outcome {
        update_orchestrator::OrchestratorOutcome::NoOp => {
            println!("{skill_name}: no pending changes");
            Ok(0)
        }
        update_orchestrator::OrchestratorOutcome::Applied { context_path } => {
            println!("{skill_name}: applied (context at {context_path:?})");
            Ok(0)
        }
        update_orchestrator::OrchestratorOutcome::RolledBack { reason } => {
            println!("{skill_name}: rolled back ({reason})");
            Ok(1)
        }
        update_orchestrator::OrchestratorOutcome::Failed { reason } => {
            println!("{skill_name}: failed ({reason})");
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_rejects_missing_bundle_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdc.yaml");
        std::fs::write(
            &path,
            "sources:\n  - name: docs\n    type: docs\n",
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bundle_url"));
    }

    #[test]
    fn load_config_accepts_well_formed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdc.yaml");
        std::fs::write(
            &path,
            "sources:\n  - name: docs\n    type: docs\n    bundle_url: https://example.invalid/bundle\n    page_delimiter: 'Source: '\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].name, "docs");
    }

    #[test]
    fn check_with_unknown_source_name_errors() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("store.db");
        let store = Store::open_on_disk(&db_path).unwrap();
        let config = Config::default();
        let result = cmd_check(&Arc::new(store), &config, Some("nonexistent"));
        assert!(result.is_err());
    }
}
