mod config;
mod explain;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::{ConfigMerger, FixOverrides};
use fixloop_core::adapters::{FsSolutionSource, FsWritePort, TracingReporter};
use fixloop_core::pipeline::{Toolset, run_fix, write_fix_artifacts, write_solution};
use fixloop_core::settings::FixSettings;
use fixloop_core::CancellationToken;
use fixloop_rules::builtin_rule_metas;
use fixloop_types::diagnostic::Severity;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "fixloop",
    version,
    about = "Runs analyzers and fixers over a solution until nothing fixable is left."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fix every selected project (default: dry-run, artifacts only).
    Fix(FixArgs),
    /// Explain what a rule reports and how it is fixed.
    Explain(ExplainArgs),
    /// List all built-in rules.
    ListRules(ListRulesArgs),
}

#[derive(Debug, Parser)]
struct FixArgs {
    /// Solution root (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Output directory for artifacts (default: <root>/artifacts/fixloop).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Write fixed units to disk. If omitted, only artifacts are written.
    #[arg(long, default_value_t = false)]
    apply: bool,

    /// Maximum diagnostics per fixer call (0 = unlimited).
    #[arg(long)]
    batch_size: Option<usize>,

    /// Maximum project iterations before giving up.
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Ignore diagnostics below this severity (hidden, info, warning, error).
    #[arg(long)]
    severity: Option<Severity>,

    /// Diagnostic id pattern to ignore. Repeatable.
    #[arg(long)]
    ignore: Vec<String>,

    /// Only consider these diagnostic id patterns. Repeatable.
    #[arg(long)]
    only: Vec<String>,

    /// Fix these id patterns one diagnostic at a time. Repeatable.
    #[arg(long)]
    one_by_one: Vec<String>,

    /// Project id pattern to fix. Repeatable.
    #[arg(long)]
    project: Vec<String>,

    /// Project id pattern to skip. Repeatable.
    #[arg(long)]
    exclude_project: Vec<String>,

    /// Fix projects even when the compiler reports errors.
    #[arg(long, default_value_t = false)]
    ignore_compiler_errors: bool,

    /// Also fix diagnostics suppressed in source.
    #[arg(long, default_value_t = false)]
    include_suppressed: bool,

    /// Exit with 2 when unfixed or unfixable diagnostics remain.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

impl FixArgs {
    fn overrides(&self) -> FixOverrides {
        FixOverrides {
            severity: self.severity,
            batch_size: self.batch_size,
            max_iterations: self.max_iterations,
            ignore: self.ignore.clone(),
            only: self.only.clone(),
            one_by_one: self.one_by_one.clone(),
            projects: self.project.clone(),
            exclude_projects: self.exclude_project.clone(),
            ignore_compiler_errors: self.ignore_compiler_errors,
            include_suppressed: self.include_suppressed,
            strict: self.strict,
            out_dir: self.out_dir.clone(),
        }
    }
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Rule id to explain (e.g., "TXT1001").
    rule_id: String,
}

#[derive(Debug, Parser)]
struct ListRulesArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Exit code when the run finished but left problems behind.
const EXIT_PROBLEMS: u8 = 2;

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Fix(args) => cmd_fix(args),
        Command::Explain(args) => cmd_explain(args).map(|()| ExitCode::SUCCESS),
        Command::ListRules(args) => cmd_list_rules(args).map(|()| ExitCode::SUCCESS),
    }
}

fn cmd_fix(args: FixArgs) -> anyhow::Result<ExitCode> {
    let root = args.root.clone();

    // Load config file and merge with CLI arguments
    let file_config = config::load_or_default(&root).context("load fixloop.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_fix_args(&args.overrides());

    debug!(
        "merged config: options={:?}, filter={:?}, projects={}",
        merged.options,
        merged.filter,
        merged.projects.len()
    );

    let settings = FixSettings {
        root: root.clone(),
        out_dir: merged.out_dir,
        apply: args.apply,
        strict: merged.strict,
        options: merged.options,
        filter: merged.filter,
        projects: merged.projects,
    };

    let source = FsSolutionSource::from_settings(&settings);
    let outcome = run_fix(
        &settings,
        &source,
        &Toolset::builtin(),
        Arc::new(TracingReporter),
        CancellationToken::new(),
    )?;

    let writer = FsWritePort;
    let out_dir = root.join(&settings.out_dir);
    write_fix_artifacts(&outcome, &out_dir, &writer).context("write artifacts")?;

    if settings.apply && outcome.has_changes() {
        let written = write_solution(&outcome, &root, &writer).context("write fixed units")?;
        info!("wrote {} unit(s) under {}", written, root);
    }

    let counts = &outcome.report.verdict.counts;
    println!(
        "{}: fixed {}, unfixed {}, unfixable {} in {} project(s)",
        outcome.result.status.as_str(),
        counts.fixed,
        counts.unfixed,
        counts.unfixable,
        counts.projects - counts.skipped
    );
    for reason in &outcome.report.verdict.reasons {
        println!("  {}", reason);
    }
    match (outcome.has_changes(), settings.apply) {
        (false, _) => println!("no changes"),
        (true, true) => println!("applied {} changed unit(s)", outcome.report.changed_units.len()),
        (true, false) => println!(
            "dry-run: {} unit(s) would change; rerun with --apply to write them",
            outcome.report.changed_units.len()
        ),
    }
    println!("artifacts: {}", out_dir);

    if outcome.problems_remain(settings.strict) {
        return Ok(ExitCode::from(EXIT_PROBLEMS));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    use explain::{fix_mode, fix_mode_meaning, format_source, list_rule_ids, lookup};

    let Some(meta) = lookup(&args.rule_id) else {
        let available = list_rule_ids().join(", ");
        anyhow::bail!(
            "Unknown rule id: '{}'\n\nAvailable rules: {}",
            args.rule_id,
            available
        );
    };

    println!("================================================================================");
    println!("RULE: {}", meta.title);
    println!("================================================================================");
    println!();
    println!("Id:        {}", meta.id);
    println!("Severity:  {}", meta.severity);
    println!("Source:    {}", format_source(meta.source));
    println!("Fix mode:  {}", fix_mode(&meta));
    println!();

    println!("DESCRIPTION");
    println!("--------------------------------------------------------------------------------");
    println!("{}", meta.description);
    println!();

    println!("FIX MODE: {}", fix_mode(&meta));
    println!("--------------------------------------------------------------------------------");
    println!("{}", fix_mode_meaning(&meta));
    println!();

    println!("REMEDIATION GUIDANCE");
    println!("--------------------------------------------------------------------------------");
    println!("{}", meta.remediation);
    println!();

    Ok(())
}

fn cmd_list_rules(args: ListRulesArgs) -> anyhow::Result<()> {
    use explain::{fix_mode, format_source};

    let metas = builtin_rule_metas();
    match args.format {
        OutputFormat::Text => {
            println!("Available rules:\n");
            println!("  {:<8} {:<8} {:<9} {:<14} TITLE", "ID", "SEVERITY", "SOURCE", "FIX");
            println!("  {:<8} {:<8} {:<9} {:<14} -----", "--", "--------", "------", "---");
            for meta in &metas {
                println!(
                    "  {:<8} {:<8} {:<9} {:<14} {}",
                    meta.id,
                    meta.severity.as_str(),
                    format_source(meta.source),
                    fix_mode(meta),
                    meta.title
                );
            }
            println!();
            println!("Use 'fixloop explain <id>' for details.");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&metas)?);
        }
    }
    Ok(())
}
