//! Configuration file loading for fixloop.
//!
//! Discovers and loads `fixloop.toml` from the solution root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fixloop_core::settings::ProjectSpec;
use fixloop_core::{FixOptions, ProjectFilter};
use fixloop_types::diagnostic::Severity;
use fs_err as fs;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "fixloop.toml";

pub const DEFAULT_OUT_DIR: &str = "artifacts/fixloop";

/// Top-level configuration from fixloop.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixloopConfig {
    /// Engine knobs, mirroring `FixOptions`.
    pub engine: EngineConfig,

    /// Descriptor id -> fixer name, used when several fixers claim an id.
    pub fixer_preferences: BTreeMap<String, String>,

    /// Descriptor id -> equivalence key or action title.
    pub action_preferences: BTreeMap<String, String>,

    /// Projects of the solution. Empty means the whole root is one project.
    pub projects: Vec<ProjectSpec>,

    pub output: OutputConfig,
}

/// Engine section of the config. Unset values fall back to `FixOptions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub severity_level: Option<Severity>,
    pub batch_size: Option<usize>,
    pub max_iterations: Option<usize>,
    pub max_batches: Option<usize>,
    pub ignored_compiler_diagnostic_ids: Vec<String>,
    pub ignored_diagnostic_ids: Vec<String>,
    pub supported_diagnostic_ids: Vec<String>,
    pub fix_one_by_one: Vec<String>,
    pub include_suppressed: bool,
    pub ignore_compiler_errors: bool,
    pub concurrent_analysis: Option<bool>,

    /// Project id patterns to fix. Empty means all.
    pub include_projects: Vec<String>,

    /// Project id patterns to skip.
    pub exclude_projects: Vec<String>,
}

/// Output section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Artifact directory, relative to the solution root.
    pub out_dir: Option<Utf8PathBuf>,

    /// Treat unfixed and unfixable diagnostics as a failing run.
    pub strict: bool,
}

/// Discover the fixloop.toml config file.
///
/// Returns `None` if no config file is found.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a fixloop.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<FixloopConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<FixloopConfig> {
    let config: FixloopConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the solution root, or return default if not found.
pub fn load_or_default(root: &Utf8Path) -> anyhow::Result<FixloopConfig> {
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(FixloopConfig::default()),
    }
}

/// Values given on the command line for `fixloop fix`.
#[derive(Debug, Clone, Default)]
pub struct FixOverrides {
    pub severity: Option<Severity>,
    pub batch_size: Option<usize>,
    pub max_iterations: Option<usize>,
    pub ignore: Vec<String>,
    pub only: Vec<String>,
    pub one_by_one: Vec<String>,
    pub projects: Vec<String>,
    pub exclude_projects: Vec<String>,
    pub ignore_compiler_errors: bool,
    pub include_suppressed: bool,
    pub strict: bool,
    pub out_dir: Option<Utf8PathBuf>,
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub options: FixOptions,
    pub filter: ProjectFilter,
    pub projects: Vec<ProjectSpec>,
    pub out_dir: Utf8PathBuf,
    pub strict: bool,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: FixloopConfig,
}

impl ConfigMerger {
    pub fn new(config: FixloopConfig) -> Self {
        Self { config }
    }

    /// Merge with `fix` command CLI arguments.
    ///
    /// CLI pattern lists extend the config file lists. CLI scalars replace
    /// config values. Boolean flags can only switch a setting on.
    pub fn merge_fix_args(self, cli: &FixOverrides) -> MergedConfig {
        let engine = self.config.engine;
        let defaults = FixOptions::default();

        let options = FixOptions {
            severity_level: cli
                .severity
                .or(engine.severity_level)
                .unwrap_or(defaults.severity_level),
            batch_size: cli
                .batch_size
                .or(engine.batch_size)
                .unwrap_or(defaults.batch_size),
            max_iterations: cli
                .max_iterations
                .or(engine.max_iterations)
                .unwrap_or(defaults.max_iterations),
            max_batches: engine.max_batches.unwrap_or(defaults.max_batches),
            ignored_compiler_diagnostic_ids: engine.ignored_compiler_diagnostic_ids,
            ignored_diagnostic_ids: extend(engine.ignored_diagnostic_ids, &cli.ignore),
            supported_diagnostic_ids: extend(engine.supported_diagnostic_ids, &cli.only),
            fix_one_by_one: extend(engine.fix_one_by_one, &cli.one_by_one),
            include_suppressed: cli.include_suppressed || engine.include_suppressed,
            ignore_compiler_errors: cli.ignore_compiler_errors || engine.ignore_compiler_errors,
            fixer_preferences: self.config.fixer_preferences,
            action_preferences: self.config.action_preferences,
            concurrent_analysis: engine
                .concurrent_analysis
                .unwrap_or(defaults.concurrent_analysis),
        };

        let filter = ProjectFilter::new(
            extend(engine.include_projects, &cli.projects),
            extend(engine.exclude_projects, &cli.exclude_projects),
        );

        let out_dir = cli
            .out_dir
            .clone()
            .or(self.config.output.out_dir)
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUT_DIR));

        MergedConfig {
            options,
            filter,
            projects: self.config.projects,
            out_dir,
            strict: cli.strict || self.config.output.strict,
        }
    }
}

fn extend(mut base: Vec<String>, extra: &[String]) -> Vec<String> {
    for pattern in extra {
        if !base.contains(pattern) {
            base.push(pattern.clone());
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let contents = r#"
[engine]
severity_level = "warning"
batch_size = 10
max_iterations = 25
max_batches = 50
ignored_diagnostic_ids = ["TXT1004"]
fix_one_by_one = ["TXT1001"]
ignore_compiler_errors = true
concurrent_analysis = false
exclude_projects = ["vendor*"]

[fixer_preferences]
TXT1001 = "trailing-whitespace"

[action_preferences]
TXT1002 = "TXT1002:spaces"

[[projects]]
name = "core"
path = "core"

[[projects]]
name = "docs"
path = "docs"
dependencies = ["core"]
include = ["**/*.md"]

[output]
out_dir = "target/fixloop"
strict = true
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.engine.severity_level, Some(Severity::Warning));
        assert_eq!(config.engine.batch_size, Some(10));
        assert_eq!(config.engine.max_batches, Some(50));
        assert_eq!(config.engine.concurrent_analysis, Some(false));
        assert_eq!(config.projects.len(), 2);
        assert_eq!(config.projects[1].dependencies, vec!["core"]);
        assert_eq!(config.projects[1].include, vec!["**/*.md"]);
        assert_eq!(
            config.fixer_preferences.get("TXT1001").map(String::as_str),
            Some("trailing-whitespace")
        );
        assert_eq!(config.output.out_dir, Some(Utf8PathBuf::from("target/fixloop")));
        assert!(config.output.strict);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.projects.is_empty());
        assert!(config.engine.batch_size.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_severity() {
        let err = parse_config("[engine]\nseverity_level = \"loud\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("invalid TOML"));
    }

    #[test]
    fn test_merge_defaults_without_config_or_flags() {
        let merged = ConfigMerger::new(FixloopConfig::default()).merge_fix_args(&FixOverrides::default());
        assert_eq!(merged.options, FixOptions::default());
        assert_eq!(merged.filter, ProjectFilter::default());
        assert_eq!(merged.out_dir, Utf8PathBuf::from(DEFAULT_OUT_DIR));
        assert!(!merged.strict);
    }

    #[test]
    fn test_merge_cli_extends_lists_and_overrides_scalars() {
        let config = FixloopConfig {
            engine: EngineConfig {
                batch_size: Some(4),
                max_iterations: Some(30),
                ignored_diagnostic_ids: vec!["TXT1004".to_string()],
                exclude_projects: vec!["vendor".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let cli = FixOverrides {
            batch_size: Some(1),
            ignore: vec!["TXT1004".to_string(), "TXT1002".to_string()],
            exclude_projects: vec!["legacy".to_string()],
            ..Default::default()
        };

        let merged = ConfigMerger::new(config).merge_fix_args(&cli);

        assert_eq!(merged.options.batch_size, 1);
        assert_eq!(merged.options.max_iterations, 30);
        assert_eq!(merged.options.max_batches, FixOptions::default().max_batches);
        assert_eq!(merged.options.ignored_diagnostic_ids, vec!["TXT1004", "TXT1002"]);
        assert_eq!(merged.filter.exclude, vec!["vendor", "legacy"]);
    }

    #[test]
    fn test_merge_flags_only_switch_on() {
        let config = FixloopConfig {
            engine: EngineConfig {
                ignore_compiler_errors: true,
                ..Default::default()
            },
            output: OutputConfig {
                strict: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = ConfigMerger::new(config).merge_fix_args(&FixOverrides::default());

        assert!(merged.options.ignore_compiler_errors);
        assert!(merged.strict);
    }

    #[test]
    fn test_preferences_reach_options() {
        let config = parse_config("[action_preferences]\nTXT1002 = \"TXT1002:spaces\"\n").unwrap();
        let merged = ConfigMerger::new(config).merge_fix_args(&FixOverrides::default());
        assert_eq!(
            merged.options.action_preferences.get("TXT1002").map(String::as_str),
            Some("TXT1002:spaces")
        );
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }

    #[test]
    fn test_load_or_default_returns_default_when_missing() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let cfg = load_or_default(&root).expect("load default");
        assert!(cfg.projects.is_empty());
        assert!(cfg.output.out_dir.is_none());
    }
}
