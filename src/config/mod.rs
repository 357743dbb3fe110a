use regex::Regex;
use thiserror::Error;

use crate::git::{self, ProcessGateway};

/// Placeholder for the pull request id in branch name templates.
pub const ID_PLACEHOLDER: &str = "%s";

const DEFAULT_DIFF_OPTIONS: &str = "--patch --stat --histogram";
const DEFAULT_EDITOR: &str = "vi";
const DEFAULT_PAGER: &str = "less";
const DEFAULT_PULL_BRANCH: &str = "pull/%s";
const DEFAULT_REVIEW_BRANCH: &str = "review/%s";
const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("branch pattern {0:?} must contain exactly one %s")]
    InvalidPattern(String),
    #[error("branch pattern {pattern:?} is not usable: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A branch name template such as `review/%s`.
#[derive(Debug, Clone)]
pub struct BranchPattern {
    template: String,
    matcher: Regex,
}

impl BranchPattern {
    pub fn new(template: &str) -> Result<Self> {
        if template.matches(ID_PLACEHOLDER).count() != 1 {
            return Err(ConfigError::InvalidPattern(template.to_string()));
        }

        let source = format!(
            "^{}$",
            regex::escape(template).replacen(ID_PLACEHOLDER, r"(\d+)", 1)
        );
        let matcher = Regex::new(&source).map_err(|source| ConfigError::Regex {
            pattern: template.to_string(),
            source,
        })?;

        Ok(Self {
            template: template.to_string(),
            matcher,
        })
    }

    /// Branch name for a pull request id.
    pub fn branch(&self, id: u64) -> String {
        self.template.replacen(ID_PLACEHOLDER, &id.to_string(), 1)
    }

    /// Pull request id encoded in a branch name, if it follows this pattern.
    pub fn id_of(&self, branch: &str) -> Option<u64> {
        self.matcher
            .captures(branch)
            .and_then(|captures| captures.get(1))
            .and_then(|id| id.as_str().parse().ok())
    }
}

/// A user tool command line, e.g. `code --wait`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Split a command line on whitespace; `None` when it is blank.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    /// Arguments for invoking this tool on `path`.
    pub fn args_for<'a>(&'a self, path: &'a str) -> Vec<&'a str> {
        let mut args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        args.push(path);
        args
    }
}

/// Settings read once at startup from the `review.*` git config section.
#[derive(Debug, Clone)]
pub struct Config {
    pub diff_by_default: bool,
    pub diff_options: Vec<String>,
    pub editor: ToolCommand,
    pub pager: ToolCommand,
    pub pull_branch: BranchPattern,
    pub remote: String,
    pub review_branch: BranchPattern,
    /// Branch review branches are anchored against; detected when unset.
    pub base_branch: Option<String>,
}

impl Config {
    /// Built-in defaults, ignoring git config and the environment.
    pub fn defaults() -> Result<Self> {
        Ok(Self {
            diff_by_default: true,
            diff_options: split_options(DEFAULT_DIFF_OPTIONS),
            editor: tool_or(None, DEFAULT_EDITOR),
            pager: tool_or(None, DEFAULT_PAGER),
            pull_branch: BranchPattern::new(DEFAULT_PULL_BRANCH)?,
            remote: DEFAULT_REMOTE.to_string(),
            review_branch: BranchPattern::new(DEFAULT_REVIEW_BRANCH)?,
            base_branch: None,
        })
    }

    /// Read every setting from git config, falling back to defaults.
    pub fn load<G: ProcessGateway + ?Sized>(gateway: &G) -> Result<Self> {
        let editor_env = std::env::var("EDITOR").ok();
        let pager_env = std::env::var("PAGER").ok();

        let diff_options = get_config(gateway, "review.diffOptions")
            .unwrap_or_else(|| DEFAULT_DIFF_OPTIONS.to_string());
        let editor = get_config(gateway, "review.editor").or(editor_env);
        let pager = get_config(gateway, "review.pager").or(pager_env);
        let pull_branch = get_config(gateway, "review.pullBranch")
            .unwrap_or_else(|| DEFAULT_PULL_BRANCH.to_string());
        let review_branch = get_config(gateway, "review.revBranch")
            .unwrap_or_else(|| DEFAULT_REVIEW_BRANCH.to_string());

        let config = Self {
            diff_by_default: get_config_bool(gateway, "review.diffByDefault").unwrap_or(true),
            diff_options: split_options(&diff_options),
            editor: tool_or(editor.as_deref(), DEFAULT_EDITOR),
            pager: tool_or(pager.as_deref(), DEFAULT_PAGER),
            pull_branch: BranchPattern::new(&pull_branch)?,
            remote: get_config(gateway, "review.remote")
                .unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            review_branch: BranchPattern::new(&review_branch)?,
            base_branch: get_config(gateway, "review.baseBranch"),
        };

        log::debug!("loaded config: {:?}", config);
        Ok(config)
    }
}

/// Value of a git config key, or `None` if it is unset.
fn get_config<G: ProcessGateway + ?Sized>(gateway: &G, key: &str) -> Option<String> {
    git::git(gateway, &["config", "--get", key])
        .ok()
        .map(|value| value.trim().to_string())
}

fn get_config_bool<G: ProcessGateway + ?Sized>(gateway: &G, key: &str) -> Option<bool> {
    git::git(gateway, &["config", "--bool", "--get", key])
        .ok()
        .map(|value| value.trim() == "true")
}

fn split_options(options: &str) -> Vec<String> {
    options.split_whitespace().map(str::to_string).collect()
}

fn tool_or(line: Option<&str>, fallback: &str) -> ToolCommand {
    line.and_then(ToolCommand::parse)
        .unwrap_or_else(|| ToolCommand {
            program: fallback.to_string(),
            args: Vec::new(),
        })
}
