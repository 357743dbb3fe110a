use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("`{command}` failed:\n{output}")]
    CommandFailed { command: String, output: String },
    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not detect default branch")]
    NoDefaultBranch,
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, GitError>;

/// Runs external programs on behalf of the review core.
///
/// `capture` returns stdout; on a non-zero exit the error carries stdout
/// and stderr together.
/// `interactive` hands the terminal to the child and waits for it.
pub trait ProcessGateway {
    fn capture(&self, program: &str, args: &[&str]) -> Result<String>;
    fn interactive(&self, program: &str, args: &[&str]) -> Result<()>;
}

/// Gateway backed by real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGateway;

impl ProcessGateway for SystemGateway {
    fn capture(&self, program: &str, args: &[&str]) -> Result<String> {
        let command = command_line(program, args);
        log::debug!("{}", command);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(GitError::CommandFailed {
                command,
                output: combined,
            });
        }

        Ok(String::from_utf8(output.stdout)?)
    }

    fn interactive(&self, program: &str, args: &[&str]) -> Result<()> {
        let command = command_line(program, args);
        log::debug!("{}", command);

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(GitError::CommandFailed {
                command,
                output: status.to_string(),
            });
        }

        Ok(())
    }
}

/// Render a program and its arguments the way a user would type them.
pub fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Run git capturing its output.
pub fn git<G: ProcessGateway + ?Sized>(gateway: &G, args: &[&str]) -> Result<String> {
    gateway.capture("git", args)
}

/// Resolve a ref to its commit id, failing if it does not exist.
pub fn rev_parse<G: ProcessGateway + ?Sized>(gateway: &G, refname: &str) -> Result<String> {
    Ok(git(gateway, &["rev-parse", "--verify", refname])?
        .trim()
        .to_string())
}

/// Whether a ref resolves at all.
pub fn ref_exists<G: ProcessGateway + ?Sized>(gateway: &G, refname: &str) -> bool {
    git(gateway, &["rev-parse", "--verify", refname]).is_ok()
}

/// Detect the default branch (origin/HEAD -> main -> master fallback).
pub fn detect_default_branch<G: ProcessGateway + ?Sized>(gateway: &G) -> Result<String> {
    if let Ok(symbolic) = git(gateway, &["symbolic-ref", "refs/remotes/origin/HEAD"]) {
        if let Some(branch) = symbolic.trim().strip_prefix("refs/remotes/origin/") {
            return Ok(branch.to_string());
        }
    }

    for candidate in ["main", "master"] {
        if ref_exists(gateway, candidate) {
            return Ok(candidate.to_string());
        }
    }

    Err(GitError::NoDefaultBranch)
}

/// List all local branch names.
pub fn list_branches<G: ProcessGateway + ?Sized>(gateway: &G) -> Result<Vec<String>> {
    let stdout = git(
        gateway,
        &["for-each-ref", "--format=%(refname:short)", "refs/heads/"],
    )?;

    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Force delete a local branch.
pub fn delete_branch<G: ProcessGateway + ?Sized>(gateway: &G, name: &str) -> Result<()> {
    git(gateway, &["branch", "-D", name])?;
    Ok(())
}
