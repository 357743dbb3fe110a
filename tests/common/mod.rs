#![allow(dead_code)]

use git_stage_review::git::{GitError, ProcessGateway, Result, command_line};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};

/// In-memory stand-in for a git repository and the user's tools.
///
/// Models just enough of git for the review core: porcelain status, staging,
/// commits and local branches fetched from pull request heads.
#[derive(Default)]
pub struct FakeRepo {
    status: RefCell<Vec<(String, String)>>,
    refs: RefCell<BTreeMap<String, String>>,
    remote_heads: HashMap<u64, String>,
    merge_base: String,
    patch_results: HashMap<String, String>,
    failing_programs: HashSet<String>,
    unresolvable: HashSet<String>,
    calls: RefCell<Vec<String>>,
    interactive_calls: RefCell<Vec<String>>,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self {
            merge_base: "base0000".to_string(),
            ..Self::default()
        }
    }

    /// Working tree entries as `(status code, path)`.
    pub fn with_status(self, entries: &[(&str, &str)]) -> Self {
        *self.status.borrow_mut() = entries
            .iter()
            .map(|(code, path)| (code.to_string(), path.to_string()))
            .collect();
        self
    }

    pub fn with_branch(self, name: &str, sha: &str) -> Self {
        self.refs
            .borrow_mut()
            .insert(name.to_string(), sha.to_string());
        self
    }

    pub fn with_remote_head(mut self, id: u64, sha: &str) -> Self {
        self.remote_heads.insert(id, sha.to_string());
        self
    }

    pub fn with_merge_base(mut self, sha: &str) -> Self {
        self.merge_base = sha.to_string();
        self
    }

    /// Status a path reports after `git add -p` on it.
    pub fn with_patch_result(mut self, path: &str, code: &str) -> Self {
        self.patch_results
            .insert(path.to_string(), code.to_string());
        self
    }

    /// Interactive runs of this program exit non-zero.
    pub fn with_failing_program(mut self, program: &str) -> Self {
        self.failing_programs.insert(program.to_string());
        self
    }

    /// `rev-parse` of this ref fails even after it was fetched.
    pub fn with_unresolvable_ref(mut self, name: &str) -> Self {
        self.unresolvable.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn interactive_calls(&self) -> Vec<String> {
        self.interactive_calls.borrow().clone()
    }

    pub fn called(&self, command: &str) -> bool {
        self.calls.borrow().iter().any(|call| call == command)
    }

    pub fn called_prefix(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|call| call.starts_with(prefix))
    }

    pub fn branches(&self) -> Vec<String> {
        self.refs.borrow().keys().cloned().collect()
    }

    pub fn status_of(&self, path: &str) -> Option<String> {
        self.status
            .borrow()
            .iter()
            .find(|(_, p)| p == path)
            .map(|(code, _)| code.clone())
    }

    fn render_status(&self, only: Option<&str>) -> String {
        self.status
            .borrow()
            .iter()
            .filter(|(_, path)| only.is_none_or(|only| only == path))
            .map(|(code, path)| format!("{} {}\0", code, path))
            .collect()
    }

    fn set_status(&self, path: &str, code: &str) {
        let mut status = self.status.borrow_mut();
        if let Some(entry) = status.iter_mut().find(|(_, p)| p == path) {
            entry.0 = code.to_string();
        }
    }

    fn stage(&self, path: &str) {
        let code = self.status_of(path).unwrap_or_default();
        let staged = if code == "??" || code.starts_with('A') {
            "A "
        } else {
            "M "
        };
        self.set_status(path, staged);
    }

    fn commit(&self) -> Result<String> {
        let mut status = self.status.borrow_mut();
        let before = status.len();
        let mut committed = false;
        status.retain(|(code, _)| {
            let fully_staged = code == "M " || code == "A ";
            committed |= fully_staged;
            !fully_staged
        });
        for entry in status.iter_mut() {
            if entry.0.starts_with('M') || entry.0.starts_with('A') {
                committed = true;
                entry.0 = format!(" {}", &entry.0[1..]);
            }
        }
        if !committed {
            return Err(failure("git commit", "nothing added to commit"));
        }
        Ok(format!("{} files changed\n", before - status.len()))
    }

    fn fetch(&self, command: &str, refspec: &str) -> Result<String> {
        let (source, local) = refspec
            .split_once(':')
            .ok_or_else(|| failure(command, "fatal: invalid refspec"))?;
        let id: u64 = source
            .strip_prefix("refs/pull/")
            .and_then(|rest| rest.strip_suffix("/head"))
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| failure(command, "fatal: invalid refspec"))?;
        let head = self
            .remote_heads
            .get(&id)
            .ok_or_else(|| failure(command, "fatal: couldn't find remote ref"))?;
        self.refs
            .borrow_mut()
            .insert(local.to_string(), head.clone());
        Ok(String::new())
    }
}

fn failure(command: &str, output: &str) -> GitError {
    GitError::CommandFailed {
        command: command.to_string(),
        output: output.to_string(),
    }
}

impl ProcessGateway for FakeRepo {
    fn capture(&self, program: &str, args: &[&str]) -> Result<String> {
        let command = command_line(program, args);
        self.calls.borrow_mut().push(command.clone());

        if program != "git" {
            return Err(failure(&command, "unexpected program"));
        }

        match args {
            ["status", "--porcelain", "-z", "--untracked-files=all"] => {
                Ok(self.render_status(None))
            }
            ["status", "--porcelain", "-z", "--untracked-files=all", "--", path] => {
                Ok(self.render_status(Some(*path)))
            }
            ["add", "--", path] => {
                self.stage(path);
                Ok(String::new())
            }
            ["commit", "-m", _] => self.commit(),
            ["fetch", .., refspec] => self.fetch(&command, refspec),
            ["rev-parse", "--verify", name] => self
                .refs
                .borrow()
                .get(*name)
                .filter(|_| !self.unresolvable.contains(*name))
                .map(|sha| format!("{}\n", sha))
                .ok_or_else(|| failure(&command, "fatal: Needed a single revision")),
            ["merge-base", _, _] => Ok(format!("{}\n", self.merge_base)),
            ["checkout", "-b", name, base] => {
                self.refs
                    .borrow_mut()
                    .insert(name.to_string(), base.to_string());
                Ok(String::new())
            }
            ["checkout", _, "--", "."] | ["reset"] => Ok(String::new()),
            ["checkout", name] => {
                if self.refs.borrow().contains_key(*name) {
                    Ok(String::new())
                } else {
                    Err(failure(&command, "error: pathspec did not match"))
                }
            }
            ["for-each-ref", "--format=%(refname:short)", "refs/heads/"] => Ok(self
                .refs
                .borrow()
                .keys()
                .map(|name| format!("{}\n", name))
                .collect()),
            ["branch", "-D", name] => match self.refs.borrow_mut().remove(*name) {
                Some(_) => Ok(format!("Deleted branch {}\n", name)),
                None => Err(failure(
                    &command,
                    &format!("error: branch '{}' not found.", name),
                )),
            },
            _ => Err(failure(&command, "unsupported in fake repository")),
        }
    }

    fn interactive(&self, program: &str, args: &[&str]) -> Result<()> {
        let command = command_line(program, args);
        self.interactive_calls.borrow_mut().push(command.clone());

        if self.failing_programs.contains(program) {
            return Err(failure(&command, "exit status: 1"));
        }

        if let ("git", ["add", "-p", "--", path]) = (program, args) {
            if let Some(code) = self.patch_results.get(*path) {
                self.set_status(path, code);
            }
        }

        Ok(())
    }
}
