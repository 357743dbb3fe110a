use std::io::{self, BufRead, Write};
use thiserror::Error;

use crate::changes::{Change, list_changes};
use crate::config::{Config, ToolCommand};
use crate::finalize::{ReviewProgress, finalize};
use crate::git::{self, GitError, ProcessGateway};

const FILE_MENU: &str = "[Diff, Edit, Add, Patch, Skip, dOne, Quit]";
const ALL_RESOLVED_PROMPT: &str = "Nothing to review - [dOne, Quit]? ";

/// Errors that end a review session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("input closed before the review finished")]
    InputClosed,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// A single-character command typed at the per-file prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Diff,
    Edit,
    Add,
    Patch,
    Skip,
    Done,
    Quit,
}

impl Command {
    /// Interpret a line of user input. Empty input means `Diff`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim().to_lowercase();
        match input.chars().next() {
            None | Some('d') => Some(Self::Diff),
            Some('e') => Some(Self::Edit),
            Some('a') => Some(Self::Add),
            Some('p') => Some(Self::Patch),
            Some('s') => Some(Self::Skip),
            Some('o') => Some(Self::Done),
            Some('q') => Some(Self::Quit),
            Some(_) => None,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NothingToReview,
    /// The user chose `dOne`; `None` when there was nothing to commit.
    Finalized(Option<ReviewProgress>),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileState {
    NeedsDiff,
    AwaitingCommand,
}

enum FileOutcome {
    Advance,
    End(Outcome),
}

/// Interactive walk over the working tree's changes.
pub struct ReviewSession<'a, G: ?Sized, R, W> {
    gateway: &'a G,
    config: &'a Config,
    input: R,
    output: W,
}

impl<'a, G, R, W> ReviewSession<'a, G, R, W>
where
    G: ProcessGateway + ?Sized,
    R: BufRead,
    W: Write,
{
    pub fn new(gateway: &'a G, config: &'a Config, input: R, output: W) -> Self {
        Self {
            gateway,
            config,
            input,
            output,
        }
    }

    /// Run passes over the change set until the user quits or finalizes,
    /// or there is nothing left to look at.
    pub fn run(&mut self) -> Result<Outcome> {
        loop {
            let mut changes = list_changes(self.gateway)?;
            if changes.is_empty() {
                writeln!(self.output, "Nothing to review")?;
                return Ok(Outcome::NothingToReview);
            }

            if changes.all_resolved() {
                let answer = self.ask(ALL_RESOLVED_PROMPT)?;
                match answer.chars().next() {
                    None => continue,
                    Some('o') => return self.finish(),
                    Some('q') => return Ok(Outcome::Quit),
                    // Anything else falls through to a pass, which only
                    // stops on files that are not fully staged.
                    Some(_) => {}
                }
            }

            let total = changes.len();
            for (index, change) in changes.changes.iter_mut().enumerate() {
                if let FileOutcome::End(outcome) = self.review_file(index, total, change)? {
                    return Ok(outcome);
                }
            }
        }
    }

    fn review_file(
        &mut self,
        index: usize,
        total: usize,
        change: &mut Change,
    ) -> Result<FileOutcome> {
        let mut state = if self.config.diff_by_default {
            FileState::NeedsDiff
        } else {
            FileState::AwaitingCommand
        };

        loop {
            if change.status.is_fully_staged() || change.status.is_unmodified() {
                return Ok(FileOutcome::Advance);
            }

            if state == FileState::NeedsDiff {
                self.show_diff(change);
                state = FileState::AwaitingCommand;
            }

            let prompt = format!(
                "[{}/{}] [{}] {} - {}? ",
                index + 1,
                total,
                change.status,
                change.path,
                FILE_MENU
            );
            let answer = self.ask(&prompt)?;

            match Command::parse(&answer) {
                Some(Command::Diff) => self.show_diff(change),
                Some(Command::Edit) => self.launch(&self.config.editor, &change.path),
                Some(Command::Add) => {
                    git::git(self.gateway, &["add", "--", change.path.as_str()])?;
                    return Ok(FileOutcome::Advance);
                }
                Some(Command::Patch) => {
                    let result = self
                        .gateway
                        .interactive("git", &["add", "-p", "--", change.path.as_str()]);
                    warn_on_failure(result);
                    change.refresh(self.gateway)?;
                }
                Some(Command::Skip) => return Ok(FileOutcome::Advance),
                Some(Command::Done) => return Ok(FileOutcome::End(self.finish()?)),
                Some(Command::Quit) => return Ok(FileOutcome::End(Outcome::Quit)),
                None => log::debug!("ignoring unknown command {:?}", answer),
            }
        }
    }

    /// Show a change: new files through the pager, the rest as a diff.
    fn show_diff(&self, change: &Change) {
        if change.status.is_untracked() {
            self.launch(&self.config.pager, &change.path);
            return;
        }

        let mut args = vec!["diff"];
        args.extend(self.config.diff_options.iter().map(String::as_str));
        args.push("--");
        args.push(change.path.as_str());
        warn_on_failure(self.gateway.interactive("git", &args));
    }

    fn launch(&self, tool: &ToolCommand, path: &str) {
        let args = tool.args_for(path);
        warn_on_failure(self.gateway.interactive(&tool.program, &args));
    }

    fn finish(&mut self) -> Result<Outcome> {
        let progress = finalize(self.gateway)?;
        if let Some(progress) = progress {
            writeln!(self.output, "Committed: {}", progress.commit_message())?;
        }
        Ok(Outcome::Finalized(progress))
    }

    /// Print a prompt and read one trimmed, lowercased line.
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SessionError::InputClosed);
        }
        Ok(line.trim().to_lowercase())
    }
}

/// Viewer, editor and patch tool failures never end the session.
fn warn_on_failure(result: git::Result<()>) {
    if let Err(err) = result {
        log::warn!("{}", err);
    }
}
