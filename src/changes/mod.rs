use std::fmt;

use crate::git::{self, ProcessGateway, Result};

/// Byte offset of the path in a porcelain status record (`XY path`).
const PATH_OFFSET: usize = 3;

/// Porcelain status with NUL-terminated, unquoted paths.
const STATUS_ARGS: [&str; 4] = ["status", "--porcelain", "-z", "--untracked-files=all"];

/// Two-column porcelain status: index state and working-tree state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode {
    pub index: char,
    pub worktree: char,
}

impl StatusCode {
    /// Status of a path git no longer reports.
    pub const UNMODIFIED: StatusCode = StatusCode {
        index: ' ',
        worktree: ' ',
    };

    fn parse(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let index = chars.next()?;
        let worktree = chars.next()?;
        Some(Self { index, worktree })
    }

    /// The index holds a modification or addition for this path.
    pub fn is_staged(&self) -> bool {
        matches!(self.index, 'M' | 'A')
    }

    /// Everything about this path is staged; nothing left in the working tree.
    pub fn is_fully_staged(&self) -> bool {
        self.is_staged() && self.worktree == ' '
    }

    pub fn is_untracked(&self) -> bool {
        self.index == '?' && self.worktree == '?'
    }

    pub fn is_unmodified(&self) -> bool {
        *self == Self::UNMODIFIED
    }

    /// Renames and copies are followed by a record holding the source path.
    fn has_source_path(&self) -> bool {
        matches!(self.index, 'R' | 'C') || matches!(self.worktree, 'R' | 'C')
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.index, self.worktree)
    }
}

/// One file's review-relevant status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub status: StatusCode,
    pub path: String,
}

impl Change {
    /// Parse a single `git status --porcelain -z` record.
    ///
    /// Returns `None` for records too short to hold a status code and a path.
    pub fn parse(line: &str) -> Option<Self> {
        let code = line.get(..2)?;
        let path = line.get(PATH_OFFSET..)?;
        if path.is_empty() {
            return None;
        }

        Some(Self {
            status: StatusCode::parse(code)?,
            path: path.to_string(),
        })
    }

    /// Re-query git for this path and update the status in place.
    pub fn refresh<G: ProcessGateway + ?Sized>(&mut self, gateway: &G) -> Result<()> {
        let mut args = STATUS_ARGS.to_vec();
        args.extend(["--", self.path.as_str()]);
        let output = git::git(gateway, &args)?;

        self.status = ChangeSet::parse(&output)
            .changes
            .into_iter()
            .next()
            .map(|change| change.status)
            .unwrap_or(StatusCode::UNMODIFIED);

        Ok(())
    }
}

/// Every change in the working tree, in git's status order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    /// Build a change set from NUL-separated porcelain output.
    pub fn parse(output: &str) -> Self {
        let mut changes = Vec::new();
        let mut records = output.split('\0').filter(|record| !record.is_empty());

        while let Some(record) = records.next() {
            let Some(change) = Change::parse(record) else {
                log::warn!("ignoring malformed status record: {:?}", record);
                continue;
            };
            if change.status.has_source_path() {
                records.next();
            }
            changes.push(change);
        }

        Self { changes }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes with staged content.
    pub fn resolved_count(&self) -> usize {
        self.changes
            .iter()
            .filter(|change| change.status.is_staged())
            .count()
    }

    pub fn all_resolved(&self) -> bool {
        self.resolved_count() == self.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }
}

/// Query the full working-tree status, untracked files included.
pub fn list_changes<G: ProcessGateway + ?Sized>(gateway: &G) -> Result<ChangeSet> {
    let output = git::git(gateway, &STATUS_ARGS)?;
    Ok(ChangeSet::parse(&output))
}
