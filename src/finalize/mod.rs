use crate::changes::list_changes;
use crate::git::{self, ProcessGateway, Result};

/// How much of the change set was staged when a review commit was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewProgress {
    pub resolved: usize,
    pub total: usize,
}

impl ReviewProgress {
    pub fn commit_message(&self) -> String {
        format!("reviewed {}/{}", self.resolved, self.total)
    }
}

/// Commit whatever is currently staged, recording review progress.
///
/// Returns `None` without committing when the working tree has no changes.
/// Nothing is staged here; only previous `add`/`patch` actions end up in the
/// commit.
pub fn finalize<G: ProcessGateway + ?Sized>(gateway: &G) -> Result<Option<ReviewProgress>> {
    let changes = list_changes(gateway)?;
    if changes.is_empty() {
        return Ok(None);
    }

    let progress = ReviewProgress {
        resolved: changes.resolved_count(),
        total: changes.len(),
    };
    let message = progress.commit_message();
    git::git(gateway, &["commit", "-m", message.as_str()])?;
    log::info!("committed {:?}", message);

    Ok(Some(progress))
}
