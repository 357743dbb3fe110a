use crate::config::Config;
use crate::git::{self, GitError, ProcessGateway, Result};

/// How `begin_review` got onto the review branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewStart {
    /// The review branch was new and now starts at this merge base.
    Created { base: String },
    /// The review branch already existed and was checked out as is.
    Resumed,
}

/// Which tracked pull requests moved since their pull branch was fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvancedReport {
    pub advanced: Vec<u64>,
    pub total: usize,
}

impl AdvancedReport {
    pub fn summary(&self) -> String {
        format!(
            "{} of {} pull requests with open reviews have advanced",
            self.advanced.len(),
            self.total
        )
    }
}

/// Result of deleting the branches of one review.
#[derive(Debug, Default)]
pub struct DiscardReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, GitError)>,
}

impl DiscardReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Bookkeeping for the `pull/<id>` and `review/<id>` branch pair.
pub struct PrBranches<'a, G: ?Sized> {
    gateway: &'a G,
    config: &'a Config,
}

impl<'a, G: ProcessGateway + ?Sized> PrBranches<'a, G> {
    pub fn new(gateway: &'a G, config: &'a Config) -> Self {
        Self { gateway, config }
    }

    fn pull_branch(&self, id: u64) -> String {
        self.config.pull_branch.branch(id)
    }

    fn review_branch(&self, id: u64) -> String {
        self.config.review_branch.branch(id)
    }

    fn pull_refspec(id: u64, local: &str) -> String {
        format!("refs/pull/{}/head:{}", id, local)
    }

    fn base_branch(&self) -> Result<String> {
        match &self.config.base_branch {
            Some(branch) => Ok(branch.clone()),
            None => git::detect_default_branch(self.gateway),
        }
    }

    /// Fetch the pull request, get onto its review branch and lay the PR's
    /// files over the working tree, all unstaged.
    ///
    /// A review branch that already exists is resumed, never recreated.
    pub fn begin_review(&self, id: u64) -> Result<ReviewStart> {
        let pull = self.pull_branch(id);
        let review = self.review_branch(id);

        let refspec = Self::pull_refspec(id, &pull);
        git::git(
            self.gateway,
            &["fetch", "-u", "-f", self.config.remote.as_str(), refspec.as_str()],
        )?;

        let start = if git::ref_exists(self.gateway, &review) {
            log::info!("resuming {}", review);
            git::git(self.gateway, &["checkout", review.as_str()])?;
            ReviewStart::Resumed
        } else {
            let default_branch = self.base_branch()?;
            let base = git::git(
                self.gateway,
                &["merge-base", default_branch.as_str(), pull.as_str()],
            )?
            .trim()
            .to_string();
            log::info!("creating {} at {}", review, base);
            git::git(
                self.gateway,
                &["checkout", "-b", review.as_str(), base.as_str()],
            )?;
            ReviewStart::Created { base }
        };

        git::git(self.gateway, &["checkout", pull.as_str(), "--", "."])?;
        git::git(self.gateway, &["reset"])?;

        Ok(start)
    }

    /// Whether the remote head of `id` differs from the local pull branch.
    fn has_advanced(&self, id: u64) -> Result<bool> {
        let pull = self.pull_branch(id);
        let recorded = git::rev_parse(self.gateway, &pull)?;

        let tmp = format!("{}-tmp", pull);
        let refspec = Self::pull_refspec(id, &tmp);
        git::git(
            self.gateway,
            &["fetch", "-f", self.config.remote.as_str(), refspec.as_str()],
        )?;
        let latest = git::rev_parse(self.gateway, &tmp);
        git::delete_branch(self.gateway, &tmp)?;

        Ok(latest? != recorded)
    }

    /// Check every local review branch against its pull request's remote head.
    pub fn check_advanced(&self) -> Result<AdvancedReport> {
        let mut report = AdvancedReport::default();

        for branch in git::list_branches(self.gateway)? {
            let Some(id) = self.config.review_branch.id_of(&branch) else {
                continue;
            };

            report.total += 1;
            if self.has_advanced(id)? {
                report.advanced.push(id);
            }
        }

        Ok(report)
    }

    /// Delete the pull and review branches for `id`.
    ///
    /// Both deletions are attempted; failures are collected, not raised.
    pub fn discard(&self, id: u64) -> DiscardReport {
        let mut report = DiscardReport::default();

        for branch in [self.pull_branch(id), self.review_branch(id)] {
            match git::delete_branch(self.gateway, &branch) {
                Ok(()) => report.deleted.push(branch),
                Err(err) => {
                    log::warn!("could not delete {}: {}", branch, err);
                    report.failed.push((branch, err));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_advanced_and_total() {
        let report = AdvancedReport {
            advanced: vec![4],
            total: 2,
        };
        assert_eq!(
            report.summary(),
            "1 of 2 pull requests with open reviews have advanced"
        );
    }

    #[test]
    fn refspec_targets_pull_head() {
        assert_eq!(
            PrBranches::<dyn ProcessGateway>::pull_refspec(9, "pull/9"),
            "refs/pull/9/head:pull/9"
        );
    }
}
