use anyhow::{Context, Result, bail};
use std::io;

use git_stage_review::branches::{PrBranches, ReviewStart};
use git_stage_review::cli::{self, Commands};
use git_stage_review::config::Config;
use git_stage_review::finalize::finalize;
use git_stage_review::git::SystemGateway;
use git_stage_review::session::{Outcome, ReviewSession};

fn main() -> Result<()> {
    let args = cli::parse_args();
    init_logging(args.verbose);

    let gateway = SystemGateway;
    let config = Config::load(&gateway).context("Invalid review configuration")?;

    match args.command {
        None => match args.pr {
            Some(id) => handle_pull_request(&gateway, &config, id)?,
            None => handle_review(&gateway, &config)?,
        },
        Some(Commands::Review) => {
            handle_review(&gateway, &config)?;
        }
        Some(Commands::Done) => {
            handle_done(&gateway)?;
        }
        Some(Commands::Updated) => {
            handle_updated(&gateway, &config)?;
        }
        Some(Commands::Unreview { id }) => {
            handle_unreview(&gateway, &config, id)?;
        }
    }

    Ok(())
}

/// Route `log` output to stderr; `--verbose` shows every git call.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Run the interactive review loop on the current working tree.
fn handle_review(gateway: &SystemGateway, config: &Config) -> Result<()> {
    let stdin = io::stdin();
    let mut session = ReviewSession::new(gateway, config, stdin.lock(), io::stdout());
    let outcome = session.run().context("Review session failed")?;

    if let Outcome::Finalized(None) = outcome {
        println!("Nothing to commit");
    }
    log::debug!("session ended: {:?}", outcome);
    Ok(())
}

/// Fetch a pull request, get onto its review branch, then review.
fn handle_pull_request(gateway: &SystemGateway, config: &Config, id: u64) -> Result<()> {
    let branches = PrBranches::new(gateway, config);
    match branches
        .begin_review(id)
        .with_context(|| format!("Failed to start review of pull request {}", id))?
    {
        ReviewStart::Created { base } => {
            println!(
                "Started {} at {}",
                config.review_branch.branch(id),
                base
            );
        }
        ReviewStart::Resumed => {
            println!("Resuming {}", config.review_branch.branch(id));
        }
    }

    handle_review(gateway, config)
}

/// Commit staged changes with a progress message.
fn handle_done(gateway: &SystemGateway) -> Result<()> {
    match finalize(gateway).context("Failed to record review progress")? {
        Some(progress) => println!("Committed: {}", progress.commit_message()),
        None => println!("Nothing to review"),
    }
    Ok(())
}

/// Report which reviewed pull requests have new commits.
fn handle_updated(gateway: &SystemGateway, config: &Config) -> Result<()> {
    let report = PrBranches::new(gateway, config)
        .check_advanced()
        .context("Failed to check pull requests")?;

    for id in &report.advanced {
        println!("PR {} has advanced", id);
    }
    println!("{}", report.summary());
    Ok(())
}

/// Remove review state for a pull request; fails if a branch was missing.
fn handle_unreview(gateway: &SystemGateway, config: &Config, id: u64) -> Result<()> {
    let report = PrBranches::new(gateway, config).discard(id);

    for branch in &report.deleted {
        println!("✓ Deleted {}", branch);
    }
    for (branch, err) in &report.failed {
        eprintln!("✗ Could not delete {}", branch);
        eprintln!("  {}", err);
    }

    if !report.is_clean() {
        bail!("Review state for pull request {} was not fully removed", id);
    }
    Ok(())
}
