use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "git-stage-review",
    about = "Review working tree changes file by file, staging what you approve"
)]
pub struct Cli {
    /// Pull request number to fetch and review. Shorthand for starting or
    /// resuming its review branch.
    pub pr: Option<u64>,

    /// Log every git invocation.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review the current working tree (default).
    Review,
    /// Commit what is staged with a "reviewed K/N" message.
    Done,
    /// Report pull requests whose head moved since their review started.
    Updated,
    /// Delete the pull and review branches of a pull request.
    Unreview {
        /// Pull request number.
        id: u64,
    },
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
