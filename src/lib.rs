pub mod branches;
pub mod changes;
pub mod cli;
pub mod config;
pub mod finalize;
pub mod git;
pub mod session;

pub use changes::{Change, ChangeSet, StatusCode};
pub use config::Config;
pub use finalize::ReviewProgress;
pub use git::{GitError, ProcessGateway, SystemGateway};
