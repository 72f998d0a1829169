//! CLI commands

mod affected;
mod graph;
mod init;
mod jobs;
mod workspace;

pub use affected::AffectedCommand;
pub use graph::GraphCommand;
pub use init::InitCommand;
pub use jobs::JobsCommand;
pub use workspace::ConfigLocation;
