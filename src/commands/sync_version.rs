//! `sync-version` command - align package.json with the upstream extension.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::tool::BuildTool;
use crate::runtime::Runtime;
use crate::version::{SyncOutcome, SyncVersionAction};

pub async fn run<R: Runtime, T: BuildTool>(
    runtime: &R,
    tool: &T,
    project_root: PathBuf,
) -> Result<()> {
    let action = SyncVersionAction::new(runtime, tool, project_root);

    match action.sync().await? {
        SyncOutcome::Unchanged(version) => {
            println!(
                "CR-SQLite version matches, keeping current version: {}",
                version
            );
        }
        SyncOutcome::Updated { from, to } => {
            println!("Updated package version: {} -> {}", from, to);
            println!("Don't forget to commit the changes.");
        }
    }
    Ok(())
}
