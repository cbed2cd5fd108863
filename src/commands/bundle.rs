//! `bundle` command - build every platform extension and assemble the
//! production package.

use std::path::PathBuf;

use anyhow::Result;
use log::warn;

use crate::builder::{BundleAction, tool::BuildTool};
use crate::manifest::ManifestAction;
use crate::platform::PLATFORM_TARGETS;
use crate::runtime::Runtime;

pub async fn run<R: Runtime, T: BuildTool>(
    runtime: &R,
    tool: &T,
    project_root: PathBuf,
    out_dir: PathBuf,
    jobs: usize,
) -> Result<()> {
    let action = BundleAction::new(runtime, tool, out_dir.clone());

    action.preflight().await?;
    action.clean()?;

    println!("Building CR-SQLite extensions for all platforms...");
    let report = action.build_all(jobs).await;

    for artifact in report.artifacts() {
        println!("  {} - {}", artifact.file_name, artifact.target.description);
    }

    let failures = report.failures();
    if !failures.is_empty() {
        warn!(
            "Missing {} platforms - package won't be truly universal",
            failures.len()
        );
        for failure in &failures {
            warn!("Missing: {}", failure);
        }
        warn!("Consider setting up remote builders for missing platforms");
    }

    if report.is_total_failure() {
        anyhow::bail!("No platform extensions could be built");
    }

    ManifestAction::new(runtime, project_root, out_dir.clone()).generate()?;

    println!(
        "Built {}/{} platform extensions",
        report.artifacts().len(),
        PLATFORM_TARGETS.len()
    );
    println!("Production package created in {}", out_dir.display());
    Ok(())
}
