//! Keeps the package version in lockstep with the upstream extension.
//!
//! The published version is `{upstream}-{n}` where `n` counts packaging
//! revisions of the same upstream release. A new upstream release resets the
//! suffix to `-1`; re-running against an unchanged upstream keeps the current
//! version (suffix included) untouched.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use serde_json::Value;

use crate::builder::tool::BuildTool;
use crate::runtime::Runtime;

/// Result of a version sync, for display
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Upstream base already matches; nothing written
    Unchanged(String),
    /// Manifest rewritten with the new version
    Updated { from: String, to: String },
}

/// Sync-version action - aligns package.json with the upstream version
pub struct SyncVersionAction<'a, R: Runtime, T: BuildTool> {
    runtime: &'a R,
    tool: &'a T,
    project_root: PathBuf,
}

impl<'a, R: Runtime, T: BuildTool> SyncVersionAction<'a, R, T> {
    pub fn new(runtime: &'a R, tool: &'a T, project_root: PathBuf) -> Self {
        Self {
            runtime,
            tool,
            project_root,
        }
    }

    pub async fn sync(&self) -> Result<SyncOutcome> {
        let upstream = self
            .tool
            .extension_version()
            .await
            .context("Failed to get CR-SQLite version from the build tool")?;
        info!("CR-SQLite version from build tool: {}", upstream);

        let manifest_path = self.project_root.join("package.json");
        let contents = self
            .runtime
            .read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        let mut pkg: Value =
            serde_json::from_str(&contents).context("Failed to parse package.json")?;

        let current = pkg
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let current_base = current
            .split_once('-')
            .map(|(base, _)| base)
            .unwrap_or(current.as_str());

        if current_base == upstream {
            return Ok(SyncOutcome::Unchanged(current));
        }

        let next = format!("{}-1", upstream);
        pkg.as_object_mut()
            .context("package.json is not a JSON object")?
            .insert("version".into(), Value::String(next.clone()));

        let rendered = serde_json::to_string_pretty(&pkg)? + "\n";
        self.runtime.write(&manifest_path, rendered.as_bytes())?;

        Ok(SyncOutcome::Updated {
            from: current,
            to: next,
        })
    }
}
