//! Bundling of prebuilt extension artifacts into the canonical layout.
//!
//! The builder invokes the external build tool once per target, pulls the
//! produced shared library out of the tool's output location, and copies it
//! into the output tree under the canonical name. Targets are independent:
//! one failure never aborts the others.

pub mod tool;

use std::path::{Path, PathBuf};

use anyhow::Result;
use futures_util::stream::{self, StreamExt};
use log::{info, warn};

use crate::platform::{BASE_NAME, PLATFORM_TARGETS, PlatformTarget};
use crate::runtime::Runtime;
use tool::BuildTool;

/// Default number of concurrent target builds
pub const DEFAULT_JOBS: usize = 2;

/// A successfully built and bundled artifact
#[derive(Debug, Clone)]
pub struct BuiltArtifact {
    pub target: &'static PlatformTarget,
    /// Canonical file name under the output tree
    pub file_name: String,
    pub path: PathBuf,
}

/// A per-target failure. Recorded in the report, never propagated.
#[derive(Debug, Clone)]
pub struct BuildFailure {
    pub target: &'static PlatformTarget,
    pub reason: String,
}

impl std::fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.target.pair(),
            self.target.description,
            self.reason
        )
    }
}

/// Per-target outcome table, keyed by target order, not completion order
#[derive(Debug)]
pub struct BuildReport {
    pub results: Vec<Result<BuiltArtifact, BuildFailure>>,
}

impl BuildReport {
    pub fn artifacts(&self) -> Vec<&BuiltArtifact> {
        self.results.iter().filter_map(|r| r.as_ref().ok()).collect()
    }

    pub fn failures(&self) -> Vec<&BuildFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err()).collect()
    }

    /// Zero successful artifacts. The only build-phase condition the caller
    /// treats as terminal.
    pub fn is_total_failure(&self) -> bool {
        self.artifacts().is_empty()
    }
}

/// Bundle action - builds every platform target into the output tree
pub struct BundleAction<'a, R: Runtime, T: BuildTool> {
    runtime: &'a R,
    tool: &'a T,
    out_dir: PathBuf,
}

impl<'a, R: Runtime, T: BuildTool> BundleAction<'a, R, T> {
    /// Create a new bundle action writing under `out_dir`
    pub fn new(runtime: &'a R, tool: &'a T, out_dir: PathBuf) -> Self {
        Self {
            runtime,
            tool,
            out_dir,
        }
    }

    /// Directory the bundled artifacts land in
    pub fn lib_dir(&self) -> PathBuf {
        self.out_dir.join("lib")
    }

    /// Verify the build tool and report how cross-platform targets will be
    /// served
    pub async fn preflight(&self) -> Result<()> {
        self.tool.check_available().await?;

        if self.tool.has_remote_builders().await {
            info!("Remote builders detected - will use for missing platforms");
        } else {
            info!("No remote builders - will try binary cache substitution");
        }
        Ok(())
    }

    /// Clear and recreate the output tree. Directories are cleared at the
    /// start of a full build, making each run idempotent.
    pub fn clean(&self) -> Result<()> {
        if self.runtime.exists(&self.out_dir) {
            self.runtime.remove_dir_all(&self.out_dir)?;
        }
        self.runtime.create_dir_all(&self.lib_dir())
    }

    /// Build every target with bounded parallelism.
    ///
    /// The report carries one slot per target in target order; a single
    /// target's failure never aborts the others.
    pub async fn build_all(&self, jobs: usize) -> BuildReport {
        let jobs = jobs.max(1);

        let mut indexed: Vec<(usize, Result<BuiltArtifact, BuildFailure>)> =
            stream::iter(PLATFORM_TARGETS.iter().enumerate())
                .map(|(index, target)| async move { (index, self.build_target(target).await) })
                .buffer_unordered(jobs)
                .collect()
                .await;

        indexed.sort_by_key(|(index, _)| *index);

        BuildReport {
            results: indexed.into_iter().map(|(_, result)| result).collect(),
        }
    }

    async fn build_target(
        &self,
        target: &'static PlatformTarget,
    ) -> Result<BuiltArtifact, BuildFailure> {
        info!("Building {} ({})...", target.description, target.pair());

        if let Err(err) = self.tool.build(target.build_identifier).await {
            return Err(self.failure(target, format!("build failed: {:#}", err)));
        }

        let store_path = match self.tool.output_path(target.build_identifier).await {
            Ok(path) => path,
            Err(err) => {
                return Err(self.failure(target, format!("could not locate build output: {:#}", err)));
            }
        };

        let source = self.find_artifact(&store_path.join("lib"), target)?;

        let file_name = target.file_name();
        let dest = self.lib_dir().join(&file_name);
        if let Err(err) = self.install_artifact(&source, &dest) {
            return Err(self.failure(target, format!("copy failed: {:#}", err)));
        }

        info!("{} -> {}", file_name, target.description);
        Ok(BuiltArtifact {
            target,
            file_name,
            path: dest,
        })
    }

    /// Exactly one `*crsqlite*.{ext}` file must exist in the tool's output
    /// directory; zero or several is a failure, not a guess.
    fn find_artifact(
        &self,
        output_lib_dir: &Path,
        target: &'static PlatformTarget,
    ) -> Result<PathBuf, BuildFailure> {
        let entries = match self.runtime.read_dir(output_lib_dir) {
            Ok(entries) => entries,
            Err(err) => {
                return Err(self.failure(
                    target,
                    format!(
                        "could not read build output {}: {:#}",
                        output_lib_dir.display(),
                        err
                    ),
                ));
            }
        };

        let suffix = format!(".{}", target.extension);
        let matches: Vec<PathBuf> = entries
            .into_iter()
            .filter(|entry| {
                entry
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(|name| name.contains(BASE_NAME) && name.ends_with(&suffix))
                    .unwrap_or(false)
            })
            .collect();

        match matches.len() {
            1 => Ok(matches.into_iter().next().unwrap()),
            0 => Err(self.failure(
                target,
                "ambiguous or missing artifact: no crsqlite library in build output".to_string(),
            )),
            n => Err(self.failure(
                target,
                format!("ambiguous or missing artifact: {} crsqlite libraries in build output", n),
            )),
        }
    }

    /// Copy the artifact, resolving any symlink to its real file contents
    fn install_artifact(&self, source: &Path, dest: &Path) -> Result<()> {
        let real = self.runtime.canonicalize(source)?;
        self.runtime.copy(&real, dest)?;
        Ok(())
    }

    fn failure(&self, target: &'static PlatformTarget, reason: String) -> BuildFailure {
        warn!("Failed to build {}: {}", target.pair(), reason);
        BuildFailure { target, reason }
    }
}
