//! Seam to the external build tool that compiles the extension per target.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Trait for the external build tool (useful for testing)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Verify the tool is runnable at all
    async fn check_available(&self) -> Result<()>;

    /// Whether remote builders are configured for cross-platform builds
    async fn has_remote_builders(&self) -> bool;

    /// Build one target. The identifier is opaque to the caller.
    async fn build(&self, identifier: &str) -> Result<()>;

    /// Output location the tool produced for this identifier
    async fn output_path(&self, identifier: &str) -> Result<PathBuf>;

    /// Version of the upstream extension the tool builds
    async fn extension_version(&self) -> Result<String>;
}

/// Build tool backed by the Nix flake in the project root
pub struct NixBuildTool;

impl NixBuildTool {
    async fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        Command::new("nix")
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run nix {}", args.join(" ")))
    }

    async fn capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.status.success() {
            bail!(
                "nix {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl BuildTool for NixBuildTool {
    async fn check_available(&self) -> Result<()> {
        self.capture(&["--version"])
            .await
            .map(|_| ())
            .context("Nix not available")
    }

    async fn has_remote_builders(&self) -> bool {
        match self.capture(&["show-config"]).await {
            Ok(config) => config.contains("builders"),
            Err(_) => false,
        }
    }

    async fn build(&self, identifier: &str) -> Result<()> {
        let output = self.run(&["build", identifier, "--no-link"]).await?;
        if !output.status.success() {
            bail!(
                "nix build {} failed: {}",
                identifier,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    async fn output_path(&self, identifier: &str) -> Result<PathBuf> {
        let store_path = self.capture(&["eval", identifier, "--raw"]).await?;
        Ok(PathBuf::from(store_path))
    }

    async fn extension_version(&self) -> Result<String> {
        self.capture(&["run", ".#print-version"]).await
    }
}
