use anyhow::Result;
use clap::Parser;
use libcrsql::builder::{DEFAULT_JOBS, tool::NixBuildTool};
use libcrsql::runtime::RealRuntime;
use std::path::PathBuf;

/// libcrsql - CR-SQLite extension bundler and resolver
///
/// Bundles prebuilt CR-SQLite native extensions for every supported
/// platform/architecture pair and resolves the right binary for this host.
///
/// Examples:
///   libcrsql path      # Print the extension path for this host
///   libcrsql bundle    # Build and package all platform extensions
#[derive(Parser, Debug)]
#[command(author, version = env!("LIBCRSQL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the absolute path of the bundled extension for this host
    Path(PathArgs),

    /// Build extensions for all platforms and assemble the production package
    Bundle(BundleArgs),

    /// List the platform targets this package ships
    Targets,

    /// Sync the package version with the upstream CR-SQLite version
    SyncVersion(SyncVersionArgs),
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Library directory holding the bundled extensions (also via LIBCRSQL_LIB_DIR)
    #[arg(long = "lib-dir", env = "LIBCRSQL_LIB_DIR", value_name = "PATH")]
    pub lib_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct BundleArgs {
    /// Project root containing package.json
    #[arg(long = "project-root", value_name = "PATH", default_value = ".")]
    pub project_root: PathBuf,

    /// Output directory for the production package
    #[arg(long = "out-dir", value_name = "PATH", default_value = "dist")]
    pub out_dir: PathBuf,

    /// Number of concurrent target builds
    #[arg(long = "jobs", short = 'j', value_name = "N", default_value_t = DEFAULT_JOBS)]
    pub jobs: usize,
}

#[derive(clap::Args, Debug)]
pub struct SyncVersionArgs {
    /// Project root containing package.json
    #[arg(long = "project-root", value_name = "PATH", default_value = ".")]
    pub project_root: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    match cli.command {
        Commands::Path(args) => libcrsql::commands::path::run(&runtime, args.lib_dir),
        Commands::Bundle(args) => {
            let tool = NixBuildTool;
            libcrsql::commands::bundle::run(
                &runtime,
                &tool,
                args.project_root,
                args.out_dir,
                args.jobs,
            )
            .await
        }
        Commands::Targets => {
            libcrsql::commands::targets::run();
            Ok(())
        }
        Commands::SyncVersion(args) => {
            let tool = NixBuildTool;
            libcrsql::commands::sync_version::run(&runtime, &tool, args.project_root).await
        }
    }
}
