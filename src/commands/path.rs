//! `path` command - print the resolved extension path for this host.

use std::path::PathBuf;

use anyhow::Result;

use crate::platform::Platform;
use crate::resolver;
use crate::runtime::Runtime;

/// Resolve the bundled extension for the current host and print its path.
///
/// Prints the absolute path on stdout and returns Ok; a resolution failure
/// propagates so the process exits non-zero with the diagnostic on stderr.
pub fn run<R: Runtime>(runtime: &R, lib_dir: Option<PathBuf>) -> Result<()> {
    let lib_dir = lib_dir.unwrap_or_else(|| resolver::default_lib_dir(runtime));
    let lib_dir = if lib_dir.is_absolute() {
        lib_dir
    } else {
        runtime.current_dir()?.join(lib_dir)
    };

    let path = resolver::resolve_path(runtime, &lib_dir, &Platform::detect())?;
    println!("{}", path.display());
    Ok(())
}
