//! Extension path resolution.
//!
//! One resolver function serves the CLI, the library entry point, and any
//! generated artifact alike: given a library directory and the host platform,
//! pick the bundled binary by a strict candidate priority, or fail with a
//! diagnostic error. No scoring, no "best match".

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, info};

use crate::platform::{self, BASE_NAME, PLATFORM_TARGETS, Platform};
use crate::runtime::{RealRuntime, Runtime};

/// Environment variable overriding the library directory
pub const LIB_DIR_ENV: &str = "LIBCRSQL_LIB_DIR";

/// Resolution failure. Never recovered silently: handing back a
/// wrong-architecture binary would corrupt the consuming process.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// No bundled extension matches the detected platform
    NotFound {
        os: String,
        arch: String,
        /// Canonical file name the detected platform expects
        expected: String,
        /// `{os}-{arch}` pairs actually bundled in the library directory
        available: Vec<String>,
    },
    /// The host cannot load native extensions at all (browser/wasm)
    UnsupportedEnvironment,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::NotFound {
                os,
                arch,
                expected,
                available,
            } => {
                let available = if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                };
                let supported: Vec<&str> =
                    PLATFORM_TARGETS.iter().map(|t| t.description).collect();
                write!(
                    f,
                    "CR-SQLite extension not found for {}/{}. Expected: {}. \
                     Available platforms: {}. This package supports: {}",
                    os,
                    arch,
                    expected,
                    available,
                    supported.join(", ")
                )
            }
            ResolveError::UnsupportedEnvironment => {
                write!(
                    f,
                    "libcrsql is for Node.js / Bun / native server environments only. \
                     For browsers, use sql.js or a server-side database API."
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Candidate paths in strict priority order (first existing file wins):
///
/// 1. `crsqlite-{os}-{arch}.{ext}` - exact platform+arch match
/// 2. `crsqlite.{ext}` - generic for the current OS
/// 3. `crsqlite.dylib` - hardcoded macOS fallback
/// 4. `crsqlite.so` - hardcoded Linux fallback
///
/// The cross-extension entries 3 and 4 are checked even when they cannot
/// match the detected OS. That order is deliberate lenience inherited from
/// the packaged consumers and is pending product-owner confirmation; do not
/// remove it.
pub fn candidates(lib_dir: &Path, platform: &Platform) -> [PathBuf; 4] {
    let ext = platform.lib_extension();
    [
        lib_dir.join(format!(
            "{}-{}-{}.{}",
            BASE_NAME, platform.os, platform.arch, ext
        )),
        lib_dir.join(format!("{}.{}", BASE_NAME, ext)),
        lib_dir.join(format!("{}.dylib", BASE_NAME)),
        lib_dir.join(format!("{}.so", BASE_NAME)),
    ]
}

/// Resolve the on-disk path of the bundled extension for `platform`.
///
/// Evaluation is a pure existence check per candidate; file contents are not
/// validated (a wrong binary surfaces when the consumer loads it).
#[tracing::instrument(skip(runtime))]
pub fn resolve_path<R: Runtime>(
    runtime: &R,
    lib_dir: &Path,
    platform: &Platform,
) -> Result<PathBuf, ResolveError> {
    if !platform::is_native_host() {
        return Err(ResolveError::UnsupportedEnvironment);
    }

    for candidate in candidates(lib_dir, platform) {
        debug!("Checking candidate: {}", candidate.display());
        if runtime.exists(&candidate) {
            info!("Resolved extension: {}", candidate.display());
            return Ok(candidate);
        }
    }

    Err(ResolveError::NotFound {
        os: platform.os.clone(),
        arch: platform.arch.clone(),
        expected: format!(
            "{}-{}-{}.{}",
            BASE_NAME,
            platform.os,
            platform.arch,
            platform.lib_extension()
        ),
        available: bundled_platforms(runtime, lib_dir),
    })
}

/// Scan the library directory for canonical artifact names and report which
/// `{os}-{arch}` pairs are actually bundled. Diagnostic only; scan failures
/// degrade to an empty list.
pub fn bundled_platforms<R: Runtime>(runtime: &R, lib_dir: &Path) -> Vec<String> {
    let entries = match runtime.read_dir(lib_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    PLATFORM_TARGETS
        .iter()
        .filter(|target| {
            entries.iter().any(|entry| {
                entry.file_name().and_then(|n| n.to_str()) == Some(target.file_name().as_str())
            })
        })
        .map(|target| target.pair())
        .collect()
}

/// Library directory used when the caller does not name one: the
/// `LIBCRSQL_LIB_DIR` override, else `lib/` beside the current executable if
/// present, else `dist/lib` under the current directory.
pub fn default_lib_dir<R: Runtime>(runtime: &R) -> PathBuf {
    if let Ok(dir) = runtime.env_var(LIB_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Ok(exe) = runtime.current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let beside = exe_dir.join("lib");
            if runtime.is_dir(&beside) {
                return beside;
            }
        }
    }

    match runtime.current_dir() {
        Ok(cwd) => cwd.join("dist").join("lib"),
        Err(_) => PathBuf::from("dist/lib"),
    }
}

/// Process-wide resolution, computed on first use and cached.
///
/// The library directory is static post-build, so the cached value is never
/// invalidated for the lifetime of the process.
pub fn extension_path() -> Result<&'static Path, ResolveError> {
    static RESOLVED: OnceLock<Result<PathBuf, ResolveError>> = OnceLock::new();

    RESOLVED
        .get_or_init(|| {
            let runtime = RealRuntime;
            let lib_dir = default_lib_dir(&runtime);
            resolve_path(&runtime, &lib_dir, &Platform::detect())
        })
        .as_ref()
        .map(|path| path.as_path())
        .map_err(|err| err.clone())
}
