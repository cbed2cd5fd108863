//! Host platform detection for extension resolution.

mod target;

pub use target::{BASE_NAME, PLATFORM_TARGETS, PlatformTarget};

/// Platform information for extension resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// Detection uses exactly two OS buckets (`darwin`, anything else ->
    /// `linux`) and two arch buckets (`aarch64`-class -> `aarch64`, anything
    /// else -> `x86_64`). Hosts outside {darwin, linux} x {x86_64, aarch64}
    /// are bucketed into the nearest of the four, which may yield a wrong or
    /// missing resolution. A known limitation, not a bug.
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
            arch: Self::detect_arch(),
        }
    }

    fn detect_os() -> String {
        #[cfg(target_os = "macos")]
        {
            "darwin".to_string()
        }
        #[cfg(not(target_os = "macos"))]
        {
            "linux".to_string()
        }
    }

    fn detect_arch() -> String {
        #[cfg(target_arch = "aarch64")]
        {
            "aarch64".to_string()
        }
        #[cfg(not(target_arch = "aarch64"))]
        {
            "x86_64".to_string()
        }
    }

    /// Shared-library suffix for this platform's OS bucket
    pub fn lib_extension(&self) -> &'static str {
        lib_extension_for(&self.os)
    }
}

/// OS-determined shared-library suffix
pub fn lib_extension_for(os: &str) -> &'static str {
    if os == "darwin" { "dylib" } else { "so" }
}

/// Whether this process runs on a host that can load native extensions.
///
/// Browser/wasm builds cannot; resolution must fail fast there instead of
/// probing a filesystem that does not exist.
pub fn is_native_host() -> bool {
    !cfg!(target_family = "wasm")
}
