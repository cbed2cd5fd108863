//! The fixed set of build targets this package ships binaries for.

/// File-name prefix shared by all bundled extension artifacts
pub const BASE_NAME: &str = "crsqlite";

/// One (OS, architecture) combination the package intends to support
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTarget {
    pub os: &'static str,
    pub arch: &'static str,
    /// OS-determined shared-library suffix
    pub extension: &'static str,
    /// Opaque handle the external build tool uses to select this target
    pub build_identifier: &'static str,
    /// Human-readable label
    pub description: &'static str,
}

impl PlatformTarget {
    /// Canonical artifact file name: `{baseName}-{os}-{arch}.{extension}`
    pub fn file_name(&self) -> String {
        format!("{}-{}-{}.{}", BASE_NAME, self.os, self.arch, self.extension)
    }

    /// Short `{os}-{arch}` label used in diagnostics
    pub fn pair(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

/// All targets built into the published package, in build order
pub static PLATFORM_TARGETS: [PlatformTarget; 4] = [
    PlatformTarget {
        os: "linux",
        arch: "x86_64",
        extension: "so",
        build_identifier: ".#packages.x86_64-linux.cr-sqlite",
        description: "Intel/AMD Linux (Docker, most servers)",
    },
    PlatformTarget {
        os: "linux",
        arch: "aarch64",
        extension: "so",
        build_identifier: ".#packages.aarch64-linux.cr-sqlite",
        description: "ARM64 Linux (Raspberry Pi 4+, AWS Graviton)",
    },
    PlatformTarget {
        os: "darwin",
        arch: "x86_64",
        extension: "dylib",
        build_identifier: ".#packages.x86_64-darwin.cr-sqlite",
        description: "Intel Mac",
    },
    PlatformTarget {
        os: "darwin",
        arch: "aarch64",
        extension: "dylib",
        build_identifier: ".#packages.aarch64-darwin.cr-sqlite",
        description: "Apple Silicon Mac (M1/M2/M3)",
    },
];
