use assert_cmd::Command;
use assert_cmd::cargo;
use std::fs;
use tempfile::tempdir;

fn host_os() -> &'static str {
    if cfg!(target_os = "macos") { "darwin" } else { "linux" }
}

fn host_arch() -> &'static str {
    if cfg!(target_arch = "aarch64") {
        "aarch64"
    } else {
        "x86_64"
    }
}

fn host_ext() -> &'static str {
    if cfg!(target_os = "macos") { "dylib" } else { "so" }
}

fn exact_name() -> String {
    format!("crsqlite-{}-{}.{}", host_os(), host_arch(), host_ext())
}

fn libcrsql() -> Command {
    Command::new(cargo::cargo_bin!("libcrsql"))
}

#[test]
fn test_path_prefers_exact_match_over_generic() {
    let lib_dir = tempdir().unwrap();

    // A generic decoy next to the exact match: the exact match must win
    fs::write(lib_dir.path().join(format!("crsqlite.{}", host_ext())), b"decoy").unwrap();
    let exact = lib_dir.path().join(exact_name());
    fs::write(&exact, b"exact").unwrap();

    libcrsql()
        .arg("path")
        .arg("--lib-dir")
        .arg(lib_dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains(exact_name()));
}

#[test]
fn test_path_falls_back_to_generic() {
    let lib_dir = tempdir().unwrap();

    let generic = format!("crsqlite.{}", host_ext());
    fs::write(lib_dir.path().join(&generic), b"generic").unwrap();

    libcrsql()
        .arg("path")
        .arg("--lib-dir")
        .arg(lib_dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains(generic));
}

#[test]
fn test_path_cross_extension_fallback() {
    // A lone artifact with the other OS's suffix still resolves: the
    // hardcoded .dylib/.so fallback pair is explicit, not an omission.
    let lib_dir = tempdir().unwrap();

    let opposite = if cfg!(target_os = "macos") {
        "crsqlite.so"
    } else {
        "crsqlite.dylib"
    };
    fs::write(lib_dir.path().join(opposite), b"other-os").unwrap();

    libcrsql()
        .arg("path")
        .arg("--lib-dir")
        .arg(lib_dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains(opposite));
}

#[test]
fn test_path_empty_dir_fails_with_expected_name() {
    let lib_dir = tempdir().unwrap();

    libcrsql()
        .arg("path")
        .arg("--lib-dir")
        .arg(lib_dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains(exact_name()))
        .stderr(predicates::str::contains(format!(
            "not found for {}/{}",
            host_os(),
            host_arch()
        )));
}

#[test]
fn test_path_reports_bundled_platforms_on_failure() {
    let lib_dir = tempdir().unwrap();

    // Bundle an artifact for some pair other than the host's
    let other_pair = if host_os() == "linux" && host_arch() == "x86_64" {
        "linux-aarch64"
    } else {
        "linux-x86_64"
    };
    fs::write(
        lib_dir.path().join(format!("crsqlite-{}.so", other_pair)),
        b"wrong-platform",
    )
    .unwrap();

    libcrsql()
        .arg("path")
        .arg("--lib-dir")
        .arg(lib_dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains(other_pair));
}

#[test]
fn test_path_lib_dir_from_env() {
    let lib_dir = tempdir().unwrap();
    let exact = lib_dir.path().join(exact_name());
    fs::write(&exact, b"exact").unwrap();

    libcrsql()
        .arg("path")
        .env("LIBCRSQL_LIB_DIR", lib_dir.path())
        .assert()
        .success()
        .stdout(predicates::str::contains(exact_name()));
}

#[test]
fn test_targets_lists_all_pairs() {
    libcrsql()
        .arg("targets")
        .assert()
        .success()
        .stdout(predicates::str::contains("linux-x86_64"))
        .stdout(predicates::str::contains("linux-aarch64"))
        .stdout(predicates::str::contains("darwin-x86_64"))
        .stdout(predicates::str::contains("crsqlite-darwin-aarch64.dylib"));
}

// --- bundle tests against a fake `nix` on PATH ---

#[cfg(unix)]
mod bundle {
    use super::*;
    use std::collections::BTreeMap;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    const TARGET_IDENTIFIERS: [(&str, &str); 4] = [
        (".#packages.x86_64-linux.cr-sqlite", "so"),
        (".#packages.aarch64-linux.cr-sqlite", "so"),
        (".#packages.x86_64-darwin.cr-sqlite", "dylib"),
        (".#packages.aarch64-darwin.cr-sqlite", "dylib"),
    ];

    /// Mirrors the fake tool's `sed 's/[^a-zA-Z0-9_-]//g'`
    fn sanitize(identifier: &str) -> String {
        identifier
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect()
    }

    /// A stub `nix` standing in for the real build tool. Understands the
    /// exact invocations the bundler makes; builds for identifiers matching
    /// `fail_pattern` exit non-zero.
    fn write_fake_nix(bin_dir: &Path, fail_pattern: &str) {
        let script = format!(
            r#"#!/bin/sh
cmd="$1"
case "$cmd" in
  --version) echo "nix (Nix) 2.18.1"; exit 0 ;;
  show-config) echo "substituters = https://cache.example.org"; exit 0 ;;
  build)
    case "$2" in
      *{fail}*) echo "error: cannot build $2" >&2; exit 1 ;;
    esac
    exit 0 ;;
  eval)
    name=$(echo "$2" | sed 's/[^a-zA-Z0-9_-]//g')
    printf '%s/%s' "$STORE_ROOT" "$name"
    exit 0 ;;
  run) echo "0.16.3"; exit 0 ;;
esac
echo "fake nix: unexpected command $*" >&2
exit 1
"#,
            fail = fail_pattern
        );

        let nix_path = bin_dir.join("nix");
        fs::write(&nix_path, script).unwrap();
        fs::set_permissions(&nix_path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Populate a store directory per target, each holding one library file
    fn populate_stores(store_root: &Path) {
        for (identifier, ext) in TARGET_IDENTIFIERS {
            let lib_dir = store_root.join(sanitize(identifier)).join("lib");
            fs::create_dir_all(&lib_dir).unwrap();
            fs::write(
                lib_dir.join(format!("crsqlite.{}", ext)),
                format!("binary for {}", identifier),
            )
            .unwrap();
        }
    }

    fn path_with(bin_dir: &Path) -> String {
        format!(
            "{}:{}",
            bin_dir.display(),
            std::env::var("PATH").unwrap_or_default()
        )
    }

    fn write_project(project_root: &Path) {
        fs::write(
            project_root.join("package.json"),
            r#"{"name": "@effect-native/libcrsql", "version": "0.16.3-1"}"#,
        )
        .unwrap();
    }

    fn dist_lib_contents(out_dir: &Path) -> BTreeMap<String, Vec<u8>> {
        fs::read_dir(out_dir.join("lib"))
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                (
                    entry.file_name().to_string_lossy().into_owned(),
                    fs::read(entry.path()).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_bundle_continues_past_failed_target() {
        let bin_dir = tempdir().unwrap();
        let store_root = tempdir().unwrap();
        let project = tempdir().unwrap();

        // The darwin/aarch64 build fails; the other three must still land
        write_fake_nix(bin_dir.path(), "aarch64-darwin");
        populate_stores(store_root.path());
        write_project(project.path());

        let out_dir = project.path().join("dist");
        libcrsql()
            .arg("bundle")
            .arg("--project-root")
            .arg(project.path())
            .arg("--out-dir")
            .arg(&out_dir)
            .env("PATH", path_with(bin_dir.path()))
            .env("STORE_ROOT", store_root.path())
            .assert()
            .success()
            .stdout(predicates::str::contains("Built 3/4"))
            .stderr(predicates::str::contains("Missing"));

        let bundled = dist_lib_contents(&out_dir);
        assert_eq!(bundled.len(), 3);
        assert!(bundled.contains_key("crsqlite-linux-x86_64.so"));
        assert!(bundled.contains_key("crsqlite-linux-aarch64.so"));
        assert!(bundled.contains_key("crsqlite-darwin-x86_64.dylib"));
        assert!(!bundled.contains_key("crsqlite-darwin-aarch64.dylib"));

        // Manifest generated alongside the artifacts
        let manifest = fs::read_to_string(out_dir.join("package.json")).unwrap();
        assert!(manifest.contains("react-native"));
        assert!(manifest.contains("libcrsql-extension-path"));
        assert!(out_dir.join("README.md").exists());
    }

    #[test]
    fn test_bundle_is_idempotent() {
        let bin_dir = tempdir().unwrap();
        let store_root = tempdir().unwrap();
        let project = tempdir().unwrap();

        write_fake_nix(bin_dir.path(), "never-matches");
        populate_stores(store_root.path());
        write_project(project.path());

        let out_dir = project.path().join("dist");
        libcrsql()
            .arg("bundle")
            .arg("--project-root")
            .arg(project.path())
            .arg("--out-dir")
            .arg(&out_dir)
            .env("PATH", path_with(bin_dir.path()))
            .env("STORE_ROOT", store_root.path())
            .assert()
            .success()
            .stdout(predicates::str::contains("Built 4/4"));

        let first = dist_lib_contents(&out_dir);

        libcrsql()
            .arg("bundle")
            .arg("--project-root")
            .arg(project.path())
            .arg("--out-dir")
            .arg(&out_dir)
            .env("PATH", path_with(bin_dir.path()))
            .env("STORE_ROOT", store_root.path())
            .assert()
            .success();

        // Byte-identical output file set run over run
        assert_eq!(first, dist_lib_contents(&out_dir));
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_bundle_fails_when_no_target_builds() {
        let bin_dir = tempdir().unwrap();
        let store_root = tempdir().unwrap();
        let project = tempdir().unwrap();

        // Every build identifier contains "cr-sqlite", so every build fails
        write_fake_nix(bin_dir.path(), "cr-sqlite");
        write_project(project.path());

        libcrsql()
            .arg("bundle")
            .arg("--project-root")
            .arg(project.path())
            .arg("--out-dir")
            .arg(project.path().join("dist"))
            .env("PATH", path_with(bin_dir.path()))
            .env("STORE_ROOT", store_root.path())
            .assert()
            .failure()
            .stderr(predicates::str::contains(
                "No platform extensions could be built",
            ));
    }

    #[test]
    fn test_bundled_output_resolves_for_host() {
        // End of the pipeline: what bundle writes, path finds.
        let bin_dir = tempdir().unwrap();
        let store_root = tempdir().unwrap();
        let project = tempdir().unwrap();

        write_fake_nix(bin_dir.path(), "never-matches");
        populate_stores(store_root.path());
        write_project(project.path());

        let out_dir = project.path().join("dist");
        libcrsql()
            .arg("bundle")
            .arg("--project-root")
            .arg(project.path())
            .arg("--out-dir")
            .arg(&out_dir)
            .env("PATH", path_with(bin_dir.path()))
            .env("STORE_ROOT", store_root.path())
            .assert()
            .success();

        libcrsql()
            .arg("path")
            .arg("--lib-dir")
            .arg(out_dir.join("lib"))
            .assert()
            .success()
            .stdout(predicates::str::contains(exact_name()));
    }

    #[test]
    fn test_sync_version_updates_manifest() {
        let bin_dir = tempdir().unwrap();
        let project = tempdir().unwrap();

        // Fake nix reports upstream 0.16.3; the project packages 0.15.0
        write_fake_nix(bin_dir.path(), "never-matches");
        fs::write(
            project.path().join("package.json"),
            r#"{"name": "@effect-native/libcrsql", "version": "0.15.0-3"}"#,
        )
        .unwrap();

        libcrsql()
            .arg("sync-version")
            .arg("--project-root")
            .arg(project.path())
            .env("PATH", path_with(bin_dir.path()))
            .assert()
            .success()
            .stdout(predicates::str::contains("0.15.0-3 -> 0.16.3-1"));

        let manifest = fs::read_to_string(project.path().join("package.json")).unwrap();
        assert!(manifest.contains("\"version\": \"0.16.3-1\""));
    }

    #[test]
    fn test_sync_version_keeps_matching_version() {
        let bin_dir = tempdir().unwrap();
        let project = tempdir().unwrap();

        write_fake_nix(bin_dir.path(), "never-matches");
        let original = r#"{"name": "@effect-native/libcrsql", "version": "0.16.3-2"}"#;
        fs::write(project.path().join("package.json"), original).unwrap();

        libcrsql()
            .arg("sync-version")
            .arg("--project-root")
            .arg(project.path())
            .env("PATH", path_with(bin_dir.path()))
            .assert()
            .success()
            .stdout(predicates::str::contains("keeping current version"));

        // Packaging-revision suffix survives untouched
        let manifest = fs::read_to_string(project.path().join("package.json")).unwrap();
        assert_eq!(manifest, original);
    }
}
