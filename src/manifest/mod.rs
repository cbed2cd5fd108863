//! Production package-manifest generation.
//!
//! Overlays the project `package.json` with the production entry points and
//! bundled-files list, and puts a README next to it. Runs once per full
//! build, never at consumer runtime.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use serde_json::{Value, json};

use crate::runtime::Runtime;

/// Files the published package ships, beyond the bundled `lib/` artifacts
const PRODUCTION_FILES: [&str; 7] = [
    "index.js",
    "index.d.ts",
    "react-native.js",
    "react-native.d.ts",
    "lib/",
    "bin/",
    "README.md",
];

/// Script resolving the extension path for `npx` consumers
const BIN_SCRIPT: &str = "./bin/libcrsql-extension-path.js";

/// Conditional entry points of the published package. The `react-native`
/// condition maps to the always-fail stub module; everything else gets the
/// real resolver.
#[derive(Debug, Serialize)]
struct PackageExports {
    #[serde(rename = ".")]
    root: RootExport,
    #[serde(rename = "./react-native")]
    react_native: ReactNativeExport,
    #[serde(rename = "./package.json")]
    package_json: &'static str,
}

#[derive(Debug, Serialize)]
struct RootExport {
    #[serde(rename = "react-native")]
    react_native: &'static str,
    default: &'static str,
}

#[derive(Debug, Serialize)]
struct ReactNativeExport {
    import: &'static str,
    types: &'static str,
}

impl Default for PackageExports {
    fn default() -> Self {
        Self {
            root: RootExport {
                react_native: "./react-native.js",
                default: "./index.js",
            },
            react_native: ReactNativeExport {
                import: "./react-native.js",
                types: "./react-native.d.ts",
            },
            package_json: "./package.json",
        }
    }
}

/// Manifest action - assembles the production package metadata
pub struct ManifestAction<'a, R: Runtime> {
    runtime: &'a R,
    project_root: PathBuf,
    out_dir: PathBuf,
}

impl<'a, R: Runtime> ManifestAction<'a, R> {
    pub fn new(runtime: &'a R, project_root: PathBuf, out_dir: PathBuf) -> Self {
        Self {
            runtime,
            project_root,
            out_dir,
        }
    }

    /// Write the production `package.json` and README into the output tree
    pub fn generate(&self) -> Result<()> {
        self.write_package_json()?;
        self.write_readme()?;
        Ok(())
    }

    /// Overlay the project manifest with production fields: entry points,
    /// the react-native redirect export, bin aliases, and the files list.
    fn write_package_json(&self) -> Result<()> {
        info!("Generating production package.json");

        let manifest_path = self.project_root.join("package.json");
        let contents = self
            .runtime
            .read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        let mut pkg: Value =
            serde_json::from_str(&contents).context("Failed to parse package.json")?;

        let name = pkg
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("libcrsql")
            .to_string();

        let fields = pkg
            .as_object_mut()
            .context("package.json is not a JSON object")?;

        fields.insert("main".into(), json!("index.js"));
        fields.insert("types".into(), json!("index.d.ts"));
        fields.insert(
            "exports".into(),
            serde_json::to_value(PackageExports::default())?,
        );
        fields.insert(
            "bin".into(),
            json!({
                name: BIN_SCRIPT,
                "libcrsql-extension-path": BIN_SCRIPT,
            }),
        );
        fields.insert("files".into(), json!(PRODUCTION_FILES));

        let rendered = serde_json::to_string_pretty(&pkg)? + "\n";
        self.runtime
            .write(&self.out_dir.join("package.json"), rendered.as_bytes())
    }

    /// Copy the project README, or generate a basic one when missing
    fn write_readme(&self) -> Result<()> {
        let source = self.project_root.join("README.md");
        let contents = if self.runtime.exists(&source) {
            self.runtime.read_to_string(&source)?
        } else {
            BASIC_README.to_string()
        };
        self.runtime
            .write(&self.out_dir.join("README.md"), contents.as_bytes())
    }
}

const BASIC_README: &str = "# libcrsql

Prebuilt CR-SQLite extension for conflict-free replicated databases.

## Installation

```bash
npm install libcrsql
```

## Usage

```javascript
import { pathToCRSQLiteExtension } from 'libcrsql';
import sqlite3 from 'sqlite3';

const db = new sqlite3.Database(':memory:');
db.loadExtension(pathToCRSQLiteExtension);

// Now you can use CR-SQLite functions
db.run(\"SELECT crsql_as_crr('users')\");
```

## CLI

```bash
# Get path to extension
npx libcrsql-extension-path
```
";
