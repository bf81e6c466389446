//! `soy.json` project configuration (SPEC_FULL.md §2.4), loaded the way the
//! teacher loads `angular.json`: a thin `serde` struct, CLI flags override
//! whatever it sets field-by-field. The core crate never reads this file
//! itself — only `soy-cli` does, then passes plain values into `Compiler`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SoyConfig {
    /// Directories to scan for `.soy` files, relative to the config file.
    #[serde(default)]
    pub source_roots: Vec<String>,

    /// `.proto` descriptor-set file paths, for proto-typed params (spec.md §3.3).
    #[serde(default)]
    pub proto_descriptors: Vec<String>,

    /// Default `{template autoescape="..."}` mode when a template omits one.
    pub default_autoescape: Option<String>,

    /// Conformance rule file paths (spec.md §4.6's conformance checks).
    #[serde(default)]
    pub conformance_rules: Vec<String>,
}

impl SoyConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        let config: SoyConfig = serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))?;
        Ok(config)
    }
}
