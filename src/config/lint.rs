//! `[lint]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[lint]` section in kiln.toml.
///
/// Templates and front matter are always checked. Scripts are only checked
/// when a linter command is configured.
///
/// # Example
/// ```toml
/// [lint]
/// scripts = ["jshint", "--reporter=unix"]
/// vendor = "vendor"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct LintConfig {
    /// Script linter command and leading arguments; file paths are appended.
    #[serde(default)]
    pub scripts: Vec<String>,

    /// Directory under assets excluded from script linting.
    #[serde(default = "defaults::lint::vendor")]
    #[educe(Default = defaults::lint::vendor())]
    pub vendor: PathBuf,
}
