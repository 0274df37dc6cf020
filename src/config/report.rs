//! `[report]` section configuration.
//!
//! Drives the page-quality audit run by `kiln report`.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[report]` section in kiln.toml.
///
/// # Example
/// ```toml
/// [report]
/// urls = ["https://example.com/", "https://example.com/about.html"]
/// command = ["lighthouse"]
/// flags = ["--quiet", "--chrome-flags=--headless"]
/// output = "json"
/// dir = "reports"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Pages to audit.
    #[serde(default)]
    pub urls: Vec<String>,

    /// Audit command and leading arguments.
    #[serde(default = "defaults::report::command")]
    #[educe(Default = defaults::report::command())]
    pub command: Vec<String>,

    /// Extra flags passed after the url.
    #[serde(default = "defaults::report::flags")]
    #[educe(Default = defaults::report::flags())]
    pub flags: Vec<String>,

    /// Report format, also used as the file extension.
    #[serde(default = "defaults::report::output")]
    #[educe(Default = defaults::report::output())]
    pub output: String,

    /// Directory receiving one report per url.
    #[serde(default = "defaults::report::dir")]
    #[educe(Default = defaults::report::dir())]
    pub dir: PathBuf,
}
