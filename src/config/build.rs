//! `[build]` section configuration.
//!
//! Contains source roots, the target root, page defaults and minify toggles.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in kiln.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"              # Content pages and posts
/// templates = "templates"          # Layouts and partials
/// target = "public"                # Output directory
/// default_template = "page.html"   # Layout for pages without `layout`
///
/// [build.scripts]
/// debug = ["main.js", "debug.js"]
/// production = ["main.js"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content source directory (markdown and html pages).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Template root; layouts and partials are resolved relative to it.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Static assets directory (styles, scripts, images, fonts).
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// User uploads, copied verbatim.
    #[serde(default = "defaults::build::uploads")]
    #[educe(Default = defaults::build::uploads())]
    pub uploads: PathBuf,

    /// Build output directory. Wiped on every full build.
    #[serde(default = "defaults::build::target")]
    #[educe(Default = defaults::build::target())]
    pub target: PathBuf,

    /// Subdirectory of `content` whose files are posts.
    /// Posts are collected into `site.posts`; everything else is a page.
    #[serde(default = "defaults::build::posts")]
    #[educe(Default = defaults::build::posts())]
    pub posts: PathBuf,

    /// URL prefix joined with a post's path to form `page.url`.
    #[serde(default = "defaults::build::url_prefix")]
    #[educe(Default = defaults::build::url_prefix())]
    pub url_prefix: String,

    /// Category assigned to posts without a `category` field.
    #[serde(default = "defaults::build::default_category")]
    #[educe(Default = defaults::build::default_category())]
    pub default_category: String,

    /// Layout used when front matter has no `layout` field.
    #[serde(default = "defaults::build::default_template")]
    #[educe(Default = defaults::build::default_template())]
    pub default_template: Option<String>,

    /// File extensions rendered through markdown.
    #[serde(default = "defaults::build::markdown_extensions")]
    #[educe(Default = defaults::build::markdown_extensions())]
    pub markdown_extensions: Vec<String>,

    /// File extensions registered as templates; other files under the
    /// template root are ignored.
    #[serde(default = "defaults::build::template_extensions")]
    #[educe(Default = defaults::build::template_extensions())]
    pub template_extensions: Vec<String>,

    /// Minify html output in production runs.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Style compilation settings.
    #[serde(default)]
    pub styles: StylesConfig,

    /// Per-environment script entries.
    #[serde(default)]
    pub scripts: ScriptsConfig,
}

impl BuildConfig {
    /// Absolute directory holding posts.
    pub fn posts_dir(&self) -> PathBuf {
        self.content.join(&self.posts)
    }

    /// Check whether an extension (without dot) is rendered as markdown.
    pub fn is_markdown(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.markdown_extensions
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(ext))
            })
    }
}

// ============================================================================
// Sub-configurations
// ============================================================================

/// `[build.styles]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct StylesConfig {
    /// Emit compressed css in production runs.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,
}

/// `[build.scripts]` section
///
/// Entries are paths relative to the assets root. An empty list for the
/// current environment means every top-level `*.js` file is an entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptsConfig {
    /// Entries for debug runs.
    #[serde(default)]
    pub debug: Vec<String>,

    /// Entries for production runs.
    #[serde(default)]
    pub production: Vec<String>,
}

impl ScriptsConfig {
    /// Entries for the given mode.
    pub fn entries(&self, debug: bool) -> &[String] {
        if debug { &self.debug } else { &self.production }
    }
}
