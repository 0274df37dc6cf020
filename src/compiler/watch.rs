//! Build stages and the watch map that selects them.
//!
//! # Default Map
//!
//! ```text
//! assets/**/*.scss                    → styles
//! assets/**/*.js                      → scripts
//! assets/**/*.{png,jpg,gif,svg,webp}  → images
//! assets/**/*.{ttf,otf,eot,woff,woff2}→ fonts
//! uploads/**/*                        → uploads
//! content/**/*                        → pages
//! templates/**/*                      → pages
//! ```
//!
//! Each rule holds an ordered stage list. A batch of changed paths becomes a
//! deduplicated list of stage groups: groups run concurrently, the stages
//! inside one group run in order.

use crate::{
    compiler::{BuildReport, assets, pages},
    config::SiteConfig,
};
use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use wax::{Glob, Pattern};

// ============================================================================
// Stages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Styles,
    Scripts,
    Images,
    Fonts,
    Uploads,
    Pages,
}

impl Stage {
    /// Every stage of a full build.
    pub const ALL: [Self; 6] = [
        Self::Styles,
        Self::Scripts,
        Self::Images,
        Self::Fonts,
        Self::Uploads,
        Self::Pages,
    ];

    /// Name used for log prefixes and progress bars.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Images => "images",
            Self::Fonts => "fonts",
            Self::Uploads => "uploads",
            Self::Pages => "pages",
        }
    }

    /// Files this stage processes.
    pub fn inputs(self, config: &SiteConfig) -> Vec<PathBuf> {
        match self {
            Self::Styles => assets::style_inputs(config),
            Self::Scripts => assets::script_inputs(config),
            Self::Images => assets::image_inputs(config),
            Self::Fonts => assets::font_inputs(config),
            Self::Uploads => assets::upload_inputs(config),
            Self::Pages => pages::content_files(config),
        }
    }

    /// Process `files` (as returned by [`Stage::inputs`]).
    pub fn run(self, files: &[PathBuf], config: &SiteConfig, on_progress: impl Fn() + Sync) -> BuildReport {
        match self {
            Self::Styles => assets::build_styles(files, config, on_progress),
            Self::Scripts | Self::Images | Self::Fonts => {
                assets::copy_assets(files, config, on_progress)
            }
            Self::Uploads => assets::copy_uploads(files, config, on_progress),
            Self::Pages => {
                pages::build_pages(files, config, assets::script_entries(config), on_progress)
            }
        }
    }
}

// ============================================================================
// Watch Map
// ============================================================================

struct WatchRule {
    base: PathBuf,
    glob: Glob<'static>,
    stages: Vec<Stage>,
}

/// Glob patterns (relative to a base directory) mapped to stage lists.
pub struct WatchMap {
    rules: Vec<WatchRule>,
}

impl WatchMap {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule; `pattern` is matched against paths relative to `base`.
    pub fn rule(mut self, base: &Path, pattern: &str, stages: &[Stage]) -> Result<Self> {
        let glob = Glob::new(pattern)
            .map_err(|err| anyhow!("invalid watch pattern `{pattern}`: {err}"))?
            .into_owned();
        self.rules.push(WatchRule {
            base: base.to_path_buf(),
            glob,
            stages: stages.to_vec(),
        });
        Ok(self)
    }

    /// The default map over the configured source roots.
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let build = &config.build;
        Self::new()
            .rule(&build.assets, "**/*.scss", &[Stage::Styles])?
            .rule(&build.assets, "**/*.js", &[Stage::Scripts])?
            .rule(&build.assets, "**/*.{png,jpg,gif,svg,webp}", &[Stage::Images])?
            .rule(&build.assets, "**/*.{ttf,otf,eot,woff,woff2}", &[Stage::Fonts])?
            .rule(&build.uploads, "**/*", &[Stage::Uploads])?
            .rule(&build.content, "**/*", &[Stage::Pages])?
            .rule(&build.templates, "**/*", &[Stage::Pages])
    }

    /// Stage groups to rerun for a batch of changed paths, in rule order.
    ///
    /// Identical groups are merged, so one batch runs each group once.
    pub fn plan(&self, paths: &[PathBuf]) -> Vec<Vec<Stage>> {
        let mut groups: Vec<Vec<Stage>> = Vec::new();
        for rule in &self.rules {
            let hit = paths.iter().any(|path| {
                path.strip_prefix(&rule.base)
                    .is_ok_and(|rel| rule.glob.is_match(rel))
            });
            if hit && !groups.contains(&rule.stages) {
                groups.push(rule.stages.clone());
            }
        }
        groups
    }
}

impl Default for WatchMap {
    fn default() -> Self {
        Self::new()
    }
}
