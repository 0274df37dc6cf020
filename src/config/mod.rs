//! Site configuration management for `kiln.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                         |
//! |--------------|-------------------------------------------------|
//! | `[site]`     | Free-form values exposed to templates as `site` |
//! | `[build]`    | Source roots, target, page defaults, minify     |
//! | `[markdown]` | CommonMark extension toggles                    |
//! | `[serve]`    | Development server (interface, port, watch)     |
//! | `[lint]`     | Optional script linter                          |
//! | `[report]`   | Page-quality audit urls and flags               |
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "My Blog"
//! url = "https://example.com"
//!
//! [build]
//! content = "content"
//! target = "public"
//! default_template = "page.html"
//!
//! [serve]
//! port = 3000
//! ```

mod build;
pub mod defaults;
mod error;
mod handle;
mod lint;
mod markdown;
mod report;
mod serve;

use error::ConfigError;
pub use handle::{cfg, init_config, reload_config};
pub use markdown::MarkdownConfig;

use build::BuildConfig;
use lint::LintConfig;
use report::ReportConfig;
use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Debug run (no `--production`): no minification, dev-server site url.
    #[serde(skip)]
    #[educe(Default = true)]
    pub debug: bool,

    /// Values exposed to templates as `site.*`
    #[serde(default)]
    pub site: toml::Table,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Markdown rendering options
    #[serde(default)]
    pub markdown: MarkdownConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Lint settings
    #[serde(default)]
    pub lint: LintConfig,

    /// Audit report settings
    #[serde(default)]
    pub report: ReportConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load, resolve and validate the config for a CLI invocation.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        if !config_path.exists() {
            bail!(ConfigError::Validation(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }

        let mut config = Self::from_path(&config_path)?;
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);
        self.debug = !cli.production;

        let root = cli
            .root
            .as_ref()
            .cloned()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.update_path_with_root(&root, &cli.config);

        if let Some(args) = cli.serve_args() {
            Self::update_option(&mut self.serve.interface, args.interface.as_ref());
            Self::update_option(&mut self.serve.port, args.port.as_ref());
        }

        // Debug runs link against the dev server instead of the public url
        if self.debug {
            let url = format!("http://{}:{}", self.serve.interface, self.serve.port);
            self.site.insert("url".into(), toml::Value::String(url));
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config_name: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config_name));

        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.templates = Self::normalize_path(&root.join(&self.build.templates));
        self.build.assets = Self::normalize_path(&root.join(&self.build.assets));
        self.build.uploads = Self::normalize_path(&root.join(&self.build.uploads));
        self.build.target = Self::normalize_path(&root.join(&self.build.target));
        self.report.dir = Self::normalize_path(&root.join(&self.report.dir));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        let Some(cli) = self.cli else {
            return Ok(());
        };

        match &cli.command {
            Commands::Build | Commands::Watch { .. } | Commands::Lint => {
                if !self.build.templates.is_dir() {
                    bail!(ConfigError::Validation(format!(
                        "[build.templates] not found: {}",
                        self.build.templates.display()
                    )));
                }
                self.check_target()?;
                if matches!(cli.command, Commands::Lint) && !self.lint.scripts.is_empty() {
                    Self::check_command_installed("[lint.scripts]", &self.lint.scripts)?;
                }
            }
            Commands::Report => {
                self.validate_report_urls()?;
                Self::check_command_installed("[report.command]", &self.report.command)?;
            }
            Commands::Clean => self.check_target()?,
            Commands::Serve { .. } => {}
        }

        Ok(())
    }

    /// The target is wiped by `clean`, so it must not hold the project root
    /// or any source root.
    pub fn check_target(&self) -> Result<()> {
        let target = &self.build.target;
        if target == self.get_root() {
            bail!(ConfigError::Validation(
                "[build.target] must not be the project root".into()
            ));
        }

        let sources = [
            ("the project root", self.get_root()),
            ("[build.content]", self.build.content.as_path()),
            ("[build.templates]", self.build.templates.as_path()),
            ("[build.assets]", self.build.assets.as_path()),
            ("[build.uploads]", self.build.uploads.as_path()),
        ];
        if let Some((name, _)) = sources.iter().find(|(_, dir)| dir.starts_with(target)) {
            bail!(ConfigError::Validation(format!(
                "[build.target] must not contain {name}: {}",
                target.display()
            )));
        }
        Ok(())
    }

    /// Every report url must be an absolute http(s) url.
    fn validate_report_urls(&self) -> Result<()> {
        if self.report.urls.is_empty() {
            bail!(ConfigError::Validation("[report.urls] is empty".into()));
        }
        if let Some(url) = self
            .report
            .urls
            .iter()
            .find(|url| !url.starts_with("http://") && !url.starts_with("https://"))
        {
            bail!(ConfigError::Validation(format!(
                "[report.urls] must start with http:// or https://, got `{url}`"
            )));
        }
        if self.report.output.is_empty() {
            bail!(ConfigError::Validation("[report.output] is empty".into()));
        }
        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        };

        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
