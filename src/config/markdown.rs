//! `[markdown]` section configuration.
//!
//! Toggles for CommonMark extensions used when rendering markdown bodies.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[markdown]` section in kiln.toml.
///
/// # Example
/// ```toml
/// [markdown]
/// tables = true
/// smart_punctuation = false
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct MarkdownConfig {
    /// GitHub-style tables.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub tables: bool,

    /// Footnote references and definitions.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub footnotes: bool,

    /// `~~strikethrough~~`.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub strikethrough: bool,

    /// `- [x]` task list items.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub tasklists: bool,

    /// Curly quotes, dashes and ellipses.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub smart_punctuation: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_markdown_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert!(config.markdown.tables);
        assert!(!config.markdown.footnotes);
        assert!(config.markdown.strikethrough);
        assert!(!config.markdown.smart_punctuation);
    }

    #[test]
    fn test_markdown_config_override() {
        let config: SiteConfig = toml::from_str(
            r#"
            [markdown]
            tables = false
            footnotes = true
        "#,
        )
        .unwrap();

        assert!(!config.markdown.tables);
        assert!(config.markdown.footnotes);
    }
}
