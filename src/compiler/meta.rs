//! Content file and page metadata types.
//!
//! # Paths
//!
//! ```text
//! content/posts/2021/launch.md      (source)
//!         └───────────────────┘     relative (to content root)
//!               └────────────┘      post path (to posts dir)
//!
//! public/posts/2021/launch.html     (output, extension rewritten)
//! /posts/2021/launch                (url = url_prefix + post path, no ext)
//! ```

use crate::{compiler::frontmatter::Metadata, config::SiteConfig, utils::date};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

// ============================================================================
// Page Metadata
// ============================================================================

/// Front matter fields the pipeline understands, plus everything else.
///
/// Serialized as `page` in the template context, so unknown fields stay
/// reachable through `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub title: Option<String>,

    /// Template used to render the page, relative to the template root.
    #[serde(default, deserialize_with = "optional_scalar")]
    pub layout: Option<String>,

    /// Output extension override (without dot).
    #[serde(default, deserialize_with = "optional_scalar")]
    pub filetype: Option<String>,

    /// Either `tags: a` or `tags: [a, b]`.
    #[serde(default, deserialize_with = "string_or_list")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "optional_scalar")]
    pub category: Option<String>,

    /// Date as written in front matter.
    #[serde(default, deserialize_with = "optional_scalar")]
    pub date: Option<String>,

    /// Derived site url, overwrites any `url` field.
    #[serde(default)]
    pub url: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Parsed `date`, used to order posts.
    #[serde(skip)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PageMeta {
    /// Build from an extracted front matter mapping.
    pub fn from_metadata(metadata: Metadata) -> Result<Self> {
        let mut meta: Self = serde_json::from_value(Value::Object(metadata))
            .context("Invalid front matter field")?;

        meta.timestamp = meta
            .date
            .as_deref()
            .map(date::parse)
            .transpose()
            .context("Invalid `date` field")?;

        Ok(meta)
    }
}

/// A YAML scalar read as text (`title: 1984`, `tags: [2021, rust]`).
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(text) => text,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ScalarOrList {
        One(Scalar),
        Many(Vec<Scalar>),
    }

    Ok(match Option::<ScalarOrList>::deserialize(deserializer)? {
        Some(ScalarOrList::One(tag)) => vec![tag.into()],
        Some(ScalarOrList::Many(tags)) => tags.into_iter().map(String::from).collect(),
        None => Vec::new(),
    })
}

// ============================================================================
// Content File
// ============================================================================

/// Whether a content file is collected into `site.posts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Post,
    Page,
}

/// A content file moving through the page pipeline.
///
/// `body` starts as the text after the front matter and is replaced by each
/// stage's output; `output` has its extension rewritten when rendered.
#[derive(Debug, Clone)]
pub struct ContentFile {
    pub source: PathBuf,
    /// Path relative to the content root.
    pub relative: PathBuf,
    pub output: PathBuf,
    pub kind: ContentKind,
    pub meta: Arc<PageMeta>,
    pub body: String,
}

impl ContentFile {
    /// Resolve paths and kind for `source` under the content root.
    pub fn new(source: &Path, meta: PageMeta, body: String, config: &SiteConfig) -> Result<Self> {
        let relative = source
            .strip_prefix(&config.build.content)
            .with_context(|| format!("File is not in content directory: {}", source.display()))?
            .to_path_buf();

        let kind = if source.starts_with(config.build.posts_dir()) {
            ContentKind::Post
        } else {
            ContentKind::Page
        };

        Ok(Self {
            source: source.to_path_buf(),
            output: config.build.target.join(&relative),
            relative,
            kind,
            meta: Arc::new(meta),
            body,
        })
    }

    /// Rewrite the output extension (`md` → `html`, template ext, ...).
    pub fn set_extension(&mut self, ext: &str) {
        self.output.set_extension(ext);
    }

    /// Path of this file relative to `base` with the extension removed,
    /// joined with `/`.
    pub fn stem_path(&self, base: &Path) -> String {
        let rel = self.source.strip_prefix(base).unwrap_or(&self.relative);
        let stemmed = rel.with_extension("");
        stemmed
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Join a url prefix and a slash separated path.
pub fn join_url(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        format!("/{path}")
    } else if prefix.starts_with('/') || prefix.contains("://") {
        format!("{prefix}/{path}")
    } else {
        format!("/{prefix}/{path}")
    }
}

// ============================================================================
// Tests
// ============================================================================
