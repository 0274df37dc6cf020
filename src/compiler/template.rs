//! Layout rendering with `tera`.
//!
//! Every file with a template extension (`[build] template_extensions`) under
//! the template root is registered under its root-relative path
//! (`layouts/post.html`), so `{% extends %}` and `{% include %}` resolve
//! relative to the root. Debug runs reload templates on every render; other
//! runs compile them once.
//!
//! Autoescaping is on for `.html`/`.htm`/`.xml` templates: emit rendered
//! markup with `{{ content | safe }}`.

use crate::{
    compiler::{collect::SiteContext, collect_all_files, meta::PageMeta},
    config::{SiteConfig, defaults},
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::{
    error::Error as _,
    path::{Path, PathBuf},
    sync::Arc,
};
use tera::Tera;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{0}` not found in {1}")]
    NotFound(String, PathBuf),

    #[error("failed to load templates from {0}:\n  {1}")]
    Load(PathBuf, String),

    #[error("failed to render `{0}`:\n  {1}")]
    Render(String, String),
}

// ============================================================================
// Render Context
// ============================================================================

/// Build-mode values exposed to templates as `env`.
#[derive(Debug, Clone, Serialize)]
pub struct Env {
    pub debug: bool,
    pub production: bool,
    /// Script entries for this mode, relative to the assets root.
    pub scripts: Vec<String>,
}

impl Env {
    pub fn new(config: &SiteConfig, scripts: Vec<String>) -> Self {
        Self {
            debug: config.debug,
            production: !config.debug,
            scripts,
        }
    }
}

#[derive(Serialize)]
struct PageContext<'a> {
    #[serde(flatten)]
    meta: &'a PageMeta,
    content: &'a str,
}

/// Per-file template input: `page`, `content`, `site` and `env`.
#[derive(Serialize)]
pub struct RenderContext<'a> {
    page: PageContext<'a>,
    content: &'a str,
    site: &'a Value,
    env: &'a Env,
}

impl<'a> RenderContext<'a> {
    pub fn new(meta: &'a PageMeta, content: &'a str, site: &'a Value, env: &'a Env) -> Self {
        Self {
            page: PageContext { meta, content },
            content,
            site,
            env,
        }
    }
}

/// Merge `[site]` config values with the collected aggregates.
///
/// Built once per pages run and shared by every render.
pub fn site_value(config: &SiteConfig, site: &SiteContext) -> Value {
    let mut value = serde_json::to_value(&config.site)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Default::default()));

    if let (Value::Object(map), Ok(Value::Object(aggregates))) =
        (&mut value, serde_json::to_value(site))
    {
        map.extend(aggregates);
    }
    value
}

// ============================================================================
// Renderer
// ============================================================================

/// Resolves and renders layouts from a template root.
///
/// Only files with a template extension are registered, so notes or images
/// kept next to the layouts never break a render.
pub struct TemplateRenderer {
    root: PathBuf,
    extensions: Vec<String>,
    cache: bool,
    compiled: RwLock<Option<Arc<Tera>>>,
}

impl TemplateRenderer {
    /// `cache = false` re-reads template sources on every render.
    pub fn new(root: &Path, cache: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            extensions: defaults::build::template_extensions(),
            cache,
            compiled: RwLock::new(None),
        }
    }

    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions.to_vec();
        self
    }

    fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Compile every template under the root, reporting syntax errors.
    pub fn load(&self) -> Result<Tera, TemplateError> {
        let files = collect_all_files(&self.root)
            .into_iter()
            .filter(|path| self.is_template(path))
            .filter_map(|path| {
                let name = template_name(&self.root, &path)?;
                Some((path, Some(name)))
            })
            .collect::<Vec<_>>();

        let mut tera = Tera::default();
        tera.add_template_files(files)
            .map_err(|err| TemplateError::Load(self.root.clone(), describe(&err)))?;
        Ok(tera)
    }

    fn tera(&self) -> Result<Arc<Tera>, TemplateError> {
        if !self.cache {
            return self.load().map(Arc::new);
        }

        if let Some(tera) = self.compiled.read().as_ref() {
            return Ok(Arc::clone(tera));
        }

        let mut compiled = self.compiled.write();
        if let Some(tera) = compiled.as_ref() {
            return Ok(Arc::clone(tera));
        }
        let tera = Arc::new(self.load()?);
        *compiled = Some(Arc::clone(&tera));
        Ok(tera)
    }

    /// Registered template names.
    pub fn names(&self) -> Result<Vec<String>, TemplateError> {
        Ok(self.tera()?.get_template_names().map(str::to_owned).collect())
    }

    /// Render `name` (relative to the template root) with `context`.
    pub fn render(&self, name: &str, context: &RenderContext) -> Result<String, TemplateError> {
        let tera = self.tera()?;
        let name = name.trim_start_matches('/');

        if !tera.get_template_names().any(|n| n == name) {
            return Err(TemplateError::NotFound(name.to_owned(), self.root.clone()));
        }

        let context = tera::Context::from_serialize(context)
            .map_err(|err| TemplateError::Render(name.to_owned(), describe(&err)))?;
        tera.render(name, &context)
            .map_err(|err| TemplateError::Render(name.to_owned(), describe(&err)))
    }
}

/// Output extension for a rendered file: `filetype` override, else the
/// template's own extension.
pub fn output_extension<'a>(filetype: Option<&'a str>, template: &'a str) -> Option<&'a str> {
    filetype
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .or_else(|| Path::new(template).extension().and_then(|ext| ext.to_str()))
}

/// Root-relative template name with `/` separators.
fn template_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Flatten a tera error and its causes into one message.
fn describe(error: &tera::Error) -> String {
    let mut messages = vec![error.to_string()];
    let mut source = error.source();
    while let Some(err) = source {
        messages.push(err.to_string());
        source = err.source();
    }
    messages.join("\n  → ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn templates(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        dir
    }

    fn env() -> Env {
        Env {
            debug: true,
            production: false,
            scripts: vec!["main.js".into()],
        }
    }

    fn meta(title: &str) -> PageMeta {
        PageMeta {
            title: Some(title.into()),
            ..PageMeta::default()
        }
    }

    #[test]
    fn test_render_with_partials() {
        let dir = templates(&[
            ("base.html", "<main>{% block body %}{% endblock %}</main>{% include \"partials/foot.html\" %}"),
            ("page.html", "{% extends \"base.html\" %}{% block body %}<h1>{{ page.title }}</h1>{{ content | safe }}{% endblock %}"),
            ("partials/foot.html", "<footer>{{ site.title }}</footer>"),
        ]);
        let renderer = TemplateRenderer::new(dir.path(), true);
        let site = serde_json::json!({ "title": "Blog" });
        let env = env();
        let meta = meta("Hi");

        let html = renderer
            .render("page.html", &RenderContext::new(&meta, "<p>x</p>", &site, &env))
            .unwrap();
        assert_eq!(html, "<main><h1>Hi</h1><p>x</p></main><footer>Blog</footer>");
    }

    #[test]
    fn test_env_and_page_content() {
        let dir = templates(&[(
            "feed.xml",
            "{{ env.debug }} {{ env.scripts | join(sep=\",\") }} {{ page.content | safe }}",
        )]);
        let renderer = TemplateRenderer::new(dir.path(), false);
        let site = serde_json::json!({});
        let env = env();
        let meta = meta("x");

        let out = renderer
            .render("feed.xml", &RenderContext::new(&meta, "<b>", &site, &env))
            .unwrap();
        assert_eq!(out, "true main.js <b>");
    }

    #[test]
    fn test_missing_template() {
        let dir = templates(&[("page.html", "x")]);
        let renderer = TemplateRenderer::new(dir.path(), true);
        let site = serde_json::json!({});
        let env = env();
        let meta = meta("x");

        let err = renderer
            .render("post.html", &RenderContext::new(&meta, "", &site, &env))
            .unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(name, _) if name == "post.html"));
    }

    #[test]
    fn test_no_cache_rereads_sources() {
        let dir = templates(&[("page.html", "one")]);
        let site = serde_json::json!({});
        let env = env();
        let meta = meta("x");
        let context = RenderContext::new(&meta, "", &site, &env);

        let uncached = TemplateRenderer::new(dir.path(), false);
        let cached = TemplateRenderer::new(dir.path(), true);
        assert_eq!(uncached.render("page.html", &context).unwrap(), "one");
        assert_eq!(cached.render("page.html", &context).unwrap(), "one");

        fs::write(dir.path().join("page.html"), "two").unwrap();
        assert_eq!(uncached.render("page.html", &context).unwrap(), "two");
        assert_eq!(cached.render("page.html", &context).unwrap(), "one");
    }

    #[test]
    fn test_syntax_error_reported_on_load() {
        let dir = templates(&[("broken.html", "{% if %}")]);
        let err = TemplateRenderer::new(dir.path(), false).load().unwrap_err();
        assert!(matches!(err, TemplateError::Load(..)));
    }

    #[test]
    fn test_non_template_files_ignored() {
        let dir = templates(&[
            ("page.html", "<p>{{ page.title }}</p>"),
            ("README.md", "Use {{ page.title in layouts"),
            ("img/logo.png", "\u{fffd}{{"),
        ]);
        let renderer = TemplateRenderer::new(dir.path(), true);
        let site = serde_json::json!({});
        let env = env();
        let meta = meta("Hi");

        let html = renderer
            .render("page.html", &RenderContext::new(&meta, "", &site, &env))
            .unwrap();
        assert_eq!(html, "<p>Hi</p>");
        assert_eq!(renderer.names().unwrap(), ["page.html"]);
    }

    #[test]
    fn test_custom_extensions() {
        let dir = templates(&[("page.html", "a"), ("feed.atom", "{{ page.title }}")]);
        let renderer = TemplateRenderer::new(dir.path(), false).with_extensions(&["atom".into()]);

        assert_eq!(renderer.names().unwrap(), ["feed.atom"]);
    }

    #[test]
    fn test_output_extension() {
        assert_eq!(output_extension(None, "page.html"), Some("html"));
        assert_eq!(output_extension(Some("xml"), "page.html"), Some("xml"));
        assert_eq!(output_extension(Some(".json"), "page.html"), Some("json"));
        assert_eq!(output_extension(None, "layouts/raw"), None);
    }

    #[test]
    fn test_site_value_merges_aggregates() {
        let mut config = SiteConfig::default();
        config.site.insert("title".into(), toml::Value::String("Blog".into()));
        let site = SiteContext {
            tags: vec!["a".into()],
            ..SiteContext::default()
        };

        let value = site_value(&config, &site);
        assert_eq!(value["title"], "Blog");
        assert_eq!(value["tags"], serde_json::json!(["a"]));
        assert_eq!(value["posts"], serde_json::json!([]));
    }
}
