//! The pages stage: content files to rendered output.
//!
//! Runs in two phases so that every template sees the complete site:
//!
//! 1. Read, extract front matter and convert markdown (parallel).
//! 2. Check layouts, collect posts and finalize the [`SiteContext`]
//!    (in file order).
//! 3. Render layouts, minify and write (parallel).
//!
//! A failing file is reported and skipped; it never stops the batch. Files
//! that fail to load or whose layout is missing never reach the site
//! context. A render error inside a resolved layout is reported after the
//! context is built, so other pages may still list that post.

use crate::{
    compiler::{
        BuildReport, collect_all_files,
        collect::{ContentCollector, SiteContext, assign_page_url},
        frontmatter,
        markdown::MarkdownRenderer,
        meta::{ContentFile, ContentKind, PageMeta},
        template::{Env, RenderContext, TemplateError, TemplateRenderer, output_extension, site_value},
    },
    config::SiteConfig,
    log,
    utils::minify::minify,
};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// A content file after phase 1.
enum Loaded {
    Content(ContentFile),
    /// Not valid UTF-8; copied as is.
    Binary(PathBuf),
}

/// Every file under the content root, in a stable order.
pub fn content_files(config: &SiteConfig) -> Vec<PathBuf> {
    collect_all_files(&config.build.content)
}

/// Run the pages stage over `files`.
///
/// `scripts` is exposed to templates as `env.scripts`. Calls `on_progress`
/// once per file.
pub fn build_pages(
    files: &[PathBuf],
    config: &SiteConfig,
    scripts: Vec<String>,
    on_progress: impl Fn() + Sync,
) -> BuildReport {
    let markdown = MarkdownRenderer::new(&config.markdown);

    // Phase 1: read, extract, markdown
    let loaded: Vec<(&PathBuf, Result<Loaded>)> = files
        .par_iter()
        .map(|path| (path, load(path, config, &markdown)))
        .collect();

    let mut report = BuildReport::default();
    let mut contents = Vec::with_capacity(loaded.len());
    let mut binaries = Vec::new();
    for (path, result) in loaded {
        match result {
            Ok(Loaded::Content(file)) => contents.push(file),
            Ok(Loaded::Binary(path)) => binaries.push(path),
            Err(err) => {
                on_progress();
                report.record(path, Err(err));
            }
        }
    }

    // A file whose layout cannot resolve fails before it reaches the site
    let renderer = TemplateRenderer::new(&config.build.templates, !config.debug)
        .with_extensions(&config.build.template_extensions);
    let templates = renderer.names();
    let mut ready = Vec::with_capacity(contents.len());
    for file in contents {
        match check_layout(&file, config, &templates) {
            Ok(()) => ready.push(file),
            Err(err) => {
                on_progress();
                report.record(&file.source, Err(err));
            }
        }
    }
    let mut contents = ready;

    // Collect every post before anything renders
    let site = collect(&mut contents, config);
    let site = site_value(config, &site);
    let env = Env::new(config, scripts);

    // Phase 2: render, minify, write
    let rendered: Vec<(PathBuf, Result<()>)> = contents
        .into_par_iter()
        .map(|file| {
            let source = file.source.clone();
            let result = render(file, config, &renderer, &site, &env);
            on_progress();
            (source, result)
        })
        .chain(binaries.into_par_iter().map(|path| {
            let result = copy_binary(&path, config);
            on_progress();
            (path, result)
        }))
        .collect();

    for (path, result) in rendered {
        report.record(&path, result);
    }
    report
}

/// Phase 1 for one file.
fn load(path: &Path, config: &SiteConfig, markdown: &MarkdownRenderer) -> Result<Loaded> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let Ok(text) = String::from_utf8(raw) else {
        return Ok(Loaded::Binary(path.to_path_buf()));
    };

    let fm = frontmatter::extract(&text)
        .with_context(|| format!("Malformed front matter in {}", path.display()))?;
    let meta = PageMeta::from_metadata(fm.metadata)
        .with_context(|| format!("Invalid front matter in {}", path.display()))?;

    // (predicate, transform) pairs applied in order
    let mut file = ContentFile::new(path, meta, fm.body.to_owned(), config)?;
    if config.build.is_markdown(path) {
        file.body = markdown.render(&file.body);
        file.set_extension("html");
    }

    Ok(Loaded::Content(file))
}

fn layout_for<'a>(file: &'a ContentFile, config: &'a SiteConfig) -> Option<&'a str> {
    file.meta
        .layout
        .as_deref()
        .or(config.build.default_template.as_deref())
}

/// The file's layout, if it has one, must be a registered template.
fn check_layout(
    file: &ContentFile,
    config: &SiteConfig,
    templates: &Result<Vec<String>, TemplateError>,
) -> Result<()> {
    let Some(layout) = layout_for(file, config) else {
        return Ok(());
    };
    let layout = layout.trim_start_matches('/');
    let context = || format!("Failed to render {}", file.relative.display());

    let names = match templates {
        Ok(names) => names,
        Err(err) => return Err(anyhow!("{err}")).with_context(context),
    };
    if names.iter().any(|name| name == layout) {
        return Ok(());
    }
    Err(TemplateError::NotFound(layout.to_owned(), config.build.templates.clone()))
        .with_context(context)
}

/// Derive urls, collect posts, and finalize the site context.
fn collect(files: &mut [ContentFile], config: &SiteConfig) -> SiteContext {
    let mut collector = ContentCollector::new(config);
    for file in files.iter_mut() {
        match file.kind {
            ContentKind::Post => collector.collect(file),
            ContentKind::Page => assign_page_url(file, config),
        }
    }
    collector.finalize()
}

/// Phase 2 for one file.
fn render(
    mut file: ContentFile,
    config: &SiteConfig,
    renderer: &TemplateRenderer,
    site: &Value,
    env: &Env,
) -> Result<()> {
    let layout = layout_for(&file, config);

    let extension = match layout {
        Some(layout) => {
            let context = RenderContext::new(&file.meta, &file.body, site, env);
            let output = renderer
                .render(layout, &context)
                .with_context(|| format!("Failed to render {}", file.relative.display()))?;
            let extension = output_extension(file.meta.filetype.as_deref(), layout).map(str::to_owned);
            file.body = output;
            extension
        }
        None => file.meta.filetype.clone(),
    };
    if let Some(extension) = extension {
        file.set_extension(extension.trim_start_matches('.'));
    }

    let bytes = minify(file.body.as_bytes(), &file.output, config);
    write(&file.output, &bytes)
}

fn copy_binary(path: &Path, config: &SiteConfig) -> Result<()> {
    let relative = path.strip_prefix(&config.build.content)?;
    let output = config.build.target.join(relative);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(path, &output).with_context(|| format!("Failed to copy {}", path.display()))?;
    log!("pages"; "copied {}", relative.display());
    Ok(())
}

fn write(output: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))
}

// ============================================================================
// Tests
// ============================================================================
