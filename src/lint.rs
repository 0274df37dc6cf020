//! `kiln lint`: check sources without writing anything.
//!
//! - every template (by `[build] template_extensions`) compiles
//! - every text content file has well-formed front matter
//! - scripts pass the configured linter (`[lint].scripts`), vendor excluded

use crate::{
    compiler::{
        assets::SCRIPT_EXTENSIONS, collect_all_files, frontmatter, meta::PageMeta, pages,
        template::TemplateRenderer,
    },
    config::SiteConfig,
    exec, log,
};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Run every check, report each problem, and fail if there was any.
pub fn lint_site(config: &SiteConfig) -> Result<()> {
    let mut problems = 0;

    let templates = TemplateRenderer::new(&config.build.templates, false)
        .with_extensions(&config.build.template_extensions);
    if let Err(err) = templates.load() {
        log!("lint"; "{err}");
        problems += 1;
    }

    let root = config.get_root();
    for (path, err) in check_front_matter(config) {
        log!("lint"; "{}: {err:#}", path.strip_prefix(root).unwrap_or(&path).display());
        problems += 1;
    }

    if !config.lint.scripts.is_empty() {
        for file in script_files(config) {
            if let Err(err) = exec!(root; &config.lint.scripts; &file) {
                log!("lint"; "{}: {err:#}", file.strip_prefix(root).unwrap_or(&file).display());
                problems += 1;
            }
        }
    }

    if problems > 0 {
        bail!("lint found {problems} problem(s)");
    }
    log!("lint"; "no problems found");
    Ok(())
}

/// Front matter errors per content file. Non-UTF-8 files are skipped.
fn check_front_matter(config: &SiteConfig) -> Vec<(PathBuf, anyhow::Error)> {
    pages::content_files(config)
        .into_par_iter()
        .filter_map(|path| check_file(&path).err().map(|err| (path, err)))
        .collect()
}

fn check_file(path: &Path) -> Result<()> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let Ok(text) = String::from_utf8(raw) else {
        return Ok(());
    };
    let fm = frontmatter::extract(&text).context("malformed front matter")?;
    PageMeta::from_metadata(fm.metadata).context("invalid front matter")?;
    Ok(())
}

/// Scripts under the assets root, minus the vendor directory.
fn script_files(config: &SiteConfig) -> Vec<PathBuf> {
    let vendor = config.build.assets.join(&config.lint.vendor);
    collect_all_files(&config.build.assets)
        .into_iter()
        .filter(|path| !path.starts_with(&vendor))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        for (rel, body) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        let mut config = SiteConfig::default();
        config.set_root(dir.path());
        config.build.content = dir.path().join("content");
        config.build.templates = dir.path().join("templates");
        config.build.assets = dir.path().join("assets");
        (dir, config)
    }

    #[test]
    fn test_clean_site_passes() {
        let (_dir, config) = site(&[
            ("templates/page.html", "{{ content | safe }}"),
            ("content/a.md", "---\ntitle: A\ndate: 2021-01-01\n---\nbody"),
            ("content/b.md", "no front matter"),
        ]);
        lint_site(&config).unwrap();
    }

    #[test]
    fn test_reports_every_problem() {
        let (_dir, config) = site(&[
            ("templates/page.html", "{% if %}"),
            ("content/a.md", "---\ntitle: [oops\n---\n"),
            ("content/b.md", "---\ndate: someday\n---\n"),
            ("content/c.md", "---\ntitle: fine\n---\n"),
        ]);

        let err = lint_site(&config).unwrap_err();
        assert!(err.to_string().contains("3 problem"));
    }

    #[test]
    fn test_non_template_files_skipped() {
        let (_dir, config) = site(&[
            ("templates/page.html", "{{ content | safe }}"),
            ("templates/NOTES.md", "{{ unclosed"),
        ]);
        lint_site(&config).unwrap();
    }

    #[test]
    fn test_front_matter_errors_name_files() {
        let (_dir, config) = site(&[
            ("content/ok.md", "---\ntitle: fine\n---\n"),
            ("content/open.md", "---\ntitle: never closed\n"),
        ]);

        let errors = check_front_matter(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, config.build.content.join("open.md"));
    }

    #[test]
    fn test_script_files_skip_vendor() {
        let (_dir, config) = site(&[
            ("assets/main.js", ""),
            ("assets/lib/util.js", ""),
            ("assets/vendor/jquery.js", ""),
            ("assets/site.scss", ""),
        ]);

        let files = script_files(&config);
        assert_eq!(
            files,
            [
                config.build.assets.join("lib/util.js"),
                config.build.assets.join("main.js"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_linter_counts() {
        let (_dir, mut config) = site(&[("assets/a.js", ""), ("assets/b.js", "")]);
        config.lint.scripts = vec!["false".into()];
        let err = lint_site(&config).unwrap_err();
        assert!(err.to_string().contains("2 problem"));

        config.lint.scripts = vec!["true".into()];
        lint_site(&config).unwrap();
    }
}
