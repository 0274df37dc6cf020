//! Asset stages: styles, scripts, images, fonts and uploads.
//!
//! Assets mirror their assets-relative path under the target root
//! (`assets/css/site.scss` → `public/css/site.css`). Uploads keep their
//! directory name (`uploads/a.pdf` → `public/uploads/a.pdf`).

use crate::{
    compiler::{BuildReport, collect_all_files},
    config::SiteConfig,
};
use anyhow::{Context, Result, anyhow};
use grass::{Options, OutputStyle};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const STYLE_EXTENSIONS: &[&str] = &["scss"];
pub const SCRIPT_EXTENSIONS: &[&str] = &["js"];
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "gif", "svg", "webp"];
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "eot", "woff", "woff2"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

fn assets_with(config: &SiteConfig, extensions: &[&str]) -> Vec<PathBuf> {
    collect_all_files(&config.build.assets)
        .into_iter()
        .filter(|path| has_extension(path, extensions))
        .collect()
}

// ============================================================================
// Inputs
// ============================================================================

/// Stylesheets to compile. `_partial.scss` files are only imported.
pub fn style_inputs(config: &SiteConfig) -> Vec<PathBuf> {
    assets_with(config, STYLE_EXTENSIONS)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.starts_with('_'))
        })
        .collect()
}

/// Script entries for the current mode, relative to the assets root.
///
/// An empty `[build.scripts]` list for the mode means every top-level
/// `*.js` file.
pub fn script_entries(config: &SiteConfig) -> Vec<String> {
    let configured = config.build.scripts.entries(config.debug);
    if !configured.is_empty() {
        return configured.to_vec();
    }

    let Ok(entries) = fs::read_dir(&config.build.assets) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, SCRIPT_EXTENSIONS))
        .filter_map(|path| path.file_name()?.to_str().map(str::to_owned))
        .collect();
    names.sort();
    names
}

pub fn script_inputs(config: &SiteConfig) -> Vec<PathBuf> {
    script_entries(config)
        .iter()
        .map(|entry| config.build.assets.join(entry))
        .collect()
}

pub fn image_inputs(config: &SiteConfig) -> Vec<PathBuf> {
    assets_with(config, IMAGE_EXTENSIONS)
}

pub fn font_inputs(config: &SiteConfig) -> Vec<PathBuf> {
    assets_with(config, FONT_EXTENSIONS)
}

pub fn upload_inputs(config: &SiteConfig) -> Vec<PathBuf> {
    collect_all_files(&config.build.uploads)
}

// ============================================================================
// Stages
// ============================================================================

/// Compile stylesheets with `grass`.
pub fn build_styles(files: &[PathBuf], config: &SiteConfig, on_progress: impl Fn() + Sync) -> BuildReport {
    let style = if !config.debug && config.build.styles.minify {
        OutputStyle::Compressed
    } else {
        OutputStyle::Expanded
    };

    run_each(files, on_progress, |path| {
        let relative = relative_to(path, &config.build.assets)?;
        let load_paths = [
            path.parent().unwrap_or(&config.build.assets),
            config.build.assets.as_path(),
        ];
        let options = Options::default().style(style).load_paths(&load_paths);

        let css = grass::from_path(path, &options)
            .map_err(|err| anyhow!("{err}"))
            .with_context(|| format!("Failed to compile {}", relative.display()))?;

        write(&config.build.target.join(relative).with_extension("css"), css.as_bytes())
    })
}

/// Copy asset files (scripts, images, fonts) verbatim.
pub fn copy_assets(files: &[PathBuf], config: &SiteConfig, on_progress: impl Fn() + Sync) -> BuildReport {
    run_each(files, on_progress, |path| {
        let relative = relative_to(path, &config.build.assets)?;
        copy(path, &config.build.target.join(relative))
    })
}

/// Copy uploads under `<target>/<uploads dir name>/`.
pub fn copy_uploads(files: &[PathBuf], config: &SiteConfig, on_progress: impl Fn() + Sync) -> BuildReport {
    let uploads = &config.build.uploads;
    let dest = config
        .build
        .target
        .join(uploads.file_name().unwrap_or(uploads.as_os_str()));

    run_each(files, on_progress, |path| {
        let relative = relative_to(path, uploads)?;
        copy(path, &dest.join(relative))
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn run_each<F>(files: &[PathBuf], on_progress: impl Fn() + Sync, process: F) -> BuildReport
where
    F: Fn(&Path) -> Result<()> + Sync,
{
    let results: Vec<_> = files
        .par_iter()
        .map(|path| {
            let result = process(path.as_path());
            on_progress();
            (path, result)
        })
        .collect();

    let mut report = BuildReport::default();
    for (path, result) in results {
        report.record(path, result);
    }
    report
}

fn relative_to<'a>(path: &'a Path, root: &Path) -> Result<&'a Path> {
    path.strip_prefix(root)
        .with_context(|| format!("{} is not under {}", path.display(), root.display()))
}

fn copy(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).with_context(|| format!("Failed to copy {}", from.display()))?;
    Ok(())
}

fn write(output: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(files: &[(&str, &str)]) -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        for (rel, body) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let mut config = SiteConfig::default();
        config.build.assets = dir.path().join("assets");
        config.build.uploads = dir.path().join("uploads");
        config.build.target = dir.path().join("public");
        (dir, config)
    }

    #[test]
    fn test_style_inputs_skip_partials() {
        let (_dir, config) = setup(&[
            ("assets/css/site.scss", ""),
            ("assets/css/_vars.scss", ""),
            ("assets/css/plain.css", ""),
        ]);
        let inputs = style_inputs(&config);
        assert_eq!(inputs, [config.build.assets.join("css/site.scss")]);
    }

    #[test]
    fn test_build_styles_with_partial() {
        let (_dir, mut config) = setup(&[
            ("assets/css/_vars.scss", "$fg: #333;"),
            ("assets/css/site.scss", "@import 'vars';\nbody { color: $fg; }\n"),
        ]);

        let report = build_styles(&style_inputs(&config), &config, || {});
        assert!(report.is_ok(), "{:?}", report.failures);
        let css = fs::read_to_string(config.build.target.join("css/site.css")).unwrap();
        assert!(css.contains("color: #333"));

        config.debug = false;
        build_styles(&style_inputs(&config), &config, || {});
        let css = fs::read_to_string(config.build.target.join("css/site.css")).unwrap();
        assert!(css.contains("color:#333"));
        assert!(!css.contains("color: #333"));
    }

    #[test]
    fn test_build_styles_error_isolated() {
        let (_dir, config) = setup(&[
            ("assets/a.scss", "a { color: red; }"),
            ("assets/b.scss", "b { color: $missing; }"),
        ]);

        let report = build_styles(&style_inputs(&config), &config, || {});
        assert_eq!(report.written, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(format!("{:#}", report.failures[0].error).contains("b.scss"));
    }

    #[test]
    fn test_script_entries_per_mode() {
        let (_dir, mut config) = setup(&[
            ("assets/main.js", ""),
            ("assets/debug.js", ""),
            ("assets/vendor/lib.js", ""),
        ]);
        assert_eq!(script_entries(&config), ["debug.js", "main.js"]);

        config.build.scripts.debug = vec!["main.js".into()];
        assert_eq!(script_entries(&config), ["main.js"]);

        config.debug = false;
        config.build.scripts.production = vec!["vendor/lib.js".into()];
        assert_eq!(script_inputs(&config), [config.build.assets.join("vendor/lib.js")]);
    }

    #[test]
    fn test_copy_images_and_fonts() {
        let (_dir, config) = setup(&[
            ("assets/img/logo.png", "png"),
            ("assets/fonts/a.woff2", "font"),
            ("assets/notes.txt", "skip"),
        ]);

        assert_eq!(image_inputs(&config).len(), 1);
        let mut files = image_inputs(&config);
        files.extend(font_inputs(&config));

        let report = copy_assets(&files, &config, || {});
        assert_eq!(report.written, 2);
        assert!(config.build.target.join("img/logo.png").exists());
        assert!(config.build.target.join("fonts/a.woff2").exists());
        assert!(!config.build.target.join("notes.txt").exists());
    }

    #[test]
    fn test_copy_uploads_keeps_dir_name() {
        let (_dir, config) = setup(&[("uploads/2021/a.pdf", "pdf")]);

        let report = copy_uploads(&upload_inputs(&config), &config, || {});
        assert!(report.is_ok());
        assert!(config.build.target.join("uploads/2021/a.pdf").exists());
    }

    #[test]
    fn test_missing_script_entry_fails() {
        let (_dir, mut config) = setup(&[("assets/main.js", "")]);
        config.build.scripts.debug = vec!["gone.js".into()];

        let report = copy_assets(&script_inputs(&config), &config, || {});
        assert_eq!(report.failures.len(), 1);
    }
}
