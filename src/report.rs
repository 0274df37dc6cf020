//! `kiln report`: page-quality audits for the configured urls.
//!
//! Each url is handed to the audit command (`lighthouse` by default) with:
//!
//! ```text
//! <command…> <url> <flags…> --output=<format> --output-path=<dir>/<slug>.<format>
//! ```
//!
//! A failed audit is logged and the next url still runs.

use crate::{config::SiteConfig, log, utils::command};
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashSet;
use std::{fs, path::PathBuf};

/// Audit every url in `[report].urls`.
pub fn run_reports(config: &SiteConfig) -> Result<()> {
    let report = &config.report;
    fs::create_dir_all(&report.dir)
        .with_context(|| format!("Failed to create {}", report.dir.display()))?;

    let mut failed = 0;
    for (url, output) in report.urls.iter().zip(output_paths(config)) {
        log!("report"; "{url}");

        let mut args: Vec<String> = vec![url.clone()];
        args.extend(report.flags.iter().cloned());
        args.push(format!("--output={}", report.output));
        args.push(format!("--output-path={}", output.display()));

        let os_args: Vec<_> = args.into_iter().map(Into::into).collect();
        match command::exec(None, &report.command, &os_args) {
            Ok(_) => log!("report"; "wrote {}", output.display()),
            Err(err) => {
                log!("error"; "report for {url} failed: {err:#}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} audits failed", report.urls.len());
    }
    Ok(())
}

/// `<dir>/<slug>.<format>` per url, in url order.
///
/// Urls that slug alike get `-2`, `-3`, ... so no report overwrites another.
fn output_paths(config: &SiteConfig) -> Vec<PathBuf> {
    let report = &config.report;
    let mut taken = FxHashSet::default();

    report
        .urls
        .iter()
        .map(|url| {
            let base = slug(url);
            let mut name = base.clone();
            let mut n = 1;
            while !taken.insert(name.clone()) {
                n += 1;
                name = format!("{base}-{n}");
            }
            report.dir.join(format!("{name}.{}", report.output))
        })
        .collect()
}

/// File-name-safe slug: scheme dropped, runs of other characters become `-`.
fn slug(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);

    let mut slug = String::with_capacity(rest.len());
    for c in rest.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() { "index".to_owned() } else { slug.to_owned() }
}
