//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── clean()            wipe the target root
//!     │
//!     └── run_stages()       one group per stage, all groups in parallel
//!             │
//!             ├── styles   ──► grass
//!             ├── scripts  ──► copy entries
//!             ├── images   ──► copy
//!             ├── fonts    ──► copy
//!             ├── uploads  ──► copy
//!             └── pages    ──► collect, then render
//! ```
//!
//! Watch mode calls [`run_stages`] directly with the groups picked by the
//! watch map.

use crate::{
    compiler::{BuildReport, watch::Stage},
    config::SiteConfig,
    log,
    logger::ProgressBars,
};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::{fs, path::Path};

/// Clean the target root, then run every stage.
///
/// Every stage runs to completion; the build fails afterwards if any file
/// could not be processed.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    if !config.debug {
        log!("build"; "production run");
    }

    clean(config)?;

    let groups: Vec<Vec<Stage>> = Stage::ALL.iter().map(|&stage| vec![stage]).collect();
    let report = run_stages(&groups, config);

    if !report.is_ok() {
        bail!(
            "build failed: {} of {} files could not be processed",
            report.failures.len(),
            report.failures.len() + report.written
        );
    }

    log_build_result(&config.build.target, report.written);
    Ok(())
}

/// Remove everything under the target root, keeping the directory itself.
pub fn clean(config: &SiteConfig) -> Result<()> {
    config.check_target()?;
    let target = &config.build.target;

    if !target.exists() {
        fs::create_dir_all(target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        return Ok(());
    }

    for entry in fs::read_dir(target)? {
        let path = entry?.path();
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.with_context(|| format!("Failed to remove {}", path.display()))?;
    }

    log!("clean"; "{}", target.display());
    Ok(())
}

/// Run stage groups concurrently; stages inside a group run in order.
///
/// Per-file failures are logged here and returned in the report.
pub fn run_stages(groups: &[Vec<Stage>], config: &SiteConfig) -> BuildReport {
    let planned: Vec<Vec<(Stage, Vec<_>)>> = groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|&stage| (stage, stage.inputs(config)))
                .collect()
        })
        .collect();

    let counts: Vec<_> = planned
        .iter()
        .flatten()
        .map(|(stage, files)| (stage.name(), files.len()))
        .collect();
    let progress = ProgressBars::new_filtered(&counts);

    let results: Vec<(Stage, BuildReport)> = planned
        .par_iter()
        .flat_map_iter(|group| {
            group
                .iter()
                .map(|(stage, files)| {
                    let report = stage.run(files, config, || {
                        if let Some(progress) = &progress {
                            progress.inc_by_name(stage.name());
                        }
                    });
                    (*stage, report)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    if let Some(progress) = &progress {
        progress.finish();
    }

    let root = config.get_root();
    let mut total = BuildReport::default();
    for (stage, report) in results {
        for failure in &report.failures {
            log!("error"; "[{}] {}: {:#}", stage.name(), display_path(&failure.path, root), failure.error);
        }
        if report.written > 0 {
            log!(stage.name(); "{} files", report.written);
        }
        total.merge(report);
    }
    total
}

fn display_path<'a>(path: &'a Path, root: &Path) -> std::path::Display<'a> {
    path.strip_prefix(root).unwrap_or(path).display()
}

/// Log build result based on target directory contents
fn log_build_result(target: &Path, written: usize) {
    let is_empty = !fs::read_dir(target).is_ok_and(|mut dir| dir.next().is_some());

    if is_empty {
        log!("warn"; "output is empty, check the content and assets directories");
    } else {
        log!("build"; "done, {} files written", written);
    }
}
