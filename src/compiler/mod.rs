//! Build stages.
//!
//! - **pages**: content files through front matter, markdown, layouts and
//!   minification
//! - **assets**: styles, scripts, images, fonts and uploads
//! - **watch**: which stages a changed path reruns
//!
//! # Pages Flow
//!
//! ```text
//!            phase 1 (parallel)              between             phase 2 (parallel)
//! read ─► frontmatter ─► markdown ─► collect ─► finalize ─► render ─► minify ─► write
//!                                    (ordered)  SiteContext
//! ```

pub mod assets;
pub mod collect;
pub mod frontmatter;
pub mod markdown;
pub mod meta;
pub mod pages;
pub mod template;
pub mod watch;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Collect all files from a directory recursively, in file name order.
///
/// A missing directory yields no files.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// A file a stage could not process.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Outcome of one stage run. A failed file never stops the others.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub written: usize,
    pub failures: Vec<Failure>,
}

impl BuildReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn record(&mut self, path: &Path, result: anyhow::Result<()>) {
        match result {
            Ok(()) => self.written += 1,
            Err(error) => self.failures.push(Failure {
                path: path.to_path_buf(),
                error,
            }),
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.written += other.written;
        self.failures.extend(other.failures);
    }
}
