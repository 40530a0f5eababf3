//! Batch rewriting - parallel processing of whole trees.
//!
//! Files are collected with `ignore` (so `.gitignore` is honoured), filtered
//! by glob and by language, then rewritten in parallel with rayon. The engine
//! is immutable and shared by every worker; per-file failures are collected
//! and never abort the batch.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use globset::{Glob, GlobMatcher};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::{RewriteEngine, detect_language};
use crate::error::Result;

/// Statistics for a batch run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchStats {
    /// Files the engine had rules for.
    pub files_scanned: usize,
    /// Files with at least one edit.
    pub files_changed: usize,
    /// Total applied edits.
    pub edits: usize,
    /// Total matches dropped as overlapping.
    pub rejected: usize,
    /// Per-file errors (path -> message).
    pub errors: BTreeMap<String, String>,
    /// Changed files, sorted.
    pub modified_files: Vec<String>,
}

/// Configuration for batch rewriting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// File glob, matched against the path relative to the root (e.g. `"**/*.py"`).
    pub file_pattern: String,
    /// Number of parallel workers (0 = rayon's global pool).
    pub workers: usize,
    /// Directory names that are never entered.
    pub skip_dirs: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            file_pattern: "**/*".to_string(),
            workers: 0,
            skip_dirs: vec![".git".to_string(), "node_modules".to_string()],
        }
    }
}

impl RewriteEngine {
    /// Rewrite every matching file below `root` in parallel.
    ///
    /// Files are written back unless the engine is in `dry_run` mode.
    ///
    /// # Errors
    ///
    /// Fails only on an invalid `file_pattern` or a worker pool that cannot
    /// be started. Per-file errors are reported in [`BatchStats::errors`].
    pub fn batch_rewrite<P: AsRef<Path>>(&self, root: P, config: &BatchConfig) -> Result<BatchStats> {
        let root = root.as_ref();
        let matcher = Glob::new(&config.file_pattern)?.compile_matcher();
        let files = self.collect_files(root, config, &matcher);
        log::info!("Batch rewrite: {} candidate files under {}", files.len(), root.display());

        if config.workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .build()?;
            Ok(pool.install(|| self.process_files(files)))
        } else {
            Ok(self.process_files(files))
        }
    }

    fn collect_files(&self, root: &Path, config: &BatchConfig, matcher: &GlobMatcher) -> Vec<PathBuf> {
        ignore::WalkBuilder::new(root)
            .build()
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {e}");
                    None
                }
            })
            .map(ignore::DirEntry::into_path)
            .filter(|path| path.is_file())
            .filter(|path| {
                let relative = path.strip_prefix(root).unwrap_or(path);
                !in_skipped_dir(relative, &config.skip_dirs) && matcher.is_match(relative)
            })
            .filter(|path| detect_language(path).is_ok_and(|lang| self.has_rules_for(lang)))
            .collect()
    }

    fn process_files(&self, files: Vec<PathBuf>) -> BatchStats {
        let files_scanned = AtomicUsize::new(0);
        let files_changed = AtomicUsize::new(0);
        let edits = AtomicUsize::new(0);
        let rejected = AtomicUsize::new(0);
        let modified_files: DashMap<String, usize> = DashMap::new();
        let errors: DashMap<String, String> = DashMap::new();

        files.into_par_iter().for_each(|path| {
            files_scanned.fetch_add(1, Ordering::Relaxed);
            let key = path.display().to_string();

            match self.rewrite_file(&path, None) {
                Ok(result) => {
                    rejected.fetch_add(result.rejected, Ordering::Relaxed);
                    if !result.is_unchanged() {
                        files_changed.fetch_add(1, Ordering::Relaxed);
                        edits.fetch_add(result.count(), Ordering::Relaxed);
                        modified_files.insert(key, result.count());
                    }
                }
                Err(e) => {
                    log::warn!("Rewrite failed for {key}: {e}");
                    errors.insert(key, e.to_string());
                }
            }
        });

        let mut modified: Vec<String> = modified_files.into_iter().map(|(k, _)| k).collect();
        modified.sort();

        BatchStats {
            files_scanned: files_scanned.load(Ordering::Relaxed),
            files_changed: files_changed.load(Ordering::Relaxed),
            edits: edits.load(Ordering::Relaxed),
            rejected: rejected.load(Ordering::Relaxed),
            errors: errors.into_iter().collect(),
            modified_files: modified,
        }
    }
}

/// Whether any directory component of `relative` is in `skip_dirs`.
fn in_skipped_dir(relative: &Path, skip_dirs: &[String]) -> bool {
    relative.parent().is_some_and(|parent| {
        parent.components().any(|component| {
            matches!(component, Component::Normal(name)
                if skip_dirs.iter().any(|skip| name.to_string_lossy() == skip.as_str()))
        })
    })
}
