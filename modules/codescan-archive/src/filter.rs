//! Include/exclude pattern matching for archive entries.
//!
//! Patterns are matched against the entry path relative to the walk root,
//! with `/` separators (even on Windows). Exclusion is evaluated before
//! inclusion and always wins; an excluded directory prunes its whole
//! subtree, while a merely non-included directory is still descended into.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{ArchiveError, Result};

/// Files worth scanning: JavaScript sources and JSON descriptors.
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.js", "**/*.json"];

/// VCS/pipeline internals, logs, and the output archive itself.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    "**/.git/**",
    "**/.pipeline/**",
    "**/.gitignore",
    "**/*.log",
    "workspace.zip",
];

/// Decides which walked entries end up in the archive.
#[derive(Debug, Clone)]
pub struct ArchiveFilter {
    include: GlobSet,
    exclude: GlobSet,
    /// Directory stems derived from `/**`-suffixed exclude patterns, so
    /// `**/.git/**` also matches the `.git` directory itself and the walk
    /// can prune the subtree instead of testing every descendant.
    exclude_dirs: GlobSet,
}

impl ArchiveFilter {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        let mut exclude_dir_stems = Vec::new();
        for pattern in exclude {
            if let Some(stem) = pattern.as_ref().strip_suffix("/**") {
                exclude_dir_stems.push(stem.to_string());
            }
        }

        Ok(Self {
            include: build_glob_set(include)?,
            exclude: build_glob_set(exclude)?,
            exclude_dirs: build_glob_set(&exclude_dir_stems)?,
        })
    }

    /// The production rule set: JS/JSON sources in, VCS internals and logs out.
    pub fn default_rules() -> Self {
        Self::new(DEFAULT_INCLUDE, DEFAULT_EXCLUDE)
            .expect("default archive patterns are valid")
    }

    /// True if the entry must not appear in the archive. For directories
    /// this also means the entire subtree is skipped.
    pub fn is_excluded(&self, rel_path: &str, is_dir: bool) -> bool {
        self.exclude.is_match(rel_path) || (is_dir && self.exclude_dirs.is_match(rel_path))
    }

    /// True if the entry should be written to the archive. A `false` for a
    /// directory does not prune it; children are still considered.
    pub fn is_included(&self, rel_path: &str) -> bool {
        self.include.is_match(rel_path)
    }
}

fn build_glob_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern.as_ref())
            .literal_separator(true)
            .build()
            .map_err(|e| ArchiveError::Pattern(e.to_string()))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
