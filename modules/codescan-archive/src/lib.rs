//! Workspace archiver for scan uploads.
//!
//! Walks a directory tree, applies include/exclude glob filtering, and
//! streams the surviving entries into a ZIP archive. Entry paths inside the
//! archive are relative to the *parent* of the walked root, so extracting
//! reproduces a single top-level directory named after the workspace.

pub mod error;
pub mod filter;

pub use error::{ArchiveError, Result};
pub use filter::{ArchiveFilter, DEFAULT_EXCLUDE, DEFAULT_INCLUDE};

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds a ZIP archive at `output` from the tree rooted at `root`.
///
/// Entries are visited in a deterministic (per-directory filename) order.
/// Returns the number of entries written. On any failure the partially
/// written archive is removed (best effort) before the error is returned.
pub fn build_archive(root: &Path, output: &Path, filter: &ArchiveFilter) -> Result<usize> {
    info!(root = %root.display(), output = %output.display(), "Archiving directory");

    let file = File::create(output).map_err(|source| ArchiveError::Create {
        path: output.to_path_buf(),
        source,
    })?;
    let mut writer = ZipWriter::new(file);

    // Either arm consumes the writer, so the file handle is closed before
    // the cleanup below runs.
    let result = match write_entries(root, &mut writer, filter) {
        Ok(count) => writer
            .finish()
            .map(|_| count)
            .map_err(|e| ArchiveError::Write {
                name: output.display().to_string(),
                message: e.to_string(),
            }),
        Err(err) => {
            drop(writer);
            Err(err)
        }
    };

    match result {
        Ok(count) => {
            info!(count, "Archive complete");
            Ok(count)
        }
        Err(err) => {
            // A half-written archive in a reused CI workspace would be picked
            // up by later steps; drop it and report the original failure.
            let _ = std::fs::remove_file(output);
            Err(err)
        }
    }
}

fn write_entries(
    root: &Path,
    writer: &mut ZipWriter<File>,
    filter: &ArchiveFilter,
) -> Result<usize> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0usize;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let rel = rel_path(root, entry.path());
            let excluded = filter.is_excluded(&rel, entry.file_type().is_dir());
            if excluded {
                debug!(path = %rel, "Excluded");
            }
            !excluded
        });

    for entry in walker {
        let entry = entry?;
        let rel = rel_path(root, entry.path());
        if !filter.is_included(&rel) {
            debug!(path = %rel, "Not included");
            continue;
        }

        let name = entry_name(root, entry.path());
        debug!(entry = %name, "Adding");

        if entry.file_type().is_dir() {
            writer
                .add_directory(name.as_str(), options)
                .map_err(|e| ArchiveError::Write {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
        } else {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| ArchiveError::Write {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            let mut source = File::open(entry.path()).map_err(|source| ArchiveError::Read {
                path: entry.path().to_path_buf(),
                source,
            })?;
            io::copy(&mut source, writer).map_err(|e| ArchiveError::Write {
                name: name.clone(),
                message: e.to_string(),
            })?;
        }
        count += 1;
    }

    Ok(count)
}

/// Path of `path` relative to the walk root, normalized to forward slashes.
/// This is what the filter patterns are matched against.
fn rel_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Name of the entry inside the archive: relative to the parent of the walk
/// root, so the archive extracts into one top-level directory.
fn entry_name(root: &Path, path: &Path) -> String {
    let base = root.parent().unwrap_or(root);
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    /// Workspace layout from the scan-step happy path: two archivable files,
    /// VCS internals, pipeline config, and a log file.
    fn create_workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::write(root.join("a.js"), b"console.log('a');").unwrap();
        fs::write(root.join("a.json"), b"{\"a\":1}").unwrap();
        fs::write(root.join("a.log"), b"log line").unwrap();

        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git").join("config"), b"[core]").unwrap();

        fs::create_dir_all(root.join(".pipeline")).unwrap();
        fs::write(root.join(".pipeline").join("cfg.yaml"), b"steps: []").unwrap();

        dir
    }

    fn archive_names(path: &Path) -> Vec<String> {
        let file = File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    fn workspace_prefix(root: &Path) -> String {
        root.file_name().unwrap().to_string_lossy().to_string()
    }

    #[test]
    fn default_rules_archive_js_and_json_only() {
        let dir = create_workspace();
        let output = dir.path().join("workspace.zip");

        let count = build_archive(dir.path(), &output, &ArchiveFilter::default_rules()).unwrap();
        assert_eq!(count, 2);

        let prefix = workspace_prefix(dir.path());
        let names = archive_names(&output);
        assert_eq!(
            names,
            vec![format!("{prefix}/a.js"), format!("{prefix}/a.json")]
        );
    }

    #[test]
    fn nested_git_dir_is_pruned() {
        let dir = create_workspace();
        let root = dir.path();
        let nested = root.join("node_modules").join(".git");
        fs::create_dir_all(&nested).unwrap();
        // Matches the include patterns, but sits under an excluded directory.
        fs::write(nested.join("x.js"), b"x").unwrap();

        let output = root.join("workspace.zip");
        build_archive(root, &output, &ArchiveFilter::default_rules()).unwrap();

        let names = archive_names(&output);
        assert!(names.iter().all(|n| !n.contains(".git")));
        assert!(names.iter().all(|n| !n.ends_with("x.js")));
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("keep.js"), b"k").unwrap();
        fs::write(root.join("skip.js"), b"s").unwrap();

        let filter = ArchiveFilter::new(&["**/*.js"], &["**/skip.js"]).unwrap();
        let output = root.join("out.zip");
        build_archive(root, &output, &filter).unwrap();

        let names = archive_names(&output);
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with("keep.js"));
    }

    #[test]
    fn file_content_is_preserved() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let content: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        fs::write(root.join("data.json"), &content).unwrap();

        let output = root.join("workspace.zip");
        build_archive(root, &output, &ArchiveFilter::default_rules()).unwrap();

        let file = File::open(&output).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut entry = archive.by_index(0).unwrap();
        let mut extracted = Vec::new();
        entry.read_to_end(&mut extracted).unwrap();
        assert_eq!(extracted, content);
    }

    #[test]
    fn output_archive_is_not_archived_into_itself() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("a.js"), b"a").unwrap();
        // A stale archive from a previous run sits in the workspace.
        fs::write(root.join("workspace.zip"), b"stale").unwrap();

        let filter = ArchiveFilter::new(&["**"], &["workspace.zip"]).unwrap();
        let output = root.join("workspace.zip");
        build_archive(root, &output, &filter).unwrap();

        let names = archive_names(&output);
        assert!(names.iter().all(|n| !n.ends_with("workspace.zip")));
    }

    #[test]
    fn directory_entries_have_trailing_separator() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("data").join("a.js"), b"a").unwrap();

        let filter = ArchiveFilter::new(&["**"], &["out.zip"]).unwrap();
        let output = root.join("out.zip");
        build_archive(root, &output, &filter).unwrap();

        let prefix = workspace_prefix(root);
        let names = archive_names(&output);
        assert!(names.contains(&format!("{prefix}/data/")));
    }

    #[test]
    fn entry_order_is_deterministic() {
        let dir = create_workspace();
        let root = dir.path();
        fs::write(root.join("z.js"), b"z").unwrap();
        fs::write(root.join("b.js"), b"b").unwrap();

        let first = root.join("first.zip");
        let second = root.join("second.zip");
        build_archive(root, &first, &ArchiveFilter::default_rules()).unwrap();
        build_archive(root, &second, &ArchiveFilter::default_rules()).unwrap();

        assert_eq!(archive_names(&first), archive_names(&second));
    }

    #[test]
    fn failed_build_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let output = dir.path().join("out.zip");

        let err = build_archive(&missing, &output, &ArchiveFilter::default_rules()).unwrap_err();
        assert!(matches!(err, ArchiveError::Walk(_)));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn late_read_failure_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("a.js"), b"a").unwrap();
        // Visited after a.js (sorted order); opening it fails, so the
        // archive already holds an entry when the build aborts.
        std::os::unix::fs::symlink(root.join("missing.js"), root.join("zz.js")).unwrap();

        let output = root.join("out.zip");
        let err = build_archive(root, &output, &ArchiveFilter::default_rules()).unwrap_err();
        assert!(matches!(err, ArchiveError::Read { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn unwritable_output_path_is_a_create_error() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("no-such-dir").join("out.zip");

        let err = build_archive(dir.path(), &output, &ArchiveFilter::default_rules()).unwrap_err();
        assert!(matches!(err, ArchiveError::Create { .. }));
    }
}
