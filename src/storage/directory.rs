//! A filesystem backed collection of markdown documents.
//!
//! The [`Directory`] walks a folder of notes and runs a numbering pass over
//! every markdown file in it. Files are processed in parallel and each file
//! resolves its own settings from front matter, so one folder can mix
//! documents with different numbering configurations.

use std::{
    ffi::OsStr,
    fmt, io,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use walkdir::WalkDir;

use crate::{
    domain::NumberingSettings,
    storage::document::{LoadError, MarkdownDocument, NumberingOutcome},
};

/// How a directory-wide pass should treat each file.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassOptions {
    /// Compute outcomes without writing anything back.
    pub dry_run: bool,
    /// Only touch documents whose settings carry the `auto` flag.
    pub only_auto: bool,
    /// Strip labels instead of applying them.
    pub remove: bool,
}

/// What a directory-wide pass did to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// The file the outcome belongs to.
    pub path: PathBuf,
    /// Line-level counts for the file.
    pub outcome: NumberingOutcome,
}

/// Aggregated results of a directory-wide pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Per-file outcomes, for files that were processed.
    pub files: Vec<FileReport>,
    /// Files skipped because their settings lack the `auto` flag.
    pub skipped: usize,
}

impl PassReport {
    /// The number of files whose content changed (or would change, for a
    /// dry run).
    #[must_use]
    pub fn changed_files(&self) -> usize {
        self.files
            .iter()
            .filter(|report| report.outcome.changed())
            .count()
    }

    /// Total headings that received or lost a label across all files.
    #[must_use]
    pub fn changed_headings(&self) -> usize {
        self.files
            .iter()
            .map(|report| report.outcome.labeled + report.outcome.cleared)
            .sum()
    }
}

/// A folder of markdown notes.
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    /// Opens a directory at the given path.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The directory root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs a numbering pass over every markdown file under the root.
    ///
    /// # Errors
    ///
    /// This method does *not* fail fast: every file is attempted, and an
    /// error listing the files that could not be processed is returned at
    /// the end. Files that were processed successfully keep their changes.
    pub fn apply(
        &self,
        defaults: &NumberingSettings,
        options: PassOptions,
    ) -> Result<PassReport, DirectoryPassError> {
        let paths = collect_markdown_paths(&self.root);

        let (processed, failures): (Vec<_>, Vec<_>) = paths
            .par_iter()
            .map(|path| try_number_file(path, defaults, options))
            .partition(Result::is_ok);

        let failures: Vec<_> = failures.into_iter().filter_map(Result::err).collect();
        if !failures.is_empty() {
            return Err(DirectoryPassError { failures });
        }

        let mut report = PassReport::default();
        for file in processed.into_iter().filter_map(Result::ok) {
            match file {
                Some(file_report) => report.files.push(file_report),
                None => report.skipped += 1,
            }
        }
        report.files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(report)
    }
}

fn collect_markdown_paths(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            // Skip hidden directories such as .git or .obsidian.
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.'))
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension() == Some(OsStr::new("md")))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn try_number_file(
    path: &Path,
    defaults: &NumberingSettings,
    options: PassOptions,
) -> Result<Option<FileReport>, (PathBuf, FileError)> {
    let mut document = match MarkdownDocument::load(path) {
        Ok(document) => document,
        Err(e) => {
            tracing::debug!("failed to load {}: {e:?}", path.display());
            return Err((path.to_path_buf(), e.into()));
        }
    };

    let settings = document.settings_or_alternative(defaults);
    if options.only_auto && !settings.auto {
        tracing::debug!("skipping {} (not marked auto)", path.display());
        return Ok(None);
    }

    let outcome = if options.remove {
        document.remove_numbering(&settings)
    } else {
        document.apply_numbering(&settings)
    };

    if outcome.changed() && !options.dry_run {
        if let Err(e) = document.save(path) {
            tracing::debug!("failed to save {}: {e}", path.display());
            return Err((path.to_path_buf(), e.into()));
        }
    }

    Ok(Some(FileReport {
        path: path.to_path_buf(),
        outcome,
    }))
}

/// A failure affecting one file in a directory-wide pass.
#[derive(Debug, thiserror::Error)]
#[error("failed to process file")]
pub enum FileError {
    /// The file could not be read or parsed.
    Load(#[from] LoadError),
    /// The file could not be written back.
    Io(#[from] io::Error),
}

/// The files a directory-wide pass could not process.
#[derive(Debug, thiserror::Error)]
pub struct DirectoryPassError {
    failures: Vec<(PathBuf, FileError)>,
}

impl DirectoryPassError {
    /// The files that failed, with their errors.
    #[must_use]
    pub fn failures(&self) -> &[(PathBuf, FileError)] {
        &self.failures
    }
}

impl fmt::Display for DirectoryPassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        write!(f, "failed to process files: ")?;

        let total = self.failures.len();

        let displayed_paths: Vec<String> = self
            .failures
            .iter()
            .take(MAX_DISPLAY)
            .map(|(p, _e)| p.display().to_string())
            .collect();

        let msg = displayed_paths.join(", ");

        if total <= MAX_DISPLAY {
            write!(f, "{msg}")
        } else {
            write!(f, "{msg}... (and {} more)", total - MAX_DISPLAY)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_note(root: &Path, name: &str, content: &str) -> PathBuf {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn numbers_every_markdown_file() {
        let tmp = TempDir::new().unwrap();
        let a = write_note(tmp.path(), "a.md", "# Alpha\n## Beta\n");
        let b = write_note(tmp.path(), "nested/b.md", "# Gamma\n");

        let report = Directory::new(tmp.path().to_path_buf())
            .apply(&NumberingSettings::default(), PassOptions::default())
            .unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.changed_files(), 2);
        assert!(fs::read_to_string(&a).unwrap().contains("# 1 Alpha"));
        assert!(fs::read_to_string(&b).unwrap().contains("# 1 Gamma"));
    }

    #[test]
    fn dry_run_leaves_files_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = write_note(tmp.path(), "a.md", "# Alpha\n");

        let report = Directory::new(tmp.path().to_path_buf())
            .apply(
                &NumberingSettings::default(),
                PassOptions {
                    dry_run: true,
                    ..PassOptions::default()
                },
            )
            .unwrap();

        assert_eq!(report.changed_files(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Alpha\n");
    }

    #[test]
    fn only_auto_skips_unmarked_documents() {
        let tmp = TempDir::new().unwrap();
        let marked = write_note(
            tmp.path(),
            "marked.md",
            "---\nnumber headings: auto, first-level 1, max 6, 1.1\n---\n# Alpha\n",
        );
        let unmarked = write_note(tmp.path(), "unmarked.md", "# Alpha\n");

        let report = Directory::new(tmp.path().to_path_buf())
            .apply(
                &NumberingSettings::default(),
                PassOptions {
                    only_auto: true,
                    ..PassOptions::default()
                },
            )
            .unwrap();

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.skipped, 1);
        assert!(fs::read_to_string(&marked).unwrap().contains("# 1 Alpha"));
        assert_eq!(fs::read_to_string(&unmarked).unwrap(), "# Alpha\n");
    }

    #[test]
    fn remove_strips_labels() {
        let tmp = TempDir::new().unwrap();
        let path = write_note(tmp.path(), "a.md", "# 1 Alpha\n## 1.1 Beta\n");

        Directory::new(tmp.path().to_path_buf())
            .apply(
                &NumberingSettings::default(),
                PassOptions {
                    remove: true,
                    ..PassOptions::default()
                },
            )
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "# Alpha\n## Beta\n");
    }

    #[test]
    fn hidden_directories_and_other_files_are_ignored() {
        let tmp = TempDir::new().unwrap();
        write_note(tmp.path(), ".obsidian/settings.md", "# Not a note\n");
        write_note(tmp.path(), "notes.txt", "# Not markdown\n");
        write_note(tmp.path(), "a.md", "# Alpha\n");

        let report = Directory::new(tmp.path().to_path_buf())
            .apply(&NumberingSettings::default(), PassOptions::default())
            .unwrap();

        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn per_document_settings_override_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = write_note(
            tmp.path(),
            "a.md",
            "---\nnumber headings: first-level 1, max 6, A.1\n---\n# Alpha\n## Beta\n",
        );

        Directory::new(tmp.path().to_path_buf())
            .apply(&NumberingSettings::default(), PassOptions::default())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# A Alpha"));
        assert!(content.contains("## A.1 Beta"));
    }
}
