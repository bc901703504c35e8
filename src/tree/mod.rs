//! In-memory model of the scanned project.
//!
//! The tree is built once per run by [`TreeLoader`] and never changes
//! afterwards. File contents and their facts are read and computed on first
//! access and then cached on the [`SourceFile`].

mod loader;

pub use loader::TreeLoader;

use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::matchers::{self, FileFacts, MatcherProfile};

/// A source file of the configured language.
#[derive(Debug)]
pub struct SourceFile {
    relative: String,
    absolute: PathBuf,
    size: u64,
    max_bytes: u64,
    content: OnceCell<Result<String, String>>,
    facts: OnceCell<FileFacts>,
}

impl SourceFile {
    pub(crate) fn on_disk(relative: String, absolute: PathBuf, size: u64, max_bytes: u64) -> Self {
        Self {
            relative,
            absolute,
            size,
            max_bytes,
            content: OnceCell::new(),
            facts: OnceCell::new(),
        }
    }

    /// Build a file whose content is already known. The absolute path is
    /// informational only; nothing is read from disk.
    pub fn from_content(relative: impl Into<String>, content: impl Into<String>) -> Self {
        let relative = relative.into();
        let content = content.into();
        Self {
            absolute: PathBuf::from(&relative),
            size: content.len() as u64,
            max_bytes: u64::MAX,
            relative,
            content: OnceCell::with_value(Ok(content)),
            facts: OnceCell::new(),
        }
    }

    /// An entry the walk could not read. Its content is the read error.
    pub(crate) fn unreadable(relative: String, absolute: PathBuf, reason: String) -> Self {
        Self {
            relative,
            absolute,
            size: 0,
            max_bytes: u64::MAX,
            content: OnceCell::with_value(Err(reason)),
            facts: OnceCell::new(),
        }
    }

    /// Relative, `/`-separated path.
    pub fn path(&self) -> &str {
        &self.relative
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute
    }

    /// File name without directories.
    pub fn file_name(&self) -> &str {
        self.relative
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.relative)
    }

    /// Directory part of the relative path, `""` for files at the root.
    pub fn dir(&self) -> &str {
        self.relative
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }

    /// Content, read on first access. The error is the reason the file could
    /// not be read and is cached like a successful read.
    pub fn content(&self) -> Result<&str, &str> {
        self.content
            .get_or_init(|| self.read())
            .as_ref()
            .map(String::as_str)
            .map_err(String::as_str)
    }

    fn read(&self) -> Result<String, String> {
        if self.size > self.max_bytes {
            return Err(format!(
                "file is {} bytes, above the {} byte limit",
                self.size, self.max_bytes
            ));
        }
        let bytes = std::fs::read(&self.absolute).map_err(|e| format!("cannot read file: {e}"))?;
        String::from_utf8(bytes).map_err(|_| "file is not valid UTF-8".to_string())
    }

    /// Structural facts, computed once. Returns `None` when the content is
    /// unreadable.
    pub fn facts(&self, profile: &MatcherProfile) -> Option<&FileFacts> {
        let content = self.content().ok()?;
        Some(
            self.facts
                .get_or_init(|| matchers::extract(self.path(), content, profile)),
        )
    }
}

/// Directories and source files under one root.
#[derive(Debug, Default)]
pub struct ProjectTree {
    root: PathBuf,
    files: BTreeMap<String, SourceFile>,
    dirs: BTreeSet<String>,
    package_roots: Vec<String>,
}

impl ProjectTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_package_roots(mut self, roots: Vec<String>) -> Self {
        self.package_roots = roots;
        self
    }

    /// Insert a file, registering its ancestor directories.
    pub fn insert_file(&mut self, file: SourceFile) {
        let mut dir = file.dir();
        while !dir.is_empty() {
            self.dirs.insert(dir.to_string());
            dir = dir.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("");
        }
        self.files.insert(file.path().to_string(), file);
    }

    pub fn insert_dir(&mut self, dir: impl Into<String>) {
        self.dirs.insert(dir.into());
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn file(&self, path: &str) -> Option<&SourceFile> {
        self.files.get(path)
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Whether a directory exists in the tree or on disk. Empty directories are
    /// only seen on disk.
    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.contains(path) || self.root.join(path).is_dir()
    }

    /// Whether a file exists in the tree or on disk (markers may be files the
    /// language filter skipped).
    pub fn path_exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.root.join(path).exists()
    }

    pub fn dirs(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(String::as_str)
    }

    /// Files located directly in `dir`.
    pub fn files_in_dir<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a SourceFile> + 'a {
        self.files.values().filter(move |f| f.dir() == dir)
    }

    /// Directories containing at least one source file at any depth.
    pub fn source_dirs(&self) -> BTreeSet<&str> {
        let mut dirs = BTreeSet::new();
        for file in self.files.values() {
            let mut dir = file.dir();
            while !dir.is_empty() && dirs.insert(dir) {
                dir = dir.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("");
            }
        }
        dirs
    }

    pub fn package_roots(&self) -> &[String] {
        &self.package_roots
    }

    /// Importable top-level names defined by the project itself: the first
    /// path component below a package root (or the root), minus extensions.
    pub fn top_level_modules(&self) -> BTreeSet<String> {
        self.files
            .keys()
            .filter_map(|path| {
                let mut parts = path.split('/').peekable();
                if let Some(first) = parts.peek() {
                    if self.package_roots.iter().any(|r| r == first) {
                        parts.next();
                    }
                }
                parts.next().map(|top| {
                    top.rsplit_once('.')
                        .map(|(stem, _)| stem)
                        .unwrap_or(top)
                        .to_string()
                })
            })
            .filter(|name| !name.is_empty() && name != "__init__")
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserting_files_registers_parent_dirs() {
        let mut tree = ProjectTree::new("/nonexistent-root");
        tree.insert_file(SourceFile::from_content("src/app/models/user.py", ""));
        let dirs: Vec<_> = tree.dirs().collect();
        assert_eq!(dirs, vec!["src", "src/app", "src/app/models"]);
    }

    #[test]
    fn source_dirs_cover_every_ancestor() {
        let mut tree = ProjectTree::new("/nonexistent-root");
        tree.insert_file(SourceFile::from_content("src/app/api/routes.py", ""));
        tree.insert_file(SourceFile::from_content("src/app/core.py", ""));
        tree.insert_dir("docs");
        let dirs: Vec<_> = tree.source_dirs().into_iter().collect();
        assert_eq!(dirs, vec!["src", "src/app", "src/app/api"]);
    }

    #[test]
    fn top_level_modules_skip_package_roots() {
        let mut tree =
            ProjectTree::new("/nonexistent-root").with_package_roots(vec!["src".to_string()]);
        tree.insert_file(SourceFile::from_content("src/app/__init__.py", ""));
        tree.insert_file(SourceFile::from_content("manage.py", ""));
        tree.insert_file(SourceFile::from_content("tests/test_app.py", ""));
        let modules: Vec<_> = tree.top_level_modules().into_iter().collect();
        assert_eq!(modules, vec!["app", "manage", "tests"]);
    }

    #[test]
    fn file_name_and_dir_split_on_last_separator() {
        let file = SourceFile::from_content("a/b/c.py", "x = 1\n");
        assert_eq!(file.file_name(), "c.py");
        assert_eq!(file.dir(), "a/b");
        let root_file = SourceFile::from_content("setup.py", "");
        assert_eq!(root_file.dir(), "");
    }

    #[test]
    fn oversized_file_is_unreadable() {
        let file = SourceFile::on_disk("big.py".into(), PathBuf::from("/nonexistent/big.py"), 10, 5);
        assert!(file.content().unwrap_err().contains("byte limit"));
    }
}
