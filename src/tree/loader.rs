use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use super::{ProjectTree, SourceFile};
use crate::config::ConformConfig;
use crate::core::display_path;
use crate::errors::{Error, Result};
use crate::patterns::IgnoreSet;

/// Walks a root directory and builds the [`ProjectTree`].
pub struct TreeLoader {
    root: PathBuf,
    extensions: Vec<String>,
    ignore_patterns: Vec<String>,
    max_file_bytes: u64,
    package_roots: Vec<String>,
}

impl TreeLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec!["py".to_string()],
            ignore_patterns: Vec::new(),
            max_file_bytes: u64::MAX,
            package_roots: Vec::new(),
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &ConformConfig) -> Self {
        Self::new(root)
            .with_extensions(config.project.extensions.clone())
            .with_ignore_patterns(config.ignore_patterns())
            .with_max_file_bytes(config.project.max_file_bytes)
            .with_package_roots(config.project.package_roots.clone())
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_max_file_bytes(mut self, max: u64) -> Self {
        self.max_file_bytes = max;
        self
    }

    pub fn with_package_roots(mut self, roots: Vec<String>) -> Self {
        self.package_roots = roots;
        self
    }

    fn check_root(&self) -> Result<PathBuf> {
        let metadata = std::fs::metadata(&self.root).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::RootNotFound {
                path: self.root.clone(),
            },
            _ => Error::RootNotReadable {
                path: self.root.clone(),
                message: e.to_string(),
            },
        })?;
        if !metadata.is_dir() {
            return Err(Error::RootNotReadable {
                path: self.root.clone(),
                message: "not a directory".to_string(),
            });
        }
        std::fs::read_dir(&self.root).map_err(|e| Error::RootNotReadable {
            path: self.root.clone(),
            message: e.to_string(),
        })?;
        self.root.canonicalize().map_err(|e| Error::RootNotReadable {
            path: self.root.clone(),
            message: e.to_string(),
        })
    }

    pub fn load(&self) -> Result<ProjectTree> {
        let canonical_root = self.check_root()?;
        let ignores = IgnoreSet::new(&self.ignore_patterns)?;

        let filter_root = canonical_root.clone();
        let filter_ignores = ignores.clone();
        let walker = WalkBuilder::new(&canonical_root)
            .hidden(false)
            .git_ignore(true)
            .follow_links(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let Some(relative) = relative_to(&filter_root, entry.path()) else {
                    return true;
                };
                if relative == "." {
                    return true;
                }
                if filter_ignores.is_ignored(&relative) {
                    return false;
                }
                if entry.path_is_symlink() && !stays_within(&filter_root, entry.path()) {
                    log::debug!("Skipping symlink escaping the root: {relative}");
                    return false;
                }
                true
            })
            .build();

        let mut tree = ProjectTree::new(canonical_root.clone())
            .with_package_roots(self.package_roots.clone());

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    match self.unreadable_entry(&canonical_root, &e) {
                        Some(file) => {
                            log::warn!("Could not read {} during walk: {e}", file.path());
                            tree.insert_file(file);
                        }
                        None => log::debug!("Skipping entry during walk: {e}"),
                    }
                    continue;
                }
            };
            let Some(relative) = relative_to(&canonical_root, entry.path()) else {
                continue;
            };
            if relative == "." {
                continue;
            }
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                tree.insert_dir(relative);
            } else if file_type.is_file() && self.has_language_extension(entry.path()) {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                tree.insert_file(SourceFile::on_disk(
                    relative,
                    entry.path().to_path_buf(),
                    size,
                    self.max_file_bytes,
                ));
            }
        }

        log::debug!("Walked {}", canonical_root.display());
        Ok(tree)
    }

    /// Turn a walk error into an unreadable tree entry. Symlink loops and
    /// paths with a non-source extension are dropped.
    fn unreadable_entry(&self, root: &Path, error: &ignore::Error) -> Option<SourceFile> {
        let (path, cause) = walk_error_path(error)?;
        let relative = relative_to(root, path).filter(|r| r != ".")?;
        if path.extension().is_some() && !self.has_language_extension(path) {
            return None;
        }
        Some(SourceFile::unreadable(relative, path.to_path_buf(), cause.to_string()))
    }

    fn has_language_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                self.extensions.iter().any(|e| e.trim_start_matches('.') == ext)
            })
            .unwrap_or(false)
    }
}

fn walk_error_path(error: &ignore::Error) -> Option<(&Path, &ignore::Error)> {
    match error {
        ignore::Error::WithPath { path, err } => match err.as_ref() {
            ignore::Error::Loop { .. } => None,
            inner => walk_error_path(inner).or(Some((path.as_path(), inner))),
        },
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        ignore::Error::Partial(errors) if errors.len() == 1 => walk_error_path(&errors[0]),
        _ => None,
    }
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(display_path)
}

fn stays_within(root: &Path, path: &Path) -> bool {
    path.canonicalize()
        .map(|target| target.starts_with(root))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn missing_root_is_root_not_found() {
        let dir = TempDir::new().unwrap();
        let err = TreeLoader::new(dir.path().join("missing")).load().unwrap_err();
        assert!(matches!(err, Error::RootNotFound { .. }));
    }

    #[test]
    fn file_root_is_not_readable() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "file.py", "");
        let err = TreeLoader::new(dir.path().join("file.py")).load().unwrap_err();
        assert!(matches!(err, Error::RootNotReadable { .. }));
    }

    #[test]
    fn loads_only_language_files_and_honors_ignores() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/app/__init__.py", "");
        write(dir.path(), "src/app/core.py", "x = 1\n");
        write(dir.path(), "README.md", "# readme\n");
        write(dir.path(), ".venv/lib/site.py", "");
        write(dir.path(), "build/lib/app.py", "");

        let tree = TreeLoader::new(dir.path())
            .with_ignore_patterns(vec![".venv".into(), "build".into()])
            .load()
            .unwrap();
        let paths: Vec<_> = tree.files().map(|f| f.path().to_string()).collect();
        assert_eq!(paths, vec!["src/app/__init__.py", "src/app/core.py"]);
        assert!(tree.dirs().any(|d| d == "src/app"));
        assert!(!tree.dirs().any(|d| d.starts_with(".venv")));
    }

    #[test]
    fn content_is_read_lazily() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "mod.py", "value = 1\n");
        let tree = TreeLoader::new(dir.path()).load().unwrap();
        let file = tree.file("mod.py").unwrap();
        assert_eq!(file.content(), Ok("value = 1\n"));
    }

    #[test]
    fn non_utf8_file_is_unreadable_but_listed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.py"), [0xff, 0xfe, 0x00]).unwrap();
        let tree = TreeLoader::new(dir.path()).load().unwrap();
        assert!(tree.file("bad.py").unwrap().content().is_err());
    }

    fn io_error(path: PathBuf) -> ignore::Error {
        ignore::Error::WithDepth {
            depth: 2,
            err: Box::new(ignore::Error::WithPath {
                path,
                err: Box::new(ignore::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "Permission denied",
                ))),
            }),
        }
    }

    #[test]
    fn walk_errors_become_unreadable_entries() {
        let dir = TempDir::new().unwrap();
        let loader = TreeLoader::new(dir.path());

        let file = loader
            .unreadable_entry(dir.path(), &io_error(dir.path().join("src/locked")))
            .unwrap();
        assert_eq!(file.path(), "src/locked");
        assert!(file.content().unwrap_err().contains("Permission denied"));

        let source = loader
            .unreadable_entry(dir.path(), &io_error(dir.path().join("src/app/core.py")))
            .unwrap();
        assert_eq!(source.path(), "src/app/core.py");

        assert!(loader
            .unreadable_entry(dir.path(), &io_error(dir.path().join("notes.md")))
            .is_none());
        let looped = ignore::Error::WithPath {
            path: dir.path().join("self_loop"),
            err: Box::new(ignore::Error::Loop {
                ancestor: dir.path().to_path_buf(),
                child: dir.path().join("self_loop"),
            }),
        };
        assert!(loader.unreadable_entry(dir.path(), &looped).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_escaping_the_root_are_skipped() {
        let outside = TempDir::new().unwrap();
        write(outside.path(), "leak.py", "SECRET = 'x'\n");
        let dir = TempDir::new().unwrap();
        write(dir.path(), "inside.py", "");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("self_loop")).unwrap();

        let tree = TreeLoader::new(dir.path()).load().unwrap();
        let paths: Vec<_> = tree.files().map(|f| f.path().to_string()).collect();
        assert!(paths.contains(&"inside.py".to_string()));
        assert!(!paths.iter().any(|p| p.starts_with("linked")));
    }
}
