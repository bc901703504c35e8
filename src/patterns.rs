//! Glob matching over `/`-separated relative paths.

use glob::{MatchOptions, Pattern};

use crate::errors::{Error, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled list of globs. Matches when any glob matches the path, or, for a
/// glob ending in `/**`, when any ancestor directory matches its prefix.
#[derive(Debug, Clone, Default)]
pub struct PathGlobs {
    patterns: Vec<Pattern>,
    dir_prefixes: Vec<Pattern>,
}

impl PathGlobs {
    pub fn new<S: AsRef<str>>(globs: &[S]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(globs.len());
        let mut dir_prefixes = Vec::new();
        for glob in globs {
            let glob = glob.as_ref();
            patterns.push(Pattern::new(glob).map_err(|e| Error::invalid_pattern(glob, e))?);
            if let Some(prefix) = glob.strip_suffix("/**") {
                if !prefix.is_empty() {
                    dir_prefixes
                        .push(Pattern::new(prefix).map_err(|e| Error::invalid_pattern(glob, e))?);
                }
            }
        }
        Ok(Self {
            patterns,
            dir_prefixes,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, path: &str) -> bool {
        if self
            .patterns
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
        {
            return true;
        }
        if self.dir_prefixes.is_empty() {
            return false;
        }
        ancestors(path).any(|dir| {
            self.dir_prefixes
                .iter()
                .any(|p| p.matches_with(dir, MATCH_OPTIONS))
        })
    }
}

fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.char_indices()
        .filter(|(_, c)| *c == '/')
        .map(move |(i, _)| &path[..i])
}

/// Ignore patterns for the tree walk: a pattern without `/` matches any single
/// path component, a pattern with `/` matches the relative path.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    component: Vec<Pattern>,
    relative: PathGlobs,
}

impl IgnoreSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut component = Vec::new();
        let mut relative = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if pattern.contains('/') {
                relative.push(pattern.to_string());
            } else {
                component
                    .push(Pattern::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e))?);
            }
        }
        Ok(Self {
            component,
            relative: PathGlobs::new(&relative)?,
        })
    }

    pub fn is_ignored(&self, relative_path: &str) -> bool {
        relative_path
            .split('/')
            .any(|part| self.component.iter().any(|p| p.matches(part)))
            || self.relative.matches(relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursive_suffix_matches_nested_files() {
        let globs = PathGlobs::new(&["**/tests/**"]).unwrap();
        assert!(globs.matches("tests/test_api.py"));
        assert!(globs.matches("pkg/tests/unit/test_api.py"));
        assert!(!globs.matches("pkg/testsuite.py"));
    }

    #[test]
    fn leading_recursive_prefix_matches_root_files() {
        let globs = PathGlobs::new(&["**/conftest.py", "**/test_*.py"]).unwrap();
        assert!(globs.matches("conftest.py"));
        assert!(globs.matches("a/b/test_models.py"));
        assert!(!globs.matches("a/b/models.py"));
    }

    #[test]
    fn invalid_glob_is_reported() {
        assert!(PathGlobs::new(&["[unclosed"]).is_err());
    }

    #[test]
    fn component_ignores_match_anywhere() {
        let ignores = IgnoreSet::new(&[".venv", "*.egg-info", "build/**"]).unwrap();
        assert!(ignores.is_ignored(".venv/lib/site.py"));
        assert!(ignores.is_ignored("pkg/demo.egg-info/PKG-INFO"));
        assert!(ignores.is_ignored("build/lib/x.py"));
        assert!(!ignores.is_ignored("src/app/build_tools.py"));
    }
}
