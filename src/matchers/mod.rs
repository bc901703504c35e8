//! Structural matchers.
//!
//! Each matcher is a pure function from a parsed source file to one slice of
//! [`FileFacts`]. Matchers never fail: malformed input leaves a degradation
//! marker and whatever partial facts could still be recovered.

pub mod annotations;
pub mod config_safety;
pub mod data_model;
pub mod declarations;
pub mod docstrings;
pub mod exceptions;
pub mod imports;
pub mod lexer;
pub mod logging;
mod markers;
pub mod naming;
mod stdlib;

pub use annotations::AnnotationFacts;
pub use config_safety::{ConfigSafetyFacts, LiteralKind, SafetyPatterns};
pub use data_model::DataModelFacts;
pub use declarations::Declarations;
pub use docstrings::DocstringFacts;
pub use exceptions::ExceptionFacts;
pub use imports::{ImportBucket, ImportFacts};
pub use logging::LoggingFacts;
pub use markers::{contains_name, last_segment, DeprecatedSpelling, MarkerTables};
pub use naming::{NameKind, NamingFacts};

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::ConformConfig;
use crate::core::Category;
use crate::errors::{Error, Result};
use lexer::Lexed;

/// The individual matchers, used to key degradation markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Matcher {
    Imports,
    Annotations,
    DataModel,
    Docstrings,
    Naming,
    Exceptions,
    Logging,
    ConfigurationSafety,
}

impl Matcher {
    /// Matchers built on the declaration parser.
    const DECLARATION_BASED: [Matcher; 5] = [
        Matcher::Annotations,
        Matcher::DataModel,
        Matcher::Docstrings,
        Matcher::Naming,
        Matcher::Exceptions,
    ];

    const ALL: [Matcher; 8] = [
        Matcher::Imports,
        Matcher::Annotations,
        Matcher::DataModel,
        Matcher::Docstrings,
        Matcher::Naming,
        Matcher::Exceptions,
        Matcher::Logging,
        Matcher::ConfigurationSafety,
    ];

    /// The matcher whose facts rules of `category` consume.
    pub fn for_category(category: Category) -> Option<Matcher> {
        match category {
            Category::Structure => None,
            Category::Typing => Some(Matcher::Annotations),
            Category::DataModel => Some(Matcher::DataModel),
            Category::Imports => Some(Matcher::Imports),
            Category::Naming => Some(Matcher::Naming),
            Category::Docstrings => Some(Matcher::Docstrings),
            Category::Logging => Some(Matcher::Logging),
            Category::Exceptions => Some(Matcher::Exceptions),
            Category::Configuration => Some(Matcher::ConfigurationSafety),
        }
    }
}

/// Everything a matcher may need about one file: its path, the lexed lines and
/// the declaration parse shared by several matchers.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub path: String,
    pub lexed: Lexed,
    pub decls: Declarations,
}

impl ParsedSource {
    pub fn parse(path: impl Into<String>, content: &str) -> Self {
        let lexed = lexer::lex(content);
        let decls = declarations::parse(&lexed);
        Self {
            path: path.into(),
            lexed,
            decls,
        }
    }
}

/// Configuration shared by all matchers for one run.
#[derive(Debug, Clone)]
pub struct MatcherProfile {
    pub markers: MarkerTables,
    stdlib: BTreeSet<String>,
    local_prefixes: Vec<String>,
    local_modules: BTreeSet<String>,
    deprecated_typing: Vec<(Regex, DeprecatedSpelling)>,
    eager_format: Option<Regex>,
    safety: SafetyPatterns,
}

impl MatcherProfile {
    pub fn new(config: &ConformConfig, markers: &MarkerTables) -> Result<Self> {
        let stdlib = stdlib::STDLIB_MODULES
            .iter()
            .map(|m| m.to_string())
            .chain(config.imports.stdlib_extra.iter().cloned())
            .collect();

        let deprecated_typing = markers
            .deprecated_typing
            .iter()
            .map(|spelling| {
                let pattern = format!(
                    r"(?:^|[^\w.])(?:typing\.|t\.)?{}\[",
                    regex::escape(&spelling.pattern)
                );
                Regex::new(&pattern)
                    .map(|re| (re, spelling.clone()))
                    .map_err(|e| Error::invalid_pattern(&spelling.pattern, e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            markers: markers.clone(),
            stdlib,
            local_prefixes: config.imports.local_prefixes.clone(),
            local_modules: BTreeSet::new(),
            deprecated_typing,
            eager_format: logging::eager_format_regex(&markers.logger_names),
            safety: SafetyPatterns::compile(&config.configuration)?,
        })
    }

    /// Project modules auto-detected from the tree, classified as local.
    pub fn with_local_modules(mut self, modules: BTreeSet<String>) -> Self {
        self.local_modules = modules;
        self
    }

    pub fn bucket_for(&self, module: &str) -> ImportBucket {
        if module.starts_with('.') {
            return ImportBucket::Local;
        }
        let top = module.split('.').next().unwrap_or(module);
        if top == "__future__" {
            return ImportBucket::Future;
        }
        if self
            .local_prefixes
            .iter()
            .any(|p| module == p || module.starts_with(&format!("{p}.")))
        {
            return ImportBucket::Local;
        }
        if self.stdlib.contains(top) {
            return ImportBucket::Standard;
        }
        if self.local_modules.contains(top) {
            return ImportBucket::Local;
        }
        ImportBucket::External
    }

    pub fn deprecated_typing(&self) -> &[(Regex, DeprecatedSpelling)] {
        &self.deprecated_typing
    }

    pub fn eager_format(&self) -> Option<&Regex> {
        self.eager_format.as_ref()
    }

    pub fn safety(&self) -> &SafetyPatterns {
        &self.safety
    }
}

/// Memoized structural facts for one source file.
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    pub imports: ImportFacts,
    pub declarations: Declarations,
    pub annotations: AnnotationFacts,
    pub data_model: DataModelFacts,
    pub docstrings: DocstringFacts,
    pub naming: NamingFacts,
    pub exceptions: ExceptionFacts,
    pub logging: LoggingFacts,
    pub configuration: ConfigSafetyFacts,
    /// Per matcher: line and reason of the first problem
    pub degraded: BTreeMap<Matcher, (usize, String)>,
}

impl FileFacts {
    /// Degradation affecting rules of `category`, if any.
    pub fn degradation_for(&self, category: Category) -> Option<&(usize, String)> {
        Matcher::for_category(category).and_then(|m| self.degraded.get(&m))
    }
}

/// Run every matcher over one file.
pub fn extract(path: &str, content: &str, profile: &MatcherProfile) -> FileFacts {
    let source = ParsedSource::parse(path, content);
    let mut degraded = BTreeMap::new();

    if let Some(problem) = &source.lexed.degraded {
        for matcher in Matcher::ALL {
            degraded.insert(matcher, problem.clone());
        }
    }
    if let Some(problem) = &source.decls.degraded {
        for matcher in Matcher::DECLARATION_BASED {
            degraded.entry(matcher).or_insert_with(|| problem.clone());
        }
    }

    let imports = imports::collect(&source, profile);
    if let Some(problem) = &imports.degraded {
        degraded
            .entry(Matcher::Imports)
            .or_insert_with(|| problem.clone());
    }
    if profile.safety().is_excluded(path) {
        degraded.remove(&Matcher::ConfigurationSafety);
    }
    if !degraded.is_empty() {
        log::debug!("Degraded parse of {path}: {:?}", degraded.values().next());
    }

    FileFacts {
        annotations: annotations::collect(&source, profile),
        data_model: data_model::collect(&source, profile),
        docstrings: docstrings::collect(&source, profile),
        naming: naming::collect(&source, profile),
        exceptions: exceptions::collect(&source, profile),
        logging: logging::collect(&source, profile),
        configuration: config_safety::collect(&source, profile),
        imports,
        declarations: source.decls,
        degraded,
    }
}
