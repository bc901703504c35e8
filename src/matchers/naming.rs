use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::declarations::AssignScope;
use super::{MatcherProfile, ParsedSource};

static LOWER_SNAKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_{0,2}[a-z][a-z0-9_]*$").expect("valid lower_snake regex"));
static UPPER_CAMEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_{0,2}[A-Z][a-zA-Z0-9]*$").expect("valid UpperCamel regex"));
static UPPER_SNAKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_{0,2}[A-Z][A-Z0-9_]*$").expect("valid UPPER_SNAKE regex"));
static TYPE_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\w.]+\[.*\]|[\w.]+(\s*\|\s*[\w.\[\], ]+)+|[\w.]+\(.*\))$")
        .expect("valid type expression regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameKind {
    File,
    Directory,
    Function,
    Variable,
    Class,
    Constant,
}

impl NameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Class => "class",
            Self::Constant => "constant",
        }
    }

    pub fn expected(&self) -> Casing {
        match self {
            Self::Class => Casing::UpperCamel,
            Self::Constant => Casing::UpperSnake,
            _ => Casing::LowerSnake,
        }
    }
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    LowerSnake,
    UpperCamel,
    UpperSnake,
}

impl Casing {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::LowerSnake => LOWER_SNAKE.is_match(name),
            Self::UpperCamel => UPPER_CAMEL.is_match(name),
            Self::UpperSnake => UPPER_SNAKE.is_match(name),
        }
    }
}

impl fmt::Display for Casing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LowerSnake => "lower_snake_case",
            Self::UpperCamel => "UpperCamelCase",
            Self::UpperSnake => "UPPER_SNAKE_CASE",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedItem {
    pub name: String,
    pub kind: NameKind,
    pub line: Option<usize>,
    pub conforms: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingFacts {
    pub items: Vec<NamedItem>,
}

impl NamingFacts {
    pub fn violations(&self, kind: NameKind) -> impl Iterator<Item = &NamedItem> {
        self.items
            .iter()
            .filter(move |item| item.kind == kind && !item.conforms)
    }
}

/// Dunder names and the throwaway `_` follow no convention.
pub fn is_exempt(name: &str) -> bool {
    name == "_" || (name.len() > 4 && name.starts_with("__") && name.ends_with("__"))
}

/// Naming item for a single name, or `None` when exempt.
pub fn classify(name: &str, kind: NameKind, line: Option<usize>) -> Option<NamedItem> {
    if is_exempt(name) {
        return None;
    }
    Some(NamedItem {
        name: name.to_string(),
        kind,
        line,
        conforms: kind.expected().matches(name),
    })
}

fn file_stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
}

fn is_final(annotation: Option<&str>) -> bool {
    annotation.is_some_and(|a| {
        let a = a.trim();
        a == "Final" || a.starts_with("Final[") || a.contains(".Final")
    })
}

fn is_type_alias(name: &str, annotation: Option<&str>, value: Option<&str>) -> bool {
    if annotation.is_some_and(|a| a.trim().ends_with("TypeAlias")) {
        return true;
    }
    let capitalized = name
        .trim_start_matches('_')
        .starts_with(|c: char| c.is_ascii_uppercase());
    capitalized && value.is_some_and(|v| TYPE_EXPRESSION.is_match(v.trim()))
}

pub fn collect(source: &ParsedSource, profile: &MatcherProfile) -> NamingFacts {
    let exempt = &profile.markers.naming_exempt;
    let mut items = Vec::new();

    let file_name = source.path.rsplit('/').next().unwrap_or(&source.path);
    items.extend(classify(file_stem(file_name), NameKind::File, None));

    for function in &source.decls.functions {
        if exempt.contains(&function.name) || function.name.starts_with("visit_") {
            continue;
        }
        items.extend(classify(&function.name, NameKind::Function, Some(function.line)));
    }

    for class in &source.decls.classes {
        items.extend(classify(&class.name, NameKind::Class, Some(class.line)));
    }

    for assignment in &source.decls.assignments {
        if exempt.contains(&assignment.name) {
            continue;
        }
        let annotation = assignment.annotation.as_deref();
        let kind = match assignment.scope {
            AssignScope::Class => continue,
            AssignScope::Function => NameKind::Variable,
            AssignScope::Module => {
                if is_final(annotation) {
                    NameKind::Constant
                } else if UPPER_SNAKE.is_match(&assignment.name)
                    && assignment.name.chars().any(|c| c.is_ascii_uppercase())
                    && assignment.name.trim_start_matches('_').len() > 1
                {
                    NameKind::Constant
                } else if is_type_alias(&assignment.name, annotation, assignment.value.as_deref()) {
                    NameKind::Class
                } else {
                    NameKind::Variable
                }
            }
        };
        items.extend(classify(&assignment.name, kind, Some(assignment.line)));
    }

    NamingFacts { items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConformConfig;
    use crate::matchers::MarkerTables;
    use indoc::indoc;

    fn facts(path: &str, source: &str) -> NamingFacts {
        let profile =
            MatcherProfile::new(&ConformConfig::default(), &MarkerTables::default()).unwrap();
        collect(&ParsedSource::parse(path, source), &profile)
    }

    fn bad(facts: &NamingFacts) -> Vec<(&str, NameKind)> {
        facts
            .items
            .iter()
            .filter(|i| !i.conforms)
            .map(|i| (i.name.as_str(), i.kind))
            .collect()
    }

    #[test]
    fn casing_checks() {
        assert!(Casing::LowerSnake.matches("load_user2"));
        assert!(Casing::LowerSnake.matches("_private"));
        assert!(!Casing::LowerSnake.matches("loadUser"));
        assert!(Casing::UpperCamel.matches("HTTPServer"));
        assert!(!Casing::UpperCamel.matches("http_server"));
        assert!(Casing::UpperSnake.matches("MAX_RETRIES"));
        assert!(!Casing::UpperSnake.matches("MaxRetries"));
    }

    #[test]
    fn classifies_declarations_by_kind() {
        let f = facts(
            "pkg/userService.py",
            indoc! {r#"
                MAX_SIZE = 10
                DefaultTimeout: Final = 5
                UserId = NewType("UserId", int)
                Payload = dict[str, int]
                badGlobal = 1

                class user_record:
                    Field = 1

                def loadUser(itemCount):
                    localValue = itemCount
                    return localValue

                def __repr__():
                    _ = 1
            "#},
        );
        assert_eq!(
            bad(&f),
            vec![
                ("userService", NameKind::File),
                ("loadUser", NameKind::Function),
                ("user_record", NameKind::Class),
                ("DefaultTimeout", NameKind::Constant),
                ("badGlobal", NameKind::Variable),
                ("localValue", NameKind::Variable),
            ]
        );
    }

    #[test]
    fn dunder_modules_and_framework_hooks_are_exempt() {
        let f = facts(
            "tests/__init__.py",
            indoc! {r#"
                class TestThing(TestCase):
                    def setUp(self):
                        pass
            "#},
        );
        assert!(bad(&f).is_empty());
        assert!(f.items.iter().all(|i| i.kind != NameKind::File));
    }
}
