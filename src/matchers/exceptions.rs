use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use super::markers::{contains_name, last_segment};
use super::{MatcherProfile, ParsedSource};

static BARE_EXCEPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^except\s*:").expect("valid bare except regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClass {
    pub name: String,
    pub line: usize,
    pub bases: Vec<String>,
    /// Extends a root error type directly, making it a domain-base candidate
    pub extends_root: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionFacts {
    pub is_declaration_file: bool,
    /// Top-level classes of a declaration file; empty for other files
    pub classes: Vec<ErrorClass>,
    pub bare_excepts: Vec<usize>,
}

impl ExceptionFacts {
    pub fn base_candidates(&self) -> impl Iterator<Item = &ErrorClass> {
        self.classes.iter().filter(|c| c.extends_root)
    }

    pub fn derived(&self) -> impl Iterator<Item = &ErrorClass> {
        self.classes.iter().filter(|c| !c.extends_root)
    }

    /// Names of classes that reach a domain base through bases declared in
    /// the same file.
    pub fn rooted_names(&self) -> BTreeSet<&str> {
        let mut rooted: BTreeSet<&str> =
            self.base_candidates().map(|c| c.name.as_str()).collect();
        loop {
            let before = rooted.len();
            for class in self.derived() {
                if class
                    .bases
                    .iter()
                    .any(|b| rooted.contains(last_segment(b)))
                {
                    rooted.insert(class.name.as_str());
                }
            }
            if rooted.len() == before {
                return rooted;
            }
        }
    }
}

pub fn collect(source: &ParsedSource, profile: &MatcherProfile) -> ExceptionFacts {
    let markers = &profile.markers;
    let file_name = source.path.rsplit('/').next().unwrap_or(&source.path);
    let is_declaration_file = file_name == markers.exceptions_file;

    let classes = if is_declaration_file {
        source
            .decls
            .classes
            .iter()
            .filter(|c| c.top_level)
            .map(|c| ErrorClass {
                name: c.name.clone(),
                line: c.line,
                bases: c.bases.clone(),
                extends_root: c
                    .bases
                    .iter()
                    .any(|b| contains_name(&markers.root_error_types, b)),
            })
            .collect()
    } else {
        Vec::new()
    };

    let bare_excepts = source
        .lexed
        .lines
        .iter()
        .filter(|l| BARE_EXCEPT.is_match(l.code.trim_start()))
        .map(|l| l.start)
        .collect();

    ExceptionFacts {
        is_declaration_file,
        classes,
        bare_excepts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConformConfig;
    use crate::matchers::MarkerTables;
    use indoc::indoc;

    fn facts(path: &str, source: &str) -> ExceptionFacts {
        let profile =
            MatcherProfile::new(&ConformConfig::default(), &MarkerTables::default()).unwrap();
        collect(&ParsedSource::parse(path, source), &profile)
    }

    #[test]
    fn splits_base_candidates_from_derived_errors() {
        let f = facts(
            "src/billing/exceptions.py",
            indoc! {r#"
                class BillingError(Exception):
                    """Base."""

                class InvoiceError(BillingError):
                    pass

                class LateInvoiceError(InvoiceError):
                    pass

                class Stray(ValueError):
                    pass
            "#},
        );
        assert!(f.is_declaration_file);
        let bases: Vec<_> = f.base_candidates().map(|c| c.name.as_str()).collect();
        assert_eq!(bases, vec!["BillingError"]);
        let rooted = f.rooted_names();
        assert!(rooted.contains("LateInvoiceError"));
        assert!(!rooted.contains("Stray"));
    }

    #[test]
    fn bare_excepts_are_found_in_any_file() {
        let f = facts(
            "src/app/service.py",
            indoc! {r#"
                try:
                    run()
                except:
                    pass
                try:
                    run()
                except Exception:
                    pass
            "#},
        );
        assert!(!f.is_declaration_file);
        assert_eq!(f.bare_excepts, vec![3]);
    }
}
