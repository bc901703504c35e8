use super::{MatcherProfile, ParsedSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionAnnotations {
    pub name: String,
    pub line: usize,
    pub missing_params: Vec<String>,
    pub missing_return: bool,
}

impl FunctionAnnotations {
    pub fn is_complete(&self) -> bool {
        self.missing_params.is_empty() && !self.missing_return
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecatedHit {
    pub spelling: String,
    pub replacement: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationFacts {
    pub functions: Vec<FunctionAnnotations>,
    pub deprecated: Vec<DeprecatedHit>,
}

pub fn collect(source: &ParsedSource, profile: &MatcherProfile) -> AnnotationFacts {
    let mut facts = AnnotationFacts::default();
    let mut annotated: Vec<(usize, &str)> = Vec::new();

    for function in &source.decls.functions {
        let missing_params = function
            .params
            .iter()
            .filter(|p| p.annotation.is_none())
            .map(|p| p.name.clone())
            .collect();
        facts.functions.push(FunctionAnnotations {
            name: function.name.clone(),
            line: function.line,
            missing_params,
            missing_return: function.returns.is_none(),
        });
        annotated.extend(
            function
                .params
                .iter()
                .filter_map(|p| p.annotation.as_deref())
                .chain(function.returns.as_deref())
                .map(|a| (function.line, a)),
        );
    }

    annotated.extend(
        source
            .decls
            .assignments
            .iter()
            .filter_map(|a| a.annotation.as_deref().map(|ann| (a.line, ann))),
    );

    for (line, annotation) in annotated {
        for (regex, spelling) in profile.deprecated_typing() {
            if regex.is_match(annotation)
                && !facts
                    .deprecated
                    .iter()
                    .any(|h| h.line == line && h.spelling == spelling.pattern)
            {
                facts.deprecated.push(DeprecatedHit {
                    spelling: spelling.pattern.clone(),
                    replacement: spelling.replacement.clone(),
                    line,
                });
            }
        }
    }
    facts.deprecated.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.spelling.cmp(&b.spelling)));
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConformConfig;
    use crate::matchers::MarkerTables;
    use indoc::indoc;

    fn facts(source: &str) -> AnnotationFacts {
        let profile =
            MatcherProfile::new(&ConformConfig::default(), &MarkerTables::default()).unwrap();
        collect(&ParsedSource::parse("pkg/mod.py", source), &profile)
    }

    #[test]
    fn reports_missing_parameters_and_return() {
        let f = facts(indoc! {r#"
            class Repo:
                def get(self, key, default: int = 0):
                    return default

            def complete(a: int, *args: str, **kwargs: object) -> None:
                pass
        "#});
        assert_eq!(f.functions[0].missing_params, vec!["key"]);
        assert!(f.functions[0].missing_return);
        assert!(f.functions[1].is_complete());
    }

    #[test]
    fn finds_deprecated_spellings_in_annotations_only() {
        let f = facts(indoc! {r#"
            from typing import List, Optional

            ITEMS: List[int] = []

            def pick(values: typing.Dict[str, int]) -> Optional[str]:
                cache = List
                return None
        "#});
        let hits: Vec<_> = f
            .deprecated
            .iter()
            .map(|h| (h.line, h.spelling.as_str()))
            .collect();
        assert_eq!(hits, vec![(3, "List"), (5, "Dict"), (5, "Optional")]);
    }

    #[test]
    fn modern_spellings_pass() {
        let f = facts("def pick(values: dict[str, int]) -> str | None:\n    return None\n");
        assert!(f.deprecated.is_empty());
        assert!(f.functions[0].is_complete());
    }
}
