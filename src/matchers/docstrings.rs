use super::markers::{contains_name, last_segment, MarkerTables};
use super::{MatcherProfile, ParsedSource};

const NON_VALUE_RETURNS: &[&str] = &["None", "NoReturn", "Never", "typing.NoReturn", "typing.Never"];
const PROPERTY_DECORATORS: &[&str] = &["property", "cached_property"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocTarget {
    Function,
    Class,
}

/// Docstring sections by role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sections {
    pub args: bool,
    pub returns: bool,
    pub raises: bool,
}

impl Sections {
    /// Required sections not present in `present`, in Args, Returns, Raises order.
    pub fn missing_from(&self, present: &Sections) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.args && !present.args {
            missing.push("Args");
        }
        if self.returns && !present.returns {
            missing.push("Returns");
        }
        if self.raises && !present.raises {
            missing.push("Raises");
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocstringEntry {
    pub name: String,
    pub line: usize,
    pub target: DocTarget,
    pub public: bool,
    /// Decorated with a marker that waives the docstring requirement
    pub exempt: bool,
    pub docstring_line: Option<usize>,
    pub required: Sections,
    pub present: Sections,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocstringFacts {
    pub module_docstring: bool,
    pub entries: Vec<DocstringEntry>,
}

/// Detect the sections a docstring carries, in Google, NumPy or Sphinx form.
pub fn detect_sections(text: &str, markers: &MarkerTables) -> Sections {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let has = |headers: &[String], sphinx: &[String]| {
        lines.iter().enumerate().any(|(idx, line)| {
            let google = line
                .strip_suffix(':')
                .is_some_and(|head| headers.iter().any(|h| h.eq_ignore_ascii_case(head.trim())));
            let numpy = headers.iter().any(|h| h.eq_ignore_ascii_case(line))
                && lines.get(idx + 1).is_some_and(|next| {
                    !next.is_empty() && next.chars().all(|c| c == '-' || c == '=')
                });
            let sphinx_field = sphinx.iter().any(|s| line.starts_with(s.as_str()));
            google || numpy || sphinx_field
        })
    };
    Sections {
        args: has(&markers.args_sections, &markers.sphinx_args),
        returns: has(&markers.returns_sections, &markers.sphinx_returns),
        raises: has(&markers.raises_sections, &markers.sphinx_raises),
    }
}

pub fn collect(source: &ParsedSource, profile: &MatcherProfile) -> DocstringFacts {
    let markers = &profile.markers;
    let mut facts = DocstringFacts {
        module_docstring: source.decls.module_docstring.is_some(),
        entries: Vec::new(),
    };

    for function in &source.decls.functions {
        let is_property = function
            .decorators
            .iter()
            .any(|d| PROPERTY_DECORATORS.contains(&last_segment(d)));
        let returns_annotated = function
            .returns
            .as_deref()
            .is_some_and(|r| !NON_VALUE_RETURNS.contains(&r.trim()));
        let required = Sections {
            args: !function.params.is_empty(),
            returns: !is_property
                && (returns_annotated || function.body.returns_value || function.body.yields),
            raises: function
                .body
                .raises
                .iter()
                .any(|r| !contains_name(&markers.raises_exempt, r)),
        };
        facts.entries.push(DocstringEntry {
            name: function.name.clone(),
            line: function.line,
            target: DocTarget::Function,
            public: !function.name.starts_with('_') && !function.nested,
            exempt: function
                .decorators
                .iter()
                .any(|d| contains_name(&markers.docstring_exempt_decorators, d)),
            docstring_line: function.docstring.as_ref().map(|d| d.line),
            required,
            present: function
                .docstring
                .as_ref()
                .map(|d| detect_sections(&d.text, markers))
                .unwrap_or_default(),
        });
    }

    for class in &source.decls.classes {
        facts.entries.push(DocstringEntry {
            name: class.name.clone(),
            line: class.line,
            target: DocTarget::Class,
            public: !class.name.starts_with('_') && !class.nested_in_function,
            exempt: false,
            docstring_line: class.docstring.as_ref().map(|d| d.line),
            required: Sections::default(),
            present: Sections::default(),
        });
    }

    facts.entries.sort_by_key(|e| e.line);
    facts
}
