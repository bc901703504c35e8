use super::markers::{contains_name, last_segment};
use super::{MatcherProfile, ParsedSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelClass {
    pub name: String,
    pub line: usize,
    /// Model base or decorator that made the class model-like
    pub marker: String,
    pub via_decorator: bool,
    pub modern_config: bool,
    pub deprecated_config_line: Option<usize>,
    pub modern_validators: Vec<(String, usize)>,
    pub deprecated_validators: Vec<(String, usize)>,
}

/// Top-level class that is neither model-like nor excluded by its base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainClass {
    pub name: String,
    pub line: usize,
    pub bases: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataModelFacts {
    pub models: Vec<ModelClass>,
    pub plain_classes: Vec<PlainClass>,
}

pub fn collect(source: &ParsedSource, profile: &MatcherProfile) -> DataModelFacts {
    let markers = &profile.markers;
    let mut facts = DataModelFacts::default();

    for class in &source.decls.classes {
        let base_marker = class
            .bases
            .iter()
            .find(|b| contains_name(&markers.model_bases, b));
        let decorator_marker = class
            .decorators
            .iter()
            .find(|d| contains_name(&markers.model_decorators, d));

        let (marker, via_decorator) = match (base_marker, decorator_marker) {
            (Some(base), _) => (base, false),
            (None, Some(decorator)) => (decorator, true),
            (None, None) => {
                let excluded = class.bases.iter().any(|b| {
                    contains_name(&markers.non_model_bases, b)
                        || (!markers.error_suffix.is_empty()
                            && last_segment(b).ends_with(&markers.error_suffix))
                });
                let is_error = !markers.error_suffix.is_empty()
                    && class.name.ends_with(&markers.error_suffix);
                if class.top_level && !excluded && !is_error {
                    facts.plain_classes.push(PlainClass {
                        name: class.name.clone(),
                        line: class.line,
                        bases: class.bases.clone(),
                    });
                }
                continue;
            }
        };

        let deprecated_config_line = class
            .inner_classes
            .iter()
            .find(|(name, _)| markers.deprecated_config_classes.contains(name))
            .map(|(_, line)| *line);
        let modern_config = class
            .body_assignments
            .iter()
            .any(|(name, _)| markers.config_markers.contains(name));
        let select = |table: &[String]| -> Vec<(String, usize)> {
            class
                .method_decorators
                .iter()
                .filter(|(decorator, _)| contains_name(table, decorator))
                .cloned()
                .collect()
        };

        facts.models.push(ModelClass {
            name: class.name.clone(),
            line: class.line,
            marker: last_segment(marker).to_string(),
            via_decorator,
            modern_config,
            deprecated_config_line,
            modern_validators: select(&markers.modern_validators),
            deprecated_validators: select(&markers.deprecated_validators),
        });
    }

    facts
}
