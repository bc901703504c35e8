use serde::{Deserialize, Serialize};

/// Marker names the matchers look for. Shipped with the catalog so projects
/// using different frameworks can retarget the rules without code changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerTables {
    /// Deprecated annotation spellings and their replacement hint
    pub deprecated_typing: Vec<DeprecatedSpelling>,
    pub model_bases: Vec<String>,
    pub model_decorators: Vec<String>,
    /// Base classes that never make a class a data model
    pub non_model_bases: Vec<String>,
    pub config_markers: Vec<String>,
    pub deprecated_config_classes: Vec<String>,
    pub modern_validators: Vec<String>,
    pub deprecated_validators: Vec<String>,
    pub args_sections: Vec<String>,
    pub returns_sections: Vec<String>,
    pub raises_sections: Vec<String>,
    pub sphinx_args: Vec<String>,
    pub sphinx_returns: Vec<String>,
    pub sphinx_raises: Vec<String>,
    /// Exception types whose `raise` does not require a Raises section
    pub raises_exempt: Vec<String>,
    /// Decorators whose functions need no docstring
    pub docstring_exempt_decorators: Vec<String>,
    pub root_error_types: Vec<String>,
    pub error_suffix: String,
    pub exceptions_file: String,
    pub logger_names: Vec<String>,
    /// Names inherited from frameworks that do not follow lower_snake
    pub naming_exempt: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeprecatedSpelling {
    pub pattern: String,
    pub replacement: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for MarkerTables {
    fn default() -> Self {
        let deprecated_typing = [
            ("List", "list[...]"),
            ("Dict", "dict[...]"),
            ("Set", "set[...]"),
            ("FrozenSet", "frozenset[...]"),
            ("Tuple", "tuple[...]"),
            ("Type", "type[...]"),
            ("Optional", "X | None"),
            ("Union", "A | B"),
        ]
        .iter()
        .map(|(pattern, replacement)| DeprecatedSpelling {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
        })
        .collect();

        Self {
            deprecated_typing,
            model_bases: strings(&["BaseModel"]),
            model_decorators: strings(&["dataclass"]),
            non_model_bases: strings(&[
                "Enum",
                "IntEnum",
                "StrEnum",
                "Flag",
                "IntFlag",
                "Exception",
                "BaseException",
                "Protocol",
                "TypedDict",
                "NamedTuple",
                "ABC",
            ]),
            config_markers: strings(&["model_config"]),
            deprecated_config_classes: strings(&["Config"]),
            modern_validators: strings(&["field_validator", "model_validator"]),
            deprecated_validators: strings(&["validator", "root_validator"]),
            args_sections: strings(&[
                "Args",
                "Arguments",
                "Parameters",
                "Params",
                "Keyword Args",
                "Keyword Arguments",
                "Other Parameters",
            ]),
            returns_sections: strings(&["Returns", "Return", "Yields", "Yield"]),
            raises_sections: strings(&["Raises", "Raise", "Exceptions", "Except"]),
            sphinx_args: strings(&[":param", ":parameter", ":arg", ":argument", ":key", ":keyword"]),
            sphinx_returns: strings(&[":returns", ":return", ":rtype", ":yields", ":yield"]),
            sphinx_raises: strings(&[":raises", ":raise", ":except", ":exception"]),
            raises_exempt: strings(&["NotImplementedError"]),
            docstring_exempt_decorators: strings(&["overload", "override"]),
            root_error_types: strings(&["Exception", "BaseException"]),
            error_suffix: "Error".to_string(),
            exceptions_file: "exceptions.py".to_string(),
            logger_names: strings(&["logger", "log", "_logger", "_log", "LOGGER", "LOG"]),
            naming_exempt: strings(&[
                "setUp",
                "tearDown",
                "setUpClass",
                "tearDownClass",
                "setUpModule",
                "tearDownModule",
                "asyncSetUp",
                "asyncTearDown",
                "maxDiff",
            ]),
        }
    }
}

/// Last dotted segment, so `pydantic.BaseModel` matches `BaseModel`.
pub fn last_segment(name: &str) -> &str {
    let name = name.split('[').next().unwrap_or(name).trim();
    name.rsplit('.').next().unwrap_or(name)
}

pub fn contains_name(table: &[String], name: &str) -> bool {
    let short = last_segment(name);
    table.iter().any(|entry| entry == short || entry == name)
}
