//! Literal scans for connection strings, static config loads and hardcoded
//! secrets. Excluded paths short-circuit before any scan runs.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{MatcherProfile, ParsedSource};
use crate::config::ConfigurationSafetyConfig;
use crate::errors::{Error, Result};
use crate::patterns::PathGlobs;

const LOAD_FUNCTIONS: &str = r"open|load|loads|safe_load|full_load|read|read_file|read_text|read_bytes|from_file|from_yaml|from_json|from_toml|load_dotenv|dotenv_values|Path|parse";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiteralKind {
    ConnectionString,
    StaticConfigLoad,
    HardcodedSecret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralMatch {
    pub kind: LiteralKind,
    pub line: usize,
    /// Identifier, file name or redacted literal describing the match
    pub subject: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSafetyFacts {
    pub excluded: bool,
    pub matches: Vec<LiteralMatch>,
}

impl ConfigSafetyFacts {
    pub fn of_kind(&self, kind: LiteralKind) -> impl Iterator<Item = &LiteralMatch> {
        self.matches.iter().filter(move |m| m.kind == kind)
    }
}

/// Compiled configuration-safety patterns.
#[derive(Debug, Clone)]
pub struct SafetyPatterns {
    excluded: PathGlobs,
    connection: Vec<Regex>,
    config_load: Regex,
    secret_name: Regex,
    secret_assignment: Regex,
    secret_dict_key: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e))
}

impl SafetyPatterns {
    pub fn compile(config: &ConfigurationSafetyConfig) -> Result<Self> {
        let connection = config
            .connection_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;

        let extensions = config
            .config_extensions
            .iter()
            .map(|e| regex::escape(e.trim_start_matches('.')))
            .collect::<Vec<_>>()
            .join("|");
        let config_load = compile(&format!(
            r#"(?:^|[^\w])(?:{LOAD_FUNCTIONS})\s*\(\s*[rRbBuU]?["']([^"']*\.(?:{extensions}))["']"#
        ))?;

        Ok(Self {
            excluded: PathGlobs::new(&config.excluded_paths)?,
            connection,
            config_load,
            secret_name: compile(&config.secret_name_pattern)?,
            secret_assignment: compile(
                r#"(?:^|[\s,(])(?P<name>[A-Za-z_]\w*)\s*(?::[^=]*)?=\s*[rRbBuU]?(?:"(?P<dq>[^"]+)"|'(?P<sq>[^']+)')"#,
            )?,
            secret_dict_key: compile(
                r#"["'](?P<name>[A-Za-z_][\w-]*)["']\s*:\s*[rRbBuU]?(?:"(?P<dq>[^"]+)"|'(?P<sq>[^']+)')"#,
            )?,
        })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.matches(path)
    }
}

fn redact(value: &str) -> String {
    let scheme_end = value.find("://").map(|i| i + 3);
    match scheme_end {
        Some(end) => format!("{}…", &value[..end]),
        None => {
            let visible: String = value.chars().take(6).collect();
            format!("{visible}…")
        }
    }
}

pub fn collect(source: &ParsedSource, profile: &MatcherProfile) -> ConfigSafetyFacts {
    let patterns = profile.safety();
    if patterns.is_excluded(&source.path) {
        return ConfigSafetyFacts {
            excluded: true,
            matches: Vec::new(),
        };
    }

    let mut matches = Vec::new();
    for line in &source.lexed.lines {
        // Docstrings and other bare string statements are prose
        if !line.is_lone_string() {
            for literal in &line.strings {
                let value = literal.value.trim();
                if patterns.connection.iter().any(|re| re.is_match(value)) {
                    matches.push(LiteralMatch {
                        kind: LiteralKind::ConnectionString,
                        line: literal.line,
                        subject: redact(value),
                    });
                }
            }
        }

        for caps in patterns.config_load.captures_iter(&line.raw) {
            matches.push(LiteralMatch {
                kind: LiteralKind::StaticConfigLoad,
                line: line.start,
                subject: caps[1].to_string(),
            });
        }

        for regex in [&patterns.secret_assignment, &patterns.secret_dict_key] {
            for caps in regex.captures_iter(&line.raw) {
                let name = &caps["name"];
                let value = caps.name("dq").or_else(|| caps.name("sq"));
                if value.is_some_and(|v| !v.as_str().trim().is_empty())
                    && patterns.secret_name.is_match(name)
                {
                    matches.push(LiteralMatch {
                        kind: LiteralKind::HardcodedSecret,
                        line: line.start,
                        subject: name.to_string(),
                    });
                }
            }
        }
    }

    matches.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.kind.cmp(&b.kind)));
    matches.dedup();
    ConfigSafetyFacts {
        excluded: false,
        matches,
    }
}
