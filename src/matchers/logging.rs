use once_cell::sync::Lazy;
use regex::Regex;

use super::{MatcherProfile, ParsedSource};

static PRINT_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w.])print\s*\(").expect("valid print regex"));
static ROOT_LOGGER_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^\w.])logging\.(debug|info|warning|warn|error|exception|critical|fatal|log)\s*\(")
        .expect("valid root logger regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCall {
    pub line: usize,
    pub method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingFacts {
    pub print_calls: Vec<usize>,
    pub root_logger_calls: Vec<LogCall>,
    /// Log calls whose message is formatted before the call
    pub eager_format_calls: Vec<LogCall>,
}

/// Regex for calls on the configured logger names whose first argument is an
/// f-string or a literal followed by `%` or `.format(`. Runs on masked code.
pub(crate) fn eager_format_regex(logger_names: &[String]) -> Option<Regex> {
    if logger_names.is_empty() {
        return None;
    }
    let names = logger_names
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r#"(?:^|[^\w.])(?:self\.)?(?:{names})\.(debug|info|warning|warn|error|exception|critical|fatal)\s*\(\s*(?:[rR]?[fF][rR]?(?:""|'')|(?:""|'')\s*(?:%|\.format\s*\())"#
    );
    Regex::new(&pattern).ok()
}

pub fn collect(source: &ParsedSource, profile: &MatcherProfile) -> LoggingFacts {
    let mut facts = LoggingFacts::default();
    for line in &source.lexed.lines {
        let code = &line.code;
        if PRINT_CALL.is_match(code) {
            facts.print_calls.push(line.start);
        }
        for caps in ROOT_LOGGER_CALL.captures_iter(code) {
            facts.root_logger_calls.push(LogCall {
                line: line.start,
                method: caps[2].to_string(),
            });
        }
        if let Some(eager) = profile.eager_format() {
            for caps in eager.captures_iter(code) {
                facts.eager_format_calls.push(LogCall {
                    line: line.start,
                    method: caps[1].to_string(),
                });
            }
        }
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConformConfig;
    use crate::matchers::MarkerTables;
    use indoc::indoc;

    fn facts(source: &str) -> LoggingFacts {
        let profile =
            MatcherProfile::new(&ConformConfig::default(), &MarkerTables::default()).unwrap();
        collect(&ParsedSource::parse("pkg/jobs.py", source), &profile)
    }

    #[test]
    fn finds_print_and_root_logger_calls() {
        let f = facts(indoc! {r#"
            import logging
            print("starting")
            logging.info("root")
            self.printer.print(x)
            pprint(x)
            logging.getLogger(__name__)
        "#});
        assert_eq!(f.print_calls, vec![2]);
        assert_eq!(
            f.root_logger_calls,
            vec![LogCall {
                line: 3,
                method: "info".to_string()
            }]
        );
    }

    #[test]
    fn finds_eager_formatting_on_logger_names() {
        let f = facts(indoc! {r#"
            logger.info(f"user {user_id}")
            logger.warning("value %s" % value)
            log.error("x {}".format(x))
            logger.info("lazy %s", value)
            self.logger.debug(f"{x}")
        "#});
        let lines: Vec<_> = f.eager_format_calls.iter().map(|c| c.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 5]);
    }
}
