//! Class, function and assignment declarations recovered from logical lines.
//!
//! Scoping follows indentation only: a logical line belongs to the innermost
//! open `def` or `class` whose header is less indented. Control-flow blocks
//! (`if`, `for`, `with`, ...) do not open scopes.

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexer::{matching_close, split_top_level, Lexed, LogicalLine};

static YIELD_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w.])yield\b").expect("valid yield regex"));

const STATEMENT_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "try", "except", "finally", "with", "def", "class",
    "return", "lambda", "match", "case", "async", "await", "raise", "assert", "del", "global",
    "nonlocal", "pass", "break", "continue", "import", "from", "yield", "print", "type",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Regular,
    VarArgs,
    KwArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<String>,
    pub kind: ParamKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Docstring {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodySummary {
    /// Exception names raised directly in the body; empty string for a bare re-raise
    pub raises: Vec<String>,
    pub returns_value: bool,
    pub yields: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub line: usize,
    pub indent: usize,
    pub is_async: bool,
    /// Parameters without the method receiver
    pub params: Vec<Param>,
    pub receiver: Option<String>,
    pub returns: Option<String>,
    pub decorators: Vec<String>,
    pub is_method: bool,
    /// Defined inside another function
    pub nested: bool,
    pub docstring: Option<Docstring>,
    pub body: BodySummary,
}

impl FunctionDecl {
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators
            .iter()
            .any(|d| d == name || d.rsplit('.').next() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub line: usize,
    pub indent: usize,
    pub bases: Vec<String>,
    pub decorators: Vec<String>,
    pub top_level: bool,
    pub nested_in_function: bool,
    pub docstring: Option<Docstring>,
    /// Names assigned directly in the class body
    pub body_assignments: Vec<(String, usize)>,
    pub inner_classes: Vec<(String, usize)>,
    /// Decorators applied to methods, with the method line
    pub method_decorators: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignScope {
    Module,
    Function,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub line: usize,
    pub scope: AssignScope,
    pub annotation: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    pub module_docstring: Option<Docstring>,
    pub functions: Vec<FunctionDecl>,
    pub classes: Vec<ClassDecl>,
    pub assignments: Vec<Assignment>,
    pub degraded: Option<(usize, String)>,
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Function(usize),
    Class(usize),
}

#[derive(Debug, Clone, Copy)]
struct OpenScope {
    indent: usize,
    scope: Scope,
}

pub fn parse(lexed: &Lexed) -> Declarations {
    let mut decls = Declarations::default();
    let mut stack: Vec<OpenScope> = Vec::new();
    let mut pending_decorators: Vec<String> = Vec::new();
    let mut awaiting_docstring: Option<OpenScope> = None;

    for (position, line) in lexed.lines.iter().enumerate() {
        if position == 0 && line.indent == 0 && line.is_lone_string() {
            decls.module_docstring = Some(docstring_of(line));
            continue;
        }

        while stack.last().is_some_and(|open| line.indent <= open.indent) {
            stack.pop();
        }

        if let Some(open) = awaiting_docstring.take() {
            if line.indent > open.indent && line.is_lone_string() {
                let doc = Some(docstring_of(line));
                match open.scope {
                    Scope::Function(idx) => decls.functions[idx].docstring = doc,
                    Scope::Class(idx) => decls.classes[idx].docstring = doc,
                }
                continue;
            }
        }

        let code = line.code.trim();
        if let Some(decorator) = code.strip_prefix('@') {
            pending_decorators.push(decorator_name(decorator));
            continue;
        }
        let decorators = std::mem::take(&mut pending_decorators);

        if line.starts_with_keyword("def")
            || (line.starts_with_keyword("async") && code.contains("def "))
        {
            let Some(header) = parse_function_header(code) else {
                degrade(&mut decls, line.start, "unparsable function signature");
                continue;
            };
            let parent_class = match stack.last() {
                Some(OpenScope {
                    scope: Scope::Class(idx),
                    ..
                }) => Some(*idx),
                _ => None,
            };
            let nested = stack
                .iter()
                .any(|open| matches!(open.scope, Scope::Function(_)));
            let mut params = parse_params(header.params);
            let is_static = decorators.iter().any(|d| d == "staticmethod");
            let receiver = if parent_class.is_some()
                && !is_static
                && params.first().is_some_and(|p| p.kind == ParamKind::Regular)
            {
                Some(params.remove(0).name)
            } else {
                None
            };
            if let Some(class_idx) = parent_class {
                let class = &mut decls.classes[class_idx];
                class
                    .method_decorators
                    .extend(decorators.iter().map(|d| (d.clone(), line.start)));
            }

            let idx = decls.functions.len();
            decls.functions.push(FunctionDecl {
                name: header.name.to_string(),
                line: line.start,
                indent: line.indent,
                is_async: header.is_async,
                params,
                receiver,
                returns: header.returns.map(str::to_string),
                decorators,
                is_method: parent_class.is_some(),
                nested,
                docstring: None,
                body: BodySummary::default(),
            });
            let open = OpenScope {
                indent: line.indent,
                scope: Scope::Function(idx),
            };
            if !header.tail.trim().is_empty() {
                summarize_body(&mut decls.functions[idx].body, header.tail.trim());
            }
            stack.push(open);
            awaiting_docstring = Some(open);
            continue;
        }

        if line.starts_with_keyword("class") {
            let Some(header) = parse_class_header(code) else {
                degrade(&mut decls, line.start, "unparsable class header");
                continue;
            };
            if let Some(OpenScope {
                scope: Scope::Class(parent),
                ..
            }) = stack.last()
            {
                decls.classes[*parent]
                    .inner_classes
                    .push((header.name.to_string(), line.start));
            }
            let idx = decls.classes.len();
            decls.classes.push(ClassDecl {
                name: header.name.to_string(),
                line: line.start,
                indent: line.indent,
                bases: header.bases,
                decorators,
                top_level: stack.is_empty(),
                nested_in_function: stack
                    .iter()
                    .any(|open| matches!(open.scope, Scope::Function(_))),
                docstring: None,
                body_assignments: Vec::new(),
                inner_classes: Vec::new(),
                method_decorators: Vec::new(),
            });
            let open = OpenScope {
                indent: line.indent,
                scope: Scope::Class(idx),
            };
            stack.push(open);
            awaiting_docstring = Some(open);
            continue;
        }

        let scope = match stack.last() {
            None => AssignScope::Module,
            Some(OpenScope {
                scope: Scope::Function(idx),
                ..
            }) => {
                summarize_body(&mut decls.functions[*idx].body, code);
                AssignScope::Function
            }
            Some(OpenScope {
                scope: Scope::Class(_),
                ..
            }) => AssignScope::Class,
        };

        for (name, annotation, value) in parse_assignment(code) {
            if let (
                AssignScope::Class,
                Some(OpenScope {
                    scope: Scope::Class(idx),
                    ..
                }),
            ) = (scope, stack.last())
            {
                decls.classes[*idx]
                    .body_assignments
                    .push((name.clone(), line.start));
            }
            decls.assignments.push(Assignment {
                name,
                line: line.start,
                scope,
                annotation,
                value,
            });
        }
    }

    decls
}

fn degrade(decls: &mut Declarations, line: usize, reason: &str) {
    if decls.degraded.is_none() {
        decls.degraded = Some((line, reason.to_string()));
    }
}

fn docstring_of(line: &LogicalLine) -> Docstring {
    Docstring {
        line: line.start,
        text: line
            .strings
            .first()
            .map(|s| s.value.clone())
            .unwrap_or_default(),
    }
}

fn decorator_name(text: &str) -> String {
    text.split('(').next().unwrap_or(text).trim().to_string()
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn leading_identifier(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

/// Byte index of the first `ch` at bracket depth zero.
fn find_top_level(text: &str, ch: char) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if c == ch && depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Index of a plain assignment `=` at depth zero (not `==`, `<=`, `+=`, ...).
fn find_assign_eq(text: &str) -> Option<(usize, bool)> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (idx, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                let next = bytes.get(idx + 1).copied();
                if next == Some(b'=') {
                    return None;
                }
                let prev = idx.checked_sub(1).map(|p| bytes[p]);
                let augmented = matches!(
                    prev,
                    Some(b'=' | b'!' | b'<' | b'>' | b':' | b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' | b'@')
                );
                return Some((idx, augmented));
            }
            _ => {}
        }
    }
    None
}

struct FunctionHeader<'a> {
    name: &'a str,
    is_async: bool,
    params: &'a str,
    returns: Option<&'a str>,
    tail: &'a str,
}

fn parse_function_header(code: &str) -> Option<FunctionHeader<'_>> {
    let (is_async, rest) = match code.strip_prefix("async") {
        Some(rest) => (true, rest.trim_start()),
        None => (false, code),
    };
    let rest = rest.strip_prefix("def")?.trim_start();
    let name = leading_identifier(rest);
    if name.is_empty() {
        return None;
    }
    let mut after = rest[name.len()..].trim_start();
    if after.starts_with('[') {
        let close = matching_close(after, 0)?;
        after = after[close + 1..].trim_start();
    }
    if !after.starts_with('(') {
        return None;
    }
    let close = matching_close(after, 0)?;
    let params = &after[1..close];
    let remainder = after[close + 1..].trim_start();
    let colon = find_top_level(remainder, ':')?;
    let returns = remainder[..colon]
        .trim()
        .strip_prefix("->")
        .map(str::trim)
        .filter(|r| !r.is_empty());
    Some(FunctionHeader {
        name,
        is_async,
        params,
        returns,
        tail: &remainder[colon + 1..],
    })
}

struct ClassHeader<'a> {
    name: &'a str,
    bases: Vec<String>,
}

fn parse_class_header(code: &str) -> Option<ClassHeader<'_>> {
    let rest = code.strip_prefix("class")?.trim_start();
    let name = leading_identifier(rest);
    if name.is_empty() {
        return None;
    }
    let mut after = rest[name.len()..].trim_start();
    if after.starts_with('[') {
        let close = matching_close(after, 0)?;
        after = after[close + 1..].trim_start();
    }
    let mut bases = Vec::new();
    if after.starts_with('(') {
        let close = matching_close(after, 0)?;
        bases = split_top_level(&after[1..close], ',')
            .into_iter()
            .map(str::trim)
            .filter(|b| !b.is_empty() && find_assign_eq(b).is_none())
            .map(str::to_string)
            .collect();
        after = after[close + 1..].trim_start();
    }
    if !after.starts_with(':') {
        return None;
    }
    Some(ClassHeader { name, bases })
}

fn parse_params(text: &str) -> Vec<Param> {
    split_top_level(text, ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "*" && *p != "/")
        .map(|raw| {
            let without_default = match find_assign_eq(raw) {
                Some((idx, _)) => raw[..idx].trim(),
                None => raw,
            };
            let (kind, rest) = if let Some(rest) = without_default.strip_prefix("**") {
                (ParamKind::KwArgs, rest)
            } else if let Some(rest) = without_default.strip_prefix('*') {
                (ParamKind::VarArgs, rest)
            } else {
                (ParamKind::Regular, without_default)
            };
            let (name, annotation) = match find_top_level(rest, ':') {
                Some(idx) => (
                    rest[..idx].trim(),
                    Some(rest[idx + 1..].trim().to_string()).filter(|a| !a.is_empty()),
                ),
                None => (rest.trim(), None),
            };
            Param {
                name: name.to_string(),
                annotation,
                kind,
            }
        })
        .collect()
}

fn summarize_body(body: &mut BodySummary, code: &str) {
    let first = leading_identifier(code);
    match first {
        "raise" => {
            let rest = code["raise".len()..].trim();
            let name = rest
                .split(|c: char| c == '(' || c.is_whitespace())
                .next()
                .unwrap_or("");
            body.raises.push(name.to_string());
        }
        "return" => {
            let rest = code["return".len()..].trim();
            if !rest.is_empty() && rest != "None" {
                body.returns_value = true;
            }
        }
        _ => {}
    }
    if YIELD_KEYWORD.is_match(code) {
        body.yields = true;
    }
}

/// Names bound by a simple assignment or annotated declaration.
fn parse_assignment(code: &str) -> Vec<(String, Option<String>, Option<String>)> {
    let first = leading_identifier(code);
    if STATEMENT_KEYWORDS.contains(&first) && code[first.len()..].starts_with(|c: char| c.is_whitespace() || c == ':' || c == '(') {
        return Vec::new();
    }

    let (target, value) = match find_assign_eq(code) {
        Some((_, true)) => return Vec::new(),
        Some((idx, false)) => (code[..idx].trim(), Some(code[idx + 1..].trim().to_string())),
        None => (code, None),
    };

    if let Some(colon) = find_top_level(target, ':') {
        let name = target[..colon].trim();
        let annotation = target[colon + 1..].trim();
        if is_identifier(name) && !annotation.is_empty() {
            return vec![(name.to_string(), Some(annotation.to_string()), value)];
        }
        return Vec::new();
    }
    let Some(value) = value else {
        return Vec::new();
    };

    let target = target.trim_matches(|c| c == '(' || c == ')' || c == '[' || c == ']');
    let names: Vec<&str> = split_top_level(target, ',')
        .into_iter()
        .map(|n| n.trim().trim_start_matches('*').trim_matches(|c| c == '(' || c == ')' || c == '[' || c == ']'))
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() || !names.iter().all(|n| is_identifier(n)) {
        return Vec::new();
    }
    let single = names.len() == 1;
    names
        .into_iter()
        .map(|n| (n.to_string(), None, single.then(|| value.clone())))
        .collect()
}
