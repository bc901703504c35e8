//! Line-oriented lexer for Python source.
//!
//! Produces logical lines (bracketed and backslash continuations joined),
//! with comments removed and string literals pulled out. Each logical line has
//! two views:
//! - `code`: string contents emptied (`"abc"` becomes `""`, prefixes kept), so
//!   token scans never look inside literals;
//! - `raw`: literals kept verbatim, used by the literal-pattern scans.
//!
//! The lexer never fails. Unterminated strings and unbalanced brackets are
//! reported through [`Lexed::degraded`] and lexing continues best effort.

/// A string literal with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrLit {
    pub value: String,
    pub prefix: String,
    pub line: usize,
    pub triple: bool,
}

impl StrLit {
    pub fn is_fstring(&self) -> bool {
        self.prefix.chars().any(|c| c == 'f' || c == 'F')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalLine {
    /// First physical line, 1-based
    pub start: usize,
    /// Last physical line, 1-based
    pub end: usize,
    /// Indentation width of the first physical line (tabs advance to multiples of 8)
    pub indent: usize,
    pub code: String,
    pub raw: String,
    pub strings: Vec<StrLit>,
}

impl LogicalLine {
    /// A statement consisting of a single string literal (docstrings).
    pub fn is_lone_string(&self) -> bool {
        if self.strings.len() != 1 {
            return false;
        }
        let code = self.code.trim();
        let quotes = code.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
        matches!(quotes, "\"\"" | "''" | "\"\"\"\"\"\"" | "''''''")
    }

    pub fn starts_with_keyword(&self, keyword: &str) -> bool {
        let code = self.code.trim_start();
        code.strip_prefix(keyword)
            .map(|rest| rest.is_empty() || !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    pub lines: Vec<LogicalLine>,
    pub comments: Vec<(usize, String)>,
    /// First structural problem found, with its line
    pub degraded: Option<(usize, String)>,
}

impl Lexed {
    fn degrade(&mut self, line: usize, reason: impl Into<String>) {
        if self.degraded.is_none() {
            self.degraded = Some((line, reason.into()));
        }
    }
}

struct Builder {
    current: LogicalLine,
    has_content: bool,
    depth: usize,
}

impl Builder {
    fn new() -> Self {
        Self {
            current: LogicalLine::default(),
            has_content: false,
            depth: 0,
        }
    }

    fn push(&mut self, c: char) {
        self.current.code.push(c);
        self.current.raw.push(c);
        if !c.is_whitespace() {
            self.has_content = true;
        }
    }

    fn start_if_needed(&mut self, line: usize, indent: usize) {
        if !self.has_content && self.current.code.trim().is_empty() {
            self.current.start = line;
            self.current.indent = indent;
        }
    }

    fn finish(&mut self, end: usize, out: &mut Vec<LogicalLine>) {
        if self.has_content {
            let mut line = std::mem::take(&mut self.current);
            line.end = end;
            line.code = line.code.trim_end().to_string();
            line.raw = line.raw.trim_end().to_string();
            out.push(line);
        } else {
            self.current = LogicalLine::default();
        }
        self.has_content = false;
    }
}

fn measure_indent(chars: &[char], start: usize) -> usize {
    let mut width = 0;
    for &c in &chars[start..] {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            '\x0c' => width = 0,
            _ => break,
        }
    }
    width
}

/// Trailing string prefix letters already pushed to the code buffer.
fn trailing_prefix(code: &str) -> String {
    let letters: String = code
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let before = code[..code.len() - letters.len()].chars().last();
    let boundary = before.map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
    let valid = letters.len() <= 2
        && letters
            .chars()
            .all(|c| matches!(c, 'r' | 'R' | 'b' | 'B' | 'u' | 'U' | 'f' | 'F'));
    if boundary && valid {
        letters
    } else {
        String::new()
    }
}

pub fn lex(source: &str) -> Lexed {
    let chars: Vec<char> = source.chars().collect();
    let mut lexed = Lexed::default();
    let mut builder = Builder::new();
    let mut line = 1;
    let mut at_line_start = true;
    let mut i = 0;

    while i < chars.len() {
        if at_line_start {
            at_line_start = false;
            if builder.depth == 0 && !builder.has_content {
                let indent = measure_indent(&chars, i);
                builder.start_if_needed(line, indent);
            }
        }

        let c = chars[i];
        match c {
            '#' => {
                let start = i;
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                let text: String = chars[start + 1..i].iter().collect();
                lexed.comments.push((line, text.trim().to_string()));
                continue;
            }
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                builder.push(' ');
                line += 1;
                i += 2;
                continue;
            }
            '\\' if chars.get(i + 1) == Some(&'\r') && chars.get(i + 2) == Some(&'\n') => {
                builder.push(' ');
                line += 1;
                i += 3;
                continue;
            }
            '\r' => {
                i += 1;
                continue;
            }
            '\n' => {
                if builder.depth > 0 {
                    builder.push(' ');
                } else {
                    builder.finish(line, &mut lexed.lines);
                }
                line += 1;
                at_line_start = true;
                i += 1;
                continue;
            }
            '\'' | '"' => {
                let prefix = trailing_prefix(&builder.current.code);
                let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                let start_line = line;
                let open_len = if triple { 3 } else { 1 };
                let mut j = i + open_len;
                let mut value = String::new();
                let mut closed = false;
                while j < chars.len() {
                    let ch = chars[j];
                    if ch == '\\' && j + 1 < chars.len() {
                        value.push(ch);
                        value.push(chars[j + 1]);
                        if chars[j + 1] == '\n' {
                            line += 1;
                        }
                        j += 2;
                        continue;
                    }
                    if ch == c {
                        if !triple {
                            closed = true;
                            j += 1;
                            break;
                        }
                        if chars.get(j + 1) == Some(&c) && chars.get(j + 2) == Some(&c) {
                            closed = true;
                            j += 3;
                            break;
                        }
                    }
                    if ch == '\n' {
                        if !triple {
                            break;
                        }
                        line += 1;
                    }
                    value.push(ch);
                    j += 1;
                }
                if !closed {
                    lexed.degrade(start_line, "unterminated string literal");
                }

                let quote: String = std::iter::repeat(c).take(open_len).collect();
                builder.current.code.push_str(&quote);
                builder.current.code.push_str(&quote);
                builder.current.raw.push_str(&quote);
                builder.current.raw.push_str(&value);
                builder.current.raw.push_str(&quote);
                builder.has_content = true;
                builder.current.strings.push(StrLit {
                    value,
                    prefix,
                    line: start_line,
                    triple,
                });
                i = j;
                continue;
            }
            ';' if builder.depth == 0 => {
                // Simple statements joined by `;` become separate logical lines
                let (start, indent) = (builder.current.start, builder.current.indent);
                builder.finish(line, &mut lexed.lines);
                builder.current.start = start;
                builder.current.indent = indent;
                let pad = " ".repeat(indent);
                builder.current.code.push_str(&pad);
                builder.current.raw.push_str(&pad);
                i += 1;
                while matches!(chars.get(i), Some(' ' | '\t')) {
                    i += 1;
                }
                continue;
            }
            '(' | '[' | '{' => {
                builder.depth += 1;
            }
            ')' | ']' | '}' => {
                if builder.depth == 0 {
                    lexed.degrade(line, format!("unbalanced closing '{c}'"));
                } else {
                    builder.depth -= 1;
                }
            }
            _ => {}
        }
        builder.push(c);
        i += 1;
    }

    if builder.depth > 0 {
        lexed.degrade(line, "unclosed bracket at end of file");
    }
    builder.finish(line, &mut lexed.lines);
    lexed
}

/// Split on `sep` at bracket depth zero. Intended for masked code.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if c == sep && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Byte index of the bracket closing the one opened at `open_idx`.
pub fn matching_close(text: &str, open_idx: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text[open_idx..].char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open_idx + idx);
                }
            }
            _ => {}
        }
    }
    None
}
