//! Static extraction of import statements from Python source.
//!
//! The source is first reduced to logical lines: comments and string
//! literals are dropped, bracketed and backslash-continued lines are joined.
//! Each logical line is then split on `;` and matched against the two import
//! forms, looking past the header of one-line compound statements such as
//! `except ImportError: import json`. Nothing is evaluated, so `importlib.import_module("x")` and
//! `__import__("x")` are invisible by construction.

use regex::Regex;
use std::sync::LazyLock;

/// `from <dots><module> import <names>`
static FROM_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^from\s+(\.*)\s*([^\W\d][\w.]*)?\s+import\s+(.+)$")
        .expect("FROM_IMPORT must compile")
});

/// A dotted module path such as `os.path` or `PIL.Image`.
static DOTTED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\W\d]\w*(\.[^\W\d]\w*)*$").expect("DOTTED_NAME must compile")
});

/// Statements whose header ends in `:` and may carry a one-line body, as in
/// `try: import ujson as json`.
const COMPOUND_KEYWORDS: &[&str] = &[
    "try", "except", "else", "finally", "if", "elif", "while", "for", "with", "def", "class",
];

/// One module reference found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Dotted module path, empty for `from . import x`.
    pub module: String,
    /// Number of leading dots (0 for absolute imports).
    pub level: usize,
    /// Names imported by a `from` statement (may be submodules).
    pub names: Vec<String>,
}

impl ImportStatement {
    fn absolute(module: &str) -> Self {
        Self {
            module: module.to_string(),
            level: 0,
            names: Vec::new(),
        }
    }

    /// Whether this is a relative (`from .x import y`) import.
    pub fn is_relative(&self) -> bool {
        self.level > 0
    }

    /// First component of the module path.
    pub fn top_level(&self) -> Option<&str> {
        self.module.split('.').next().filter(|s| !s.is_empty())
    }
}

/// Extract every import statement from `source`, in order of appearance.
pub fn parse_imports(source: &str) -> Vec<ImportStatement> {
    let mut imports = Vec::new();
    for line in logical_lines(source) {
        for statement in line.split(';') {
            parse_statement(statement.trim(), &mut imports);
        }
    }
    imports
}

fn parse_statement(statement: &str, out: &mut Vec<ImportStatement>) {
    if let Some(body) = compound_body(statement) {
        parse_statement(body, out);
        return;
    }

    if let Some(rest) = statement.strip_prefix("import") {
        if !rest.starts_with(char::is_whitespace) {
            return;
        }
        for part in rest.split(',') {
            let module = strip_alias(part);
            if DOTTED_NAME.is_match(module) {
                out.push(ImportStatement::absolute(module));
            }
        }
        return;
    }

    let Some(caps) = FROM_IMPORT.captures(statement) else {
        return;
    };
    let level = caps.get(1).map_or(0, |m| m.as_str().len());
    let module = caps.get(2).map_or("", |m| m.as_str());
    if level == 0 && module.is_empty() {
        return;
    }
    if !module.is_empty() && !DOTTED_NAME.is_match(module) {
        return;
    }

    let names = caps
        .get(3)
        .map_or("", |m| m.as_str())
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(strip_alias)
        .filter(|n| !n.is_empty() && *n != "*" && DOTTED_NAME.is_match(n))
        .map(str::to_string)
        .collect();

    out.push(ImportStatement {
        module: module.to_string(),
        level,
        names,
    });
}

/// The text after a compound statement's header colon, if `statement` is
/// one. Colons inside brackets (slices, dicts, annotations) don't count.
fn compound_body(statement: &str) -> Option<&str> {
    let statement = statement.strip_prefix("async ").unwrap_or(statement).trim_start();
    let keyword_len = statement
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(statement.len());
    if !COMPOUND_KEYWORDS.contains(&&statement[..keyword_len]) {
        return None;
    }

    let mut depth: usize = 0;
    for (i, c) in statement.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return Some(statement[i + 1..].trim()),
            _ => {}
        }
    }
    None
}

fn strip_alias(part: &str) -> &str {
    let part = part.trim();
    match part.split_once(" as ") {
        Some((name, _)) => name.trim(),
        None => part.split_whitespace().next().unwrap_or(""),
    }
}

/// Reduce source text to logical lines without comments or string contents.
fn logical_lines(source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '"' | '\'' => {
                skip_string(c, &mut chars);
                current.push_str("\"\"");
            }
            '\\' if chars.peek() == Some(&'\n') => {
                chars.next();
                current.push(' ');
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '\n' if depth > 0 => current.push(' '),
            '\n' => flush(&mut current, &mut lines),
            '\r' => {}
            _ => current.push(c),
        }
    }
    flush(&mut current, &mut lines);
    lines
}

fn flush(current: &mut String, lines: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
    current.clear();
}

/// Consume a string literal whose opening quote `quote` was just read.
fn skip_string(quote: char, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    let triple = if chars.peek() == Some(&quote) {
        chars.next();
        if chars.peek() == Some(&quote) {
            chars.next();
            true
        } else {
            // Empty string literal.
            return;
        }
    } else {
        false
    };

    let mut run = 0;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
                run = 0;
            }
            '\n' if !triple => return,
            c if c == quote => {
                run += 1;
                if !triple || run == 3 {
                    return;
                }
            }
            _ => run = 0,
        }
    }
}
