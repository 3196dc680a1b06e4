//! Inline directives for suppressing diagnostics
//!
//! - `// sekisho-disable-next-line I001` disables I001 on the following line
//! - `// sekisho-disable-line no-cycle` disables a rule (by id or name) on this line
//! - `// sekisho-disable-file I006` disables a rule for the whole file
//! - without rule references the directive covers every rule
//! - several rules are separated by commas, and anything after ` -- ` is a
//!   free-form justification
//!
//! Block comments (`/* sekisho-disable-line */`) work the same way.

use std::collections::HashMap;

const PREFIX: &str = "sekisho-disable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    NextLine,
    Line,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisableDirective {
    pub line: usize,
    /// Rule ids or names; empty means every rule.
    pub rules: Vec<String>,
}

impl DisableDirective {
    pub fn new(line: usize, rules: Vec<String>) -> Self {
        Self { line, rules }
    }

    pub fn for_all_rules(line: usize) -> Self {
        Self::new(line, Vec::new())
    }

    pub fn disables_all(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn disables_rule(&self, rule_ref: &str) -> bool {
        self.rules.is_empty()
            || self
                .rules
                .iter()
                .any(|rule| rule.eq_ignore_ascii_case(rule_ref))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisableDirectives {
    by_line: HashMap<usize, Vec<DisableDirective>>,
    file: Vec<DisableDirective>,
}

impl DisableDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_source(source: &str) -> Self {
        let mut directives = Self::new();

        for (index, line) in source.lines().enumerate() {
            let line_num = index + 1;
            let Some((scope, rules)) = comment_body(line).and_then(parse_directive) else {
                continue;
            };
            match scope {
                Scope::NextLine => directives.add(DisableDirective::new(line_num + 1, rules)),
                Scope::Line => directives.add(DisableDirective::new(line_num, rules)),
                Scope::File => directives.file.push(DisableDirective::new(line_num, rules)),
            }
        }

        directives
    }

    pub fn add(&mut self, directive: DisableDirective) {
        self.by_line.entry(directive.line).or_default().push(directive);
    }

    /// Whether `rule_ref` (an id such as `I002`, or a name) is silenced on `line`.
    pub fn is_disabled(&self, line: usize, rule_ref: &str) -> bool {
        self.file.iter().any(|d| d.disables_rule(rule_ref))
            || self
                .by_line
                .get(&line)
                .is_some_and(|all| all.iter().any(|d| d.disables_rule(rule_ref)))
    }

    pub fn directives(&self) -> impl Iterator<Item = &DisableDirective> {
        self.file.iter().chain(self.by_line.values().flatten())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.file.len() + self.by_line.values().map(Vec::len).sum::<usize>()
    }
}

/// Text of the comment on `line`, if the comment starts with the directive prefix.
fn comment_body(line: &str) -> Option<&str> {
    if let Some(start) = line.find("//") {
        let body = line[start + 2..].trim();
        if body.starts_with(PREFIX) {
            return Some(body);
        }
    }
    let start = line.find("/*")?;
    let rest = &line[start + 2..];
    let body = rest.split("*/").next().unwrap_or(rest).trim();
    body.starts_with(PREFIX).then_some(body)
}

fn parse_directive(body: &str) -> Option<(Scope, Vec<String>)> {
    let rest = body.strip_prefix(PREFIX)?;
    let (scope, rest) = if let Some(rest) = rest.strip_prefix("-next-line") {
        (Scope::NextLine, rest)
    } else if let Some(rest) = rest.strip_prefix("-line") {
        (Scope::Line, rest)
    } else if let Some(rest) = rest.strip_prefix("-file") {
        (Scope::File, rest)
    } else {
        return None;
    };
    if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }

    let rules = rest.split(" -- ").next().unwrap_or(rest);
    let rules = rules
        .split(',')
        .map(|rule| rule.trim().to_string())
        .filter(|rule| !rule.is_empty())
        .collect();
    Some((scope, rules))
}
