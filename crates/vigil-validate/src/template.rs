//! The Template Validator: syntax and name-level checks only.
//!
//! Entity and state references inside template text are synthesized during
//! extraction and flow through the State Validator; this validator never
//! re-derives them, so each template concern is checked in exactly one place.

use std::sync::LazyLock;

use regex::Regex;

use vigil_core::{IssueType, Reference, ReferenceKind, ValidationIssue};

use crate::catalog::{FILTERS, TESTS, is_known_filter, is_known_test};
use crate::suggest::nearest;

/// Names extracted from a successfully parsed template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTemplate {
    pub filters: Vec<String>,
    pub tests: Vec<String>,
}

/// Seam to the template engine.
///
/// The bundled [`BasicTemplateParser`] covers delimiter balance and name
/// extraction; a host integration can substitute its engine's real parser.
pub trait TemplateParser {
    /// Parse `source`, returning the filter and test names it uses.
    ///
    /// # Errors
    ///
    /// Returns the engine's diagnostic message when the template does not
    /// parse.
    fn parse(&self, source: &str) -> Result<ParsedTemplate, String>;
}

static FILTER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\|\s*([A-Za-z_][A-Za-z0-9_]*)").expect("hard-coded pattern compiles")
});

static TEST_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bis\s+(?:not\s+)?([A-Za-z_][A-Za-z0-9_]*)").expect("hard-coded pattern compiles")
});

/// Bundled parser: delimiter-balance checking plus regex name extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicTemplateParser;

impl BasicTemplateParser {
    fn check_balance(source: &str) -> Result<(), String> {
        let mut open: Option<&str> = None;
        let bytes = source.as_bytes();
        let mut i = 0;
        // Delimiters are pure ASCII, so byte-pair matching is safe on
        // arbitrary UTF-8 input.
        while i + 1 < bytes.len() {
            match &bytes[i..i + 2] {
                pair @ (b"{{" | b"{%") => {
                    if open.is_some() {
                        return Err("nested block opener inside an open block".to_string());
                    }
                    open = Some(if pair == b"{{" { "}}" } else { "%}" });
                    i += 2;
                }
                pair @ (b"}}" | b"%}") => {
                    let found = if pair == b"}}" { "}}" } else { "%}" };
                    match open {
                        Some(expected) if expected == found => {
                            open = None;
                            i += 2;
                        }
                        Some(expected) => {
                            return Err(format!("expected '{expected}' but found '{found}'"));
                        }
                        None => return Err(format!("'{found}' without a matching opener")),
                    }
                }
                _ => i += 1,
            }
        }
        match open {
            Some(expected) => Err(format!("unterminated block, expected '{expected}'")),
            None => Ok(()),
        }
    }
}

impl TemplateParser for BasicTemplateParser {
    fn parse(&self, source: &str) -> Result<ParsedTemplate, String> {
        Self::check_balance(source)?;
        let filters = FILTER_NAME
            .captures_iter(source)
            .map(|caps| caps[1].to_string())
            .collect();
        let tests = TEST_NAME
            .captures_iter(source)
            .map(|caps| caps[1].to_string())
            .collect();
        Ok(ParsedTemplate { filters, tests })
    }
}

/// Runs the parser over every `Template` reference.
pub struct TemplateValidator<'a> {
    parser: &'a dyn TemplateParser,
    strict: bool,
}

impl<'a> TemplateValidator<'a> {
    #[must_use]
    pub fn new(parser: &'a dyn TemplateParser, strict: bool) -> Self {
        Self { parser, strict }
    }

    /// Check each template reference. Non-template references are ignored.
    #[must_use]
    pub fn validate(&self, references: &[Reference]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for reference in references {
            if reference.kind != ReferenceKind::Template {
                continue;
            }
            match self.parser.parse(&reference.target) {
                Err(detail) => {
                    issues.push(ValidationIssue::new(
                        IssueType::TemplateParseError,
                        "template",
                        &reference.rule_id,
                        &reference.path,
                        format!("template does not parse: {detail}"),
                    ));
                }
                Ok(parsed) if self.strict => {
                    for filter in &parsed.filters {
                        if !is_known_filter(filter) {
                            let mut issue = ValidationIssue::new(
                                IssueType::UnknownTemplateFilter,
                                filter,
                                &reference.rule_id,
                                &reference.path,
                                format!("filter \"{filter}\" is not in the catalog"),
                            );
                            if let Some(suggestion) = nearest(filter, FILTERS.iter().copied()) {
                                issue = issue.with_suggestion(suggestion);
                            }
                            issues.push(issue);
                        }
                    }
                    for test in &parsed.tests {
                        if !is_known_test(test) {
                            let mut issue = ValidationIssue::new(
                                IssueType::UnknownTemplateTest,
                                test,
                                &reference.rule_id,
                                &reference.path,
                                format!("test \"{test}\" is not in the catalog"),
                            );
                            if let Some(suggestion) = nearest(test, TESTS.iter().copied()) {
                                issue = issue.with_suggestion(suggestion);
                            }
                            issues.push(issue);
                        }
                    }
                }
                Ok(_) => {}
            }
        }
        issues
    }
}
