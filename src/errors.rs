//! Error types with rich diagnostics using miette
//!
//! Syntax errors in the attribute mini-languages (conditions, points, path
//! data) carry source spans so a loader can highlight the offending part of
//! the attribute. Loader-level problems are collected as [`Diagnostic`]s
//! instead of aborting.

use std::fmt;

use miette::{Severity, SourceSpan};
use thiserror::Error;

use crate::Rule;

// ============================================================================
// Syntax Errors
// ============================================================================

/// Malformed condition text
#[derive(Error, miette::Diagnostic, Debug, Clone, PartialEq)]
#[error("invalid condition: {message}")]
#[diagnostic(code(compdesc::condition::format))]
pub struct ConditionFormatError {
    pub message: String,
    #[source_code]
    pub src: String,
    #[label("{message}")]
    pub span: SourceSpan,
}

impl ConditionFormatError {
    pub fn new(message: impl Into<String>, src: &str, start: usize, end: usize) -> Self {
        Self {
            message: message.into(),
            src: src.to_string(),
            span: (start, end.saturating_sub(start)).into(),
        }
    }

    /// Offset of the first offending character.
    pub fn position_start(&self) -> usize {
        self.span.offset()
    }

    /// Offset one past the last offending character.
    pub fn position_end(&self) -> usize {
        self.span.offset() + self.span.len()
    }

    /// The offending substring.
    pub fn excerpt(&self) -> &str {
        self.src
            .get(self.position_start()..self.position_end())
            .unwrap_or("")
    }
}

/// Malformed point text such as `Start+10,Middle`
#[derive(Error, miette::Diagnostic, Debug, Clone, PartialEq)]
#[error("invalid point {src:?}: {message}")]
#[diagnostic(
    code(compdesc::point::syntax),
    help("points are written `<Start|Middle|End><+|-offset>,<Start|Middle|End><+|-offset>`")
)]
pub struct PointParseError {
    pub message: String,
    #[source_code]
    pub src: String,
    #[label("here")]
    pub span: SourceSpan,
}

impl PointParseError {
    pub(crate) fn from_pest(err: pest::error::Error<Rule>, src: &str) -> Self {
        let (message, span) = pest_parts(&err);
        Self {
            message,
            src: src.to_string(),
            span,
        }
    }
}

/// Malformed path data
#[derive(Error, miette::Diagnostic, Debug, Clone, PartialEq)]
#[error("invalid path data: {message}")]
#[diagnostic(code(compdesc::path::syntax))]
pub struct PathParseError {
    pub message: String,
    #[source_code]
    pub src: String,
    #[label("here")]
    pub span: SourceSpan,
}

impl PathParseError {
    pub(crate) fn from_pest(err: pest::error::Error<Rule>, src: &str) -> Self {
        let (message, span) = pest_parts(&err);
        Self {
            message,
            src: src.to_string(),
            span,
        }
    }
}

fn pest_parts(err: &pest::error::Error<Rule>) -> (String, SourceSpan) {
    use pest::error::{ErrorVariant, InputLocation};

    let span: SourceSpan = match err.location {
        InputLocation::Pos(pos) => (pos, 0).into(),
        InputLocation::Span((start, end)) => (start, end - start).into(),
    };
    let message = match &err.variant {
        ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            let expected: Vec<String> = positives.iter().map(|r| format!("{:?}", r)).collect();
            format!("expected {}", expected.join(" or "))
        }
        ErrorVariant::ParsingError { .. } => "unexpected input".to_string(),
        ErrorVariant::CustomError { message } => message.clone(),
    };
    (message, span)
}

// ============================================================================
// Loader Diagnostics
// ============================================================================

/// Position of a declarative element in the loader's source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Category of a loader diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    MissingAttribute,
    InvalidAttribute,
    InvalidCondition,
    InvalidPoint,
    InvalidPath,
    InvalidValue,
    UnknownElement,
    UnknownProperty,
    DeprecatedSyntax,
    Fatal,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::MissingAttribute => "compdesc::load::missing_attribute",
            DiagnosticCode::InvalidAttribute => "compdesc::load::invalid_attribute",
            DiagnosticCode::InvalidCondition => "compdesc::load::invalid_condition",
            DiagnosticCode::InvalidPoint => "compdesc::load::invalid_point",
            DiagnosticCode::InvalidPath => "compdesc::load::invalid_path",
            DiagnosticCode::InvalidValue => "compdesc::load::invalid_value",
            DiagnosticCode::UnknownElement => "compdesc::load::unknown_element",
            DiagnosticCode::UnknownProperty => "compdesc::load::unknown_property",
            DiagnosticCode::DeprecatedSyntax => "compdesc::load::deprecated",
            DiagnosticCode::Fatal => "compdesc::load::fatal",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found while building a description.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    code: DiagnosticCode,
    message: String,
    location: Option<SourceLocation>,
    help: Option<String>,
}

fn severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Advice => "advice",
    }
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> DiagnosticCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<SourceLocation> {
        self.location
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", severity_name(self.severity), self.message)
    }
}

impl std::error::Error for Diagnostic {}

impl miette::Diagnostic for Diagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }
}

/// Ordered list of diagnostics produced by a load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ============================================================================
// Fatal Load Errors
// ============================================================================

/// Unrecoverable failure of a whole load
#[derive(Error, miette::Diagnostic, Debug)]
pub enum LoadError {
    #[error("{message}")]
    #[diagnostic(code(compdesc::load::aborted))]
    Aborted { message: String },

    #[error("failed to read description source")]
    #[diagnostic(code(compdesc::load::io))]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub fn aborted(message: impl Into<String>) -> Self {
        LoadError::Aborted {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_error_positions() {
        let err = ConditionFormatError::new("unbalanced bracket", "($a==1", 0, 1);
        assert_eq!(err.position_start(), 0);
        assert_eq!(err.position_end(), 1);
        assert_eq!(err.excerpt(), "(");
        assert_eq!(err.to_string(), "invalid condition: unbalanced bracket");
    }

    #[test]
    fn diagnostic_display_and_severity() {
        let diag = Diagnostic::warning(DiagnosticCode::UnknownElement, "unknown element `arc`")
            .with_location(Some(SourceLocation::new(3, 5)));
        assert_eq!(diag.to_string(), "warning: unknown element `arc`");
        assert_eq!(diag.location(), Some(SourceLocation::new(3, 5)));
        assert!(!diag.is_error());
        assert_eq!(
            miette::Diagnostic::severity(&diag),
            Some(Severity::Warning)
        );
    }

    #[test]
    fn diagnostics_preserve_order() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning(DiagnosticCode::DeprecatedSyntax, "first"));
        diags.push(Diagnostic::error(DiagnosticCode::MissingAttribute, "second"));
        let messages: Vec<&str> = diags.iter().map(Diagnostic::message).collect();
        assert_eq!(messages, ["first", "second"]);
        assert!(diags.has_errors());
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(diags.warnings().count(), 1);
    }
}
