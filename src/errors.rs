//! Diagnostics for the parsing layer.
//!
//! A single error struct carries what went wrong, where it happened, and the
//! named source to render it against. Expected refactoring rejections are not
//! errors: the engine signals them through its boolean return, and malformed
//! trees are programming errors that panic. Only the parser produces
//! [`HoistError`] values.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use thiserror::Error;

/// Names a piece of source text for error reporting.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content.
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when real source is unavailable.
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "fallback".to_string(),
            content: format!("// {}", context),
        }
    }

    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("default context")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    MalformedConstruct { construct: String },
    UnexpectedToken { expected: String, found: String },
}

impl ErrorKind {
    /// Error code suffix for diagnostic codes.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::MalformedConstruct { .. } => "malformed_construct",
            Self::UnexpectedToken { .. } => "unexpected_token",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedConstruct { construct } => {
                write!(f, "Parse error: {}", construct)
            }
            ErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "Parse error: expected {}, found {}", expected, found)
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct HoistError {
    pub kind: ErrorKind,
    pub src: Arc<NamedSource<String>>,
    pub span: SourceSpan,
}

impl HoistError {
    pub fn parse(kind: ErrorKind, ctx: &SourceContext, span: SourceSpan) -> Self {
        Self {
            kind,
            src: ctx.to_named_source(),
            span,
        }
    }
}

impl Diagnostic for HoistError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("hoist::parse::{}", self.kind.code_suffix())))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_with_span(Some("here".to_string()), self.span);
        Some(Box::new(std::iter::once(label)))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(self.src.as_ref())
    }
}
