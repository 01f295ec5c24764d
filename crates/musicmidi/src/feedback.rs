//! Parser feedback (errors, warnings, notes).
//!
//! The parser keeps going after a bad line so that one pass reports every
//! fault. Each error carries the kind of rule it broke and its source line.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One diagnostic tied to a source line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    /// Set for errors
    pub kind: Option<ErrorKind>,
    pub message: String,
    pub line: usize,
    pub suggestion: Option<String>,
}

impl Feedback {
    fn at(level: FeedbackLevel, kind: Option<ErrorKind>, message: String, line: usize) -> Self {
        Feedback {
            level,
            kind,
            message,
            line,
            suggestion: None,
        }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self::at(FeedbackLevel::Error, Some(kind), message.into(), line)
    }

    pub fn warning(message: impl Into<String>, line: usize) -> Self {
        Self::at(FeedbackLevel::Warning, None, message.into(), line)
    }

    pub fn info(message: impl Into<String>, line: usize) -> Self {
        Self::at(FeedbackLevel::Info, None, message.into(), line)
    }

    /// Attach a hint shown in parentheses after the message
    pub fn with_suggestion(self, hint: impl Into<String>) -> Self {
        Feedback {
            suggestion: Some(hint.into()),
            ..self
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == FeedbackLevel::Error
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match self.kind {
            Some(kind) => write!(f, "{kind}")?,
            None => write!(f, "{}", self.level)?,
        }
        write!(f, ": {}", self.message)?;
        match &self.suggestion {
            Some(hint) => write!(f, " ({hint})"),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLevel {
    /// The line was rejected
    Error,
    /// Parsed with an assumption the user should know about
    Warning,
    Info,
}

impl fmt::Display for FeedbackLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeedbackLevel::Error => "error",
            FeedbackLevel::Warning => "warning",
            FeedbackLevel::Info => "info",
        })
    }
}

/// Which parse rule a line broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The line matches no grammar
    Syntax,
    /// A number is outside its bounds
    Range,
    /// A word is not in the vocabulary
    Reference,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Reference => "ReferenceError",
        })
    }
}

/// Error produced while reading one line, before a line number is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub kind: ErrorKind,
    pub message: String,
    pub suggestion: Option<String>,
}

impl LineError {
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::of(ErrorKind::Syntax, message.into())
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::of(ErrorKind::Range, message.into())
    }

    pub fn reference(message: impl Into<String>) -> Self {
        Self::of(ErrorKind::Reference, message.into())
    }

    fn of(kind: ErrorKind, message: String) -> Self {
        LineError {
            kind,
            message,
            suggestion: None,
        }
    }

    pub fn with_suggestion(self, hint: impl Into<String>) -> Self {
        LineError {
            suggestion: Some(hint.into()),
            ..self
        }
    }

    fn at_line(self, line: usize) -> Feedback {
        Feedback {
            suggestion: self.suggestion,
            ..Feedback::error(self.kind, self.message, line)
        }
    }
}

/// Accumulates feedback while the parser walks the input line by line
#[derive(Debug)]
pub struct FeedbackCollector {
    items: Vec<Feedback>,
    line: usize,
}

impl Default for FeedbackCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackCollector {
    pub fn new() -> Self {
        FeedbackCollector {
            items: Vec::new(),
            line: 1,
        }
    }

    /// Line that subsequent feedback refers to
    pub fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Record a [`LineError`] at the current line
    pub fn reject(&mut self, error: LineError) {
        let item = error.at_line(self.line);
        self.items.push(item);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let item = Feedback::warning(message, self.line);
        self.items.push(item);
    }

    pub fn warning_with_suggestion(&mut self, message: impl Into<String>, hint: impl Into<String>) {
        let item = Feedback::warning(message, self.line).with_suggestion(hint);
        self.items.push(item);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let item = Feedback::info(message, self.line);
        self.items.push(item);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Feedback::is_error)
    }

    pub fn feedback(&self) -> &[Feedback] {
        &self.items
    }

    pub fn into_feedback(self) -> Vec<Feedback> {
        self.items
    }
}

/// A parsed value together with everything the parser had to say about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult<T> {
    pub value: T,
    pub feedback: Vec<Feedback>,
}

impl<T> ParseResult<T> {
    pub fn new(value: T, feedback: Vec<Feedback>) -> Self {
        ParseResult { value, feedback }
    }

    pub fn has_errors(&self) -> bool {
        self.feedback.iter().any(Feedback::is_error)
    }

    fn with_level(&self, level: FeedbackLevel) -> impl Iterator<Item = &Feedback> {
        self.feedback.iter().filter(move |f| f.level == level)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Feedback> {
        self.with_level(FeedbackLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Feedback> {
        self.with_level(FeedbackLevel::Warning)
    }
}
