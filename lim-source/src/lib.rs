//! Source code representation and error management.

use std::{cell::RefCell, fmt, ops::Range};

/// Represents source code.
pub struct Source<'a> {
    /// Original source code.
    pub content: &'a str,
    /// Accumulated errors.
    pub errors: ErrorReporter,
}

impl<'a> Source<'a> {
    /// Create a new `Source` with the specified `content`.
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            errors: ErrorReporter::new(),
        }
    }

    /// Returns `true` if `Source` has no accumulated errors. Returns `false` otherwise.
    pub fn has_no_errors(&self) -> bool {
        self.errors.errors.borrow().len() == 0
    }

    /// Finds the line containing the byte `offset`.
    /// Offsets past the end of the content are clamped to the end.
    pub fn locate(&self, offset: usize) -> Location {
        let offset = offset.min(self.content.len());
        let before = &self.content[..offset];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Location {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count(),
            line_start,
        }
    }

    /// Returns the text of the line starting at `line_start`, without its line terminator.
    pub fn line_text(&self, line_start: usize) -> &'a str {
        let rest = &self.content[line_start.min(self.content.len())..];
        let line = match rest.find('\n') {
            Some(end) => &rest[..end],
            None => rest,
        };
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// Renders a [`Diagnostic`] for `message` reported at byte `offset`.
    pub fn diagnostic(&self, message: impl ToString, offset: usize) -> Diagnostic {
        let location = self.locate(offset);
        let line = self.line_text(location.line_start);
        let excerpt = line.trim_start_matches(|c: char| c == ' ' || c == '\t');
        let indent = line.chars().count() - excerpt.chars().count();

        Diagnostic {
            message: message.to_string(),
            line: location.line,
            column: location.column.saturating_sub(indent),
            excerpt: excerpt.to_string(),
        }
    }

    /// Renders every accumulated error, ordered by position.
    /// The lexer runs one token ahead of the parser, so reporting order can differ from source order.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut errors = self.errors.errors();
        errors.sort_by_key(|error| error.span.start);
        Diagnostics(
            errors
                .iter()
                .map(|error| self.diagnostic(&error.message, error.span.start))
                .collect(),
        )
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(content: &'a str) -> Self {
        Source::new(content)
    }
}

/// A position inside a [`Source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 0-based column, counted in characters.
    pub column: usize,
    /// Byte offset of the first character of the line.
    pub line_start: usize,
}

/// Represents a syntax error (compile time error).
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    message: String,
    span: Range<usize>,
}

impl SyntaxError {
    /// Create a new syntax error with the specified `message` and `span`.
    pub fn new(message: impl ToString, span: Range<usize>) -> Self {
        Self {
            message: message.to_string(),
            span,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

/// Manages all the errors.
pub struct ErrorReporter {
    errors: RefCell<Vec<SyntaxError>>,
}

impl ErrorReporter {
    /// Create an empty `ErrorReporter`.
    pub fn new() -> Self {
        Self {
            errors: RefCell::new(Vec::new()),
        }
    }

    /// Adds an error to the `ErrorReporter`.
    /// This method uses the interior mutability pattern. This does not require mutability for ergonomics.
    pub fn add_error(&self, error: SyntaxError) {
        // This should be the only place where self.errors is borrowed mutably.
        self.errors.borrow_mut().push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the accumulated errors.
    pub fn errors(&self) -> Vec<SyntaxError> {
        self.errors.borrow().clone()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// An error rendered against the line it occurred on.
///
/// ```text
/// ERROR: expected `=`, found integer literal at line 2
/// int a 5
/// ------^
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    /// 1-based line number.
    pub line: usize,
    /// Caret offset into `excerpt`.
    pub column: usize,
    /// The offending line with its indentation stripped.
    pub excerpt: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ERROR: {message} at line {line}",
            message = self.message,
            line = self.line
        )?;
        writeln!(f, "{}", self.excerpt)?;
        write!(f, "{}^", "-".repeat(self.column))
    }
}

/// A list of [`Diagnostic`]s, displayed one after the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate() {
        let source = Source::new("int a = 1\nint b = 2\n");
        assert_eq!(
            source.locate(0),
            Location {
                line: 1,
                column: 0,
                line_start: 0
            }
        );
        assert_eq!(
            source.locate(14),
            Location {
                line: 2,
                column: 4,
                line_start: 10
            }
        );
        // past the end
        assert_eq!(source.locate(100).line, 3);
    }

    #[test]
    fn test_line_text() {
        let source = Source::new("first\r\nsecond");
        assert_eq!(source.line_text(0), "first");
        assert_eq!(source.line_text(7), "second");
    }

    #[test]
    fn test_diagnostic_strips_indentation() {
        let source = Source::new("fn f() {\n    int 9x = 1\n}");
        let diagnostic = source.diagnostic("bad identifier", 17);
        assert_eq!(diagnostic.line, 2);
        assert_eq!(diagnostic.excerpt, "int 9x = 1");
        assert_eq!(diagnostic.column, 4);
        assert_eq!(
            diagnostic.to_string(),
            "ERROR: bad identifier at line 2\nint 9x = 1\n----^"
        );
    }

    #[test]
    fn test_error_reporter() {
        let source: Source = "int a 5".into();
        assert!(source.has_no_errors());
        source
            .errors
            .add_error(SyntaxError::new("expected `=`", 6..7));
        assert!(!source.has_no_errors());
        assert_eq!(source.errors.len(), 1);

        let diagnostics = source.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.to_string(),
            "ERROR: expected `=` at line 1\nint a 5\n------^"
        );
    }
}
