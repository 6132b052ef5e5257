use std::{fmt, path::PathBuf};

use crate::token::Span;

/// A single source file loaded into memory.
///
/// Tokens and syntax tree nodes carry byte [`Span`]s; the line and column of
/// a diagnostic are derived on demand, only for spans that are actually
/// reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the project source root.
    pub path: PathBuf,
    pub contents: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> SourceFile {
        SourceFile {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Returns the 1-based line and column at which the given span starts.
    ///
    /// The span must lie within this file's contents.
    pub fn position(&self, span: Span) -> Position {
        let prefix = &self.contents[..span.lo];
        let line = prefix.bytes().filter(|&b| b == b'\n').count() + 1;
        let column = match prefix.rfind('\n') {
            Some(nl) => span.lo - nl,
            None => span.lo + 1,
        };
        Position {
            line: u32::try_from(line).unwrap(),
            column: u32::try_from(column).unwrap(),
        }
    }
}

/// A 1-based line and column pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A user-facing compilation error or warning, already resolved to a file
/// and (when the error concerns a specific location) a line and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub file: PathBuf,
    /// Absent for errors that concern the file (or the program) as a whole.
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<PathBuf>,
        position: Option<Position>,
        message: impl Into<String>,
    ) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            file: file.into(),
            position,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostic {
            severity,
            message,
            file,
            position,
        } = self;
        match position {
            Some(position) => write!(f, "{}:{position}: {severity}: {message}", file.display()),
            None => write!(f, "{}: {severity}: {message}", file.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::token::Span;

    fn pos(line: u32, column: u32) -> Position {
        Position { line, column }
    }

    #[test]
    fn test_position_single_line() {
        let file = SourceFile::new("main.li", "let x = 1;");
        assert_eq!(file.position(Span::new_of_length(0, 3)), pos(1, 1));
        assert_eq!(file.position(Span::new_of_length(4, 1)), pos(1, 5));
    }

    #[test]
    fn test_position_multi_line() {
        let file = SourceFile::new("main.li", "fn main() {\n  let x = 1;\n}\n");
        // `let` starts at byte 14, line 2, column 3.
        assert_eq!(file.position(Span::new_of_length(14, 3)), pos(2, 3));
        // Start of line 2.
        assert_eq!(file.position(Span::new_of_length(12, 1)), pos(2, 1));
        // Closing brace on line 3.
        assert_eq!(file.position(Span::new_of_length(25, 1)), pos(3, 1));
    }

    #[test]
    fn test_position_at_end_of_file() {
        let file = SourceFile::new("main.li", "a\nb");
        assert_eq!(file.position(Span::new_of_length(3, 0)), pos(2, 2));
    }

    #[test]
    fn test_diagnostic_display() {
        let with_pos = Diagnostic::error("src/main.li", Some(pos(3, 7)), "unexpected character");
        assert_eq!(
            with_pos.to_string(),
            "src/main.li:3:7: error: unexpected character"
        );

        let without_pos = Diagnostic::error("src/main.li", None, "invalid UTF-8");
        assert_eq!(without_pos.to_string(), "src/main.li: error: invalid UTF-8");
    }
}
