//! Error types and position tracking for HOCON parsing
//!
//! Every stage of the pipeline has its own error enum; [`HoconError`]
//! unifies them for the public API. Parse-time errors are fatal for the
//! whole parse, accessor-time errors are wrapped with the queried path.

use std::fmt;
use thiserror::Error;

/// Represents a position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Byte offset from start of input (0-based)
    pub offset: usize,
}

impl Position {
    /// Creates a new position at the start of input
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Advances the position by one character
    pub fn advance(&mut self, c: char) {
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }
        self.offset += c.len_utf8();
    }

    /// Advances the position by multiple characters
    pub fn advance_by(&mut self, text: &str) {
        for c in text.chars() {
            self.advance(c);
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Main error type for HOCON operations
#[derive(Debug, Error)]
pub enum HoconError {
    /// Tokenizer error
    #[error("Tokenizer error: {0}")]
    Lex(#[from] LexError),

    /// Parser error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Substitution resolution error
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// A typed accessor could not convert the value found at `path`
    #[error("Invalid value at '{path}': {source}")]
    Value {
        path: String,
        #[source]
        source: ValueError,
    },

    /// The queried path does not exist in the document
    #[error("Path '{path}' not found")]
    PathNotFound { path: String },

    /// Serde deserialization error
    #[error("Deserialize error: {0}")]
    Deserialize(String),
}

/// Tokenizer errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// A character that cannot start any token
    #[error("Invalid token '{character}' at {position}")]
    InvalidToken { character: char, position: Position },

    /// Quoted string not properly terminated
    #[error("Unterminated quoted string at {position}")]
    UnterminatedString { position: Position },

    /// Triple-quoted string not properly terminated
    #[error("Unterminated triple-quoted string at {position}")]
    UnterminatedTripleQuotedString { position: Position },

    /// `${` without a matching `}`
    #[error("Unterminated substitution at {position}")]
    UnterminatedSubstitution { position: Position },

    /// Invalid escape sequence in a quoted string
    #[error("Malformed escape sequence '\\{sequence}' at {position}")]
    InvalidEscape {
        sequence: String,
        position: Position,
    },

    /// Invalid `\uXXXX` escape
    #[error("Invalid unicode escape '\\u{sequence}' at {position}")]
    InvalidUnicodeEscape {
        sequence: String,
        position: Position,
    },

    /// `include` directive with a broken qualifier or argument
    #[error("Malformed include directive at {position}: {message}")]
    MalformedInclude { message: String, position: Position },
}

impl LexError {
    /// Returns the position the error was raised at
    pub fn position(&self) -> Position {
        match self {
            LexError::InvalidToken { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::UnterminatedTripleQuotedString { position }
            | LexError::UnterminatedSubstitution { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::InvalidUnicodeEscape { position, .. }
            | LexError::MalformedInclude { position, .. } => *position,
        }
    }
}

/// Parser errors. `path` is the dotted path being parsed when the error
/// was raised (empty at the document root).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Tokenizer error surfaced while parsing
    #[error("{0}")]
    Lex(#[from] LexError),

    /// Unexpected token encountered
    #[error("Unexpected {token} at {position} (path '{path}'), expected {expected}")]
    UnexpectedToken {
        token: String,
        expected: String,
        path: String,
        position: Position,
    },

    /// Key could not be turned into a path
    #[error("Invalid key '{key}' at {position}: {message}")]
    InvalidKey {
        key: String,
        message: String,
        position: Position,
    },

    /// Concatenation or merge of incompatible value types
    #[error("Type mismatch at '{path}' ({position}): cannot combine {found} with {expected}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
        position: Position,
    },

    /// A document starting with `[` contains more than one array
    #[error("Array document at {position} must not contain anything after the closing ']'")]
    InvalidArrayDocument { position: Position },

    /// Required include returned no content
    #[error("Required include '{name}' at {position} (path '{path}') returned no content")]
    MissingInclude {
        name: String,
        path: String,
        position: Position,
    },

    /// Include nesting exceeded the configured limit
    #[error("Include depth limit of {limit} exceeded at {position} (path '{path}')")]
    IncludeDepthExceeded {
        limit: usize,
        path: String,
        position: Position,
    },

    /// Included document root was not an object
    #[error("Included document '{name}' at {position} must be an object")]
    InvalidInclude { name: String, position: Position },

    /// `${a}` used inside an array that is itself part of `a`
    #[error("Self-referencing substitution '${{{path}}}' at {position} is not allowed inside an array")]
    SelfReferenceInArray { path: String, position: Position },

    /// `${a}` used somewhere inside `a`
    #[error("Substitution '${{{path}}}' at {position} references its parent field '{field}'")]
    ParentReference {
        path: String,
        field: String,
        position: Position,
    },

    /// Substitution cycle
    #[error("Cyclic substitution '${{{path}}}' at {position}: {chain}")]
    CyclicSubstitution {
        path: String,
        chain: String,
        position: Position,
    },
}

impl ParseError {
    /// Returns the position the error was raised at
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(lex) => lex.position(),
            ParseError::UnexpectedToken { position, .. }
            | ParseError::InvalidKey { position, .. }
            | ParseError::TypeMismatch { position, .. }
            | ParseError::InvalidArrayDocument { position }
            | ParseError::MissingInclude { position, .. }
            | ParseError::IncludeDepthExceeded { position, .. }
            | ParseError::InvalidInclude { position, .. }
            | ParseError::SelfReferenceInArray { position, .. }
            | ParseError::ParentReference { position, .. }
            | ParseError::CyclicSubstitution { position, .. } => *position,
        }
    }
}

/// Substitution resolution errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// Required substitution found neither in the document nor the environment
    #[error("Unresolved substitution '${{{path}}}' at {position}")]
    UnresolvedSubstitution { path: String, position: Position },
}

/// Accessor-time conversion errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("'{0}' is not a valid boolean")]
    InvalidBoolean(String),

    #[error("'{text}' is not a valid {expected}")]
    InvalidNumber { text: String, expected: &'static str },

    #[error("'{0}' is not a valid duration")]
    InvalidDuration(String),

    #[error("'{0}' is not a valid byte size")]
    InvalidByteSize(String),

    /// Wrong node kind for the requested accessor
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    /// Object cannot be reinterpreted as an array
    #[error("object cannot be converted to an array: {0}")]
    NotConvertibleToArray(String),
}

/// Context information for enhanced error reporting
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// The original source text
    pub source: String,
    /// Where the error occurred
    pub position: Position,
    /// Additional help text
    pub help: Option<String>,
}

impl ErrorContext {
    /// Creates a new error context
    pub fn new(source: String, position: Position) -> Self {
        Self {
            source,
            position,
            help: None,
        }
    }

    /// Adds help text for the error
    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Extracts lines around the error position, with a caret under the column
    pub fn extract_lines_around(&self, context_lines: usize) -> String {
        let lines: Vec<&str> = self.source.lines().collect();
        if lines.is_empty() {
            return String::new();
        }

        let error_line = self
            .position
            .line
            .saturating_sub(1)
            .min(lines.len().saturating_sub(1));
        let context_start = error_line.saturating_sub(context_lines);
        let context_end = (error_line + context_lines + 1).min(lines.len());
        let width = context_end.to_string().len();

        let mut result = String::new();
        for (i, line) in lines[context_start..context_end].iter().enumerate() {
            let line_num = context_start + i + 1;
            result.push_str(&format!("{:width$} | {}\n", line_num, line, width = width));
            if line_num == error_line + 1 {
                let spaces = " ".repeat(width + 3 + self.position.column.saturating_sub(1));
                result.push_str(&format!("{}^\n", spaces));
            }
        }
        result
    }

    /// Formats the error context for display
    pub fn format_error(&self, error_message: &str) -> String {
        let mut output = format!("Error at {}: {}\n\n", self.position, error_message);
        output.push_str(&self.extract_lines_around(2));
        if let Some(help) = &self.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }
        output
    }
}

/// Error paired with the source snippet it refers to
#[derive(Debug)]
pub struct EnhancedError {
    pub error: HoconError,
    pub context: Option<ErrorContext>,
}

impl EnhancedError {
    /// Formats the error with context if available
    pub fn format(&self) -> String {
        let base_message = self.error.to_string();
        match &self.context {
            Some(ctx) => ctx.format_error(&base_message),
            None => base_message,
        }
    }
}

impl fmt::Display for EnhancedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl std::error::Error for EnhancedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl HoconError {
    /// Wraps `error` for a value found at `path`
    pub fn value(path: impl Into<String>, error: ValueError) -> Self {
        HoconError::Value {
            path: path.into(),
            source: error,
        }
    }

    /// Returns the source position for parse-time errors
    pub fn position(&self) -> Option<Position> {
        match self {
            HoconError::Lex(err) => Some(err.position()),
            HoconError::Parse(err) => Some(err.position()),
            HoconError::Resolve(ResolveError::UnresolvedSubstitution { position, .. }) => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Enhances this error with a snippet of the source text it came from
    pub fn with_source_context(self, source: &str) -> EnhancedError {
        let help = match &self {
            HoconError::Lex(LexError::UnterminatedString { .. }) => {
                Some("Add the closing quote to terminate the string".to_string())
            }
            HoconError::Lex(LexError::InvalidEscape { .. }) => Some(
                "Valid escapes: \\\" \\\\ \\/ \\b \\f \\n \\r \\t and \\uXXXX".to_string(),
            ),
            HoconError::Parse(ParseError::CyclicSubstitution { .. }) => {
                Some("Break the cycle by replacing one substitution with a value".to_string())
            }
            HoconError::Resolve(ResolveError::UnresolvedSubstitution { .. }) => {
                Some("Use ${?path} to make the substitution optional".to_string())
            }
            _ => None,
        };

        let context = self.position().map(|position| {
            let ctx = ErrorContext::new(source.to_string(), position);
            match help {
                Some(help) => ctx.with_help(help),
                None => ctx,
            }
        });

        EnhancedError {
            error: self,
            context,
        }
    }
}

impl serde::de::Error for HoconError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        HoconError::Deserialize(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_new() {
        let pos = Position::new();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn test_position_advance() {
        let mut pos = Position::new();

        pos.advance('a');
        assert_eq!(pos.column, 2);
        assert_eq!(pos.offset, 1);

        pos.advance('\n');
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 2);

        pos.advance('ü');
        assert_eq!(pos.column, 2);
        assert_eq!(pos.offset, 4);
    }

    #[test]
    fn test_position_display() {
        let pos = Position {
            line: 42,
            column: 13,
            offset: 100,
        };
        assert_eq!(format!("{}", pos), "42:13");
    }

    #[test]
    fn test_value_error_wrapping_keeps_path() {
        let err = HoconError::value("a.b", ValueError::InvalidBoolean("maybe".to_string()));
        assert_eq!(
            err.to_string(),
            "Invalid value at 'a.b': 'maybe' is not a valid boolean"
        );
    }

    #[test]
    fn test_source_context_points_at_column() {
        let source = "a = 1\nb = \"open\n";
        let err = HoconError::Lex(LexError::UnterminatedString {
            position: Position {
                line: 2,
                column: 5,
                offset: 10,
            },
        });
        let rendered = err.with_source_context(source).format();
        assert!(rendered.contains("2 | b = \"open"));
        assert!(rendered.contains("       ^"));
        assert!(rendered.contains("Help:"));
    }
}
