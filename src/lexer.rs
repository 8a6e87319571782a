//! HOCON lexical analyzer
//!
//! This module converts raw HOCON text into a flat, position-stamped
//! [`TokenStream`]. The scan is a single forward pass with one character of
//! lookahead; numeric literals are matched speculatively and backtrack to
//! the longest valid prefix through [`HoconLexer::snapshot`] and
//! [`HoconLexer::restore`].
//!
//! Whitespace between tokens is kept as `Whitespace` literals because it is
//! significant for value concatenation (`a = foo bar` is `"foo bar"`), and
//! newlines are their own tokens because they separate fields.

use crate::error::{LexError, Position};

/// Source an include directive asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    /// `include "x"` and `include file("x")`
    File,
    /// `include url("x")`
    Url,
    /// `include classpath("x")`
    Resource,
}

/// Qualifiers of an `include` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludeDirective {
    pub kind: IncludeKind,
    pub required: bool,
}

/// HOCON token types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// A literal; see [`LiteralType`] for the flavour
    LiteralValue,
    /// `:` or `=`
    Assignment,
    /// `+=`
    PlusAssignment,
    Comma,
    /// `{`
    StartOfObject,
    /// `}`
    EndOfObject,
    /// `[`
    StartOfArray,
    /// `]`
    EndOfArray,
    /// `${path}`
    Substitution,
    /// `${?path}`
    OptionalSubstitution,
    /// `include ...`, the token value is the quoted argument
    Include(IncludeDirective),
    /// Significant newline
    EndOfLine,
    EndOfFile,
}

impl TokenType {
    /// Returns a string representation of the token type for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            TokenType::LiteralValue => "literal",
            TokenType::Assignment => "':' or '='",
            TokenType::PlusAssignment => "'+='",
            TokenType::Comma => "','",
            TokenType::StartOfObject => "'{'",
            TokenType::EndOfObject => "'}'",
            TokenType::StartOfArray => "'['",
            TokenType::EndOfArray => "']'",
            TokenType::Substitution | TokenType::OptionalSubstitution => "substitution",
            TokenType::Include(_) => "include",
            TokenType::EndOfLine => "end of line",
            TokenType::EndOfFile => "end of file",
        }
    }
}

/// Flavour of a literal token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralType {
    /// Not a literal token
    None,
    Null,
    /// Whitespace between tokens on one line
    Whitespace,
    UnquotedString,
    QuotedString,
    TripleQuotedString,
    /// `true`/`yes`/`on`/`false`/`no`/`off`, kept as text
    Boolean,
    Long,
    Double,
    Hex,
    Octal,
}

impl LiteralType {
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            LiteralType::UnquotedString | LiteralType::QuotedString | LiteralType::TripleQuotedString
        )
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            LiteralType::Long | LiteralType::Double | LiteralType::Hex | LiteralType::Octal
        )
    }
}

/// A single token. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: Option<String>,
    pub token_type: TokenType,
    pub literal_type: LiteralType,
    pub position: Position,
}

impl Token {
    fn new(token_type: TokenType, position: Position) -> Self {
        Self {
            value: None,
            token_type,
            literal_type: LiteralType::None,
            position,
        }
    }

    fn literal(literal_type: LiteralType, value: String, position: Position) -> Self {
        Self {
            value: Some(value),
            token_type: TokenType::LiteralValue,
            literal_type,
            position,
        }
    }

    /// Token text, empty for structural tokens
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    pub fn is_whitespace(&self) -> bool {
        self.literal_type == LiteralType::Whitespace
    }

    /// Human readable description for error messages
    pub fn describe(&self) -> String {
        match (&self.token_type, &self.value) {
            (TokenType::LiteralValue, Some(text)) if !self.is_whitespace() => {
                format!("literal '{}'", text)
            }
            (TokenType::Substitution, Some(text)) => format!("substitution '${{{}}}'", text),
            (TokenType::OptionalSubstitution, Some(text)) => {
                format!("substitution '${{?{}}}'", text)
            }
            (token_type, _) => token_type.type_name().to_string(),
        }
    }
}

/// Complete token sequence, always terminated by an `EndOfFile` token
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl Default for TokenStream {
    fn default() -> Self {
        Self::new(vec![Token::new(TokenType::EndOfFile, Position::new())])
    }
}

impl TokenStream {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    /// Current token without consuming it
    pub fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// Token `offset` positions ahead of the current one
    pub fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.index + offset).min(last)]
    }

    /// Consumes and returns the current token; stays on `EndOfFile`
    pub fn next_token(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    /// Skips whitespace literals on the current line
    pub fn skip_whitespace(&mut self) {
        while self.peek().is_whitespace() {
            self.index += 1;
        }
    }

    /// Skips whitespace literals and newlines
    pub fn skip_whitespace_and_newlines(&mut self) {
        while self.peek().is_whitespace() || self.peek().token_type == TokenType::EndOfLine {
            self.index += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Characters that may not appear in unquoted text
const RESERVED_CHARS: &[char] = &[
    '$', '"', '{', '}', '[', ']', ':', '=', ',', '#', '`', '^', '?', '!', '@', '*', '&', '\\',
];

/// Fixed whitespace set, newline excluded because it is significant
pub fn is_whitespace_without_newline(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\r'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{001C}'..='\u{001F}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Minimal snapshot of lexer state for backtracking
#[derive(Debug, Clone, Copy)]
pub struct LexerSnapshot {
    position: usize,
    line: usize,
    column: usize,
    current_char: Option<char>,
}

/// HOCON lexer
#[derive(Clone)]
pub struct HoconLexer<'a> {
    /// Input text being lexed
    input: &'a str,
    /// Current byte position in input
    position: usize,
    /// Current line number (1-based)
    line: usize,
    /// Current column number (1-based)
    column: usize,
    /// Cached current character
    current_char: Option<char>,
}

impl<'a> HoconLexer<'a> {
    /// Creates a new lexer over `input`
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Self {
            input,
            position: 0,
            line: 1,
            column: 1,
            current_char: None,
        };
        lexer.current_char = lexer.peek_char();
        lexer
    }

    /// Creates a snapshot of the current lexer state for backtracking
    pub fn snapshot(&self) -> LexerSnapshot {
        LexerSnapshot {
            position: self.position,
            line: self.line,
            column: self.column,
            current_char: self.current_char,
        }
    }

    /// Restores the lexer state from a snapshot
    pub fn restore(&mut self, snapshot: LexerSnapshot) {
        self.position = snapshot.position;
        self.line = snapshot.line;
        self.column = snapshot.column;
        self.current_char = snapshot.current_char;
    }

    /// Returns the current position in the input
    #[inline(always)]
    pub fn current_position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    #[inline(always)]
    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Peeks at the character at the given offset from current position
    #[inline(always)]
    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.position..].chars().nth(offset)
    }

    #[inline(always)]
    fn remaining(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// Advances to the next character and returns it
    #[inline(always)]
    fn advance(&mut self) -> Option<char> {
        let ch = self.current_char?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += ch.len_utf8();
        self.current_char = self.peek_char();
        Some(ch)
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Tokenizes the whole input. Either the full stream ending in
    /// `EndOfFile` is returned or the first error.
    pub fn tokenize(mut self) -> Result<TokenStream, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.token_type == TokenType::EndOfFile;
            tokens.push(token);
            if done {
                break;
            }
        }
        tracing::trace!(tokens = tokens.len(), "tokenized input");
        Ok(TokenStream::new(tokens))
    }

    /// Produces the next token, skipping comments
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            let start = self.current_position();
            let Some(ch) = self.current_char else {
                return Ok(Token::new(TokenType::EndOfFile, start));
            };

            return match ch {
                '\n' => {
                    self.advance();
                    Ok(Token::new(TokenType::EndOfLine, start))
                }
                c if is_whitespace_without_newline(c) => Ok(self.lex_whitespace()),
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '/' if self.peek_char_at(1) == Some('/') => {
                    self.skip_comment();
                    continue;
                }
                '{' => Ok(self.single(TokenType::StartOfObject, start)),
                '}' => Ok(self.single(TokenType::EndOfObject, start)),
                '[' => Ok(self.single(TokenType::StartOfArray, start)),
                ']' => Ok(self.single(TokenType::EndOfArray, start)),
                ',' => Ok(self.single(TokenType::Comma, start)),
                ':' | '=' => Ok(self.single(TokenType::Assignment, start)),
                '+' if self.peek_char_at(1) == Some('=') => {
                    self.advance_by(2);
                    Ok(Token::new(TokenType::PlusAssignment, start))
                }
                '$' if self.peek_char_at(1) == Some('{') => self.lex_substitution(),
                '"' if self.remaining().starts_with("\"\"\"") => self.lex_triple_quoted_string(),
                '"' | '\'' => {
                    let value = self.lex_quoted_string()?;
                    Ok(Token::literal(LiteralType::QuotedString, value, start))
                }
                'i' if self.at_include_directive() => self.lex_include(),
                '-' | '0'..='9' => match self.lex_number() {
                    Some(token) => Ok(token),
                    None => self.lex_unquoted(),
                },
                c if RESERVED_CHARS.contains(&c) => Err(LexError::InvalidToken {
                    character: c,
                    position: start,
                }),
                _ => self.lex_unquoted(),
            };
        }
    }

    fn single(&mut self, token_type: TokenType, start: Position) -> Token {
        self.advance();
        Token::new(token_type, start)
    }

    fn lex_whitespace(&mut self) -> Token {
        let start = self.current_position();
        let begin = self.position;
        while let Some(c) = self.current_char {
            if !is_whitespace_without_newline(c) {
                break;
            }
            self.advance();
        }
        Token::literal(
            LiteralType::Whitespace,
            self.input[begin..self.position].to_string(),
            start,
        )
    }

    /// Skips a `#` or `//` comment up to, not including, the newline
    fn skip_comment(&mut self) {
        while let Some(c) = self.current_char {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Returns true if the unquoted run at the cursor ends here
    fn at_unquoted_end(&self) -> bool {
        match self.current_char {
            None => true,
            Some(c) if c == '\n' || is_whitespace_without_newline(c) => true,
            Some(c) if RESERVED_CHARS.contains(&c) => true,
            Some('/') => self.peek_char_at(1) == Some('/'),
            Some('+') => self.peek_char_at(1) == Some('='),
            Some(_) => false,
        }
    }

    fn lex_unquoted(&mut self) -> Result<Token, LexError> {
        let start = self.current_position();
        let begin = self.position;
        while !self.at_unquoted_end() {
            self.advance();
        }
        let text = &self.input[begin..self.position];
        if text.is_empty() {
            // at_unquoted_end only stops immediately on characters handled elsewhere
            let character = self.current_char.unwrap_or('\0');
            return Err(LexError::InvalidToken {
                character,
                position: start,
            });
        }

        let literal_type = match text {
            "true" | "yes" | "on" | "false" | "no" | "off" => LiteralType::Boolean,
            "null" => LiteralType::Null,
            _ => LiteralType::UnquotedString,
        };
        Ok(Token::literal(literal_type, text.to_string(), start))
    }

    fn consume_digits(&mut self, radix: u32) -> usize {
        let mut count = 0;
        while let Some(c) = self.current_char {
            if !c.is_digit(radix) {
                break;
            }
            self.advance();
            count += 1;
        }
        count
    }

    /// Speculatively lexes a number: coefficient, fraction, exponent. Each
    /// stage falls back to the previous valid state when the next character
    /// does not extend the number. Returns `None` when no number starts here.
    fn lex_number(&mut self) -> Option<Token> {
        let start = self.current_position();
        let begin = self.position;
        let entry = self.snapshot();

        if self.current_char == Some('-') {
            self.advance();
        }
        if !self.current_char.is_some_and(|c| c.is_ascii_digit()) {
            self.restore(entry);
            return None;
        }

        if self.current_char == Some('0') {
            match self.peek_char_at(1) {
                Some('x') | Some('X')
                    if self.peek_char_at(2).is_some_and(|c| c.is_ascii_hexdigit()) =>
                {
                    self.advance_by(2);
                    self.consume_digits(16);
                    return Some(self.number_token(LiteralType::Hex, begin, start));
                }
                Some('0'..='7') => {
                    self.advance();
                    self.consume_digits(8);
                    return Some(self.number_token(LiteralType::Octal, begin, start));
                }
                _ => {}
            }
        }

        self.consume_digits(10);
        let mut literal_type = LiteralType::Long;

        if self.current_char == Some('.') {
            let integer_part = self.snapshot();
            self.advance();
            if self.consume_digits(10) > 0 {
                literal_type = LiteralType::Double;
            } else {
                self.restore(integer_part);
            }
        }

        if matches!(self.current_char, Some('e') | Some('E')) {
            let significand = self.snapshot();
            self.advance();
            if matches!(self.current_char, Some('+') | Some('-')) {
                self.advance();
            }
            if self.consume_digits(10) > 0 {
                literal_type = LiteralType::Double;
            } else {
                self.restore(significand);
            }
        }

        Some(self.number_token(literal_type, begin, start))
    }

    fn number_token(&self, literal_type: LiteralType, begin: usize, start: Position) -> Token {
        Token::literal(
            literal_type,
            self.input[begin..self.position].to_string(),
            start,
        )
    }

    /// Lexes `"..."` or `'...'` with JSON escapes; the cursor is on the quote
    fn lex_quoted_string(&mut self) -> Result<String, LexError> {
        let start = self.current_position();
        let quote = self.advance().unwrap_or('"');
        let mut value = String::new();

        loop {
            match self.current_char {
                None | Some('\n') => return Err(LexError::UnterminatedString { position: start }),
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(value);
                }
                Some('\\') => {
                    let escape_position = self.current_position();
                    self.advance();
                    let escaped = match self.advance() {
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{0008}',
                        Some('f') => '\u{000C}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => self.lex_unicode_escape(escape_position)?,
                        Some(other) => {
                            return Err(LexError::InvalidEscape {
                                sequence: other.to_string(),
                                position: escape_position,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    };
                    value.push(escaped);
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn read_hex4(&mut self, position: Position) -> Result<u32, LexError> {
        let mut digits = String::with_capacity(4);
        for _ in 0..4 {
            match self.current_char {
                Some(c) if c.is_ascii_hexdigit() => {
                    digits.push(c);
                    self.advance();
                }
                _ => {
                    return Err(LexError::InvalidUnicodeEscape {
                        sequence: digits,
                        position,
                    });
                }
            }
        }
        u32::from_str_radix(&digits, 16).map_err(|_| LexError::InvalidUnicodeEscape {
            sequence: digits,
            position,
        })
    }

    /// Decodes the digits after `\u`, joining UTF-16 surrogate pairs
    fn lex_unicode_escape(&mut self, position: Position) -> Result<char, LexError> {
        let first = self.read_hex4(position)?;
        if (0xD800..0xDC00).contains(&first) {
            if self.remaining().starts_with("\\u") {
                self.advance_by(2);
                let second = self.read_hex4(position)?;
                if (0xDC00..0xE000).contains(&second) {
                    let code = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                    if let Some(c) = char::from_u32(code) {
                        return Ok(c);
                    }
                }
            }
            return Err(LexError::InvalidUnicodeEscape {
                sequence: format!("{:04X}", first),
                position,
            });
        }
        char::from_u32(first).ok_or_else(|| LexError::InvalidUnicodeEscape {
            sequence: format!("{:04X}", first),
            position,
        })
    }

    /// Lexes `"""..."""`. No escape processing; quotes beyond the closing
    /// three belong to the string.
    fn lex_triple_quoted_string(&mut self) -> Result<Token, LexError> {
        let start = self.current_position();
        self.advance_by(3);
        let begin = self.position;

        let Some(relative_end) = self.remaining().find("\"\"\"") else {
            return Err(LexError::UnterminatedTripleQuotedString { position: start });
        };
        let mut end = begin + relative_end;
        while self.input[end + 3..].starts_with('"') {
            end += 1;
        }

        let value = self.input[begin..end].to_string();
        while self.position < end + 3 {
            self.advance();
        }
        Ok(Token::literal(LiteralType::TripleQuotedString, value, start))
    }

    /// Lexes `${path}` / `${?path}` up to the matching unescaped `}`
    fn lex_substitution(&mut self) -> Result<Token, LexError> {
        let start = self.current_position();
        self.advance_by(2);
        let token_type = if self.current_char == Some('?') {
            self.advance();
            TokenType::OptionalSubstitution
        } else {
            TokenType::Substitution
        };

        let begin = self.position;
        let mut in_quotes = false;
        loop {
            match self.current_char {
                None => return Err(LexError::UnterminatedSubstitution { position: start }),
                Some('"') => in_quotes = !in_quotes,
                Some('\\') if in_quotes => {
                    self.advance();
                }
                Some('}') if !in_quotes => break,
                Some(_) => {}
            }
            self.advance();
        }

        let path = self.input[begin..self.position].trim().to_string();
        self.advance();
        Ok(Token {
            value: Some(path),
            token_type,
            literal_type: LiteralType::None,
            position: start,
        })
    }

    /// Returns true when the cursor is on `include` followed by a quoted
    /// argument or a qualifier; otherwise `include` is ordinary text
    fn at_include_directive(&self) -> bool {
        let Some(rest) = self.remaining().strip_prefix("include") else {
            return false;
        };
        let after = rest.trim_start_matches(is_whitespace_without_newline);
        if after.len() == rest.len() {
            return false;
        }
        after.starts_with('"')
            || ["required(", "file(", "url(", "classpath("]
                .iter()
                .any(|q| after.starts_with(q))
    }

    fn skip_inline_whitespace(&mut self) {
        while self.current_char.is_some_and(is_whitespace_without_newline) {
            self.advance();
        }
    }

    fn expect_char(&mut self, expected: char, message: &str) -> Result<(), LexError> {
        self.skip_inline_whitespace();
        if self.current_char == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(LexError::MalformedInclude {
                message: message.to_string(),
                position: self.current_position(),
            })
        }
    }

    fn lex_include(&mut self) -> Result<Token, LexError> {
        let start = self.current_position();
        self.advance_by("include".len());
        self.skip_inline_whitespace();

        let mut required = false;
        if self.remaining().starts_with("required(") {
            required = true;
            self.advance_by("required(".len());
            self.skip_inline_whitespace();
        }

        let mut kind = IncludeKind::File;
        let mut qualified = false;
        for (prefix, qualifier) in [
            ("file(", IncludeKind::File),
            ("url(", IncludeKind::Url),
            ("classpath(", IncludeKind::Resource),
        ] {
            if self.remaining().starts_with(prefix) {
                kind = qualifier;
                qualified = true;
                self.advance_by(prefix.len());
                self.skip_inline_whitespace();
                break;
            }
        }

        if !matches!(self.current_char, Some('"')) {
            return Err(LexError::MalformedInclude {
                message: "expected a quoted include argument".to_string(),
                position: self.current_position(),
            });
        }
        let value = self.lex_quoted_string()?;

        if qualified {
            self.expect_char(')', "expected ')' after include argument")?;
        }
        if required {
            self.expect_char(')', "expected ')' to close required(...)")?;
        }

        Ok(Token {
            value: Some(value),
            token_type: TokenType::Include(IncludeDirective { kind, required }),
            literal_type: LiteralType::None,
            position: start,
        })
    }
}

/// Tokenizes `input` into a complete token stream
pub fn tokenize(input: &str) -> Result<TokenStream, LexError> {
    HoconLexer::new(input).tokenize()
}
