//! HOCON parser building the mutable [`ParseTree`]
//!
//! A recursive-descent parser over the token stream produced by the lexer.
//! It records every assignment in field histories and registers
//! substitutions for the [`Resolver`](crate::resolver::Resolver), but does
//! not resolve anything itself. Includes are fetched through an
//! [`IncludeResolver`] and parsed by a nested parser whose tree is then
//! imported under the including object.

use crate::document::HoconDocument;
use crate::error::{HoconError, ParseError, Position};
use crate::lexer::{IncludeDirective, LiteralType, Token, TokenStream, TokenType, tokenize};
use crate::materializer::Materializer;
use crate::path::HoconPath;
use crate::resolver::{EnvironmentVariableHandler, Resolver, VariableHandler};
use crate::tree::{ElementId, ParseTree};

pub use crate::lexer::IncludeKind;

/// Configuration options for the parser
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum include nesting; `None` means unlimited
    pub max_include_depth: Option<usize>,
    /// Look unresolved substitutions up through the variable handler
    pub environment_fallback: bool,
}

impl ParserConfig {
    /// Creates a new parser configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum include nesting depth
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = Some(depth);
        self
    }

    /// Sets whether unresolved substitutions fall back to the environment
    pub fn with_environment_fallback(mut self, enabled: bool) -> Self {
        self.environment_fallback = enabled;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_include_depth: None,
            environment_fallback: true,
        }
    }
}

/// Supplies the text of included documents
///
/// Returning `None` (or blank text) means the include is missing, which
/// is an error only for `include required(...)`.
pub trait IncludeResolver {
    fn resolve_include(&self, kind: IncludeKind, name: &str) -> Option<String>;
}

impl<F> IncludeResolver for F
where
    F: Fn(IncludeKind, &str) -> Option<String>,
{
    fn resolve_include(&self, kind: IncludeKind, name: &str) -> Option<String> {
        self(kind, name)
    }
}

/// Include resolver that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve_include(&self, _kind: IncludeKind, _name: &str) -> Option<String> {
        None
    }
}

/// HOCON parser
pub struct HoconParser<'a> {
    input: &'a str,
    tokens: TokenStream,
    tree: ParseTree,
    includes: &'a dyn IncludeResolver,
    config: &'a ParserConfig,
    /// Include nesting level of this parser
    depth: usize,
}

impl<'a> HoconParser<'a> {
    /// Creates a parser for `input`
    pub fn new(
        input: &'a str,
        includes: &'a dyn IncludeResolver,
        config: &'a ParserConfig,
    ) -> Self {
        Self {
            input,
            tokens: TokenStream::default(),
            tree: ParseTree::new(),
            includes,
            config,
            depth: 0,
        }
    }

    fn nested<'b>(&self, input: &'b str) -> HoconParser<'b>
    where
        'a: 'b,
    {
        HoconParser {
            depth: self.depth + 1,
            ..HoconParser::new(input, self.includes, self.config)
        }
    }

    /// Parses the input into an unresolved tree
    pub fn parse_tree(mut self) -> Result<ParseTree, HoconError> {
        self.tokens = tokenize(self.input)?;
        self.parse_document()?;
        tracing::trace!(
            elements = self.tree.len(),
            substitutions = self.tree.substitutions().len(),
            depth = self.depth,
            "parsed document"
        );
        Ok(self.tree)
    }

    fn parse_document(&mut self) -> Result<(), ParseError> {
        self.tokens.skip_whitespace_and_newlines();
        let root = self.tree.root();

        match self.tokens.peek().token_type {
            TokenType::StartOfArray => {
                let position = self.tokens.next_token().position;
                let array = self.tree.push_array(root);
                self.parse_array(array, &HoconPath::root())?;
                self.tokens.skip_whitespace_and_newlines();
                if self.tokens.peek().token_type != TokenType::EndOfFile {
                    return Err(ParseError::InvalidArrayDocument { position });
                }
            }
            TokenType::StartOfObject => {
                self.tokens.next_token();
                let object = self.tree.push_object(root, HoconPath::root());
                self.parse_object_body(object, true)?;
                self.tokens.skip_whitespace_and_newlines();
                self.expect_end_of_file()?;
            }
            _ => {
                let object = self.tree.push_object(root, HoconPath::root());
                self.parse_object_body(object, false)?;
            }
        }
        Ok(())
    }

    fn expect_end_of_file(&self) -> Result<(), ParseError> {
        let token = self.tokens.peek();
        if token.token_type == TokenType::EndOfFile {
            Ok(())
        } else {
            Err(self.unexpected(token, "end of file", &HoconPath::root()))
        }
    }

    fn unexpected(&self, token: &Token, expected: &str, path: &HoconPath) -> ParseError {
        ParseError::UnexpectedToken {
            token: token.describe(),
            expected: expected.to_string(),
            path: path.to_string(),
            position: token.position,
        }
    }

    /// Parses fields until `}` (braced) or end of input (headless root)
    fn parse_object_body(&mut self, object: ElementId, braced: bool) -> Result<(), ParseError> {
        let path = self.tree.object(object).path.clone();
        loop {
            self.tokens.skip_whitespace_and_newlines();
            let token = self.tokens.peek().clone();
            match token.token_type {
                TokenType::EndOfObject if braced => {
                    self.tokens.next_token();
                    return Ok(());
                }
                TokenType::EndOfFile if !braced => return Ok(()),
                TokenType::EndOfFile => return Err(self.unexpected(&token, "'}'", &path)),
                TokenType::Include(directive) => {
                    self.tokens.next_token();
                    self.parse_include(object, directive, &token)?;
                }
                TokenType::LiteralValue => self.parse_field(object)?,
                _ => return Err(self.unexpected(&token, "key", &path)),
            }

            self.tokens.skip_whitespace();
            let separator = self.tokens.peek();
            match separator.token_type {
                TokenType::Comma => {
                    self.tokens.next_token();
                }
                TokenType::EndOfLine | TokenType::EndOfObject | TokenType::EndOfFile => {}
                _ => return Err(self.unexpected(separator, "',' or newline", &path)),
            }
        }
    }

    /// Reads a possibly dotted, possibly quoted key up to `:`, `=`, `+=`
    /// or `{`. Quoted parts keep their dots; edge whitespace is dropped.
    fn parse_key(&mut self, object_path: &HoconPath) -> Result<HoconPath, ParseError> {
        let start = self.tokens.peek().position;
        let mut segments: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_quoted = false;
        let mut pending_whitespace = String::new();
        let mut raw = String::new();

        loop {
            let token = self.tokens.peek().clone();
            match token.token_type {
                TokenType::Assignment | TokenType::PlusAssignment | TokenType::StartOfObject => {
                    break;
                }
                TokenType::LiteralValue => {
                    self.tokens.next_token();
                }
                _ => {
                    return Err(self.unexpected(&token, "':', '=', '+=' or '{'", object_path));
                }
            }

            let text = token.text();
            raw.push_str(text);
            if token.is_whitespace() {
                if !current.is_empty() || current_quoted {
                    pending_whitespace.push_str(text);
                }
                continue;
            }
            current.push_str(&std::mem::take(&mut pending_whitespace));

            if matches!(
                token.literal_type,
                LiteralType::QuotedString | LiteralType::TripleQuotedString
            ) {
                current.push_str(text);
                current_quoted = true;
                continue;
            }

            let mut pieces = text.split('.');
            if let Some(first) = pieces.next() {
                current.push_str(first);
            }
            for piece in pieces {
                if current.is_empty() && !current_quoted {
                    return Err(ParseError::InvalidKey {
                        key: raw,
                        message: "empty path segment".to_string(),
                        position: token.position,
                    });
                }
                segments.push(std::mem::take(&mut current));
                current_quoted = false;
                current.push_str(piece);
            }
        }

        if current.is_empty() && !current_quoted {
            return Err(ParseError::InvalidKey {
                key: raw,
                message: if segments.is_empty() {
                    "missing key".to_string()
                } else {
                    "key ends with '.'".to_string()
                },
                position: start,
            });
        }
        segments.push(current);
        Ok(HoconPath::from_segments(segments))
    }

    /// Walks `path` from `object`, creating intermediate objects, and
    /// returns the object that holds the last segment
    fn traverse_path(
        &mut self,
        object: ElementId,
        path: &HoconPath,
        position: Position,
    ) -> ElementId {
        let mut current = object;
        for segment in &path.segments()[..path.len() - 1] {
            let field = self.tree.get_or_create_field(current, segment, position);
            current = match self.tree.latest_object(field) {
                Some(existing) => existing,
                None => {
                    let field_path = self.tree.field(field).path.clone();
                    tracing::trace!(path = %field_path, "creating intermediate object");
                    let value = self.tree.new_value(None, position);
                    self.tree.push_history(field, value);
                    self.tree.push_object(value, field_path)
                }
            };
        }
        current
    }

    fn parse_field(&mut self, object: ElementId) -> Result<(), ParseError> {
        let position = self.tokens.peek().position;
        let object_path = self.tree.object(object).path.clone();
        let key = self.parse_key(&object_path)?;
        let holder = self.traverse_path(object, &key, position);
        let name = key.key().unwrap_or_default();
        let field = self.tree.get_or_create_field(holder, name, position);
        let field_path = self.tree.field(field).path.clone();

        let operator = self.tokens.next_token();
        match operator.token_type {
            TokenType::StartOfObject => {
                let value = self.tree.new_value(None, operator.position);
                self.tree.push_history(field, value);
                let nested = self.tree.push_object(value, field_path.clone());
                self.parse_object_body(nested, true)?;
                self.tokens.skip_whitespace();
                self.parse_value(value, &field_path)?;
            }
            TokenType::Assignment => {
                self.tokens.skip_whitespace_and_newlines();
                let value = self.tree.new_value(None, self.tokens.peek().position);
                self.tree.push_history(field, value);
                self.parse_value(value, &field_path)?;
            }
            TokenType::PlusAssignment => {
                self.tokens.skip_whitespace();
                let value = self.tree.new_value(None, operator.position);
                self.tree.push_history(field, value);
                self.tree
                    .push_substitution(value, field_path.clone(), false, operator.position);
                let array = self.tree.push_array(value);
                let item = self.tree.new_value(None, self.tokens.peek().position);
                self.tree.push_item(array, item);
                self.parse_value(item, &field_path)?;
            }
            _ => return Err(self.unexpected(&operator, "':', '=', '+=' or '{'", &field_path)),
        }

        tracing::trace!(path = %field_path, "parsed field");
        Ok(())
    }

    /// Accumulates concatenated parts into `value` until a separator or
    /// closing token. `value` may already hold parts (`key { } tail`).
    fn parse_value(&mut self, value: ElementId, path: &HoconPath) -> Result<(), ParseError> {
        loop {
            let token = self.tokens.peek().clone();
            match token.token_type {
                TokenType::LiteralValue => {
                    self.tokens.next_token();
                    self.tree
                        .push_literal(value, token.literal_type, token.text().to_string());
                }
                TokenType::Substitution | TokenType::OptionalSubstitution => {
                    self.tokens.next_token();
                    let target = HoconPath::parse(token.text()).map_err(|err| match err {
                        ParseError::InvalidKey { key, message, .. } => ParseError::InvalidKey {
                            key,
                            message,
                            position: token.position,
                        },
                        other => other,
                    })?;
                    let required = token.token_type == TokenType::Substitution;
                    self.tree
                        .push_substitution(value, target, required, token.position);
                }
                TokenType::StartOfObject => {
                    self.tokens.next_token();
                    let object = self.tree.push_object(value, path.clone());
                    self.parse_object_body(object, true)?;
                }
                TokenType::StartOfArray => {
                    self.tokens.next_token();
                    let array = self.tree.push_array(value);
                    self.parse_array(array, path)?;
                }
                _ => break,
            }
        }

        self.tree.trim_trailing_whitespace(value);
        if self.tree.value(value).parts.is_empty() {
            let token = self.tokens.peek();
            return Err(self.unexpected(token, "value", path));
        }
        self.tree.check_concatenation(value)
    }

    /// Parses array elements up to and including `]`
    fn parse_array(&mut self, array: ElementId, path: &HoconPath) -> Result<(), ParseError> {
        loop {
            self.tokens.skip_whitespace_and_newlines();
            let token = self.tokens.peek();
            match token.token_type {
                TokenType::EndOfArray => {
                    self.tokens.next_token();
                    break;
                }
                TokenType::EndOfFile => return Err(self.unexpected(token, "']'", path)),
                _ => {}
            }

            let item = self.tree.new_value(None, token.position);
            self.tree.push_item(array, item);
            self.parse_value(item, path)?;

            self.tokens.skip_whitespace();
            let separator = self.tokens.peek();
            match separator.token_type {
                TokenType::Comma => {
                    self.tokens.next_token();
                }
                TokenType::EndOfLine | TokenType::EndOfArray => {}
                _ => return Err(self.unexpected(separator, "',' or ']'", path)),
            }
        }
        self.tree.check_array_homogeneity(array)
    }

    fn parse_include(
        &mut self,
        object: ElementId,
        directive: IncludeDirective,
        token: &Token,
    ) -> Result<(), ParseError> {
        let name = token.text();
        let path = self.tree.object(object).path.clone();

        if let Some(limit) = self.config.max_include_depth {
            if self.depth >= limit {
                return Err(ParseError::IncludeDepthExceeded {
                    limit,
                    path: path.to_string(),
                    position: token.position,
                });
            }
        }

        let text = self
            .includes
            .resolve_include(directive.kind, name)
            .filter(|text| !text.trim().is_empty());
        let Some(text) = text else {
            tracing::debug!(name, kind = ?directive.kind, required = directive.required, "include returned no content");
            if directive.required {
                return Err(ParseError::MissingInclude {
                    name: name.to_string(),
                    path: path.to_string(),
                    position: token.position,
                });
            }
            return Ok(());
        };
        tracing::debug!(name, kind = ?directive.kind, path = %path, "including document");

        let included = self.nested(&text).parse_tree().map_err(|err| match err {
            HoconError::Lex(lex) => ParseError::Lex(lex),
            HoconError::Parse(parse) => parse,
            other => ParseError::InvalidInclude {
                name: format!("{}: {}", name, other),
                position: token.position,
            },
        })?;

        if included.object_parts(included.root()).is_empty() {
            return Err(ParseError::InvalidInclude {
                name: name.to_string(),
                position: token.position,
            });
        }
        self.tree.import(&included, object);
        Ok(())
    }
}

/// Builder assembling a full parse: tokenize, parse, resolve, materialize
pub struct HoconParserBuilder<'a> {
    input: &'a str,
    config: ParserConfig,
    include_resolver: Option<Box<dyn IncludeResolver + 'a>>,
    variable_handler: Option<Box<dyn VariableHandler + 'a>>,
}

impl<'a> HoconParserBuilder<'a> {
    /// Creates a new parser builder
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            config: ParserConfig::default(),
            include_resolver: None,
            variable_handler: None,
        }
    }

    /// Sets the parser configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the source of included documents
    pub fn with_include_resolver(mut self, resolver: impl IncludeResolver + 'a) -> Self {
        self.include_resolver = Some(Box::new(resolver));
        self
    }

    /// Sets the variable handler used for environment fallback
    pub fn with_variable_handler(mut self, handler: Box<dyn VariableHandler + 'a>) -> Self {
        self.variable_handler = Some(handler);
        self
    }

    /// Runs the whole pipeline
    pub fn parse(self) -> Result<HoconDocument, HoconError> {
        let includes: Box<dyn IncludeResolver + 'a> =
            self.include_resolver.unwrap_or_else(|| Box::new(NoIncludes));
        let variables: Box<dyn VariableHandler + 'a> = self
            .variable_handler
            .unwrap_or_else(|| Box::new(EnvironmentVariableHandler));

        let mut tree = HoconParser::new(self.input, includes.as_ref(), &self.config).parse_tree()?;
        Resolver::new(variables.as_ref(), &self.config).resolve(&mut tree)?;
        let root = Materializer::new(&tree).materialize()?;
        Ok(HoconDocument::new(root))
    }
}
