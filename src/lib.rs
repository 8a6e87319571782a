//! # HOCON Rust Parser
//!
//! A HOCON (Human-Optimized Config Object Notation) parser with typed
//! accessors and serde integration.
//!
//! ## Overview
//!
//! HOCON is a superset of JSON designed for hand-written configuration:
//! quotes and commas are optional, objects merge, values can refer to
//! each other through `${path}` substitutions and documents can include
//! other documents. Parsing runs as a pipeline:
//!
//! 1. the [`lexer`] turns text into tokens;
//! 2. the [`parser`] builds a mutable tree recording every assignment
//!    and fetches includes;
//! 3. the [`resolver`] replaces substitutions with the values they name;
//! 4. the [`materializer`] produces an immutable [`HoconDocument`].
//!
//! ## Key Features
//!
//! - **Object merging**: repeated keys merge objects, later values win
//! - **Substitutions**: `${a.b}`, optional `${?a.b}`, self-references and
//!   `+=` appends, with cycle detection
//! - **Includes**: `include "file"`, `url(...)`, `file(...)`,
//!   `classpath(...)` and `required(...)` through a caller-supplied
//!   [`IncludeResolver`]
//! - **Typed accessors**: integers in hex and octal, durations such as
//!   `500ms`, byte sizes such as `10MiB`
//! - **Serde Integration**: use `#[derive(Deserialize)]` with HOCON files
//!
//! ## Basic Usage
//!
//! ```rust
//! let document = hocon_parser::parse(r#"
//!     server {
//!         host = localhost
//!         port = 8080
//!     }
//!     server.port = 9090
//!     timeout = 30s
//! "#)?;
//!
//! assert_eq!(document.get_string("server.host")?, "localhost");
//! assert_eq!(document.get_int("server.port")?, 9090);
//! assert!(document.has_path("timeout"));
//! # Ok::<(), hocon_parser::HoconError>(())
//! ```
//!
//! ## Serde
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct ServerConfig {
//!     name: String,
//!     port: u16,
//!     debug: bool,
//! }
//!
//! let config: ServerConfig = hocon_parser::from_str(r#"
//!     name = my-server
//!     port = 8080
//!     debug = off
//! "#)?;
//! assert_eq!(config.port, 8080);
//! # Ok::<(), hocon_parser::HoconError>(())
//! ```
//!
//! ## Substitutions and Variables
//!
//! A substitution that names no path in the document falls back to a
//! [`VariableHandler`], by default the process environment:
//!
//! ```rust
//! use hocon_parser::{HoconParserBuilder, MapVariableHandler};
//!
//! let mut variables = MapVariableHandler::new();
//! variables.insert("APP_HOME", "/opt/app");
//!
//! let document = HoconParserBuilder::new("home = ${APP_HOME}\nlogs = ${home}/logs")
//!     .with_variable_handler(Box::new(variables))
//!     .parse()?;
//! assert_eq!(document.get_string("logs")?, "/opt/app/logs");
//! # Ok::<(), hocon_parser::HoconError>(())
//! ```
//!
//! ## Includes
//!
//! ```rust
//! use hocon_parser::IncludeKind;
//!
//! let document = hocon_parser::parse_with_includes(
//!     "database { include \"db.conf\" }",
//!     |_kind: IncludeKind, name: &str| match name {
//!         "db.conf" => Some("url = \"postgres://localhost\"".to_string()),
//!         _ => None,
//!     },
//! )?;
//! assert_eq!(document.get_string("database.url")?, "postgres://localhost");
//! # Ok::<(), hocon_parser::HoconError>(())
//! ```
//!
//! ## Error Handling
//!
//! Errors raised while reading the text carry a source position:
//!
//! ```rust
//! use hocon_parser::{HoconError, LexError};
//!
//! match hocon_parser::parse("key = \"unterminated string") {
//!     Err(HoconError::Lex(LexError::UnterminatedString { position })) => {
//!         assert_eq!(position.line, 1);
//!     }
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

pub mod deserializer;
pub mod document;
pub mod error;
pub mod lexer;
pub mod materializer;
pub mod parser;
pub mod path;
pub mod resolver;
pub mod tree;
pub mod units;
pub mod value;


// Re-export main types and functions
pub use deserializer::{ValueDeserializer, from_str, from_value};
pub use document::HoconDocument;
pub use error::{
    EnhancedError, HoconError, LexError, ParseError, Position, ResolveError, ValueError,
};
pub use lexer::{HoconLexer, Token, TokenStream, TokenType, tokenize};
pub use parser::{
    HoconParser, HoconParserBuilder, IncludeKind, IncludeResolver, NoIncludes, ParserConfig,
};
pub use path::{HoconPath, ToHoconPath};
pub use units::TimeSpan;
pub use value::{HoconArray, HoconLiteral, HoconObject, HoconValue, LiteralKind};

// Re-export variable handler types
pub use resolver::{
    ChainedVariableHandler, EnvironmentVariableHandler, MapVariableHandler, VariableHandler,
};

/// Parses and resolves a document that has no includes
pub fn parse(text: &str) -> Result<HoconDocument, HoconError> {
    HoconParserBuilder::new(text).parse()
}

/// Parses and resolves a document, fetching includes from `resolver`
pub fn parse_with_includes<'a, R>(text: &'a str, resolver: R) -> Result<HoconDocument, HoconError>
where
    R: IncludeResolver + 'a,
{
    HoconParserBuilder::new(text)
        .with_include_resolver(resolver)
        .parse()
}
