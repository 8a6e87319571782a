//! Paths address fields in a HOCON document.
//!
//! A path is an ordered list of key segments. Its string form joins the
//! segments with `.`; segments containing dots, whitespace, quotes or
//! other reserved characters are written as JSON-quoted strings.

use crate::error::{HoconError, ParseError, Position};
use smallvec::SmallVec;
use std::fmt;

/// Ordered sequence of key segments
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HoconPath {
    segments: SmallVec<[String; 4]>,
}

impl HoconPath {
    /// The empty (root) path
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from already split segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses the string form of a path (`a.b."c.d"`)
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut segments: SmallVec<[String; 4]> = SmallVec::new();
        let mut current = String::new();
        let mut quoted_segment = false;
        let mut chars = text.trim().chars().peekable();
        let mut position = Position::new();

        let invalid = |message: &str, position: Position| ParseError::InvalidKey {
            key: text.to_string(),
            message: message.to_string(),
            position,
        };

        while let Some(ch) = chars.next() {
            position.advance(ch);
            match ch {
                '"' => {
                    quoted_segment = true;
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some('\\') => {
                                let escaped = chars
                                    .next()
                                    .ok_or_else(|| invalid("dangling escape", position))?;
                                current.push(match escaped {
                                    'n' => '\n',
                                    't' => '\t',
                                    'r' => '\r',
                                    'b' => '\u{0008}',
                                    'f' => '\u{000C}',
                                    other => other,
                                });
                            }
                            Some(c) => {
                                position.advance(c);
                                current.push(c);
                            }
                            None => return Err(invalid("unterminated quoted segment", position)),
                        }
                    }
                }
                '.' => {
                    if current.is_empty() && !quoted_segment {
                        return Err(invalid("empty path segment", position));
                    }
                    segments.push(std::mem::take(&mut current));
                    quoted_segment = false;
                }
                _ => current.push(ch),
            }
        }

        if current.is_empty() && !quoted_segment {
            if segments.is_empty() {
                return Err(invalid("empty path", position));
            }
            return Err(invalid("path ends with '.'", position));
        }
        segments.push(current);

        Ok(Self { segments })
    }

    /// Path segments in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, i.e. the key of the addressed field
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path with `key` appended
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Self { segments }
    }

    /// Path without its last segment
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// `prefix` followed by the segments of this path
    pub fn prefixed(&self, prefix: &HoconPath) -> Self {
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    /// Returns true when `self` is `other` or lies below it
    pub fn starts_with(&self, other: &HoconPath) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// Returns true when `self` lies strictly below `other`
    pub fn is_child_of(&self, other: &HoconPath) -> bool {
        self.segments.len() > other.segments.len() && self.starts_with(other)
    }

    /// Segments of `self` remaining after `prefix`
    pub fn strip_prefix(&self, prefix: &HoconPath) -> Option<&[String]> {
        if self.starts_with(prefix) {
            Some(&self.segments[prefix.segments.len()..])
        } else {
            None
        }
    }

    /// Renders a single key, quoting it when the bare form would not parse back
    pub fn quote_key(key: &str) -> String {
        let needs_quotes = key.is_empty()
            || key.chars().any(|c| {
                c.is_whitespace()
                    || matches!(
                        c,
                        '.' | '"' | '\'' | '$' | '{' | '}' | '[' | ']' | ':' | '=' | ','
                            | '#' | '`' | '^' | '?' | '!' | '@' | '*' | '&' | '\\' | '+' | '/'
                    )
            });
        if !needs_quotes {
            return key.to_string();
        }

        let mut quoted = String::with_capacity(key.len() + 2);
        quoted.push('"');
        for c in key.chars() {
            match c {
                '"' => quoted.push_str("\\\""),
                '\\' => quoted.push_str("\\\\"),
                '\n' => quoted.push_str("\\n"),
                '\t' => quoted.push_str("\\t"),
                '\r' => quoted.push_str("\\r"),
                other => quoted.push(other),
            }
        }
        quoted.push('"');
        quoted
    }
}

impl fmt::Display for HoconPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.segments.iter().map(|s| Self::quote_key(s)).collect();
        write!(f, "{}", rendered.join("."))
    }
}

/// Anything that can address a value in a document
pub trait ToHoconPath {
    fn to_hocon_path(&self) -> Result<HoconPath, HoconError>;
}

impl ToHoconPath for HoconPath {
    fn to_hocon_path(&self) -> Result<HoconPath, HoconError> {
        Ok(self.clone())
    }
}

impl ToHoconPath for &HoconPath {
    fn to_hocon_path(&self) -> Result<HoconPath, HoconError> {
        Ok((*self).clone())
    }
}

impl ToHoconPath for &str {
    fn to_hocon_path(&self) -> Result<HoconPath, HoconError> {
        Ok(HoconPath::parse(self)?)
    }
}

impl ToHoconPath for String {
    fn to_hocon_path(&self) -> Result<HoconPath, HoconError> {
        Ok(HoconPath::parse(self)?)
    }
}
