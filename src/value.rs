//! Immutable document model
//!
//! Produced by the [`Materializer`](crate::materializer::Materializer)
//! once every substitution is settled. Objects are sorted maps, so
//! iteration order is canonical. Literals keep their source text and are
//! interpreted only when a typed accessor asks for a specific type.

use crate::error::ValueError;
use crate::path::HoconPath;
use crate::units::{self, TimeSpan};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a literal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Null,
    Boolean,
    /// Decimal, hex or octal integer
    Integer,
    Float,
    String,
}

/// A scalar value with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct HoconLiteral {
    kind: LiteralKind,
    text: String,
}

/// Parses an integer literal: decimal, `0x` hex or leading-zero octal.
/// Integral floating-point text such as `1e3` is accepted as well.
pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i128::from_str_radix(hex, 16).ok()
    } else if digits.len() > 1
        && digits.starts_with('0')
        && digits.chars().all(|c| ('0'..='7').contains(&c))
    {
        i128::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse::<i128>().ok()
    };

    match magnitude {
        Some(magnitude) => {
            let value = if negative { -magnitude } else { magnitude };
            i64::try_from(value).ok()
        }
        None => {
            let float: f64 = trimmed.parse().ok()?;
            let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
            (float.is_finite() && float.fract() == 0.0 && in_range).then_some(float as i64)
        }
    }
}

/// Parses a floating point literal, including `Infinity`, `-Infinity` and
/// `NaN`
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        "NaN" => return Some(f64::NAN),
        _ => {}
    }
    // `inf` and `nan` spellings accepted by Rust are not HOCON numbers
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E' | 'x' | 'X'))
        && !trimmed.starts_with("0x")
        && !trimmed.starts_with("0X")
    {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| parse_integer(trimmed).map(|value| value as f64))
}

/// Parses the boolean vocabulary `true/yes/on` and `false/no/off`
pub(crate) fn parse_boolean(text: &str) -> Option<bool> {
    let trimmed = text.trim();
    if ["true", "yes", "on"]
        .iter()
        .any(|word| trimmed.eq_ignore_ascii_case(word))
    {
        Some(true)
    } else if ["false", "no", "off"]
        .iter()
        .any(|word| trimmed.eq_ignore_ascii_case(word))
    {
        Some(false)
    } else {
        None
    }
}

impl HoconLiteral {
    pub fn new(kind: LiteralKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn null() -> Self {
        Self::new(LiteralKind::Null, "null")
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::new(LiteralKind::String, text)
    }

    pub fn kind(&self) -> LiteralKind {
        self.kind
    }

    /// Source text of the literal
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_null(&self) -> bool {
        self.kind == LiteralKind::Null
    }

    /// Text of the literal; `null` is not a string and fails with
    /// `WrongType`, so optional lookups report it as absent
    pub fn as_string(&self) -> Result<String, ValueError> {
        if self.is_null() {
            return Err(ValueError::WrongType {
                expected: "string",
                found: "null",
            });
        }
        Ok(self.text.clone())
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        parse_boolean(&self.text).ok_or_else(|| ValueError::InvalidBoolean(self.text.clone()))
    }

    pub fn as_i64(&self) -> Result<i64, ValueError> {
        parse_integer(&self.text).ok_or_else(|| ValueError::InvalidNumber {
            text: self.text.clone(),
            expected: "long",
        })
    }

    pub fn as_i32(&self) -> Result<i32, ValueError> {
        parse_integer(&self.text)
            .and_then(|value| i32::try_from(value).ok())
            .ok_or_else(|| ValueError::InvalidNumber {
                text: self.text.clone(),
                expected: "int",
            })
    }

    pub fn as_u8(&self) -> Result<u8, ValueError> {
        parse_integer(&self.text)
            .and_then(|value| u8::try_from(value).ok())
            .ok_or_else(|| ValueError::InvalidNumber {
                text: self.text.clone(),
                expected: "byte",
            })
    }

    pub fn as_f64(&self) -> Result<f64, ValueError> {
        parse_float(&self.text).ok_or_else(|| ValueError::InvalidNumber {
            text: self.text.clone(),
            expected: "double",
        })
    }

    pub fn as_time_span(&self) -> Result<TimeSpan, ValueError> {
        units::parse_duration(&self.text)
    }

    pub fn as_byte_size(&self) -> Result<u64, ValueError> {
        units::parse_byte_size(&self.text)
    }
}

impl fmt::Display for HoconLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LiteralKind::String => write!(f, "{}", quote_string(&self.text)),
            _ => write!(f, "{}", self.text),
        }
    }
}

/// JSON-style quoting for string output
fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{0008}' => quoted.push_str("\\b"),
            '\u{000C}' => quoted.push_str("\\f"),
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Object node of the immutable document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoconObject {
    fields: BTreeMap<String, HoconValue>,
}

impl HoconObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&HoconValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: HoconValue) -> Option<HoconValue> {
        self.fields.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HoconValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reinterprets an object with keys `0`, `1`, ... as an array ordered
    /// by numeric key. Every value must have the same type.
    pub fn to_array(&self) -> Result<HoconArray, ValueError> {
        if self.fields.is_empty() {
            return Err(ValueError::NotConvertibleToArray(
                "object is empty".to_string(),
            ));
        }

        let mut indexed = Vec::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            let index: u64 = key.parse().map_err(|_| {
                ValueError::NotConvertibleToArray(format!(
                    "key '{}' is not a non-negative integer",
                    key
                ))
            })?;
            indexed.push((index, value));
        }

        let first_type = indexed[0].1.type_name();
        if let Some((_, mismatched)) = indexed
            .iter()
            .find(|(_, value)| value.type_name() != first_type)
        {
            return Err(ValueError::NotConvertibleToArray(format!(
                "mixed element types {} and {}",
                first_type,
                mismatched.type_name()
            )));
        }

        indexed.sort_by_key(|(index, _)| *index);
        Ok(HoconArray::from(
            indexed
                .into_iter()
                .map(|(_, value)| value.clone())
                .collect::<Vec<_>>(),
        ))
    }

    /// Merges `fallback` under `self`: keys of `self` win, nested objects
    /// merge recursively
    pub fn with_fallback(&self, fallback: &HoconObject) -> HoconObject {
        let mut merged = fallback.clone();
        for (key, value) in &self.fields {
            let combined = match (value, fallback.fields.get(key)) {
                (HoconValue::Object(mine), Some(HoconValue::Object(theirs))) => {
                    HoconValue::Object(mine.with_fallback(theirs))
                }
                _ => value.clone(),
            };
            merged.fields.insert(key.clone(), combined);
        }
        merged
    }
}

impl IntoIterator for HoconObject {
    type Item = (String, HoconValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, HoconValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl FromIterator<(String, HoconValue)> for HoconObject {
    fn from_iter<I: IntoIterator<Item = (String, HoconValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Array node of the immutable document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoconArray {
    items: Vec<HoconValue>,
}

impl HoconArray {
    pub fn get(&self, index: usize) -> Option<&HoconValue> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HoconValue> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[HoconValue] {
        &self.items
    }
}

impl From<Vec<HoconValue>> for HoconArray {
    fn from(items: Vec<HoconValue>) -> Self {
        Self { items }
    }
}

impl IntoIterator for HoconArray {
    type Item = HoconValue;
    type IntoIter = std::vec::IntoIter<HoconValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a HoconArray {
    type Item = &'a HoconValue;
    type IntoIter = std::slice::Iter<'a, HoconValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A node of the immutable document
#[derive(Debug, Clone, PartialEq)]
pub enum HoconValue {
    Object(HoconObject),
    Array(HoconArray),
    Literal(HoconLiteral),
}

impl HoconValue {
    /// Name of the node kind, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            HoconValue::Object(_) => "object",
            HoconValue::Array(_) => "array",
            HoconValue::Literal(literal) => match literal.kind() {
                LiteralKind::Null => "null",
                LiteralKind::Boolean => "boolean",
                LiteralKind::Integer | LiteralKind::Float => "number",
                LiteralKind::String => "string",
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, HoconValue::Literal(literal) if literal.is_null())
    }

    pub fn as_object(&self) -> Option<&HoconObject> {
        match self {
            HoconValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&HoconArray> {
        match self {
            HoconValue::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&HoconLiteral> {
        match self {
            HoconValue::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Follows `path` through nested objects
    pub fn get_path(&self, path: &HoconPath) -> Option<&HoconValue> {
        path.segments()
            .iter()
            .try_fold(self, |current, segment| current.as_object()?.get(segment))
    }

    /// The literal, or a wrong-type error naming `expected`
    pub fn literal(&self, expected: &'static str) -> Result<&HoconLiteral, ValueError> {
        self.as_literal().ok_or_else(|| ValueError::WrongType {
            expected,
            found: self.type_name(),
        })
    }

    pub fn to_object(&self) -> Result<&HoconObject, ValueError> {
        self.as_object().ok_or_else(|| ValueError::WrongType {
            expected: "object",
            found: self.type_name(),
        })
    }

    /// Elements of an array, or of a numeric-keyed object reinterpreted as
    /// one
    pub fn to_list(&self) -> Result<Vec<HoconValue>, ValueError> {
        match self {
            HoconValue::Array(array) => Ok(array.items.clone()),
            HoconValue::Object(object) => Ok(object.to_array()?.items),
            HoconValue::Literal(_) => Err(ValueError::WrongType {
                expected: "array",
                found: self.type_name(),
            }),
        }
    }

    /// Renders the value as HOCON text, nested levels indented by
    /// `indent` spaces
    pub fn to_hocon_string(&self, indent: usize) -> String {
        let mut output = String::new();
        self.write_hocon(&mut output, indent, 0);
        output
    }

    fn write_hocon(&self, output: &mut String, indent: usize, level: usize) {
        let pad = |level: usize| " ".repeat(indent * level);
        match self {
            HoconValue::Literal(literal) => output.push_str(&literal.to_string()),
            HoconValue::Object(object) if object.is_empty() => output.push_str("{}"),
            HoconValue::Object(object) => {
                output.push_str("{\n");
                for (key, value) in object.iter() {
                    output.push_str(&pad(level + 1));
                    output.push_str(&HoconPath::quote_key(key));
                    output.push_str(" = ");
                    value.write_hocon(output, indent, level + 1);
                    output.push('\n');
                }
                output.push_str(&pad(level));
                output.push('}');
            }
            HoconValue::Array(array) if array.is_empty() => output.push_str("[]"),
            HoconValue::Array(array) => {
                let nested = array
                    .iter()
                    .any(|item| !matches!(item, HoconValue::Literal(_)));
                if !nested {
                    let items: Vec<String> = array.iter().map(|item| item.to_string()).collect();
                    output.push('[');
                    output.push_str(&items.join(", "));
                    output.push(']');
                    return;
                }
                output.push_str("[\n");
                for item in array.iter() {
                    output.push_str(&pad(level + 1));
                    item.write_hocon(output, indent, level + 1);
                    output.push('\n');
                }
                output.push_str(&pad(level));
                output.push(']');
            }
        }
    }
}

impl fmt::Display for HoconValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hocon_string(2))
    }
}

impl From<HoconObject> for HoconValue {
    fn from(object: HoconObject) -> Self {
        HoconValue::Object(object)
    }
}

impl From<HoconArray> for HoconValue {
    fn from(array: HoconArray) -> Self {
        HoconValue::Array(array)
    }
}

impl From<HoconLiteral> for HoconValue {
    fn from(literal: HoconLiteral) -> Self {
        HoconValue::Literal(literal)
    }
}

/// Literals serialize by kind; unparseable numbers fall back to their
/// text
impl Serialize for HoconLiteral {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.kind {
            LiteralKind::Null => serializer.serialize_unit(),
            LiteralKind::Boolean => match parse_boolean(&self.text) {
                Some(value) => serializer.serialize_bool(value),
                None => serializer.serialize_str(&self.text),
            },
            LiteralKind::Integer => match parse_integer(&self.text) {
                Some(value) => serializer.serialize_i64(value),
                None => serializer.serialize_str(&self.text),
            },
            LiteralKind::Float => match parse_float(&self.text) {
                Some(value) => serializer.serialize_f64(value),
                None => serializer.serialize_str(&self.text),
            },
            LiteralKind::String => serializer.serialize_str(&self.text),
        }
    }
}

impl Serialize for HoconObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for HoconArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in &self.items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

impl Serialize for HoconValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HoconValue::Object(object) => object.serialize(serializer),
            HoconValue::Array(array) => array.serialize(serializer),
            HoconValue::Literal(literal) => literal.serialize(serializer),
        }
    }
}
