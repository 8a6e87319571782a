//! Queryable, immutable HOCON document
//!
//! Every typed getter comes in three forms:
//!
//! - `get_x(path)` fails with [`HoconError::PathNotFound`] when the path
//!   is absent and with [`HoconError::Value`] when the value does not
//!   convert;
//! - `get_x_or(path, default)` returns `default` for an absent path but
//!   still reports conversion failures;
//! - `try_get_x(path)` never fails and returns `None` instead.

use crate::error::{HoconError, ValueError};
use crate::path::{HoconPath, ToHoconPath};
use crate::units::TimeSpan;
use crate::value::{HoconArray, HoconLiteral, HoconObject, HoconValue};
use std::fmt;

/// A parsed and fully resolved document
#[derive(Debug, Clone, PartialEq)]
pub struct HoconDocument {
    root: HoconValue,
}

macro_rules! typed_getters {
    ($(
        $(#[$doc:meta])*
        $get:ident, $get_or:ident, $try_get:ident, $get_list:ident, $try_get_list:ident
            => $ty:ty, $expected:literal, $convert:ident;
    )*) => {
        $(
            $(#[$doc])*
            pub fn $get(&self, path: impl ToHoconPath) -> Result<$ty, HoconError> {
                let path = path.to_hocon_path()?;
                let value = self.lookup(&path)?;
                Self::convert(&path, value, $expected, HoconLiteral::$convert)
            }

            /// Like the plain getter, returning `default` when the path is absent
            pub fn $get_or(&self, path: impl ToHoconPath, default: $ty) -> Result<$ty, HoconError> {
                let path = path.to_hocon_path()?;
                match self.root.get_path(&path) {
                    Some(value) => Self::convert(&path, value, $expected, HoconLiteral::$convert),
                    None => Ok(default),
                }
            }

            /// Like the plain getter, returning `None` on any failure
            pub fn $try_get(&self, path: impl ToHoconPath) -> Option<$ty> {
                self.$get(path).ok()
            }

            /// Elements of the array at `path`; numeric-keyed objects are
            /// accepted as arrays
            pub fn $get_list(&self, path: impl ToHoconPath) -> Result<Vec<$ty>, HoconError> {
                let path = path.to_hocon_path()?;
                let items = self.list(&path)?;
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let item_path = path.child(&index.to_string());
                        Self::convert(&item_path, item, $expected, HoconLiteral::$convert)
                    })
                    .collect()
            }

            /// Like the list getter, returning `None` on any failure
            pub fn $try_get_list(&self, path: impl ToHoconPath) -> Option<Vec<$ty>> {
                self.$get_list(path).ok()
            }
        )*
    };
}

impl HoconDocument {
    pub fn new(root: HoconValue) -> Self {
        Self { root }
    }

    /// Root value, an object for ordinary documents and an array for
    /// array documents
    pub fn root(&self) -> &HoconValue {
        &self.root
    }

    pub fn into_root(self) -> HoconValue {
        self.root
    }

    /// Returns true when `path` addresses a value. Invalid paths are absent.
    pub fn has_path(&self, path: impl ToHoconPath) -> bool {
        path.to_hocon_path()
            .map(|path| self.root.get_path(&path).is_some())
            .unwrap_or(false)
    }

    fn lookup(&self, path: &HoconPath) -> Result<&HoconValue, HoconError> {
        self.root
            .get_path(path)
            .ok_or_else(|| HoconError::PathNotFound {
                path: path.to_string(),
            })
    }

    fn convert<T>(
        path: &HoconPath,
        value: &HoconValue,
        expected: &'static str,
        convert: fn(&HoconLiteral) -> Result<T, ValueError>,
    ) -> Result<T, HoconError> {
        value
            .literal(expected)
            .and_then(convert)
            .map_err(|err| HoconError::value(path.to_string(), err))
    }

    fn list(&self, path: &HoconPath) -> Result<Vec<HoconValue>, HoconError> {
        self.lookup(path)?
            .to_list()
            .map_err(|err| HoconError::value(path.to_string(), err))
    }

    /// Value at `path`, whatever its kind
    pub fn get_value(&self, path: impl ToHoconPath) -> Result<&HoconValue, HoconError> {
        let path = path.to_hocon_path()?;
        self.lookup(&path)
    }

    pub fn try_get_value(&self, path: impl ToHoconPath) -> Option<&HoconValue> {
        self.get_value(path).ok()
    }

    /// Object at `path`
    pub fn get_object(&self, path: impl ToHoconPath) -> Result<&HoconObject, HoconError> {
        let path = path.to_hocon_path()?;
        self.lookup(&path)?
            .to_object()
            .map_err(|err| HoconError::value(path.to_string(), err))
    }

    pub fn get_object_or<'a>(
        &'a self,
        path: impl ToHoconPath,
        default: &'a HoconObject,
    ) -> Result<&'a HoconObject, HoconError> {
        let path = path.to_hocon_path()?;
        match self.root.get_path(&path) {
            Some(value) => value
                .to_object()
                .map_err(|err| HoconError::value(path.to_string(), err)),
            None => Ok(default),
        }
    }

    pub fn try_get_object(&self, path: impl ToHoconPath) -> Option<&HoconObject> {
        self.get_object(path).ok()
    }

    /// Array at `path`; a numeric-keyed object is converted
    pub fn get_array(&self, path: impl ToHoconPath) -> Result<HoconArray, HoconError> {
        let path = path.to_hocon_path()?;
        self.list(&path).map(HoconArray::from)
    }

    pub fn try_get_array(&self, path: impl ToHoconPath) -> Option<HoconArray> {
        self.get_array(path).ok()
    }

    /// Objects of the array at `path`
    pub fn get_object_list(&self, path: impl ToHoconPath) -> Result<Vec<HoconObject>, HoconError> {
        let path = path.to_hocon_path()?;
        self.list(&path)?
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                HoconValue::Object(object) => Ok(object),
                other => Err(HoconError::value(
                    path.child(&index.to_string()).to_string(),
                    ValueError::WrongType {
                        expected: "object",
                        found: other.type_name(),
                    },
                )),
            })
            .collect()
    }

    pub fn try_get_object_list(&self, path: impl ToHoconPath) -> Option<Vec<HoconObject>> {
        self.get_object_list(path).ok()
    }

    typed_getters! {
        /// String form of the literal at `path`
        get_string, get_string_or, try_get_string, get_string_list, try_get_string_list
            => String, "string", as_string;
        /// Boolean at `path`, accepting `true/yes/on` and `false/no/off`
        get_boolean, get_boolean_or, try_get_boolean, get_boolean_list, try_get_boolean_list
            => bool, "boolean", as_bool;
        /// 32-bit integer at `path`; hex and octal forms are accepted
        get_int, get_int_or, try_get_int, get_int_list, try_get_int_list
            => i32, "int", as_i32;
        /// 64-bit integer at `path`; hex and octal forms are accepted
        get_long, get_long_or, try_get_long, get_long_list, try_get_long_list
            => i64, "long", as_i64;
        /// Unsigned byte at `path`
        get_byte, get_byte_or, try_get_byte, get_byte_list, try_get_byte_list
            => u8, "byte", as_u8;
        /// Floating point number at `path`, including `Infinity` and `NaN`
        get_double, get_double_or, try_get_double, get_double_list, try_get_double_list
            => f64, "double", as_f64;
        /// Decimal number at `path`
        get_decimal, get_decimal_or, try_get_decimal, get_decimal_list, try_get_decimal_list
            => f64, "decimal", as_f64;
        /// Duration at `path` such as `500ms` or `infinite`
        get_time_span, get_time_span_or, try_get_time_span, get_time_span_list, try_get_time_span_list
            => TimeSpan, "duration", as_time_span;
        /// Byte size at `path` such as `10MiB`
        get_byte_size, get_byte_size_or, try_get_byte_size, get_byte_size_list, try_get_byte_size_list
            => u64, "byte size", as_byte_size;
    }

    /// Merges `fallback` under this document: keys of `self` win and
    /// nested objects merge recursively
    pub fn with_fallback(&self, fallback: &HoconDocument) -> HoconDocument {
        match (&self.root, &fallback.root) {
            (HoconValue::Object(mine), HoconValue::Object(theirs)) => {
                HoconDocument::new(HoconValue::Object(mine.with_fallback(theirs)))
            }
            _ => self.clone(),
        }
    }

    /// Renders the document as HOCON text
    pub fn to_hocon_string(&self, indent: usize) -> String {
        self.root.to_hocon_string(indent)
    }
}

impl fmt::Display for HoconDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
