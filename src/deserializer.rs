//! Serde deserializer implementation for HOCON
//!
//! This module provides the serde integration, allowing HOCON text to be
//! deserialized directly into Rust types using the standard serde derive
//! macros. Deserialization runs on the resolved document, so every
//! substitution and include has already been applied.
//!
//! Literals are converted on demand the same way the typed accessors of
//! [`HoconDocument`](crate::document::HoconDocument) convert them: a
//! `yes` string fills a `bool`, `0x1F` fills an integer and a
//! numeric-keyed object fills a sequence.

use crate::error::HoconError;
use crate::parser::HoconParserBuilder;
use crate::value::{HoconArray, HoconLiteral, HoconObject, HoconValue, LiteralKind};
use serde::de::{self, DeserializeOwned, DeserializeSeed, Error as _, Unexpected, Visitor};

/// Deserializer over a single resolved value
pub struct ValueDeserializer {
    value: HoconValue,
}

impl ValueDeserializer {
    pub fn new(value: HoconValue) -> Self {
        Self { value }
    }

    fn unexpected(&self) -> Unexpected<'_> {
        match &self.value {
            HoconValue::Object(_) => Unexpected::Map,
            HoconValue::Array(_) => Unexpected::Seq,
            HoconValue::Literal(literal) => match literal.kind() {
                LiteralKind::Null => Unexpected::Unit,
                _ => Unexpected::Str(literal.text()),
            },
        }
    }

    /// The literal, or an invalid-type error reported against `visitor`
    fn literal<'de, V>(&self, visitor: &V) -> Result<&HoconLiteral, HoconError>
    where
        V: Visitor<'de>,
    {
        match &self.value {
            HoconValue::Literal(literal) => Ok(literal),
            _ => Err(de::Error::invalid_type(self.unexpected(), visitor)),
        }
    }

    fn visit_integer<'de, V>(self, visitor: V) -> Result<V::Value, HoconError>
    where
        V: Visitor<'de>,
    {
        let literal = self.literal(&visitor)?;
        if let Ok(unsigned) = literal.text().trim().parse::<u64>() {
            if unsigned > i64::MAX as u64 {
                return visitor.visit_u64(unsigned);
            }
        }
        let value = literal.as_i64().map_err(HoconError::custom)?;
        visitor.visit_i64(value)
    }

    fn visit_float<'de, V>(self, visitor: V) -> Result<V::Value, HoconError>
    where
        V: Visitor<'de>,
    {
        let value = self.literal(&visitor)?.as_f64().map_err(HoconError::custom)?;
        visitor.visit_f64(value)
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = HoconError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let literal = match self.value {
            HoconValue::Object(object) => return visitor.visit_map(HoconMapAccess::new(object)),
            HoconValue::Array(array) => return visitor.visit_seq(HoconSeqAccess::new(array)),
            HoconValue::Literal(literal) => literal,
        };

        match literal.kind() {
            LiteralKind::Null => visitor.visit_unit(),
            LiteralKind::Boolean => match literal.as_bool() {
                Ok(value) => visitor.visit_bool(value),
                Err(_) => visitor.visit_string(literal.text().to_string()),
            },
            LiteralKind::Integer => match (literal.as_i64(), literal.as_f64()) {
                (Ok(value), _) => visitor.visit_i64(value),
                (Err(_), Ok(value)) => visitor.visit_f64(value),
                _ => visitor.visit_string(literal.text().to_string()),
            },
            LiteralKind::Float => match literal.as_f64() {
                Ok(value) => visitor.visit_f64(value),
                Err(_) => visitor.visit_string(literal.text().to_string()),
            },
            LiteralKind::String => visitor.visit_string(literal.text().to_string()),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let value = self.literal(&visitor)?.as_bool().map_err(HoconError::custom)?;
        visitor.visit_bool(value)
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_integer(visitor)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_integer(visitor)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_integer(visitor)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_integer(visitor)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_integer(visitor)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_integer(visitor)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_integer(visitor)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_integer(visitor)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_float(visitor)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.visit_float(visitor)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let text = self.literal(&visitor)?.as_string().map_err(HoconError::custom)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(de::Error::invalid_value(Unexpected::Str(&text), &visitor)),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let text = self.literal(&visitor)?.as_string().map_err(HoconError::custom)?;
        visitor.visit_string(text)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let text = self.literal(&visitor)?.as_string().map_err(HoconError::custom)?;
        visitor.visit_byte_buf(text.into_bytes())
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        if self.value.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        if self.value.is_null() {
            visitor.visit_unit()
        } else {
            Err(de::Error::invalid_type(self.unexpected(), &visitor))
        }
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            HoconValue::Array(array) => visitor.visit_seq(HoconSeqAccess::new(array)),
            // Objects keyed 0, 1, ... read as sequences
            HoconValue::Object(object) => {
                let array = object.to_array().map_err(HoconError::custom)?;
                visitor.visit_seq(HoconSeqAccess::new(array))
            }
            HoconValue::Literal(_) => Err(de::Error::invalid_type(self.unexpected(), &visitor)),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            HoconValue::Object(object) => visitor.visit_map(HoconMapAccess::new(object)),
            _ => Err(de::Error::invalid_type(self.unexpected(), &visitor)),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            // Unit variant
            HoconValue::Literal(ref literal) if literal.kind() == LiteralKind::String => {
                let variant = literal.text().to_string();
                visitor.visit_enum(HoconEnumAccess::new(variant, None))
            }
            // Data variant, an object with a single key
            HoconValue::Object(object) if object.len() == 1 => {
                match object.into_iter().next() {
                    Some((variant, value)) => {
                        visitor.visit_enum(HoconEnumAccess::new(variant, Some(value)))
                    }
                    None => Err(de::Error::custom("empty enum object")),
                }
            }
            HoconValue::Object(object) => Err(de::Error::invalid_length(
                object.len(),
                &"a string or an object with a single key",
            )),
            _ => Err(de::Error::invalid_type(self.unexpected(), &visitor)),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Sequence access for HOCON arrays
struct HoconSeqAccess {
    items: std::vec::IntoIter<HoconValue>,
}

impl HoconSeqAccess {
    fn new(array: HoconArray) -> Self {
        Self {
            items: array.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for HoconSeqAccess {
    type Error = HoconError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.items.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Map access for HOCON objects
struct HoconMapAccess {
    fields: std::collections::btree_map::IntoIter<String, HoconValue>,
    current_value: Option<HoconValue>,
}

impl HoconMapAccess {
    fn new(object: HoconObject) -> Self {
        Self {
            fields: object.into_iter(),
            current_value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for HoconMapAccess {
    type Error = HoconError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.fields.next() {
            Some((key, value)) => {
                self.current_value = Some(value);
                let key = ValueDeserializer::new(HoconValue::Literal(HoconLiteral::string(key)));
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.current_value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(de::Error::custom("value requested before key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

/// Enum access for HOCON enum deserialization
struct HoconEnumAccess {
    variant: String,
    value: Option<HoconValue>,
}

impl HoconEnumAccess {
    fn new(variant: String, value: Option<HoconValue>) -> Self {
        Self { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for HoconEnumAccess {
    type Error = HoconError;
    type Variant = HoconVariantAccess;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let name = ValueDeserializer::new(HoconValue::Literal(HoconLiteral::string(self.variant)));
        let variant = seed.deserialize(name)?;
        Ok((variant, HoconVariantAccess { value: self.value }))
    }
}

/// Variant access for HOCON enum variants
struct HoconVariantAccess {
    value: Option<HoconValue>,
}

impl<'de> de::VariantAccess<'de> for HoconVariantAccess {
    type Error = HoconError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.value {
            None => Ok(()),
            Some(_) => Err(de::Error::custom("expected unit variant, found data")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(de::Error::custom("expected newtype variant data, found unit")),
        }
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(value) => de::Deserializer::deserialize_tuple(
                ValueDeserializer::new(value),
                len,
                visitor,
            ),
            None => Err(de::Error::custom("expected tuple variant data, found unit")),
        }
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(value) => de::Deserializer::deserialize_map(ValueDeserializer::new(value), visitor),
            None => Err(de::Error::custom("expected struct variant data, found unit")),
        }
    }
}

/// Deserializes a resolved value into a Rust type
pub fn from_value<T>(value: &HoconValue) -> Result<T, HoconError>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value.clone()))
}

/// Parses and resolves HOCON text, then deserializes the document root
pub fn from_str<T>(text: &str) -> Result<T, HoconError>
where
    T: DeserializeOwned,
{
    let document = HoconParserBuilder::new(text).parse()?;
    T::deserialize(ValueDeserializer::new(document.into_root()))
}
