//! Conversion of a resolved [`ParseTree`] into the immutable
//! [`HoconValue`] model

use crate::error::HoconError;
use crate::lexer::LiteralType;
use crate::tree::{Element, ElementId, Folded, HoconType, ParseTree};
use crate::value::{HoconArray, HoconLiteral, HoconObject, HoconValue, LiteralKind};

/// Builds the immutable document from a tree whose substitutions are
/// settled
pub struct Materializer<'a> {
    tree: &'a ParseTree,
}

impl<'a> Materializer<'a> {
    pub fn new(tree: &'a ParseTree) -> Self {
        Self { tree }
    }

    pub fn materialize(&self) -> Result<HoconValue, HoconError> {
        let root = self.tree.root();
        let value = match self.tree.fold(&[root]) {
            Folded::Empty => HoconValue::Object(HoconObject::new()),
            Folded::Objects(objects) => HoconValue::Object(self.object(&objects)?),
            Folded::Value(value) => self.value(value)?,
        };
        tracing::trace!(kind = value.type_name(), "materialized document");
        Ok(value)
    }

    /// Merges the fields of `objects`, later objects winning
    fn object(&self, objects: &[ElementId]) -> Result<HoconObject, HoconError> {
        let mut result = HoconObject::new();
        for key in self.tree.merged_keys(objects) {
            let history = self.tree.merged_history(objects, &key, None);
            let value = match self.tree.fold(&history) {
                Folded::Empty => continue,
                Folded::Objects(inner) => HoconValue::Object(self.object(&inner)?),
                Folded::Value(value) => self.value(value)?,
            };
            result.insert(key, value);
        }
        Ok(result)
    }

    fn value(&self, value: ElementId) -> Result<HoconValue, HoconError> {
        self.tree.check_concatenation(value)?;
        let parts = &self.tree.value(value).parts;

        match self.tree.value_type(value) {
            HoconType::Object => Ok(HoconValue::Object(
                self.object(&self.tree.object_parts(value))?,
            )),
            HoconType::Array => {
                let mut items = Vec::new();
                for &part in parts {
                    if let Element::Array(array) = self.tree.get(part) {
                        for &item in &array.items {
                            match self.tree.fold(&[item]) {
                                Folded::Empty => {}
                                Folded::Objects(objects) => {
                                    items.push(HoconValue::Object(self.object(&objects)?))
                                }
                                Folded::Value(inner) => items.push(self.value(inner)?),
                            }
                        }
                    }
                }
                Ok(HoconValue::Array(HoconArray::from(items)))
            }
            HoconType::Empty => Ok(HoconValue::Literal(HoconLiteral::string(""))),
            _ => Ok(HoconValue::Literal(self.literal(parts))),
        }
    }

    /// A single literal keeps its kind; concatenations become strings with
    /// edge whitespace removed
    fn literal(&self, parts: &[ElementId]) -> HoconLiteral {
        let literals: Vec<_> = parts
            .iter()
            .filter_map(|&part| match self.tree.get(part) {
                Element::Literal(literal) => Some(literal),
                _ => None,
            })
            .collect();

        let significant: Vec<_> = literals
            .iter()
            .filter(|literal| literal.literal_type != LiteralType::Whitespace)
            .collect();
        if let [single] = significant.as_slice() {
            let kind = match single.literal_type {
                LiteralType::Null => LiteralKind::Null,
                LiteralType::Boolean => LiteralKind::Boolean,
                LiteralType::Long | LiteralType::Hex | LiteralType::Octal => LiteralKind::Integer,
                LiteralType::Double => LiteralKind::Float,
                _ => LiteralKind::String,
            };
            return HoconLiteral::new(kind, single.text.clone());
        }

        let start = literals
            .iter()
            .position(|literal| literal.literal_type != LiteralType::Whitespace)
            .unwrap_or(literals.len());
        let end = literals
            .iter()
            .rposition(|literal| literal.literal_type != LiteralType::Whitespace)
            .map_or(start, |index| index + 1);
        let text: String = literals[start..end]
            .iter()
            .map(|literal| literal.text.as_str())
            .collect();
        HoconLiteral::string(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{HoconParser, NoIncludes, ParserConfig};
    use crate::resolver::{MapVariableHandler, Resolver};

    fn materialize(input: &str) -> HoconValue {
        let config = ParserConfig::default();
        let mut tree = HoconParser::new(input, &NoIncludes, &config)
            .parse_tree()
            .unwrap();
        Resolver::new(&MapVariableHandler::new(), &config)
            .resolve(&mut tree)
            .unwrap();
        Materializer::new(&tree).materialize().unwrap()
    }

    fn literal<'v>(value: &'v HoconValue, key: &str) -> &'v HoconLiteral {
        value
            .as_object()
            .and_then(|object| object.get(key))
            .and_then(HoconValue::as_literal)
            .unwrap()
    }

    #[test]
    fn test_literal_kinds_survive() {
        let value = materialize("a = 1\nb = 2.5\nc = yes\nd = null\ne = \"s\"\nf = 0x1F");
        assert_eq!(literal(&value, "a").kind(), LiteralKind::Integer);
        assert_eq!(literal(&value, "b").kind(), LiteralKind::Float);
        assert_eq!(literal(&value, "c").kind(), LiteralKind::Boolean);
        assert_eq!(literal(&value, "d").kind(), LiteralKind::Null);
        assert_eq!(literal(&value, "e").kind(), LiteralKind::String);
        assert_eq!(literal(&value, "f").text(), "0x1F");
    }

    #[test]
    fn test_concatenation_becomes_string() {
        let value = materialize("a = foo   bar\nb = 1 2");
        assert_eq!(literal(&value, "a").text(), "foo   bar");
        assert_eq!(literal(&value, "a").kind(), LiteralKind::String);
        assert_eq!(literal(&value, "b").text(), "1 2");
    }

    #[test]
    fn test_array_concatenation() {
        let value = materialize("a = [1, 2] [3]");
        let array = value
            .as_object()
            .and_then(|object| object.get("a"))
            .and_then(HoconValue::as_array)
            .unwrap();
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn test_objects_sorted_and_merged() {
        let value = materialize("b { y = 1 }\na = 0\nb { x = 2 }");
        let object = value.as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        let b = object.get("b").and_then(HoconValue::as_object).unwrap();
        assert_eq!(b.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_array_document_root() {
        let value = materialize("[{ a = 1 }, { a = 2 }]");
        assert_eq!(value.as_array().map(HoconArray::len), Some(2));
    }
}
