//! Mutable parse tree
//!
//! All nodes of one parse live in a single [`ParseTree`] arena and refer to
//! each other through [`ElementId`] handles, so parent back-pointers,
//! field histories and substitution owners need no shared ownership.
//!
//! A field keeps every value ever assigned to it. Its effective value is
//! found by scanning the history backward: trailing object values merge,
//! the first non-object value ends the scan, and emptied values (optional
//! substitutions that resolved to nothing) are skipped.

use crate::error::{ParseError, Position};
use crate::lexer::LiteralType;
use crate::path::HoconPath;
use indexmap::IndexMap;

/// Handle to an element in a [`ParseTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Effective type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoconType {
    /// No content, or only whitespace and removed substitutions
    Empty,
    Object,
    Array,
    Boolean,
    Number,
    String,
    Null,
}

impl HoconType {
    pub fn name(&self) -> &'static str {
        match self {
            HoconType::Empty => "empty",
            HoconType::Object => "object",
            HoconType::Array => "array",
            HoconType::Boolean => "boolean",
            HoconType::Number => "number",
            HoconType::String => "string",
            HoconType::Null => "null",
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            HoconType::Boolean | HoconType::Number | HoconType::String | HoconType::Null
        )
    }

    /// Whether two parts may be concatenated within one value
    pub fn concatenates_with(&self, other: HoconType) -> bool {
        match (self, other) {
            (HoconType::Empty, _) | (_, HoconType::Empty) => true,
            (HoconType::Object, HoconType::Object) | (HoconType::Array, HoconType::Array) => true,
            (a, b) => a.is_literal() && b.is_literal(),
        }
    }

    /// Whether two array elements share a type; null fits anywhere
    pub fn is_homogeneous_with(&self, other: HoconType) -> bool {
        matches!(self, HoconType::Empty | HoconType::Null)
            || matches!(other, HoconType::Empty | HoconType::Null)
            || *self == other
    }
}

#[derive(Debug, Clone)]
pub struct LiteralNode {
    pub literal_type: LiteralType,
    pub text: String,
}

impl LiteralNode {
    pub fn hocon_type(&self) -> HoconType {
        match self.literal_type {
            LiteralType::Whitespace | LiteralType::None => HoconType::Empty,
            LiteralType::Null => HoconType::Null,
            LiteralType::Boolean => HoconType::Boolean,
            LiteralType::Long | LiteralType::Double | LiteralType::Hex | LiteralType::Octal => {
                HoconType::Number
            }
            LiteralType::UnquotedString
            | LiteralType::QuotedString
            | LiteralType::TripleQuotedString => HoconType::String,
        }
    }
}

/// Right-hand side of one assignment, or one array element
#[derive(Debug, Clone)]
pub struct ValueNode {
    /// Literals, objects, arrays and substitutions in source order
    pub parts: Vec<ElementId>,
    /// Owning field or array; `None` for the document root
    pub parent: Option<ElementId>,
    /// Assignment order, used to find a field's value "as of" a point
    pub seq: u64,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct ObjectNode {
    pub fields: IndexMap<String, ElementId>,
    /// Path of the field holding this object
    pub path: HoconPath,
    pub parent: Option<ElementId>,
}

#[derive(Debug, Clone)]
pub struct ArrayNode {
    pub items: Vec<ElementId>,
    pub parent: Option<ElementId>,
}

#[derive(Debug, Clone)]
pub struct FieldNode {
    pub key: String,
    pub path: HoconPath,
    /// Every value assigned to this field, oldest first
    pub history: Vec<ElementId>,
    pub parent: ElementId,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionState {
    Pending,
    Resolved,
    /// Superseded by a later assignment, never resolved
    Removed,
}

#[derive(Debug, Clone)]
pub struct SubstitutionNode {
    pub path: HoconPath,
    /// Path as written, before an include prefix was applied
    pub original_path: Option<HoconPath>,
    pub required: bool,
    pub parent: ElementId,
    pub position: Position,
    pub state: SubstitutionState,
}

impl SubstitutionNode {
    /// `${path}` or `${?path}`, as written in the source
    pub fn display(&self) -> String {
        let path = self.original_path.as_ref().unwrap_or(&self.path);
        if self.required {
            format!("${{{}}}", path)
        } else {
            format!("${{?{}}}", path)
        }
    }
}

#[derive(Debug, Clone)]
pub enum Element {
    Literal(LiteralNode),
    Value(ValueNode),
    Object(ObjectNode),
    Array(ArrayNode),
    Field(FieldNode),
    Substitution(SubstitutionNode),
}

impl Element {
    fn kind(&self) -> &'static str {
        match self {
            Element::Literal(_) => "literal",
            Element::Value(_) => "value",
            Element::Object(_) => "object",
            Element::Array(_) => "array",
            Element::Field(_) => "field",
            Element::Substitution(_) => "substitution",
        }
    }
}

/// Outcome of folding a field history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Folded {
    /// No live value
    Empty,
    /// Objects to merge, oldest first
    Objects(Vec<ElementId>),
    /// A single non-object value
    Value(ElementId),
}

/// How [`ParseTree::copy_element`] treats copied nodes
#[derive(Clone, Copy)]
enum CopyMode<'p> {
    /// Duplicate within one tree: sequence numbers are kept and
    /// substitutions are not registered again
    Clone,
    /// Bring in an included document: fresh sequence numbers, substitution
    /// paths prefixed and registered with this tree
    Import { prefix: &'p HoconPath },
}

/// Arena owning every node of one parse
#[derive(Debug, Clone)]
pub struct ParseTree {
    elements: Vec<Element>,
    root: ElementId,
    substitutions: Vec<ElementId>,
    next_seq: u64,
}

impl Default for ParseTree {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! node_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $node:ty) => {
        pub fn $get(&self, id: ElementId) -> &$node {
            match &self.elements[id.0] {
                Element::$variant(node) => node,
                other => unreachable!(
                    "element {:?} is a {}, not a {}",
                    id,
                    other.kind(),
                    stringify!($variant)
                ),
            }
        }

        #[allow(dead_code)]
        fn $get_mut(&mut self, id: ElementId) -> &mut $node {
            match &mut self.elements[id.0] {
                Element::$variant(node) => node,
                other => unreachable!(
                    "element {:?} is a {}, not a {}",
                    id,
                    other.kind(),
                    stringify!($variant)
                ),
            }
        }
    };
}

impl ParseTree {
    /// Creates a tree holding only an empty root value
    pub fn new() -> Self {
        let mut tree = Self {
            elements: Vec::new(),
            root: ElementId(0),
            substitutions: Vec::new(),
            next_seq: 0,
        };
        tree.root = tree.new_value(None, Position::new());
        tree
    }

    /// Root value; holds the document object or array
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    node_accessors!(literal, literal_mut, Literal, LiteralNode);
    node_accessors!(value, value_mut, Value, ValueNode);
    node_accessors!(object, object_mut, Object, ObjectNode);
    node_accessors!(array, array_mut, Array, ArrayNode);
    node_accessors!(field, field_mut, Field, FieldNode);
    node_accessors!(substitution, substitution_mut, Substitution, SubstitutionNode);

    fn alloc(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(element);
        id
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Creates an empty value. Use [`push_history`](Self::push_history) or
    /// [`push_item`](Self::push_item) to attach it.
    pub fn new_value(&mut self, parent: Option<ElementId>, position: Position) -> ElementId {
        let seq = self.take_seq();
        self.alloc(Element::Value(ValueNode {
            parts: Vec::new(),
            parent,
            seq,
            position,
        }))
    }

    /// Appends a literal to `value`
    pub fn push_literal(&mut self, value: ElementId, literal_type: LiteralType, text: String) {
        let id = self.alloc(Element::Literal(LiteralNode { literal_type, text }));
        self.value_mut(value).parts.push(id);
    }

    /// Appends a new empty object to `value`
    pub fn push_object(&mut self, value: ElementId, path: HoconPath) -> ElementId {
        let id = self.alloc(Element::Object(ObjectNode {
            fields: IndexMap::new(),
            path,
            parent: Some(value),
        }));
        self.value_mut(value).parts.push(id);
        id
    }

    /// Appends a new empty array to `value`
    pub fn push_array(&mut self, value: ElementId) -> ElementId {
        let id = self.alloc(Element::Array(ArrayNode {
            items: Vec::new(),
            parent: Some(value),
        }));
        self.value_mut(value).parts.push(id);
        id
    }

    /// Appends a pending substitution to `value` and registers it
    pub fn push_substitution(
        &mut self,
        value: ElementId,
        path: HoconPath,
        required: bool,
        position: Position,
    ) -> ElementId {
        let id = self.alloc(Element::Substitution(SubstitutionNode {
            path,
            original_path: None,
            required,
            parent: value,
            position,
            state: SubstitutionState::Pending,
        }));
        self.value_mut(value).parts.push(id);
        self.substitutions.push(id);
        id
    }

    /// Removes trailing whitespace literals from `value`
    pub fn trim_trailing_whitespace(&mut self, value: ElementId) {
        while let Some(&last) = self.value(value).parts.last() {
            let is_whitespace = matches!(
                self.get(last),
                Element::Literal(LiteralNode {
                    literal_type: LiteralType::Whitespace,
                    ..
                })
            );
            if !is_whitespace {
                break;
            }
            self.value_mut(value).parts.pop();
        }
    }

    /// Returns the field `key` of `object`, creating it when missing
    pub fn get_or_create_field(
        &mut self,
        object: ElementId,
        key: &str,
        position: Position,
    ) -> ElementId {
        if let Some(&field) = self.object(object).fields.get(key) {
            return field;
        }
        let path = self.object(object).path.child(key);
        let field = self.alloc(Element::Field(FieldNode {
            key: key.to_string(),
            path,
            history: Vec::new(),
            parent: object,
            position,
        }));
        self.object_mut(object).fields.insert(key.to_string(), field);
        field
    }

    /// Appends `value` to the history of `field`
    pub fn push_history(&mut self, field: ElementId, value: ElementId) {
        self.value_mut(value).parent = Some(field);
        self.field_mut(field).history.push(value);
    }

    /// Appends `value` as an element of `array`
    pub fn push_item(&mut self, array: ElementId, value: ElementId) {
        self.value_mut(value).parent = Some(array);
        self.array_mut(array).items.push(value);
    }

    /// The object of the newest history entry, when that entry is a plain
    /// object literal that further dotted keys can be added to
    pub fn latest_object(&self, field: ElementId) -> Option<ElementId> {
        let last = *self.field(field).history.last()?;
        let mut object = None;
        for &part in &self.value(last).parts {
            match self.get(part) {
                Element::Object(_) => object = Some(part),
                Element::Literal(literal) if literal.literal_type == LiteralType::Whitespace => {}
                _ => return None,
            }
        }
        object
    }

    /// Registered substitutions in source order
    pub fn substitutions(&self) -> &[ElementId] {
        &self.substitutions
    }

    pub fn set_substitution_state(&mut self, id: ElementId, state: SubstitutionState) {
        self.substitution_mut(id).state = state;
    }

    /// Parts of `value` that are objects
    pub fn object_parts(&self, value: ElementId) -> Vec<ElementId> {
        self.value(value)
            .parts
            .iter()
            .copied()
            .filter(|&part| matches!(self.get(part), Element::Object(_)))
            .collect()
    }

    /// Type of a single part; pending substitutions count as empty
    pub fn part_type(&self, part: ElementId) -> HoconType {
        match self.get(part) {
            Element::Literal(literal) => literal.hocon_type(),
            Element::Object(_) => HoconType::Object,
            Element::Array(_) => HoconType::Array,
            _ => HoconType::Empty,
        }
    }

    /// Effective type of a value. Two or more literals concatenate into a
    /// string.
    pub fn value_type(&self, value: ElementId) -> HoconType {
        let mut result = HoconType::Empty;
        let mut literals = 0;
        for &part in &self.value(value).parts {
            let part_type = self.part_type(part);
            if part_type == HoconType::Empty {
                continue;
            }
            if part_type.is_literal() {
                literals += 1;
            }
            if result == HoconType::Empty {
                result = part_type;
            }
        }
        if literals > 1 { HoconType::String } else { result }
    }

    /// Checks that every part of `value` can be concatenated with the others
    pub fn check_concatenation(&self, value: ElementId) -> Result<(), ParseError> {
        let mut established = HoconType::Empty;
        for &part in &self.value(value).parts {
            let part_type = self.part_type(part);
            if !established.concatenates_with(part_type) {
                return Err(ParseError::TypeMismatch {
                    path: self.value_path(value).to_string(),
                    expected: established.name().to_string(),
                    found: part_type.name().to_string(),
                    position: self.value(value).position,
                });
            }
            if established == HoconType::Empty {
                established = part_type;
            }
        }
        Ok(())
    }

    /// Checks that all elements of `array` share one type
    pub fn check_array_homogeneity(&self, array: ElementId) -> Result<(), ParseError> {
        let mut established = HoconType::Empty;
        for &item in &self.array(array).items {
            let item_type = self.value_type(item);
            if !established.is_homogeneous_with(item_type) {
                return Err(ParseError::TypeMismatch {
                    path: self.value_path(item).to_string(),
                    expected: format!("array of {}", established.name()),
                    found: item_type.name().to_string(),
                    position: self.value(item).position,
                });
            }
            if matches!(established, HoconType::Empty | HoconType::Null) {
                established = item_type;
            }
        }
        Ok(())
    }

    /// Path of the nearest field owning `value`
    pub fn value_path(&self, value: ElementId) -> HoconPath {
        let mut current = self.value(value).parent;
        while let Some(id) = current {
            match self.get(id) {
                Element::Field(field) => return field.path.clone(),
                Element::Array(array) => current = array.parent,
                Element::Value(value) => current = value.parent,
                _ => break,
            }
        }
        HoconPath::root()
    }

    /// Walks up from a substitution to the field whose history holds it.
    /// Returns the field, the history entry containing the substitution and
    /// whether an array lies in between.
    pub fn owning_field(&self, substitution: ElementId) -> Option<(ElementId, ElementId, bool)> {
        let mut value = self.substitution(substitution).parent;
        let mut in_array = false;
        loop {
            let parent = self.value(value).parent?;
            match self.get(parent) {
                Element::Field(_) => return Some((parent, value, in_array)),
                Element::Array(array) => {
                    in_array = true;
                    value = array.parent?;
                }
                _ => return None,
            }
        }
    }

    /// Field keys across `objects`, in first-seen order
    pub fn merged_keys(&self, objects: &[ElementId]) -> Vec<String> {
        let mut keys: IndexMap<&str, ()> = IndexMap::new();
        for &object in objects {
            for key in self.object(object).fields.keys() {
                keys.insert(key.as_str(), ());
            }
        }
        keys.into_keys().map(str::to_string).collect()
    }

    /// Concatenated history of field `key` across `objects`, keeping only
    /// entries assigned before `cutoff`
    pub fn merged_history(
        &self,
        objects: &[ElementId],
        key: &str,
        cutoff: Option<u64>,
    ) -> Vec<ElementId> {
        let mut history = Vec::new();
        for &object in objects {
            if let Some(&field) = self.object(object).fields.get(key) {
                history.extend(
                    self.field(field)
                        .history
                        .iter()
                        .copied()
                        .filter(|&value| cutoff.is_none_or(|cut| self.value(value).seq < cut)),
                );
            }
        }
        history
    }

    /// Folds a history whose substitutions are all settled
    pub fn fold(&self, history: &[ElementId]) -> Folded {
        let mut objects = Vec::new();
        for &value in history.iter().rev() {
            match self.value_type(value) {
                HoconType::Empty => continue,
                HoconType::Object => {
                    let mut parts = self.object_parts(value);
                    parts.extend(objects);
                    objects = parts;
                }
                _ if objects.is_empty() => return Folded::Value(value),
                _ => break,
            }
        }
        if objects.is_empty() {
            Folded::Empty
        } else {
            Folded::Objects(objects)
        }
    }

    /// Replaces the substitution `part` of `value` with `replacement`
    pub fn replace_part(&mut self, value: ElementId, part: ElementId, replacement: Vec<ElementId>) {
        for &id in &replacement {
            match &mut self.elements[id.0] {
                Element::Object(object) => object.parent = Some(value),
                Element::Array(array) => array.parent = Some(value),
                Element::Substitution(substitution) => substitution.parent = value,
                _ => {}
            }
        }
        let parts = &mut self.value_mut(value).parts;
        if let Some(index) = parts.iter().position(|&p| p == part) {
            parts.splice(index..=index, replacement);
        }
    }

    /// Creates a literal not yet attached to any value
    pub fn new_literal(&mut self, literal_type: LiteralType, text: String) -> ElementId {
        self.alloc(Element::Literal(LiteralNode { literal_type, text }))
    }

    /// Deep-copies the parts of `source_value` for insertion under a field
    /// at `base`. Copied values keep their sequence numbers.
    pub fn clone_parts(&mut self, source_value: ElementId, base: &HoconPath) -> Vec<ElementId> {
        let parts = self.value(source_value).parts.clone();
        parts
            .into_iter()
            .map(|part| self.copy_element(None, part, base, CopyMode::Clone))
            .collect()
    }

    /// Deep-copies the given objects for insertion under a field at `base`
    pub fn clone_objects(&mut self, objects: &[ElementId], base: &HoconPath) -> Vec<ElementId> {
        objects
            .iter()
            .map(|&object| self.copy_element(None, object, base, CopyMode::Clone))
            .collect()
    }

    /// Merges the root object of an included document into `object`.
    /// Field histories are appended in the included order and substitution
    /// paths are prefixed with the path of `object`.
    pub fn import(&mut self, source: &ParseTree, object: ElementId) {
        let prefix = self.object(object).path.clone();
        let mode = CopyMode::Import { prefix: &prefix };
        let root_objects = source.object_parts(source.root());
        for source_object in root_objects {
            for (key, &source_field) in &source.object(source_object).fields {
                let position = source.field(source_field).position;
                let field = self.get_or_create_field(object, key, position);
                let field_path = self.field(field).path.clone();
                for &source_value in &source.field(source_field).history {
                    let value = self.copy_element(Some(source), source_value, &field_path, mode);
                    self.push_history(field, value);
                }
            }
        }
    }

    /// Copies `id` from `source` (or from this tree when `None`).
    /// `base` is the path of the field that will own the copy.
    fn copy_element(
        &mut self,
        source: Option<&ParseTree>,
        id: ElementId,
        base: &HoconPath,
        mode: CopyMode<'_>,
    ) -> ElementId {
        let element = match source {
            Some(tree) => tree.get(id).clone(),
            None => self.get(id).clone(),
        };

        match element {
            Element::Literal(literal) => self.alloc(Element::Literal(literal)),
            Element::Value(value) => {
                let seq = match mode {
                    CopyMode::Clone => value.seq,
                    CopyMode::Import { .. } => self.take_seq(),
                };
                let copy = self.alloc(Element::Value(ValueNode {
                    parts: Vec::new(),
                    parent: None,
                    seq,
                    position: value.position,
                }));
                for part in value.parts {
                    let part_copy = self.copy_element(source, part, base, mode);
                    match &mut self.elements[part_copy.0] {
                        Element::Object(object) => object.parent = Some(copy),
                        Element::Array(array) => array.parent = Some(copy),
                        Element::Substitution(substitution) => substitution.parent = copy,
                        _ => {}
                    }
                    self.value_mut(copy).parts.push(part_copy);
                }
                copy
            }
            Element::Object(object) => {
                let copy = self.alloc(Element::Object(ObjectNode {
                    fields: IndexMap::new(),
                    path: base.clone(),
                    parent: None,
                }));
                for (key, field) in object.fields {
                    let field_copy = self.copy_element(source, field, &base.child(&key), mode);
                    self.field_mut(field_copy).parent = copy;
                    self.object_mut(copy).fields.insert(key, field_copy);
                }
                copy
            }
            Element::Array(array) => {
                let copy = self.alloc(Element::Array(ArrayNode {
                    items: Vec::new(),
                    parent: None,
                }));
                for item in array.items {
                    let item_copy = self.copy_element(source, item, base, mode);
                    self.push_item(copy, item_copy);
                }
                copy
            }
            Element::Field(field) => {
                let copy = self.alloc(Element::Field(FieldNode {
                    key: field.key,
                    path: base.clone(),
                    history: Vec::new(),
                    parent: field.parent,
                    position: field.position,
                }));
                for value in field.history {
                    let value_copy = self.copy_element(source, value, base, mode);
                    self.push_history(copy, value_copy);
                }
                copy
            }
            Element::Substitution(mut substitution) => {
                if let CopyMode::Import { prefix } = mode {
                    if !prefix.is_empty() {
                        let original = substitution
                            .original_path
                            .take()
                            .unwrap_or_else(|| substitution.path.clone());
                        substitution.path = substitution.path.prefixed(prefix);
                        substitution.original_path = Some(original);
                    }
                }
                let registered = matches!(mode, CopyMode::Import { .. })
                    && substitution.state == SubstitutionState::Pending;
                let copy = self.alloc(Element::Substitution(substitution));
                if registered {
                    self.substitutions.push(copy);
                }
                copy
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(text: &str) -> HoconPath {
        HoconPath::parse(text).unwrap()
    }

    fn root_object(tree: &mut ParseTree) -> ElementId {
        let root = tree.root();
        tree.push_object(root, HoconPath::root())
    }

    fn assign(tree: &mut ParseTree, object: ElementId, key: &str, literal: &str) -> ElementId {
        let field = tree.get_or_create_field(object, key, Position::new());
        let value = tree.new_value(None, Position::new());
        tree.push_literal(value, LiteralType::Long, literal.to_string());
        tree.push_history(field, value);
        value
    }

    #[test]
    fn test_field_paths_follow_object_nesting() {
        let mut tree = ParseTree::new();
        let root = root_object(&mut tree);
        let a = tree.get_or_create_field(root, "a", Position::new());
        let value = tree.new_value(None, Position::new());
        let inner = tree.push_object(value, path("a"));
        tree.push_history(a, value);
        let b = tree.get_or_create_field(inner, "b", Position::new());

        assert_eq!(tree.field(b).path, path("a.b"));
        assert_eq!(tree.latest_object(a), Some(inner));
    }

    #[test]
    fn test_fold_merges_trailing_objects_only() {
        let mut tree = ParseTree::new();
        let root = root_object(&mut tree);
        let scalar = assign(&mut tree, root, "a", "1");
        let field = tree.get_or_create_field(root, "a", Position::new());

        let first = tree.new_value(None, Position::new());
        let first_object = tree.push_object(first, path("a"));
        tree.push_history(field, first);
        let second = tree.new_value(None, Position::new());
        let second_object = tree.push_object(second, path("a"));
        tree.push_history(field, second);

        let history = tree.field(field).history.clone();
        assert_eq!(
            tree.fold(&history),
            Folded::Objects(vec![first_object, second_object])
        );
        assert_eq!(tree.fold(&history[..1]), Folded::Value(scalar));
    }

    #[test]
    fn test_fold_skips_emptied_values() {
        let mut tree = ParseTree::new();
        let root = root_object(&mut tree);
        let kept = assign(&mut tree, root, "a", "1");
        let field = tree.get_or_create_field(root, "a", Position::new());
        let emptied = tree.new_value(None, Position::new());
        tree.push_literal(emptied, LiteralType::Whitespace, " ".to_string());
        tree.push_history(field, emptied);

        let history = tree.field(field).history.clone();
        assert_eq!(tree.fold(&history), Folded::Value(kept));
    }

    #[test]
    fn test_literal_concatenation_is_a_string() {
        let mut tree = ParseTree::new();
        let value = tree.new_value(None, Position::new());
        tree.push_literal(value, LiteralType::Long, "1".to_string());
        assert_eq!(tree.value_type(value), HoconType::Number);
        tree.push_literal(value, LiteralType::Whitespace, " ".to_string());
        tree.push_literal(value, LiteralType::Boolean, "true".to_string());
        assert_eq!(tree.value_type(value), HoconType::String);
        assert!(tree.check_concatenation(value).is_ok());
    }

    #[test]
    fn test_object_and_literal_do_not_concatenate() {
        let mut tree = ParseTree::new();
        let value = tree.new_value(None, Position::new());
        tree.push_object(value, HoconPath::root());
        tree.push_literal(value, LiteralType::Long, "5".to_string());
        assert!(matches!(
            tree.check_concatenation(value),
            Err(ParseError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_array_homogeneity_allows_null() {
        let mut tree = ParseTree::new();
        let value = tree.new_value(None, Position::new());
        let array = tree.push_array(value);
        for (literal_type, text) in [
            (LiteralType::Long, "1"),
            (LiteralType::Null, "null"),
            (LiteralType::Double, "2.5"),
        ] {
            let item = tree.new_value(None, Position::new());
            tree.push_literal(item, literal_type, text.to_string());
            tree.push_item(array, item);
        }
        assert!(tree.check_array_homogeneity(array).is_ok());

        let item = tree.new_value(None, Position::new());
        tree.push_literal(item, LiteralType::QuotedString, "a".to_string());
        tree.push_item(array, item);
        assert!(tree.check_array_homogeneity(array).is_err());
    }

    #[test]
    fn test_merged_history_respects_cutoff() {
        let mut tree = ParseTree::new();
        let root = root_object(&mut tree);
        let first = assign(&mut tree, root, "a", "1");
        let second = assign(&mut tree, root, "a", "2");
        let cutoff = tree.value(second).seq;

        assert_eq!(tree.merged_history(&[root], "a", Some(cutoff)), vec![first]);
        assert_eq!(tree.merged_history(&[root], "a", None), vec![first, second]);
    }

    #[test]
    fn test_import_prefixes_substitutions() {
        let mut included = ParseTree::new();
        let included_root = root_object(&mut included);
        let field = included.get_or_create_field(included_root, "z", Position::new());
        let value = included.new_value(None, Position::new());
        included.push_substitution(value, path("y"), true, Position::new());
        included.push_history(field, value);

        let mut tree = ParseTree::new();
        let root = root_object(&mut tree);
        let outer = tree.get_or_create_field(root, "outer", Position::new());
        let outer_value = tree.new_value(None, Position::new());
        let outer_object = tree.push_object(outer_value, path("outer"));
        tree.push_history(outer, outer_value);

        tree.import(&included, outer_object);

        let substitution = tree.substitution(tree.substitutions()[0]);
        assert_eq!(substitution.path, path("outer.y"));
        assert_eq!(substitution.original_path, Some(path("y")));
        let imported = tree.object(outer_object).fields["z"];
        assert_eq!(tree.field(imported).path, path("outer.z"));
    }
}
