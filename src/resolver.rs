//! Substitution resolution
//!
//! The resolver walks the live part of a parsed tree (the values that
//! field-history folding actually selects) and settles every substitution
//! it meets, resolving the targets of a substitution before copying them
//! in. Substitutions currently being resolved are kept on a stack; meeting
//! one of them again means the references form a cycle.
//!
//! Registered substitutions that the walk never reaches belong to values
//! overridden by later assignments. They are discarded unresolved.

use crate::error::{HoconError, ParseError, ResolveError};
use crate::lexer::LiteralType;
use crate::parser::ParserConfig;
use crate::path::HoconPath;
use crate::tree::{
    Element, ElementId, Folded, HoconType, ParseTree, SubstitutionNode, SubstitutionState,
};
use std::collections::HashMap;

/// Trait for looking up substitutions outside the document
pub trait VariableHandler {
    /// Resolves a variable by name
    fn resolve_variable(&self, name: &str) -> Option<String>;
}

/// Environment variable handler
pub struct EnvironmentVariableHandler;

impl VariableHandler for EnvironmentVariableHandler {
    fn resolve_variable(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Map-based variable handler
#[derive(Debug, Clone, Default)]
pub struct MapVariableHandler {
    variables: HashMap<String, String>,
}

impl MapVariableHandler {
    /// Creates a new map variable handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler from an existing map
    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    /// Inserts a variable
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}

impl VariableHandler for MapVariableHandler {
    fn resolve_variable(&self, name: &str) -> Option<String> {
        self.variables.get(name).cloned()
    }
}

/// Tries several handlers in order; the first hit wins
#[derive(Default)]
pub struct ChainedVariableHandler {
    handlers: Vec<Box<dyn VariableHandler>>,
}

impl ChainedVariableHandler {
    /// Creates a new chained handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler to the end of the chain
    pub fn add_handler(&mut self, handler: Box<dyn VariableHandler>) {
        self.handlers.push(handler);
    }

    /// Creates a chained handler from a vector of handlers
    pub fn from_handlers(handlers: Vec<Box<dyn VariableHandler>>) -> Self {
        Self { handlers }
    }
}

impl VariableHandler for ChainedVariableHandler {
    fn resolve_variable(&self, name: &str) -> Option<String> {
        self.handlers
            .iter()
            .find_map(|handler| handler.resolve_variable(name))
    }
}

/// Resolves the substitutions of one parse tree
pub struct Resolver<'a> {
    variables: &'a dyn VariableHandler,
    config: &'a ParserConfig,
    /// Substitutions currently being resolved, outermost first
    in_progress: Vec<ElementId>,
    resolved: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(variables: &'a dyn VariableHandler, config: &'a ParserConfig) -> Self {
        Self {
            variables,
            config,
            in_progress: Vec::new(),
            resolved: 0,
        }
    }

    /// Resolves every live substitution of `tree` in place
    pub fn resolve(&mut self, tree: &mut ParseTree) -> Result<(), HoconError> {
        let root = tree.root();
        self.resolve_live_value(tree, root)?;

        let mut discarded = 0;
        for id in tree.substitutions().to_vec() {
            if tree.substitution(id).state == SubstitutionState::Pending {
                tracing::trace!(
                    substitution = %tree.substitution(id).display(),
                    "discarding overridden substitution"
                );
                tree.set_substitution_state(id, SubstitutionState::Removed);
                discarded += 1;
            }
        }
        tracing::debug!(
            resolved = self.resolved,
            discarded,
            "resolved substitutions"
        );
        Ok(())
    }

    /// Settles `value` and everything reachable from it
    fn resolve_live_value(&mut self, tree: &mut ParseTree, value: ElementId) -> Result<(), HoconError> {
        self.settle_value(tree, value)?;

        let objects = tree.object_parts(value);
        if !objects.is_empty() {
            self.resolve_live_objects(tree, &objects)?;
        }

        let parts = tree.value(value).parts.clone();
        for part in parts {
            if let Element::Array(array) = tree.get(part) {
                let items = array.items.clone();
                for item in items {
                    self.resolve_live_value(tree, item)?;
                }
                tree.check_array_homogeneity(part)?;
            }
        }
        Ok(())
    }

    /// Settles the merged view of `objects`, field by field
    fn resolve_live_objects(
        &mut self,
        tree: &mut ParseTree,
        objects: &[ElementId],
    ) -> Result<(), HoconError> {
        for key in tree.merged_keys(objects) {
            let history = tree.merged_history(objects, &key, None);
            match self.fold(tree, &history)? {
                Folded::Empty => {}
                Folded::Objects(inner) => self.resolve_live_objects(tree, &inner)?,
                Folded::Value(value) => self.resolve_live_value(tree, value)?,
            }
        }
        Ok(())
    }

    /// Folds a history, settling only the entries the fold looks at
    fn fold(&mut self, tree: &mut ParseTree, history: &[ElementId]) -> Result<Folded, HoconError> {
        for (index, &value) in history.iter().enumerate().rev() {
            self.settle_value(tree, value)?;
            if !matches!(tree.value_type(value), HoconType::Empty | HoconType::Object) {
                return Ok(tree.fold(&history[index..]));
            }
        }
        Ok(tree.fold(history))
    }

    /// Resolves the substitutions that are direct parts of `value`
    fn settle_value(&mut self, tree: &mut ParseTree, value: ElementId) -> Result<(), HoconError> {
        loop {
            let pending = tree
                .value(value)
                .parts
                .iter()
                .copied()
                .find(|&part| matches!(tree.get(part), Element::Substitution(_)));
            match pending {
                Some(substitution) => self.resolve_substitution(tree, substitution)?,
                None => return Ok(()),
            }
        }
    }

    fn resolve_substitution(
        &mut self,
        tree: &mut ParseTree,
        id: ElementId,
    ) -> Result<(), HoconError> {
        let node = tree.substitution(id).clone();
        if let Some(start) = self.in_progress.iter().position(|&other| other == id) {
            let mut chain: Vec<String> = self.in_progress[start..]
                .iter()
                .map(|&other| tree.substitution(other).display())
                .collect();
            chain.push(node.display());
            return Err(ParseError::CyclicSubstitution {
                path: node.path.to_string(),
                chain: chain.join(" -> "),
                position: node.position,
            }
            .into());
        }

        self.in_progress.push(id);
        let replacement = self.replacement_for(tree, id, &node);
        self.in_progress.pop();
        let replacement = replacement?;

        tracing::debug!(
            substitution = %node.display(),
            parts = replacement.len(),
            "resolved substitution"
        );
        tree.replace_part(node.parent, id, replacement);
        tree.set_substitution_state(id, SubstitutionState::Resolved);
        self.resolved += 1;
        tree.check_concatenation(node.parent)?;
        Ok(())
    }

    /// Finds the parts that replace substitution `id`
    fn replacement_for(
        &mut self,
        tree: &mut ParseTree,
        id: ElementId,
        node: &SubstitutionNode,
    ) -> Result<Vec<ElementId>, HoconError> {
        let mut cutoff = None;
        if let Some((field, entry, in_array)) = tree.owning_field(id) {
            let field_path = tree.field(field).path.clone();
            if node.path == field_path {
                if in_array {
                    return Err(ParseError::SelfReferenceInArray {
                        path: node.path.to_string(),
                        position: node.position,
                    }
                    .into());
                }
                cutoff = Some(tree.value(entry).seq);
            } else if node.path.is_child_of(&field_path) {
                cutoff = Some(tree.value(entry).seq);
            } else if field_path.is_child_of(&node.path) {
                return Err(ParseError::ParentReference {
                    path: node.path.to_string(),
                    field: field_path.to_string(),
                    position: node.position,
                }
                .into());
            }
        }

        let mut found = self.lookup(tree, &node.path, cutoff)?;
        if found == Folded::Empty {
            if let Some(original) = &node.original_path {
                found = self.lookup(tree, original, None)?;
            }
        }

        let base = tree.value_path(node.parent);
        match found {
            Folded::Objects(objects) => {
                self.resolve_live_objects(tree, &objects)?;
                return Ok(tree.clone_objects(&objects, &base));
            }
            Folded::Value(value) => {
                self.resolve_live_value(tree, value)?;
                return Ok(tree.clone_parts(value, &base));
            }
            Folded::Empty => {}
        }

        let name = node.original_path.as_ref().unwrap_or(&node.path).segments().join(".");
        if self.config.environment_fallback {
            if let Some(text) = self.variables.resolve_variable(&name) {
                tracing::debug!(variable = %name, "substitution taken from environment");
                return Ok(vec![tree.new_literal(LiteralType::QuotedString, text)]);
            }
        }

        if node.required {
            return Err(ResolveError::UnresolvedSubstitution {
                path: node.original_path.as_ref().unwrap_or(&node.path).to_string(),
                position: node.position,
            }
            .into());
        }
        tracing::debug!(substitution = %node.display(), "optional substitution left empty");
        Ok(Vec::new())
    }

    /// Looks `path` up in the tree, considering only assignments made
    /// before `cutoff`
    fn lookup(
        &mut self,
        tree: &mut ParseTree,
        path: &HoconPath,
        cutoff: Option<u64>,
    ) -> Result<Folded, HoconError> {
        let root = tree.root();
        let Folded::Objects(mut objects) = self.fold(tree, &[root])? else {
            return Ok(Folded::Empty);
        };

        let segments = path.segments();
        for (index, segment) in segments.iter().enumerate() {
            let history = tree.merged_history(&objects, segment, cutoff);
            let folded = self.fold(tree, &history)?;
            if index + 1 == segments.len() {
                return Ok(folded);
            }
            match folded {
                Folded::Objects(inner) => objects = inner,
                _ => return Ok(Folded::Empty),
            }
        }
        Ok(Folded::Empty)
    }
}
