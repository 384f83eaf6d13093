//! Function map construction
//!
//! Global invariants enforced:
//! - Entries appear in tree traversal order (pre-order), never sorted here
//! - Anonymous functions contribute no entry, but their nested functions do
//! - Entry ranges are the function body, not the parameter list
//!
//! Naming rules, first match wins:
//! 1. right-hand side of `target = function () {}`: the target's source text
//! 2. value of an object literal property: the property key
//! 3. initializer of a variable declaration: the declared name
//! 4. the function's own name binding
//!
//! When the object literal of rule 2 is itself assigned or declared
//! (`a.prototype = { b: function () {} }`), that outer binding is recorded as
//! the entry's owner.

use crate::position::{SourcePosition, SourceRange};
use crate::syntax::{Identifier, SyntaxNode};
use serde::{Deserialize, Serialize};

/// A name bound in the minified source and where it starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionBinding {
    pub name: String,
    pub source_position: SourcePosition,
}

impl From<&Identifier> for FunctionBinding {
    fn from(ident: &Identifier) -> Self {
        FunctionBinding {
            name: ident.name.clone(),
            source_position: ident.position,
        }
    }
}

/// One named function and the extent of its body in the minified source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMapEntry {
    pub function_name: String,
    pub function_name_source_position: Option<SourcePosition>,
    /// Binding of the object literal the function is a property of
    pub owner: Option<FunctionBinding>,
    pub start_source_position: SourcePosition,
    pub end_source_position: SourcePosition,
}

impl FunctionMapEntry {
    pub fn range(&self) -> SourceRange {
        SourceRange::new(self.start_source_position, self.end_source_position)
    }
}

/// Named functions of one minified source unit, in traversal order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMap {
    entries: Vec<FunctionMapEntry>,
}

impl FunctionMap {
    pub fn new(entries: Vec<FunctionMapEntry>) -> Self {
        FunctionMap { entries }
    }

    pub fn entries(&self) -> &[FunctionMapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How the node being visited is bound by its parent
#[derive(Clone, Copy)]
enum NameContext<'a> {
    Unbound,
    Assigned(&'a Identifier),
    Declared(&'a Identifier),
    /// Direct member of an object literal bound to `owner`
    InObject { owner: Option<&'a Identifier> },
    Property {
        key: &'a Identifier,
        owner: Option<&'a Identifier>,
    },
}

impl<'a> NameContext<'a> {
    /// Binding handed to the properties of an object literal in this context
    fn owner(self) -> Option<&'a Identifier> {
        match self {
            NameContext::Assigned(target) | NameContext::Declared(target) => Some(target),
            NameContext::Unbound | NameContext::InObject { .. } | NameContext::Property { .. } => {
                None
            }
        }
    }
}

/// Build the function map for a syntax tree
pub fn build_function_map(root: &SyntaxNode) -> FunctionMap {
    let mut entries = Vec::new();
    visit(root, NameContext::Unbound, &mut entries);
    FunctionMap::new(entries)
}

fn visit<'a>(node: &'a SyntaxNode, context: NameContext<'a>, entries: &mut Vec<FunctionMapEntry>) {
    match node {
        SyntaxNode::FunctionDefinition {
            binding,
            body,
            children,
        } => {
            let (name, owner) = match context {
                NameContext::Assigned(target) => (Some(target), None),
                NameContext::Property { key, owner } => (Some(key), owner),
                NameContext::Declared(declared) => (Some(declared), None),
                NameContext::Unbound | NameContext::InObject { .. } => (binding.as_ref(), None),
            };

            if let Some(name) = name {
                entries.push(FunctionMapEntry {
                    function_name: name.name.clone(),
                    function_name_source_position: Some(name.position),
                    owner: owner.map(FunctionBinding::from),
                    start_source_position: body.start,
                    end_source_position: body.end,
                });
            }

            for child in children {
                visit(child, NameContext::Unbound, entries);
            }
        }
        SyntaxNode::Assignment { target, value } => {
            visit(value, NameContext::Assigned(target), entries);
        }
        SyntaxNode::VariableDeclaration { binding, init } => {
            if let Some(init) = init {
                let context = binding
                    .as_ref()
                    .map_or(NameContext::Unbound, NameContext::Declared);
                visit(init, context, entries);
            }
        }
        SyntaxNode::ObjectLiteral { properties } => {
            let owner = context.owner();
            for property in properties {
                visit(property, NameContext::InObject { owner }, entries);
            }
        }
        SyntaxNode::ObjectLiteralProperty { key, value } => {
            let context = match (key, context) {
                (Some(key), NameContext::InObject { owner }) => NameContext::Property { key, owner },
                (Some(key), _) => NameContext::Property { key, owner: None },
                (None, _) => NameContext::Unbound,
            };
            visit(value, context, entries);
        }
        SyntaxNode::Program { children } | SyntaxNode::Other { children } => {
            for child in children {
                visit(child, NameContext::Unbound, entries);
            }
        }
    }
}
