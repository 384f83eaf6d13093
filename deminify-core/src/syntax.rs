//! Parser-independent syntax tree
//!
//! Only the node kinds that influence function naming are distinguished;
//! everything else collapses into `Other`, which keeps its children so nested
//! functions are never lost.

use crate::position::{SourcePosition, SourceRange};

/// A name as it appears in the minified text, with the position of its first character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub position: SourcePosition,
}

impl Identifier {
    pub fn new(name: impl Into<String>, position: SourcePosition) -> Self {
        Identifier {
            name: name.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    /// Root of a parsed source unit
    Program { children: Vec<SyntaxNode> },

    /// Any function form: declaration, expression, arrow, or method
    FunctionDefinition {
        /// Direct name binding (`function foo() {}`, `{ foo() {} }`)
        binding: Option<Identifier>,
        /// Extent of the body, braces included
        body: SourceRange,
        children: Vec<SyntaxNode>,
    },

    /// `target = value` where the target is an identifier or property access
    ///
    /// `target.name` is the target's source text, e.g. `a.prototype`.
    Assignment {
        target: Identifier,
        value: Box<SyntaxNode>,
    },

    ObjectLiteral { properties: Vec<SyntaxNode> },

    /// `key: value` or `key() {}` inside an object literal; computed keys have no name
    ObjectLiteralProperty {
        key: Option<Identifier>,
        value: Box<SyntaxNode>,
    },

    /// One declarator of `var`/`let`/`const`; destructuring patterns have no binding
    VariableDeclaration {
        binding: Option<Identifier>,
        init: Option<Box<SyntaxNode>>,
    },

    Other { children: Vec<SyntaxNode> },
}

impl SyntaxNode {
    /// A node with no interesting content
    pub fn empty() -> Self {
        SyntaxNode::Other {
            children: Vec::new(),
        }
    }

    /// Number of function definitions in this subtree, anonymous ones included
    pub fn function_count(&self) -> usize {
        let own = usize::from(matches!(self, SyntaxNode::FunctionDefinition { .. }));
        own + self.children().map(SyntaxNode::function_count).sum::<usize>()
    }

    /// Direct child nodes, in source order
    pub fn children(&self) -> Box<dyn Iterator<Item = &SyntaxNode> + '_> {
        match self {
            SyntaxNode::Program { children }
            | SyntaxNode::FunctionDefinition { children, .. }
            | SyntaxNode::Other { children } => Box::new(children.iter()),
            SyntaxNode::ObjectLiteral { properties } => Box::new(properties.iter()),
            SyntaxNode::Assignment { value, .. } | SyntaxNode::ObjectLiteralProperty { value, .. } => {
                Box::new(std::iter::once(&**value))
            }
            SyntaxNode::VariableDeclaration { init, .. } => Box::new(init.iter().map(|b| &**b)),
        }
    }
}
