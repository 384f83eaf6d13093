//! JavaScript parser using SWC, lowered to [`SyntaxNode`]
//!
//! Global invariants enforced:
//! - Lowered children keep source order
//! - Every function with a body becomes a `FunctionDefinition`, named or not
//! - Positions are zero-based; columns count characters

use crate::position::{SourcePosition, SourceRange};
use crate::syntax::{Identifier, SyntaxNode};
use anyhow::Result;
use swc_common::{
    sync::Lrc, BytePos, FileName, SourceFile, SourceMap as SwcSourceMap, SourceMapper, Span, Spanned,
};
use swc_ecma_ast::*;
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};
use swc_ecma_visit::{Visit, VisitWith};

/// Produces the syntax tree of a minified source unit
pub trait SyntaxTreeProvider: Send + Sync {
    /// Parse `source`; `url` is used for dialect detection and error context
    ///
    /// A parse failure is an error; a source without functions is a `Program`
    /// with no function definitions.
    fn parse(&self, source: &str, url: &str) -> Result<SyntaxNode>;
}

/// [`SyntaxTreeProvider`] backed by the SWC ECMAScript parser
#[derive(Debug, Clone, Copy, Default)]
pub struct EcmaScriptSyntaxTreeProvider;

impl EcmaScriptSyntaxTreeProvider {
    pub fn new() -> Self {
        EcmaScriptSyntaxTreeProvider
    }
}

impl SyntaxTreeProvider for EcmaScriptSyntaxTreeProvider {
    fn parse(&self, source: &str, url: &str) -> Result<SyntaxNode> {
        let source_map: Lrc<SwcSourceMap> = Default::default();
        let program = parse_program(source, &source_map, url)?;
        Ok(lower_program(&program, &source_map))
    }
}

/// Strip query string and fragment so `app.min.js?v=3` is still `.js`
fn path_of(url: &str) -> &str {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    &url[..end]
}

/// Determine the syntax configuration based on the file extension of the URL
fn syntax_for_url(url: &str) -> Syntax {
    let path = path_of(url);
    if path.ends_with(".tsx") {
        Syntax::Typescript(swc_ecma_parser::TsSyntax {
            tsx: true,
            ..Default::default()
        })
    } else if path.ends_with(".ts") || path.ends_with(".mts") || path.ends_with(".cts") {
        Syntax::Typescript(swc_ecma_parser::TsSyntax {
            tsx: false,
            ..Default::default()
        })
    } else {
        // Served bundles are plain JavaScript, JSX enabled for unbundled dev builds
        Syntax::Es(swc_ecma_parser::EsSyntax {
            jsx: path.ends_with(".jsx"),
            ..Default::default()
        })
    }
}

/// Parse source text as a script or module, whichever it turns out to be
pub fn parse_program(src: &str, source_map: &Lrc<SwcSourceMap>, url: &str) -> Result<Program> {
    let syntax = syntax_for_url(url);

    let source_file: Lrc<SourceFile> =
        source_map.new_source_file(FileName::Custom(url.into()).into(), src.to_string());

    let lexer = Lexer::new(syntax, EsVersion::Es2022, StringInput::from(&*source_file), None);
    let mut parser = Parser::new_from(lexer);

    parser.parse_program().map_err(|e| {
        let error_msg = e.kind().msg();
        anyhow::anyhow!("Parse error: {}", error_msg)
            .context(format!("Failed to parse source file: {}", url))
    })
}

/// Lower an SWC program into a [`SyntaxNode::Program`]
pub fn lower_program(program: &Program, source_map: &SwcSourceMap) -> SyntaxNode {
    let mut lowerer = Lowerer {
        source_map,
        stack: vec![Vec::new()],
        class_names: Vec::new(),
    };
    program.visit_with(&mut lowerer);

    SyntaxNode::Program {
        children: lowerer.stack.pop().unwrap_or_default(),
    }
}

/// Builds the tree bottom-up: each interesting node opens a frame on `stack`,
/// visits its children into it, then closes it into a single node on the parent frame.
struct Lowerer<'a> {
    source_map: &'a SwcSourceMap,
    stack: Vec<Vec<SyntaxNode>>,
    /// Names of the enclosing classes, innermost last; `None` for anonymous class expressions
    class_names: Vec<Option<Identifier>>,
}

impl<'a> Lowerer<'a> {
    fn position(&self, pos: BytePos) -> SourcePosition {
        let loc = self.source_map.lookup_char_pos(pos);
        SourcePosition::new((loc.line as u32).saturating_sub(1), loc.col.0 as u32)
    }

    /// Inclusive range: the last character of the span is its end
    fn range(&self, span: Span) -> SourceRange {
        let start = self.position(span.lo);
        let end = self.position(BytePos(span.hi.0.saturating_sub(1)).max(span.lo));
        SourceRange::new(start, end)
    }

    fn identifier(&self, name: impl Into<String>, span: Span) -> Identifier {
        Identifier::new(name, self.position(span.lo))
    }

    fn prop_name(&self, key: &PropName) -> Option<Identifier> {
        match key {
            PropName::Ident(ident) => Some(self.identifier(ident.sym.to_string(), ident.span)),
            PropName::Str(str_lit) => {
                Some(self.identifier(str_lit.value.to_atom_lossy().to_string(), str_lit.span))
            }
            PropName::Num(num) => Some(self.identifier(num.to_string(), num.span)),
            _ => None,
        }
    }

    fn emit(&mut self, node: SyntaxNode) {
        if let Some(frame) = self.stack.last_mut() {
            frame.push(node);
        }
    }

    /// Lower everything below `node` into a fresh frame and return it
    fn collect_children<N: VisitWith<Self>>(&mut self, node: &N) -> Vec<SyntaxNode> {
        self.stack.push(Vec::new());
        node.visit_children_with(self);
        self.stack.pop().unwrap_or_default()
    }

    /// Lower an expression in value position
    ///
    /// Functions and object literals stay recognizable as the value itself; any
    /// other expression becomes `Other` so that `x = f || function () {}` does
    /// not pass the binding on to the function.
    fn lower_value(&mut self, expr: &Expr) -> SyntaxNode {
        self.stack.push(Vec::new());
        expr.visit_with(self);
        let mut children = self.stack.pop().unwrap_or_default();

        if is_direct_value(expr) && children.len() == 1 {
            if let Some(node) = children.pop() {
                return node;
            }
        }
        SyntaxNode::Other { children }
    }

    fn lower_function(&mut self, binding: Option<Identifier>, function: &Function) {
        let children = self.collect_children(function);
        match &function.body {
            Some(body) => self.emit(SyntaxNode::FunctionDefinition {
                binding,
                body: self.range(body.span),
                children,
            }),
            // Overload signatures and ambient declarations have no body to stand in
            None => self.emit(SyntaxNode::Other { children }),
        }
    }

    fn lower_class(&mut self, name: Option<Identifier>, class: &Class) {
        self.class_names.push(name);
        class.visit_with(self);
        self.class_names.pop();
    }

    /// Getters and setters of object literals carry a bare body instead of a `Function`
    fn lower_accessor<N: VisitWith<Self>>(&mut self, key: &PropName, body: &Option<BlockStmt>, node: &N) {
        let key = self.prop_name(key);
        let children = self.collect_children(node);
        let value = match body {
            Some(body) => SyntaxNode::FunctionDefinition {
                binding: None,
                body: self.range(body.span),
                children,
            },
            None => SyntaxNode::Other { children },
        };
        self.emit(SyntaxNode::ObjectLiteralProperty {
            key,
            value: Box::new(value),
        });
    }
}

fn is_direct_value(expr: &Expr) -> bool {
    match expr {
        Expr::Fn(_) | Expr::Arrow(_) | Expr::Object(_) => true,
        Expr::Paren(paren) => is_direct_value(&paren.expr),
        _ => false,
    }
}

impl Visit for Lowerer<'_> {
    fn visit_fn_decl(&mut self, decl: &FnDecl) {
        let binding = self.identifier(decl.ident.sym.to_string(), decl.ident.span);
        self.lower_function(Some(binding), &decl.function);
    }

    fn visit_fn_expr(&mut self, expr: &FnExpr) {
        let binding = expr
            .ident
            .as_ref()
            .map(|ident| self.identifier(ident.sym.to_string(), ident.span));
        self.lower_function(binding, &expr.function);
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        let children = self.collect_children(arrow);
        let body_span = match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(body) => body.span,
            BlockStmtOrExpr::Expr(expr) => expr.span(),
        };
        self.emit(SyntaxNode::FunctionDefinition {
            binding: None,
            body: self.range(body_span),
            children,
        });
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        let name = self.identifier(decl.ident.sym.to_string(), decl.ident.span);
        self.lower_class(Some(name), &decl.class);
    }

    fn visit_class_expr(&mut self, expr: &ClassExpr) {
        let name = expr
            .ident
            .as_ref()
            .map(|ident| self.identifier(ident.sym.to_string(), ident.span));
        self.lower_class(name, &expr.class);
    }

    fn visit_class_method(&mut self, method: &ClassMethod) {
        let binding = self.prop_name(&method.key);
        self.lower_function(binding, &method.function);
    }

    fn visit_private_method(&mut self, method: &PrivateMethod) {
        let binding = self.identifier(format!("#{}", method.key.name), method.key.span);
        self.lower_function(Some(binding), &method.function);
    }

    /// Runtimes report constructors as `new ClassName`, so the class name wins over the key
    fn visit_constructor(&mut self, constructor: &Constructor) {
        let binding = self
            .class_names
            .last()
            .cloned()
            .flatten()
            .or_else(|| self.prop_name(&constructor.key));
        let children = self.collect_children(constructor);
        match &constructor.body {
            Some(body) => self.emit(SyntaxNode::FunctionDefinition {
                binding,
                body: self.range(body.span),
                children,
            }),
            None => self.emit(SyntaxNode::Other { children }),
        }
    }

    fn visit_getter_prop(&mut self, prop: &GetterProp) {
        self.lower_accessor(&prop.key, &prop.body, prop);
    }

    fn visit_setter_prop(&mut self, prop: &SetterProp) {
        self.lower_accessor(&prop.key, &prop.body, prop);
    }

    fn visit_method_prop(&mut self, method: &MethodProp) {
        let key = self.prop_name(&method.key);

        self.stack.push(Vec::new());
        self.lower_function(None, &method.function);
        let value = self
            .stack
            .pop()
            .and_then(|mut frame| frame.pop())
            .unwrap_or_else(SyntaxNode::empty);

        self.emit(SyntaxNode::ObjectLiteralProperty {
            key,
            value: Box::new(value),
        });
    }

    fn visit_key_value_prop(&mut self, prop: &KeyValueProp) {
        let key = self.prop_name(&prop.key);
        if let PropName::Computed(computed) = &prop.key {
            computed.visit_with(self);
        }
        let value = self.lower_value(&prop.value);
        self.emit(SyntaxNode::ObjectLiteralProperty {
            key,
            value: Box::new(value),
        });
    }

    fn visit_object_lit(&mut self, object: &ObjectLit) {
        let properties = self.collect_children(object);
        self.emit(SyntaxNode::ObjectLiteral { properties });
    }

    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        let binding = match &declarator.name {
            Pat::Ident(binding) => Some(self.identifier(binding.id.sym.to_string(), binding.id.span)),
            other => {
                // Default values inside destructuring patterns may hold functions
                other.visit_with(self);
                None
            }
        };
        let init = declarator
            .init
            .as_ref()
            .map(|init| Box::new(self.lower_value(init)));

        self.emit(SyntaxNode::VariableDeclaration { binding, init });
    }

    fn visit_assign_expr(&mut self, assign: &AssignExpr) {
        let target = match (&assign.op, &assign.left) {
            (AssignOp::Assign, AssignTarget::Simple(SimpleAssignTarget::Ident(binding))) => {
                Some(self.identifier(binding.id.sym.to_string(), binding.id.span))
            }
            (AssignOp::Assign, AssignTarget::Simple(SimpleAssignTarget::Member(member))) => self
                .source_map
                .span_to_snippet(member.span)
                .ok()
                .map(|text| self.identifier(text, member.span)),
            _ => None,
        };

        match target {
            Some(target) => {
                // Computed members may contain functions of their own
                assign.left.visit_with(self);
                let value = self.lower_value(&assign.right);
                self.emit(SyntaxNode::Assignment {
                    target,
                    value: Box::new(value),
                });
            }
            None => {
                let children = self.collect_children(assign);
                self.emit(SyntaxNode::Other { children });
            }
        }
    }
}
