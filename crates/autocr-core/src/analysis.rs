//! One-pass syntax-tree analysis shared by all rules for a file.
//!
//! A single traversal materialises the indices every rule needs: import
//! references, loops, try statements, and the nodes sitting on syntactic
//! hot paths. Hot means: loop tests/updates/bodies, for-in/for-of bodies,
//! and the first-argument callback bodies of the recognised array methods.
//! Entering any other function clears the flag.

use swc_common::Span;
use swc_ecma_ast::{
    ArrowExpr, CallExpr, Callee, Constructor, DoWhileStmt, Expr, ForInStmt, ForOfStmt, ForStmt,
    Function, ImportDecl, Lit, MemberProp, Module, NewExpr, Regex, TryStmt, WhileStmt,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Array methods whose first-argument callback executes per element.
pub const HOT_CALLBACK_METHODS: &[&str] = &[
    "map",
    "forEach",
    "reduce",
    "reduceRight",
    "filter",
    "some",
    "every",
    "find",
    "findIndex",
    "flatMap",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Static,
    Dynamic,
    Require,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReference {
    pub kind: ImportKind,
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    For,
    While,
    DoWhile,
    ForIn,
    ForOf,
}

#[derive(Debug, Clone, Copy)]
pub struct Loop {
    pub kind: LoopKind,
    pub span: Span,
}

/// Nodes observed while the hot flag was set, in source order.
#[derive(Debug, Default)]
pub struct HotPath {
    pub call_expressions: Vec<CallExpr>,
    pub new_expressions: Vec<NewExpr>,
    pub regexp_literals: Vec<Regex>,
}

/// Immutable per-file indices produced by [`analyze`].
#[derive(Debug, Default)]
pub struct Analysis {
    pub imports: Vec<ImportReference>,
    pub loops: Vec<Loop>,
    pub try_statements: Vec<TryStmt>,
    pub hot_path: HotPath,
}

pub fn analyze(module: &Module) -> Analysis {
    let mut collector = Collector {
        analysis: Analysis::default(),
        in_hot: false,
    };
    module.visit_with(&mut collector);
    collector.analysis
}

/// Property name of a member expression, when it is a plain identifier.
pub fn member_prop_name(prop: &MemberProp) -> Option<&str> {
    match prop {
        MemberProp::Ident(ident) => Some(ident.sym.as_ref()),
        _ => None,
    }
}

fn first_string_arg(args: &[swc_ecma_ast::ExprOrSpread]) -> Option<(String, Span)> {
    let first = args.first()?;
    if first.spread.is_some() {
        return None;
    }
    match first.expr.as_ref() {
        Expr::Lit(Lit::Str(s)) => Some((s.value.to_string(), s.span)),
        _ => None,
    }
}

fn hot_callback_method(call: &CallExpr) -> Option<&str> {
    let Callee::Expr(expr) = &call.callee else {
        return None;
    };
    let Expr::Member(member) = expr.as_ref() else {
        return None;
    };
    let name = member_prop_name(&member.prop)?;
    HOT_CALLBACK_METHODS.contains(&name).then_some(name)
}

struct Collector {
    analysis: Analysis,
    in_hot: bool,
}

impl Collector {
    fn record_import_call(&mut self, call: &CallExpr) {
        match &call.callee {
            Callee::Import(_) => {
                if let Some((value, span)) = first_string_arg(&call.args) {
                    self.analysis.imports.push(ImportReference {
                        kind: ImportKind::Dynamic,
                        value,
                        span,
                    });
                }
            }
            Callee::Expr(expr) => {
                let is_require = match expr.as_ref() {
                    Expr::Ident(ident) => ident.sym.as_ref() == "require",
                    Expr::Member(member) => {
                        matches!(member.obj.as_ref(), Expr::Ident(obj) if obj.sym.as_ref() == "require")
                    }
                    _ => false,
                };
                if is_require {
                    if let Some((value, span)) = first_string_arg(&call.args) {
                        self.analysis.imports.push(ImportReference {
                            kind: ImportKind::Require,
                            value,
                            span,
                        });
                    }
                }
            }
            Callee::Super(_) => {}
        }
    }

    /// Walk a hot-method first argument: the callback body inherits the hot
    /// flag, its parameter list does not introduce one.
    fn visit_hot_callback(&mut self, expr: &Expr) {
        match expr {
            Expr::Arrow(arrow) => {
                arrow.params.visit_with(self);
                let prev = std::mem::replace(&mut self.in_hot, true);
                arrow.body.visit_with(self);
                self.in_hot = prev;
            }
            Expr::Fn(fn_expr) => {
                fn_expr.function.params.visit_with(self);
                let prev = std::mem::replace(&mut self.in_hot, true);
                if let Some(body) = &fn_expr.function.body {
                    body.visit_with(self);
                }
                self.in_hot = prev;
            }
            other => other.visit_with(self),
        }
    }
}

impl Visit for Collector {
    fn visit_import_decl(&mut self, n: &ImportDecl) {
        self.analysis.imports.push(ImportReference {
            kind: ImportKind::Static,
            value: n.src.value.to_string(),
            span: n.src.span,
        });
        // nothing below an import declaration concerns the analysis
    }

    fn visit_try_stmt(&mut self, n: &TryStmt) {
        self.analysis.try_statements.push(n.clone());
        n.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, n: &CallExpr) {
        self.record_import_call(n);
        if self.in_hot {
            self.analysis.hot_path.call_expressions.push(n.clone());
        }
        if hot_callback_method(n).is_some() {
            n.callee.visit_with(self);
            let mut args = n.args.iter();
            if let Some(first) = args.next() {
                if first.spread.is_none() {
                    self.visit_hot_callback(&first.expr);
                } else {
                    first.visit_with(self);
                }
            }
            for arg in args {
                arg.visit_with(self);
            }
        } else {
            n.visit_children_with(self);
        }
    }

    fn visit_new_expr(&mut self, n: &NewExpr) {
        if self.in_hot {
            self.analysis.hot_path.new_expressions.push(n.clone());
        }
        n.visit_children_with(self);
    }

    fn visit_regex(&mut self, n: &Regex) {
        if self.in_hot {
            self.analysis.hot_path.regexp_literals.push(n.clone());
        }
    }

    fn visit_for_stmt(&mut self, n: &ForStmt) {
        self.analysis.loops.push(Loop {
            kind: LoopKind::For,
            span: n.span,
        });
        if let Some(init) = &n.init {
            init.visit_with(self);
        }
        let prev = std::mem::replace(&mut self.in_hot, true);
        if let Some(test) = &n.test {
            test.visit_with(self);
        }
        if let Some(update) = &n.update {
            update.visit_with(self);
        }
        n.body.visit_with(self);
        self.in_hot = prev;
    }

    fn visit_while_stmt(&mut self, n: &WhileStmt) {
        self.analysis.loops.push(Loop {
            kind: LoopKind::While,
            span: n.span,
        });
        let prev = std::mem::replace(&mut self.in_hot, true);
        n.test.visit_with(self);
        n.body.visit_with(self);
        self.in_hot = prev;
    }

    fn visit_do_while_stmt(&mut self, n: &DoWhileStmt) {
        self.analysis.loops.push(Loop {
            kind: LoopKind::DoWhile,
            span: n.span,
        });
        let prev = std::mem::replace(&mut self.in_hot, true);
        n.body.visit_with(self);
        n.test.visit_with(self);
        self.in_hot = prev;
    }

    fn visit_for_in_stmt(&mut self, n: &ForInStmt) {
        self.analysis.loops.push(Loop {
            kind: LoopKind::ForIn,
            span: n.span,
        });
        n.left.visit_with(self);
        n.right.visit_with(self);
        let prev = std::mem::replace(&mut self.in_hot, true);
        n.body.visit_with(self);
        self.in_hot = prev;
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        self.analysis.loops.push(Loop {
            kind: LoopKind::ForOf,
            span: n.span,
        });
        n.left.visit_with(self);
        n.right.visit_with(self);
        let prev = std::mem::replace(&mut self.in_hot, true);
        n.body.visit_with(self);
        self.in_hot = prev;
    }

    // Function boundaries clear the hot flag; hot callbacks bypass these by
    // walking the callback body directly.
    fn visit_function(&mut self, n: &Function) {
        let prev = std::mem::replace(&mut self.in_hot, false);
        n.visit_children_with(self);
        self.in_hot = prev;
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        let prev = std::mem::replace(&mut self.in_hot, false);
        n.visit_children_with(self);
        self.in_hot = prev;
    }

    fn visit_constructor(&mut self, n: &Constructor) {
        let prev = std::mem::replace(&mut self.in_hot, false);
        n.visit_children_with(self);
        self.in_hot = prev;
    }
}
