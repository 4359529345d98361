//! Statement construction helpers

use super::AstBuilder;
use pyflow_ast::ast::*;
use std::rc::Rc;

impl AstBuilder {
    pub fn expr_stmt(&self, value: Expr) -> Stmt {
        Stmt::Expr {
            id: self.id(),
            value,
            span: self.span(),
        }
    }

    /// `target = value`
    pub fn assign(&self, target: Expr, value: Expr) -> Stmt {
        self.assign_many(vec![target], value)
    }

    /// `t1 = t2 = value`
    pub fn assign_many(&self, targets: Vec<Expr>, value: Expr) -> Stmt {
        Stmt::Assign {
            id: self.id(),
            targets,
            value,
            span: self.span(),
        }
    }

    pub fn aug_assign(&self, target: Expr, op: Operator, value: Expr) -> Stmt {
        Stmt::AugAssign {
            id: self.id(),
            target,
            op,
            value,
            span: self.span(),
        }
    }

    /// `def name(params): body`
    pub fn def(&self, name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
        let params = self.params(params);
        self.def_with(name, params, body)
    }

    /// Function definition with an explicit parameter list
    pub fn def_with(&self, name: &str, params: Parameters, body: Vec<Stmt>) -> Stmt {
        Stmt::FunctionDef(Rc::new(FunctionDef {
            id: self.id(),
            name: self.ident(name),
            params,
            body,
            decorators: Vec::new(),
            span: self.span(),
        }))
    }

    /// `class name(bases): body`
    pub fn class(&self, name: &str, bases: Vec<Expr>, body: Vec<Stmt>) -> Stmt {
        Stmt::ClassDef(Rc::new(ClassDef {
            id: self.id(),
            name: self.ident(name),
            bases,
            body,
            decorators: Vec::new(),
            span: self.span(),
        }))
    }

    pub fn ret(&self, value: Expr) -> Stmt {
        Stmt::Return {
            id: self.id(),
            value: Some(value),
            span: self.span(),
        }
    }

    /// Bare `return`
    pub fn ret_none(&self) -> Stmt {
        Stmt::Return {
            id: self.id(),
            value: None,
            span: self.span(),
        }
    }

    pub fn if_(&self, test: Expr, body: Vec<Stmt>) -> Stmt {
        self.if_else(test, body, Vec::new())
    }

    pub fn if_else(&self, test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Stmt {
        Stmt::If {
            id: self.id(),
            test,
            body,
            orelse,
            span: self.span(),
        }
    }

    pub fn while_loop(&self, test: Expr, body: Vec<Stmt>) -> Stmt {
        Stmt::While {
            id: self.id(),
            test,
            body,
            orelse: Vec::new(),
            span: self.span(),
        }
    }

    pub fn for_loop(&self, target: Expr, iter: Expr, body: Vec<Stmt>) -> Stmt {
        Stmt::For {
            id: self.id(),
            target,
            iter,
            body,
            orelse: Vec::new(),
            span: self.span(),
        }
    }

    /// `try: body except exception as name: handler_body`
    pub fn try_except(
        &self,
        body: Vec<Stmt>,
        exception: Option<Expr>,
        name: Option<&str>,
        handler_body: Vec<Stmt>,
    ) -> Stmt {
        let handler = ExceptHandler {
            id: self.id(),
            exception,
            name: name.map(|n| self.name(n)),
            body: handler_body,
            span: self.span(),
        };
        self.try_full(body, vec![handler], Vec::new(), Vec::new())
    }

    pub fn try_full(
        &self,
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    ) -> Stmt {
        Stmt::Try {
            id: self.id(),
            body,
            handlers,
            orelse,
            finalbody,
            span: self.span(),
        }
    }

    /// `with context as target: body`
    pub fn with(&self, context: Expr, target: Option<Expr>, body: Vec<Stmt>) -> Stmt {
        Stmt::With {
            id: self.id(),
            items: vec![WithItem { context, target }],
            body,
            span: self.span(),
        }
    }

    pub fn raise(&self, exc: Option<Expr>) -> Stmt {
        Stmt::Raise {
            id: self.id(),
            exc,
            span: self.span(),
        }
    }

    pub fn break_(&self) -> Stmt {
        Stmt::Break {
            id: self.id(),
            span: self.span(),
        }
    }

    pub fn continue_(&self) -> Stmt {
        Stmt::Continue {
            id: self.id(),
            span: self.span(),
        }
    }

    pub fn pass(&self) -> Stmt {
        Stmt::Pass {
            id: self.id(),
            span: self.span(),
        }
    }

    pub fn global(&self, names: &[&str]) -> Stmt {
        Stmt::Global {
            id: self.id(),
            names: names.iter().map(|n| self.ident(n)).collect(),
            span: self.span(),
        }
    }

    pub fn nonlocal(&self, names: &[&str]) -> Stmt {
        Stmt::Nonlocal {
            id: self.id(),
            names: names.iter().map(|n| self.ident(n)).collect(),
            span: self.span(),
        }
    }

    pub fn delete(&self, targets: Vec<Expr>) -> Stmt {
        Stmt::Delete {
            id: self.id(),
            targets,
            span: self.span(),
        }
    }

    pub fn dotted(&self, dotted: &str) -> DottedName {
        DottedName {
            parts: dotted.split('.').map(|part| self.ident(part)).collect(),
        }
    }

    /// `import a.b [as alias]`
    pub fn import(&self, module: &str, asname: Option<&str>) -> Stmt {
        Stmt::Import {
            id: self.id(),
            names: vec![Alias {
                name: self.dotted(module),
                asname: asname.map(|a| self.ident(a)),
            }],
            span: self.span(),
        }
    }

    /// `from module import n1, n2`
    pub fn from_import(&self, module: &str, names: &[&str]) -> Stmt {
        Stmt::ImportFrom {
            id: self.id(),
            module: self.dotted(module),
            names: names
                .iter()
                .map(|n| Alias {
                    name: self.dotted(n),
                    asname: None,
                })
                .collect(),
            wildcard: false,
            span: self.span(),
        }
    }

    /// `from module import *`
    pub fn from_import_all(&self, module: &str) -> Stmt {
        Stmt::ImportFrom {
            id: self.id(),
            module: self.dotted(module),
            names: Vec::new(),
            wildcard: true,
            span: self.span(),
        }
    }

    pub fn assert(&self, test: Expr) -> Stmt {
        Stmt::Assert {
            id: self.id(),
            test,
            msg: None,
            span: self.span(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyflow_ast::FileId;

    #[test]
    fn test_class_with_method() {
        let b = AstBuilder::new(FileId::new(0));
        let class = b.class(
            "Point",
            vec![],
            vec![b.def(
                "__init__",
                &["self", "x"],
                vec![b.assign(b.attr(b.name("self"), "x"), b.name("x"))],
            )],
        );
        match class {
            Stmt::ClassDef(def) => {
                assert_eq!(def.name.name.as_str(), "Point");
                assert!(matches!(def.body[0], Stmt::FunctionDef(_)));
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_dotted_import() {
        let b = AstBuilder::new(FileId::new(0));
        match b.import("os.path", None) {
            Stmt::Import { names, .. } => {
                assert_eq!(names[0].name.to_dotted(), "os.path");
                assert_eq!(names[0].name.parts.len(), 2);
            }
            other => panic!("expected import, got {:?}", other),
        }
    }
}
