//! Serialized tree codec
//!
//! Trees cross the process boundary as JSON. Node ids in the serialized form
//! are optional; decoding renumbers every node in preorder so the ids are
//! unique and stable for a given file.

use crate::ast::*;
use crate::error::{ParseError, Result};
use crate::span::{FileId, NodeId};
use std::rc::Rc;
use tracing::debug;

/// Decode a module tree and assign node ids for `file_id`
pub fn decode_module(text: &str, file_id: FileId) -> Result<Module> {
    let mut module: Module =
        serde_json::from_str(text).map_err(|e| ParseError::decode(file_id, e.to_string()))?;
    if module.name.trim().is_empty() {
        return Err(ParseError::malformed("module tree has no name"));
    }
    let count = assign_ids(&mut module, file_id);
    debug!(module = %module.name, nodes = count, "decoded module tree");
    Ok(module)
}

/// Encode a module tree as pretty-printed JSON
pub fn encode_module(module: &Module) -> Result<String> {
    serde_json::to_string_pretty(module).map_err(|e| ParseError::encode(e.to_string()))
}

/// Renumber every node of `module` in preorder, returning the node count
pub fn assign_ids(module: &mut Module, file_id: FileId) -> u32 {
    let mut assigner = IdAssigner { file_id, next: 0 };
    module.id = assigner.fresh();
    module.span.file_id = file_id;
    for stmt in &mut module.body {
        assigner.stmt(stmt);
    }
    assigner.next
}

struct IdAssigner {
    file_id: FileId,
    next: u32,
}

impl IdAssigner {
    fn fresh(&mut self) -> NodeId {
        let id = NodeId::new(self.file_id, self.next);
        self.next += 1;
        id
    }

    fn ident(&mut self, ident: &mut Identifier) {
        ident.id = self.fresh();
        ident.span.file_id = self.file_id;
    }

    fn block(&mut self, body: &mut [Stmt]) {
        for stmt in body {
            self.stmt(stmt);
        }
    }

    fn exprs(&mut self, exprs: &mut [Expr]) {
        for expr in exprs {
            self.expr(expr);
        }
    }

    fn params(&mut self, params: &mut Parameters) {
        for param in &mut params.args {
            self.ident(&mut param.name);
            if let Some(default) = &mut param.default {
                self.expr(default);
            }
        }
        if let Some(vararg) = &mut params.vararg {
            self.ident(vararg);
        }
        if let Some(kwarg) = &mut params.kwarg {
            self.ident(kwarg);
        }
    }

    fn alias(&mut self, alias: &mut Alias) {
        for part in &mut alias.name.parts {
            self.ident(part);
        }
        if let Some(asname) = &mut alias.asname {
            self.ident(asname);
        }
    }

    fn generators(&mut self, generators: &mut [Comprehension]) {
        for comp in generators {
            self.expr(&mut comp.iter);
            self.expr(&mut comp.target);
            self.exprs(&mut comp.ifs);
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        let file_id = self.file_id;
        match stmt {
            Stmt::FunctionDef(def) => {
                let def = Rc::make_mut(def);
                def.id = self.fresh();
                def.span.file_id = file_id;
                self.exprs(&mut def.decorators);
                self.ident(&mut def.name);
                self.params(&mut def.params);
                self.block(&mut def.body);
            }
            Stmt::ClassDef(def) => {
                let def = Rc::make_mut(def);
                def.id = self.fresh();
                def.span.file_id = file_id;
                self.exprs(&mut def.decorators);
                self.ident(&mut def.name);
                self.exprs(&mut def.bases);
                self.block(&mut def.body);
            }
            Stmt::Expr { id, value, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(value);
            }
            Stmt::Assign { id, targets, value, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.exprs(targets);
                self.expr(value);
            }
            Stmt::AugAssign { id, target, value, span, .. } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(target);
                self.expr(value);
            }
            Stmt::Return { id, value, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                if let Some(value) = value {
                    self.expr(value);
                }
            }
            Stmt::If { id, test, body, orelse, span } | Stmt::While { id, test, body, orelse, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(test);
                self.block(body);
                self.block(orelse);
            }
            Stmt::For { id, target, iter, body, orelse, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(target);
                self.expr(iter);
                self.block(body);
                self.block(orelse);
            }
            Stmt::Try { id, body, handlers, orelse, finalbody, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.block(body);
                for handler in handlers {
                    handler.id = self.fresh();
                    handler.span.file_id = file_id;
                    if let Some(exception) = &mut handler.exception {
                        self.expr(exception);
                    }
                    if let Some(name) = &mut handler.name {
                        self.expr(name);
                    }
                    self.block(&mut handler.body);
                }
                self.block(orelse);
                self.block(finalbody);
            }
            Stmt::With { id, items, body, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                for item in items {
                    self.expr(&mut item.context);
                    if let Some(target) = &mut item.target {
                        self.expr(target);
                    }
                }
                self.block(body);
            }
            Stmt::Raise { id, exc, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                if let Some(exc) = exc {
                    self.expr(exc);
                }
            }
            Stmt::Break { id, span } | Stmt::Continue { id, span } | Stmt::Pass { id, span } => {
                *id = self.fresh();
                span.file_id = file_id;
            }
            Stmt::Global { id, names, span } | Stmt::Nonlocal { id, names, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                for name in names {
                    self.ident(name);
                }
            }
            Stmt::Delete { id, targets, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.exprs(targets);
            }
            Stmt::Import { id, names, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                for alias in names {
                    self.alias(alias);
                }
            }
            Stmt::ImportFrom { id, module, names, span, .. } => {
                *id = self.fresh();
                span.file_id = file_id;
                for part in &mut module.parts {
                    self.ident(part);
                }
                for alias in names {
                    self.alias(alias);
                }
            }
            Stmt::Assert { id, test, msg, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(test);
                if let Some(msg) = msg {
                    self.expr(msg);
                }
            }
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        let file_id = self.file_id;
        match expr {
            Expr::Lambda(lambda) => {
                let lambda = Rc::make_mut(lambda);
                lambda.id = self.fresh();
                lambda.span.file_id = file_id;
                self.params(&mut lambda.params);
                self.expr(&mut lambda.body);
            }
            Expr::Name { id, span, .. } | Expr::Literal { id, span, .. } => {
                *id = self.fresh();
                span.file_id = file_id;
            }
            Expr::List { id, elts, span } | Expr::Tuple { id, elts, span } | Expr::Set { id, elts, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.exprs(elts);
            }
            Expr::Dict { id, keys, values, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.exprs(keys);
                self.exprs(values);
            }
            Expr::BinOp { id, left, right, span, .. } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(left);
                self.expr(right);
            }
            Expr::UnaryOp { id, operand, span, .. } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(operand);
            }
            Expr::Call { id, func, args, keywords, starargs, kwargs, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(func);
                self.exprs(args);
                for keyword in keywords {
                    self.ident(&mut keyword.name);
                    self.expr(&mut keyword.value);
                }
                if let Some(starargs) = starargs {
                    self.expr(starargs);
                }
                if let Some(kwargs) = kwargs {
                    self.expr(kwargs);
                }
            }
            Expr::Attribute { id, value, attr, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(value);
                self.ident(attr);
            }
            Expr::Subscript { id, value, slice, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(value);
                match slice.as_mut() {
                    Slice::Index { value } => self.expr(value),
                    Slice::Range { lower, upper, step } => {
                        for part in [lower, upper, step].into_iter().flatten() {
                            self.expr(part);
                        }
                    }
                }
            }
            Expr::IfExp { id, test, body, orelse, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.expr(test);
                self.expr(body);
                self.expr(orelse);
            }
            Expr::ListComp { id, elt, generators, span }
            | Expr::SetComp { id, elt, generators, span }
            | Expr::GeneratorExp { id, elt, generators, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.generators(generators);
                self.expr(elt);
            }
            Expr::DictComp { id, key, value, generators, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                self.generators(generators);
                self.expr(key);
                self.expr(value);
            }
            Expr::Yield { id, value, span } => {
                *id = self.fresh();
                span.file_id = file_id;
                if let Some(value) = value {
                    self.expr(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    const SAMPLE: &str = r#"{
        "name": "sample",
        "body": [
            {
                "kind": "Assign",
                "targets": [{ "kind": "Name", "name": "x" }],
                "value": { "kind": "Literal", "value": { "type": "Int", "value": 1 } }
            },
            {
                "kind": "FunctionDef",
                "name": { "name": "f" },
                "params": { "args": [{ "name": { "name": "a" } }] },
                "body": [
                    { "kind": "Return", "value": { "kind": "Name", "name": "a" } }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_decode_assigns_unique_ids() {
        let module = decode_module(SAMPLE, FileId::new(4)).unwrap();
        assert_eq!(module.name, "sample");
        assert_eq!(module.body.len(), 2);

        let mut seen = std::collections::HashSet::new();
        seen.insert(module.id);
        for stmt in &module.body {
            assert_eq!(stmt.id().file, FileId::new(4));
            assert!(seen.insert(stmt.id()), "duplicate id {}", stmt.id());
        }

        match &module.body[1] {
            Stmt::FunctionDef(def) => {
                assert_eq!(def.name.name, Symbol::intern("f"));
                assert_eq!(def.params.len(), 1);
                assert_ne!(def.name.id, def.id);
            }
            other => panic!("expected a function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_failure_is_parse_error() {
        let err = decode_module("{ \"name\": ", FileId::new(1)).unwrap_err();
        assert!(matches!(err, ParseError::Decode { .. }));
    }

    #[test]
    fn test_unnamed_module_is_malformed() {
        let err = decode_module("{ \"name\": \"\", \"body\": [] }", FileId::new(1)).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
        assert_eq!(err.to_string(), "Malformed tree: module tree has no name");
    }

    #[test]
    fn test_encode_then_decode_keeps_shape() {
        let module = decode_module(SAMPLE, FileId::new(0)).unwrap();
        let text = encode_module(&module).unwrap();
        let again = decode_module(&text, FileId::new(0)).unwrap();
        assert_eq!(module, again);
    }
}
