//! Expression construction helpers

use super::AstBuilder;
use pyflow_ast::ast::*;
use pyflow_ast::Symbol;
use std::rc::Rc;

impl AstBuilder {
    pub fn ident(&self, name: &str) -> Identifier {
        Identifier {
            id: self.id(),
            name: Symbol::intern(name),
            span: self.span_with_len(name.len().max(1) as u32),
        }
    }

    pub fn name(&self, name: &str) -> Expr {
        Expr::Name {
            id: self.id(),
            name: Symbol::intern(name),
            span: self.span_with_len(name.len().max(1) as u32),
        }
    }

    pub fn literal(&self, value: Literal) -> Expr {
        Expr::Literal {
            id: self.id(),
            value,
            span: self.span(),
        }
    }

    pub fn none(&self) -> Expr {
        self.literal(Literal::None)
    }

    pub fn bool(&self, value: bool) -> Expr {
        self.literal(Literal::Bool(value))
    }

    pub fn int(&self, value: i64) -> Expr {
        self.literal(Literal::Int(value))
    }

    pub fn float(&self, value: f64) -> Expr {
        self.literal(Literal::Float(value))
    }

    pub fn complex(&self, imag: f64) -> Expr {
        self.literal(Literal::Complex(imag))
    }

    pub fn str(&self, value: &str) -> Expr {
        self.literal(Literal::Str(value.to_string()))
    }

    pub fn list(&self, elts: Vec<Expr>) -> Expr {
        Expr::List {
            id: self.id(),
            elts,
            span: self.span(),
        }
    }

    pub fn tuple(&self, elts: Vec<Expr>) -> Expr {
        Expr::Tuple {
            id: self.id(),
            elts,
            span: self.span(),
        }
    }

    pub fn set(&self, elts: Vec<Expr>) -> Expr {
        Expr::Set {
            id: self.id(),
            elts,
            span: self.span(),
        }
    }

    pub fn dict(&self, entries: Vec<(Expr, Expr)>) -> Expr {
        let (keys, values) = entries.into_iter().unzip();
        Expr::Dict {
            id: self.id(),
            keys,
            values,
            span: self.span(),
        }
    }

    pub fn binop(&self, left: Expr, op: Operator, right: Expr) -> Expr {
        Expr::BinOp {
            id: self.id(),
            left: Box::new(left),
            op,
            right: Box::new(right),
            span: self.span(),
        }
    }

    pub fn unary(&self, op: UnaryOperator, operand: Expr) -> Expr {
        Expr::UnaryOp {
            id: self.id(),
            op,
            operand: Box::new(operand),
            span: self.span(),
        }
    }

    /// Positional call: `func(args...)`
    pub fn call(&self, func: Expr, args: Vec<Expr>) -> Expr {
        self.call_full(func, args, Vec::new(), None, None)
    }

    /// Call with keyword arguments: `func(args..., k=v...)`
    pub fn call_kw(&self, func: Expr, args: Vec<Expr>, keywords: Vec<(&str, Expr)>) -> Expr {
        let keywords = keywords
            .into_iter()
            .map(|(name, value)| Keyword {
                name: self.ident(name),
                value,
            })
            .collect();
        self.call_full(func, args, keywords, None, None)
    }

    pub fn call_full(
        &self,
        func: Expr,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
        starargs: Option<Expr>,
        kwargs: Option<Expr>,
    ) -> Expr {
        Expr::Call {
            id: self.id(),
            func: Box::new(func),
            args,
            keywords,
            starargs: starargs.map(Box::new),
            kwargs: kwargs.map(Box::new),
            span: self.span(),
        }
    }

    /// `value.attr`
    pub fn attr(&self, value: Expr, attr: &str) -> Expr {
        Expr::Attribute {
            id: self.id(),
            value: Box::new(value),
            attr: self.ident(attr),
            span: self.span(),
        }
    }

    /// `value.method(args...)`
    pub fn method_call(&self, value: Expr, method: &str, args: Vec<Expr>) -> Expr {
        let func = self.attr(value, method);
        self.call(func, args)
    }

    /// `value[index]`
    pub fn index(&self, value: Expr, index: Expr) -> Expr {
        Expr::Subscript {
            id: self.id(),
            value: Box::new(value),
            slice: Box::new(Slice::Index { value: index }),
            span: self.span(),
        }
    }

    /// `value[lower:upper]`
    pub fn slice(&self, value: Expr, lower: Option<Expr>, upper: Option<Expr>) -> Expr {
        Expr::Subscript {
            id: self.id(),
            value: Box::new(value),
            slice: Box::new(Slice::Range {
                lower,
                upper,
                step: None,
            }),
            span: self.span(),
        }
    }

    pub fn lambda(&self, params: &[&str], body: Expr) -> Expr {
        Expr::Lambda(Rc::new(Lambda {
            id: self.id(),
            params: self.params(params),
            body,
            span: self.span(),
        }))
    }

    pub fn if_exp(&self, test: Expr, body: Expr, orelse: Expr) -> Expr {
        Expr::IfExp {
            id: self.id(),
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
            span: self.span(),
        }
    }

    /// One `for target in iter` clause
    pub fn comp_for(&self, target: Expr, iter: Expr) -> Comprehension {
        Comprehension {
            target,
            iter,
            ifs: Vec::new(),
        }
    }

    pub fn list_comp(&self, elt: Expr, generators: Vec<Comprehension>) -> Expr {
        Expr::ListComp {
            id: self.id(),
            elt: Box::new(elt),
            generators,
            span: self.span(),
        }
    }

    pub fn set_comp(&self, elt: Expr, generators: Vec<Comprehension>) -> Expr {
        Expr::SetComp {
            id: self.id(),
            elt: Box::new(elt),
            generators,
            span: self.span(),
        }
    }

    pub fn dict_comp(&self, key: Expr, value: Expr, generators: Vec<Comprehension>) -> Expr {
        Expr::DictComp {
            id: self.id(),
            key: Box::new(key),
            value: Box::new(value),
            generators,
            span: self.span(),
        }
    }

    pub fn generator(&self, elt: Expr, generators: Vec<Comprehension>) -> Expr {
        Expr::GeneratorExp {
            id: self.id(),
            elt: Box::new(elt),
            generators,
            span: self.span(),
        }
    }

    pub fn yield_(&self, value: Option<Expr>) -> Expr {
        Expr::Yield {
            id: self.id(),
            value: value.map(Box::new),
            span: self.span(),
        }
    }

    /// Plain positional parameter list
    pub fn params(&self, names: &[&str]) -> Parameters {
        Parameters {
            args: names
                .iter()
                .map(|name| Param {
                    name: self.ident(name),
                    default: None,
                })
                .collect(),
            vararg: None,
            kwarg: None,
        }
    }

    pub fn param(&self, name: &str) -> Param {
        Param {
            name: self.ident(name),
            default: None,
        }
    }

    pub fn param_default(&self, name: &str, default: Expr) -> Param {
        Param {
            name: self.ident(name),
            default: Some(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyflow_ast::FileId;

    #[test]
    fn test_nested_expressions() {
        let b = AstBuilder::new(FileId::new(0));

        // [x * 2 for x in xs]
        let comp = b.list_comp(
            b.binop(b.name("x"), Operator::Mul, b.int(2)),
            vec![b.comp_for(b.name("x"), b.name("xs"))],
        );

        match comp {
            Expr::ListComp { generators, .. } => {
                assert_eq!(generators.len(), 1);
                assert_eq!(generators[0].target.as_name(), Some(Symbol::intern("x")));
            }
            other => panic!("expected list comprehension, got {:?}", other),
        }
    }

    #[test]
    fn test_dict_literal_keeps_pairs_aligned() {
        let b = AstBuilder::new(FileId::new(0));
        let dict = b.dict(vec![(b.str("a"), b.int(1)), (b.str("b"), b.int(2))]);
        match dict {
            Expr::Dict { keys, values, .. } => {
                assert_eq!(keys.len(), 2);
                assert_eq!(values.len(), 2);
                assert_eq!(keys[1].as_str_literal(), Some("b"));
            }
            other => panic!("expected dict, got {:?}", other),
        }
    }

    #[test]
    fn test_keyword_call() {
        let b = AstBuilder::new(FileId::new(0));
        let call = b.call_kw(b.name("f"), vec![b.int(1)], vec![("y", b.str("s"))]);
        match call {
            Expr::Call { args, keywords, .. } => {
                assert_eq!(args.len(), 1);
                assert_eq!(keywords[0].name.name.as_str(), "y");
            }
            other => panic!("expected call, got {:?}", other),
        }
    }
}
