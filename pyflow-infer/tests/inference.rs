//! End-to-end inference tests over programmatically built modules

use pyflow_ast::{FileId, Module, NodeId, Operator, UnaryOperator};
use pyflow_builder::AstBuilder;
use pyflow_infer::{
    AnalysisResults, AnalyzerOptions, BindingKind, Engine, MemoryLoader, Severity, Statistics, Type,
};

fn analyze_with(module: Module, options: AnalyzerOptions) -> AnalysisResults {
    let mut engine = Engine::with_loader(options, Box::new(MemoryLoader::new()));
    engine.analyze_module(module).expect("module should be analyzed");
    engine.finish().expect("analysis should finish")
}

fn analyze(module: Module) -> AnalysisResults {
    analyze_with(module, AnalyzerOptions::default())
}

fn top_level(results: &AnalysisResults, name: &str) -> Type {
    let module = results.module_named("m").expect("module m");
    results.module_type(module, name).unwrap_or(Type::Unknown)
}

fn messages(results: &AnalysisResults) -> Vec<String> {
    results
        .all_diagnostics()
        .iter()
        .map(|(_, d)| d.message())
        .collect()
}

fn type_at(results: &AnalysisResults, node: NodeId) -> Type {
    results.type_of(node).cloned().unwrap_or(Type::Unknown)
}

#[test]
fn test_literal_assignments() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(b.name("i"), b.int(1)))
        .stmt(b.assign(b.name("s"), b.str("x")))
        .stmt(b.assign(b.name("xs"), b.list(vec![b.int(1), b.float(2.0)])))
        .stmt(b.assign(b.name("d"), b.dict(vec![(b.str("k"), b.int(1))])))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "i"), Type::Int);
    assert_eq!(top_level(&results, "s"), Type::Str);
    assert_eq!(top_level(&results, "xs"), Type::list(Type::Float));
    assert_eq!(top_level(&results, "d"), Type::dict(Type::Str, Type::Int));
    assert!(results.all_diagnostics().is_empty());
}

#[test]
fn test_call_sites_keep_their_own_types() {
    let b = AstBuilder::new(FileId::new(0));
    let int_call = b.call(b.name("f"), vec![b.int(1)]);
    let str_call = b.call(b.name("f"), vec![b.str("s")]);
    let (int_id, str_id) = (int_call.id(), str_call.id());
    let module = b
        .module("m")
        .stmt(b.def("f", &["x"], vec![b.ret(b.name("x"))]))
        .stmt(b.assign(b.name("a"), int_call))
        .stmt(b.assign(b.name("b"), str_call))
        .build();
    let results = analyze(module);

    assert_eq!(type_at(&results, int_id), Type::Int);
    assert_eq!(type_at(&results, str_id), Type::Str);

    let f = results.function_named("m.f").expect("function f");
    let arrows = results.function_arrows(f);
    assert_eq!(arrows.len(), 2);
    assert_eq!(arrows.get(&Type::tuple(vec![Type::Int])), Some(&Type::Int));
    assert_eq!(arrows.get(&Type::tuple(vec![Type::Str])), Some(&Type::Str));
    assert_eq!(results.display_type(&Type::Function(f)), "(int) -> int | (str) -> str");
}

#[test]
fn test_identical_calls_reuse_memo() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.def("f", &["x"], vec![b.ret(b.binop(b.name("x"), Operator::Add, b.name("missing")))]))
        .stmt(b.expr_stmt(b.call(b.name("f"), vec![b.int(1)])))
        .stmt(b.expr_stmt(b.call(b.name("f"), vec![b.int(2)])))
        .build();
    let results = analyze(module);

    assert_eq!(results.stats().get(Statistics::BODY_WALKS), 1);
    assert_eq!(results.stats().get(Statistics::MEMO_HITS), 1);
    let unbound: Vec<_> = messages(&results)
        .into_iter()
        .filter(|m| m == "unbound variable missing")
        .collect();
    assert_eq!(unbound.len(), 1);
}

#[test]
fn test_recursive_function_terminates() {
    let b = AstBuilder::new(FileId::new(0));
    // def fact(n):
    //     if n: return n * fact(n - 1)
    //     return 1
    let recursive = b.call(b.name("fact"), vec![b.binop(b.name("n"), Operator::Sub, b.int(1))]);
    let body = vec![
        b.if_(b.name("n"), vec![b.ret(b.binop(b.name("n"), Operator::Mul, recursive))]),
        b.ret(b.int(1)),
    ];
    let module = b
        .module("m")
        .stmt(b.def("fact", &["n"], body))
        .stmt(b.assign(b.name("r"), b.call(b.name("fact"), vec![b.int(5)])))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "r"), Type::Int);
}

#[test]
fn test_global_declaration_mutates_module_binding() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(b.name("x"), b.int(1)))
        .stmt(b.def("set_x", &[], vec![b.global(&["x"]), b.assign(b.name("x"), b.str("s"))]))
        .stmt(b.expr_stmt(b.call(b.name("set_x"), vec![])))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "x"), Type::Int.join(&Type::Str));
    let locals = results
        .bindings_named("x")
        .filter(|binding| binding.kind == BindingKind::Variable)
        .count();
    assert_eq!(locals, 0);
}

#[test]
fn test_tuple_unpacking() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(
            b.tuple(vec![b.name("a"), b.name("b")]),
            b.tuple(vec![b.int(1), b.str("x")]),
        ))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "a"), Type::Int);
    assert_eq!(top_level(&results, "b"), Type::Str);
    assert!(results.all_diagnostics().is_empty());
}

#[test]
fn test_unpacking_arity_mismatch() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(
            b.tuple(vec![b.name("a"), b.name("b")]),
            b.tuple(vec![b.int(1), b.int(2), b.int(3)]),
        ))
        .stmt(b.assign(
            b.tuple(vec![b.name("c"), b.name("d"), b.name("e")]),
            b.tuple(vec![b.int(1), b.int(2)]),
        ))
        .stmt(b.assign(b.tuple(vec![b.name("f"), b.name("g")]), b.int(3)))
        .build();
    let results = analyze(module);

    let messages = messages(&results);
    assert!(messages.contains(&"ValueError: too many values to unpack".to_string()));
    assert!(messages.contains(&"ValueError: need more than 2 values to unpack".to_string()));
    assert!(messages.contains(&"unpacking non-iterable: int".to_string()));
    assert_eq!(top_level(&results, "a"), Type::Unknown);
}

#[test]
fn test_for_loop_binds_element_type() {
    let b = AstBuilder::new(FileId::new(0));
    let target = b.name("x");
    let target_id = target.id();
    let module = b
        .module("m")
        .stmt(b.for_loop(
            target,
            b.list(vec![b.int(1), b.int(2), b.int(3)]),
            vec![b.assign(b.name("y"), b.name("x"))],
        ))
        .build();
    let results = analyze(module);

    assert_eq!(type_at(&results, target_id), Type::Int);
    assert_eq!(top_level(&results, "x"), Type::Int);
    assert_eq!(top_level(&results, "y"), Type::Int);
}

#[test]
fn test_iteration_through_catalog() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(b.name("d"), b.dict(vec![(b.str("a"), b.int(1))])))
        .stmt(b.for_loop(b.name("k"), b.name("d"), vec![b.pass()]))
        .stmt(b.for_loop(b.name("c"), b.str("abc"), vec![b.pass()]))
        .stmt(b.for_loop(b.name("i"), b.int(5), vec![b.pass()]))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "k"), Type::Str);
    assert_eq!(top_level(&results, "c"), Type::Str);
    assert_eq!(top_level(&results, "i"), Type::Unknown);
    assert!(messages(&results).contains(&"not an iterable type: int".to_string()));
}

#[test]
fn test_branches_merge_bindings() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(b.name("c"), b.bool(true)))
        .stmt(b.if_else(
            b.name("c"),
            vec![b.assign(b.name("x"), b.int(1))],
            vec![b.assign(b.name("x"), b.str("s"))],
        ))
        .stmt(b.assign(b.name("y"), b.name("x")))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "y"), Type::Int.join(&Type::Str));
}

#[test]
fn test_function_defined_in_if_sees_branch_bindings() {
    let b = AstBuilder::new(FileId::new(0));
    // if __name__:
    //     y = 1
    //     def f(): return y
    //     r = f()
    let call = b.call(b.name("f"), vec![]);
    let call_id = call.id();
    let module = b
        .module("m")
        .stmt(b.if_(
            b.name("__name__"),
            vec![
                b.assign(b.name("y"), b.int(1)),
                b.def("f", &[], vec![b.ret(b.name("y"))]),
                b.assign(b.name("r"), call),
            ],
        ))
        .build();
    let results = analyze(module);

    assert_eq!(type_at(&results, call_id), Type::Int);
    assert_eq!(top_level(&results, "r"), Type::Int);
    assert!(messages(&results).is_empty());
}

#[test]
fn test_function_defined_in_loop_sees_loop_bindings() {
    let b = AstBuilder::new(FileId::new(0));
    // for i in [1, 2]:
    //     y = i
    //     def g(): return y
    //     r = g()
    let module = b
        .module("m")
        .stmt(b.for_loop(
            b.name("i"),
            b.list(vec![b.int(1), b.int(2)]),
            vec![
                b.assign(b.name("y"), b.name("i")),
                b.def("g", &[], vec![b.ret(b.name("y"))]),
                b.assign(b.name("r"), b.call(b.name("g"), vec![])),
            ],
        ))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "r"), Type::Int);
    assert!(messages(&results).is_empty());
}

#[test]
fn test_function_defined_in_try_sees_clause_bindings() {
    let b = AstBuilder::new(FileId::new(0));
    // try:
    //     s = "a"
    //     def h(): return s
    //     t = h()
    // except ValueError:
    //     n = 1.5
    //     def k(): return n
    //     u = k()
    let module = b
        .module("m")
        .stmt(b.try_except(
            vec![
                b.assign(b.name("s"), b.str("a")),
                b.def("h", &[], vec![b.ret(b.name("s"))]),
                b.assign(b.name("t"), b.call(b.name("h"), vec![])),
            ],
            Some(b.name("ValueError")),
            None,
            vec![
                b.assign(b.name("n"), b.float(1.5)),
                b.def("k", &[], vec![b.ret(b.name("n"))]),
                b.assign(b.name("u"), b.call(b.name("k"), vec![])),
            ],
        ))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "t"), Type::Str);
    assert_eq!(top_level(&results, "u"), Type::Float);
    assert!(messages(&results).is_empty());
}

#[test]
fn test_nested_function_in_branch_of_function_body() {
    let b = AstBuilder::new(FileId::new(0));
    // def outer(c):
    //     if c:
    //         z = 1.5
    //         def inner(): return z
    //         return inner()
    //     return "none"
    // w = outer(True)
    let body = vec![
        b.if_(
            b.name("c"),
            vec![
                b.assign(b.name("z"), b.float(1.5)),
                b.def("inner", &[], vec![b.ret(b.name("z"))]),
                b.ret(b.call(b.name("inner"), vec![])),
            ],
        ),
        b.ret(b.str("none")),
    ];
    let module = b
        .module("m")
        .stmt(b.def("outer", &["c"], body))
        .stmt(b.assign(b.name("w"), b.call(b.name("outer"), vec![b.bool(true)])))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "w"), Type::Float.join(&Type::Str));
    assert!(!messages(&results).iter().any(|m| m.starts_with("unbound variable")));
}

#[test]
fn test_returning_branch_is_dropped() {
    let b = AstBuilder::new(FileId::new(0));
    // def f(c):
    //     x = 1
    //     if c:
    //         x = "s"
    //         return x
    //     return x
    let body = vec![
        b.assign(b.name("x"), b.int(1)),
        b.if_(b.name("c"), vec![b.assign(b.name("x"), b.str("s")), b.ret(b.name("x"))]),
        b.ret(b.name("x")),
    ];
    let last = b.call(b.name("f"), vec![b.bool(true)]);
    let last_id = last.id();
    let module = b
        .module("m")
        .stmt(b.def("f", &["c"], body))
        .stmt(b.expr_stmt(last))
        .build();
    let results = analyze(module);

    // The else path only ever sees the int binding; the join comes from the two returns.
    assert_eq!(type_at(&results, last_id), Type::Int.join(&Type::Str));
    assert!(!messages(&results).iter().any(|m| m.contains("always return")));
}

#[test]
fn test_missing_return_is_reported() {
    let b = AstBuilder::new(FileId::new(0));
    let call = b.call(b.name("g"), vec![b.bool(true)]);
    let call_id = call.id();
    let module = b
        .module("m")
        .stmt(b.def("g", &["c"], vec![b.if_(b.name("c"), vec![b.ret(b.int(1))])]))
        .stmt(b.expr_stmt(call))
        .build();
    let results = analyze(module);

    let messages = messages(&results);
    assert!(messages.contains(&"Function doesn't always return a value".to_string()));
    assert!(messages.contains(&"Call doesn't always return a value".to_string()));
    assert_eq!(type_at(&results, call_id), Type::Int.join(&Type::None));
}

#[test]
fn test_procedure_returns_none_silently() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.def("p", &[], vec![b.expr_stmt(b.call(b.name("print"), vec![b.str("hi")]))]))
        .stmt(b.assign(b.name("r"), b.call(b.name("p"), vec![])))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "r"), Type::None);
    assert!(results.all_diagnostics().is_empty());
}

#[test]
fn test_class_instances_and_methods() {
    let b = AstBuilder::new(FileId::new(0));
    let init = b.def(
        "__init__",
        &["self", "x"],
        vec![b.assign(b.attr(b.name("self"), "x"), b.name("x"))],
    );
    let get = b.def("get", &["self"], vec![b.ret(b.attr(b.name("self"), "x"))]);
    let module = b
        .module("m")
        .stmt(b.class("Point", vec![], vec![init, get]))
        .stmt(b.assign(b.name("p"), b.call(b.name("Point"), vec![b.int(1)])))
        .stmt(b.assign(b.name("v"), b.method_call(b.name("p"), "get", vec![])))
        .build();
    let results = analyze(module);

    let point = match top_level(&results, "Point") {
        Type::Class(id) => id,
        other => panic!("expected class, got {:?}", other),
    };
    assert_eq!(top_level(&results, "p"), Type::Instance(point));
    assert_eq!(results.display_type(&Type::Instance(point)), "Point");
    assert_eq!(top_level(&results, "v"), Type::Int);
    assert!(results.all_diagnostics().is_empty());

    let init_binding = results
        .bindings_named("__init__")
        .find(|binding| !binding.builtin)
        .expect("constructor binding");
    assert_eq!(init_binding.kind, BindingKind::Constructor);
}

#[test]
fn test_constructor_argument_errors() {
    let b = AstBuilder::new(FileId::new(0));
    let init = b.def("__init__", &["self", "x"], vec![b.pass()]);
    let module = b
        .module("m")
        .stmt(b.class("C", vec![], vec![init]))
        .stmt(b.assign(b.name("c"), b.call(b.name("C"), vec![])))
        .stmt(b.class("D", vec![b.int(1)], vec![b.pass()]))
        .stmt(b.expr_stmt(b.call(b.int(3), vec![])))
        .build();
    let results = analyze(module);

    let messages = messages(&results);
    assert!(messages.contains(&"unable to bind argument: x".to_string()));
    assert!(messages.contains(&"int is not a class".to_string()));
    assert!(messages.contains(&"calling non-function and non-class: int".to_string()));
}

#[test]
fn test_inherited_attribute_lookup() {
    let b = AstBuilder::new(FileId::new(0));
    let base = b.class("Base", vec![], vec![b.def("name", &["self"], vec![b.ret(b.str("base"))])]);
    let derived = b.class("Derived", vec![b.name("Base")], vec![b.pass()]);
    let module = b
        .module("m")
        .stmt(base)
        .stmt(derived)
        .stmt(b.assign(
            b.name("n"),
            b.method_call(b.call(b.name("Derived"), vec![]), "name", vec![]),
        ))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "n"), Type::Str);
}

#[test]
fn test_attribute_errors() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(b.name("x"), b.int(1)))
        .stmt(b.expr_stmt(b.attr(b.name("x"), "nope")))
        .stmt(b.assign(b.attr(b.name("undefined"), "field"), b.int(1)))
        .build();
    let results = analyze(module);

    let messages = messages(&results);
    assert!(messages.contains(&"attribute not found in type: int.".to_string()));
    assert!(messages.contains(&"unbound variable undefined".to_string()));
    assert!(messages.contains(&"Can't set attribute for UnknownType".to_string()));
}

#[test]
fn test_builtin_methods_and_container_widening() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(b.name("s"), b.method_call(b.str("a"), "upper", vec![])))
        .stmt(b.assign(b.name("parts"), b.method_call(b.name("s"), "split", vec![])))
        .stmt(b.assign(b.name("xs"), b.list(vec![])))
        .stmt(b.expr_stmt(b.method_call(b.name("xs"), "append", vec![b.int(1)])))
        .stmt(b.assign(b.name("first"), b.method_call(b.name("xs"), "pop", vec![])))
        .stmt(b.assign(b.name("n"), b.call(b.name("len"), vec![b.name("xs")])))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "s"), Type::Str);
    assert_eq!(top_level(&results, "parts"), Type::list(Type::Str));
    assert_eq!(top_level(&results, "xs"), Type::list(Type::Int));
    assert_eq!(top_level(&results, "first"), Type::Int);
    assert_eq!(top_level(&results, "n"), Type::Int);
}

#[test]
fn test_subscripts() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(b.name("xs"), b.list(vec![b.int(1)])))
        .stmt(b.assign(b.name("t"), b.tuple(vec![b.int(1), b.str("a")])))
        .stmt(b.assign(b.name("d"), b.dict(vec![(b.str("k"), b.float(1.0))])))
        .stmt(b.assign(b.name("a"), b.index(b.name("xs"), b.int(0))))
        .stmt(b.assign(b.name("b"), b.index(b.name("t"), b.int(1))))
        .stmt(b.assign(b.name("c"), b.index(b.name("d"), b.int(0))))
        .stmt(b.assign(b.name("e"), b.slice(b.name("xs"), None, Some(b.int(1)))))
        .stmt(b.assign(b.name("f"), b.slice(b.str("abc"), Some(b.int(1)), None)))
        .stmt(b.expr_stmt(b.slice(b.name("d"), None, None)))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "a"), Type::Int);
    assert_eq!(top_level(&results, "b"), Type::Str);
    assert_eq!(top_level(&results, "c"), Type::Float);
    assert_eq!(top_level(&results, "e"), Type::list(Type::Int));
    assert_eq!(top_level(&results, "f"), Type::Str);
    let messages = messages(&results);
    assert!(messages.contains(&"Possible KeyError (wrong type for subscript)".to_string()));
    assert!(messages.contains(&"The type can't be sliced: {str:float}".to_string()));
}

#[test]
fn test_comprehension_variable_leaks() {
    let b = AstBuilder::new(FileId::new(0));
    let comp = b.list_comp(
        b.binop(b.name("x"), Operator::Mul, b.int(2)),
        vec![b.comp_for(b.name("x"), b.list(vec![b.int(1), b.int(2)]))],
    );
    let module = b
        .module("m")
        .stmt(b.assign(b.name("ys"), comp))
        .stmt(b.assign(b.name("z"), b.name("x")))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "ys"), Type::list(Type::Int));
    assert_eq!(top_level(&results, "z"), Type::Int);
    assert!(results.all_diagnostics().is_empty());
}

#[test]
fn test_lambdas_and_generators() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(b.name("ident"), b.lambda(&["x"], b.name("x"))))
        .stmt(b.assign(b.name("v"), b.call(b.name("ident"), vec![b.str("s")])))
        .stmt(b.def("gen", &[], vec![b.expr_stmt(b.yield_(Some(b.int(1))))]))
        .stmt(b.assign(b.name("g"), b.call(b.name("gen"), vec![])))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "v"), Type::Str);
    assert_eq!(top_level(&results, "g"), Type::list(Type::Int));
}

#[test]
fn test_try_and_with() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.try_except(
            vec![b.assign(b.name("x"), b.int(1))],
            Some(b.name("ValueError")),
            Some("e"),
            vec![b.assign(b.name("x"), b.str("s"))],
        ))
        .stmt(b.with(
            b.call(b.name("open"), vec![b.str("f.txt")]),
            Some(b.name("fh")),
            vec![b.assign(b.name("data"), b.method_call(b.name("fh"), "read", vec![]))],
        ))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "x"), Type::Int.join(&Type::Str));
    assert_eq!(top_level(&results, "data"), Type::Str);
    match top_level(&results, "e") {
        Type::Instance(id) => assert_eq!(results.store().class(id).name.as_str(), "ValueError"),
        other => panic!("expected exception instance, got {:?}", other),
    }
}

#[test]
fn test_true_division_is_never_integral() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.assign(b.name("q"), b.binop(b.int(7), Operator::Div, b.int(2))))
        .stmt(b.assign(b.name("c"), b.binop(b.int(1), Operator::Div, b.complex(2.0))))
        .stmt(b.assign(b.name("f"), b.binop(b.int(7), Operator::FloorDiv, b.int(2))))
        .stmt(b.assign(b.name("s"), b.binop(b.str("a"), Operator::Div, b.int(2))))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "q"), Type::Float);
    assert_eq!(top_level(&results, "c"), Type::Complex);
    assert_eq!(top_level(&results, "f"), Type::Int);
    assert_eq!(top_level(&results, "s"), Type::Str.join(&Type::Int));
}

#[test]
fn test_loop_control_and_expression_forms() {
    let b = AstBuilder::new(FileId::new(0));
    let mut params = b.params(&["x"]);
    params.args.push(b.param_default("factor", b.float(2.5)));
    let module = b
        .module("m")
        .stmt(b.def_with(
            "scale",
            params,
            vec![b.ret(b.binop(b.name("x"), Operator::Mul, b.name("factor")))],
        ))
        .stmt(b.def("stop", &[], vec![b.ret_none()]))
        .stmt(b.def("fail", &[], vec![b.raise(Some(b.call(b.name("ValueError"), vec![])))]))
        .stmt(b.assign(b.name("n"), b.int(0)))
        .stmt(b.while_loop(
            b.name("n"),
            vec![b.if_else(b.name("n"), vec![b.break_()], vec![b.continue_()])],
        ))
        .stmt(b.assign(b.name("scaled"), b.call(b.name("scale"), vec![b.int(2)])))
        .stmt(b.assign(b.name("stopped"), b.call(b.name("stop"), vec![])))
        .stmt(b.assign(b.name("flag"), b.unary(UnaryOperator::Not, b.name("n"))))
        .stmt(b.assign(b.name("pick"), b.if_exp(b.name("flag"), b.int(1), b.none())))
        .stmt(b.assign(
            b.name("squares"),
            b.dict_comp(
                b.name("k"),
                b.binop(b.name("k"), Operator::Mul, b.name("k")),
                vec![b.comp_for(b.name("k"), b.list(vec![b.int(1), b.int(2)]))],
            ),
        ))
        .stmt(b.assign(
            b.name("evens"),
            b.set_comp(b.name("e"), vec![b.comp_for(b.name("e"), b.list(vec![b.int(2)]))]),
        ))
        .stmt(b.delete(vec![b.name("evens")]))
        .build();
    let results = analyze(module);

    assert_eq!(top_level(&results, "scaled"), Type::Float);
    assert_eq!(top_level(&results, "stopped"), Type::None);
    assert_eq!(top_level(&results, "flag"), Type::Bool);
    assert_eq!(top_level(&results, "pick"), Type::Int.join(&Type::None));
    assert_eq!(top_level(&results, "squares"), Type::dict(Type::Int, Type::Int));
    assert_eq!(top_level(&results, "k"), Type::Int);
    assert_eq!(top_level(&results, "evens"), Type::Unknown);
    assert!(results.function_named("m.fail").is_some());
}

#[test]
fn test_uncalled_functions_are_forced() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.def("never", &["x"], vec![b.ret(b.str("s"))]))
        .stmt(b.class("K", vec![], vec![b.def("m", &["self"], vec![b.ret(b.name("self"))])]))
        .build();
    let results = analyze(module);

    let never = results.function_named("m.never").expect("never");
    assert_eq!(results.function_arrows(never).len(), 1);
    assert_eq!(results.function_arrows(never).return_type(), Type::Str);
    assert_eq!(results.display_type(&Type::Function(never)), "(?) -> str");
    assert_eq!(results.stats().get(Statistics::BODY_WALKS), 2);

    let receivers: Vec<Type> = results
        .bindings_named("self")
        .filter(|binding| binding.kind == BindingKind::Parameter)
        .map(|binding| binding.ty.clone())
        .collect();
    assert_eq!(receivers.len(), 1);
    assert!(matches!(receivers[0], Type::Instance(_)));
}

#[test]
fn test_unused_variables_reported_as_info() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b
        .module("m")
        .stmt(b.def(
            "f",
            &[],
            vec![b.assign(b.name("unused"), b.int(1)), b.assign(b.name("used"), b.int(2)), b.ret(b.name("used"))],
        ))
        .build();
    let options = AnalyzerOptions {
        report_unused: true,
        ..AnalyzerOptions::default()
    };
    let results = analyze_with(module, options);

    let unused: Vec<_> = results
        .all_diagnostics()
        .iter()
        .filter(|(_, d)| d.severity == Severity::Info)
        .map(|(_, d)| d.message())
        .collect();
    assert_eq!(unused, vec!["Unused variable: unused".to_string()]);
}

#[test]
fn test_binding_display() {
    let b = AstBuilder::new(FileId::new(0));
    let module = b.module("m").stmt(b.assign(b.name("x"), b.int(1))).build();
    let results = analyze(module);

    let binding = results.bindings_named("x").next().expect("binding x");
    let shown = results.display_binding(binding);
    assert!(shown.starts_with("(binding:kind=SCOPE:node=file:0#"));
    assert!(shown.contains(":type=int:qname=m.x:refs=[]"));
}
