use uigen_core::ast::{Expr, TyExpr};
use uigen_core::ops::BinOp;
use uigen_core::Error;
use uigen_resolve::{Context, MethodRegistry, MethodValue, Overload, ParamKind, Resolver};

fn literals(resolver: &Resolver, ctx: &mut Context, expr: &Expr) -> Vec<String> {
    resolver
        .resolve_to_literals(ctx, expr)
        .expect("literal resolution")
}

fn range_body(param: &str, body: Expr) -> Expr {
    Expr::lambda(vec![param.to_owned()], body)
}

#[test]
fn range_expands_one_indexed_ticks() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let call = Expr::method_call(
        "$range",
        vec![Expr::int(3), range_body("n", Expr::name("$n"))],
    );
    assert_eq!(literals(&tools, &mut ctx, &call), vec!["1", "2", "3"]);
}

#[test]
fn range_honors_explicit_start() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let call = Expr::method_call(
        "$range",
        vec![
            Expr::int(4),
            Expr::int(6),
            range_body("i", Expr::template("item$i")),
        ],
    );
    assert_eq!(
        literals(&tools, &mut ctx, &call),
        vec!["item4", "item5", "item6"]
    );
}

#[test]
fn empty_range_expands_to_nothing() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let call = Expr::method_call(
        "$range",
        vec![Expr::int(3), Expr::int(2), range_body("n", Expr::name("$n"))],
    );
    assert!(literals(&tools, &mut ctx, &call).is_empty());
}

#[test]
fn first_is_true_only_on_first_tick() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let body = Expr::conditional(
        Expr::method_call("$first", vec![]),
        Expr::string("head"),
        Expr::string("tail"),
    );
    let call = Expr::method_call("$range", vec![Expr::int(3), range_body("n", body)]);
    assert_eq!(
        literals(&tools, &mut ctx, &call),
        vec!["head", "tail", "tail"]
    );
}

#[test]
fn filtered_range_marks_first_surviving_tick() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    // keep even ticks only; the first survivor (2) is first-of-range
    let filter = range_body(
        "n",
        Expr::binary(
            BinOp::Eq,
            Expr::binary(BinOp::Rem, Expr::name("$n"), Expr::int(2)),
            Expr::int(0),
        ),
    );
    let body = Expr::conditional(
        Expr::method_call("$first", vec![]),
        Expr::template("first:$n"),
        Expr::name("$n"),
    );
    let call = Expr::method_call(
        "$range",
        vec![Expr::int(1), Expr::int(5), filter, range_body("n", body)],
    );
    assert_eq!(literals(&tools, &mut ctx, &call), vec!["first:2", "4"]);
}

#[test]
fn nested_ranges_see_the_outer_loop_variable() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    // the inner ticks are deferred; `$i` must still resolve inside them
    let inner_body = Expr::conditional(
        Expr::method_call("$first", vec![]),
        Expr::template("o$i-i$j-F"),
        Expr::template("o$i-i$j"),
    );
    let inner = Expr::method_call("$range", vec![Expr::int(2), range_body("j", inner_body)]);
    let call = Expr::method_call("$range", vec![Expr::int(2), range_body("i", inner)]);
    assert_eq!(
        literals(&tools, &mut ctx, &call),
        vec!["o1-i1-F", "o1-i2", "o2-i1-F", "o2-i2"]
    );
}

#[test]
fn filters_run_inside_the_tick_frame() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    // a filter may consult $first(); it holds until some tick survives
    let filter = range_body(
        "n",
        Expr::binary(
            BinOp::Eq,
            Expr::method_call("$first", vec![]),
            Expr::bool_lit(true),
        ),
    );
    let call = Expr::method_call(
        "$range",
        vec![
            Expr::int(1),
            Expr::int(3),
            filter,
            range_body("n", Expr::template("kept$n")),
        ],
    );
    assert_eq!(literals(&tools, &mut ctx, &call), vec!["kept1"]);
    assert!(!ctx.in_range());
}

#[test]
fn range_bindings_do_not_leak() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let call = Expr::method_call(
        "$range",
        vec![Expr::int(2), range_body("n", Expr::name("$n"))],
    );
    literals(&tools, &mut ctx, &call);
    assert!(!ctx.has("n"));
    assert!(!ctx.in_range());
}

#[test]
fn first_outside_a_range_is_a_state_error() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let err = tools
        .resolve_to_literals(&mut ctx, &Expr::method_call("$first", vec![]))
        .expect_err("$first without $range");
    assert!(matches!(err, Error::State(..)), "got {err:?}");
}

#[test]
fn range_body_must_be_a_single_param_lambda() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let not_a_lambda = Expr::method_call("$range", vec![Expr::int(2), Expr::string("body")]);
    let err = tools
        .resolve_to_literals(&mut ctx, &not_a_lambda)
        .expect_err("non-lambda body");
    assert!(matches!(err, Error::Structural(..)), "got {err:?}");

    let two_params = Expr::method_call(
        "$range",
        vec![
            Expr::int(2),
            Expr::lambda(vec!["a".to_owned(), "b".to_owned()], Expr::name("a")),
        ],
    );
    let err = tools
        .resolve_to_literals(&mut ctx, &two_params)
        .expect_err("two-param body");
    assert!(matches!(err, Error::Structural(..)), "got {err:?}");
}

#[test]
fn if_resolves_branch_or_nothing() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let taken = Expr::method_call(
        "$if",
        vec![Expr::bool_lit(true), Expr::string("present")],
    );
    let out = tools.resolve_var(&mut ctx, &taken).expect("$if true");
    assert_eq!(out, Expr::string("present"));

    // a false $if yields no replacement; the call node survives
    let skipped = Expr::method_call(
        "$if",
        vec![Expr::bool_lit(false), Expr::string("present")],
    );
    let out = tools.resolve_var(&mut ctx, &skipped).expect("$if false");
    assert_eq!(out, skipped);
}

#[test]
fn else_takes_the_untaken_branch() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let chained = Expr::method_call_scoped(
        Expr::method_call(
            "$if",
            vec![Expr::bool_lit(false), Expr::string("then")],
        ),
        "$else",
        vec![Expr::string("else")],
    );
    assert_eq!(literals(&tools, &mut ctx, &chained), vec!["else"]);

    let chained = Expr::method_call_scoped(
        Expr::method_call(
            "$if",
            vec![Expr::bool_lit(true), Expr::string("then")],
        ),
        "$else",
        vec![Expr::string("else")],
    );
    assert_eq!(literals(&tools, &mut ctx, &chained), vec!["then"]);
}

#[test]
fn else_without_an_if_scope_is_structural() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let bare = Expr::method_call("$else", vec![Expr::string("else")]);
    let err = tools
        .resolve_to_literals(&mut ctx, &bare)
        .expect_err("bare $else");
    assert!(matches!(err, Error::Structural(..)), "got {err:?}");
}

#[test]
fn print_renders_and_substitutes_source() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let _ = ctx.bind("name", Expr::string("Label"));
    let call = Expr::method_call("$print", vec![Expr::template("set$name()")]);
    assert_eq!(literals(&tools, &mut ctx, &call), vec!["setLabel()"]);
}

#[test]
fn replace_rewrites_every_match() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let chained = Expr::method_call_scoped(
        Expr::method_call("$print", vec![Expr::template("a-b-c")]),
        "$replace",
        vec![Expr::string("-"), Expr::string("_")],
    );
    assert_eq!(literals(&tools, &mut ctx, &chained), vec!["a_b_c"]);
}

#[test]
fn replace_patterns_are_regular_expressions() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let chained = Expr::method_call_scoped(
        Expr::method_call("$print", vec![Expr::template("item12 and item7")]),
        "$replace",
        vec![Expr::string(r"item\d+"), Expr::string("x")],
    );
    assert_eq!(literals(&tools, &mut ctx, &chained), vec!["x and x"]);
}

#[test]
fn replace_chains_onto_a_range_result() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let range = Expr::method_call(
        "$range",
        vec![Expr::int(2), range_body("n", Expr::template("a$n"))],
    );
    let chained = Expr::method_call_scoped(
        range,
        "$replace",
        vec![Expr::string("a"), Expr::string("b")],
    );
    assert_eq!(literals(&tools, &mut ctx, &chained), vec!["b1", "b2"]);
}

#[test]
fn remove_deletes_matches() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let chained = Expr::method_call_scoped(
        Expr::method_call("$print", vec![Expr::template("get_name_impl")]),
        "$remove",
        vec![Expr::string("_impl")],
    );
    assert_eq!(literals(&tools, &mut ctx, &chained), vec!["get_name"]);
}

#[test]
fn replace_without_a_scope_call_is_structural() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let bare = Expr::method_call("$replace", vec![Expr::string("-"), Expr::string("_")]);
    let err = tools
        .resolve_to_literals(&mut ctx, &bare)
        .expect_err("bare $replace");
    assert!(matches!(err, Error::Structural(..)), "got {err:?}");
}

#[test]
fn type_builds_parameterized_references() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let call = Expr::method_call(
        "$type",
        vec![Expr::string("Map"), Expr::string("K"), Expr::string("V")],
    );
    assert_eq!(
        tools.resolve_literal(&mut ctx, &call).expect("$type"),
        "Map<K, V>"
    );
}

#[test]
fn type_drops_empty_generic_arguments() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let _ = ctx.bind("extra", Expr::string(""));
    let call = Expr::method_call(
        "$type",
        vec![Expr::string("List"), Expr::string("E"), Expr::template("$extra")],
    );
    assert_eq!(
        tools.resolve_literal(&mut ctx, &call).expect("$type"),
        "List<E>"
    );
}

#[test]
fn type_knows_the_primitives() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let call = Expr::method_call("$type", vec![Expr::string("int")]);
    assert_eq!(tools.resolve_literal(&mut ctx, &call).expect("$type"), "int");

    let bad = Expr::method_call(
        "$type",
        vec![Expr::string("char"), Expr::string("T")],
    );
    let err = tools
        .resolve_to_literals(&mut ctx, &bad)
        .expect_err("parameterized primitive");
    assert!(matches!(err, Error::Misconfigured(..)), "got {err:?}");
}

#[test]
fn type_builds_wildcards() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let unbounded = Expr::method_call("$type", vec![Expr::string("?")]);
    assert_eq!(tools.resolve_literal(&mut ctx, &unbounded).expect("$type"), "?");

    let extends = Expr::method_call(
        "$type",
        vec![Expr::string("?"), Expr::string("CharSequence")],
    );
    assert_eq!(
        tools.resolve_literal(&mut ctx, &extends).expect("$type"),
        "? extends CharSequence"
    );

    let supers = Expr::method_call(
        "$type",
        vec![Expr::string("?"), Expr::string("super"), Expr::string("Integer")],
    );
    assert_eq!(
        tools.resolve_literal(&mut ctx, &supers).expect("$type"),
        "? super Integer"
    );
}

#[test]
fn generic_parameterizes_its_scope() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let _ = ctx.bind("n", Expr::int(1));
    let chained = Expr::method_call_scoped(
        Expr::class_lit(TyExpr::named("List")),
        "$generic",
        vec![Expr::template("T$n")],
    );
    assert_eq!(
        tools.resolve_literal(&mut ctx, &chained).expect("$generic"),
        "List<T1>"
    );
}

#[test]
fn registered_name_with_wrong_arity_is_structural() {
    let tools = Resolver::new();
    let mut ctx = Context::new();

    let call = Expr::method_call("$if", vec![Expr::bool_lit(true)]);
    let err = tools
        .resolve_to_literals(&mut ctx, &call)
        .expect_err("$if arity");
    assert!(matches!(err, Error::Structural(..)), "got {err:?}");
}

#[test]
fn user_methods_share_the_dispatch_path() {
    let mut tools = Resolver::new();
    let mut ctx = Context::new();

    tools.register(
        "$typeParam",
        Overload::new(
            vec![
                ParamKind::InjectedTools,
                ParamKind::InjectedContext,
                ParamKind::StringText,
            ],
            |_tools, _ctx, _call, args| Ok(MethodValue::Str(format!("T{}", args[0].text()?))),
        ),
    );

    let call = Expr::method_call("$typeParam", vec![Expr::int(2)]);
    assert_eq!(literals(&tools, &mut ctx, &call), vec!["T2"]);
}

#[test]
fn resolved_node_slots_receive_reduced_arguments() {
    let mut tools = Resolver::new();
    let mut ctx = Context::new();

    tools.register(
        "$twice",
        Overload::new(
            vec![
                ParamKind::InjectedTools,
                ParamKind::InjectedContext,
                ParamKind::ResolvedNode,
            ],
            |_tools, _ctx, _call, args| {
                let node = args[0].node()?;
                Ok(MethodValue::Nodes(vec![node.clone(), node.clone()]))
            },
        ),
    );

    let call = Expr::method_call(
        "$twice",
        vec![Expr::binary(BinOp::Add, Expr::int(2), Expr::int(3))],
    );
    assert_eq!(literals(&tools, &mut ctx, &call), vec!["5", "5"]);
}

#[test]
fn raw_list_results_box_into_one_array() {
    let mut tools = Resolver::new();
    let mut ctx = Context::new();

    tools.register(
        "$pair",
        Overload::new(
            vec![ParamKind::InjectedTools, ParamKind::InjectedContext],
            |_tools, _ctx, _call, _args| {
                Ok(MethodValue::List(vec![
                    MethodValue::Str("x".to_owned()),
                    MethodValue::Int(2),
                ]))
            },
        ),
    );

    let call = Expr::method_call("$pair", vec![]);
    let node = tools.resolve_var(&mut ctx, &call).expect("$pair");
    assert_eq!(node.to_string(), "[\"x\", 2]");
    assert_eq!(literals(&tools, &mut ctx, &call), vec!["x", "2"]);
}

#[test]
fn varargs_splice_prior_bundles_flat() {
    let mut registry = MethodRegistry::with_builtins();
    registry.register(
        "$count",
        Overload::new(
            vec![
                ParamKind::InjectedTools,
                ParamKind::InjectedContext,
                ParamKind::Varargs,
            ],
            |_tools, _ctx, _call, args| Ok(MethodValue::Int(args[0].nodes()?.len() as i32)),
        ),
    );
    let tools = Resolver::with_registry(registry);
    let mut ctx = Context::new();

    // a multi-value $range result arrives as one argument node but must
    // count as its individual elements
    let range = Expr::method_call(
        "$range",
        vec![Expr::int(3), Expr::lambda(vec!["n".to_owned()], Expr::name("$n"))],
    );
    let call = Expr::method_call("$count", vec![range, Expr::int(99)]);
    assert_eq!(literals(&tools, &mut ctx, &call), vec!["4"]);
}
