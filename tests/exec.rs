//! End-to-end: source in, final accumulator value out.

use purple_garden::prelude::*;

/// Runs `src` and hands back the VM for inspection.
fn run(src: &str) -> Interpreter {
    let pg = Pg::init(Config::default());
    let mut vm = pg.prepare(src).expect("compiles");
    vm.run().expect("runs");
    vm
}

fn run_err(src: &str) -> Error {
    let pg = Pg::init(Config::default());
    match pg.exec_str(src) {
        Ok(state) => panic!("expected an error, got {:?}", state.return_value()),
        Err(e) => e,
    }
}

fn assert_int(src: &str, expected: i64) {
    let vm = run(src);
    match vm.return_register().kind {
        ValueKind::Int(got) => assert_eq!(got, expected, "in `{src}`"),
        other => panic!("expected int in `{src}`, got {other:?}"),
    }
}

fn assert_double(src: &str, expected: f64) {
    let vm = run(src);
    match vm.return_register().kind {
        ValueKind::Double(got) => {
            assert!((got - expected).abs() < 1e-9, "in `{src}`: {got}")
        }
        other => panic!("expected double in `{src}`, got {other:?}"),
    }
}

fn assert_bool(src: &str, expected: bool) {
    let vm = run(src);
    match vm.return_register().kind {
        ValueKind::Bool(got) => assert_eq!(got, expected, "in `{src}`"),
        other => panic!("expected bool in `{src}`, got {other:?}"),
    }
}

fn assert_str(src: &str, expected: &str) {
    let vm = run(src);
    match vm.return_register().kind {
        ValueKind::Str(s) => {
            assert_eq!(vm.str_value_bytes(s), expected.as_bytes(), "in `{src}`")
        }
        other => panic!("expected str in `{src}`, got {other:?}"),
    }
}

#[test]
fn integer_arithmetic() {
    assert_int("(+ 2 2)", 4);
    assert_int("(- 5 3)", 2);
    assert_int("(* 3 4)", 12);
    assert_int("(/ 6 2)", 3);
    assert_int("(+ 1 (- 2 1))", 2);
}

#[test]
fn mixed_arithmetic_widens_to_double() {
    assert_double("(+ 2.0 2)", 4.0);
    assert_double("(+ 2 2.0)", 4.0);
    assert_double("(- 5.0 3)", 2.0);
    assert_double("(- 5 3.0)", 2.0);
    assert_double("(* 3.0 4)", 12.0);
    assert_double("(* 3 4.0)", 12.0);
    assert_double("(/ 6.0 2)", 3.0);
    assert_double("(/ 6 2.0)", 3.0);
}

#[test]
fn division_by_zero_aborts() {
    assert!(matches!(
        run_err("(/ 1 0)"),
        Error::Runtime(RuntimeError::DivisionByZero)
    ));
}

#[test]
fn type_errors_name_both_operands() {
    match run_err("(+ true 1)") {
        Error::Runtime(RuntimeError::Type { op, lhs, rhs }) => {
            assert_eq!((op, lhs, rhs), ("+", "bool", "int"));
        }
        other => panic!("expected a type error, got {other:?}"),
    }
}

#[test]
fn string_concatenation_allocates_on_the_heap() {
    let vm = run("(+ \"purple\" \" garden\")");
    match vm.return_register().kind {
        ValueKind::Str(s) => {
            assert!(matches!(s, StrRef::Heap(_)));
            assert_eq!(vm.str_value_bytes(s), b"purple garden");
        }
        other => panic!("expected str, got {other:?}"),
    }
}

#[test]
fn equality_follows_tags_and_content() {
    assert_bool("(= 1 1)", true);
    assert_bool("(= 3.1415 3.1415)", true);
    assert_bool("(= true true)", true);
    assert_bool("(= true false)", false);
    assert_bool("(= false false)", true);
    assert_bool("(= \"abc\" \"abc\")", true);
    assert_bool("(= \"abc\" \"abd\")", false);
    // tags must match: no numeric coercion through `=`
    assert_bool("(= 1 1.0)", false);
}

#[test]
fn comparisons_are_numeric_only() {
    assert_bool("(< 1 2)", true);
    assert_bool("(> 1 2)", false);
    assert_bool("(< 1.5 2)", true);
    assert_bool("(> 2.5 2)", true);
    assert!(matches!(
        run_err("(< \"a\" 1)"),
        Error::Runtime(RuntimeError::Type { .. })
    ));
}

#[test]
fn let_binds_and_reads_back() {
    assert_str("(@let name \"user\") (name)", "user");
    assert_int("(@let age 25) (age)", 25);
}

#[test]
fn functions_return_through_r0() {
    assert_int("(@fn ret[arg] arg) (ret 25)", 25);
    assert_int("(@fn add25[a] (+ a 25)) (add25 25)", 50);
    assert_int("(@fn add[a b] (+ a b)) (add 20 22)", 42);
}

#[test]
fn function_locals_are_invisible_after_leave() {
    // the frame holding `x = 2` is popped and cleared by the call's LEAVE
    assert_int("(@let x 1) (@fn f[x] x) (f 2) (x)", 1);
    // bindings made inside a body do not leak into the caller's scope
    let pg = Pg::init(Config::default());
    assert!(matches!(
        pg.exec_str("(@fn f[a] (@let inner a) inner) (f 1) (inner)"),
        Err(Error::Compile(CompileError::UnboundIdentifier(_)))
    ));
}

#[test]
fn outer_bindings_are_readable_inside_calls() {
    assert_int("(@let g 41) (@fn f[x] (+ g x)) (f 1)", 42);
}

#[test]
fn calls_nested_in_expressions_preserve_live_temporaries() {
    // the callee reuses caller registers; spills around CALL keep them
    assert_int("(@fn f[x] (+ x 1)) (+ 5 (f 1))", 7);
    assert_int("(@fn f[x] (+ x 1)) (+ (f 1) (f 2))", 5);
    assert_int("(@fn f[x] (* x x)) (- (f 3) (f 2))", 5);
}

#[test]
fn branching_recursion_computes_fibonacci() {
    assert_int(
        "(@fn fib[n]
            (@match (< n 2)
                (true n)
                (_ (+ (fib (- n 1)) (fib (- n 2))))))
         (fib 10)",
        55,
    );
}

#[test]
fn recursion_reuses_pooled_frames() {
    assert_int(
        "(@fn count[n] (@match (= n 0) (true 0) (_ (count (- n 1))))) (count 100)",
        0,
    );
}

#[test]
fn len_of_strings_arrays_and_objects() {
    assert_int("(@len \"hello\")", 5);
    assert_int("(@len \"\")", 0);
    assert_int("(@len [1 2 3])", 3);
    assert_int("(@len {\"a\": 1, \"b\": 2})", 2);
    // interning: both literals share one global pool slot
    let vm = run("(@len \"hello\") (@len \"hello\")");
    let strings = vm
        .program()
        .globals
        .iter()
        .filter(|g| matches!(g.kind, ValueKind::Str(_)))
        .count();
    assert_eq!(strings, 1);
}

#[test]
fn options_share_storage_with_their_payload() {
    let vm = run("(@Some true)");
    let v = vm.return_register();
    assert!(v.some);
    assert!(matches!(v.kind, ValueKind::Bool(true)));

    let vm = run("(@None)");
    let v = vm.return_register();
    assert!(!v.some);
    assert!(matches!(v.kind, ValueKind::None));
}

#[test]
fn option_builtins_round_trip() {
    assert_int("(@opt.unwrap (@Some 5))", 5);
    assert_bool("(@opt.is_some (@Some 1))", true);
    assert_bool("(@opt.is_some (@None))", false);
    assert_bool("(@opt.is_none (@None))", true);
    assert_int("(@opt.or (@None) 7)", 7);
    assert_int("(@opt.or (@Some 3) 7)", 3);
    assert!(matches!(
        run_err("(@opt.unwrap (@None))"),
        Error::Runtime(RuntimeError::Assertion(_))
    ));
}

#[test]
fn quoted_symbols_are_strings() {
    assert_str("'quoted", "quoted");
}

#[test]
fn assertion_keeps_the_asserted_value() {
    assert_bool("(@assert true)", true);
    assert!(matches!(
        run_err("(@assert false)"),
        Error::Runtime(RuntimeError::Assertion(_))
    ));
    assert!(matches!(
        run_err("(@assert (= 1 2))"),
        Error::Runtime(RuntimeError::Assertion(_))
    ));
}

#[test]
fn match_yields_the_condition_without_arms() {
    assert_bool("(@match true)", true);
    assert_bool("(@match false)", false);
}

#[test]
fn match_selects_the_first_equal_arm() {
    assert_str("(@let n 1) (@match n (0 \"zero\") (1 \"one\") (_ \"many\"))", "one");
    assert_str("(@let n 5) (@match n (0 \"zero\") (1 \"one\") (_ \"many\"))", "many");
    assert_str("(@match (+ 1 1) (2 \"two\"))", "two");
}

#[test]
fn array_literals_and_indexing() {
    assert_int("(@idx [10 20 30] 1)", 20);
    let vm = run("[1 \"two\" 3.0]");
    match vm.return_register().kind {
        ValueKind::Array(r) => assert_eq!(vm.heap().list(r).len(), 3),
        other => panic!("expected array, got {other:?}"),
    }
    assert!(matches!(
        run_err("(@idx [1] 3)"),
        Error::Runtime(RuntimeError::IndexOutOfBounds { idx: 3, len: 1 })
    ));
}

#[test]
fn object_literals_and_key_lookup() {
    assert_str("(@idx {\"name\": \"user\"} \"name\")", "user");
    assert_int("(@idx {\"a\": 1, \"b\": 2} \"b\")", 2);
    assert!(matches!(
        run_err("(@idx {\"a\": 1} \"missing\")"),
        Error::Runtime(RuntimeError::KeyNotFound(key)) if key == "missing"
    ));
}

#[test]
fn indexing_type_mismatches_abort() {
    assert!(matches!(
        run_err("(@idx [1] \"a\")"),
        Error::Runtime(RuntimeError::BadIndex { .. })
    ));
    assert!(matches!(
        run_err("(@idx 5 1)"),
        Error::Runtime(RuntimeError::BadIndex { .. })
    ));
}

#[test]
fn std_paths_resolve_with_and_without_prefix() {
    assert_str("(@runtime.type 5)", "number");
    assert_str("(@std.runtime.type 5.0)", "number");
    assert_str("(@runtime.type \"s\")", "str");
    assert_str("(@runtime.type [1])", "array");
    assert_str("(@runtime.type (@Some 1))", "option");
    assert_str("(@runtime.type (@None))", "option");
}

#[test]
fn string_builtins() {
    assert_str("(@str.append \"a\" \"b\" \"c\")", "abc");
    assert_int("(@len (@str.lines \"a\nb\"))", 2);
    assert_str("(@str.slice \"garden\" 0 3)", "gar");
}

#[test]
fn conversion_yields_options() {
    let vm = run("(@conv.int \"42\")");
    let v = vm.return_register();
    assert!(v.some);
    assert!(matches!(v.kind, ValueKind::Int(42)));

    let vm = run("(@conv.int \"nope\")");
    assert!(matches!(vm.return_register().kind, ValueKind::None));
}

#[test]
fn math_and_ranges() {
    assert_int("(@math.mod 7 3)", 1);
    assert_int("(@len (@arr.range 0 5))", 5);
    assert_int("(@idx (@arr.range 5 8) 0)", 5);
    assert_int("(@len (@arr.range 3 0))", 0);
}

#[test]
fn println_returns_none() {
    let vm = run("(@println \"hello\" 42)");
    assert!(matches!(vm.return_register().kind, ValueKind::None));
}

#[test]
fn deep_equality_is_a_test_utility_not_an_operator() {
    // `=` is identity on containers
    let vm = run("(@let a [1 2]) (@let b [1 2]) (= (a) (b))");
    assert!(matches!(vm.return_register().kind, ValueKind::Bool(false)));

    // content equality lives on the interpreter, for tests
    let vm = run("[[1 \"x\"] [1 \"x\"]]");
    let (a, b) = match vm.return_register().kind {
        ValueKind::Array(r) => {
            let list = vm.heap().list(r);
            (list.get(0).expect("two elements"), list.get(1).expect("two elements"))
        }
        other => panic!("expected array, got {other:?}"),
    };
    assert!(vm.deep_eq(a, b));
    assert!(!vm.value_eq(a, b));
    assert!(vm.deep_eq(a, a));
}

#[test]
fn unknown_names_fail_at_compile_time() {
    let pg = Pg::init(Config::default());
    assert!(matches!(
        pg.exec_str("(missing 1)"),
        Err(Error::Compile(CompileError::UnknownFunction(_)))
    ));
    assert!(matches!(
        pg.exec_str("(@no.such 1)"),
        Err(Error::Compile(CompileError::UnknownBuiltin(_)))
    ));
}
