//! End-to-end collector behavior: allocation churn through recursion,
//! stats accounting and survival of reachable values across cycles.

use purple_garden::prelude::*;

fn run(src: &str) -> Interpreter {
    let pg = Pg::init(Config::default());
    let mut vm = pg.prepare(src).expect("compiles");
    vm.run().expect("runs");
    vm
}

/// Binds a short-lived concatenation per call, recursing `n` times. Every
/// `trash` binding dies with its frame's `LEAVE`.
const CHURN: &str = "\
(@fn churn[n]
    (@let trash (+ \"some garbage padding for the collector to chew on\"
                   \"and a second helping of bytes to fill the heap faster\"))
    (@match (= n 0)
        (true \"done\")
        (_ (churn (- n 1)))))
";

#[test]
fn churn_collects_garbage_and_keeps_the_result() {
    let vm = run(&format!("{CHURN} (churn 600)"));
    let stats = vm.heap_stats();
    // cycles ran: the live estimate dropped below the cumulative total
    assert!(
        stats.current < stats.allocated,
        "expected collection, stats: {stats:?}"
    );
    match vm.return_register().kind {
        ValueKind::Str(s) => assert_eq!(vm.str_value_bytes(s), b"done"),
        other => panic!("expected str, got {other:?}"),
    }
}

#[test]
fn reachable_values_survive_cycles_uncorrupted() {
    let vm = run(&format!(
        "(@let keep (+ \"keep\" \"me\")) {CHURN} (churn 600) (keep)"
    ));
    match vm.return_register().kind {
        ValueKind::Str(s) => {
            assert!(matches!(s, StrRef::Heap(_)));
            assert_eq!(vm.str_value_bytes(s), b"keepme");
        }
        other => panic!("expected str, got {other:?}"),
    }
}

#[test]
fn container_interiors_survive_cycles() {
    let vm = run(&format!(
        "(@let nest [[(+ \"a\" \"b\") (+ \"c\" \"d\")] {{\"k\": (+ \"e\" \"f\")}}])
         {CHURN} (churn 600)
         (nest)"
    ));
    assert_eq!(vm.display_value(vm.return_register()), "[[ab, cd], {k: ef}]");
}

#[test]
fn gc_stats_builtin_reports_counters() {
    let vm = run(&format!(
        "{CHURN} (churn 600) (@idx (@runtime.gc.stats) \"current\")"
    ));
    match vm.return_register().kind {
        ValueKind::Int(current) => assert!(current >= 0),
        other => panic!("expected int, got {other:?}"),
    }

    let vm = run("(@runtime.gc.stats)");
    match vm.return_register().kind {
        ValueKind::Obj(r) => assert_eq!(vm.heap().map(r).len(), 2),
        other => panic!("expected obj, got {other:?}"),
    }
}

#[test]
fn disabled_gc_never_cycles() {
    let pg = Pg::init(Config {
        disable_gc: true,
        ..Config::default()
    });
    let mut vm = pg.prepare(&format!("{CHURN} (churn 200)")).expect("compiles");
    vm.run().expect("runs");
    let stats = vm.heap_stats();
    // nothing was freed, the live estimate is the cumulative total
    assert_eq!(stats.current, stats.allocated);
}

#[test]
fn block_allocator_mode_aborts_on_exhaustion() {
    let pg = Pg::init(Config {
        disable_gc: true,
        max_memory: Some(16 * 1024),
        ..Config::default()
    });
    let mut vm = pg.prepare(&format!("{CHURN} (churn 600)")).expect("compiles");
    assert!(matches!(
        vm.run(),
        Err(RuntimeError::OutOfMemory { .. })
    ));
}
