//! End-to-end tests: parse, check from an empty stack, evaluate

use cairn_runtime::{Interpreter, Outcome, PrintHandler, RuntimeError, Value, evaluate};
use cairnc::{CompileError, TypeError};

fn run(source: &str) -> Outcome {
    let checked = cairnc::check_source(source)
        .unwrap_or_else(|err| panic!("{source:?} failed to check: {err}"));
    evaluate(&checked, Vec::new()).unwrap_or_else(|err| panic!("{source:?} failed: {err}"))
}

fn run_err(source: &str) -> RuntimeError {
    let checked = cairnc::check_source(source).unwrap();
    evaluate(&checked, Vec::new()).unwrap_err()
}

fn type_err(source: &str) -> TypeError {
    match cairnc::check_source(source) {
        Err(CompileError::Type(err)) => err,
        other => panic!("expected a type error for {source:?}, got {other:?}"),
    }
}

fn rendered_stack(source: &str) -> Vec<String> {
    run(source).stack.iter().map(Value::to_string).collect()
}

#[test]
fn test_row_transparency() {
    assert_eq!(rendered_stack("1 2 3 dup"), vec!["1", "2", "3", "3"]);
}

#[test]
fn test_map() {
    assert_eq!(
        rendered_stack("[1 2 3 4 5] (dup *) map"),
        vec!["[1, 4, 9, 16, 25]"]
    );
}

#[test]
fn test_filter() {
    assert_eq!(
        rendered_stack("[1 2 3 4 5 6] (2 % 0 =) filter"),
        vec!["[2, 4, 6]"]
    );
}

#[test]
fn test_fold_pipeline() {
    let outcome = run("[1..10] (dup *) map (2 % 0 =) filter (+) 0 fold");
    assert_eq!(outcome.stack, vec![Value::Int(220)]);
}

#[test]
fn test_fold_threads_accumulator_from_the_left() {
    // ((0 - 1) - 2) - 3
    assert_eq!(rendered_stack("[1 2 3] (-) 0 fold"), vec!["-6"]);
}

#[test]
fn test_let_scoping() {
    let outcome = run("4 5 let a b { a print b print a b + print }");
    assert_eq!(outcome.output, vec!["4", "5", "9"]);
    assert!(outcome.stack.is_empty());

    let err = type_err("4 5 let a b { a b + } a");
    assert!(matches!(err, TypeError::UnboundIdentifier { ref name, .. } if name == "a"));
}

#[test]
fn test_conditional_branches() {
    assert_eq!(run("10 true if {10 +} else {5 +}").stack, vec![Value::Int(20)]);
    assert_eq!(run("10 false if {10 +} else {5 +}").stack, vec![Value::Int(15)]);

    let err = type_err("10 true if {10 +} else {drop true}");
    assert!(matches!(err, TypeError::BranchMismatch { .. }));
}

#[test]
fn test_runtime_faults() {
    assert!(matches!(
        run_err("1 0 /"),
        RuntimeError::DivisionByZero { dividend: 1, .. }
    ));
    assert!(matches!(
        run_err("[] head"),
        RuntimeError::EmptyListAccess { .. }
    ));
    assert!(matches!(
        run_err("[] tail"),
        RuntimeError::EmptyListAccess { .. }
    ));
}

#[test]
fn test_fault_stops_further_output() {
    let checked = cairnc::check_source("1 print 1 0 / 2 print").unwrap();
    let mut interp = Interpreter::with_printer(PrintHandler::buffer()).record_output();
    let mut stack = Vec::new();

    let err = interp.run(&checked, &mut stack).unwrap_err();
    assert_eq!(err.to_string(), "/: division by zero (1 / 0)");
    assert_eq!(interp.output(), ["1"]);
    assert_eq!(interp.printer().get_output(), "1\n");
}

#[test]
fn test_quotation_runs_while_copy_on_stack() {
    assert_eq!(rendered_stack("(1) dup do swap do +"), vec!["2"]);
    assert_eq!(rendered_stack("(dup) dup 5 swap do drop swap do"), vec!["5", "5"]);
}

#[test]
fn test_choice_alternatives_must_agree() {
    assert!(matches!(
        type_err("true 1 false choice"),
        TypeError::BranchMismatch { .. }
    ));
}

#[test]
fn test_principal_effect_is_deterministic() {
    let program = cairnc::parse("let f { [1 2] f map } swap").unwrap();
    let first = cairnc::check(&program).unwrap();
    let second = cairnc::check(&program).unwrap();
    assert_eq!(first.effect(), second.effect());
}

#[test]
fn test_composition_soundness() {
    let fits = ("1 2", "+ print");
    let clashes = ("true", "1 +");

    for part in [fits.0, fits.1, clashes.0, clashes.1] {
        let program = cairnc::parse(part).unwrap();
        assert!(cairnc::check(&program).is_ok(), "{part} should check alone");
    }

    let joined = format!("{} {}", fits.0, fits.1);
    assert_eq!(run(&joined).output, vec!["3"]);

    let joined = format!("{} {}", clashes.0, clashes.1);
    assert!(matches!(type_err(&joined), TypeError::TypeMismatch { .. }));
}

#[test]
fn test_shuffles() {
    assert_eq!(rendered_stack("1 2 over"), vec!["1", "2", "1"]);
    assert_eq!(rendered_stack("1 2 3 rot"), vec!["2", "3", "1"]);
    assert_eq!(rendered_stack("1 2 swap drop"), vec!["2"]);
    assert_eq!(rendered_stack("true 1 2 choice false 1 2 choice"), vec!["1", "2"]);
}

#[test]
fn test_list_operators() {
    assert_eq!(rendered_stack("[1 2] [3] concat"), vec!["[1, 2, 3]"]);
    assert_eq!(rendered_stack("[1 2] 3 push len"), vec!["3"]);
    assert_eq!(rendered_stack("[7 8 9] tail head"), vec!["8"]);
}

#[test]
fn test_closure_escapes_its_block() {
    assert_eq!(
        rendered_stack("5 let x { (x +) } [1 2] swap map"),
        vec!["[6, 7]"]
    );
}

#[test]
fn test_closure_uses_scope_at_creation() {
    let source = "1 let x { (x) } 2 let x { do x }";
    assert_eq!(rendered_stack(source), vec!["1", "2"]);
}

#[test]
fn test_words() {
    assert_eq!(rendered_stack("fn square { dup * } 7 square"), vec!["49"]);
    assert_eq!(
        rendered_stack("fn square { dup * } [1 2 3] (square) map"),
        vec!["[1, 4, 9]"]
    );
    assert!(matches!(
        type_err("fn f { f }"),
        TypeError::UnboundIdentifier { .. }
    ));
}

#[test]
fn test_words_are_polymorphic() {
    let outcome = run("fn twice { dup } 1 twice true twice");
    assert_eq!(
        outcome.stack,
        vec![
            Value::Int(1),
            Value::Int(1),
            Value::Bool(true),
            Value::Bool(true)
        ]
    );
}

#[test]
fn test_foreach_prints_each_element() {
    let outcome = run("[[1] [] [2 3]] (print) foreach");
    assert_eq!(outcome.output, vec!["[1]", "[]", "[2, 3]"]);
    assert!(outcome.stack.is_empty());
}

#[test]
fn test_quotation_value_prints_as_source() {
    assert_eq!(run("(dup *) print").output, vec!["(dup *)"]);
}

#[test]
fn test_arity_underflow_from_empty_stack() {
    assert!(matches!(type_err("dup"), TypeError::ArityUnderflow { .. }));
    assert!(matches!(type_err("1 +"), TypeError::ArityUnderflow { .. }));
}

#[test]
fn test_heterogeneous_list_rejected() {
    assert!(matches!(type_err("[1 true]"), TypeError::TypeMismatch { .. }));
}

#[test]
fn test_evaluate_with_initial_stack() {
    let program = cairnc::parse("+").unwrap();
    let checked = cairnc::check(&program).unwrap();
    let outcome = evaluate(&checked, vec![Value::Int(2), Value::Int(3)]).unwrap();
    assert_eq!(outcome.stack, vec![Value::Int(5)]);
}
