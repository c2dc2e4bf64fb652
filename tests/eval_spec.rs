//! Engine behavior tests, organized by language area.

use primer::interp::{Machine, RuntimeError};
use primer::models::ErrorKind;

/// Run a snippet that must complete cleanly; returns its printed lines.
fn output(source: &str) -> Vec<String> {
    let evaluation = Machine::evaluate(source);
    assert!(
        evaluation.failure.is_none(),
        "unexpected failure: {:?}",
        evaluation.failure
    );
    evaluation.output
}

/// Run a snippet that must end in a fault; returns the fault.
fn failure(source: &str) -> RuntimeError {
    Machine::evaluate(source)
        .failure
        .expect("expected the snippet to fail")
}

mod scoping {
    use super::*;

    #[test]
    fn inner_let_shadows_without_leaking() {
        let lines = output(
            "let x = 1;\n{\n  let x = 2;\n  console.log(x);\n}\nconsole.log(x);",
        );
        assert_eq!(lines, vec!["2", "1"]);
    }

    #[test]
    fn const_does_not_escape_its_block() {
        let err = failure("{\n  const scoped = 'inner';\n}\nconsole.log(scoped);");
        assert_eq!(err.kind, ErrorKind::Reference);
        assert!(err.message.contains("scoped"));
    }

    #[test]
    fn const_reassignment_is_a_type_fault() {
        let err = failure("const limit = 10;\nlimit = 20;");
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn same_scope_redeclaration_is_a_syntax_fault() {
        let err = failure("let x = 1;\nlet x = 2;");
        assert_eq!(err.kind, ErrorKind::Syntax);
        // Parse-time fault: nothing ran.
        assert!(Machine::evaluate("console.log(1);\nlet y = 1;\nlet y = 2;")
            .output
            .is_empty());
    }

    #[test]
    fn typeof_undeclared_reports_instead_of_faulting() {
        assert_eq!(output("console.log(typeof missing);"), vec!["undefined"]);
    }
}

mod destructuring {
    use super::*;

    #[test]
    fn object_pattern_with_default_and_rename() {
        let lines = output(
            "const { port, host = 'localhost' } = { port: 8080 };\n\
             console.log(`${host}:${port}`);",
        );
        assert_eq!(lines, vec!["localhost:8080"]);
    }

    #[test]
    fn array_pattern_defaults_fill_missing_positions() {
        let lines = output(
            "const [first, second = 'fallback'] = ['only'];\n\
             console.log(first, second);",
        );
        assert_eq!(lines, vec!["only fallback"]);
    }

    #[test]
    fn rest_elements_collect_the_remainder() {
        let lines = output(
            "const [head, ...tail] = [1, 2, 3];\n\
             const { id, ...rest } = { id: 7, name: 'probe' };\n\
             console.log(tail);\n\
             console.log(rest);",
        );
        assert_eq!(lines, vec!["[ 2, 3 ]", "{ name: 'probe' }"]);
    }

    #[test]
    fn destructuring_nullish_is_a_type_fault() {
        assert_eq!(failure("const { value } = null;").kind, ErrorKind::Type);
    }
}

mod functions {
    use super::*;

    #[test]
    fn rest_parameter_is_a_real_array() {
        let lines = output(
            "function sum(...nums) {\n\
             \x20 let total = 0;\n\
             \x20 for (const n of nums) {\n\
             \x20   total += n;\n\
             \x20 }\n\
             \x20 return total;\n\
             }\n\
             console.log(sum(1, 2, 3));\n\
             console.log(sum());",
        );
        assert_eq!(lines, vec!["6", "0"]);
    }

    #[test]
    fn arrows_close_over_their_defining_scope() {
        let lines = output(
            "const makeCounter = () => {\n\
             \x20 let count = 0;\n\
             \x20 return () => {\n\
             \x20   count += 1;\n\
             \x20   return count;\n\
             \x20 };\n\
             };\n\
             const next = makeCounter();\n\
             console.log(next(), next(), next());",
        );
        assert_eq!(lines, vec!["1 2 3"]);
    }

    #[test]
    fn parameter_defaults_apply_only_to_undefined() {
        let lines = output(
            "const greet = (name = 'anon') => `hi ${name}`;\n\
             console.log(greet());\n\
             console.log(greet('Ada'));",
        );
        assert_eq!(lines, vec!["hi anon", "hi Ada"]);
    }

    #[test]
    fn calling_a_non_function_is_a_type_fault() {
        let err = failure("const n = 4;\nn();");
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.message.contains("n is not a function"));
    }
}

mod spread {
    use super::*;

    #[test]
    fn object_spread_merges_with_stable_key_positions() {
        let lines = output(
            "const merged = { ...{ a: 1, b: 2 }, ...{ b: 3, c: 4 } };\n\
             console.log(merged);",
        );
        assert_eq!(lines, vec!["{ a: 1, b: 3, c: 4 }"]);
    }

    #[test]
    fn array_spread_splices_elements_and_characters() {
        let lines = output(
            "console.log([1, ...[2, 3], 4]);\nconsole.log([...'ab']);",
        );
        assert_eq!(lines, vec!["[ 1, 2, 3, 4 ]", "[ 'a', 'b' ]"]);
    }

    #[test]
    fn spreading_a_non_iterable_is_a_type_fault() {
        assert_eq!(failure("const xs = [...5];").kind, ErrorKind::Type);
    }
}

mod templates {
    use super::*;

    #[test]
    fn interpolation_stringifies_expressions() {
        assert_eq!(
            output("const price = 4;\nconsole.log(`total: ${price * 2 + 1}`);"),
            vec!["total: 9"]
        );
    }

    #[test]
    fn multiline_literals_print_as_separate_lines() {
        assert_eq!(
            output("console.log(`first\nsecond`);"),
            vec!["first", "second"]
        );
    }

    #[test]
    fn arrays_flatten_inside_templates() {
        assert_eq!(
            output("console.log(`got ${[1, 2, 3]}`);"),
            vec!["got 1,2,3"]
        );
    }
}

mod formatting {
    use super::*;

    #[test]
    fn nested_strings_are_quoted_but_top_level_strings_are_bare() {
        assert_eq!(
            output("console.log('plain');\nconsole.log(['plain']);"),
            vec!["plain", "[ 'plain' ]"]
        );
    }

    #[test]
    fn integral_numbers_print_without_a_fraction() {
        assert_eq!(output("console.log(8 / 2, 7 / 2);"), vec!["4 3.5"]);
    }

    #[test]
    fn empty_containers_print_compact() {
        assert_eq!(output("console.log([], {});"), vec!["[] {}"]);
    }
}

mod async_flow {
    use super::*;

    #[test]
    fn timer_callbacks_run_after_synchronous_statements() {
        let lines = output(
            "console.log('start');\n\
             setTimeout(() => {\n\
             \x20 console.log('timeout');\n\
             }, 0);\n\
             console.log('end');",
        );
        assert_eq!(lines, vec!["start", "end", "timeout"]);
    }

    #[test]
    fn timers_fire_in_due_time_order_not_registration_order() {
        let lines = output(
            "setTimeout(() => { console.log('late'); }, 20);\n\
             setTimeout(() => { console.log('early'); }, 5);",
        );
        assert_eq!(lines, vec!["early", "late"]);
    }

    #[test]
    fn then_chain_feeds_each_handler_the_previous_result() {
        let lines = output(
            "Promise.resolve(2)\n\
             \x20 .then((n) => n * 3)\n\
             \x20 .then((n) => { console.log(n); });\n\
             console.log('scheduled');",
        );
        assert_eq!(lines, vec!["scheduled", "6"]);
    }

    #[test]
    fn await_unwraps_fulfillment_values() {
        let lines = output(
            "const fetchCount = async () => 41;\n\
             async function main() {\n\
             \x20 console.log((await fetchCount()) + 1);\n\
             }\n\
             main();",
        );
        assert_eq!(lines, vec!["42"]);
    }

    #[test]
    fn awaiting_a_timer_backed_promise_resumes_after_it_fires() {
        let lines = output(
            "function delay(ms) {\n\
             \x20 return new Promise((resolve) => { setTimeout(resolve, ms); });\n\
             }\n\
             async function run() {\n\
             \x20 console.log('before');\n\
             \x20 await delay(10);\n\
             \x20 console.log('after');\n\
             }\n\
             run();",
        );
        assert_eq!(lines, vec!["before", "after"]);
    }

    #[test]
    fn rejection_surfaces_as_a_throw_at_the_await_site() {
        let lines = output(
            "async function risky() { throw new RangeError('nope'); }\n\
             async function main() {\n\
             \x20 try {\n\
             \x20   await risky();\n\
             \x20 } catch (err) {\n\
             \x20   console.log(err.name);\n\
             \x20 }\n\
             }\n\
             main();",
        );
        assert_eq!(lines, vec!["RangeError"]);
    }

    #[test]
    fn awaiting_a_promise_that_never_settles_is_a_timeout() {
        let err = failure(
            "async function stall() {\n\
             \x20 await new Promise((resolve) => {});\n\
             }\n\
             stall();",
        );
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[test]
    fn infinite_loops_hit_the_operation_budget() {
        assert_eq!(failure("while (true) {}").kind, ErrorKind::Timeout);
    }
}

mod errors {
    use super::*;

    #[test]
    fn catch_binds_the_thrown_error_and_finally_always_runs() {
        let lines = output(
            "try {\n\
             \x20 throw new TypeError('bad port');\n\
             } catch (err) {\n\
             \x20 console.log(`${err.name}: ${err.message}`);\n\
             } finally {\n\
             \x20 console.log('done');\n\
             }",
        );
        assert_eq!(lines, vec!["TypeError: bad port", "done"]);
    }

    #[test]
    fn engine_faults_are_catchable_like_thrown_errors() {
        let lines = output(
            "try {\n\
             \x20 missingThing();\n\
             } catch (err) {\n\
             \x20 console.log(err.name);\n\
             }",
        );
        assert_eq!(lines, vec!["ReferenceError"]);
    }

    #[test]
    fn uncaught_throws_are_classified_by_error_name() {
        let err = failure("throw new RangeError('value out of range');");
        assert_eq!(err.kind, ErrorKind::Range);
        assert_eq!(err.message, "value out of range");
    }

    #[test]
    fn output_before_an_uncaught_fault_is_kept() {
        let evaluation = Machine::evaluate(
            "console.log('fifty');\nthrow new RangeError('too big');",
        );
        assert_eq!(evaluation.output, vec!["fifty"]);
        assert_eq!(
            evaluation.failure.map(|f| f.kind),
            Some(ErrorKind::Range)
        );
    }

    #[test]
    fn malformed_source_is_a_syntax_fault_with_no_output() {
        let evaluation = Machine::evaluate("console.log('never'); let = ;");
        assert!(evaluation.output.is_empty());
        assert_eq!(
            evaluation.failure.map(|f| f.kind),
            Some(ErrorKind::Syntax)
        );
    }
}

mod isolation {
    use super::*;

    #[test]
    fn evaluations_share_nothing() {
        assert_eq!(output("let counter = 1;\nconsole.log(counter);"), vec!["1"]);
        // Same binding name again: a fresh machine has no memory of it.
        assert_eq!(output("let counter = 5;\nconsole.log(counter);"), vec!["5"]);
        assert_eq!(failure("console.log(counter);").kind, ErrorKind::Reference);
    }
}
