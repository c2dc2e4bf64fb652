//! Verification scoring and whole-catalog runs.

use primer::catalog::seed;
use primer::models::{ErrorKind, Snippet};
use primer::report;
use primer::verify::{verify, verify_all, VerificationResult, VerifyConfig};

fn prints(source: &str, lines: &[&str]) -> Snippet {
    Snippet {
        source: source.to_string(),
        expected_output: lines.iter().map(|l| l.to_string()).collect(),
        may_throw: false,
        fails_with: None,
    }
}

fn faults(source: &str, kind: ErrorKind) -> Snippet {
    Snippet {
        source: source.to_string(),
        expected_output: vec![],
        may_throw: true,
        fails_with: Some(kind),
    }
}

mod scoring {
    use super::*;

    #[test]
    fn matching_output_scores_match() {
        let snippet = prints(
            "const merged = { ...{ a: 1, b: 2 }, ...{ b: 3, c: 4 } };\nconsole.log(merged);",
            &["{ a: 1, b: 3, c: 4 }"],
        );
        assert_eq!(verify(&snippet), VerificationResult::Match);
    }

    #[test]
    fn documented_failure_scores_expected_failure() {
        let snippet = faults(
            "{\n  const scoped = 'inner';\n}\nconsole.log(scoped);",
            ErrorKind::Reference,
        );
        assert_eq!(
            verify(&snippet),
            VerificationResult::ExpectedFailure {
                kind: ErrorKind::Reference
            }
        );
    }

    #[test]
    fn wrong_output_scores_mismatch_with_both_sides() {
        let snippet = prints("console.log(1 + 1);", &["3"]);
        let VerificationResult::Mismatch(detail) = verify(&snippet) else {
            panic!("expected a mismatch");
        };
        assert_eq!(detail.expected_output, vec!["3"]);
        assert_eq!(detail.observed_output, vec!["2"]);
        assert!(detail.observed_failure.is_none());
    }

    #[test]
    fn undocumented_failure_scores_mismatch() {
        let snippet = prints("console.log(nope);", &["anything"]);
        let VerificationResult::Mismatch(detail) = verify(&snippet) else {
            panic!("expected a mismatch");
        };
        let failure = detail.observed_failure.expect("failure recorded");
        assert_eq!(failure.kind, ErrorKind::Reference);
    }

    #[test]
    fn failure_of_the_wrong_kind_scores_mismatch() {
        // Reassigning a const is a type fault, not a range fault.
        let snippet = faults("const limit = 1;\nlimit = 2;", ErrorKind::Range);
        assert!(matches!(verify(&snippet), VerificationResult::Mismatch(_)));
    }

    #[test]
    fn documented_failure_that_does_not_happen_scores_mismatch() {
        let snippet = faults("console.log('fine');", ErrorKind::Type);
        let VerificationResult::Mismatch(detail) = verify(&snippet) else {
            panic!("expected a mismatch");
        };
        assert!(detail.observed_failure.is_none());
        assert_eq!(detail.observed_output, vec!["fine"]);
    }

    #[test]
    fn may_throw_with_output_permits_but_does_not_require_the_failure() {
        let mut snippet = prints(
            "console.log('50');\nthrow new RangeError('too big');",
            &["50"],
        );
        snippet.may_throw = true;
        snippet.fails_with = Some(ErrorKind::Range);
        assert_eq!(
            verify(&snippet),
            VerificationResult::ExpectedFailure {
                kind: ErrorKind::Range
            }
        );

        // Same expectations, no fault: still passing.
        let mut clean = prints("console.log('50');", &["50"]);
        clean.may_throw = true;
        clean.fails_with = Some(ErrorKind::Range);
        assert_eq!(verify(&clean), VerificationResult::Match);
    }

    #[test]
    fn runaway_snippet_scores_a_documented_timeout() {
        let snippet = faults("while (true) {}", ErrorKind::Timeout);
        assert_eq!(
            verify(&snippet),
            VerificationResult::ExpectedFailure {
                kind: ErrorKind::Timeout
            }
        );
    }

    #[test]
    fn verification_is_idempotent() {
        let snippet = prints("let n = 2;\nn += 3;\nconsole.log(n);", &["5"]);
        let first = verify(&snippet);
        let second = verify(&snippet);
        assert_eq!(first, second);
        assert_eq!(first, VerificationResult::Match);
    }
}

mod whole_catalog {
    use super::*;

    #[test]
    fn verify_all_runs_from_a_sync_context() {
        let catalog = seed();
        let outcomes = tokio_test::block_on(verify_all(&catalog, &VerifyConfig::default()));
        assert_eq!(outcomes.len(), catalog.snippet_count());
    }

    #[tokio::test]
    async fn seed_catalog_verifies_clean() {
        let catalog = seed();
        let outcomes = verify_all(&catalog, &VerifyConfig::default()).await;

        assert_eq!(outcomes.len(), catalog.snippet_count());
        let rendered = report::render(&outcomes);
        assert!(
            report::all_passed(&outcomes),
            "seed catalog has mismatches:\n{rendered}"
        );
    }

    #[tokio::test]
    async fn outcomes_arrive_in_catalog_order() {
        let catalog = seed();
        let outcomes = verify_all(&catalog, &VerifyConfig::default()).await;

        let mut expected = Vec::new();
        for entry in catalog.all() {
            for index in 0..entry.snippets.len() {
                expected.push((entry.id.clone(), index));
            }
        }
        let observed: Vec<(String, usize)> = outcomes
            .iter()
            .map(|o| (o.entry_id.clone(), o.index))
            .collect();
        assert_eq!(observed, expected);
    }

    #[tokio::test]
    async fn one_mismatch_fails_the_run_but_not_the_rest() {
        let mut catalog = primer::catalog::Catalog::new();
        catalog
            .register(primer::models::FeatureEntry {
                id: "mixed".to_string(),
                category: primer::models::Category::TemplateLiteral,
                description: "one good snippet, one stale one".to_string(),
                snippets: vec![
                    prints("console.log(`ok`);", &["ok"]),
                    prints("console.log('new output');", &["stale expectation"]),
                ],
            })
            .expect("register failed");

        let outcomes = verify_all(&catalog, &VerifyConfig::default()).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.passed());
        assert!(!outcomes[1].result.passed());
        assert!(!report::all_passed(&outcomes));
    }
}
