//! Plain-text rendering of verification runs and catalog entries.

use crate::models::{Category, FeatureEntry};
use crate::verify::{SnippetOutcome, VerificationResult};

/// True when every outcome passed (matches and documented failures both
/// count as passing).
pub fn all_passed(outcomes: &[SnippetOutcome]) -> bool {
    outcomes.iter().all(|o| o.result.passed())
}

/// Render a full verification run: per-category tallies, one detail block
/// per mismatch, and a summary line.
pub fn render(outcomes: &[SnippetOutcome]) -> String {
    let mut out = String::new();

    for category in Category::ALL {
        let in_category: Vec<&SnippetOutcome> = outcomes
            .iter()
            .filter(|o| o.category == category)
            .collect();
        if in_category.is_empty() {
            continue;
        }
        let passed = in_category.iter().filter(|o| o.result.passed()).count();
        out.push_str(&format!(
            "{:<22} {} passed, {} failed\n",
            category.as_str(),
            passed,
            in_category.len() - passed
        ));
    }

    for outcome in outcomes {
        let VerificationResult::Mismatch(detail) = &outcome.result else {
            continue;
        };
        out.push_str(&format!(
            "\nFAIL {} #{} ({})\n",
            outcome.entry_id,
            outcome.index + 1,
            outcome.category
        ));
        push_lines(&mut out, "  expected output:", &detail.expected_output);
        match (detail.may_throw, detail.expected_failure) {
            (true, Some(kind)) => {
                out.push_str(&format!("  expected failure: {kind}\n"));
            }
            (true, None) => out.push_str("  failure permitted (any kind)\n"),
            (false, _) => {}
        }
        push_lines(&mut out, "  observed output:", &detail.observed_output);
        match &detail.observed_failure {
            Some(failure) => out.push_str(&format!("  observed failure: {failure}\n")),
            None => out.push_str("  observed failure: none\n"),
        }
    }

    let total = outcomes.len();
    let passed = outcomes.iter().filter(|o| o.result.passed()).count();
    let documented_failures = outcomes
        .iter()
        .filter(|o| matches!(o.result, VerificationResult::ExpectedFailure { .. }))
        .count();
    out.push_str(&format!(
        "\n{total} snippets: {passed} passed ({documented_failures} documented failures), {} failed\n",
        total - passed
    ));
    out
}

/// Render one catalog entry: description, then each snippet with its
/// source and expectations.
pub fn render_entry(entry: &FeatureEntry) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", entry.id, entry.category));
    out.push_str(&format!("{}\n", entry.description));
    for (i, snippet) in entry.snippets.iter().enumerate() {
        out.push_str(&format!("\nsnippet #{}:\n", i + 1));
        for line in snippet.source.lines() {
            out.push_str(&format!("    {line}\n"));
        }
        push_lines(&mut out, "  expected output:", &snippet.expected_output);
        if snippet.may_throw {
            match snippet.fails_with {
                Some(kind) => out.push_str(&format!("  may fail with: {kind}\n")),
                None => out.push_str("  may fail\n"),
            }
        }
    }
    out
}

/// Render a catalog listing line per entry.
pub fn render_listing(entries: &[&FeatureEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{:<28} {:<22} {} snippet(s)\n",
            entry.id,
            entry.category.as_str(),
            entry.snippets.len()
        ));
    }
    out
}

fn push_lines(out: &mut String, header: &str, lines: &[String]) {
    out.push_str(header);
    if lines.is_empty() {
        out.push_str(" (none)\n");
        return;
    }
    out.push('\n');
    for line in lines {
        out.push_str(&format!("    | {line}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;
    use crate::verify::MismatchDetail;

    fn outcome(category: Category, result: VerificationResult) -> SnippetOutcome {
        SnippetOutcome {
            entry_id: "sample-feature".to_string(),
            category,
            index: 0,
            result,
        }
    }

    #[test]
    fn clean_run_renders_tallies_and_summary() {
        let outcomes = vec![
            outcome(Category::SpreadRest, VerificationResult::Match),
            outcome(
                Category::ErrorHandling,
                VerificationResult::ExpectedFailure {
                    kind: ErrorKind::Range,
                },
            ),
        ];
        let text = render(&outcomes);
        assert!(text.contains("spread-rest"));
        assert!(text.contains("2 snippets: 2 passed (1 documented failures), 0 failed"));
        assert!(!text.contains("FAIL"));
        assert!(all_passed(&outcomes));
    }

    #[test]
    fn mismatch_renders_both_sides() {
        let outcomes = vec![outcome(
            Category::TemplateLiteral,
            VerificationResult::Mismatch(Box::new(MismatchDetail {
                expected_output: vec!["total: 9".to_string()],
                expected_failure: None,
                may_throw: false,
                observed_output: vec!["total: 8".to_string()],
                observed_failure: None,
            })),
        )];
        let text = render(&outcomes);
        assert!(text.contains("FAIL sample-feature #1 (template-literal)"));
        assert!(text.contains("| total: 9"));
        assert!(text.contains("| total: 8"));
        assert!(!all_passed(&outcomes));
    }
}
