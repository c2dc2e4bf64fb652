//! Snippet verification: run every example and score what actually
//! happened against what the catalog documents.
//!
//! Scoring rules:
//! - A clean run whose printed lines equal `expected_output` is a `Match`.
//! - A fault is acceptable only when the snippet declares `may_throw`, and
//!   only of the `fails_with` kind when one is declared; lines printed
//!   before the fault must still equal `expected_output`. That scores as
//!   `ExpectedFailure`.
//! - Everything else is a `Mismatch`, carrying both sides for the report.
//! - A snippet that declares `may_throw` with no expected output documents
//!   a failure; running cleanly is itself a `Mismatch`.

use std::time::Duration;

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::interp::{Machine, RuntimeError};
use crate::models::{Category, ErrorKind, Snippet};

/// Knobs for a verification run.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Wall-clock ceiling per snippet. The engine's own budgets catch most
    /// runaway snippets; this is the outer guard around the worker thread.
    pub timeout: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// How one snippet scored.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationResult {
    /// Ran cleanly and printed exactly the documented lines.
    Match,
    /// Failed, and the failure is documented behavior.
    ExpectedFailure { kind: ErrorKind },
    /// Documentation and observation disagree.
    Mismatch(Box<MismatchDetail>),
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        !matches!(self, VerificationResult::Mismatch(_))
    }
}

/// Both sides of a disagreement, for the report.
#[derive(Debug, Clone, PartialEq)]
pub struct MismatchDetail {
    pub expected_output: Vec<String>,
    pub expected_failure: Option<ErrorKind>,
    pub may_throw: bool,
    pub observed_output: Vec<String>,
    pub observed_failure: Option<RuntimeError>,
}

/// The scored result of one snippet, tagged with where it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetOutcome {
    pub entry_id: String,
    pub category: Category,
    /// Position of the snippet within its entry.
    pub index: usize,
    pub result: VerificationResult,
}

/// Evaluate one snippet in a fresh machine and score it.
pub fn verify(snippet: &Snippet) -> VerificationResult {
    let evaluation = Machine::evaluate(&snippet.source);
    score(snippet, evaluation.output, evaluation.failure)
}

fn score(
    snippet: &Snippet,
    observed_output: Vec<String>,
    observed_failure: Option<RuntimeError>,
) -> VerificationResult {
    let output_matches = observed_output == snippet.expected_output;
    match &observed_failure {
        None => {
            // A may_throw snippet with no expected output documents a
            // failure that did not happen.
            let failure_was_required = snippet.may_throw && snippet.expected_output.is_empty();
            if output_matches && !failure_was_required {
                return VerificationResult::Match;
            }
        }
        Some(failure) => {
            let kind_allowed = snippet
                .fails_with
                .map(|expected| expected == failure.kind)
                .unwrap_or(true);
            if snippet.may_throw && kind_allowed && output_matches {
                return VerificationResult::ExpectedFailure { kind: failure.kind };
            }
        }
    }
    VerificationResult::Mismatch(Box::new(MismatchDetail {
        expected_output: snippet.expected_output.clone(),
        expected_failure: snippet.fails_with,
        may_throw: snippet.may_throw,
        observed_output,
        observed_failure,
    }))
}

/// Verify the whole catalog, one outcome per snippet, in catalog order.
///
/// Snippets are independent, so they fan out across blocking workers; each
/// is collected under a wall-clock timeout. A snippet that blows the
/// timeout scores as a `Timeout` mismatch and its worker is abandoned,
/// never joined. Outcomes are in catalog order regardless of completion
/// order.
pub async fn verify_all(catalog: &Catalog, config: &VerifyConfig) -> Vec<SnippetOutcome> {
    let mut workers = Vec::with_capacity(catalog.snippet_count());
    for feature in catalog.all() {
        for (index, snippet) in feature.snippets.iter().enumerate() {
            let task = {
                let snippet = snippet.clone();
                tokio::task::spawn_blocking(move || verify(&snippet))
            };
            workers.push((feature, index, snippet, task));
        }
    }

    let mut outcomes = Vec::with_capacity(workers.len());
    for (feature, index, snippet, task) in workers {
        let result = match tokio::time::timeout(config.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                warn!(id = %feature.id, index, error = %join_err, "verification worker failed");
                timeout_mismatch(snippet, "verification worker failed")
            }
            Err(_) => {
                warn!(id = %feature.id, index, "snippet exceeded the verification deadline");
                timeout_mismatch(snippet, "snippet exceeded the verification deadline")
            }
        };
        debug!(
            id = %feature.id,
            index,
            passed = result.passed(),
            "verified snippet"
        );
        outcomes.push(SnippetOutcome {
            entry_id: feature.id.clone(),
            category: feature.category,
            index,
            result,
        });
    }
    outcomes
}

fn timeout_mismatch(snippet: &Snippet, message: &str) -> VerificationResult {
    VerificationResult::Mismatch(Box::new(MismatchDetail {
        expected_output: snippet.expected_output.clone(),
        expected_failure: snippet.fails_with,
        may_throw: snippet.may_throw,
        observed_output: Vec::new(),
        observed_failure: Some(RuntimeError::timeout(message)),
    }))
}
