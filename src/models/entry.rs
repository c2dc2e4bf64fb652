use serde::{Deserialize, Serialize};

/// A documented language behavior.
///
/// Entries are permanent documentation: the snippets show the behavior, the
/// expectations record what the behavior is, and the verifier re-checks the
/// two against each other. Entries are registered once at load time and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEntry {
    /// Stable short key, unique within the catalog (e.g. `spread-merge-objects`).
    pub id: String,
    pub category: Category,
    /// Human-readable explanation of the documented behavior.
    pub description: String,
    /// Examples in documentation order. Order carries narrative flow, not
    /// correctness; every snippet is verified independently.
    pub snippets: Vec<Snippet>,
}

/// The language area an entry documents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    VariableDeclaration,
    Destructuring,
    SpreadRest,
    TemplateLiteral,
    ArrowFunction,
    AsyncControlFlow,
    ObjectUtility,
    ErrorHandling,
}

impl Category {
    /// All categories, in reporting order.
    pub const ALL: [Category; 8] = [
        Self::VariableDeclaration,
        Self::Destructuring,
        Self::SpreadRest,
        Self::TemplateLiteral,
        Self::ArrowFunction,
        Self::AsyncControlFlow,
        Self::ObjectUtility,
        Self::ErrorHandling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VariableDeclaration => "variable-declaration",
            Self::Destructuring => "destructuring",
            Self::SpreadRest => "spread-rest",
            Self::TemplateLiteral => "template-literal",
            Self::ArrowFunction => "arrow-function",
            Self::AsyncControlFlow => "async-control-flow",
            Self::ObjectUtility => "object-utility",
            Self::ErrorHandling => "error-handling",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "variable-declaration" => Some(Self::VariableDeclaration),
            "destructuring" => Some(Self::Destructuring),
            "spread-rest" => Some(Self::SpreadRest),
            "template-literal" => Some(Self::TemplateLiteral),
            "arrow-function" => Some(Self::ArrowFunction),
            "async-control-flow" => Some(Self::AsyncControlFlow),
            "object-utility" => Some(Self::ObjectUtility),
            "error-handling" => Some(Self::ErrorHandling),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One literal, runnable example.
///
/// A snippet must declare at least one expectation: non-empty
/// `expected_output`, or `may_throw` (optionally narrowed by `fails_with`).
/// A snippet with neither is rejected at catalog load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    /// The exact statement block to execute.
    pub source: String,
    /// Expected printed lines, in completion order (not source order — timer
    /// and promise callbacks log when they run, not where they appear).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_output: Vec<String>,
    /// Whether an uncaught failure is the documented, correct behavior.
    #[serde(default)]
    pub may_throw: bool,
    /// When set, the documented failure must be of this kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fails_with: Option<ErrorKind>,
}

impl Snippet {
    /// True when the snippet declares no expectation at all.
    pub fn is_malformed(&self) -> bool {
        self.expected_output.is_empty() && !self.may_throw
    }
}

/// Classification of a runtime fault observed while evaluating a snippet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Access to an undeclared binding, or access before declaration.
    Reference,
    /// Operation on a value of the wrong kind (includes `const` reassignment).
    Type,
    Range,
    /// Malformed source; detected when the snippet is parsed, not during
    /// execution.
    Syntax,
    /// Evaluation or scheduled asynchronous work did not settle in budget.
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Type => "type",
            Self::Range => "range",
            Self::Syntax => "syntax",
            Self::Timeout => "timeout",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "reference" => Some(Self::Reference),
            "type" => Some(Self::Type),
            "range" => Some(Self::Range),
            "syntax" => Some(Self::Syntax),
            "timeout" => Some(Self::Timeout),
            _ => None,
        }
    }

    /// The error-name label the snippet language itself uses, e.g. in the
    /// `name` property of a caught error value.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reference => "ReferenceError",
            Self::Type => "TypeError",
            Self::Range => "RangeError",
            Self::Syntax => "SyntaxError",
            Self::Timeout => "Timeout",
        }
    }

    /// Inverse of [`ErrorKind::label`], used to classify uncaught thrown
    /// error values by their `name` property.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ReferenceError" => Some(Self::Reference),
            "TypeError" => Some(Self::Type),
            "RangeError" => Some(Self::Range),
            "SyntaxError" => Some(Self::Syntax),
            "Timeout" => Some(Self::Timeout),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_str("metaprogramming"), None);
    }

    #[test]
    fn snippet_without_expectation_is_malformed() {
        let snippet = Snippet {
            source: "console.log(1);".to_string(),
            expected_output: vec![],
            may_throw: false,
            fails_with: None,
        };
        assert!(snippet.is_malformed());
    }
}
