//! The feature catalog: an in-memory registry of [`FeatureEntry`] values.
//!
//! The catalog is built once — from the built-in [`seed`] set or from a JSON
//! definition file — and is immutable afterwards. Construction is fail-fast:
//! any invalid definition aborts the whole load, never yielding a partial
//! catalog.

mod seed;

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::models::{Category, FeatureEntry, Snippet};

pub use seed::seed;

/// Catalog construction and lookup faults.
///
/// The construction variants (`DuplicateId`, `InvalidCategory`,
/// `EmptySnippet`, `Io`, `Parse`) are fatal at load time. `NotFound` is the
/// one recoverable variant, surfaced to lookup callers.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate feature id `{0}`")]
    DuplicateId(String),
    #[error("unknown category `{0}`")]
    InvalidCategory(String),
    #[error("feature `{0}` has a snippet with no expectation (no expected output, may_throw false)")]
    EmptySnippet(String),
    #[error("no feature with id `{0}`")]
    NotFound(String),
    #[error("failed to read catalog definitions: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog definitions: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A feature definition as it appears in a definition file, before the
/// category string has been checked against the closed set.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RawEntry {
    pub id: String,
    pub category: String,
    pub description: String,
    pub snippets: Vec<Snippet>,
}

/// The registry. Registration order is preserved and is the order every
/// listing and verification run uses.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<FeatureEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. The catalog is unchanged when this fails.
    pub fn register(&mut self, entry: FeatureEntry) -> Result<(), CatalogError> {
        if self.index.contains_key(&entry.id) {
            return Err(CatalogError::DuplicateId(entry.id));
        }
        if entry.snippets.is_empty() || entry.snippets.iter().any(Snippet::is_malformed) {
            return Err(CatalogError::EmptySnippet(entry.id));
        }
        debug!(id = %entry.id, category = %entry.category, "registering feature");
        self.index.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&FeatureEntry, CatalogError> {
        self.index
            .get(id)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Entries of one category, in registration order. Empty when none match.
    pub fn list_by_category(&self, category: Category) -> Vec<&FeatureEntry> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// The full catalog, in registration order.
    pub fn all(&self) -> &[FeatureEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of snippets across all entries.
    pub fn snippet_count(&self) -> usize {
        self.entries.iter().map(|e| e.snippets.len()).sum()
    }

    /// Build a catalog from raw definitions. Any fault aborts the whole load.
    pub fn load(defs: Vec<RawEntry>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for def in defs {
            let category = Category::from_str(&def.category)
                .ok_or(CatalogError::InvalidCategory(def.category))?;
            catalog.register(FeatureEntry {
                id: def.id,
                category,
                description: def.description,
                snippets: def.snippets,
            })?;
        }
        debug!(
            features = catalog.len(),
            snippets = catalog.snippet_count(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Read a JSON definition file (an array of entries) and load it.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        let defs: Vec<RawEntry> = serde_json::from_str(&text)?;
        Self::load(defs)
    }
}
