//! Domain models for the feature catalog.
//!
//! # Core Concepts
//!
//! - [`FeatureEntry`]: one documented language behavior — an explanation plus
//!   the literal snippets that demonstrate it.
//! - [`Snippet`]: one runnable example with its documented expectation:
//!   ordered output lines, a documented failure, or both.
//! - [`Category`]: the closed set of language areas the catalog covers.
//! - [`ErrorKind`]: the closed taxonomy of runtime faults a snippet can be
//!   documented to fail with (and that the engine classifies faults into).
//!
//! The catalog is built once at startup and is read-only afterwards; these
//! types carry no runtime mutability of their own.

mod entry;

pub use entry::*;
