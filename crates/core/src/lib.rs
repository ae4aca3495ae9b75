//! accord-core: contract pattern engine.
//!
//! Represents an API schema as a tree of composable patterns and uses
//! that tree three ways: matching real payloads against the schema,
//! generating representative (and boundary-violating) sample payloads,
//! and computing backward-compatibility differences between two contract
//! versions.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root:
//!
//! - [`Pattern`] -- schema nodes: match / generate / derive variants
//! - [`Value`] -- the runtime payload model
//! - [`Resolver`] / [`PatternRegistry`] -- named-pattern resolution with
//!   cycle prevention
//! - [`MultiPartPattern`] -- multipart form-field patterns
//! - [`Contract`] -- a pattern-tree bundle with interchange JSON support
//! - [`find_differences`] -- the compatibility diff engine
//! - [`difference`] / [`CompatibilityReport`] -- classified outcomes with
//!   deterministic exit codes

pub mod contract;
pub mod diff;
pub mod error;
pub mod multipart;
pub mod pattern;
pub mod report;
pub mod resolver;
pub mod result;
pub mod row;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use contract::Contract;
pub use diff::{encompasses, find_differences};
pub use error::PatternError;
pub use multipart::{ArrayPart, ContentPart, FilePart, MultiPartPattern};
pub use pattern::{is_optional, without_optionality, Pattern};
pub use report::{difference, CompatibilityReport};
pub use resolver::{GenerationPolicy, PatternRegistry, Resolver};
pub use result::{DiffResults, FailureReason, MatchFailure, MatchResult};
pub use row::Row;
pub use value::{Value, XmlItem, XmlNode};
