//! Filter error types.

use thiserror::Error;

/// Error returned when a filter criterion cannot be built.
///
/// These are validation errors: they describe bad input and are surfaced
/// before any entity is evaluated. A path that simply does not resolve on
/// some entity is not an error, the entity just does not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The entity-variant tag is not one of the known variants.
    #[error("unknown model type: {0} (expected one of: nomenclature, group, range, receipt)")]
    UnknownKind(String),
    /// No entity-variant tag was supplied.
    #[error("missing model type")]
    MissingKind,
    /// The comparison mode tag is not recognised.
    #[error("unknown filter type: {0} (expected equals or like)")]
    UnknownMode(String),
    /// Neither a field name nor a nested path was supplied.
    #[error("criterion needs a field name or a nested path")]
    MissingField,
    /// A nested path contains an empty segment (e.g. `group..name`).
    #[error("invalid nested path: {0}")]
    InvalidPath(String),
}
