//! Field-path filtering over stockledger entities.
//!
//! A [`FilterCriterion`] names an entity variant, a field (or a dotted
//! nested path), a value and a comparison mode. [`apply`] returns the
//! entities that satisfy it, in input order.
//!
//! Nested paths walk through referenced entities and through lists. When a
//! list is met mid-path the criterion matches if *any* element satisfies the
//! rest of the path, so `composition.nomenclature.name` finds every recipe
//! with at least one ingredient of that name.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stockledger_core::{Group, Item};
//! use stockledger_filter::{apply, FilterCriterion};
//!
//! let bakery = Arc::new(Group::new("bakery", "Bakery"));
//! let items = vec![
//!     Arc::new(Item::new("flour", "Flour").with_group(bakery)),
//!     Arc::new(Item::new("milk", "Milk")),
//! ];
//!
//! let found = apply(&items, &FilterCriterion::by_group_name("bake"));
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].unique_code, "flour");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod criterion;
pub mod engine;
pub mod error;
pub mod field;

pub use criterion::{CriterionDescription, EntityKind, FilterCriterion, FilterMode};
pub use engine::{apply, matches, Entity, Filterable};
pub use error::FilterError;
pub use field::{supported_fields, FieldCatalogue, FieldValue, Node};
