//! Reference entities: groups, units, locations, items and recipes.
//!
//! Entities refer to each other through shared [`Arc`] handles rather than
//! by copy, so a group renamed in the store is the same group every item
//! points at. Every entity has a stable `unique_code` (its identity) and a
//! display `name`.

use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// Capability of exposing a display name.
///
/// Implemented only by entities that actually have one. Filtering compares
/// against the display name whenever a resolved value implements this trait,
/// and falls back to the value's string form otherwise.
pub trait Nameable {
    /// The human-readable name.
    fn display_name(&self) -> &str;
}

/// A nomenclature group (e.g. "Flour", "Dairy").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Stable identity.
    pub unique_code: String,
    /// Display name.
    pub name: String,
    /// Optional parent group.
    pub parent: Option<Arc<Group>>,
}

impl Group {
    /// Create a top-level group.
    #[must_use]
    pub fn new(unique_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unique_code: unique_code.into(),
            name: name.into(),
            parent: None,
        }
    }

    /// Attach a parent group.
    #[must_use]
    pub fn with_parent(mut self, parent: Arc<Self>) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// A unit of measure, optionally expressed as a multiple of a base unit.
///
/// A kilogram is a unit with `value = 1000` and `base = gram`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Stable identity.
    pub unique_code: String,
    /// Display name.
    pub name: String,
    /// Conversion factor to the base unit.
    pub value: u32,
    /// Base unit, if this unit is derived.
    pub base: Option<Arc<Unit>>,
}

impl Unit {
    /// Create a base unit (conversion factor 1).
    #[must_use]
    pub fn new(unique_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unique_code: unique_code.into(),
            name: name.into(),
            value: 1,
            base: None,
        }
    }

    /// Create a unit derived from `base`.
    #[must_use]
    pub fn derived(
        unique_code: impl Into<String>,
        name: impl Into<String>,
        value: u32,
        base: Arc<Self>,
    ) -> Self {
        Self {
            unique_code: unique_code.into(),
            name: name.into(),
            value,
            base: Some(base),
        }
    }

    /// Walk up the base chain and return the root unit.
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Some(base) = current.base.as_deref() {
            current = base;
        }
        current
    }
}

/// A storage location (warehouse).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Stable identity.
    pub unique_code: String,
    /// Display name.
    pub name: String,
}

impl Location {
    /// Create a location.
    #[must_use]
    pub fn new(unique_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unique_code: unique_code.into(),
            name: name.into(),
        }
    }
}

/// A stock-keeping item (nomenclature).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Stable identity.
    pub unique_code: String,
    /// Display name.
    pub name: String,
    /// Group the item belongs to.
    pub group: Option<Arc<Group>>,
    /// Default unit of measure.
    pub unit: Option<Arc<Unit>>,
}

impl Item {
    /// Create an item with no group and no unit.
    #[must_use]
    pub fn new(unique_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unique_code: unique_code.into(),
            name: name.into(),
            group: None,
            unit: None,
        }
    }

    /// Set the group.
    #[must_use]
    pub fn with_group(mut self, group: Arc<Group>) -> Self {
        self.group = Some(group);
        self
    }

    /// Set the default unit.
    #[must_use]
    pub fn with_unit(mut self, unit: Arc<Unit>) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionLine {
    /// The ingredient.
    pub item: Arc<Item>,
    /// Unit the quantity is expressed in.
    pub unit: Arc<Unit>,
    /// Quantity of the ingredient.
    pub value: Decimal,
}

impl CompositionLine {
    /// Create a composition line.
    #[must_use]
    pub const fn new(item: Arc<Item>, unit: Arc<Unit>, value: Decimal) -> Self {
        Self { item, unit, value }
    }
}

impl fmt::Display for CompositionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.item.name, self.value, self.unit.name)
    }
}

/// A recipe: a named composition of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// Stable identity.
    pub unique_code: String,
    /// Display name.
    pub name: String,
    /// Number of portions the recipe yields.
    pub portions: u32,
    /// Free-form cooking time (e.g. "20 min").
    pub cooking_time: String,
    /// Preparation steps in order.
    pub steps: Vec<String>,
    /// Ingredient lines.
    pub composition: Vec<CompositionLine>,
}

impl Recipe {
    /// Create an empty recipe.
    #[must_use]
    pub fn new(unique_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unique_code: unique_code.into(),
            name: name.into(),
            portions: 1,
            cooking_time: String::new(),
            steps: Vec::new(),
            composition: Vec::new(),
        }
    }

    /// Append an ingredient line.
    #[must_use]
    pub fn with_line(mut self, line: CompositionLine) -> Self {
        self.composition.push(line);
        self
    }

    /// Append a preparation step.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }
}

macro_rules! impl_nameable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Nameable for $ty {
                fn display_name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

impl_nameable!(Group, Unit, Location, Item, Recipe);
