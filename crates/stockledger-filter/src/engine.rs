//! Criterion evaluation.

use std::sync::Arc;
use tracing::debug;

use stockledger_core::{Group, Item, Recipe, Unit};

use crate::criterion::{FilterCriterion, Selector};
use crate::field::{FieldValue, Node};

/// Anything that can be viewed as a filterable entity.
pub trait Filterable {
    /// Borrow the entity as a traversal node.
    fn node(&self) -> Node<'_>;
}

impl Filterable for Item {
    fn node(&self) -> Node<'_> {
        Node::Item(self)
    }
}

impl Filterable for Group {
    fn node(&self) -> Node<'_> {
        Node::Group(self)
    }
}

impl Filterable for Unit {
    fn node(&self) -> Node<'_> {
        Node::Unit(self)
    }
}

impl Filterable for Recipe {
    fn node(&self) -> Node<'_> {
        Node::Recipe(self)
    }
}

impl<T: Filterable + ?Sized> Filterable for Arc<T> {
    fn node(&self) -> Node<'_> {
        (**self).node()
    }
}

impl<T: Filterable + ?Sized> Filterable for &T {
    fn node(&self) -> Node<'_> {
        (**self).node()
    }
}

/// A shared handle to any filterable entity variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// An item.
    Item(Arc<Item>),
    /// A group.
    Group(Arc<Group>),
    /// A unit of measure.
    Unit(Arc<Unit>),
    /// A recipe.
    Recipe(Arc<Recipe>),
}

impl Entity {
    /// The entity's code.
    #[must_use]
    pub fn unique_code(&self) -> &str {
        match self {
            Self::Item(v) => &v.unique_code,
            Self::Group(v) => &v.unique_code,
            Self::Unit(v) => &v.unique_code,
            Self::Recipe(v) => &v.unique_code,
        }
    }

    /// The entity's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Item(v) => &v.name,
            Self::Group(v) => &v.name,
            Self::Unit(v) => &v.name,
            Self::Recipe(v) => &v.name,
        }
    }
}

impl Filterable for Entity {
    fn node(&self) -> Node<'_> {
        match self {
            Self::Item(v) => Node::Item(v),
            Self::Group(v) => Node::Group(v),
            Self::Unit(v) => Node::Unit(v),
            Self::Recipe(v) => Node::Recipe(v),
        }
    }
}

/// Return the entities matching `criterion`, in input order.
///
/// The input is never modified; matching entities are cloned out (for
/// `Arc` handles this is a reference-count bump).
pub fn apply<E: Filterable + Clone>(entities: &[E], criterion: &FilterCriterion) -> Vec<E> {
    let matched: Vec<E> = entities
        .iter()
        .filter(|entity| matches(*entity, criterion))
        .cloned()
        .collect();
    debug!(
        criterion = %criterion,
        total = entities.len(),
        matched = matched.len(),
        "applied filter"
    );
    matched
}

/// Whether a single entity matches `criterion`.
pub fn matches<E: Filterable + ?Sized>(entity: &E, criterion: &FilterCriterion) -> bool {
    let node = entity.node();
    let Some(kind) = node.entity_kind() else {
        return false;
    };
    match criterion.selector(kind) {
        Selector::Universal(accessor) => match accessor(node) {
            FieldValue::Text(text) => criterion.compare(&text),
            _ => false,
        },
        Selector::Specific(accessor) => matches_terminal(accessor(node), criterion),
        Selector::Nested => matches_path(node, criterion.path(), criterion),
        Selector::Never => false,
    }
}

/// Compare a resolved value; lists match if any element does.
fn matches_terminal(value: FieldValue<'_>, criterion: &FilterCriterion) -> bool {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        let hit = match value {
            FieldValue::Null => false,
            FieldValue::Text(text) => criterion.compare(&text),
            FieldValue::Node(node) => criterion.compare(&node.comparable_text()),
            FieldValue::List(items) => {
                pending.extend(items);
                false
            }
        };
        if hit {
            return true;
        }
    }
    false
}

/// Walk `path` from `root`, forking at every list.
///
/// The worklist holds `(segments consumed, value)` pairs. A list met
/// before the end of the path pushes each element with the same depth, so
/// the remaining segments are tried against every element and one hit is
/// enough. Nulls, missing attributes and scalars met mid-path drop that
/// branch without failing the others.
fn matches_path(root: Node<'_>, path: &[String], criterion: &FilterCriterion) -> bool {
    let mut work: Vec<(usize, FieldValue<'_>)> = vec![(0, FieldValue::Node(root))];

    while let Some((depth, value)) = work.pop() {
        if depth == path.len() {
            if matches_terminal(value, criterion) {
                return true;
            }
            continue;
        }
        match value {
            FieldValue::Null | FieldValue::Text(_) => {}
            FieldValue::List(items) => {
                // Reverse so elements are visited in list order.
                work.extend(items.into_iter().rev().map(|item| (depth, item)));
            }
            FieldValue::Node(node) => {
                if let Some(next) = node.attribute(&path[depth]) {
                    work.push((depth + 1, next));
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{EntityKind, FilterMode};
    use rust_decimal_macros::dec;
    use stockledger_core::CompositionLine;

    fn gram() -> Arc<Unit> {
        Arc::new(Unit::new("g", "gram"))
    }

    fn recipe_with(code: &str, ingredients: &[&str]) -> Recipe {
        let mut recipe = Recipe::new(code, code);
        for name in ingredients {
            let item = Arc::new(Item::new(name.to_lowercase(), *name));
            recipe = recipe.with_line(CompositionLine::new(item, gram(), dec!(100)));
        }
        recipe
    }

    #[test]
    fn test_list_fork_is_existential() {
        let with_flour = recipe_with("pancakes", &["Milk", "Eggs", "Wheat Flour"]);
        let without = recipe_with("omelette", &["Milk", "Eggs"]);
        let c = FilterCriterion::nested(
            EntityKind::Recipe,
            "composition.nomenclature.name",
            "flour",
            FilterMode::Contains,
        )
        .unwrap();

        assert!(matches(&with_flour, &c));
        assert!(!matches(&without, &c));
    }

    #[test]
    fn test_empty_list_does_not_match() {
        let empty = recipe_with("water", &[]);
        let c = FilterCriterion::nested(
            EntityKind::Recipe,
            "composition.nomenclature.name",
            "",
            FilterMode::Contains,
        )
        .unwrap();
        assert!(!matches(&empty, &c));
    }

    #[test]
    fn test_null_intermediate_is_a_miss() {
        let item = Item::new("salt", "Salt");
        let c = FilterCriterion::by_group_name("spices");
        assert!(!matches(&item, &c));
    }

    #[test]
    fn test_scalar_mid_path_is_a_miss() {
        let recipe = recipe_with("bread", &["Flour"]);
        let c = FilterCriterion::nested(
            EntityKind::Recipe,
            "portions.name",
            "1",
            FilterMode::Contains,
        )
        .unwrap();
        assert!(!matches(&recipe, &c));
    }

    #[test]
    fn test_specific_field_uses_display_name() {
        let group = Arc::new(Group::new("g-1", "Bakery"));
        let item = Item::new("flour", "Flour").with_group(group);
        let c = FilterCriterion::field(EntityKind::Item, "group", "bakery", FilterMode::Exact).unwrap();
        assert!(matches(&item, &c));
    }

    #[test]
    fn test_specific_scalar_field_is_stringified() {
        let recipe = Recipe {
            portions: 4,
            ..Recipe::new("soup", "Soup")
        };
        let c = FilterCriterion::field(EntityKind::Recipe, "portions", "4", FilterMode::Exact).unwrap();
        assert!(matches(&recipe, &c));
    }

    #[test]
    fn test_terminal_list_matches_any_element() {
        let recipe = recipe_with("bread", &[])
            .with_step("Mix")
            .with_step("Knead the dough");
        let c = FilterCriterion::field(EntityKind::Recipe, "steps", "knead", FilterMode::Contains).unwrap();
        assert!(matches(&recipe, &c));
    }

    #[test]
    fn test_apply_preserves_order_and_input() {
        let items: Vec<Arc<Item>> = ["Rye flour", "Sugar", "Wheat flour"]
            .iter()
            .enumerate()
            .map(|(i, name)| Arc::new(Item::new(format!("i{i}"), *name)))
            .collect();
        let c = FilterCriterion::by_name(EntityKind::Item, "FLOUR");

        let out = apply(&items, &c);
        let names: Vec<_> = out.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Rye flour", "Wheat flour"]);
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_apply_empty_input() {
        let items: Vec<Item> = Vec::new();
        assert!(apply(&items, &FilterCriterion::by_name(EntityKind::Item, "x")).is_empty());
    }
}
