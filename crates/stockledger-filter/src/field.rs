//! Field access over entities.
//!
//! Filtering never inspects entities reflectively. Each entity variant has
//! a static table mapping field names to accessor functions, and every
//! value an accessor returns is a [`FieldValue`]: nothing, a piece of text,
//! another entity, or a list of values.

use std::borrow::Cow;
use std::fmt;

use stockledger_core::{CompositionLine, Group, Item, Nameable, Recipe, Unit};

use crate::criterion::EntityKind;

/// A borrowed view of anything a field path can walk through.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// An item.
    Item(&'a Item),
    /// A group.
    Group(&'a Group),
    /// A unit of measure.
    Unit(&'a Unit),
    /// A recipe.
    Recipe(&'a Recipe),
    /// A recipe composition line.
    Line(&'a CompositionLine),
}

impl<'a> Node<'a> {
    /// The filterable variant of this node, if it is one.
    #[must_use]
    pub const fn entity_kind(self) -> Option<EntityKind> {
        match self {
            Self::Item(_) => Some(EntityKind::Item),
            Self::Group(_) => Some(EntityKind::Group),
            Self::Unit(_) => Some(EntityKind::Unit),
            Self::Recipe(_) => Some(EntityKind::Recipe),
            Self::Line(_) => None,
        }
    }

    /// The node as a [`Nameable`], for nodes that have a display name.
    #[must_use]
    pub fn nameable(self) -> Option<&'a dyn Nameable> {
        match self {
            Self::Item(v) => Some(v),
            Self::Group(v) => Some(v),
            Self::Unit(v) => Some(v),
            Self::Recipe(v) => Some(v),
            Self::Line(_) => None,
        }
    }

    /// The node's unique code, for nodes that have one.
    #[must_use]
    pub fn unique_code(self) -> Option<&'a str> {
        match self {
            Self::Item(v) => Some(&v.unique_code),
            Self::Group(v) => Some(&v.unique_code),
            Self::Unit(v) => Some(&v.unique_code),
            Self::Recipe(v) => Some(&v.unique_code),
            Self::Line(_) => None,
        }
    }

    /// The text a comparison sees when this node is a terminal value.
    #[must_use]
    pub fn comparable_text(self) -> Cow<'a, str> {
        match self.nameable() {
            Some(named) => Cow::Borrowed(named.display_name()),
            None => Cow::Owned(self.to_string()),
        }
    }

    /// Resolve one attribute of this node by name.
    ///
    /// Universal fields (`name`, `unique_code`) are tried first, then the
    /// fields registered for the node's variant. `None` means the node has
    /// no such attribute.
    #[must_use]
    pub fn attribute(self, field: &str) -> Option<FieldValue<'a>> {
        universal_accessor(field)
            .or_else(|| lookup(node_fields(self), field))
            .map(|accessor| accessor(self))
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => write!(f, "{line}"),
            other => match other.nameable() {
                Some(named) => f.write_str(named.display_name()),
                None => Ok(()),
            },
        }
    }
}

/// A value produced by a field accessor.
#[derive(Debug, Clone)]
pub enum FieldValue<'a> {
    /// Absent optional reference.
    Null,
    /// Scalar value rendered as text.
    Text(Cow<'a, str>),
    /// A nested entity.
    Node(Node<'a>),
    /// A list of values (composition lines, steps).
    List(Vec<FieldValue<'a>>),
}

impl<'a> FieldValue<'a> {
    fn text(s: &'a str) -> Self {
        Self::Text(Cow::Borrowed(s))
    }

    fn owned(s: String) -> Self {
        Self::Text(Cow::Owned(s))
    }

    fn node(node: Option<Node<'a>>) -> Self {
        node.map_or(Self::Null, Self::Node)
    }

    /// Whether the value is [`FieldValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Reads one field off a node.
pub type Accessor = for<'a> fn(Node<'a>) -> FieldValue<'a>;

/// Field names every variant understands.
pub const UNIVERSAL_FIELDS: &[&str] = &["name", "unique_code"];

const UNIVERSAL: &[(&str, Accessor)] = &[("name", name), ("unique_code", unique_code)];

const ITEM_FIELDS: &[(&str, Accessor)] = &[
    ("group", item_group),
    ("range", item_unit),
    ("unit", item_unit),
];

const GROUP_FIELDS: &[(&str, Accessor)] = &[("base", group_parent), ("parent", group_parent)];

const UNIT_FIELDS: &[(&str, Accessor)] = &[("value", unit_value), ("base", unit_base)];

const RECIPE_FIELDS: &[(&str, Accessor)] = &[
    ("portions", recipe_portions),
    ("cooking_time", recipe_cooking_time),
    ("steps", recipe_steps),
    ("composition", recipe_composition),
];

const LINE_FIELDS: &[(&str, Accessor)] = &[
    ("nomenclature", line_item),
    ("item", line_item),
    ("range", line_unit),
    ("unit", line_unit),
    ("value", line_value),
];

fn lookup(table: &[(&str, Accessor)], field: &str) -> Option<Accessor> {
    table
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, accessor)| *accessor)
}

const fn node_fields(node: Node<'_>) -> &'static [(&'static str, Accessor)] {
    match node {
        Node::Item(_) => ITEM_FIELDS,
        Node::Group(_) => GROUP_FIELDS,
        Node::Unit(_) => UNIT_FIELDS,
        Node::Recipe(_) => RECIPE_FIELDS,
        Node::Line(_) => LINE_FIELDS,
    }
}

const fn kind_fields(kind: EntityKind) -> &'static [(&'static str, Accessor)] {
    match kind {
        EntityKind::Item => ITEM_FIELDS,
        EntityKind::Group => GROUP_FIELDS,
        EntityKind::Unit => UNIT_FIELDS,
        EntityKind::Recipe => RECIPE_FIELDS,
    }
}

/// Accessor for a universal field, if `field` is one.
#[must_use]
pub fn universal_accessor(field: &str) -> Option<Accessor> {
    lookup(UNIVERSAL, field)
}

/// Accessor for a field registered specifically for `kind`.
#[must_use]
pub fn specific_accessor(kind: EntityKind, field: &str) -> Option<Accessor> {
    lookup(kind_fields(kind), field)
}

fn name(node: Node<'_>) -> FieldValue<'_> {
    node.nameable()
        .map_or(FieldValue::Null, |n| FieldValue::text(n.display_name()))
}

fn unique_code(node: Node<'_>) -> FieldValue<'_> {
    node.unique_code().map_or(FieldValue::Null, FieldValue::text)
}

fn item_group(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Item(item) => FieldValue::node(item.group.as_deref().map(Node::Group)),
        _ => FieldValue::Null,
    }
}

fn item_unit(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Item(item) => FieldValue::node(item.unit.as_deref().map(Node::Unit)),
        _ => FieldValue::Null,
    }
}

fn group_parent(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Group(group) => FieldValue::node(group.parent.as_deref().map(Node::Group)),
        _ => FieldValue::Null,
    }
}

fn unit_value(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Unit(unit) => FieldValue::owned(unit.value.to_string()),
        _ => FieldValue::Null,
    }
}

fn unit_base(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Unit(unit) => FieldValue::node(unit.base.as_deref().map(Node::Unit)),
        _ => FieldValue::Null,
    }
}

fn recipe_portions(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Recipe(recipe) => FieldValue::owned(recipe.portions.to_string()),
        _ => FieldValue::Null,
    }
}

fn recipe_cooking_time(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Recipe(recipe) => FieldValue::text(&recipe.cooking_time),
        _ => FieldValue::Null,
    }
}

fn recipe_steps(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Recipe(recipe) => {
            FieldValue::List(recipe.steps.iter().map(|s| FieldValue::text(s)).collect())
        }
        _ => FieldValue::Null,
    }
}

fn recipe_composition(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Recipe(recipe) => FieldValue::List(
            recipe
                .composition
                .iter()
                .map(|line| FieldValue::Node(Node::Line(line)))
                .collect(),
        ),
        _ => FieldValue::Null,
    }
}

fn line_item(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Line(line) => FieldValue::Node(Node::Item(&line.item)),
        _ => FieldValue::Null,
    }
}

fn line_unit(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Line(line) => FieldValue::Node(Node::Unit(&line.unit)),
        _ => FieldValue::Null,
    }
}

fn line_value(node: Node<'_>) -> FieldValue<'_> {
    match node {
        Node::Line(line) => FieldValue::owned(line.value.to_string()),
        _ => FieldValue::Null,
    }
}

/// Fields a variant can be filtered on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalogue {
    /// Fields every variant has.
    pub basic: &'static [&'static str],
    /// Fields specific to this variant (aliases included).
    pub specific: Vec<&'static str>,
    /// Example nested paths.
    pub nested_examples: &'static [&'static str],
}

/// Describe the filterable fields of `kind`.
#[must_use]
pub fn supported_fields(kind: EntityKind) -> FieldCatalogue {
    let nested_examples: &'static [&'static str] = match kind {
        EntityKind::Item => &["group.name", "range.name", "range.base.name"],
        EntityKind::Group => &["base.name", "base.base.name"],
        EntityKind::Unit => &["base.name", "base.base.name"],
        EntityKind::Recipe => &[
            "composition.nomenclature.name",
            "composition.nomenclature.group.name",
            "composition.range.name",
        ],
    };
    FieldCatalogue {
        basic: UNIVERSAL_FIELDS,
        specific: kind_fields(kind).iter().map(|(name, _)| *name).collect(),
        nested_examples,
    }
}
