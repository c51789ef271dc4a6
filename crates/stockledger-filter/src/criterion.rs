//! Filter criteria.
//!
//! A [`FilterCriterion`] is validated and compiled when it is built: the
//! field name is resolved against the accessor registry of every entity
//! variant up front, so evaluation never looks a field up by name except
//! while walking a nested path.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;
use crate::field::{specific_accessor, universal_accessor, Accessor};

/// The entity variants the filter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Stock items (nomenclature).
    Item,
    /// Item groups.
    Group,
    /// Units of measure (ranges).
    Unit,
    /// Recipes (receipts).
    Recipe,
}

impl EntityKind {
    /// Every variant, in index order.
    pub const ALL: [Self; 4] = [Self::Item, Self::Group, Self::Unit, Self::Recipe];

    const fn index(self) -> usize {
        match self {
            Self::Item => 0,
            Self::Group => 1,
            Self::Unit => 2,
            Self::Recipe => 3,
        }
    }
}

impl FromStr for EntityKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nomenclature" | "item" => Ok(Self::Item),
            "group" => Ok(Self::Group),
            "range" | "unit" => Ok(Self::Unit),
            "receipt" | "recipe" => Ok(Self::Recipe),
            _ => Err(FilterError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item => write!(f, "nomenclature"),
            Self::Group => write!(f, "group"),
            Self::Unit => write!(f, "range"),
            Self::Recipe => write!(f, "receipt"),
        }
    }
}

/// How a stored value is compared with the criterion value.
///
/// Both sides are lower-cased first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Whole-value equality.
    Exact,
    /// The criterion value occurs inside the stored value.
    Contains,
}

impl FilterMode {
    /// Mode used when the caller did not pick one: codes are looked up
    /// exactly, everything else by substring.
    #[must_use]
    pub fn default_for(field: Option<&str>) -> Self {
        if field == Some("unique_code") {
            Self::Exact
        } else {
            Self::Contains
        }
    }
}

impl FromStr for FilterMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equals" | "exact" => Ok(Self::Exact),
            "like" | "contains" => Ok(Self::Contains),
            _ => Err(FilterError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "equals"),
            Self::Contains => write!(f, "like"),
        }
    }
}

/// A criterion as described by a caller, before validation.
///
/// Field names follow the wire format of filter requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CriterionDescription {
    /// Entity-variant tag.
    pub model_type: Option<String>,
    /// Simple field name.
    pub field_name: Option<String>,
    /// Dotted nested path.
    pub nested_field: Option<String>,
    /// Value to compare with.
    pub value: String,
    /// Comparison mode tag.
    pub filter_type: Option<String>,
}

/// How the criterion reads its value off an entity of one variant.
#[derive(Clone, Copy)]
pub(crate) enum Selector {
    /// A universal field, compared as a string.
    Universal(Accessor),
    /// A variant-specific field.
    Specific(Accessor),
    /// Walk the nested path.
    Nested,
    /// The entity cannot match.
    Never,
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Universal(_) => write!(f, "Universal"),
            Self::Specific(_) => write!(f, "Specific"),
            Self::Nested => write!(f, "Nested"),
            Self::Never => write!(f, "Never"),
        }
    }
}

/// A validated, compiled filter criterion.
#[derive(Debug, Clone)]
pub struct FilterCriterion {
    kind: EntityKind,
    field: Option<String>,
    path: Vec<String>,
    value: String,
    needle: String,
    mode: FilterMode,
    selectors: [Selector; 4],
}

impl FilterCriterion {
    fn compile(
        kind: EntityKind,
        field: Option<&str>,
        nested: Option<&str>,
        value: &str,
        mode: FilterMode,
    ) -> Result<Self, FilterError> {
        let field = field.map(str::trim).filter(|f| !f.is_empty());
        let nested = nested.map(str::trim).filter(|p| !p.is_empty());
        if field.is_none() && nested.is_none() {
            return Err(FilterError::MissingField);
        }

        let path: Vec<String> = match nested {
            Some(p) => {
                let segments: Vec<String> = p.split('.').map(|s| s.trim().to_string()).collect();
                if segments.iter().any(String::is_empty) {
                    return Err(FilterError::InvalidPath(p.to_string()));
                }
                segments
            }
            None => Vec::new(),
        };

        Ok(Self::build(kind, field, path, value, mode))
    }

    fn build(
        kind: EntityKind,
        field: Option<&str>,
        path: Vec<String>,
        value: &str,
        mode: FilterMode,
    ) -> Self {
        let selectors = EntityKind::ALL.map(|variant| {
            let resolved = field.and_then(|f| {
                universal_accessor(f)
                    .map(Selector::Universal)
                    .or_else(|| specific_accessor(variant, f).map(Selector::Specific))
            });
            match resolved {
                Some(selector) => selector,
                None if !path.is_empty() => Selector::Nested,
                None => Selector::Never,
            }
        });

        let value = value.trim().to_string();
        Self {
            kind,
            field: field.map(str::to_string),
            path,
            needle: value.to_lowercase(),
            value,
            mode,
            selectors,
        }
    }

    fn on_path(kind: EntityKind, path: &[&str], value: &str) -> Self {
        let path = path.iter().map(|s| (*s).to_string()).collect();
        Self::build(kind, None, path, value, FilterMode::Contains)
    }

    /// Criterion on a simple field (universal or variant-specific).
    pub fn field(
        kind: EntityKind,
        field: &str,
        value: &str,
        mode: FilterMode,
    ) -> Result<Self, FilterError> {
        Self::compile(kind, Some(field), None, value, mode)
    }

    /// Criterion on a dotted nested path such as `composition.nomenclature.name`.
    pub fn nested(
        kind: EntityKind,
        path: &str,
        value: &str,
        mode: FilterMode,
    ) -> Result<Self, FilterError> {
        Self::compile(kind, None, Some(path), value, mode)
    }

    /// Build a criterion from a caller's raw description.
    ///
    /// When both a field name and a nested path are given, the field name
    /// wins for variants that have it and the path is used for the rest.
    pub fn from_description(desc: &CriterionDescription) -> Result<Self, FilterError> {
        let kind: EntityKind = desc
            .model_type
            .as_deref()
            .ok_or(FilterError::MissingKind)?
            .parse()?;
        let field = desc.field_name.as_deref().map(str::trim);
        let mode = match desc.filter_type.as_deref() {
            Some(tag) => tag.parse()?,
            None => FilterMode::default_for(field),
        };
        Self::compile(kind, field, desc.nested_field.as_deref(), &desc.value, mode)
    }

    /// Entities whose name contains `name`.
    #[must_use]
    pub fn by_name(kind: EntityKind, name: &str) -> Self {
        Self::build(kind, Some("name"), Vec::new(), name, FilterMode::Contains)
    }

    /// Entities whose code equals `code`.
    #[must_use]
    pub fn by_code(kind: EntityKind, code: &str) -> Self {
        Self::build(kind, Some("unique_code"), Vec::new(), code, FilterMode::Exact)
    }

    /// Items whose group name contains `group_name`.
    #[must_use]
    pub fn by_group_name(group_name: &str) -> Self {
        Self::on_path(EntityKind::Item, &["group", "name"], group_name)
    }

    /// Groups whose parent group name contains `parent_name`.
    #[must_use]
    pub fn by_parent_name(parent_name: &str) -> Self {
        Self::on_path(EntityKind::Group, &["base", "name"], parent_name)
    }

    /// Units whose base unit name contains `base_name`.
    #[must_use]
    pub fn by_base_unit_name(base_name: &str) -> Self {
        Self::on_path(EntityKind::Unit, &["base", "name"], base_name)
    }

    /// Replace the comparison mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    /// The declared entity variant.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// The simple field name, if one was given.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// The nested path segments (empty when no path was given).
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The comparison value as supplied (trimmed).
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The comparison mode.
    #[must_use]
    pub const fn mode(&self) -> FilterMode {
        self.mode
    }

    pub(crate) const fn selector(&self, kind: EntityKind) -> Selector {
        self.selectors[kind.index()]
    }

    /// Compare a stored value against the criterion value.
    #[must_use]
    pub fn compare(&self, stored: &str) -> bool {
        let stored = stored.to_lowercase();
        match self.mode {
            FilterMode::Exact => stored == self.needle,
            FilterMode::Contains => stored.contains(&self.needle),
        }
    }
}

impl fmt::Display for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match (&self.field, self.path.is_empty()) {
            (Some(field), _) => field.clone(),
            (None, false) => self.path.join("."),
            (None, true) => String::new(),
        };
        write!(f, "{} {} {} {:?}", self.kind, target, self.mode, self.value)
    }
}
