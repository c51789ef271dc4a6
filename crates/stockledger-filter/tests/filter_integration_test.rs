//! Integration tests for entity filtering.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal_macros::dec;
use stockledger_core::{CompositionLine, Group, Item, Recipe, Unit};
use stockledger_filter::{
    apply, supported_fields, CriterionDescription, Entity, EntityKind, FilterCriterion,
    FilterError, FilterMode,
};

struct Catalogue {
    gram: Arc<Unit>,
    kilo: Arc<Unit>,
    flour: Arc<Item>,
    milk: Arc<Item>,
    eggs: Arc<Item>,
    groups: Vec<Arc<Group>>,
    recipes: Vec<Arc<Recipe>>,
}

fn catalogue() -> Catalogue {
    let food = Arc::new(Group::new("food", "Food"));
    let bakery = Arc::new(Group::new("bakery", "Bakery").with_parent(Arc::clone(&food)));
    let dairy = Arc::new(Group::new("dairy", "Dairy").with_parent(Arc::clone(&food)));

    let gram = Arc::new(Unit::new("g", "gram"));
    let kilo = Arc::new(Unit::derived("kg", "kilogram", 1000, Arc::clone(&gram)));

    let flour = Arc::new(
        Item::new("flour", "Wheat flour")
            .with_group(Arc::clone(&bakery))
            .with_unit(Arc::clone(&kilo)),
    );
    let milk = Arc::new(Item::new("milk", "Milk").with_group(Arc::clone(&dairy)));
    let eggs = Arc::new(Item::new("eggs", "Eggs"));

    let pancakes = Arc::new(
        Recipe::new("pancakes", "Pancakes")
            .with_line(CompositionLine::new(Arc::clone(&milk), Arc::clone(&gram), dec!(300)))
            .with_line(CompositionLine::new(Arc::clone(&eggs), Arc::clone(&gram), dec!(100)))
            .with_line(CompositionLine::new(Arc::clone(&flour), Arc::clone(&gram), dec!(200)))
            .with_step("Whisk milk and eggs")
            .with_step("Fold in the flour"),
    );
    let omelette = Arc::new(
        Recipe::new("omelette", "Omelette")
            .with_line(CompositionLine::new(Arc::clone(&eggs), Arc::clone(&gram), dec!(150)))
            .with_line(CompositionLine::new(Arc::clone(&milk), Arc::clone(&gram), dec!(50))),
    );

    Catalogue {
        gram,
        kilo,
        flour,
        milk,
        eggs,
        groups: vec![food, bakery, dairy],
        recipes: vec![pancakes, omelette],
    }
}

fn codes<T: AsRef<str>>(values: impl IntoIterator<Item = T>) -> Vec<String> {
    values.into_iter().map(|v| v.as_ref().to_string()).collect()
}

#[test]
fn test_recipe_by_ingredient_name() {
    let cat = catalogue();
    let criterion = FilterCriterion::nested(
        EntityKind::Recipe,
        "composition.nomenclature.name",
        "flour",
        FilterMode::Contains,
    )
    .unwrap();

    let found = apply(&cat.recipes, &criterion);
    assert_eq!(codes(found.iter().map(|r| &r.unique_code)), ["pancakes"]);
}

#[test]
fn test_recipe_by_ingredient_group() {
    let cat = catalogue();
    let criterion = FilterCriterion::nested(
        EntityKind::Recipe,
        "composition.nomenclature.group.name",
        "dairy",
        FilterMode::Exact,
    )
    .unwrap();

    // Eggs has no group; the milk line still matches for both recipes.
    let found = apply(&cat.recipes, &criterion);
    assert_eq!(found.len(), 2);
}

#[test]
fn test_items_by_group_and_unit() {
    let cat = catalogue();
    let items = vec![
        Arc::clone(&cat.flour),
        Arc::clone(&cat.milk),
        Arc::clone(&cat.eggs),
    ];

    let bakery = apply(&items, &FilterCriterion::by_group_name("BAK"));
    assert_eq!(codes(bakery.iter().map(|i| &i.unique_code)), ["flour"]);

    let in_grams = FilterCriterion::nested(
        EntityKind::Item,
        "range.base.name",
        "gram",
        FilterMode::Exact,
    )
    .unwrap();
    let found = apply(&items, &in_grams);
    assert_eq!(codes(found.iter().map(|i| &i.unique_code)), ["flour"]);
}

#[test]
fn test_groups_by_parent_and_units_by_base() {
    let cat = catalogue();

    let children = apply(&cat.groups, &FilterCriterion::by_parent_name("food"));
    assert_eq!(
        codes(children.iter().map(|g| &g.unique_code)),
        ["bakery", "dairy"]
    );

    let units = vec![Arc::clone(&cat.gram), Arc::clone(&cat.kilo)];
    let derived = apply(&units, &FilterCriterion::by_base_unit_name("gram"));
    assert_eq!(codes(derived.iter().map(|u| &u.unique_code)), ["kg"]);
}

#[test]
fn test_mixed_entities_use_own_fields() {
    let cat = catalogue();
    let entities = vec![
        Entity::Item(Arc::clone(&cat.flour)),
        Entity::Unit(Arc::clone(&cat.kilo)),
        Entity::Group(Arc::clone(&cat.groups[1])),
        Entity::Recipe(Arc::clone(&cat.recipes[0])),
    ];

    // `base` is a parent group for groups and a base unit for units; items
    // and recipes have neither.
    let criterion =
        FilterCriterion::field(EntityKind::Unit, "base", "", FilterMode::Contains).unwrap();
    let found = apply(&entities, &criterion);
    assert_eq!(codes(found.iter().map(Entity::unique_code)), ["kg", "bakery"]);

    let by_name = FilterCriterion::by_name(EntityKind::Item, "a");
    let found = apply(&entities, &by_name);
    assert_eq!(
        codes(found.iter().map(Entity::name)),
        ["Wheat flour", "kilogram", "Bakery", "Pancakes"]
    );
}

#[test]
fn test_unknown_field_matches_nothing() {
    let cat = catalogue();
    let criterion =
        FilterCriterion::field(EntityKind::Recipe, "colour", "red", FilterMode::Exact).unwrap();
    assert!(apply(&cat.recipes, &criterion).is_empty());

    let criterion = FilterCriterion::nested(
        EntityKind::Recipe,
        "composition.colour",
        "red",
        FilterMode::Contains,
    )
    .unwrap();
    assert!(apply(&cat.recipes, &criterion).is_empty());
}

#[test]
fn test_filtering_leaves_input_untouched() {
    let cat = catalogue();
    let before = cat.recipes.clone();
    let _ = apply(&cat.recipes, &FilterCriterion::by_name(EntityKind::Recipe, "cake"));
    assert_eq!(cat.recipes, before);
}

#[test]
fn test_description_from_json() {
    let cat = catalogue();
    let desc: CriterionDescription = serde_json::from_str(
        r#"{
            "model_type": "receipt",
            "nested_field": "composition.nomenclature.name",
            "value": "Milk",
            "filter_type": "equals"
        }"#,
    )
    .unwrap();
    let criterion = FilterCriterion::from_description(&desc).unwrap();
    assert_eq!(apply(&cat.recipes, &criterion).len(), 2);
}

#[test]
fn test_description_validation_errors() {
    let bad_kind = CriterionDescription {
        model_type: Some("storage".to_string()),
        field_name: Some("name".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        FilterCriterion::from_description(&bad_kind),
        Err(FilterError::UnknownKind(_))
    ));

    let bad_mode = CriterionDescription {
        model_type: Some("group".to_string()),
        field_name: Some("name".to_string()),
        filter_type: Some("fuzzy".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        FilterCriterion::from_description(&bad_mode),
        Err(FilterError::UnknownMode(_))
    ));

    let no_field = CriterionDescription {
        model_type: Some("group".to_string()),
        ..Default::default()
    };
    assert_eq!(
        FilterCriterion::from_description(&no_field).unwrap_err(),
        FilterError::MissingField
    );
}

#[test]
fn test_supported_fields_cover_item() {
    let fields = supported_fields(EntityKind::Item);
    assert!(fields.specific.contains(&"group"));
    assert!(fields.specific.contains(&"range"));
}

proptest! {
    #[test]
    fn prop_filter_is_idempotent(
        names in prop::collection::vec("[a-zA-Z ]{0,12}", 0..20),
        needle in "[a-z]{0,3}",
        exact in any::<bool>(),
    ) {
        let items: Vec<Arc<Item>> = names
            .iter()
            .enumerate()
            .map(|(i, name)| Arc::new(Item::new(format!("i{i}"), name.clone())))
            .collect();
        let mode = if exact { FilterMode::Exact } else { FilterMode::Contains };
        let criterion = FilterCriterion::by_name(EntityKind::Item, &needle).with_mode(mode);

        let once = apply(&items, &criterion);
        let twice = apply(&once, &criterion);
        prop_assert_eq!(&once, &twice);

        // Output is an order-preserving subsequence of the input.
        let mut cursor = items.iter();
        for found in &once {
            prop_assert!(cursor.any(|i| Arc::ptr_eq(i, found)));
        }
    }
}
