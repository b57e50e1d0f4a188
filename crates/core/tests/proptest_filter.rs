//! Property-based tests for catalog filtering
//!
//! Validates filter invariants:
//! - An empty query with no constraints returns every id in catalog order
//! - Adding a constraint never grows the result set
//! - Color stripping is idempotent
//! - Taxonomy counts do not depend on head order

use headsmith_core::{filter_heads, strip_color_codes, Catalog, FilterState, Head, TagTaxonomy};
use proptest::prelude::*;

const TAGS: &[&str] = &[
    "storage",
    "candles",
    "letters",
    "alphabet/oak",
    "alphabet/birch",
    "color/red",
    "color/red/dark",
];
const PROPS: &[&str] = &["glowing", "lightable", "workbench"];
const PATHS: &[&str] = &["alphabet", "color", "alphabet/oak", "color/red"];

fn head_strategy() -> impl Strategy<Value = Head> {
    (
        "[a-z_]{1,8}",
        "(&[0-9a-fklmnor])?[A-Za-z ]{0,10}",
        prop::collection::vec(prop::sample::select(TAGS), 0..4),
        prop::collection::vec(prop::sample::select(PROPS), 0..2),
        prop::collection::vec("(&[0-9a-f])?[a-z ]{0,8}", 0..2),
    )
        .prop_map(|(id, name, tags, props, lore)| Head {
            name: Some(name),
            tags: tags.into_iter().map(str::to_string).collect(),
            properties: props.into_iter().map(str::to_string).collect(),
            lore,
            ..Head::new(id)
        })
}

fn catalog_strategy() -> impl Strategy<Value = Vec<Head>> {
    prop::collection::vec(head_strategy(), 0..24)
}

fn state_strategy() -> impl Strategy<Value = FilterState> {
    (
        prop::collection::btree_set(prop::sample::select(TAGS).prop_map(str::to_string), 0..2),
        prop::option::of(prop::sample::select(PATHS)),
        prop::option::of(prop::sample::select(PROPS)),
    )
        .prop_map(|(tags, path, property)| FilterState {
            tags,
            tag_path: path
                .map(|p| p.split('/').map(str::to_string).collect())
                .unwrap_or_default(),
            property: property.map(str::to_string),
        })
}

fn is_subsequence(narrow: &[&str], wide: &[&str]) -> bool {
    let mut wide = wide.iter();
    narrow.iter().all(|id| wide.any(|w| w == id))
}

proptest! {
    /// Property: no constraints, no query -> every id, catalog order
    #[test]
    fn empty_filter_is_identity(heads in catalog_strategy()) {
        let catalog: Catalog = heads.into_iter().collect();
        let expected: Vec<&str> = catalog.ids().collect();
        prop_assert_eq!(filter_heads(&catalog, &FilterState::default(), ""), expected);
    }

    /// Property: adding a flat tag, property or query only narrows the result
    #[test]
    fn constraints_narrow_monotonically(
        heads in catalog_strategy(),
        state in state_strategy(),
        extra_tag in prop::sample::select(TAGS),
        extra_prop in prop::sample::select(PROPS),
        query in "[a-z]{0,3}",
    ) {
        let catalog: Catalog = heads.into_iter().collect();
        let base = filter_heads(&catalog, &state, "");

        let mut tagged = state.clone();
        tagged.tags.insert(extra_tag.to_string());
        let narrowed = filter_heads(&catalog, &tagged, "");
        prop_assert!(narrowed.len() <= base.len());
        prop_assert!(is_subsequence(&narrowed, &base));

        if state.property.is_none() {
            let mut with_prop = state.clone();
            with_prop.property = Some(extra_prop.to_string());
            let narrowed = filter_heads(&catalog, &with_prop, "");
            prop_assert!(is_subsequence(&narrowed, &base));
        }

        let queried = filter_heads(&catalog, &state, &query);
        prop_assert!(is_subsequence(&queried, &base));

        if state.tag_path.len() == 1 {
            let mut deeper = state.clone();
            deeper.tag_path.push("oak".to_string());
            let narrowed = filter_heads(&catalog, &deeper, "");
            prop_assert!(is_subsequence(&narrowed, &base));
        }
    }

    /// Property: stripping twice equals stripping once
    #[test]
    fn strip_is_idempotent(text in "[&a-z0-9 ]{0,24}") {
        let once = strip_color_codes(&text);
        prop_assert_eq!(strip_color_codes(&once), once);
    }

    /// Property: head iteration order does not affect taxonomy counts
    #[test]
    fn taxonomy_is_order_independent(heads in catalog_strategy()) {
        let forward = TagTaxonomy::build(&heads);
        let reversed = TagTaxonomy::build(heads.iter().rev());
        prop_assert_eq!(forward, reversed);
    }
}
