//! # Parent Visibility
//!
//! The load-bearing predicate of the whole layer: which products stay in the
//! listing. The search backend's candidate list is stock-blind and checks
//! attribute constraints against possibly different variants per attribute;
//! this module re-checks both properly.
//!
//! A product is visible iff:
//!
//! - it is a simple (variant-less) product and its own stock flag is true, or
//! - it is a parent, its own stock flag is true, and at least **one single
//!   variant** is simultaneously in stock and satisfies *every* active
//!   attribute constraint (OR within an attribute's values, AND across
//!   attributes).
//!
//! The one-variant condition is the point: color from one variant and size
//! from another must not combine — no purchasable item offers that
//! combination.
//!
//! Application is idempotent. The query carries a "stock filter applied"
//! flag, so a lazily re-triggered query within one request cannot be
//! filtered twice.

use crate::availability::OptionAvailability;
use crate::config::AttributeConfig;
use crate::error::Result;
use crate::extract::ActiveFilterExtractor;
use crate::model::{ActiveFilters, ProductId};
use crate::query::ProductQuery;
use crate::state::PageState;
use crate::store::CatalogStore;

/// Apply the visibility predicate to the query's candidates, once.
pub fn apply<S: CatalogStore>(
    store: &S,
    query: &mut ProductQuery,
    filters: &ActiveFilters,
) -> Result<()> {
    if query.stock_filter_applied() {
        return Ok(());
    }

    // The predicate is fallible, so evaluate it before mutating the query.
    let mut visible = std::collections::BTreeSet::new();
    for &product in query.candidates() {
        if is_visible(store, product, filters)? {
            visible.insert(product);
        }
    }
    query.retain_candidates(|product| visible.contains(product));
    query.mark_stock_filter_applied();
    Ok(())
}

/// Full per-page application: extract active filters from page state, then
/// apply the predicate.
///
/// Extraction and elision are facet polish; if they fail the error is logged
/// and the **base stock predicate is still applied** — the page may lose
/// filter refinement, but it never shows unbuyable products and never
/// disappears entirely.
pub fn apply_for_page<S: CatalogStore>(
    store: &S,
    query: &mut ProductQuery,
    state: &PageState,
    extractor: &mut ActiveFilterExtractor,
    config: &mut AttributeConfig,
    availability: &mut OptionAvailability,
) -> Result<()> {
    if query.stock_filter_applied() {
        return Ok(());
    }

    let filters = match extractor.extract(store, state, query.scope(), config, availability) {
        Ok(filters) => filters,
        Err(err) => {
            tracing::warn!("active filter extraction failed, applying base stock visibility only: {err}");
            ActiveFilters::default()
        }
    };
    apply(store, query, &filters)
}

/// The visibility predicate for one product.
pub fn is_visible<S: CatalogStore>(
    store: &S,
    product: ProductId,
    filters: &ActiveFilters,
) -> Result<bool> {
    let variants = store.variants_of(product)?;

    if variants.is_empty() {
        // Simple products are not constrained by variant-level filters.
        return store.is_in_stock(product);
    }

    if !store.is_in_stock(product)? {
        return Ok(false);
    }

    // One variant must satisfy everything at once.
    'variants: for variant in variants {
        if !store.is_in_stock(variant)? {
            continue;
        }
        for (attribute, values) in filters.iter() {
            match store.variant_value(variant, attribute)? {
                Some(value) if values.matches(&value) => {}
                _ => continue 'variants,
            }
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeId, CategoryId, FilterValues, Scope};
    use crate::selection::Selection;
    use crate::state::AppliedFilter;
    use crate::store::memory::{InMemoryCatalog, NaiveSearchBackend, UnreliableCatalog};

    const COLOR: AttributeId = AttributeId(13);
    const SIZE: AttributeId = AttributeId(12);
    const CAT: CategoryId = CategoryId(4);

    fn filters(entries: &[(AttributeId, &str)]) -> ActiveFilters {
        let mut filters = ActiveFilters::new();
        for (attribute, raw) in entries {
            filters.insert(*attribute, FilterValues::Any(Selection::parse(raw)));
        }
        filters
    }

    /// Parent 1 with a red in-stock variant and a blue out-of-stock variant.
    fn red_blue_catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_attribute(COLOR, "color", true, &[("red", "Red"), ("blue", "Blue")]);
        catalog.add_parent(ProductId(1), true, &[CAT]);
        catalog.add_variant(ProductId(10), ProductId(1), true, &[(COLOR, "red")]);
        catalog.add_variant(ProductId(11), ProductId(1), false, &[(COLOR, "blue")]);
        catalog
    }

    #[test]
    fn parent_visible_through_in_stock_matching_variant() {
        let catalog = red_blue_catalog();
        assert!(is_visible(&catalog, ProductId(1), &filters(&[(COLOR, "red")])).unwrap());
    }

    #[test]
    fn parent_hidden_when_only_matching_variant_is_out_of_stock() {
        let catalog = red_blue_catalog();
        assert!(!is_visible(&catalog, ProductId(1), &filters(&[(COLOR, "blue")])).unwrap());
    }

    #[test]
    fn constraints_must_hold_on_one_single_variant() {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_attribute(COLOR, "color", true, &[]);
        catalog.add_attribute(SIZE, "size", true, &[]);
        catalog.add_parent(ProductId(1), true, &[CAT]);
        // One variant is red/S, another blue/M: red+M exists only across
        // different variants.
        catalog.add_variant(
            ProductId(10),
            ProductId(1),
            true,
            &[(COLOR, "red"), (SIZE, "S")],
        );
        catalog.add_variant(
            ProductId(11),
            ProductId(1),
            true,
            &[(COLOR, "blue"), (SIZE, "M")],
        );

        assert!(!is_visible(
            &catalog,
            ProductId(1),
            &filters(&[(COLOR, "red"), (SIZE, "M")])
        )
        .unwrap());
        assert!(is_visible(
            &catalog,
            ProductId(1),
            &filters(&[(COLOR, "red"), (SIZE, "S")])
        )
        .unwrap());
    }

    #[test]
    fn or_within_attribute_and_across_attributes() {
        let catalog = red_blue_catalog();
        assert!(is_visible(
            &catalog,
            ProductId(1),
            &filters(&[(COLOR, "red,blue")])
        )
        .unwrap());
    }

    #[test]
    fn variant_without_the_attribute_never_matches() {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_attribute(SIZE, "size", true, &[]);
        catalog.add_attribute(COLOR, "color", true, &[]);
        catalog.add_parent(ProductId(1), true, &[CAT]);
        catalog.add_variant(ProductId(10), ProductId(1), true, &[(SIZE, "S")]);

        assert!(!is_visible(&catalog, ProductId(1), &filters(&[(COLOR, "red")])).unwrap());
    }

    #[test]
    fn all_variants_out_of_stock_hides_the_parent_without_filters() {
        let mut catalog = red_blue_catalog();
        catalog.set_stock(ProductId(10), false);

        assert!(!is_visible(&catalog, ProductId(1), &ActiveFilters::new()).unwrap());
    }

    #[test]
    fn out_of_stock_parent_is_hidden_despite_in_stock_variants() {
        let mut catalog = red_blue_catalog();
        catalog.set_stock(ProductId(1), false);

        assert!(!is_visible(&catalog, ProductId(1), &ActiveFilters::new()).unwrap());
    }

    #[test]
    fn simple_products_follow_their_own_stock_flag() {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_simple(ProductId(1), true, &[CAT]);
        catalog.add_simple(ProductId(2), false, &[CAT]);

        assert!(is_visible(&catalog, ProductId(1), &ActiveFilters::new()).unwrap());
        assert!(!is_visible(&catalog, ProductId(2), &ActiveFilters::new()).unwrap());
    }

    #[test]
    fn application_is_idempotent() {
        let catalog = red_blue_catalog();
        let backend = NaiveSearchBackend::new(&catalog);

        let mut query = ProductQuery::new(Scope::Category(CAT));
        query.load(&backend).unwrap();
        let filters = filters(&[(COLOR, "red")]);

        apply(&catalog, &mut query, &filters).unwrap();
        let after_first: Vec<ProductId> = query.candidates().to_vec();
        apply(&catalog, &mut query, &filters).unwrap();
        assert_eq!(query.candidates(), after_first.as_slice());
        assert!(query.stock_filter_applied());
    }

    #[test]
    fn extraction_failure_still_enforces_stock_visibility() {
        let mut catalog = red_blue_catalog();
        // An out-of-stock parent with an in-stock variant.
        catalog.add_parent(ProductId(2), false, &[CAT]);
        catalog.add_variant(ProductId(20), ProductId(2), true, &[(COLOR, "red")]);
        let backend = NaiveSearchBackend::new(&catalog);

        let mut query = ProductQuery::new(Scope::Category(CAT));
        query.load(&backend).unwrap();

        // Blue would hide parent 1 (its only blue variant is out of stock).
        let mut state = PageState::new();
        state.add_filter(AppliedFilter::Attribute {
            attribute: COLOR,
            value: "blue".into(),
            label: "Blue".into(),
        });

        let flaky = UnreliableCatalog::new(&catalog).failing_axes();
        apply_for_page(
            &flaky,
            &mut query,
            &state,
            &mut ActiveFilterExtractor::new(),
            &mut AttributeConfig::new(),
            &mut OptionAvailability::new(),
        )
        .unwrap();

        // The blue filter is lost with the failed extraction, but the
        // out-of-stock parent is still removed.
        assert_eq!(query.candidates(), &[ProductId(1)]);
    }

    #[test]
    fn apply_invalidates_the_cached_total() {
        let mut catalog = red_blue_catalog();
        catalog.add_parent(ProductId(2), true, &[CAT]);
        catalog.add_variant(ProductId(20), ProductId(2), false, &[(COLOR, "red")]);
        let backend = NaiveSearchBackend::new(&catalog);

        let mut query = ProductQuery::new(Scope::Category(CAT));
        query.load(&backend).unwrap();
        assert_eq!(query.total(), 2);

        // Parent 2's only variant is out of stock.
        apply(&catalog, &mut query, &ActiveFilters::new()).unwrap();
        assert_eq!(query.total(), 1);
    }
}
