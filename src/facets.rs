//! # Facet Rebuilding
//!
//! The search backend computes per-option facet counts over the *already
//! filtered* result set. For a multi-valued attribute that is being filtered
//! on, that is wrong in a user-visible way: options that never co-occur with
//! a selected value vanish (select "XS" and the combined "XS/S" option
//! disappears, even though XS/S parents are still listed). Its counts are
//! also stock-blind.
//!
//! So, for an active multi-valued attribute, [`rebuild`] discards the
//! backend's list entirely and re-enumerates the attribute's declared
//! options against authoritative in-stock counts, category-scoped when
//! possible and global otherwise. Currently selected values always stay in
//! the list — a user must be able to deselect a value even when its live
//! count has dropped to zero — and display a count of at least 1.
//!
//! For everything else (inactive multi-valued attributes, single-valued
//! attributes) the backend list only gets a minimal relevance pass: options
//! with no in-stock match among the current candidates are dropped.

use crate::availability::OptionAvailability;
use crate::config::AttributeConfig;
use crate::error::Result;
use crate::model::{AttributeId, FacetItem, ProductId, Scope};
use crate::query::ProductQuery;
use crate::state::PageState;
use crate::store::CatalogStore;

/// Produce the facet item list for one attribute, correcting or replacing
/// the backend's `backend_items`.
pub fn rebuild<S: CatalogStore>(
    store: &S,
    config: &mut AttributeConfig,
    availability: &mut OptionAvailability,
    attribute: AttributeId,
    scope: Scope,
    state: &PageState,
    query: &ProductQuery,
    backend_items: &[FacetItem],
) -> Result<Vec<FacetItem>> {
    if state.is_facet_suppressed(attribute) {
        return Ok(Vec::new());
    }

    let active_values = state.attribute_values(attribute);
    let multi = config.is_multi_valued(store, attribute);

    if multi && !active_values.is_empty() {
        rebuild_from_availability(store, availability, attribute, scope, &active_values)
    } else {
        relevance_filter(store, attribute, query, state, backend_items)
    }
}

/// [`rebuild`], degrading to the backend's own list when a store read fails.
/// Facet correction is best-effort; the page still renders.
pub fn rebuild_or_backend<S: CatalogStore>(
    store: &S,
    config: &mut AttributeConfig,
    availability: &mut OptionAvailability,
    attribute: AttributeId,
    scope: Scope,
    state: &PageState,
    query: &ProductQuery,
    backend_items: &[FacetItem],
) -> Vec<FacetItem> {
    match rebuild(
        store,
        config,
        availability,
        attribute,
        scope,
        state,
        query,
        backend_items,
    ) {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(%attribute, "facet rebuild failed, keeping backend facets: {err}");
            backend_items.to_vec()
        }
    }
}

/// Full rebuild from declared options and authoritative in-stock counts.
fn rebuild_from_availability<S: CatalogStore>(
    store: &S,
    availability: &mut OptionAvailability,
    attribute: AttributeId,
    scope: Scope,
    active_values: &[String],
) -> Result<Vec<FacetItem>> {
    let counts = availability.option_counts(store, attribute, scope)?.clone();

    let mut items = Vec::new();
    for option in store.attribute_options(attribute)? {
        if option.value.is_empty() {
            continue;
        }
        let is_selected = active_values.iter().any(|value| value == &option.value);
        let count = counts.get(&option.value).copied().unwrap_or(0);
        if !is_selected && count == 0 {
            continue;
        }
        items.push(FacetItem {
            attribute,
            value: option.value,
            label: option.label,
            count: if is_selected { count.max(1) } else { count },
            is_selected,
        });
    }
    Ok(items)
}

/// Minimal relevance pass over the backend's list: drop options that no
/// in-stock candidate actually offers.
fn relevance_filter<S: CatalogStore>(
    store: &S,
    attribute: AttributeId,
    query: &ProductQuery,
    state: &PageState,
    backend_items: &[FacetItem],
) -> Result<Vec<FacetItem>> {
    if backend_items.is_empty() {
        return Ok(Vec::new());
    }
    let candidates = query.candidates();
    if candidates.is_empty() {
        // An unloaded query says nothing about relevance; an empty loaded
        // result set rules every option out.
        return Ok(if query.is_loaded() {
            Vec::new()
        } else {
            backend_items.to_vec()
        });
    }

    let active_values = state.attribute_values(attribute);
    let mut items = Vec::new();
    for item in backend_items {
        if has_in_stock_match(store, candidates, attribute, &item.value)? {
            let mut item = item.clone();
            item.is_selected = active_values.iter().any(|value| value == &item.value);
            items.push(item);
        }
    }
    Ok(items)
}

/// Whether any candidate offers `value` through an in-stock path: a simple
/// product carrying the value itself, or an in-stock parent with an in-stock
/// variant carrying it.
fn has_in_stock_match<S: CatalogStore>(
    store: &S,
    candidates: &[ProductId],
    attribute: AttributeId,
    value: &str,
) -> Result<bool> {
    for &product in candidates {
        let variants = store.variants_of(product)?;
        if variants.is_empty() {
            if store.is_in_stock(product)?
                && store.variant_value(product, attribute)?.as_deref() == Some(value)
            {
                return Ok(true);
            }
            continue;
        }
        if !store.is_in_stock(product)? {
            continue;
        }
        for variant in variants {
            if store.is_in_stock(variant)?
                && store.variant_value(variant, attribute)?.as_deref() == Some(value)
            {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CategoryId;
    use crate::state::AppliedFilter;
    use crate::store::memory::{InMemoryCatalog, NaiveSearchBackend, UnreliableCatalog};

    const SIZE: AttributeId = AttributeId(12);
    const CAT: CategoryId = CategoryId(4);

    /// Three sizes: XS sold out, S on three parents, combined XS/S on two.
    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_attribute(
            SIZE,
            "size",
            true,
            &[("5", "XS"), ("6", "S"), ("7", "XS/S"), ("", "None")],
        );

        for (parent, variant, value, in_stock) in [
            (1u64, 10u64, "5", false),
            (2, 20, "6", true),
            (3, 30, "6", true),
            (4, 40, "6", true),
            (5, 50, "7", true),
            (6, 60, "7", true),
        ] {
            catalog.add_parent(ProductId(parent), true, &[CAT]);
            catalog.add_variant(
                ProductId(variant),
                ProductId(parent),
                in_stock,
                &[(SIZE, value)],
            );
        }
        catalog
    }

    fn select(state: &mut PageState, value: &str) {
        state.add_filter(AppliedFilter::Attribute {
            attribute: SIZE,
            value: value.into(),
            label: value.into(),
        });
    }

    fn rebuild_with(
        catalog: &InMemoryCatalog,
        state: &PageState,
        query: &ProductQuery,
        backend_items: &[FacetItem],
    ) -> Vec<FacetItem> {
        rebuild(
            catalog,
            &mut AttributeConfig::new(),
            &mut OptionAvailability::new(),
            SIZE,
            Scope::Category(CAT),
            state,
            query,
            backend_items,
        )
        .unwrap()
    }

    #[test]
    fn active_multi_value_facet_is_fully_rebuilt() {
        let catalog = catalog();
        let mut state = PageState::new();
        select(&mut state, "5");
        let query = ProductQuery::new(Scope::Category(CAT));

        // Backend facets over the XS-filtered set would only contain XS;
        // the rebuild must not depend on them at all.
        let backend = vec![FacetItem {
            attribute: SIZE,
            value: "5".into(),
            label: "XS".into(),
            count: 1,
            is_selected: false,
        }];
        let items = rebuild_with(&catalog, &state, &query, &backend);

        let values: Vec<&str> = items.iter().map(|item| item.value.as_str()).collect();
        assert_eq!(values, vec!["5", "6", "7"]);

        // XS is sold out but selected: kept, count floored at 1, marked
        // selected so the user can remove it.
        assert_eq!(items[0].count, 1);
        assert!(items[0].is_selected);
        assert_eq!(items[1].count, 3);
        assert!(!items[1].is_selected);
        assert_eq!(items[2].count, 2);
        assert_eq!(items[2].label, "XS/S");
    }

    #[test]
    fn empty_option_values_are_never_offered() {
        let catalog = catalog();
        let mut state = PageState::new();
        select(&mut state, "6");
        let query = ProductQuery::new(Scope::Category(CAT));

        let items = rebuild_with(&catalog, &state, &query, &[]);
        assert!(items.iter().all(|item| !item.value.is_empty()));
    }

    #[test]
    fn unselected_zero_count_options_are_dropped() {
        let catalog = catalog();
        let mut state = PageState::new();
        select(&mut state, "6");
        let query = ProductQuery::new(Scope::Category(CAT));

        let items = rebuild_with(&catalog, &state, &query, &[]);
        // XS has no in-stock parent and is not selected.
        assert!(!items.iter().any(|item| item.value == "5"));
    }

    #[test]
    fn inactive_attribute_gets_the_relevance_pass() {
        let catalog = catalog();
        let state = PageState::new();
        let mut query = ProductQuery::new(Scope::Category(CAT));
        // Candidates as the backend returns them: stock-blind, so the
        // sold-out XS parent is still among them.
        let backend = NaiveSearchBackend::new(&catalog);
        query.load(&backend).unwrap();

        let backend_items = vec![
            FacetItem {
                attribute: SIZE,
                value: "5".into(),
                label: "XS".into(),
                count: 1,
                is_selected: false,
            },
            FacetItem {
                attribute: SIZE,
                value: "6".into(),
                label: "S".into(),
                count: 3,
                is_selected: false,
            },
        ];
        let items = rebuild_with(&catalog, &state, &query, &backend_items);

        // XS only exists on an out-of-stock path and is dropped; S survives.
        let values: Vec<&str> = items.iter().map(|item| item.value.as_str()).collect();
        assert_eq!(values, vec!["6"]);
    }

    #[test]
    fn empty_loaded_result_set_rules_every_option_out() {
        let catalog = catalog();
        let state = PageState::new();
        let backend = NaiveSearchBackend::new(&catalog);
        let mut query = ProductQuery::new(Scope::Category(CAT));
        query.add_equals(SIZE, "99");
        query.load(&backend).unwrap();
        assert!(query.candidates().is_empty());

        let backend_items = vec![FacetItem {
            attribute: SIZE,
            value: "6".into(),
            label: "S".into(),
            count: 3,
            is_selected: false,
        }];
        assert!(rebuild_with(&catalog, &state, &query, &backend_items).is_empty());
    }

    #[test]
    fn unloaded_query_passes_the_backend_facets_through() {
        // Before the candidate list exists there is nothing to judge
        // relevance against.
        let catalog = catalog();
        let state = PageState::new();
        let query = ProductQuery::new(Scope::Category(CAT));

        let backend_items = vec![FacetItem {
            attribute: SIZE,
            value: "6".into(),
            label: "S".into(),
            count: 3,
            is_selected: false,
        }];
        let items = rebuild_with(&catalog, &state, &query, &backend_items);
        assert_eq!(items, backend_items);
    }

    #[test]
    fn store_failure_keeps_the_backend_facets() {
        let catalog = catalog();
        let mut state = PageState::new();
        select(&mut state, "6");
        let query = ProductQuery::new(Scope::Category(CAT));
        let flaky = UnreliableCatalog::new(&catalog).failing_parents();

        let backend_items = vec![FacetItem {
            attribute: SIZE,
            value: "6".into(),
            label: "S".into(),
            count: 3,
            is_selected: false,
        }];
        // The active multi-value rebuild needs availability, and the
        // availability computation fails; the page still gets a facet list.
        let items = rebuild_or_backend(
            &flaky,
            &mut AttributeConfig::new(),
            &mut OptionAvailability::new(),
            SIZE,
            Scope::Category(CAT),
            &state,
            &query,
            &backend_items,
        );
        assert_eq!(items, backend_items);
    }

    #[test]
    fn suppressed_facet_renders_nothing() {
        let catalog = catalog();
        let mut state = PageState::new();
        state.suppress_facet(SIZE);
        let query = ProductQuery::new(Scope::Category(CAT));

        let backend_items = vec![FacetItem {
            attribute: SIZE,
            value: "6".into(),
            label: "S".into(),
            count: 3,
            is_selected: false,
        }];
        assert!(rebuild_with(&catalog, &state, &query, &backend_items).is_empty());
    }

    #[test]
    fn global_scope_falls_back_to_global_counts() {
        let catalog = catalog();
        let mut state = PageState::new();
        select(&mut state, "6");
        let query = ProductQuery::new(Scope::Global);

        let items = rebuild(
            &catalog,
            &mut AttributeConfig::new(),
            &mut OptionAvailability::new(),
            SIZE,
            Scope::Global,
            &state,
            &query,
            &[],
        )
        .unwrap();

        let values: Vec<&str> = items.iter().map(|item| item.value.as_str()).collect();
        assert_eq!(values, vec!["6", "7"]);
    }
}
