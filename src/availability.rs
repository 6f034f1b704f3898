//! # Option Availability
//!
//! For an (attribute, scope) pair, which option values have at least one
//! in-stock variant under an in-stock parent within that scope, and how many
//! distinct parents carry each. These counts are the authoritative input for
//! no-op elision, skip decisions and facet rebuilding — unlike the search
//! backend's facets they account for stock and are independent of whatever
//! filter is currently applied.
//!
//! Results are memoized per (attribute, scope) key and never invalidated
//! mid-request: stock data is treated as one consistent snapshot for the
//! duration of a request, so a fresh instance must be created per request.
//!
//! `Scope::Global` computes over every parent in the catalog. That is the
//! slow fallback path for pages without a category (search results); callers
//! that need a cheap answer should pass a category scope.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::Result;
use crate::model::{AttributeId, ProductId, Scope};
use crate::store::CatalogStore;

/// Memoized per-(attribute, scope) in-stock option counts.
#[derive(Debug, Default)]
pub struct OptionAvailability {
    cache: HashMap<(AttributeId, Scope), BTreeMap<String, u64>>,
}

impl OptionAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Option value → count of distinct in-stock parents that have an
    /// in-stock variant carrying the value, within the scope.
    ///
    /// Every entry has a non-zero count; options nobody can buy are absent.
    pub fn option_counts<S: CatalogStore>(
        &mut self,
        store: &S,
        attribute: AttributeId,
        scope: Scope,
    ) -> Result<&BTreeMap<String, u64>> {
        match self.cache.entry((attribute, scope)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(compute_counts(store, attribute, scope)?)),
        }
    }

    /// The option values with a non-zero count: the key set of
    /// [`OptionAvailability::option_counts`].
    pub fn available_options<S: CatalogStore>(
        &mut self,
        store: &S,
        attribute: AttributeId,
        scope: Scope,
    ) -> Result<BTreeSet<String>> {
        Ok(self
            .option_counts(store, attribute, scope)?
            .keys()
            .cloned()
            .collect())
    }
}

fn compute_counts<S: CatalogStore>(
    store: &S,
    attribute: AttributeId,
    scope: Scope,
) -> Result<BTreeMap<String, u64>> {
    // Distinct parents per value: a parent with two in-stock variants in the
    // same size still counts once for that size.
    let mut owners: BTreeMap<String, BTreeSet<ProductId>> = BTreeMap::new();

    for parent in store.parents_in_scope(scope)? {
        if !store.is_in_stock(parent)? {
            continue;
        }
        for variant in store.variants_of(parent)? {
            if !store.is_in_stock(variant)? {
                continue;
            }
            if let Some(value) = store.variant_value(variant, attribute)? {
                if value.is_empty() {
                    continue;
                }
                owners.entry(value).or_default().insert(parent);
            }
        }
    }

    Ok(owners
        .into_iter()
        .map(|(value, parents)| (value, parents.len() as u64))
        .collect())
}
