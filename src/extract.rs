//! # Active Filter Extraction
//!
//! Reduces the page state's applied filters to `attribute → value(s)`,
//! keeping only filters that can constrain variants:
//!
//! - structural filters (category, price) are dropped;
//! - filters on attributes that are not variant axes are dropped — carrying
//!   them into the variant predicate could never match anything;
//! - multiple values on one attribute merge into an ordered selection with
//!   OR semantics;
//! - multi-valued selections that cover every available option are elided
//!   entirely (see [`no_op_elision`](#no-op-elision)).
//!
//! ## No-op elision
//!
//! Once every in-stock option of an attribute is selected, a "value in
//! selection" constraint is equivalent to no constraint — except that
//! applying it anyway would wrongly exclude parents whose variants carry a
//! value outside the visible facet (a combined "XS/S" option, say) or no
//! value at all. Such selections are removed from the result. Without a
//! category the available set cannot be determined safely, so the filter is
//! kept as-is.

use std::collections::BTreeMap;

use crate::availability::OptionAvailability;
use crate::config::AttributeConfig;
use crate::error::Result;
use crate::model::{ActiveFilters, AttributeId, FilterValues, Scope};
use crate::selection::Selection;
use crate::state::{AppliedFilter, PageState};
use crate::store::CatalogStore;

/// Extracts the per-request active filter map from page state.
///
/// Caches the variant-axis attribute set for its own lifetime; create one per
/// request.
#[derive(Debug, Default)]
pub struct ActiveFilterExtractor {
    variant_axes: Option<std::collections::BTreeSet<AttributeId>>,
}

impl ActiveFilterExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract<S: CatalogStore>(
        &mut self,
        store: &S,
        state: &PageState,
        scope: Scope,
        config: &mut AttributeConfig,
        availability: &mut OptionAvailability,
    ) -> Result<ActiveFilters> {
        if self.variant_axes.is_none() {
            self.variant_axes = Some(store.variant_axis_attribute_ids()?);
        }
        let axes = self.variant_axes.clone().unwrap_or_default();

        // Collect values per attribute, preserving application order within
        // each attribute.
        let mut collected: BTreeMap<AttributeId, Vec<String>> = BTreeMap::new();
        for filter in state.filters() {
            let AppliedFilter::Attribute {
                attribute, value, ..
            } = filter
            else {
                continue;
            };
            if !axes.contains(attribute) {
                continue;
            }
            let entry = collected.entry(*attribute).or_default();
            if !entry.contains(value) {
                entry.push(value.clone());
            }
        }

        let mut filters = ActiveFilters::new();
        for (attribute, values) in collected {
            let multi = config.is_multi_valued(store, attribute);
            if multi || values.len() > 1 {
                filters.insert(attribute, FilterValues::Any(Selection::from_values(values)));
            } else if let Some(value) = values.into_iter().next() {
                filters.insert(attribute, FilterValues::Single(value));
            }
        }

        self.elide_no_op_filters(store, scope, config, availability, &mut filters);
        Ok(filters)
    }

    /// Remove multi-valued selections that cover every available option.
    ///
    /// Availability failures leave the filter in place: elision is facet
    /// polish, and keeping the constraint is the non-enhanced base behavior.
    fn elide_no_op_filters<S: CatalogStore>(
        &self,
        store: &S,
        scope: Scope,
        config: &mut AttributeConfig,
        availability: &mut OptionAvailability,
        filters: &mut ActiveFilters,
    ) {
        if scope.category().is_none() {
            return;
        }

        let candidates: Vec<AttributeId> = filters
            .iter()
            .filter(|(attribute, _)| config.is_multi_valued(store, *attribute))
            .map(|(attribute, _)| attribute)
            .collect();

        for attribute in candidates {
            let available = match availability.available_options(store, attribute, scope) {
                Ok(available) => available,
                Err(err) => {
                    tracing::warn!(%attribute, "availability lookup failed, keeping filter: {err}");
                    continue;
                }
            };
            if available.is_empty() {
                continue;
            }
            let Some(values) = filters.get(attribute) else {
                continue;
            };
            let selected = Selection::from_values(values.values());
            if selected.covers(available.iter().map(String::as_str)) {
                filters.remove(attribute);
            }
        }
    }
}
