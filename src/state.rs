//! # Page State
//!
//! Request-held navigation state: which filters the visitor has applied, and
//! which facet blocks have been suppressed by a single-value apply. The UI
//! renders the applied filters as the "active filters" bar with one removal
//! link per value.
//!
//! Rebuilt for every request; never persisted.

use crate::model::{AttributeId, CategoryId, FacetItem};
use std::collections::BTreeSet;

/// One applied filter as held in page state.
///
/// Only `Attribute` entries are candidates for variant-level filtering; the
/// structural variants exist so the extractor has something realistic to
/// discard.
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedFilter {
    Attribute {
        attribute: AttributeId,
        value: String,
        label: String,
    },
    Category {
        category: CategoryId,
    },
    Price {
        range: String,
    },
}

impl AppliedFilter {
    /// The attribute this filter is bound to, if any.
    pub fn attribute_binding(&self) -> Option<AttributeId> {
        match self {
            AppliedFilter::Attribute { attribute, .. } => Some(*attribute),
            AppliedFilter::Category { .. } | AppliedFilter::Price { .. } => None,
        }
    }
}

/// Navigation state for one request.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    filters: Vec<AppliedFilter>,
    suppressed: BTreeSet<AttributeId>,
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: AppliedFilter) {
        self.filters.push(filter);
    }

    /// Register a facet item as a newly active filter.
    pub fn add_facet_item(&mut self, item: &FacetItem) {
        self.filters.push(AppliedFilter::Attribute {
            attribute: item.attribute,
            value: item.value.clone(),
            label: item.label.clone(),
        });
    }

    pub fn filters(&self) -> &[AppliedFilter] {
        &self.filters
    }

    /// Active values for one attribute, in application order.
    pub fn attribute_values(&self, attribute: AttributeId) -> Vec<String> {
        self.filters
            .iter()
            .filter_map(|filter| match filter {
                AppliedFilter::Attribute {
                    attribute: bound,
                    value,
                    ..
                } if *bound == attribute => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether the attribute is currently being filtered on.
    pub fn is_attribute_active(&self, attribute: AttributeId) -> bool {
        self.filters
            .iter()
            .any(|filter| filter.attribute_binding() == Some(attribute))
    }

    /// Hide the attribute's facet block for the rest of the request.
    ///
    /// Single-value apply does this; multi-value apply must not, so that
    /// further values stay toggleable.
    pub fn suppress_facet(&mut self, attribute: AttributeId) {
        self.suppressed.insert(attribute);
    }

    pub fn is_facet_suppressed(&self, attribute: AttributeId) -> bool {
        self.suppressed.contains(&attribute)
    }
}
