//! # Domain Model
//!
//! Core data types for the facet layer: identifiers, attribute metadata,
//! the scope of an availability computation, the per-request set of active
//! attribute filters, and the `FacetItem` unit handed to the UI.
//!
//! Everything here except [`Attribute`] and [`AttributeOption`] metadata is
//! request-scoped: built while answering one listing request and discarded
//! afterwards. Stock data changes continuously, so nothing derived from it
//! may outlive the request.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::selection::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(pub u32);

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attribute#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u32);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product#{}", self.0)
    }
}

/// Attribute metadata as declared by an administrator.
///
/// Read-only at request time. `is_multi_valued` is the persistent flag behind
/// [`crate::config::AttributeConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub code: String,
    pub is_multi_valued: bool,
}

/// One selectable option of an attribute, in the admin-declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOption {
    pub value: String,
    pub label: String,
}

/// The category context bounding an availability computation.
///
/// `Global` covers pages without a current category (e.g. search results).
/// Availability computed globally is slower and only used as a fallback;
/// no-op elision is never attempted in `Global` scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Category(CategoryId),
    Global,
}

impl Scope {
    pub fn category(self) -> Option<CategoryId> {
        match self {
            Scope::Category(id) => Some(id),
            Scope::Global => None,
        }
    }
}

/// The unit rendered to the UI for one facet option.
///
/// Rebuilt every request; `count` reflects distinct in-stock parents and
/// `is_selected` whether the value is part of the current selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetItem {
    pub attribute: AttributeId,
    pub value: String,
    pub label: String,
    pub count: u64,
    pub is_selected: bool,
}

/// The value side of one active attribute filter.
///
/// Single-valued attributes carry one token; multi-valued attributes carry an
/// ordered selection with OR semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValues {
    Single(String),
    Any(Selection),
}

impl FilterValues {
    /// Whether a variant's value satisfies this filter.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            FilterValues::Single(value) => value == candidate,
            FilterValues::Any(selection) => selection.contains(candidate),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            FilterValues::Single(value) => vec![value.as_str()],
            FilterValues::Any(selection) => selection.iter().collect(),
        }
    }
}

/// Active attribute filters for one request: attribute → value(s).
///
/// Produced by [`crate::extract::ActiveFilterExtractor`], consumed by
/// [`crate::visibility`]. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveFilters {
    map: BTreeMap<AttributeId, FilterValues>,
}

impl ActiveFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attribute: AttributeId, values: FilterValues) {
        self.map.insert(attribute, values);
    }

    pub fn remove(&mut self, attribute: AttributeId) -> Option<FilterValues> {
        self.map.remove(&attribute)
    }

    pub fn get(&self, attribute: AttributeId) -> Option<&FilterValues> {
        self.map.get(&attribute)
    }

    pub fn contains(&self, attribute: AttributeId) -> bool {
        self.map.contains_key(&attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeId, &FilterValues)> {
        self.map.iter().map(|(id, values)| (*id, values))
    }
}
