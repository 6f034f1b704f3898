//! # Attribute Facet Configuration
//!
//! Per-attribute lookup of the admin-declared "multi-valued facet" flag,
//! memoized for the lifetime of the component instance. Instances are meant
//! to live for exactly one request: the flag itself is stable, but binding
//! the cache to the request keeps every stock-adjacent decision in one
//! consistent snapshot.

use std::collections::HashMap;

use crate::model::AttributeId;
use crate::store::CatalogStore;

/// Memoized `is_multi_valued` lookups.
#[derive(Debug, Default)]
pub struct AttributeConfig {
    cache: HashMap<AttributeId, bool>,
}

impl AttributeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the attribute is declared multi-valued for faceting.
    ///
    /// Unknown attributes and store failures both read as `false` — a filter
    /// on an attribute we cannot classify gets the plain single-value
    /// treatment, never an error.
    pub fn is_multi_valued<S: CatalogStore>(&mut self, store: &S, attribute: AttributeId) -> bool {
        if let Some(&cached) = self.cache.get(&attribute) {
            return cached;
        }

        let multi = match store.attribute(attribute) {
            Ok(Some(meta)) => meta.is_multi_valued,
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(%attribute, "attribute lookup failed, treating as single-valued: {err}");
                false
            }
        };
        self.cache.insert(attribute, multi);
        multi
    }
}
