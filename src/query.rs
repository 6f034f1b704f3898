//! # Listing Query Model
//!
//! [`ProductQuery`] is the one query object built per listing request. It
//! accumulates attribute constraints destined for the search backend, holds
//! the candidate list the backend returned, and carries the two pieces of
//! bookkeeping the correctness layer depends on:
//!
//! - `stock_filter_applied`: set once the visibility predicate has run, so a
//!   lazily re-triggered query within the same request cannot apply it twice.
//! - a cached total with an explicit [`ProductQuery::invalidate_total`] hook:
//!   every mutation of the candidate set must go through it so the toolbar
//!   count never reflects a pre-filter size.

use crate::error::Result;
use crate::model::{AttributeId, ProductId, Scope};
use crate::store::SearchBackend;

/// How a multi-value constraint combines its values.
///
/// Forwarded attribute selections are always [`MatchMode::AnyOf`]: the
/// backend must treat the values as "match any of". [`MatchMode::AllOf`]
/// exists because the backend interface distinguishes the two — a variant
/// carries exactly one value per axis attribute, so an `AllOf` over more than
/// one value matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    AnyOf,
    AllOf,
}

/// One attribute constraint forwarded to the search backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeConstraint {
    pub attribute: AttributeId,
    pub values: Vec<String>,
    pub mode: MatchMode,
}

/// The product-listing query for one request.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    scope: Scope,
    constraints: Vec<AttributeConstraint>,
    candidates: Vec<ProductId>,
    loaded: bool,
    stock_filter_applied: bool,
    cached_total: Option<usize>,
}

impl ProductQuery {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            constraints: Vec::new(),
            candidates: Vec::new(),
            loaded: false,
            stock_filter_applied: false,
            cached_total: None,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Add a disjunctive constraint: the product must match any of `values`
    /// on `attribute`.
    pub fn add_any_of<I, V>(&mut self, attribute: AttributeId, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.constraints.push(AttributeConstraint {
            attribute,
            values: values.into_iter().map(Into::into).collect(),
            mode: MatchMode::AnyOf,
        });
    }

    /// Add a single-value equality constraint.
    pub fn add_equals(&mut self, attribute: AttributeId, value: impl Into<String>) {
        self.constraints.push(AttributeConstraint {
            attribute,
            values: vec![value.into()],
            mode: MatchMode::AnyOf,
        });
    }

    pub fn constraints(&self) -> &[AttributeConstraint] {
        &self.constraints
    }

    /// Fetch the candidate list from the search backend.
    pub fn load<B: SearchBackend>(&mut self, backend: &B) -> Result<()> {
        self.candidates = backend.candidate_products(self.scope, &self.constraints)?;
        self.loaded = true;
        self.invalidate_total();
        Ok(())
    }

    /// Whether the backend has been queried yet. An unloaded query's empty
    /// candidate list means "unknown", not "no results".
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn candidates(&self) -> &[ProductId] {
        &self.candidates
    }

    /// Drop candidates that fail a predicate. Invalidates the cached total.
    pub fn retain_candidates<F>(&mut self, keep: F)
    where
        F: FnMut(&ProductId) -> bool,
    {
        self.candidates.retain(keep);
        self.invalidate_total();
    }

    /// Result count, cached until the candidate set changes.
    pub fn total(&mut self) -> usize {
        match self.cached_total {
            Some(total) => total,
            None => {
                let total = self.candidates.len();
                self.cached_total = Some(total);
                total
            }
        }
    }

    /// Drop the cached total so the next [`ProductQuery::total`] recounts.
    pub fn invalidate_total(&mut self) {
        self.cached_total = None;
    }

    pub fn stock_filter_applied(&self) -> bool {
        self.stock_filter_applied
    }

    pub(crate) fn mark_stock_filter_applied(&mut self) {
        self.stock_filter_applied = true;
    }
}
