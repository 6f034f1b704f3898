//! # facetgate
//!
//! A faceted-navigation correctness layer for catalogs of parent products
//! with child variants.
//!
//! ## The Problem
//!
//! Three independently evolving signals have to agree before a filtered
//! listing page is correct:
//!
//! - **Stock**: a parent is only worth showing if it is in stock *and* at
//!   least one of its variants is. The search backend does not know this.
//! - **Facet configuration**: attributes are declared single- or
//!   multi-valued for faceting by an administrator, and the two behave
//!   differently end to end (constraint encoding, facet-block visibility,
//!   navigation links).
//! - **The backend's own faceting**: per-option counts are computed over the
//!   already filtered result set and ignore stock, so they are wrong exactly
//!   when a multi-value filter is active.
//!
//! This crate reconciles the three. It decides which filters to forward to
//! the backend (and which to skip as no-ops), which parents stay visible,
//! and what the facet option lists should actually say.
//!
//! ## Request lifecycle
//!
//! Everything is request-scoped and synchronous. A typical page builds:
//!
//! 1. Per-request caches: [`config::AttributeConfig`],
//!    [`availability::OptionAvailability`], [`extract::ActiveFilterExtractor`].
//! 2. For each attribute request parameter, [`decide::apply`] (falling back
//!    to [`decide::apply_single`] when delegated) — this populates the
//!    [`query::ProductQuery`] constraints and the [`state::PageState`].
//! 3. [`query::ProductQuery::load`] fetches candidates from the
//!    [`store::SearchBackend`].
//! 4. [`visibility::apply_for_page`] applies the stock/constraint predicate,
//!    exactly once.
//! 5. Per facet block, [`facets::rebuild_or_backend`] produces the option
//!    list for the UI; [`decide::toggle_link`] / [`decide::remove_link`]
//!    encode the navigation parameters.
//!
//! Caches live for one request and are then dropped: stock moves constantly
//! and must never leak between requests.
//!
//! ## Failure policy
//!
//! Base stock visibility is load-bearing and always applied. Everything else
//! (no-op elision, skip decisions, facet rebuilding) is best-effort: a store
//! read failure is logged and degrades to the backend's unenhanced behavior,
//! never to a hidden listing.

pub mod availability;
pub mod config;
pub mod decide;
pub mod error;
pub mod extract;
pub mod facets;
pub mod model;
pub mod query;
pub mod selection;
pub mod state;
pub mod store;
pub mod visibility;

pub use availability::OptionAvailability;
pub use config::AttributeConfig;
pub use decide::{apply as apply_filter_param, ApplyOutcome};
pub use error::{FacetError, Result};
pub use extract::ActiveFilterExtractor;
pub use model::{
    ActiveFilters, Attribute, AttributeId, AttributeOption, CategoryId, FacetItem, FilterValues,
    ProductId, Scope,
};
pub use query::{AttributeConstraint, MatchMode, ProductQuery};
pub use selection::Selection;
pub use state::{AppliedFilter, PageState};
pub use store::{CatalogStore, SearchBackend};
