//! # External Collaborator Interfaces
//!
//! The facet layer owns no data. Everything it decides is derived from two
//! abstracted collaborators:
//!
//! - [`CatalogStore`]: the product store — attribute metadata, parent–variant
//!   linkage, per-product stock flags, per-variant attribute values and
//!   parent–category associations. Read-only at request time; a variant's
//!   attribute values are immutable while a query is being built, only stock
//!   flags vary between requests.
//! - [`SearchBackend`]: the external search/index engine. It supplies the
//!   initial candidate parent list and naive per-option facet counts. Both
//!   are treated as provisional input: the candidate list still needs the
//!   stock-visibility predicate ([`crate::visibility`]) and the facet counts
//!   are corrected or replaced ([`crate::facets`]).
//!
//! ## Implementations
//!
//! - [`memory::InMemoryCatalog`]: in-memory catalog for testing logic without
//!   a database.
//! - [`memory::NaiveSearchBackend`]: a deliberately faithful model of the
//!   backend's inconsistencies (stock-blind, facets computed over the
//!   filtered set) so tests can demonstrate the corrections.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::{Attribute, AttributeId, AttributeOption, FacetItem, ProductId, Scope};
use crate::query::AttributeConstraint;

pub mod memory;

/// Read-only query primitives against the product store.
pub trait CatalogStore {
    /// Attribute metadata by id, `None` when unknown.
    fn attribute(&self, id: AttributeId) -> Result<Option<Attribute>>;

    /// All declared options of an attribute, in admin order.
    fn attribute_options(&self, id: AttributeId) -> Result<Vec<AttributeOption>>;

    /// Attributes that distinguish variants under a parent.
    ///
    /// Only these are meaningful for variant-level filtering; filters on any
    /// other attribute are ignored by the extractor.
    fn variant_axis_attribute_ids(&self) -> Result<BTreeSet<AttributeId>>;

    /// Parent products associated with the scope's category, or all parents
    /// for [`Scope::Global`].
    fn parents_in_scope(&self, scope: Scope) -> Result<Vec<ProductId>>;

    /// Child variants of a product. Empty for simple (variant-less) products.
    fn variants_of(&self, product: ProductId) -> Result<Vec<ProductId>>;

    /// The product's own stock flag.
    fn is_in_stock(&self, product: ProductId) -> Result<bool>;

    /// A variant's value for one attribute, `None` when the variant does not
    /// carry the attribute.
    fn variant_value(&self, variant: ProductId, attribute: AttributeId) -> Result<Option<String>>;
}

/// The external search/index engine, reduced to what the facet layer consumes.
///
/// Implementations must give [`crate::query::MatchMode::AnyOf`] genuine
/// "match any of" semantics — collapsing it to a conjunction yields zero
/// results for any multi-value selection.
pub trait SearchBackend {
    /// Initial candidate product list for the scope under the given
    /// constraints, before stock visibility is applied.
    fn candidate_products(
        &self,
        scope: Scope,
        constraints: &[AttributeConstraint],
    ) -> Result<Vec<ProductId>>;

    /// Naive per-option facet counts for one attribute, computed by the
    /// backend over the constrained result set.
    fn facet_counts(
        &self,
        scope: Scope,
        constraints: &[AttributeConstraint],
        attribute: AttributeId,
    ) -> Result<Vec<FacetItem>>;
}

/// Label for an option value, falling back to the raw value when the
/// attribute metadata has no label for it.
pub fn option_label<S: CatalogStore>(
    store: &S,
    attribute: AttributeId,
    value: &str,
) -> Result<String> {
    let options = store.attribute_options(attribute)?;
    Ok(options
        .into_iter()
        .find(|option| option.value == value)
        .map(|option| option.label)
        .unwrap_or_else(|| value.to_string()))
}
