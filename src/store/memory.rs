//! In-memory collaborators for testing facet logic without a database or a
//! search cluster.
//!
//! [`InMemoryCatalog`] is a faithful little product store.
//! [`NaiveSearchBackend`] is deliberately *unfaithful* in the same two ways
//! real engines are:
//!
//! - it is stock-blind: candidates and facet buckets ignore stock flags;
//! - it facets over the already-constrained result set, so option values that
//!   never co-occur with a selected value disappear from its counts.
//!
//! Tests rely on those defects to show the correctness layer repairing them.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{FacetError, Result};
use crate::model::{
    Attribute, AttributeId, AttributeOption, CategoryId, FacetItem, ProductId, Scope,
};
use crate::query::{AttributeConstraint, MatchMode};
use crate::store::{CatalogStore, SearchBackend};

#[derive(Debug, Default)]
struct ProductRecord {
    in_stock: bool,
    parent: Option<ProductId>,
    variants: Vec<ProductId>,
    values: BTreeMap<AttributeId, String>,
    categories: BTreeSet<CategoryId>,
}

/// In-memory [`CatalogStore`].
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    attributes: BTreeMap<AttributeId, Attribute>,
    options: BTreeMap<AttributeId, Vec<AttributeOption>>,
    products: BTreeMap<ProductId, ProductRecord>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attribute(
        &mut self,
        id: AttributeId,
        code: &str,
        is_multi_valued: bool,
        options: &[(&str, &str)],
    ) {
        self.attributes.insert(
            id,
            Attribute {
                id,
                code: code.to_string(),
                is_multi_valued,
            },
        );
        self.options.insert(
            id,
            options
                .iter()
                .map(|(value, label)| AttributeOption {
                    value: value.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        );
    }

    pub fn add_parent(&mut self, id: ProductId, in_stock: bool, categories: &[CategoryId]) {
        self.products.insert(
            id,
            ProductRecord {
                in_stock,
                categories: categories.iter().copied().collect(),
                ..ProductRecord::default()
            },
        );
    }

    pub fn add_simple(&mut self, id: ProductId, in_stock: bool, categories: &[CategoryId]) {
        // Same record shape as a parent; it simply never gets variants.
        self.add_parent(id, in_stock, categories);
    }

    pub fn add_variant(
        &mut self,
        id: ProductId,
        parent: ProductId,
        in_stock: bool,
        values: &[(AttributeId, &str)],
    ) {
        self.products.insert(
            id,
            ProductRecord {
                in_stock,
                parent: Some(parent),
                values: values
                    .iter()
                    .map(|(attr, value)| (*attr, value.to_string()))
                    .collect(),
                ..ProductRecord::default()
            },
        );
        if let Some(record) = self.products.get_mut(&parent) {
            record.variants.push(id);
        }
    }

    pub fn set_stock(&mut self, id: ProductId, in_stock: bool) {
        if let Some(record) = self.products.get_mut(&id) {
            record.in_stock = in_stock;
        }
    }

    fn record(&self, id: ProductId) -> Result<&ProductRecord> {
        self.products
            .get(&id)
            .ok_or(FacetError::ProductNotFound(id))
    }

    fn is_top_level_in_scope(&self, record: &ProductRecord, scope: Scope) -> bool {
        record.parent.is_none()
            && match scope {
                Scope::Category(category) => record.categories.contains(&category),
                Scope::Global => true,
            }
    }
}

impl CatalogStore for InMemoryCatalog {
    fn attribute(&self, id: AttributeId) -> Result<Option<Attribute>> {
        Ok(self.attributes.get(&id).cloned())
    }

    fn attribute_options(&self, id: AttributeId) -> Result<Vec<AttributeOption>> {
        Ok(self.options.get(&id).cloned().unwrap_or_default())
    }

    fn variant_axis_attribute_ids(&self) -> Result<BTreeSet<AttributeId>> {
        let mut axes = BTreeSet::new();
        for record in self.products.values() {
            if record.parent.is_some() {
                axes.extend(record.values.keys().copied());
            }
        }
        Ok(axes)
    }

    fn parents_in_scope(&self, scope: Scope) -> Result<Vec<ProductId>> {
        Ok(self
            .products
            .iter()
            .filter(|(_, record)| {
                !record.variants.is_empty() && self.is_top_level_in_scope(record, scope)
            })
            .map(|(id, _)| *id)
            .collect())
    }

    fn variants_of(&self, product: ProductId) -> Result<Vec<ProductId>> {
        Ok(self.record(product)?.variants.clone())
    }

    fn is_in_stock(&self, product: ProductId) -> Result<bool> {
        Ok(self.record(product)?.in_stock)
    }

    fn variant_value(&self, variant: ProductId, attribute: AttributeId) -> Result<Option<String>> {
        Ok(self.record(variant)?.values.get(&attribute).cloned())
    }
}

/// Stock-blind search backend over an [`InMemoryCatalog`].
#[derive(Debug)]
pub struct NaiveSearchBackend<'a> {
    catalog: &'a InMemoryCatalog,
}

impl<'a> NaiveSearchBackend<'a> {
    pub fn new(catalog: &'a InMemoryCatalog) -> Self {
        Self { catalog }
    }

    /// All option values a product exposes for an attribute, across its own
    /// record and every variant. Stock is intentionally ignored.
    fn exposed_values(&self, record: &ProductRecord, attribute: AttributeId) -> Vec<String> {
        let mut values: Vec<String> = record.values.get(&attribute).cloned().into_iter().collect();
        for variant in &record.variants {
            if let Some(variant_record) = self.catalog.products.get(variant) {
                if let Some(value) = variant_record.values.get(&attribute) {
                    if !values.iter().any(|v| v == value) {
                        values.push(value.clone());
                    }
                }
            }
        }
        values
    }

    fn matches(&self, record: &ProductRecord, constraint: &AttributeConstraint) -> bool {
        let exposed = self.exposed_values(record, constraint.attribute);
        match constraint.mode {
            // Any exposed value may match, and each constraint is checked
            // independently of the others — possibly against different
            // variants. That looseness is exactly what the visibility
            // predicate re-checks per single variant.
            MatchMode::AnyOf => exposed
                .iter()
                .any(|value| constraint.values.iter().any(|wanted| wanted == value)),
            MatchMode::AllOf => constraint
                .values
                .iter()
                .all(|wanted| exposed.iter().any(|value| value == wanted)),
        }
    }
}

impl SearchBackend for NaiveSearchBackend<'_> {
    fn candidate_products(
        &self,
        scope: Scope,
        constraints: &[AttributeConstraint],
    ) -> Result<Vec<ProductId>> {
        Ok(self
            .catalog
            .products
            .iter()
            .filter(|(_, record)| self.catalog.is_top_level_in_scope(record, scope))
            .filter(|(_, record)| {
                constraints
                    .iter()
                    .all(|constraint| self.matches(record, constraint))
            })
            .map(|(id, _)| *id)
            .collect())
    }

    fn facet_counts(
        &self,
        scope: Scope,
        constraints: &[AttributeConstraint],
        attribute: AttributeId,
    ) -> Result<Vec<FacetItem>> {
        let candidates = self.candidate_products(scope, constraints)?;
        let options = self.catalog.attribute_options(attribute)?;

        let mut items = Vec::new();
        for option in options {
            let count = candidates
                .iter()
                .filter_map(|id| self.catalog.products.get(id))
                .filter(|record| {
                    self.exposed_values(record, attribute)
                        .iter()
                        .any(|value| value == &option.value)
                })
                .count() as u64;
            if count > 0 {
                items.push(FacetItem {
                    attribute,
                    value: option.value,
                    label: option.label,
                    count,
                    is_selected: false,
                });
            }
        }
        Ok(items)
    }
}

/// [`InMemoryCatalog`] wrapper whose selected lookups fail while everything
/// else keeps working, for exercising the degraded code paths.
#[cfg(test)]
#[derive(Debug)]
pub struct UnreliableCatalog<'a> {
    inner: &'a InMemoryCatalog,
    fail_axes: bool,
    fail_parents: bool,
    fail_options: bool,
}

#[cfg(test)]
impl<'a> UnreliableCatalog<'a> {
    pub fn new(inner: &'a InMemoryCatalog) -> Self {
        Self {
            inner,
            fail_axes: false,
            fail_parents: false,
            fail_options: false,
        }
    }

    pub fn failing_axes(mut self) -> Self {
        self.fail_axes = true;
        self
    }

    pub fn failing_parents(mut self) -> Self {
        self.fail_parents = true;
        self
    }

    pub fn failing_options(mut self) -> Self {
        self.fail_options = true;
        self
    }
}

#[cfg(test)]
impl CatalogStore for UnreliableCatalog<'_> {
    fn attribute(&self, id: AttributeId) -> Result<Option<Attribute>> {
        self.inner.attribute(id)
    }

    fn attribute_options(&self, id: AttributeId) -> Result<Vec<AttributeOption>> {
        if self.fail_options {
            return Err(FacetError::Store("option read failed".into()));
        }
        self.inner.attribute_options(id)
    }

    fn variant_axis_attribute_ids(&self) -> Result<BTreeSet<AttributeId>> {
        if self.fail_axes {
            return Err(FacetError::Store("axis read failed".into()));
        }
        self.inner.variant_axis_attribute_ids()
    }

    fn parents_in_scope(&self, scope: Scope) -> Result<Vec<ProductId>> {
        if self.fail_parents {
            return Err(FacetError::Store("category read failed".into()));
        }
        self.inner.parents_in_scope(scope)
    }

    fn variants_of(&self, product: ProductId) -> Result<Vec<ProductId>> {
        self.inner.variants_of(product)
    }

    fn is_in_stock(&self, product: ProductId) -> Result<bool> {
        self.inner.is_in_stock(product)
    }

    fn variant_value(&self, variant: ProductId, attribute: AttributeId) -> Result<Option<String>> {
        self.inner.variant_value(variant, attribute)
    }
}
