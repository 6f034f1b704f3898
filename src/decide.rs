//! # Filter Application Decisions
//!
//! Entry points for turning one raw request parameter into backend
//! constraints and page state.
//!
//! [`apply`] handles multi-valued attributes: it parses the comma-delimited
//! selection, decides whether forwarding it would be a no-op (and skips the
//! backend constraint if so), forwards it as an explicit "any of" constraint
//! otherwise, and registers one active-filter item per selected value. The
//! attribute's facet block stays visible so further values remain toggleable.
//!
//! [`apply_single`] is the default single-value behavior the multi path
//! replaces: one equality constraint, one state item, and the facet block is
//! suppressed for the rest of the request.
//!
//! [`toggle_link`] builds the navigation target for one facet option: the
//! parameter value after adding or removing that option from the current
//! selection.

use crate::availability::OptionAvailability;
use crate::config::AttributeConfig;
use crate::error::Result;
use crate::model::{AttributeId, FacetItem, Scope};
use crate::query::ProductQuery;
use crate::selection::Selection;
use crate::state::PageState;
use crate::store::{option_label, CatalogStore};

/// What [`apply`] did with the request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Not a multi-valued attribute (or nothing usable in the parameter);
    /// the caller should run the default single-value path.
    Delegated,
    /// The selection was handled on the multi-value path.
    Applied {
        selection: Selection,
        /// True when the selection covered every available option and the
        /// backend constraint was skipped as a no-op.
        skipped: bool,
    },
}

/// Apply one attribute's raw request parameter on the multi-value path.
pub fn apply<S: CatalogStore>(
    store: &S,
    config: &mut AttributeConfig,
    availability: &mut OptionAvailability,
    attribute: AttributeId,
    raw_value: &str,
    query: &mut ProductQuery,
    state: &mut PageState,
) -> Result<ApplyOutcome> {
    if !config.is_multi_valued(store, attribute) {
        return Ok(ApplyOutcome::Delegated);
    }

    let selection = Selection::parse(raw_value);
    if selection.is_empty() {
        return Ok(ApplyOutcome::Delegated);
    }

    let skipped = should_skip(store, availability, attribute, &selection, query.scope());
    if !skipped {
        query.add_any_of(attribute, selection.iter().map(str::to_string));
    }

    // One state item per value: the active-filters bar shows each value with
    // its own removal link, whether or not the backend constraint was
    // skipped. The facet block is deliberately not suppressed.
    for value in selection.iter() {
        state.add_facet_item(&FacetItem {
            attribute,
            value: value.to_string(),
            label: label_or_raw(store, attribute, value),
            count: 0,
            is_selected: true,
        });
    }

    Ok(ApplyOutcome::Applied { selection, skipped })
}

/// Default single-value apply: equality constraint, one state item, facet
/// block hidden.
pub fn apply_single<S: CatalogStore>(
    store: &S,
    attribute: AttributeId,
    raw_value: &str,
    query: &mut ProductQuery,
    state: &mut PageState,
) -> Result<()> {
    let value = raw_value.trim();
    if value.is_empty() {
        return Ok(());
    }

    query.add_equals(attribute, value);
    state.add_facet_item(&FacetItem {
        attribute,
        value: value.to_string(),
        label: label_or_raw(store, attribute, value),
        count: 0,
        is_selected: true,
    });
    state.suppress_facet(attribute);
    Ok(())
}

/// [`option_label`], degrading to the raw token when the store read fails.
///
/// The query has already been constrained by the time labels are resolved; a
/// label problem must not leave the filter half applied.
fn label_or_raw<S: CatalogStore>(store: &S, attribute: AttributeId, value: &str) -> String {
    match option_label(store, attribute, value) {
        Ok(label) => label,
        Err(err) => {
            tracing::warn!(%attribute, "option label lookup failed, using the raw value: {err}");
            value.to_string()
        }
    }
}

/// The no-op rule: skip the backend constraint when the selection covers
/// every available option in the scope.
///
/// Without a category the available set cannot be determined, and an
/// availability failure falls back to applying the constraint — skipping is
/// an enhancement, forwarding is the base behavior.
fn should_skip<S: CatalogStore>(
    store: &S,
    availability: &mut OptionAvailability,
    attribute: AttributeId,
    selection: &Selection,
    scope: Scope,
) -> bool {
    if scope.category().is_none() {
        return false;
    }

    let available = match availability.available_options(store, attribute, scope) {
        Ok(available) => available,
        Err(err) => {
            tracing::warn!(%attribute, "availability lookup failed, applying filter anyway: {err}");
            return false;
        }
    };

    !available.is_empty() && selection.covers(available.iter().map(String::as_str))
}

/// The request-parameter value after toggling `value` in `current_raw`.
///
/// `None` means the parameter should be dropped from the URL entirely.
pub fn toggle_link(current_raw: &str, value: &str) -> Option<String> {
    Selection::parse(current_raw).toggle(value).encode()
}

/// The request-parameter value after removing exactly `value`, for the
/// per-value removal link in the active-filters bar.
pub fn remove_link(current_raw: &str, value: &str) -> Option<String> {
    Selection::parse(current_raw).without(value).encode()
}
