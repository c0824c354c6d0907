//! Pure catalog filtering.

use std::collections::BTreeSet;

use cascade_core::ProductId;

use crate::document::UpdateCatalog;

/// Restricts `master` to the product ids in `approved`.
///
/// Pure function: the result contains exactly the products present in both
/// the master catalog and the approved set, in the master's order, and all
/// non-product content of the master unchanged. The master itself is not
/// modified.
#[must_use]
pub fn filter(master: &UpdateCatalog, approved: &BTreeSet<ProductId>) -> UpdateCatalog {
    let mut filtered = master.clone();
    filtered.retain_products(approved);
    filtered
}
