//! The vendor update catalog as an opaque structured document.
//!
//! A catalog is a JSON object with a `Products` member mapping product ids
//! to opaque update descriptors, plus arbitrary other content (catalog
//! version, vendor metadata) that Cascade never interprets. Everything
//! except explicit product removals must round-trip byte-for-byte through
//! a filter pass, so the document is held as a raw `serde_json` value with
//! insertion order preserved.

use bytes::Bytes;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use cascade_core::ProductId;

use crate::error::{CatalogError, Result};

/// JSON member holding the product list.
pub const PRODUCTS_KEY: &str = "Products";

/// An update catalog document, master or filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCatalog {
    root: Map<String, Value>,
}

impl UpdateCatalog {
    /// Parses a catalog document from its serialized form.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DocumentFormat`] if the payload is not a
    /// well-formed JSON object.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(raw).map_err(|e| {
            CatalogError::document_format(format!("catalog is not valid JSON: {e}"))
        })?;
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(CatalogError::document_format(format!(
                "catalog root must be an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Serializes the document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Serialization`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let raw = serde_json::to_vec(&Value::Object(self.root.clone())).map_err(|e| {
            CatalogError::Serialization {
                message: format!("failed to encode catalog: {e}"),
            }
        })?;
        Ok(Bytes::from(raw))
    }

    /// Returns the product ids present in the document, in document order.
    ///
    /// A catalog without a `Products` member has no products; that is not
    /// a structural fault.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.products()
            .map(|products| products.keys().map(|k| ProductId::new(k.clone())).collect())
            .unwrap_or_default()
    }

    /// Returns the number of product entries.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.products().map_or(0, Map::len)
    }

    /// Removes every product entry whose id is not in `approved`.
    ///
    /// The relative order of surviving entries and all non-product content
    /// are left untouched.
    pub fn retain_products(&mut self, approved: &BTreeSet<ProductId>) {
        if let Some(Value::Object(products)) = self.root.get_mut(PRODUCTS_KEY) {
            products.retain(|id, _| approved.contains(&ProductId::new(id.clone())));
        }
    }

    fn products(&self) -> Option<&Map<String, Value>> {
        match self.root.get(PRODUCTS_KEY) {
            Some(Value::Object(products)) => Some(products),
            _ => None,
        }
    }

    /// Returns a non-product top-level member, for callers that need to
    /// inspect catalog metadata.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
