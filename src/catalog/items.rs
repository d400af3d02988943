use super::{Catalog, Keyed};
use crate::error::CatalogError;
use crate::party::Item;

impl Keyed for Item {
    const CATALOG: &'static str = "item";

    fn key(&self) -> &str {
        &self.key
    }
}

pub trait ItemCatalogExt {
    /// Fresh item instance for a definition key
    fn instantiate(&self, key: &str) -> Result<Item, CatalogError>;
}

impl ItemCatalogExt for Catalog<Item> {
    fn instantiate(&self, key: &str) -> Result<Item, CatalogError> {
        self.get(key).cloned()
    }
}
