use std::sync::Arc;

use biblenames_index::{
    BookOrder, DivisionError, LoadError, LocaleIndex, LocaleTables, OrderError, ResolutionError,
};
use biblenames_types::{BookCatalog, BookCode, BookOrderEntry, DivisionTag, ResolutionTarget};
use dashmap::DashMap;
use tracing::{info, warn};

/// Every loaded locale and book order, keyed by name.
///
/// Loading builds the replacement off to the side and swaps a single `Arc`,
/// so concurrent readers see either the old or the new index, never a
/// partial one. A failed load leaves the previous entry (if any) in place.
pub struct BibleNames {
    catalog: Arc<BookCatalog>,
    locales: DashMap<String, Arc<LocaleIndex>>,
    orders: DashMap<String, Arc<BookOrder>>,
}

impl BibleNames {
    pub fn new(catalog: BookCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            locales: DashMap::new(),
            orders: DashMap::new(),
        }
    }

    pub fn catalog(&self) -> &BookCatalog {
        &self.catalog
    }

    /// Build and register a locale, replacing any previous one with the same id.
    pub fn load_locale(&self, locale_id: &str, tables: LocaleTables) -> Result<(), LoadError> {
        let built = LocaleIndex::build(locale_id, Arc::clone(&self.catalog), tables)?;
        if self
            .locales
            .insert(locale_id.to_string(), Arc::new(built))
            .is_some()
        {
            warn!("locale {locale_id}: replaced previously loaded index");
        }
        Ok(())
    }

    pub fn unload_locale(&self, locale_id: &str) -> bool {
        self.locales.remove(locale_id).is_some()
    }

    /// Snapshot of a loaded locale; stays valid across later reloads.
    pub fn locale(&self, locale_id: &str) -> Result<Arc<LocaleIndex>, ResolutionError> {
        self.locales
            .get(locale_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ResolutionError::UnknownLocale(locale_id.to_string()))
    }

    /// Sorted ids of loaded locales.
    pub fn locales(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.locales.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn resolve(
        &self,
        locale_id: &str,
        text: &str,
    ) -> Result<ResolutionTarget, ResolutionError> {
        let locale = self.locale(locale_id)?;
        locale.resolve(text)
    }

    /// Register a named order, replacing any previous one with the same name.
    pub fn load_book_order(
        &self,
        order_name: &str,
        entries: impl IntoIterator<Item = BookOrderEntry>,
    ) -> Result<(), LoadError> {
        let order = BookOrder::new(order_name, entries)?;
        info!("book order {order_name:?}: {} entries", order.len());
        if self
            .orders
            .insert(order_name.to_string(), Arc::new(order))
            .is_some()
        {
            warn!("book order {order_name:?}: replaced previously loaded order");
        }
        Ok(())
    }

    pub fn order(&self, order_name: &str) -> Result<Arc<BookOrder>, OrderError> {
        self.orders
            .get(order_name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| OrderError::UnknownOrderName(order_name.to_string()))
    }

    /// Sorted names of loaded book orders.
    pub fn orders(&self) -> Vec<String> {
        let mut names: Vec<String> = self.orders.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn position_of(&self, order_name: &str, code: BookCode) -> Result<u32, OrderError> {
        self.order(order_name)?.position_of(code)
    }

    pub fn sequence_of(&self, order_name: &str) -> Result<Vec<BookCode>, OrderError> {
        Ok(self.order(order_name)?.sequence().to_vec())
    }

    pub fn members_of(&self, locale_id: &str, tag: &str) -> Result<Vec<BookCode>, DivisionError> {
        let locale = self.division_locale(locale_id)?;
        locale.members_of(tag).map(<[BookCode]>::to_vec)
    }

    pub fn divisions_containing(
        &self,
        locale_id: &str,
        code: BookCode,
    ) -> Result<Vec<DivisionTag>, DivisionError> {
        let locale = self.division_locale(locale_id)?;
        Ok(locale
            .divisions_containing(code)
            .into_iter()
            .cloned()
            .collect())
    }

    fn division_locale(&self, locale_id: &str) -> Result<Arc<LocaleIndex>, DivisionError> {
        self.locale(locale_id)
            .map_err(|_| DivisionError::UnknownLocale(locale_id.to_string()))
    }
}
