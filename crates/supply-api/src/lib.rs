//! In-process workflow facade plus the HTTP tier: ledger routes, the demand
//! CSV append store, and the forecast/risk script runners.

pub mod config;
pub mod runner;
mod server;
pub mod store;

use contracts::{ProductRecord, Receipt};
use serde::Serialize;
use supply_core::{
    CacheError, InMemoryLedger, LedgerClient, LedgerError, PendingTransferCache,
};

pub use config::{ConfigError, ServiceConfig, DEFAULT_LEDGER_CALLER};
pub use runner::{RunnerError, ScriptRunner};
pub use server::{serve, ServerError};
pub use store::{DemandCsvStore, StoreError, CSV_HEADER};

/// Page size of the product list view.
pub const PRODUCTS_PER_PAGE: usize = 5;

/// One product as the list view renders it: the ledger record plus the
/// advisory pending-transfer annotation, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub record: ProductRecord,
    pub pending_transfer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_products: usize,
    pub products: Vec<ProductView>,
}

/// Facade over the ledger client and the pending-transfer cache. The cache is
/// advisory: a cache write failure after a committed receipt is recorded for
/// diagnostics but never fails the operation.
#[derive(Debug)]
pub struct WorkflowApi {
    client: LedgerClient<InMemoryLedger>,
    pending: PendingTransferCache,
    last_cache_error: Option<String>,
}

impl WorkflowApi {
    pub fn new(caller: &str) -> Self {
        Self {
            client: LedgerClient::new(InMemoryLedger::new(caller)),
            pending: PendingTransferCache::in_memory(),
            last_cache_error: None,
        }
    }

    /// Swaps the in-memory annotation cache for the durable SQLite-backed
    /// one, loading whatever a previous run recorded.
    pub fn attach_pending_store(
        &mut self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), CacheError> {
        self.pending = PendingTransferCache::open(path)?;
        Ok(())
    }

    pub fn create_product(
        &mut self,
        product_id: u64,
        product_name: &str,
    ) -> Result<Receipt, LedgerError> {
        self.client.create_product(product_id, product_name)
    }

    pub fn transfer_product(
        &mut self,
        product_id: u64,
        new_owner: &str,
        details: &str,
    ) -> Result<Receipt, LedgerError> {
        let receipt = self.client.transfer_product(product_id, new_owner, details)?;
        if let Err(err) = self.pending.record(product_id, new_owner) {
            self.last_cache_error = Some(err.to_string());
        }
        Ok(receipt)
    }

    pub fn cancel_transfer(&mut self, product_id: u64) -> Result<Receipt, LedgerError> {
        let receipt = self.client.cancel_transfer(product_id)?;
        if let Err(err) = self.pending.clear(product_id) {
            self.last_cache_error = Some(err.to_string());
        }
        Ok(receipt)
    }

    pub fn product(&self, product_id: u64) -> Result<ProductRecord, LedgerError> {
        self.client.product(product_id)
    }

    /// Fresh ledger read, reconciled annotations, fixed-size 1-based pages.
    pub fn list_page(&mut self, page: usize, page_size: usize) -> Result<ProductPage, LedgerError> {
        let products = self.client.get_all_products()?;
        if let Err(err) = self.pending.reconcile(&products) {
            self.last_cache_error = Some(err.to_string());
        }

        let (start, end, total_pages) = page_bounds(products.len(), page, page_size);
        let views = products[start..end]
            .iter()
            .map(|record| ProductView {
                pending_transfer: self
                    .pending
                    .proposed_owner(record.product_id)
                    .map(str::to_string),
                record: record.clone(),
            })
            .collect();

        Ok(ProductPage {
            page: page.max(1),
            page_size: page_size.max(1),
            total_pages,
            total_products: products.len(),
            products: views,
        })
    }

    pub fn pending(&self) -> &PendingTransferCache {
        &self.pending
    }

    pub fn take_cache_error(&mut self) -> Option<String> {
        self.last_cache_error.take()
    }

    pub fn ledger_mut(&mut self) -> &mut InMemoryLedger {
        self.client.backend_mut()
    }
}

/// 1-based page window over `total` items. A page past the end yields an
/// empty window, never an out-of-bounds slice.
fn page_bounds(total: usize, page: usize, page_size: usize) -> (usize, usize, usize) {
    let page_size = page_size.max(1);
    let total_pages = total.div_ceil(page_size);
    let start = page.max(1).saturating_sub(1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    (start, end, total_pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_partitions_twelve_by_five() {
        assert_eq!(page_bounds(12, 1, 5), (0, 5, 3));
        assert_eq!(page_bounds(12, 2, 5), (5, 10, 3));
        assert_eq!(page_bounds(12, 3, 5), (10, 12, 3));
    }

    #[test]
    fn page_bounds_handles_empty_and_past_the_end() {
        assert_eq!(page_bounds(0, 1, 5), (0, 0, 0));
        assert_eq!(page_bounds(12, 9, 5), (12, 12, 3));
    }
}
