use std::collections::BTreeMap;

use contracts::address::addresses_match;
use contracts::{ContractCall, ProductRecord, Receipt};

use crate::client::{LedgerBackend, LedgerError, ReadErrorKind};

#[derive(Debug, Clone)]
struct StoredProduct {
    product_name: String,
    owner: String,
    /// Set by a transfer, consumed by a cancel. While present, the most
    /// recent transfer can still be reversed by the current owner.
    previous_owner: Option<String>,
}

/// Reference ledger with the contract's ownership semantics. Serves local
/// development and the test suite; a real chain adapter implements the same
/// `LedgerBackend` seam. Fault knobs reproduce the failure modes of a remote
/// ledger: a dropped access handle, reverting gas estimation, and a contract
/// interface without the list method.
#[derive(Debug)]
pub struct InMemoryLedger {
    caller: String,
    products: BTreeMap<u64, StoredProduct>,
    block_number: u64,
    next_tx: u64,
    disconnected: bool,
    gas_estimation_fails: bool,
    list_method_missing: bool,
}

impl InMemoryLedger {
    pub fn new(caller: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
            products: BTreeMap::new(),
            block_number: 0,
            next_tx: 0,
            disconnected: false,
            gas_estimation_fails: false,
            list_method_missing: false,
        }
    }

    /// Switches the active signer identity.
    pub fn set_caller(&mut self, caller: &str) {
        self.caller = caller.to_string();
    }

    pub fn disconnect(&mut self, disconnected: bool) {
        self.disconnected = disconnected;
    }

    pub fn fail_gas_estimation(&mut self, fails: bool) {
        self.gas_estimation_fails = fails;
    }

    pub fn drop_list_method(&mut self, missing: bool) {
        self.list_method_missing = missing;
    }

    fn ensure_connected(&self) -> Result<(), LedgerError> {
        if self.disconnected {
            return Err(LedgerError::Connectivity(
                "no ledger-access handle is available".to_string(),
            ));
        }
        Ok(())
    }

    fn intrinsic_gas(call: &ContractCall) -> u64 {
        match call {
            ContractCall::CreateProduct { product_name, .. } => {
                90_000 + product_name.len() as u64 * 16
            }
            ContractCall::TransferProduct { details, .. } => 60_000 + details.len() as u64 * 16,
            ContractCall::CancelTransferProduct { .. } => 45_000,
        }
    }
}

impl LedgerBackend for InMemoryLedger {
    fn caller(&self) -> Result<String, LedgerError> {
        self.ensure_connected()?;
        Ok(self.caller.clone())
    }

    fn estimate_gas(&self, call: &ContractCall) -> Result<u64, LedgerError> {
        self.ensure_connected()?;
        if self.gas_estimation_fails {
            return Err(LedgerError::Submission(format!(
                "gas estimation reverted for {}",
                call.method_name()
            )));
        }
        Ok(Self::intrinsic_gas(call))
    }

    fn submit(&mut self, call: ContractCall, gas_limit: u64) -> Result<Receipt, LedgerError> {
        self.ensure_connected()?;

        if gas_limit < Self::intrinsic_gas(&call) {
            return Err(LedgerError::Submission(format!(
                "gas budget too low for {}: gas_limit={gas_limit}",
                call.method_name()
            )));
        }

        let caller = self.caller.clone();
        match call {
            ContractCall::CreateProduct {
                product_id,
                product_name,
            } => {
                if self.products.contains_key(&product_id) {
                    return Err(LedgerError::Submission(format!(
                        "product_id already exists on the ledger: {product_id}"
                    )));
                }
                self.products.insert(
                    product_id,
                    StoredProduct {
                        product_name,
                        owner: caller,
                        previous_owner: None,
                    },
                );
            }
            ContractCall::TransferProduct {
                product_id,
                new_owner,
                details: _,
            } => {
                let Some(product) = self.products.get_mut(&product_id) else {
                    return Err(LedgerError::Submission(format!(
                        "unknown product_id: {product_id}"
                    )));
                };
                if !addresses_match(&product.owner, &caller) {
                    return Err(LedgerError::Submission(format!(
                        "caller is not the product owner: product_id={product_id}"
                    )));
                }
                product.previous_owner = Some(product.owner.clone());
                product.owner = new_owner;
            }
            ContractCall::CancelTransferProduct { product_id } => {
                let Some(product) = self.products.get_mut(&product_id) else {
                    return Err(LedgerError::Submission(format!(
                        "unknown product_id: {product_id}"
                    )));
                };
                if !addresses_match(&product.owner, &caller) {
                    return Err(LedgerError::Submission(format!(
                        "caller is not the product owner: product_id={product_id}"
                    )));
                }
                let Some(previous_owner) = product.previous_owner.take() else {
                    return Err(LedgerError::Submission(format!(
                        "no transfer to cancel: product_id={product_id}"
                    )));
                };
                product.owner = previous_owner;
            }
        }

        self.block_number += 1;
        self.next_tx += 1;
        // The reference ledger charges the full submitted budget.
        Ok(Receipt::new(
            format!("0x{:064x}", self.next_tx),
            self.block_number,
            gas_limit,
        ))
    }

    fn get_all_products(&self) -> Result<Vec<ProductRecord>, LedgerError> {
        self.ensure_connected()?;
        if self.list_method_missing {
            return Err(LedgerError::Read {
                kind: ReadErrorKind::UnsupportedMethod,
                message: "method getAllProducts does not exist in the contract interface"
                    .to_string(),
            });
        }

        Ok(self
            .products
            .iter()
            .map(|(product_id, stored)| {
                ProductRecord::new(*product_id, stored.product_name.clone(), stored.owner.clone())
            })
            .collect())
    }

    fn product(&self, product_id: u64) -> Result<ProductRecord, LedgerError> {
        self.ensure_connected()?;
        let Some(stored) = self.products.get(&product_id) else {
            return Err(LedgerError::ProductNotFound(product_id));
        };
        Ok(ProductRecord::new(
            product_id,
            stored.product_name.clone(),
            stored.owner.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn submit_rejects_underfunded_gas_budget() {
        let mut ledger = InMemoryLedger::new(OWNER);
        let call = ContractCall::CreateProduct {
            product_id: 1,
            product_name: "Widget".to_string(),
        };
        let err = ledger.submit(call, 1_000).unwrap_err();
        assert!(matches!(err, LedgerError::Submission(_)));
    }

    #[test]
    fn receipts_carry_monotonic_block_numbers() {
        let mut ledger = InMemoryLedger::new(OWNER);
        let first = ledger
            .submit(
                ContractCall::CreateProduct {
                    product_id: 1,
                    product_name: "A".to_string(),
                },
                200_000,
            )
            .expect("first create");
        let second = ledger
            .submit(
                ContractCall::CreateProduct {
                    product_id: 2,
                    product_name: "B".to_string(),
                },
                200_000,
            )
            .expect("second create");
        assert!(second.block_number > first.block_number);
        assert_ne!(first.tx_id, second.tx_id);
    }

    #[test]
    fn unknown_product_read_is_not_found() {
        let ledger = InMemoryLedger::new(OWNER);
        assert!(matches!(
            ledger.product(99),
            Err(LedgerError::ProductNotFound(99))
        ));
    }
}
