use std::fmt;

use contracts::address::{addresses_match, is_address};
use contracts::{ContractCall, ProductRecord, Receipt};

/// Conservative budget used when gas estimation for a create fails.
pub const CREATE_GAS_FALLBACK: u64 = 300_000;
/// Cancels skip estimation entirely and submit with this fixed budget.
pub const CANCEL_GAS_LIMIT: u64 = 500_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrorKind {
    /// The read call reverted on the ledger.
    Reverted,
    /// The contract interface does not expose the requested method.
    UnsupportedMethod,
}

impl fmt::Display for ReadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reverted => write!(f, "reverted"),
            Self::UnsupportedMethod => write!(f, "unsupported method"),
        }
    }
}

#[derive(Debug)]
pub enum LedgerError {
    Connectivity(String),
    Read { kind: ReadErrorKind, message: String },
    Submission(String),
    Unauthorized {
        product_id: u64,
        owner: String,
        caller: String,
    },
    ProductNotFound(u64),
    InvalidInput(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connectivity(message) => write!(f, "ledger unavailable: {message}"),
            Self::Read { kind, message } => write!(f, "ledger read failed ({kind}): {message}"),
            Self::Submission(message) => write!(f, "ledger rejected submission: {message}"),
            Self::Unauthorized {
                product_id,
                owner,
                caller,
            } => write!(
                f,
                "caller is not the product owner: product_id={product_id} owner={owner} caller={caller}"
            ),
            Self::ProductNotFound(product_id) => {
                write!(f, "product not found on ledger: product_id={product_id}")
            }
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Seam to the external ownership ledger. `submit` waits for finalization;
/// no receipt is handed back for an unconfirmed write.
pub trait LedgerBackend {
    /// Resolves the active caller identity. Fails with a connectivity error
    /// when no ledger-access handle is available.
    fn caller(&self) -> Result<String, LedgerError>;

    fn estimate_gas(&self, call: &ContractCall) -> Result<u64, LedgerError>;

    fn submit(&mut self, call: ContractCall, gas_limit: u64) -> Result<Receipt, LedgerError>;

    fn get_all_products(&self) -> Result<Vec<ProductRecord>, LedgerError>;

    fn product(&self, product_id: u64) -> Result<ProductRecord, LedgerError>;
}

/// Stateless wrapper over a ledger backend. Connectivity is re-resolved and
/// preconditions re-validated on every call; owner pre-checks here are an
/// optimization, the ledger's own authorization stays authoritative.
#[derive(Debug)]
pub struct LedgerClient<B> {
    backend: B,
}

impl<B: LedgerBackend> LedgerClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn create_product(
        &mut self,
        product_id: u64,
        product_name: &str,
    ) -> Result<Receipt, LedgerError> {
        if product_id == 0 {
            return Err(LedgerError::InvalidInput(
                "product_id must be a positive integer".to_string(),
            ));
        }
        let product_name = product_name.trim();
        if product_name.is_empty() {
            return Err(LedgerError::InvalidInput(
                "product name must not be empty".to_string(),
            ));
        }

        self.backend.caller()?;

        let call = ContractCall::CreateProduct {
            product_id,
            product_name: product_name.to_string(),
        };
        // A failed estimate falls back to the fixed budget instead of
        // failing the create outright.
        let gas_limit = self
            .backend
            .estimate_gas(&call)
            .unwrap_or(CREATE_GAS_FALLBACK);

        self.backend.submit(call, gas_limit)
    }

    pub fn get_all_products(&self) -> Result<Vec<ProductRecord>, LedgerError> {
        self.backend.caller()?;
        self.backend.get_all_products()
    }

    pub fn product(&self, product_id: u64) -> Result<ProductRecord, LedgerError> {
        self.backend.caller()?;
        self.backend.product(product_id)
    }

    pub fn transfer_product(
        &mut self,
        product_id: u64,
        new_owner: &str,
        details: &str,
    ) -> Result<Receipt, LedgerError> {
        if !is_address(new_owner) {
            return Err(LedgerError::InvalidInput(format!(
                "new_owner is not a valid address: {new_owner}"
            )));
        }
        let details = details.trim();
        if details.is_empty() {
            return Err(LedgerError::InvalidInput(
                "transfer details must not be empty".to_string(),
            ));
        }

        let caller = self.backend.caller()?;
        let product = self.backend.product(product_id)?;
        if !addresses_match(&product.owner, &caller) {
            return Err(LedgerError::Unauthorized {
                product_id,
                owner: product.owner,
                caller,
            });
        }

        let call = ContractCall::TransferProduct {
            product_id,
            new_owner: new_owner.to_string(),
            details: details.to_string(),
        };
        // No fallback for transfers; an estimation failure propagates.
        let gas_limit = self.backend.estimate_gas(&call)?;

        self.backend.submit(call, gas_limit)
    }

    pub fn cancel_transfer(&mut self, product_id: u64) -> Result<Receipt, LedgerError> {
        let caller = self.backend.caller()?;
        let product = self.backend.product(product_id)?;
        if !addresses_match(&product.owner, &caller) {
            return Err(LedgerError::Unauthorized {
                product_id,
                owner: product.owner,
                caller,
            });
        }

        self.backend.submit(
            ContractCall::CancelTransferProduct { product_id },
            CANCEL_GAS_LIMIT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLedger;

    const ALICE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn client() -> LedgerClient<InMemoryLedger> {
        LedgerClient::new(InMemoryLedger::new(ALICE))
    }

    #[test]
    fn create_then_list_includes_record_owned_by_creator() {
        let mut client = client();
        client.create_product(4821, "Widget").expect("create");

        let products = client.get_all_products().expect("list");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_id, 4821);
        assert_eq!(products[0].product_name, "Widget");
        assert_eq!(products[0].owner, ALICE);
    }

    #[test]
    fn create_rejects_zero_id_and_empty_name() {
        let mut client = client();
        assert!(matches!(
            client.create_product(0, "Widget"),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            client.create_product(1, "   "),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn create_falls_back_to_fixed_gas_budget_when_estimation_fails() {
        let mut client = client();
        client.backend_mut().fail_gas_estimation(true);

        let receipt = client.create_product(7, "Widget").expect("create");
        assert_eq!(receipt.gas_used, CREATE_GAS_FALLBACK);
    }

    #[test]
    fn transfer_requires_current_owner_case_insensitively() {
        let mut client = client();
        client.create_product(7, "Widget").expect("create");

        client.backend_mut().set_caller(&ALICE.to_uppercase().replace("0X", "0x"));
        client
            .transfer_product(7, BOB, "restock")
            .expect("owner pre-check compares case-insensitively");

        assert_eq!(client.product(7).expect("read").owner, BOB);
    }

    #[test]
    fn transfer_by_non_owner_fails_and_leaves_owner_unchanged() {
        let mut client = client();
        client.create_product(7, "Widget").expect("create");

        client.backend_mut().set_caller(BOB);
        let err = client.transfer_product(7, BOB, "grab").unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { product_id: 7, .. }));
        assert_eq!(client.product(7).expect("read").owner, ALICE);
    }

    #[test]
    fn transfer_validates_address_and_details() {
        let mut client = client();
        client.create_product(7, "Widget").expect("create");

        assert!(matches!(
            client.transfer_product(7, "not-an-address", "restock"),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(matches!(
            client.transfer_product(7, BOB, "  "),
            Err(LedgerError::InvalidInput(_))
        ));
    }

    #[test]
    fn cancel_restores_previous_owner_and_transfer_eligibility() {
        let mut client = client();
        client.create_product(7, "Widget").expect("create");
        client.transfer_product(7, BOB, "restock").expect("transfer");

        // Only the current owner (the transferee) may cancel.
        let err = client.cancel_transfer(7).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));

        client.backend_mut().set_caller(BOB);
        client.cancel_transfer(7).expect("cancel by current owner");
        assert_eq!(client.product(7).expect("read").owner, ALICE);

        // The restored owner can transfer again.
        client.backend_mut().set_caller(ALICE);
        client
            .transfer_product(7, BOB, "second attempt")
            .expect("transfer after cancel");
    }

    #[test]
    fn cancel_without_prior_transfer_is_rejected_by_the_ledger() {
        let mut client = client();
        client.create_product(7, "Widget").expect("create");

        let err = client.cancel_transfer(7).unwrap_err();
        assert!(matches!(err, LedgerError::Submission(_)));
    }

    #[test]
    fn disconnected_backend_surfaces_connectivity_errors() {
        let mut client = client();
        client.backend_mut().disconnect(true);

        assert!(matches!(
            client.get_all_products(),
            Err(LedgerError::Connectivity(_))
        ));
        assert!(matches!(
            client.create_product(7, "Widget"),
            Err(LedgerError::Connectivity(_))
        ));
    }

    #[test]
    fn unsupported_list_method_is_reported_distinctly() {
        let mut client = client();
        client.backend_mut().drop_list_method(true);

        let err = client.get_all_products().unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Read {
                kind: ReadErrorKind::UnsupportedMethod,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_create_is_rejected_by_the_ledger() {
        let mut client = client();
        client.create_product(7, "Widget").expect("create");
        let err = client.create_product(7, "Widget Again").unwrap_err();
        assert!(matches!(err, LedgerError::Submission(_)));
    }
}
