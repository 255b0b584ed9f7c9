use std::collections::BTreeMap;

use contracts::address::addresses_match;
use proptest::prelude::*;
use supply_core::{InMemoryLedger, LedgerClient, LedgerError};

const ACCOUNTS: [&str; 3] = [
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
    "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
    "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC",
];

#[derive(Debug, Clone)]
enum Op {
    Create { product_id: u64, caller: usize },
    Transfer { product_id: u64, caller: usize, to: usize },
    Cancel { product_id: u64, caller: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let product_id = 1_u64..5;
    let account = 0_usize..ACCOUNTS.len();
    prop_oneof![
        (product_id.clone(), account.clone())
            .prop_map(|(product_id, caller)| Op::Create { product_id, caller }),
        (product_id.clone(), account.clone(), 0_usize..ACCOUNTS.len()).prop_map(
            |(product_id, caller, to)| Op::Transfer {
                product_id,
                caller,
                to
            }
        ),
        (product_id, account).prop_map(|(product_id, caller)| Op::Cancel { product_id, caller }),
    ]
}

proptest! {
    /// Ownership only ever changes through a transfer or cancel submitted by
    /// the current owner; every rejected operation leaves the ledger exactly
    /// as it was.
    #[test]
    fn ownership_changes_only_through_authorized_operations(
        ops in proptest::collection::vec(op_strategy(), 1..48)
    ) {
        let mut client = LedgerClient::new(InMemoryLedger::new(ACCOUNTS[0]));
        // Shadow model: owner plus the reversible previous owner per product.
        let mut model: BTreeMap<u64, (String, Option<String>)> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Create { product_id, caller } => {
                    client.backend_mut().set_caller(ACCOUNTS[caller]);
                    let result = client.create_product(product_id, "Widget");
                    if model.contains_key(&product_id) {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                        model.insert(product_id, (ACCOUNTS[caller].to_string(), None));
                    }
                }
                Op::Transfer { product_id, caller, to } => {
                    client.backend_mut().set_caller(ACCOUNTS[caller]);
                    let result =
                        client.transfer_product(product_id, ACCOUNTS[to], "handover");
                    match model.get_mut(&product_id) {
                        Some((owner, previous)) if addresses_match(owner, ACCOUNTS[caller]) => {
                            prop_assert!(result.is_ok());
                            *previous = Some(owner.clone());
                            *owner = ACCOUNTS[to].to_string();
                        }
                        Some(_) => {
                            prop_assert!(
                                matches!(result, Err(LedgerError::Unauthorized { .. })),
                                "expected Unauthorized error, got {:?}",
                                result
                            );
                        }
                        None => prop_assert!(result.is_err()),
                    }
                }
                Op::Cancel { product_id, caller } => {
                    client.backend_mut().set_caller(ACCOUNTS[caller]);
                    let result = client.cancel_transfer(product_id);
                    match model.get_mut(&product_id) {
                        Some((owner, previous)) if addresses_match(owner, ACCOUNTS[caller]) => {
                            match previous.take() {
                                Some(restored) => {
                                    prop_assert!(result.is_ok());
                                    *owner = restored;
                                }
                                None => prop_assert!(matches!(
                                    result,
                                    Err(LedgerError::Submission(_))
                                )),
                            }
                        }
                        Some(_) => {
                            prop_assert!(
                                matches!(result, Err(LedgerError::Unauthorized { .. })),
                                "expected Unauthorized error, got {:?}",
                                result
                            );
                        }
                        None => prop_assert!(result.is_err()),
                    }
                }
            }
        }

        // The ledger snapshot and the shadow model agree at the end.
        client.backend_mut().set_caller(ACCOUNTS[0]);
        let products = client.get_all_products().expect("list");
        prop_assert_eq!(products.len(), model.len());
        for product in products {
            let (owner, _) = model.get(&product.product_id).expect("modeled product");
            prop_assert!(addresses_match(&product.owner, owner));
        }
    }
}
