//! v1 cross-boundary contracts for the ledger client, API tier, and CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod address;
pub mod serde_u64_string;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// One product record as the ledger reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    pub schema_version: String,
    #[serde(with = "serde_u64_string")]
    pub product_id: u64,
    pub product_name: String,
    pub owner: String,
}

impl ProductRecord {
    pub fn new(product_id: u64, product_name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            product_id,
            product_name: product_name.into(),
            owner: owner.into(),
        }
    }
}

/// Confirmation returned once the ledger finalizes a submitted write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub schema_version: String,
    pub tx_id: String,
    pub block_number: u64,
    pub gas_used: u64,
}

impl Receipt {
    pub fn new(tx_id: impl Into<String>, block_number: u64, gas_used: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            tx_id: tx_id.into(),
            block_number,
            gas_used,
        }
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx_id={} block={} gas_used={}",
            self.tx_id, self.block_number, self.gas_used
        )
    }
}

/// Wire-level contract invocation submitted to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContractCall {
    CreateProduct {
        product_id: u64,
        product_name: String,
    },
    TransferProduct {
        product_id: u64,
        new_owner: String,
        details: String,
    },
    CancelTransferProduct {
        product_id: u64,
    },
}

impl ContractCall {
    pub fn product_id(&self) -> u64 {
        match self {
            Self::CreateProduct { product_id, .. }
            | Self::TransferProduct { product_id, .. }
            | Self::CancelTransferProduct { product_id } => *product_id,
        }
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            Self::CreateProduct { .. } => "createProduct",
            Self::TransferProduct { .. } => "transferProduct",
            Self::CancelTransferProduct { .. } => "cancelTransferProduct",
        }
    }
}

/// One denormalized demand observation appended to the forecasting dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemandRow {
    pub date: String,
    #[serde(with = "serde_u64_string")]
    pub product_id: u64,
    pub location_id: String,
    pub demand: String,
    pub price: String,
}

impl DemandRow {
    /// Column order matches the CSV header of the demand dataset.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.date, self.product_id, self.location_id, self.demand, self.price
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    ProductNotFound,
    NotOwner,
    LedgerUnavailable,
    LedgerReadFailed,
    SubmissionRejected,
    StorageFailed,
    RunnerFailed,
    RunnerTimedOut,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_record_round_trips_with_string_id() {
        let record = ProductRecord::new(4821, "Widget", "0xabc");
        let json = serde_json::to_string(&record).expect("serialize record");
        assert!(json.contains("\"product_id\":\"4821\""));

        let parsed: ProductRecord = serde_json::from_str(&json).expect("parse record");
        assert_eq!(parsed, record);
    }

    #[test]
    fn contract_call_tags_by_method() {
        let call = ContractCall::TransferProduct {
            product_id: 7,
            new_owner: "0xabc".to_string(),
            details: "restock".to_string(),
        };
        let json = serde_json::to_string(&call).expect("serialize call");
        assert!(json.contains("\"type\":\"transfer_product\""));
        assert_eq!(call.method_name(), "transferProduct");
        assert_eq!(call.product_id(), 7);
    }

    #[test]
    fn demand_row_renders_in_header_order() {
        let row = DemandRow {
            date: "2024-11-02".to_string(),
            product_id: 4821,
            location_id: "loc_9".to_string(),
            demand: "120".to_string(),
            price: "19.99".to_string(),
        };
        assert_eq!(row.to_csv_line(), "2024-11-02,4821,loc_9,120,19.99");
    }
}
