use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

/// A request to prove that `flattened_source` is the source of the
/// contract deployed at `contract_address`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationContext {
    /// Serialized lowercase, so checksummed and lowercase spellings of the
    /// same address are one contract.
    pub contract_address: Address,
    pub contract_name: String,
    pub flattened_source: String,
    /// Long build identifier, e.g. `v0.8.10+commit.fc410830`.
    pub compiler_version: String,
    pub optimization_used: bool,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub runs: Option<u32>,
    #[serde(default, alias = "constructor")]
    pub constructor_signature: String,
    #[serde(default)]
    pub constructor_arguments: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
}

impl VerificationContext {
    /// Whether two submissions describe the same compilation of the same
    /// contract.
    pub fn same_submission(&self, other: &VerificationContext) -> bool {
        self.contract_name == other.contract_name
            && self.flattened_source == other.flattened_source
            && self.compiler_version == other.compiler_version
            && self.optimization_used == other.optimization_used
            && (!self.optimization_used || self.runs == other.runs)
            && self.constructor_signature == other.constructor_signature
            && self.constructor_arguments == other.constructor_arguments
            && self.evm_version == other.evm_version
    }
}

/// An accepted verification. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    #[serde(flatten)]
    pub context: VerificationContext,
    pub abi: String,
    /// Unix seconds.
    pub first_verified_time: u64,
}
