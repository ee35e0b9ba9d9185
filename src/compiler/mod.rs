mod solc_cli;
mod version;

pub use ethers_solc::EvmVersion;
pub use solc_cli::SolcCli;
pub use version::CompilerVersion;

use crate::Error;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerInput<'a> {
    pub source: &'a str,
    pub contract_name: &'a str,
    pub version: &'a CompilerVersion,
    /// `Some(runs)` enables the optimizer.
    pub optimization_runs: Option<u32>,
    pub evm_version: EvmVersion,
}

/// Artifacts of the requested contract. Both strings are exactly what the
/// compiler wrote, minus surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOutput {
    pub bytecode: String,
    pub abi: String,
}

#[async_trait]
pub trait Compiler: Send + Sync {
    fn is_supported(&self, version: &CompilerVersion) -> bool;

    /// All accepted versions, newest first.
    fn supported_versions(&self) -> Vec<CompilerVersion>;

    async fn compile(&self, input: &CompilerInput<'_>) -> Result<CompilerOutput, Error>;
}
