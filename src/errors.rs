use crate::{process::ProcessError, storage::StoreError};
use std::{io, process::ExitStatus};
use thiserror::Error;

/// Result of any verification or lookup operation.
///
/// [`Error::Client`] means the submitted data cannot be verified as is,
/// [`Error::Server`] means the service could not reach a verdict.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Server(err.into())
    }
}

impl Error {
    pub fn is_client(&self) -> bool {
        matches!(self, Error::Client(_))
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Error::Server(_))
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid compiler version: {0}")]
    UnsupportedCompilerVersion(String),
    #[error("invalid evm version: {0}")]
    InvalidEvmVersion(String),
    #[error("optimization requires a positive number of runs")]
    InvalidOptimizationRuns,
    #[error("compilation error: {0:?}")]
    Compilation(Vec<String>),
    #[error("contract {0} was not found in the compiled source")]
    ContractNotFound(String),
    #[error("contract {0} has no bytecode (is it abstract or an interface?)")]
    EmptyBytecode(String),
    #[error("contract {0} references external libraries, linking is not supported")]
    UnlinkedLibraries(String),
    #[error("invalid constructor signature '{signature}': {reason}")]
    InvalidConstructor { signature: String, reason: String },
    #[error("invalid constructor arguments: {0}")]
    InvalidConstructorArguments(String),
    #[error("invalid time range: start {start} is greater than end {end}")]
    InvalidTimeRange { start: u64, end: u64 },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot make temp dir: {0}")]
    ScratchDir(#[source] io::Error),
    #[error("cannot remove temp dir: {0}")]
    ScratchCleanup(#[source] io::Error),
    #[error("cannot write compiler input: {0}")]
    CompilerInput(#[source] io::Error),
    #[error("cannot read compiler output: {0}")]
    CompilerOutput(#[source] io::Error),
    #[error("compiler process failed: {0}")]
    CompilerProcess(#[source] ProcessError),
    #[error("compiler exited with {status}: {stderr}")]
    CompilerFailed { status: ExitStatus, stderr: String },
    #[error("compiler produced invalid bytecode: {0}")]
    InvalidCompiledBytecode(String),
    #[error("deployment process failed: {0}")]
    DeploymentProcess(#[source] ProcessError),
    #[error("deployment failed: {0}")]
    Deployment(String),
    #[error("cannot fetch on-chain code: {0}")]
    Rpc(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
