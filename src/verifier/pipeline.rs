use super::in_flight::InFlight;
use crate::{
    bytecode,
    chain::CodeFetcher,
    compiler::{Compiler, CompilerInput, CompilerVersion, EvmVersion},
    deployment::{self, DeploymentSimulator},
    metrics,
    storage::RecordStore,
    types::{VerificationContext, VerificationRecord},
    ClientError, Error,
};
use ethers_core::types::Address;
use std::{str::FromStr, sync::Arc};

/// Submission fields checked and converted before any work is done.
#[derive(Debug)]
struct ValidatedSettings {
    version: CompilerVersion,
    optimization_runs: Option<u32>,
    evm_version: EvmVersion,
}

pub struct VerificationPipeline {
    compiler: Arc<dyn Compiler>,
    simulator: Arc<dyn DeploymentSimulator>,
    fetcher: Arc<dyn CodeFetcher>,
    store: Arc<dyn RecordStore>,
    default_evm_version: EvmVersion,
    in_flight: InFlight,
}

impl VerificationPipeline {
    pub fn new(
        compiler: Arc<dyn Compiler>,
        simulator: Arc<dyn DeploymentSimulator>,
        fetcher: Arc<dyn CodeFetcher>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            compiler,
            simulator,
            fetcher,
            store,
            default_evm_version: EvmVersion::Istanbul,
            in_flight: InFlight::new(),
        }
    }

    /// EVM version used when the submission does not name one.
    pub fn with_default_evm_version(mut self, evm_version: EvmVersion) -> Self {
        self.default_evm_version = evm_version;
        self
    }

    /// Checks that the submitted source reproduces the code deployed at
    /// `context.contract_address`, and stores the submission if it does.
    ///
    /// Returns `Ok(true)` for an already verified address without
    /// recompiling, and `Ok(false)` if the code does not match.
    pub async fn verify(&self, context: VerificationContext) -> Result<bool, Error> {
        let address = context.contract_address;
        let result = self.verify_inner(&context).await;
        match &result {
            Ok(true) => log::info!("contract {address:?} is verified"),
            Ok(false) => log::info!("contract {address:?} does not match the submitted source"),
            Err(Error::Client(err)) => log::info!("cannot verify {address:?}: {err}"),
            Err(Error::Server(err)) => log::error!("verification of {address:?} failed: {err}"),
        }
        metrics::count_verification(&result);
        result
    }

    pub async fn get_record(&self, address: Address) -> Result<Option<VerificationRecord>, Error> {
        Ok(self.store.get(address).await?)
    }

    /// Addresses first verified within `[start, end)`, oldest first.
    pub async fn list_verified(&self, start: u64, end: u64) -> Result<Vec<Address>, Error> {
        self.store.range_by_time(start, end).await
    }

    /// Accepted compiler versions, newest first.
    pub fn supported_versions(&self) -> Vec<CompilerVersion> {
        self.compiler.supported_versions()
    }

    async fn verify_inner(&self, context: &VerificationContext) -> Result<bool, Error> {
        let version = self.validate_version(context)?;
        let address = context.contract_address;

        if self.already_verified(context).await? {
            return Ok(true);
        }
        let settings = self.validate_settings(context, version)?;
        let _guard = self.in_flight.acquire(address).await;
        // someone may have finished the same verification while we waited
        if self.already_verified(context).await? {
            return Ok(true);
        }

        let ((deployed, abi), on_chain) = futures::try_join!(
            self.local_deployed_code(context, &settings),
            self.fetcher.deployed_code(address),
        )?;

        if bytecode::without_prefix(&on_chain).is_empty() {
            log::debug!("no code deployed at {address:?}");
            return Ok(false);
        }
        if !bytecode::same_code(bytecode::strip(&deployed), bytecode::strip(&on_chain)) {
            return Ok(false);
        }

        let record = VerificationRecord {
            context: context.clone(),
            abi,
            first_verified_time: now(),
        };
        if !self.store.put(&record).await? {
            log::warn!("{address:?} was verified by another writer");
        }
        Ok(true)
    }

    /// The submitted version must be spelled exactly as a whitelisted build.
    fn validate_version(&self, context: &VerificationContext) -> Result<CompilerVersion, Error> {
        let unsupported =
            || ClientError::UnsupportedCompilerVersion(context.compiler_version.clone());
        let version =
            CompilerVersion::from_str(&context.compiler_version).map_err(|_| unsupported())?;
        let exact = version.to_string() == context.compiler_version;
        if !exact || !self.compiler.is_supported(&version) {
            return Err(unsupported().into());
        }
        Ok(version)
    }

    fn validate_settings(
        &self,
        context: &VerificationContext,
        version: CompilerVersion,
    ) -> Result<ValidatedSettings, Error> {
        let optimization_runs = match (context.optimization_used, context.runs) {
            (false, _) => None,
            (true, Some(runs)) if runs > 0 => Some(runs),
            (true, _) => return Err(ClientError::InvalidOptimizationRuns.into()),
        };

        let evm_version = match &context.evm_version {
            None => self.default_evm_version,
            Some(name) => EvmVersion::from_str(name)
                .map_err(|_| ClientError::InvalidEvmVersion(name.clone()))?,
        };

        let params = deployment::parse_constructor(&context.constructor_signature)?;
        if params.len() != context.constructor_arguments.len() {
            return Err(ClientError::InvalidConstructorArguments(format!(
                "constructor expects {} arguments, {} given",
                params.len(),
                context.constructor_arguments.len()
            ))
            .into());
        }

        Ok(ValidatedSettings {
            version,
            optimization_runs,
            evm_version,
        })
    }

    async fn already_verified(&self, context: &VerificationContext) -> Result<bool, Error> {
        match self.store.get(context.contract_address).await? {
            Some(record) => {
                if !record.context.same_submission(context) {
                    log::warn!(
                        "{:?} is already verified with a different submission, \
                         keeping the first one",
                        context.contract_address
                    );
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deployed bytecode and ABI produced by the submitted source.
    async fn local_deployed_code(
        &self,
        context: &VerificationContext,
        settings: &ValidatedSettings,
    ) -> Result<(String, String), Error> {
        let output = self
            .compiler
            .compile(&CompilerInput {
                source: &context.flattened_source,
                contract_name: &context.contract_name,
                version: &settings.version,
                optimization_runs: settings.optimization_runs,
                evm_version: settings.evm_version,
            })
            .await?;
        let init_code = deployment::build_init_code(
            &context.constructor_signature,
            &context.constructor_arguments,
            &output.bytecode,
        )?;
        let deployed = self.simulator.deployed_code(&init_code).await?;
        Ok((deployed, output.abi))
    }
}

fn now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
