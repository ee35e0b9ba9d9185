//! Compiles flattened sources by running a pinned `solc` binary with
//! `--bin --abi` output into a scratch directory.

use super::{Compiler, CompilerInput, CompilerOutput, CompilerVersion};
use crate::{metrics, process, ClientError, Error, ServerError};
use async_trait::async_trait;
use std::{
    collections::BTreeSet,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};
use tempfile::TempDir;
use tokio::process::Command;

const SOURCE_FILE_NAME: &str = "in.sol";
const OUTPUT_DIR_NAME: &str = "out";
const SCRATCH_DIR_PREFIX: &str = "verifier";

const ERROR_MARKER: &str = "Error:";

#[derive(Debug, PartialEq, Eq)]
struct InputArgs {
    optimization_runs: Option<u32>,
    evm_version: String,
}

impl From<&CompilerInput<'_>> for InputArgs {
    fn from(input: &CompilerInput<'_>) -> Self {
        Self {
            optimization_runs: input.optimization_runs,
            evm_version: input.evm_version.to_string(),
        }
    }
}

impl InputArgs {
    fn build(&self, source: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "--bin".to_string(),
            "--abi".to_string(),
            "--input-file".to_string(),
            source.to_string_lossy().into_owned(),
            "--output-dir".to_string(),
            output_dir.to_string_lossy().into_owned(),
            "--evm-version".to_string(),
            self.evm_version.clone(),
        ];
        if let Some(runs) = self.optimization_runs {
            args.push("--optimize".to_string());
            args.push("--optimize-runs".to_string());
            args.push(runs.to_string());
        }
        args
    }
}

pub struct SolcCli {
    compilers_dir: PathBuf,
    executable_prefix: String,
    versions: BTreeSet<CompilerVersion>,
    timeout: Duration,
    scratch_root: Option<PathBuf>,
}

impl SolcCli {
    pub fn new(
        compilers_dir: PathBuf,
        executable_prefix: impl Into<String>,
        versions: impl IntoIterator<Item = CompilerVersion>,
        timeout: Duration,
    ) -> Self {
        Self {
            compilers_dir,
            executable_prefix: executable_prefix.into(),
            versions: versions.into_iter().collect(),
            timeout,
            scratch_root: None,
        }
    }

    /// Creates scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: PathBuf) -> Self {
        self.scratch_root = Some(root);
        self
    }

    pub fn executable_path(&self, version: &CompilerVersion) -> PathBuf {
        self.compilers_dir
            .join(format!("{}{}", self.executable_prefix, version))
    }

    fn scratch_dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_DIR_PREFIX);
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }

    async fn compile_in(
        &self,
        dir: &Path,
        executable: &Path,
        input: &CompilerInput<'_>,
    ) -> Result<CompilerOutput, Error> {
        let source_path = dir.join(SOURCE_FILE_NAME);
        tokio::fs::write(&source_path, input.source)
            .await
            .map_err(ServerError::CompilerInput)?;

        let output_dir = dir.join(OUTPUT_DIR_NAME);
        let args = InputArgs::from(input).build(&source_path, &output_dir);
        log::debug!("running {} {}", executable.display(), args.join(" "));

        let mut command = Command::new(executable);
        command.args(&args).current_dir(dir);
        let output = {
            let _timer = metrics::COMPILE_TIME.start_timer();
            process::run(command, None, self.timeout)
                .await
                .map_err(ServerError::CompilerProcess)?
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        let errors = error_diagnostics(&stderr);
        if !errors.is_empty() {
            return Err(ClientError::Compilation(errors).into());
        }
        if !output.status.success() {
            return Err(ServerError::CompilerFailed {
                status: output.status,
                stderr: stderr.trim().to_string(),
            }
            .into());
        }

        let bytecode = read_artifact(&output_dir, input.contract_name, "bin").await?;
        if bytecode.is_empty() {
            return Err(ClientError::EmptyBytecode(input.contract_name.to_string()).into());
        }
        if bytecode.contains("__") {
            return Err(ClientError::UnlinkedLibraries(input.contract_name.to_string()).into());
        }
        let abi = read_artifact(&output_dir, input.contract_name, "abi").await?;

        Ok(CompilerOutput { bytecode, abi })
    }
}

#[async_trait]
impl Compiler for SolcCli {
    fn is_supported(&self, version: &CompilerVersion) -> bool {
        self.versions.contains(version)
    }

    fn supported_versions(&self) -> Vec<CompilerVersion> {
        self.versions.iter().rev().cloned().collect()
    }

    async fn compile(&self, input: &CompilerInput<'_>) -> Result<CompilerOutput, Error> {
        if !self.is_supported(input.version) {
            return Err(ClientError::UnsupportedCompilerVersion(input.version.to_string()).into());
        }
        let executable = self.executable_path(input.version);

        let scratch = self.scratch_dir().map_err(ServerError::ScratchDir)?;
        let result = self.compile_in(scratch.path(), &executable, input).await;
        let scratch_path = scratch.path().to_path_buf();

        match (result, scratch.close()) {
            (Ok(output), Ok(())) => Ok(output),
            (Ok(_), Err(err)) => Err(ServerError::ScratchCleanup(err).into()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup_err)) => {
                log::error!(
                    "cannot remove temp dir {}: {}",
                    scratch_path.display(),
                    cleanup_err
                );
                Err(err)
            }
        }
    }
}

/// Collects the diagnostic lines reporting errors. Solc may exit
/// successfully and still report fatal errors on stderr.
fn error_diagnostics(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter(|line| line.contains(ERROR_MARKER))
        .map(|line| line.trim().to_string())
        .collect()
}

fn is_valid_contract_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

async fn read_artifact(
    output_dir: &Path,
    contract_name: &str,
    extension: &str,
) -> Result<String, Error> {
    // the name becomes a path component
    if !is_valid_contract_name(contract_name) {
        return Err(ClientError::ContractNotFound(contract_name.to_string()).into());
    }
    let path = output_dir.join(format!("{contract_name}.{extension}"));
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(content.trim().to_string()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(ClientError::ContractNotFound(contract_name.to_string()).into())
        }
        Err(err) => Err(ServerError::CompilerOutput(err).into()),
    }
}
