use crate::{process, Error, ServerError};
use async_trait::async_trait;
use std::{path::PathBuf, time::Duration};
use tokio::process::Command;

/// Turns a contract creation payload into the runtime bytecode the
/// deployment would leave on chain.
#[async_trait]
pub trait DeploymentSimulator: Send + Sync {
    /// `init_code` is hex without the `0x` prefix; so is the result.
    async fn deployed_code(&self, init_code: &str) -> Result<String, Error>;
}

/// Runs the external `deploycode` executable. It reads the init code from
/// stdin and prints the deployed bytecode to stdout.
pub struct DeployCodeCli {
    executable: PathBuf,
    library_path: Option<PathBuf>,
    timeout: Duration,
}

impl DeployCodeCli {
    pub fn new(executable: PathBuf, timeout: Duration) -> Self {
        Self {
            executable,
            library_path: None,
            timeout,
        }
    }

    /// Sets `LD_LIBRARY_PATH` of the child process.
    pub fn with_library_path(mut self, library_path: PathBuf) -> Self {
        self.library_path = Some(library_path);
        self
    }
}

#[async_trait]
impl DeploymentSimulator for DeployCodeCli {
    async fn deployed_code(&self, init_code: &str) -> Result<String, Error> {
        let mut command = Command::new(&self.executable);
        if let Some(library_path) = &self.library_path {
            command.env("LD_LIBRARY_PATH", library_path);
        }
        log::debug!(
            "running {} with {} bytes of init code",
            self.executable.display(),
            init_code.len() / 2
        );

        let output = process::run(command, Some(init_code.as_bytes()), self.timeout)
            .await
            .map_err(ServerError::DeploymentProcess)?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !output.status.success() {
            return Err(ServerError::Deployment(format!(
                "exited with {}: {stderr}",
                output.status
            ))
            .into());
        }
        if !stderr.is_empty() {
            return Err(ServerError::Deployment(stderr.to_string()).into());
        }

        let deployed = String::from_utf8_lossy(&output.stdout);
        let deployed = deployed.trim();
        if hex::decode(deployed.trim_start_matches("0x")).is_err() {
            return Err(ServerError::Deployment(format!(
                "output is not a hex string: {deployed}"
            ))
            .into());
        }
        Ok(deployed.to_string())
    }
}
