use crate::{
    compiler::{CompilerVersion, EvmVersion},
    consts::{
        DEFAULT_CHAIN_RPC_URL, DEFAULT_COMPILERS_DIR, DEFAULT_COMPILER_PREFIX,
        DEFAULT_DATABASE_URL, DEFAULT_DEPLOYER_EXECUTABLE, DEFAULT_EVM_VERSION,
        DEFAULT_METRICS_ENDPOINT, DEFAULT_SERVER_ADDR, DEFAULT_SUPPORTED_VERSIONS,
    },
};
use anyhow::anyhow;
use config::{Config, File};
use serde::{de::IgnoredAny, Deserialize};
use serde_with::{serde_as, DisplayFromStr};
use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};
use url::Url;

const CONFIG_ENV_VAR: &str = "CONTRACT_VERIFIER__CONFIG";
const ENV_PREFIX: &str = "CONTRACT_VERIFIER";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub server: ServerSettings,
    pub solidity: SoliditySettings,
    pub deployer: DeployerSettings,
    pub chain: ChainSettings,
    pub database: DatabaseSettings,
    pub metrics: MetricsSettings,

    // Allows the config path to be passed through PREFIX__CONFIG while
    // unknown fields are denied.
    #[serde(rename = "config")]
    pub config_path: IgnoredAny,
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.server == other.server
            && self.solidity == other.solidity
            && self.deployer == other.deployer
            && self.chain == other.chain
            && self.database == other.database
            && self.metrics == other.metrics
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from_str(DEFAULT_SERVER_ADDR).expect("should be valid url"),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoliditySettings {
    /// Executables are looked up as `<compilers_dir>/<executable_prefix><version>`.
    pub compilers_dir: PathBuf,
    pub executable_prefix: String,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub versions: Vec<CompilerVersion>,
    #[serde(with = "serde_with::rust::display_fromstr")]
    pub default_evm_version: EvmVersion,
    /// Seconds.
    pub timeout: u64,
    /// Parent of the per-compilation scratch directories; the system
    /// temp dir if unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for SoliditySettings {
    fn default() -> Self {
        Self {
            compilers_dir: PathBuf::from(DEFAULT_COMPILERS_DIR),
            executable_prefix: DEFAULT_COMPILER_PREFIX.to_string(),
            versions: DEFAULT_SUPPORTED_VERSIONS
                .iter()
                .map(|v| CompilerVersion::from_str(v).expect("valid version"))
                .collect(),
            default_evm_version: EvmVersion::from_str(DEFAULT_EVM_VERSION)
                .expect("valid evm version"),
            timeout: 60,
            scratch_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployerSettings {
    pub executable: PathBuf,
    /// `LD_LIBRARY_PATH` of the deployer process.
    pub library_path: Option<PathBuf>,
    pub timeout: u64,
}

impl Default for DeployerSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_DEPLOYER_EXECUTABLE),
            library_path: Some(PathBuf::from(".")),
            timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainSettings {
    pub rpc_url: Url,
    pub request_timeout: u64,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            rpc_url: Url::try_from(DEFAULT_CHAIN_RPC_URL).expect("valid url"),
            request_timeout: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub addr: SocketAddr,
    pub route: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: SocketAddr::from_str("0.0.0.0:6060").expect("should be valid url"),
            route: DEFAULT_METRICS_ENDPOINT.to_string(),
        }
    }
}

impl SoliditySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl DeployerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl ChainSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Settings {
    /// Reads the file named by `CONTRACT_VERIFIER__CONFIG`, if any, and the
    /// environment.
    pub fn new() -> anyhow::Result<Self> {
        let config_path = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        Self::build(config_path)
    }

    /// Like [`Settings::new`], with `config_path` taking precedence over
    /// the environment variable.
    pub fn build(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path =
            config_path.or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

        let mut builder = Config::builder();
        if let Some(config_path) = config_path {
            builder = builder.add_source(File::from(config_path));
        };
        // Use `__` so that it would be possible to address keys with underscores
        // in names (e.g. `rpc_url`)
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.solidity.versions.is_empty() {
            return Err(anyhow!("at least one compiler version should be enabled"));
        }
        if self.solidity.timeout == 0 || self.deployer.timeout == 0 {
            return Err(anyhow!("process timeouts should be positive"));
        }
        if self.chain.request_timeout == 0 {
            return Err(anyhow!("rpc request timeout should be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        settings.validate().expect("defaults are valid");
        assert_eq!(settings.solidity.default_evm_version, EvmVersion::Istanbul);
        assert_eq!(
            settings.solidity.versions.len(),
            DEFAULT_SUPPORTED_VERSIONS.len()
        );
    }

    #[test]
    fn empty_version_list_is_rejected() {
        let mut settings = Settings::default();
        settings.solidity.versions.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut settings = Settings::default();
        settings.deployer.timeout = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.chain.request_timeout = 0;
        assert!(settings.validate().is_err());
    }
}
