#![allow(dead_code)]

use contract_verifier::Settings;
use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use url::Url;

pub const VERSION: &str = "v0.8.10+commit.fc410830";
pub const CONTRACT_ADDRESS: &str = "0x351264f24820C91317024B7748C98CA63d6a2781";
pub const CONTRACT_NAME: &str = "Storage";
pub const SOURCE: &str = "pragma solidity ^0.8.0;\ncontract Storage { uint256 value; }\n";
pub const ABI: &str = r#"[{"inputs":[],"name":"value","outputs":[{"internalType":"uint256","name":"","type":"uint256"}],"stateMutability":"view","type":"function"}]"#;
pub const CREATION_CODE: &str = "6080604052348015600f57600080fd5b50";
pub const RUNTIME_CODE: &str = "6080604052600080fd";

/// CBOR metadata block as solc appends it, with `hash_byte` filling the
/// ipfs hash.
pub fn metadata(hash_byte: u8) -> String {
    format!(
        "a2646970667358221220{}64736f6c634300080a0033",
        hex::encode([hash_byte; 32])
    )
}

pub fn write_script(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Everything a server needs on disk: a fake compiler, a fake deployer
/// and a sqlite database.
pub struct Environment {
    pub dir: TempDir,
}

impl Environment {
    /// `deployed` is what the fake deployer prints for any init code.
    pub fn new(deployed: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let solc = dir
            .path()
            .join("solc-bin")
            .join(format!("solc-linux-amd64-{VERSION}"));
        write_script(
            &solc,
            &format!(
                r#"out=''
while [ $# -gt 0 ]; do
    case "$1" in
        --output-dir) out="$2"; shift 2 ;;
        *) shift ;;
    esac
done
mkdir -p "$out"
printf '%s' '{CREATION_CODE}' > "$out/{CONTRACT_NAME}.bin"
printf '%s' '{ABI}' > "$out/{CONTRACT_NAME}.abi"
"#
            ),
        );
        write_script(
            &dir.path().join("deploycode"),
            &format!(
                "cat > '{}'\nprintf '%s\\n' '{deployed}'\n",
                dir.path().join("init_code").display()
            ),
        );
        Self { dir }
    }

    pub fn settings(&self, rpc_url: &str) -> Settings {
        let mut settings = Settings::default();
        settings.solidity.compilers_dir = self.dir.path().join("solc-bin");
        settings.solidity.executable_prefix = "solc-linux-amd64-".to_string();
        settings.solidity.versions = vec![VERSION.parse().unwrap()];
        settings.deployer.executable = self.dir.path().join("deploycode");
        settings.deployer.library_path = None;
        settings.chain.rpc_url = Url::parse(rpc_url).unwrap();
        settings.database.url = format!(
            "sqlite://{}?mode=rwc",
            self.dir.path().join("contracts.sqlite").display()
        );
        settings
    }

    /// Init code the deployer received on its last run.
    pub fn init_code(&self) -> String {
        fs::read_to_string(self.init_code_path()).unwrap()
    }

    fn init_code_path(&self) -> PathBuf {
        self.dir.path().join("init_code")
    }
}

pub fn request(contract_address: &str) -> serde_json::Value {
    serde_json::json!({
        "contractAddress": contract_address,
        "contractName": CONTRACT_NAME,
        "flattenedSource": SOURCE,
        "compilerVersion": VERSION,
        "optimizationUsed": true,
        "runs": "200",
        "constructor": "constructor(uint256,address)",
        "constructorArguments": ["7", "0x0000000000000000000000000000000000000001"],
    })
}
