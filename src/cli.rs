use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a toml config. Values from `CONTRACT_VERIFIER__*` env variables override it.
    #[clap(short, long)]
    pub config_path: Option<PathBuf>,
}
