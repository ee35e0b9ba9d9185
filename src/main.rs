use anyhow::Context;
use clap::Parser;
use contract_verifier::{run_http_server, Settings};

mod cli;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = cli::Args::parse();
    let settings = Settings::build(args.config_path).context("failed to parse config")?;
    run_http_server(settings).await
}
