mod encoder;
mod simulator;

pub use encoder::{build_init_code, parse_constructor};
pub use simulator::{DeployCodeCli, DeploymentSimulator};
