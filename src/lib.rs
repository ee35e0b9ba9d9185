pub mod bytecode;
pub mod chain;
pub mod compiler;
mod consts;
pub mod deployment;
mod errors;
mod http_server;
mod metrics;
mod process;
mod settings;
pub mod storage;
mod types;
mod verifier;


pub use self::settings::Settings;
pub use errors::{ClientError, Error, ServerError};
pub use http_server::{
    configure_router,
    response::{ApiError, ApiResponse, VerificationResponse},
    run as run_http_server, AppRouter, Router,
};
pub use process::ProcessError;
pub use types::{VerificationContext, VerificationRecord};
pub use verifier::VerificationPipeline;
