use super::{
    handlers::{contracts, status, verification, version_list},
    response::ApiResponse,
};
use crate::{
    chain::RpcCodeFetcher,
    compiler::SolcCli,
    deployment::DeployCodeCli,
    storage::DatabaseStore,
    Settings, VerificationPipeline,
};
use actix_web::{error, web, HttpResponse};
use std::sync::Arc;

pub trait Router {
    fn register_routes(&self, service_config: &mut web::ServiceConfig);
}

pub fn configure_router(router: &impl Router) -> impl FnOnce(&mut web::ServiceConfig) + '_ {
    |service_config| router.register_routes(service_config)
}

pub struct AppRouter {
    pipeline: web::Data<VerificationPipeline>,
}

impl AppRouter {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let solidity = settings.solidity;
        let mut compiler = SolcCli::new(
            solidity.compilers_dir.clone(),
            solidity.executable_prefix.clone(),
            solidity.versions.clone(),
            solidity.timeout(),
        );
        if let Some(scratch_dir) = solidity.scratch_dir.clone() {
            compiler = compiler.with_scratch_root(scratch_dir);
        }

        let mut simulator =
            DeployCodeCli::new(settings.deployer.executable.clone(), settings.deployer.timeout());
        if let Some(library_path) = settings.deployer.library_path.clone() {
            simulator = simulator.with_library_path(library_path);
        }

        let fetcher = RpcCodeFetcher::new(
            settings.chain.rpc_url.clone(),
            settings.chain.request_timeout(),
        )?;
        let store = DatabaseStore::connect(&settings.database.url).await?;
        log::info!(
            "{} compiler versions enabled, records are kept in {}",
            solidity.versions.len(),
            settings.database.url
        );

        let pipeline = VerificationPipeline::new(
            Arc::new(compiler),
            Arc::new(simulator),
            Arc::new(fetcher),
            Arc::new(store),
        )
        .with_default_evm_version(solidity.default_evm_version);
        Ok(Self::from_pipeline(pipeline))
    }

    pub fn from_pipeline(pipeline: VerificationPipeline) -> Self {
        Self {
            pipeline: web::Data::new(pipeline),
        }
    }
}

fn bad_request(err: impl std::fmt::Display + std::fmt::Debug + 'static) -> error::Error {
    let response = HttpResponse::BadRequest().json(ApiResponse::<()>::err(&err));
    error::InternalError::from_response(err, response).into()
}

impl Router for AppRouter {
    fn register_routes(&self, service_config: &mut web::ServiceConfig) {
        service_config
            .app_data(self.pipeline.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| bad_request(err)))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| bad_request(err)))
            .route("/health", web::get().to(status::status))
            .route(
                "/verify-source-code",
                web::post().to(verification::verify),
            )
            .route(
                "/get-verify-info/{address}",
                web::get().to(contracts::get_verify_info),
            )
            .route("/get-abi/{address}", web::get().to(contracts::get_abi))
            .route(
                "/get-source-code/{address}",
                web::get().to(contracts::get_source_code),
            )
            .route(
                "/verified-contracts",
                web::get().to(contracts::verified_contracts),
            )
            .route(
                "/compiler-versions",
                web::get().to(version_list::get_version_list),
            );
    }
}
