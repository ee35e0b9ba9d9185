pub mod handlers;
mod metrics;
pub mod response;
mod routers;

pub use self::routers::{configure_router, AppRouter, Router};

use crate::Settings;
use actix_web::{middleware::Logger, App, HttpServer};
use metrics::Metrics;
use std::sync::Arc;

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let socket_addr = settings.server.addr;
    let metrics_settings = settings.metrics.clone();

    log::info!("Verification server is starting at {}", socket_addr);
    let app_router = Arc::new(AppRouter::new(settings).await?);
    let metrics = Metrics::new(&metrics_settings.route)?;

    let server_future = {
        let middleware = metrics.middleware().clone();
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::default())
                .wrap(middleware.clone())
                .configure(configure_router(&*app_router))
        })
        .bind(socket_addr)?
        .run()
    };

    if metrics_settings.enabled {
        log::info!("Metrics server is starting at {}", metrics_settings.addr);
        let metrics_future = metrics.run_server(metrics_settings.addr)?;
        futures::future::try_join(server_future, metrics_future).await?;
    } else {
        server_future.await?;
    }
    Ok(())
}
