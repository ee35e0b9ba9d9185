use actix_web::{dev::Server, App, HttpServer};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use std::net::SocketAddr;

#[derive(Clone)]
pub struct Metrics {
    metrics_middleware: PrometheusMetrics,
    http_middleware: PrometheusMetrics,
}

impl Metrics {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let registry = prometheus::default_registry();
        let metrics_middleware = PrometheusMetricsBuilder::new("contract_verifier_metrics")
            .registry(registry.clone())
            .endpoint(endpoint)
            .build()
            .map_err(|err| anyhow::anyhow!("cannot build metrics middleware: {err}"))?;
        // note: http middleware has no endpoint
        let http_middleware = PrometheusMetricsBuilder::new("contract_verifier")
            .registry(registry.clone())
            .build()
            .map_err(|err| anyhow::anyhow!("cannot build metrics middleware: {err}"))?;

        Ok(Self {
            metrics_middleware,
            http_middleware,
        })
    }

    pub fn middleware(&self) -> &PrometheusMetrics {
        &self.http_middleware
    }

    pub fn run_server(&self, addr: SocketAddr) -> std::io::Result<Server> {
        let metrics_middleware = self.metrics_middleware.clone();
        Ok(
            HttpServer::new(move || App::new().wrap(metrics_middleware.clone()))
                .bind(addr)?
                .run(),
        )
    }
}
