//! Deployed bytecode retrieval from the configured chain.

use crate::{Error, ServerError};
use async_trait::async_trait;
use ethers_core::types::Address;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[async_trait]
pub trait CodeFetcher: Send + Sync {
    /// Hex encoded code currently deployed at `address`, `0x` prefixed.
    /// Accounts without code return `0x`.
    async fn deployed_code(&self, address: Address) -> Result<String, Error>;
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

/// `eth_getCode` over JSON-RPC.
pub struct RpcCodeFetcher {
    client: reqwest::Client,
    url: Url,
}

impl RpcCodeFetcher {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl CodeFetcher for RpcCodeFetcher {
    async fn deployed_code(&self, address: Address) -> Result<String, Error> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_getCode",
            "params": [format!("{address:?}"), "latest"],
            "id": 1
        });
        let rpc_error = |err: reqwest::Error| ServerError::Rpc(err.to_string());

        let response: RpcResponse = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(rpc_error)?
            .error_for_status()
            .map_err(rpc_error)?
            .json()
            .await
            .map_err(rpc_error)?;

        match response {
            RpcResponse {
                error: Some(err), ..
            } => Err(ServerError::Rpc(format!("{} (code {})", err.message, err.code)).into()),
            RpcResponse {
                result: Some(code), ..
            } if code.starts_with("0x") && hex::decode(&code[2..]).is_ok() => Ok(code),
            RpcResponse {
                result: Some(code), ..
            } => Err(ServerError::Rpc(format!("invalid code returned: {code}")).into()),
            RpcResponse { result: None, .. } => {
                Err(ServerError::Rpc("response contains no result".to_string()).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, ResponseTemplate,
    };

    const ADDRESS: &str = "0x351264f24820C91317024B7748C98CA63d6a2781";

    async fn fetch(server: &MockServer) -> Result<String, Error> {
        let fetcher = RpcCodeFetcher::new(
            Url::parse(&server.uri()).unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        fetcher
            .deployed_code(Address::from_str(ADDRESS).unwrap())
            .await
    }

    #[tokio::test]
    async fn returns_deployed_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "method": "eth_getCode",
                "params": ["0x351264f24820c91317024b7748c98ca63d6a2781", "latest"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0x6080604052"
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(fetch(&server).await.unwrap(), "0x6080604052");
    }

    #[tokio::test]
    async fn rpc_error_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32000, "message": "header not found"}
            })))
            .mount(&server)
            .await;

        let err = fetch(&server).await.unwrap_err();
        assert!(
            matches!(
                err,
                Error::Server(ServerError::Rpc(ref message)) if message.contains("header not found")
            ),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn http_failure_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        assert!(fetch(&server).await.unwrap_err().is_server());
    }

    #[tokio::test]
    async fn malformed_result_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "not a code"
            })))
            .mount(&server)
            .await;

        assert!(fetch(&server).await.unwrap_err().is_server());
    }

    #[tokio::test]
    async fn slow_node_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": "0x"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = RpcCodeFetcher::new(
            Url::parse(&server.uri()).unwrap(),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = fetcher
            .deployed_code(Address::from_str(ADDRESS).unwrap())
            .await
            .unwrap_err();
        assert!(err.is_server());
    }
}
