// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tendermint RPC client for TruChain queries.
//!
//! Custom queries go through `abci_query` with path `custom/<module>/<query>`
//! and hex encoded JSON parameters. The response value is base64 encoded
//! JSON.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::events::BlockResults;
use super::types::{AppAccount, Argument, Claim, Community, Params, Stake};
use super::{ChainError, ChainQuerier, TxEvent};
use crate::config::ChainConfig;

/// HTTP client for a Tendermint node.
#[derive(Clone)]
pub struct ChainClient {
    http: reqwest::Client,
    rpc_url: String,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: String,
}

#[derive(Deserialize)]
struct AbciQueryResult {
    response: AbciResponse,
}

#[derive(Deserialize)]
struct AbciResponse {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    log: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct StatusResult {
    sync_info: SyncInfo,
}

#[derive(Deserialize)]
struct SyncInfo {
    latest_block_height: String,
}

impl ChainClient {
    pub fn new(http: reqwest::Client, config: &ChainConfig) -> Self {
        Self {
            http,
            rpc_url: config.rpc_url.trim_end_matches('/').to_string(),
        }
    }

    /// Run a custom ABCI query and decode its JSON value.
    pub async fn query<P: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        params: &P,
    ) -> Result<T, ChainError> {
        let data = serde_json::to_vec(params)
            .map_err(|e| ChainError::Decode(format!("encoding params: {e}")))?;
        let path_arg = format!("\"{path}\"");
        let data_arg = format!("0x{}", hex::encode(data));

        let result: AbciQueryResult = self
            .rpc("abci_query", &[("path", path_arg.as_str()), ("data", data_arg.as_str())])
            .await?;
        let response = result.response;

        if response.code != 0 {
            if response.log.to_lowercase().contains("not found") {
                return Err(ChainError::NotFound(format!("{path}: {}", response.log)));
            }
            return Err(ChainError::Query {
                code: response.code,
                log: response.log,
            });
        }

        let value = response
            .value
            .ok_or_else(|| ChainError::NotFound(path.to_string()))?;
        let bytes = STANDARD
            .decode(value)
            .map_err(|e| ChainError::Decode(format!("{path}: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| ChainError::Decode(format!("{path}: {e}")))
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ChainError> {
        let url = format!("{}/{}", self.rpc_url, method);
        let response = self.http.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Query {
                code: u32::from(status.as_u16()),
                log: body,
            });
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::Decode(format!("{method}: {e}")))?;
        if let Some(err) = body.error {
            return Err(ChainError::Query {
                code: 0,
                log: format!("{} {}", err.message, err.data).trim().to_string(),
            });
        }
        body.result
            .ok_or_else(|| ChainError::Decode(format!("{method}: empty result")))
    }
}

#[async_trait]
impl ChainQuerier for ChainClient {
    async fn claim(&self, id: i64) -> Result<Claim, ChainError> {
        self.query("custom/claim/claim", &json!({ "id": id })).await
    }

    async fn claims(&self) -> Result<Vec<Claim>, ChainError> {
        self.query("custom/claim/claims", &json!({})).await
    }

    async fn community_claims(&self, community_id: &str) -> Result<Vec<Claim>, ChainError> {
        self.query(
            "custom/claim/community_claims",
            &json!({ "community_id": community_id }),
        )
        .await
    }

    async fn claims_by_creator(&self, address: &str) -> Result<Vec<Claim>, ChainError> {
        self.query("custom/claim/creator_claims", &json!({ "creator": address }))
            .await
    }

    async fn communities(&self) -> Result<Vec<Community>, ChainError> {
        self.query("custom/community/communities", &json!({})).await
    }

    async fn community(&self, id: &str) -> Result<Community, ChainError> {
        self.query("custom/community/community", &json!({ "id": id }))
            .await
    }

    async fn argument(&self, id: i64) -> Result<Argument, ChainError> {
        self.query("custom/staking/argument", &json!({ "argument_id": id }))
            .await
    }

    async fn claim_arguments(&self, claim_id: i64) -> Result<Vec<Argument>, ChainError> {
        self.query(
            "custom/staking/claim_arguments",
            &json!({ "claim_id": claim_id }),
        )
        .await
    }

    async fn arguments_by_creator(&self, address: &str) -> Result<Vec<Argument>, ChainError> {
        self.query("custom/staking/user_arguments", &json!({ "address": address }))
            .await
    }

    async fn argument_stakes(&self, argument_id: i64) -> Result<Vec<Stake>, ChainError> {
        self.query(
            "custom/staking/argument_stakes",
            &json!({ "argument_id": argument_id }),
        )
        .await
    }

    async fn stakes_by_creator(&self, address: &str) -> Result<Vec<Stake>, ChainError> {
        self.query("custom/staking/user_stakes", &json!({ "address": address }))
            .await
    }

    async fn app_account(&self, address: &str) -> Result<AppAccount, ChainError> {
        self.query("custom/account/app_account", &json!({ "address": address }))
            .await
    }

    async fn params(&self) -> Result<Params, ChainError> {
        self.query("custom/params/params", &json!({})).await
    }

    async fn latest_height(&self) -> Result<i64, ChainError> {
        let status: StatusResult = self.rpc("status", &[]).await?;
        status
            .sync_info
            .latest_block_height
            .parse()
            .map_err(|e| ChainError::Decode(format!("latest_block_height: {e}")))
    }

    async fn tx_events(&self, height: i64) -> Result<Vec<TxEvent>, ChainError> {
        let height_arg = height.to_string();
        let results: BlockResults = self
            .rpc("block_results", &[("height", height_arg.as_str())])
            .await?;
        Ok(results.into_events(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::Value;
    use std::collections::HashMap;

    fn abci_response(response: Value) -> Json<Value> {
        Json(json!({"jsonrpc": "2.0", "id": -1, "result": {"response": response}}))
    }

    /// Minimal Tendermint node.
    async fn abci_query(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let path = params.get("path").map(String::as_str).unwrap_or_default();
        let data = params
            .get("data")
            .and_then(|d| d.strip_prefix("0x"))
            .and_then(|d| hex::decode(d).ok())
            .and_then(|d| serde_json::from_slice::<Value>(&d).ok())
            .unwrap_or(Value::Null);

        match path {
            "\"custom/community/community\"" if data == json!({"id": "crypto"}) => {
                let community = json!({"id": "crypto", "name": "Crypto", "description": ""});
                abci_response(json!({"code": 0, "value": STANDARD.encode(community.to_string())}))
            }
            "\"custom/claim/claim\"" => {
                abci_response(json!({"code": 1, "log": "Unknown claim: claim not found"}))
            }
            "\"custom/staking/argument\"" => {
                abci_response(json!({"code": 0, "value": "%%not base64%%"}))
            }
            _ => abci_response(json!({"code": 12, "log": "unknown request"})),
        }
    }

    async fn status() -> Json<Value> {
        Json(json!({"result": {"sync_info": {"latest_block_height": "42"}}}))
    }

    async fn block_results(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        if params.get("height").map(String::as_str) != Some("7") {
            return Json(json!({"error": {
                "code": -32603,
                "message": "Internal error",
                "data": "height must be less than or equal to the current blockchain height"
            }}));
        }
        Json(json!({"result": {"txs_results": [{
            "code": 0,
            "data": STANDARD.encode(r#"{"id": 3}"#),
            "events": [{"type": "message", "attributes": [
                {"key": "action", "value": "create-argument"}
            ]}]
        }]}}))
    }

    async fn client() -> ChainClient {
        let router = Router::new()
            .route("/abci_query", get(abci_query))
            .route("/status", get(status))
            .route("/block_results", get(block_results));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let config = ChainConfig {
            rpc_url: format!("http://{addr}/"),
            ..Config::test_default().chain
        };
        ChainClient::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_query_sends_hex_params_and_decodes_value() {
        let chain = client().await;
        let community = chain.community("crypto").await.unwrap();
        assert_eq!(community.name, "Crypto");
    }

    #[tokio::test]
    async fn test_query_error_codes() {
        let chain = client().await;

        let err = chain.claim(9).await.unwrap_err();
        assert!(matches!(err, ChainError::NotFound(_)), "{err:?}");

        let err = chain.params().await.unwrap_err();
        assert!(
            matches!(err, ChainError::Query { code: 12, ref log } if log == "unknown request"),
            "{err:?}"
        );

        let err = chain.argument(1).await.unwrap_err();
        assert!(matches!(err, ChainError::Decode(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_latest_height_and_block_events() {
        let chain = client().await;
        assert_eq!(chain.latest_height().await.unwrap(), 42);

        let events = chain.tx_events(7).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].height, 7);
        assert_eq!(events[0].action, "create-argument");

        let err = chain.tx_events(8).await.unwrap_err();
        assert!(
            matches!(err, ChainError::Query { code: 0, ref log } if log.starts_with("Internal error")),
            "{err:?}"
        );
    }
}
