/* This file is part of solsmith
 *
 * Copyright (C) 2024-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Thin JSON-RPC 2.0 client for the local validator endpoint. Only the two
//! calls the bootstrap needs; everything heavier lives behind the collaborator
//! traits in [`crate::bootstrap`].

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use log::debug;
use smol::Timer;
use tinyjson::JsonValue::{self, Number as JsonNum, Object as JsonObj, String as JsonStr};
use url::Url;

use crate::{bootstrap::ChainRpc, Error, Result};

/// Attempts made while waiting for a transaction to confirm.
const CONFIRM_ATTEMPTS: usize = 30;

/// Pause between confirmation attempts.
const CONFIRM_PAUSE: Duration = Duration::from_millis(500);

// Helper functions
pub fn json_map<const N: usize>(vals: [(&str, JsonValue); N]) -> JsonValue {
    JsonObj(HashMap::from(vals.map(|(k, v)| (k.to_string(), v))))
}

pub fn json_str(val: &str) -> JsonValue {
    JsonStr(val.to_string())
}

/// JSON-RPC over HTTP POST against a single endpoint.
pub struct HttpRpc {
    url: Url,
}

impl HttpRpc {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    async fn request(&self, method: &str, params: JsonValue) -> Result<JsonValue> {
        let req = json_map([
            ("jsonrpc", json_str("2.0")),
            ("id", JsonNum(1.0)),
            ("method", json_str(method)),
            ("params", params),
        ]);

        debug!(target: "rpc", "--> {}", req.stringify()?);

        let client = surf::Client::new();
        let mut rep = client
            .post(self.url.as_str())
            .header("Content-Type", "application/json")
            .body(req.stringify()?)
            .send()
            .await
            .map_err(|e| Error::JsonRpcError(format!("HTTP request failed: {}", e)))?;

        let body = rep
            .body_string()
            .await
            .map_err(|e| Error::JsonRpcError(format!("Failed reading response body: {}", e)))?;

        debug!(target: "rpc", "<-- {}", body.trim_end());

        let json: JsonValue = body.parse()?;
        let Some(fields) = json.get::<HashMap<String, JsonValue>>() else {
            return Err(Error::JsonRpcError("response is not an object".to_string()))
        };

        if let Some(err) = fields.get("error") {
            return Err(Error::JsonRpcError(err.stringify()?))
        }

        fields
            .get("result")
            .cloned()
            .ok_or_else(|| Error::JsonRpcError("result missing from response".to_string()))
    }
}

#[async_trait]
impl ChainRpc for HttpRpc {
    async fn request_airdrop(&self, address: &str, lamports: u64) -> Result<String> {
        let params = JsonValue::Array(vec![json_str(address), JsonNum(lamports as f64)]);
        let result = self.request("requestAirdrop", params).await?;

        result
            .get::<String>()
            .cloned()
            .ok_or_else(|| Error::JsonRpcError("airdrop signature missing".to_string()))
    }

    /// Wait until the transaction reaches confirmed commitment. This is the
    /// confirmation semantics of the call itself, bounded so a dead validator
    /// cannot stall the bootstrap forever.
    async fn confirm_transaction(&self, signature: &str) -> Result<()> {
        let commitment = json_map([("commitment", json_str("confirmed"))]);

        for _ in 0..CONFIRM_ATTEMPTS {
            let params =
                JsonValue::Array(vec![json_str(signature), commitment.clone()]);
            let result = self.request("confirmTransaction", params).await?;

            // The reply is either a bare bool or {context, value}.
            let confirmed = match &result {
                JsonValue::Boolean(v) => *v,
                _ => result
                    .get::<HashMap<String, JsonValue>>()
                    .and_then(|fields| fields.get("value"))
                    .and_then(|v| v.get::<bool>())
                    .copied()
                    .unwrap_or(false),
            };

            if confirmed {
                return Ok(())
            }

            Timer::after(CONFIRM_PAUSE).await;
        }

        Err(Error::JsonRpcError(format!("transaction {} was not confirmed", signature)))
    }
}
