// Copyright 2026 The Aura Sentinel Authors.
// This file is part of aura-sentinel.

// aura-sentinel is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// aura-sentinel is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with aura-sentinel.  If not, see <http://www.gnu.org/licenses/>.

//! An HTTP JSON-RPC 2.0 client for the upstream node, with the node's
//! transport hiccups absorbed by [`crate::retry::call_with_endless_retry`].

use ethereum_types::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use monitor_types::RawBlock;

use crate::abi;
use crate::error::RpcError;
use crate::retry::call_with_endless_retry;

/// Reads the monitor needs from an Aura-speaking JSON-RPC endpoint.
///
/// `get_block_by_*` return `Ok(None)` for a null response (block not yet
/// known to the node); whether that absence is expected or a fault is a
/// policy question for the caller, not this trait.
pub trait NodeRpc {
    fn block_number(&self) -> Result<u64, RpcError>;
    fn get_block_by_number(&self, number: u64) -> Result<Option<RawBlock>, RpcError>;
    fn get_block_by_hash(&self, hash: ethereum_types::H256) -> Result<Option<RawBlock>, RpcError>;

    /// Reads the validator contract's `getEpochStartHeights()`.
    fn get_epoch_start_heights(&self, contract: Address) -> Result<Vec<u64>, RpcError>;

    /// Reads the validator contract's `getValidators(uint256)` at a given
    /// epoch start height.
    fn get_validators(&self, contract: Address, epoch_start_height: u64) -> Result<Vec<Address>, RpcError>;
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

pub struct HttpRpcClient {
    uri: String,
    http: reqwest::blocking::Client,
}

impl HttpRpcClient {
    pub fn new(uri: impl Into<String>) -> Self {
        HttpRpcClient {
            uri: uri.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn call_once(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };
        let response = self
            .http
            .post(&self.uri)
            .json(&request)
            .send()
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            // Server errors are usually transient (node restarting, behind a
            // load balancer that's unhealthy); client errors are not.
            return if status.is_server_error() {
                Err(RpcError::Transport(format!("http status {status}")))
            } else {
                Err(RpcError::Protocol(format!("http status {status}")))
            };
        }

        let body: JsonRpcResponse = response
            .json()
            .map_err(|e| RpcError::Transport(format!("invalid JSON-RPC envelope: {e}")))?;

        if let Some(error) = body.error {
            return Err(RpcError::Protocol(format!(
                "({}) {}",
                error.code, error.message
            )));
        }
        body.result
            .ok_or_else(|| RpcError::Decode("missing both result and error".to_string()))
    }

    fn call_with_retry(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        call_with_endless_retry(|| self.call_once(method, params.clone()))
    }

    fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, RpcError> {
        let params = serde_json::json!([
            { "to": to, "data": format!("0x{}", hex_encode(&data)) },
            "latest",
        ]);
        let result = self.call_with_retry("eth_call", params)?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::Decode("eth_call result was not a string".to_string()))?;
        hex_decode(hex).map_err(|e| RpcError::Decode(format!("eth_call return data: {e}")))
    }

    fn get_block(&self, method: &str, id: Value) -> Result<Option<RawBlock>, RpcError> {
        let params = serde_json::json!([id, true]);
        let value = self.call_with_retry(method, params)?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| RpcError::Decode(format!("{method}: {e}")))
    }
}

impl NodeRpc for HttpRpcClient {
    fn block_number(&self) -> Result<u64, RpcError> {
        let value = self.call_with_retry("eth_blockNumber", serde_json::json!([]))?;
        let hex = value
            .as_str()
            .ok_or_else(|| RpcError::Decode("eth_blockNumber result was not a string".to_string()))?;
        u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| RpcError::Decode(format!("eth_blockNumber: {e}")))
    }

    fn get_block_by_number(&self, number: u64) -> Result<Option<RawBlock>, RpcError> {
        self.get_block("eth_getBlockByNumber", serde_json::json!(format!("0x{number:x}")))
    }

    fn get_block_by_hash(&self, hash: ethereum_types::H256) -> Result<Option<RawBlock>, RpcError> {
        self.get_block("eth_getBlockByHash", serde_json::json!(hash))
    }

    fn get_epoch_start_heights(&self, contract: Address) -> Result<Vec<u64>, RpcError> {
        let data = self.eth_call(contract, abi::encode_get_epoch_start_heights())?;
        abi::decode_epoch_start_heights(&data)
    }

    fn get_validators(&self, contract: Address, epoch_start_height: u64) -> Result<Vec<Address>, RpcError> {
        let data = self.eth_call(contract, abi::encode_get_validators(epoch_start_height))?;
        abi::decode_validators(&data)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").unwrap();
    }
    out
}

fn hex_decode(s: &str) -> Result<Vec<u8>, std::num::ParseIntError> {
    let s = s.trim_start_matches("0x");
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16))
        .collect()
}
