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

//! JSON-RPC access to the upstream Aura node: block reads and the two
//! validator-set contract calls, wrapped in a retry loop that never gives
//! up on transport errors.

mod abi;
mod client;
mod error;
mod retry;

pub use client::{HttpRpcClient, NodeRpc};
pub use error::RpcError;

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::Address;
    use mockito::Server;
    use serde_json::json;

    #[test]
    fn block_number_parses_hex_result() {
        let mut server = Server::new();
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x2a"}).to_string())
            .create();

        let client = HttpRpcClient::new(server.url());
        assert_eq!(client.block_number().unwrap(), 42);
    }

    #[test]
    fn get_block_by_number_returns_none_for_null_result() {
        let mut server = Server::new();
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": null}).to_string())
            .create();

        let client = HttpRpcClient::new(server.url());
        assert!(client.get_block_by_number(10).unwrap().is_none());
    }

    #[test]
    fn protocol_error_is_not_a_transport_error() {
        let mut server = Server::new();
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "nope"}})
                    .to_string(),
            )
            .create();

        let client = HttpRpcClient::new(server.url());
        let err = client.block_number().unwrap_err();
        assert!(!err.is_transport());
    }

    #[test]
    fn get_validators_decodes_eth_call_result() {
        use ethabi::Token;

        let addr = Address::repeat_byte(0x11);
        let encoded = ethabi::encode(&[Token::Array(vec![Token::Address(
            ethabi::Address::from_slice(addr.as_bytes()),
        )])]);
        let hex_data = format!("0x{}", encoded.iter().map(|b| format!("{b:02x}")).collect::<String>());

        let mut server = Server::new();
        let _m = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": hex_data}).to_string())
            .create();

        let client = HttpRpcClient::new(server.url());
        let validators = client.get_validators(Address::zero(), 0).unwrap();
        assert_eq!(validators, vec![addr]);
    }
}
