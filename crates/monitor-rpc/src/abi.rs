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

//! Minimal ABI plumbing for the two validator-set contract reads the
//! monitor needs. We only ever call fixed, known function signatures, so we
//! compute selectors by hand instead of pulling in `ethabi::Function` and
//! its builder API.

use ethabi::{ParamType, Token};
use ethereum_types::{Address, U256};

use crate::error::RpcError;

/// `keccak256(signature)[0..4]`, the standard Solidity function selector.
fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak_hash::keccak(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.as_bytes()[..4]);
    out
}

/// Calldata for `getEpochStartHeights()`.
pub fn encode_get_epoch_start_heights() -> Vec<u8> {
    selector("getEpochStartHeights()").to_vec()
}

pub fn decode_epoch_start_heights(data: &[u8]) -> Result<Vec<u64>, RpcError> {
    let tokens = ethabi::decode(&[ParamType::Array(Box::new(ParamType::Uint(256)))], data)
        .map_err(|e| RpcError::Decode(format!("getEpochStartHeights return value: {e}")))?;
    let [Token::Array(values)] = tokens.as_slice() else {
        return Err(RpcError::Decode(
            "getEpochStartHeights: expected a single array token".to_string(),
        ));
    };
    values
        .iter()
        .map(|token| {
            token
                .clone()
                .into_uint()
                .map(|value| value.as_u64())
                .ok_or_else(|| RpcError::Decode("expected uint256 array element".to_string()))
        })
        .collect()
}

/// Calldata for `getValidators(uint256)`.
pub fn encode_get_validators(epoch_start_height: u64) -> Vec<u8> {
    let mut data = selector("getValidators(uint256)").to_vec();
    let mut encoded = [0u8; 32];
    U256::from(epoch_start_height).to_big_endian(&mut encoded);
    data.extend_from_slice(&encoded);
    data
}

pub fn decode_validators(data: &[u8]) -> Result<Vec<Address>, RpcError> {
    let tokens = ethabi::decode(&[ParamType::Array(Box::new(ParamType::Address))], data)
        .map_err(|e| RpcError::Decode(format!("getValidators return value: {e}")))?;
    let [Token::Array(values)] = tokens.as_slice() else {
        return Err(RpcError::Decode(
            "getValidators: expected a single array token".to_string(),
        ));
    };
    values
        .iter()
        .map(|token| {
            token
                .clone()
                .into_address()
                .map(|addr| Address::from_slice(addr.as_bytes()))
                .ok_or_else(|| RpcError::Decode("expected address array element".to_string()))
        })
        .collect()
}
