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

//! The block shape as returned by the node's `eth_getBlockByNumber` /
//! `eth_getBlockByHash` JSON RPC methods, Aura fields included.

use ethereum_types::{Address, Bloom, H256, U256};
use serde::{Deserialize, Serialize};

use crate::hexbytes;

/// A block exactly as received over JSON RPC, before canonicalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    pub hash: H256,
    pub parent_hash: H256,
    pub sha3_uncles: H256,
    pub author: Address,
    pub state_root: H256,
    pub transactions_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: Bloom,
    pub difficulty: U256,
    pub number: U256,
    pub gas_limit: U256,
    pub gas_used: U256,
    pub timestamp: U256,
    #[serde(with = "hexbytes")]
    pub extra_data: Vec<u8>,
    #[serde(with = "hexbytes::vec")]
    pub seal_fields: Vec<Vec<u8>>,
    #[serde(with = "hexbytes")]
    pub signature: Vec<u8>,
}
