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

use serde::{Deserialize, Serialize};

use monitor_types::Header;

pub const BLOCK_FETCHER_STATE_BLOB_NAME: &str = "block_fetcher_state";

/// Version-tagged snapshot of [`crate::BlockFetcher`]'s working state. `v1`
/// is the only schema so far; a future `BlockFetcherStateV2` would be
/// introduced alongside an `upgrade` from this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum BlockFetcherState {
    V1(BlockFetcherStateV1),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockFetcherStateV1 {
    pub head: Option<Header>,
    pub current_branch: Vec<Header>,
    pub initial_blocknr: u64,
}

impl BlockFetcherState {
    pub fn fresh() -> Self {
        BlockFetcherState::V1(BlockFetcherStateV1::default())
    }

    pub fn into_v1(self) -> BlockFetcherStateV1 {
        match self {
            BlockFetcherState::V1(v1) => v1,
        }
    }
}
