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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainSpecError {
    #[error("chain spec validator definition: {0}")]
    Invalid(String),

    #[error("chain spec is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("height {height} is beyond the last fetched height {max_height}")]
    HeightOutOfRange { height: u64, max_height: u64 },

    #[error("height {0} is earlier than the first known epoch")]
    BeforeFirstEpoch(u64),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rpc error: {0}")]
    Rpc(#[from] monitor_rpc::RpcError),

    #[error("contract returned non-monotonic epoch start heights: {0:?}")]
    NotMonotonic(Vec<u64>),
}
