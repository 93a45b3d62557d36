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
pub enum SyncError {
    #[error("could not fetch an initial block to sync from")]
    NoInitialBlock,

    #[error("tried to insert branch from a fork with unknown parent block")]
    ForkWithUnknownBase,

    #[error("synchronized backwards onto a fork with base before the initial synchronized block")]
    ForkBelowInitial,

    #[error("rpc error: {0}")]
    Rpc(#[from] monitor_rpc::RpcError),

    #[error("db error: {0}")]
    Db(#[from] monitor_db::DbError),

    #[error("codec error: {0}")]
    Codec(#[from] monitor_types::CodecError),
}
