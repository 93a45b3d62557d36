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

/// Fatal at startup: bad CLI input, an unparseable chain spec, or a
/// persisted state blob that doesn't match its declared schema.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    BadCli(String),

    #[error("chain spec error: {0}")]
    ChainSpec(#[from] monitor_validators::ChainSpecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("persisted state is invalid: {0}")]
    PersistedState(String),

    #[error("db error: {0}")]
    Db(#[from] monitor_db::DbError),
}

/// What a single tick can fail with, and how the orchestrator should react.
#[derive(Debug, Error)]
pub enum TickError {
    /// A semantic RPC failure (null block for an existing number, a
    /// response that doesn't match the expected schema). The tick is
    /// aborted, logged, and retried after the usual sleep.
    #[error("rpc fault: {0}")]
    RpcFault(String),

    /// The chain moved past the reorg safety horizon. Fatal.
    #[error("chain topology fault: {0}")]
    ChainTopologyFault(String),

    /// A report file write failed after the tick's store transaction had
    /// already committed, so there is nothing left to roll back: the
    /// fetched blocks and updated reporter state are durable either way.
    /// Any reports that hadn't been flushed yet when this fired are lost,
    /// not retried, since redoing the tick would only duplicate the ones
    /// that did make it to disk.
    #[error("report writer io error: {0}")]
    ReportIo(#[from] std::io::Error),

    /// The block store itself failed in a way other than a duplicate
    /// insert bug (disk full, corruption). Fatal.
    #[error("db error: {0}")]
    Db(#[from] monitor_db::DbError),
}

impl TickError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, TickError::ChainTopologyFault(_) | TickError::Db(_))
    }
}

impl From<monitor_validators::FetchError> for TickError {
    fn from(err: monitor_validators::FetchError) -> Self {
        TickError::RpcFault(err.to_string())
    }
}

impl From<monitor_sync::SyncError> for TickError {
    fn from(err: monitor_sync::SyncError) -> Self {
        use monitor_sync::SyncError::*;
        match err {
            ForkWithUnknownBase | ForkBelowInitial => {
                TickError::ChainTopologyFault(err.to_string())
            }
            Rpc(rpc_err) if !rpc_err.is_transport() => TickError::RpcFault(rpc_err.to_string()),
            Rpc(rpc_err) => TickError::RpcFault(format!("unexpected transport error: {rpc_err}")),
            Db(db_err) => TickError::Db(db_err),
            Codec(codec_err) => TickError::RpcFault(format!("malformed block: {codec_err}")),
        }
    }
}
