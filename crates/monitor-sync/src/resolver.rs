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

//! Picks the block a fresh monitor should start syncing from.

use monitor_rpc::NodeRpc;
use monitor_types::{canonicalize, Header};

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialBlockResolver {
    Genesis,
    Latest,
    /// Negative numbers are relative to the current head, as `-N` meaning
    /// "N blocks behind the head".
    ByNumber(i64),
    ByDate(i64),
}

impl InitialBlockResolver {
    pub fn resolve(&self, rpc: &dyn NodeRpc) -> Result<Header, SyncError> {
        match self {
            InitialBlockResolver::Genesis => fetch_by_number(rpc, 0),
            InitialBlockResolver::Latest => fetch_latest(rpc),
            InitialBlockResolver::ByNumber(n) => {
                let number = if *n < 0 {
                    let head = rpc.block_number()?;
                    head.saturating_sub(n.unsigned_abs())
                } else {
                    *n as u64
                };
                fetch_by_number(rpc, number)
            }
            InitialBlockResolver::ByDate(timestamp) => resolve_by_date(rpc, *timestamp),
        }
    }
}

fn fetch_by_number(rpc: &dyn NodeRpc, number: u64) -> Result<Header, SyncError> {
    let raw = rpc
        .get_block_by_number(number)?
        .ok_or(SyncError::NoInitialBlock)?;
    Ok(canonicalize(&raw)?)
}

fn fetch_latest(rpc: &dyn NodeRpc) -> Result<Header, SyncError> {
    let head_number = rpc.block_number()?;
    fetch_by_number(rpc, head_number)
}

/// Binary search for the first block whose timestamp is on or after
/// `timestamp`, narrowing the [lower, upper] range one midpoint at a time.
fn resolve_by_date(rpc: &dyn NodeRpc, timestamp: i64) -> Result<Header, SyncError> {
    let mut lower = fetch_by_number(rpc, 0)?;
    let mut upper = fetch_latest(rpc)?;

    while upper.number - lower.number > 1 {
        let middle_number = (lower.number + upper.number) / 2;
        let middle = fetch_by_number(rpc, middle_number)?;
        if timestamp >= middle.timestamp as i64 {
            lower = middle;
        } else {
            upper = middle;
        }
    }
    Ok(lower)
}
