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

use std::fmt;

use ethereum_types::{Address, Bloom, H256, U256};
use serde::{Deserialize, Serialize};

/// A canonicalized Aura block header: byte-exact copies of the fields that
/// make up the bare hash, plus the Aura seal and the 65-byte signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub parent_hash: H256,
    pub uncles_hash: H256,
    pub author: Address,
    pub state_root: H256,
    pub transactions_root: H256,
    pub receipts_root: H256,
    pub logs_bloom: Bloom,
    pub difficulty: U256,
    pub number: u64,
    pub gas_limit: U256,
    pub gas_used: U256,
    pub timestamp: u64,
    pub extra_data: Vec<u8>,
    /// Exactly two entries in well-formed input: step-rlp, signature-rlp.
    pub seal_fields: Vec<Vec<u8>>,
    pub signature: [u8; 65],
    pub hash: H256,
}

impl fmt::Display for Header {
    /// A short one-line form used only for log lines, never for a report
    /// file (the `skips`/`offline_report_*`/`equivocation_reports_for_*`
    /// formats are fixed by the report writers, not by this impl).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = chrono::DateTime::<chrono::Utc>::from_timestamp(self.timestamp as i64, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "invalid-timestamp".to_string());
        write!(f, "Block({}, {})", self.number, dt)
    }
}
