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

//! Versioned, named-blob snapshots of the reporters' state. The block
//! fetcher's own state has its schema and blob name in `monitor_sync`
//! already; this module owns the skip and offline reporters' slots, which
//! are specific to this binary rather than a reusable library crate.

use monitor_db::{BlobStore, BlockStore};
use monitor_reporters::{OfflineReporterState, SkipReporterState};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const SKIP_REPORTER_STATE_BLOB_NAME: &str = "skip_reporter_state";
pub const OFFLINE_REPORTER_STATE_BLOB_NAME: &str = "offline_reporter_state";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum SkipReporterStateBlob {
    V1(SkipReporterState),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum OfflineReporterStateBlob {
    V1(OfflineReporterState),
}

pub fn load_skip_reporter_state(db: &BlockStore) -> Result<SkipReporterState, ConfigError> {
    match db.load_blob(SKIP_REPORTER_STATE_BLOB_NAME)? {
        None => Ok(SkipReporterState::default()),
        Some(bytes) => {
            let blob: SkipReporterStateBlob = serde_json::from_slice(&bytes).map_err(|e| {
                ConfigError::PersistedState(format!("skip reporter state: {e}"))
            })?;
            let SkipReporterStateBlob::V1(state) = blob;
            Ok(state)
        }
    }
}

pub fn store_skip_reporter_state(
    db: &impl BlobStore,
    state: &SkipReporterState,
) -> Result<(), monitor_db::DbError> {
    let blob = SkipReporterStateBlob::V1(state.clone());
    let bytes = serde_json::to_vec(&blob).expect("state serialization cannot fail");
    db.store_blob(SKIP_REPORTER_STATE_BLOB_NAME, &bytes)
}

pub fn load_offline_reporter_state(db: &BlockStore) -> Result<OfflineReporterState, ConfigError> {
    match db.load_blob(OFFLINE_REPORTER_STATE_BLOB_NAME)? {
        None => Ok(OfflineReporterState::default()),
        Some(bytes) => {
            let blob: OfflineReporterStateBlob = serde_json::from_slice(&bytes).map_err(|e| {
                ConfigError::PersistedState(format!("offline reporter state: {e}"))
            })?;
            let OfflineReporterStateBlob::V1(state) = blob;
            Ok(state)
        }
    }
}

pub fn store_offline_reporter_state(
    db: &impl BlobStore,
    state: &OfflineReporterState,
) -> Result<(), monitor_db::DbError> {
    let blob = OfflineReporterStateBlob::V1(state.clone());
    let bytes = serde_json::to_vec(&blob).expect("state serialization cannot fail");
    db.store_blob(OFFLINE_REPORTER_STATE_BLOB_NAME, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_state_roundtrips_through_blob_store() {
        let db = BlockStore::open_in_memory().unwrap();
        assert_eq!(
            load_skip_reporter_state(&db).unwrap().latest_step,
            SkipReporterState::default().latest_step
        );

        let mut state = SkipReporterState::default();
        state.latest_step = 42;
        store_skip_reporter_state(&db, &state).unwrap();

        let reloaded = load_skip_reporter_state(&db).unwrap();
        assert_eq!(reloaded.latest_step, 42);
    }

    #[test]
    fn offline_state_roundtrips_through_blob_store() {
        let db = BlockStore::open_in_memory().unwrap();
        let state = OfflineReporterState::default();
        store_offline_reporter_state(&db, &state).unwrap();
        let reloaded = load_offline_reporter_state(&db).unwrap();
        assert_eq!(reloaded.reported_validators.len(), 0);
    }
}
