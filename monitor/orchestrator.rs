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

//! Wires the block fetcher and the three fault detectors into one per-tick
//! procedure: refresh epochs, sync new blocks, fan the newly accepted blocks
//! out to the reporters, persist state and flush report writes as a single
//! all-or-nothing unit.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ethereum_types::H256;

use monitor_db::{BlockStore, TickTransaction};
use monitor_reporters::{EquivocationReporter, OfflineReporter, SkipReporter};
use monitor_rpc::NodeRpc;
use monitor_sync::{BlockFetcher, BlockFetcherStateV1, InitialBlockResolver};
use monitor_types::{decode_step, Header};
use monitor_validators::{EpochFetcher, PrimaryOracle, ValidatorDefinitionRange};

use crate::app_state::{store_offline_reporter_state, store_skip_reporter_state};
use crate::error::TickError;
use crate::reports::{self, PendingReport};

pub struct Orchestrator {
    rpc: Box<dyn NodeRpc>,
    db: BlockStore,
    oracle: PrimaryOracle,
    epoch_fetcher: EpochFetcher,
    skip_reporter: SkipReporter,
    offline_reporter: OfflineReporter,
    fetcher_state: BlockFetcherStateV1,
    initial_block_resolver: InitialBlockResolver,
    max_reorg_depth: u64,
    max_blocks_per_tick: u64,
    step_duration_seconds: u64,
    report_dir: PathBuf,
    /// Full headers seen by this process, keyed by hash, used to assemble
    /// the equivocation report's RLP-encoded header pair. Not persisted: a
    /// block inserted in a previous process lifetime and never re-synced
    /// this run won't have its bytes available here.
    header_cache: HashMap<H256, Header>,
}

pub struct OrchestratorConfig {
    pub ranges: Vec<ValidatorDefinitionRange>,
    pub skip_reporter: SkipReporter,
    pub offline_reporter: OfflineReporter,
    pub fetcher_state: BlockFetcherStateV1,
    pub initial_block_resolver: InitialBlockResolver,
    pub max_reorg_depth: u64,
    pub max_blocks_per_tick: u64,
    pub step_duration_seconds: u64,
    pub report_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(rpc: Box<dyn NodeRpc>, db: BlockStore, config: OrchestratorConfig) -> Self {
        let (oracle, epoch_fetcher) = monitor_validators::build_from_ranges(&config.ranges);
        Orchestrator {
            rpc,
            db,
            oracle,
            epoch_fetcher,
            skip_reporter: config.skip_reporter,
            offline_reporter: config.offline_reporter,
            fetcher_state: config.fetcher_state,
            initial_block_resolver: config.initial_block_resolver,
            max_reorg_depth: config.max_reorg_depth,
            max_blocks_per_tick: config.max_blocks_per_tick,
            step_duration_seconds: config.step_duration_seconds,
            report_dir: config.report_dir,
            header_cache: HashMap::new(),
        }
    }

    /// Runs one tick: refresh epochs, sync new blocks, fan them out to the
    /// reporters, persist state, and commit the lot as one transaction.
    /// Report files are only written to disk once that commit succeeds, so
    /// a crash or I/O failure anywhere in the tick can at worst cost an
    /// already-decided report — it can never cause one to be re-emitted on
    /// the next run. Returns the number of newly inserted blocks.
    pub fn tick(&mut self) -> Result<u64, TickError> {
        monitor_validators::refresh(&mut self.oracle, &mut self.epoch_fetcher, self.rpc.as_ref())?;

        let mut newly_inserted = Vec::new();
        let mut pending_reports = Vec::new();

        {
            let tick = self.db.begin_tick()?;

            {
                let mut fetcher = BlockFetcher::new(
                    self.rpc.as_ref(),
                    &tick,
                    self.max_reorg_depth,
                    self.initial_block_resolver,
                    self.fetcher_state.clone(),
                );
                fetcher.fetch_and_insert_new_blocks(
                    self.max_blocks_per_tick,
                    self.oracle.max_height,
                    |header| newly_inserted.push(header.clone()),
                )?;
                if let Ok(progress) = fetcher.sync_progress() {
                    log::debug!("sync progress: {:.1}%", progress * 100.0);
                }
                self.fetcher_state = fetcher.state();
            }

            // Every branch the fetcher inserted this tick already wrote its
            // own state blob into this same transaction (see
            // `BlockFetcher::insert_branch`); this call covers the
            // remaining case, a backward walk that made progress but isn't
            // complete yet, where `currentBranch` grew without anything
            // being inserted into `blocks` at all.
            tick.store_blob(
                monitor_sync::BLOCK_FETCHER_STATE_BLOB_NAME,
                &serde_json::to_vec(&monitor_sync::BlockFetcherState::V1(self.fetcher_state.clone()))
                    .expect("state serialization cannot fail"),
            )?;

            for header in &newly_inserted {
                self.header_cache.insert(header.hash, header.clone());
                on_new_block(
                    header,
                    &tick,
                    &mut self.skip_reporter,
                    &mut self.offline_reporter,
                    &self.oracle,
                    &self.report_dir,
                    self.step_duration_seconds,
                    &self.header_cache,
                    &mut pending_reports,
                )?;
            }

            store_skip_reporter_state(&tick, self.skip_reporter.state())?;
            store_offline_reporter_state(&tick, self.offline_reporter.state())?;

            tick.commit()?;
        }

        reports::flush(&pending_reports).map_err(TickError::ReportIo)?;

        Ok(newly_inserted.len() as u64)
    }
}

/// Fans one newly accepted block out to the three reporters, buffering
/// whatever report files result instead of writing them — the caller only
/// flushes them to disk once the whole tick's transaction has committed.
/// Takes its fields individually rather than `&mut Orchestrator` so it can
/// run while `tick` still holds its own borrow of `Orchestrator::db`.
#[allow(clippy::too_many_arguments)]
fn on_new_block(
    header: &Header,
    tick: &TickTransaction<'_>,
    skip_reporter: &mut SkipReporter,
    offline_reporter: &mut OfflineReporter,
    oracle: &PrimaryOracle,
    report_dir: &Path,
    step_duration: u64,
    header_cache: &HashMap<H256, Header>,
    pending_reports: &mut Vec<PendingReport>,
) -> Result<(), TickError> {
    let step = decode_step(header).map_err(|e| TickError::RpcFault(e.to_string()))?;

    let mut built = Vec::new();
    skip_reporter.on_block(header, step, oracle, &mut |(primary, proposal)| {
        built.push(reports::build_skip_report(report_dir, primary, proposal.step, step_duration));
        offline_reporter.on_skip(primary, proposal, oracle, &mut |(validator, missed_steps)| {
            built.push(reports::build_offline_report(report_dir, validator, missed_steps));
        });
    });
    pending_reports.extend(built);

    let reporter = EquivocationReporter::new(tick);
    let mut conflicting_hashes = None;
    reporter
        .on_block(header, &mut |hashes| conflicting_hashes = Some(hashes))
        .map_err(|e| TickError::RpcFault(e.to_string()))?;

    if let Some(hashes) = conflicting_hashes {
        let proposer = monitor_types::recover_proposer(header)
            .map_err(|e| TickError::RpcFault(e.to_string()))?;
        let headers: Vec<Header> = hashes
            .iter()
            .filter_map(|hash| header_cache.get(hash).cloned())
            .collect();
        if headers.len() < hashes.len() {
            log::warn!(
                "equivocation detected for {:?} but only {}/{} conflicting headers are in this process's cache",
                proposer,
                headers.len(),
                hashes.len()
            );
        }
        pending_reports.push(reports::build_equivocation_report(report_dir, proposer, &headers));
    }

    Ok(())
}
