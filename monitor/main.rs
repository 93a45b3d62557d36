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

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;

use aura_sentinel::app_state::{load_offline_reporter_state, load_skip_reporter_state};
use aura_sentinel::cli::{CliOptions, GRACE_PERIOD_STEPS, MAX_BLOCKS_PER_TICK, MAX_REORG_DEPTH, STEP_DURATION_SECONDS};
use aura_sentinel::error::ConfigError;
use aura_sentinel::orchestrator::{Orchestrator, OrchestratorConfig};
use aura_sentinel::chain_spec;

fn run() -> Result<(), ConfigError> {
    env_logger::init();
    let opts = CliOptions::parse();

    let ranges = chain_spec::load_validator_definition_ranges(&opts.chain_spec_path)?;
    let initial_block_resolver = opts.initial_block_resolver()?;

    std::fs::create_dir_all(&opts.report_dir)?;
    std::fs::create_dir_all(&opts.db_dir)?;

    let db = monitor_db::BlockStore::open(&opts.db_dir.join("monitor.sqlite"))?;

    let skip_reporter_state = load_skip_reporter_state(&db)?;
    let offline_reporter_state = load_offline_reporter_state(&db)?;
    let fetcher_state = match db.load_blob(monitor_sync::BLOCK_FETCHER_STATE_BLOB_NAME)? {
        None => monitor_sync::BlockFetcherStateV1::default(),
        Some(bytes) => serde_json::from_slice::<monitor_sync::BlockFetcherState>(&bytes)
            .map_err(|e| ConfigError::PersistedState(format!("block fetcher state: {e}")))?
            .into_v1(),
    };

    let skip_reporter = monitor_reporters::SkipReporter::new(skip_reporter_state, GRACE_PERIOD_STEPS);
    let offline_reporter = monitor_reporters::OfflineReporter::new(
        offline_reporter_state,
        opts.offline_window_steps(),
        opts.skip_rate,
    );

    let rpc = Box::new(monitor_rpc::HttpRpcClient::new(opts.rpc_uri.clone()));

    let mut orchestrator = Orchestrator::new(
        rpc,
        db,
        OrchestratorConfig {
            ranges,
            skip_reporter,
            offline_reporter,
            fetcher_state,
            initial_block_resolver,
            max_reorg_depth: MAX_REORG_DEPTH,
            max_blocks_per_tick: MAX_BLOCKS_PER_TICK,
            step_duration_seconds: STEP_DURATION_SECONDS,
            report_dir: opts.report_dir.clone(),
        },
    );

    let stop = Arc::new(AtomicBool::new(false));
    let ctrlc_stop = stop.clone();
    ctrlc::set_handler(move || {
        log::info!("received shutdown signal, stopping after the current tick");
        ctrlc_stop.store(true, AtomicOrdering::Relaxed);
    })
    .expect("error installing signal handler");

    while !stop.load(AtomicOrdering::Relaxed) {
        match orchestrator.tick() {
            Ok(0) => thread::sleep(Duration::from_secs(STEP_DURATION_SECONDS / 2)),
            Ok(_) => {}
            Err(e) if e.is_fatal() => {
                log::error!("fatal error, stopping: {e}");
                std::process::exit(1);
            }
            Err(e) => {
                log::warn!("tick failed, will retry after the usual sleep: {e}");
                thread::sleep(Duration::from_secs(STEP_DURATION_SECONDS / 2));
            }
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("aura-sentinel: {e}");
        std::process::exit(1);
    }
}
