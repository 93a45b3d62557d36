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

//! Command-line surface. A deliberate modernization over the ecosystem's
//! older `docopt`/`structopt` stack: one `clap` v4 derive struct.

use std::path::PathBuf;

use clap::Parser;
use monitor_sync::InitialBlockResolver;

use crate::error::ConfigError;

pub const STEP_DURATION_SECONDS: u64 = 5;
pub const GRACE_PERIOD_STEPS: u64 = 10;
pub const MAX_REORG_DEPTH: u64 = 1000;
pub const MAX_BLOCKS_PER_TICK: u64 = 500;

#[derive(Debug, Parser)]
#[command(name = "aura-sentinel", rename_all = "kebab-case")]
pub struct CliOptions {
    /// JSON-RPC endpoint of the upstream Aura node.
    #[arg(long)]
    pub rpc_uri: String,

    /// Path to the chain spec JSON file.
    #[arg(long)]
    pub chain_spec_path: PathBuf,

    /// Directory report files are written under.
    #[arg(long)]
    pub report_dir: PathBuf,

    /// Directory the block index / blob store lives in.
    #[arg(long)]
    pub db_dir: PathBuf,

    /// Allowed fraction of a validator's assigned steps it may miss inside
    /// the offline window before being reported, in `[0, 1]`.
    #[arg(long, default_value_t = 0.5)]
    pub skip_rate: f64,

    /// Width of the offline reporter's sliding window, in seconds.
    #[arg(long, default_value_t = 24 * 60 * 60)]
    pub offline_window: u64,

    /// Where a fresh monitor starts syncing from: `genesis`, `latest`, a
    /// decimal block number (negative = relative to the current head), or a
    /// `YYYY-MM-DD` date.
    #[arg(long, default_value = "genesis")]
    pub sync_from: String,
}

impl CliOptions {
    pub fn offline_window_steps(&self) -> u64 {
        (self.offline_window / STEP_DURATION_SECONDS).max(1)
    }

    pub fn initial_block_resolver(&self) -> Result<InitialBlockResolver, ConfigError> {
        parse_sync_from(&self.sync_from)
    }
}

fn parse_sync_from(value: &str) -> Result<InitialBlockResolver, ConfigError> {
    match value {
        "genesis" => Ok(InitialBlockResolver::Genesis),
        "latest" => Ok(InitialBlockResolver::Latest),
        _ => {
            if let Ok(n) = value.parse::<i64>() {
                return Ok(InitialBlockResolver::ByNumber(n));
            }
            let date = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                ConfigError::BadCli(format!(
                    "--sync-from must be genesis, latest, a decimal block number, or a YYYY-MM-DD date, got {value}"
                ))
            })?;
            let timestamp = date
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always a valid time")
                .and_utc()
                .timestamp();
            Ok(InitialBlockResolver::ByDate(timestamp))
        }
    }
}
