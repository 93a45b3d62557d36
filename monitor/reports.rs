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

//! The three report file writers: `skips` (CSV), `offline_report_*` (JSON,
//! one-shot), and `equivocation_reports_for_proposer_*` (delimited text).
//!
//! Each `build_*` function only computes a file path and the bytes to write;
//! no I/O happens until [`flush`], which the orchestrator calls once a
//! tick's store transaction has committed. This keeps report content
//! assembly infallible and lets a whole tick's worth of reports be discarded
//! together if anything upstream of the commit fails, instead of some of
//! them already sitting on disk by the time that failure is noticed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ethereum_types::Address;
use rlp::RlpStream;
use rustc_hex::ToHex;
use serde::Serialize;

use monitor_types::Header;

fn hex0x(bytes: &[u8]) -> String {
    format!("0x{}", bytes.to_hex::<String>())
}

fn utc_of(unix_seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(unix_seconds, 0).unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
}

/// How a [`PendingReport`] must be opened when it's finally flushed to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create the file if missing, append otherwise (`skips`, equivocation
    /// records).
    Append,
    /// Fail if the file already exists — an offline report for a given
    /// validator and step range is written exactly once.
    CreateNew,
}

/// A report file write computed ahead of time, buffered until the tick that
/// produced it has durably committed.
#[derive(Debug, Clone)]
pub struct PendingReport {
    pub path: PathBuf,
    pub mode: WriteMode,
    pub contents: Vec<u8>,
}

/// Writes every buffered report to disk, in order. Called only after the
/// tick's store transaction has committed — by that point there is no
/// transaction left to roll back, so a failure here can only ever drop a
/// report that was already decided, never duplicate one.
pub fn flush(reports: &[PendingReport]) -> std::io::Result<()> {
    for report in reports {
        let mut opts = OpenOptions::new();
        match report.mode {
            WriteMode::Append => {
                opts.create(true).append(true);
            }
            WriteMode::CreateNew => {
                opts.create_new(true).write(true);
            }
        }
        let mut file = opts.open(&report.path)?;
        file.write_all(&report.contents)?;
    }
    Ok(())
}

/// Builds the one CSV line to append to the `skips` file.
pub fn build_skip_report(
    report_dir: &Path,
    proposer: Address,
    step: u64,
    step_duration_seconds: u64,
) -> PendingReport {
    let time = utc_of((step * step_duration_seconds) as i64);
    let line = format!(
        "{},{},{}\n",
        step,
        hex0x(proposer.as_bytes()),
        time.format("%Y-%m-%d %H:%M:%S")
    );
    PendingReport {
        path: report_dir.join("skips"),
        mode: WriteMode::Append,
        contents: line.into_bytes(),
    }
}

#[derive(Serialize)]
struct OfflineReportBody {
    validator: String,
    missed_steps: Vec<u64>,
}

/// Builds a create-exclusive JSON report for a newly detected offline
/// validator.
pub fn build_offline_report(
    report_dir: &Path,
    validator: Address,
    mut missed_steps: Vec<u64>,
) -> PendingReport {
    missed_steps.sort_unstable();
    let min = missed_steps.first().copied().unwrap_or(0);
    let max = missed_steps.last().copied().unwrap_or(0);
    let file_name = format!(
        "offline_report_{}_steps_{}_to_{}",
        hex0x(validator.as_bytes()),
        min,
        max
    );

    let body = OfflineReportBody {
        validator: hex0x(validator.as_bytes()),
        missed_steps,
    };
    let contents = serde_json::to_vec(&body).expect("offline report body serialization cannot fail");
    PendingReport {
        path: report_dir.join(file_name),
        mode: WriteMode::CreateNew,
        contents,
    }
}

/// Builds one delimited record describing a detected equivocation.
/// `conflicting` must be the full, insertion-ordered set of headers sharing
/// the (proposer, step) pair, already looked up from the block store.
pub fn build_equivocation_report(
    report_dir: &Path,
    proposer: Address,
    conflicting: &[Header],
) -> PendingReport {
    let path = report_dir.join(format!(
        "equivocation_reports_for_proposer_{}",
        hex0x(proposer.as_bytes())
    ));

    let mut body = Vec::new();
    let _ = writeln!(body, "{}", "-".repeat(30));
    let _ = writeln!(body, "proposer: {}", hex0x(proposer.as_bytes()));
    let _ = writeln!(
        body,
        "block height: {}",
        conflicting.first().map(|h| h.number).unwrap_or(0)
    );
    let _ = writeln!(body, "detected at: {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));
    for header in conflicting {
        let _ = writeln!(
            body,
            "{} ({})",
            hex0x(header.hash.as_bytes()),
            utc_of(header.timestamp as i64).format("%Y-%m-%d %H:%M:%S")
        );
    }
    for header in conflicting.iter().take(2) {
        let _ = writeln!(body, "{}", encode_bare_header_and_signature(header));
    }

    PendingReport {
        path,
        mode: WriteMode::Append,
        contents: body,
    }
}

fn encode_bare_header_and_signature(header: &Header) -> String {
    let mut stream = RlpStream::new_list(13);
    stream
        .append(&header.parent_hash)
        .append(&header.uncles_hash)
        .append(&header.author)
        .append(&header.state_root)
        .append(&header.transactions_root)
        .append(&header.receipts_root)
        .append(&header.logs_bloom)
        .append(&header.difficulty)
        .append(&header.number)
        .append(&header.gas_limit)
        .append(&header.gas_used)
        .append(&header.timestamp)
        .append(&header.extra_data);
    hex0x(&[stream.out().to_vec(), header.signature.to_vec()].concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{Bloom, H256, U256};
    use tempfile::tempdir;

    fn sample_header(number: u64) -> Header {
        Header {
            parent_hash: H256::zero(),
            uncles_hash: H256::zero(),
            author: Address::zero(),
            state_root: H256::zero(),
            transactions_root: H256::zero(),
            receipts_root: H256::zero(),
            logs_bloom: Bloom::zero(),
            difficulty: U256::from(1),
            number,
            gas_limit: U256::from(8_000_000u64),
            gas_used: U256::zero(),
            timestamp: 1_700_000_000 + number,
            extra_data: vec![],
            seal_fields: vec![],
            signature: [0u8; 65],
            hash: H256::repeat_byte(number as u8 + 1),
        }
    }

    #[test]
    fn skip_report_appends_a_csv_line() {
        let dir = tempdir().unwrap();
        flush(&[
            build_skip_report(dir.path(), Address::repeat_byte(0xAA), 10, 5),
            build_skip_report(dir.path(), Address::repeat_byte(0xBB), 11, 5),
        ])
        .unwrap();
        let contents = std::fs::read_to_string(dir.path().join("skips")).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().next().unwrap().starts_with("10,0xaaaa"));
    }

    #[test]
    fn offline_report_is_create_exclusive() {
        let dir = tempdir().unwrap();
        let validator = Address::repeat_byte(0x01);
        flush(&[build_offline_report(dir.path(), validator, vec![3, 0, 9, 6])]).unwrap();
        let result = flush(&[build_offline_report(dir.path(), validator, vec![3, 0, 9, 6])]);
        assert!(result.is_err());

        let file_name = format!("offline_report_{}_steps_0_to_9", hex0x(validator.as_bytes()));
        let contents = std::fs::read_to_string(dir.path().join(file_name)).unwrap();
        let parsed: OfflineReportBodyDe = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.missed_steps, vec![0, 3, 6, 9]);
    }

    #[derive(serde::Deserialize)]
    struct OfflineReportBodyDe {
        #[allow(dead_code)]
        validator: String,
        missed_steps: Vec<u64>,
    }

    #[test]
    fn equivocation_report_appends_delimited_records() {
        let dir = tempdir().unwrap();
        let proposer = Address::repeat_byte(0x02);
        flush(&[build_equivocation_report(
            dir.path(),
            proposer,
            &[sample_header(5), sample_header(5)],
        )])
        .unwrap();
        flush(&[build_equivocation_report(
            dir.path(),
            proposer,
            &[sample_header(5), sample_header(5)],
        )])
        .unwrap();

        let file_name = format!("equivocation_reports_for_proposer_{}", hex0x(proposer.as_bytes()));
        let contents = std::fs::read_to_string(dir.path().join(file_name)).unwrap();
        assert_eq!(contents.matches(&"-".repeat(30)).count(), 2);
    }

    #[test]
    fn pending_reports_are_not_written_until_flushed() {
        let dir = tempdir().unwrap();
        let _pending = build_skip_report(dir.path(), Address::repeat_byte(0xAA), 10, 5);
        assert!(!dir.path().join("skips").exists());
    }
}
