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

//! Sliding-window liveness accounting: a validator whose step-weighted
//! skip total within the window exceeds the allowed rate is reported once,
//! then dropped from further consideration (C7).
//!
//! Uses the length-weighted running-sum variant: each missed step is
//! weighted by the validator set size at the time, and the running sum is
//! kept incrementally rather than recomputed from the full interval list on
//! every event.

use std::collections::{BTreeMap, HashMap, HashSet};

use ethereum_types::Address;
use serde::{Deserialize, Serialize};

use monitor_validators::PrimaryOracle;

use crate::event_sink::EventSink;
use crate::skip::SkippedProposal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineInterval {
    pub step: u64,
    pub length: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfflineReporterState {
    pub reported_validators: HashSet<Address>,
    pub offline_intervals_by_validator: HashMap<Address, Vec<OfflineInterval>>,
    pub offline_time_by_validator: HashMap<Address, u64>,
}

pub struct OfflineReporter {
    state: OfflineReporterState,
    window_size: u64,
    allowed_skip_rate: f64,
}

impl OfflineReporter {
    pub fn new(state: OfflineReporterState, window_size: u64, allowed_skip_rate: f64) -> Self {
        OfflineReporter {
            state,
            window_size,
            allowed_skip_rate,
        }
    }

    pub fn state(&self) -> &OfflineReporterState {
        &self.state
    }

    pub fn on_skip(
        &mut self,
        primary: Address,
        proposal: SkippedProposal,
        oracle: &PrimaryOracle,
        sink: &mut impl EventSink<(Address, Vec<u64>)>,
    ) {
        if self.state.reported_validators.contains(&primary) {
            return;
        }

        // `None` here means the true cutoff would be negative (we're still
        // within the first window's worth of steps), so nothing is old
        // enough to evict yet.
        if let Some(cutoff) = proposal.step.checked_sub(self.window_size) {
            self.evict_expired_intervals(cutoff);
        }

        let length = match oracle.validators(proposal.block_height) {
            Ok(validators) => validators.len() as u64,
            Err(e) => {
                log::warn!(
                    "could not resolve validator set at height {} for offline accounting: {e}",
                    proposal.block_height
                );
                return;
            }
        };

        let intervals = self
            .state
            .offline_intervals_by_validator
            .entry(primary)
            .or_default();
        if let Some(last) = intervals.last() {
            assert!(proposal.step > last.step, "offline intervals must be strictly step-increasing");
        }
        intervals.push(OfflineInterval {
            step: proposal.step,
            length,
        });
        *self.state.offline_time_by_validator.entry(primary).or_insert(0) += length;

        let offline_time = self.state.offline_time_by_validator[&primary];
        if (offline_time as f64) / (self.window_size as f64) > self.allowed_skip_rate {
            self.state.reported_validators.insert(primary);
            let intervals = self
                .state
                .offline_intervals_by_validator
                .remove(&primary)
                .unwrap_or_default();
            self.state.offline_time_by_validator.remove(&primary);

            let mut steps: Vec<u64> = intervals.iter().map(|i| i.step).collect();
            steps.sort_unstable();
            log::info!("detected offline validator {:?}, missed steps {:?}", primary, steps);
            sink.on_event((primary, steps));
        }
    }

    fn evict_expired_intervals(&mut self, cutoff: u64) {
        for (validator, intervals) in self.state.offline_intervals_by_validator.iter_mut() {
            let mut removed_length = 0u64;
            intervals.retain(|interval| {
                if interval.step <= cutoff {
                    removed_length += interval.length;
                    false
                } else {
                    true
                }
            });
            if removed_length > 0 {
                if let Some(total) = self.state.offline_time_by_validator.get_mut(validator) {
                    *total = total.saturating_sub(removed_length);
                }
            }
        }
    }
}

/// Ordered, length-weighted view of offline time used for invariant checks
/// in tests: `offlineTimeByValidator[v]` must equal the sum of `length`
/// over `intervalsByValidator[v]`.
pub fn invariant_holds(state: &OfflineReporterState) -> bool {
    state
        .offline_intervals_by_validator
        .iter()
        .all(|(validator, intervals)| {
            if state.reported_validators.contains(validator) {
                return true;
            }
            let sum: u64 = intervals.iter().map(|i| i.length).sum();
            state.offline_time_by_validator.get(validator).copied().unwrap_or(0) == sum
                && intervals.windows(2).all(|w| w[0].step < w[1].step)
        })
}
