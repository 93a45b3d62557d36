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

//! Per-step state machine that emits "missed proposal" events once a grace
//! period has elapsed without the expected block showing up (C6).

use std::collections::BTreeSet;

use ethereum_types::Address;
use serde::{Deserialize, Serialize};

use monitor_types::Header;
use monitor_validators::PrimaryOracle;

use crate::event_sink::EventSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkippedProposal {
    pub step: u64,
    pub block_height: u64,
}

/// `latest_step == 0` is the "uninitialized" sentinel, matching the
/// invariant that genesis always has step 0 and is never itself tracked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkipReporterState {
    pub latest_step: u64,
    pub open_skipped_proposals: BTreeSet<SkippedProposal>,
}

pub struct SkipReporter {
    state: SkipReporterState,
    grace_period: u64,
}

impl SkipReporter {
    pub fn new(state: SkipReporterState, grace_period: u64) -> Self {
        SkipReporter { state, grace_period }
    }

    pub fn state(&self) -> &SkipReporterState {
        &self.state
    }

    pub fn on_block(
        &mut self,
        header: &Header,
        step: u64,
        oracle: &PrimaryOracle,
        sink: &mut impl EventSink<(Address, SkippedProposal)>,
    ) {
        if header.number == 0 {
            return;
        }
        if self.state.latest_step == 0 {
            self.state.latest_step = step;
            log::info!("received first non-genesis block, step {step}");
            return;
        }

        if step > self.state.latest_step {
            for s in (self.state.latest_step + 1)..step {
                self.state.open_skipped_proposals.insert(SkippedProposal {
                    step: s,
                    block_height: header.number,
                });
            }
            self.state.latest_step = step;
        }
        self.state
            .open_skipped_proposals
            .retain(|proposal| proposal.step != step);

        let grace_end = self.state.latest_step.saturating_sub(self.grace_period);
        let to_emit: Vec<SkippedProposal> = self
            .state
            .open_skipped_proposals
            .iter()
            .take_while(|proposal| proposal.step < grace_end)
            .copied()
            .collect();

        for proposal in to_emit {
            self.state.open_skipped_proposals.remove(&proposal);
            match oracle.primary(proposal.block_height, proposal.step) {
                Ok(primary) => {
                    log::info!(
                        "detected missed step {} by {:?}",
                        proposal.step,
                        primary
                    );
                    sink.on_event((primary, proposal));
                }
                Err(e) => {
                    log::warn!(
                        "could not resolve primary for skipped step {}: {e}",
                        proposal.step
                    );
                }
            }
        }
    }
}
