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

//! Reads on-chain validator-set contracts and turns their
//! `getEpochStartHeights`/`getValidators` results into new [`Epoch`]s.

use ethereum_types::Address;

use monitor_rpc::NodeRpc;

use crate::chainspec::ValidatorDefinitionRange;
use crate::error::FetchError;
use crate::oracle::Epoch;

/// Fetches new epochs from a single validator-set contract.
pub struct ContractEpochFetcher {
    contract_address: Address,
    enter_height: u64,
    definition_index: u32,
    last_fetch_height: Option<u64>,
    earliest_fetched: Option<Epoch>,
    latest_fetched: Option<Epoch>,
}

impl ContractEpochFetcher {
    pub fn new(range: &ValidatorDefinitionRange, definition_index: u32) -> Self {
        let contract_address = range
            .kind
            .contract_address()
            .expect("ContractEpochFetcher requires a contract validator definition range");
        ContractEpochFetcher {
            contract_address,
            enter_height: range.enter_height,
            definition_index,
            last_fetch_height: None,
            earliest_fetched: None,
            latest_fetched: None,
        }
    }

    pub fn last_fetch_height(&self) -> Option<u64> {
        self.last_fetch_height
    }

    pub fn earliest_fetched(&self) -> Option<&Epoch> {
        self.earliest_fetched.as_ref()
    }

    pub fn fetch_new_epochs(&mut self, rpc: &dyn NodeRpc) -> Result<Vec<Epoch>, FetchError> {
        let head = rpc.block_number()?;
        self.last_fetch_height = Some(head);

        let epoch_start_heights = rpc.get_epoch_start_heights(self.contract_address)?;
        if !epoch_start_heights.windows(2).all(|w| w[0] < w[1]) {
            return Err(FetchError::NotMonotonic(epoch_start_heights));
        }

        let last_seen = self.latest_fetched.as_ref().map(|e| e.start_height);
        let new_heights: Vec<u64> = epoch_start_heights
            .into_iter()
            .filter(|height| last_seen.map_or(true, |last| *height > last))
            .collect();

        let mut new_epochs = Vec::with_capacity(new_heights.len());
        for start_height in new_heights {
            let validators = rpc.get_validators(self.contract_address, start_height)?;
            new_epochs.push(Epoch {
                start_height: start_height.max(self.enter_height),
                validators,
                definition_index: self.definition_index,
            });
        }

        if !new_epochs.is_empty() {
            if self.earliest_fetched.is_none() {
                self.earliest_fetched = new_epochs.first().cloned();
            }
            self.latest_fetched = new_epochs.last().cloned();
        }

        Ok(new_epochs)
    }
}

/// Fans out across every contract-backed validator definition range, and
/// prunes fetchers that have been fully superseded by a later range.
pub struct EpochFetcher {
    fetchers: Vec<ContractEpochFetcher>,
}

impl EpochFetcher {
    pub fn new(ranges: &[ValidatorDefinitionRange]) -> Self {
        let fetchers = ranges
            .iter()
            .enumerate()
            .filter(|(_, range)| range.kind.is_contract())
            .map(|(index, range)| ContractEpochFetcher::new(range, index as u32))
            .collect();
        EpochFetcher { fetchers }
    }

    /// `None` when no contract fetcher has ever been polled yet; `Some` of
    /// the minimum `last_fetch_height` across all surviving fetchers once
    /// every one of them has been polled at least once.
    pub fn max_height(&self) -> Option<u64> {
        if self.fetchers.is_empty() {
            return None;
        }
        if self.fetchers.iter().any(|f| f.last_fetch_height().is_none()) {
            return Some(0);
        }
        self.fetchers
            .iter()
            .map(|f| f.last_fetch_height().unwrap())
            .min()
    }

    pub fn fetch_new_epochs(&mut self, rpc: &dyn NodeRpc) -> Result<Vec<Epoch>, FetchError> {
        let mut new_epochs = Vec::new();
        for fetcher in &mut self.fetchers {
            new_epochs.extend(fetcher.fetch_new_epochs(rpc)?);
        }
        self.remove_stale_fetchers();
        Ok(new_epochs)
    }

    fn remove_stale_fetchers(&mut self) {
        while self.pop_first_fetcher_if_stale() {}
    }

    /// A fetcher is stale once the range it covers has been fully
    /// superseded: its last poll already reached a height at or past the
    /// next fetcher's earliest known epoch.
    fn pop_first_fetcher_if_stale(&mut self) -> bool {
        if self.fetchers.is_empty() {
            return false;
        }
        let Some(first_last_fetch_height) = self.fetchers[0].last_fetch_height() else {
            return false;
        };
        let next_earliest = self.fetchers[1..]
            .iter()
            .find_map(|f| f.earliest_fetched());
        match next_earliest {
            Some(epoch) if first_last_fetch_height >= epoch.start_height => {
                self.fetchers.remove(0);
                true
            }
            _ => false,
        }
    }
}
