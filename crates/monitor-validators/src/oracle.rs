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

//! Resolves `(height, step) -> expected validator` across a layered history
//! of epochs, keeping the set pruned to whatever is still relevant.

use std::collections::BTreeMap;

use ethereum_types::Address;

use crate::chainspec::{ValidatorDefinitionKind, ValidatorDefinitionRange};
use crate::error::OracleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Epoch {
    pub start_height: u64,
    pub validators: Vec<Address>,
    pub definition_index: u32,
}

/// Seeds the oracle with one epoch per `list`-type validator definition
/// range, at `range.enter_height`, `definitionIndex = rangeIndex`.
pub fn static_epochs(ranges: &[ValidatorDefinitionRange]) -> Vec<Epoch> {
    ranges
        .iter()
        .enumerate()
        .filter_map(|(index, range)| match &range.kind {
            ValidatorDefinitionKind::List(validators) => Some(Epoch {
                start_height: range.enter_height,
                validators: validators.clone(),
                definition_index: index as u32,
            }),
            _ => None,
        })
        .collect()
}

/// Answers `primary(height, step)` against a layered, prunable set of
/// epochs. `max_height` is `None` for a purely static configuration (no
/// contract fetchers involved), meaning there is no upper bound.
#[derive(Debug, Default)]
pub struct PrimaryOracle {
    epochs: BTreeMap<u64, Epoch>,
    pub max_height: Option<u64>,
}

impl PrimaryOracle {
    pub fn new() -> Self {
        PrimaryOracle {
            epochs: BTreeMap::new(),
            max_height: None,
        }
    }

    pub fn primary(&self, height: u64, step: u64) -> Result<Address, OracleError> {
        let validators = self.validators(height)?;
        let index = (step as usize) % validators.len();
        Ok(validators[index])
    }

    pub fn validators(&self, height: u64) -> Result<&[Address], OracleError> {
        if let Some(max_height) = self.max_height {
            if height > max_height {
                return Err(OracleError::HeightOutOfRange { height, max_height });
            }
        }
        self.epochs
            .range(..=height)
            .next_back()
            .map(|(_, epoch)| epoch.validators.as_slice())
            .ok_or(OracleError::BeforeFirstEpoch(height))
    }

    /// Adds `epoch` if it is relevant, silently dropping it otherwise, and
    /// prunes any later epochs it renders irrelevant.
    pub fn add_epoch(&mut self, epoch: Epoch) {
        assert!(!epoch.validators.is_empty(), "validator set of epoch is empty");

        if !self.is_relevant(&epoch) {
            return;
        }
        let inserted_start_height = epoch.start_height;
        let inserted_definition_index = epoch.definition_index;
        self.epochs.insert(epoch.start_height, epoch);
        self.remove_epochs_rendered_irrelevant(inserted_start_height, inserted_definition_index);
    }

    fn is_relevant(&self, epoch: &Epoch) -> bool {
        match self
            .epochs
            .range(..=epoch.start_height)
            .next_back()
        {
            None => true,
            Some((_, previous)) => previous.definition_index <= epoch.definition_index,
        }
    }

    fn remove_epochs_rendered_irrelevant(&mut self, inserted_start_height: u64, inserted_definition_index: u32) {
        let to_remove: Vec<u64> = self
            .epochs
            .range((inserted_start_height + 1)..)
            .take_while(|(_, epoch)| epoch.definition_index < inserted_definition_index)
            .map(|(start_height, _)| *start_height)
            .collect();
        for start_height in to_remove {
            self.epochs.remove(&start_height);
        }
    }
}
