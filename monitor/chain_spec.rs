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

//! Loads and parses the chain spec file named on the command line.

use std::path::Path;

use monitor_validators::ValidatorDefinitionRange;

use crate::error::ConfigError;

pub fn load_validator_definition_ranges(
    path: &Path,
) -> Result<Vec<ValidatorDefinitionRange>, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let chain_spec: serde_json::Value = serde_json::from_str(&contents)
        .map_err(monitor_validators::ChainSpecError::from)?;
    let ranges = monitor_validators::parse_validator_definition_ranges(&chain_spec)?;
    Ok(ranges)
}
