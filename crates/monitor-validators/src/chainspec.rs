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

//! Parses the `engine.authorityRound.params.validators.multi` object of a
//! chain spec into an ordered list of [`ValidatorDefinitionRange`]s.

use ethereum_types::Address;
use serde_json::Value;

use crate::error::ChainSpecError;

/// One contiguous range of heights sharing a validator-set definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorDefinitionRange {
    pub enter_height: u64,
    pub leave_height: Option<u64>,
    pub kind: ValidatorDefinitionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorDefinitionKind {
    List(Vec<Address>),
    Contract(Address),
    SafeContract(Address),
}

impl ValidatorDefinitionKind {
    pub fn is_contract(&self) -> bool {
        !matches!(self, ValidatorDefinitionKind::List(_))
    }

    pub fn contract_address(&self) -> Option<Address> {
        match self {
            ValidatorDefinitionKind::Contract(addr) | ValidatorDefinitionKind::SafeContract(addr) => {
                Some(*addr)
            }
            ValidatorDefinitionKind::List(_) => None,
        }
    }
}

/// Extracts `engine.authorityRound.params.validators` from a parsed chain
/// spec document and turns its `multi` map into sorted, non-overlapping
/// ranges, one extra "tail" range of `leave_height = None` implied by the
/// last entry.
pub fn parse_validator_definition_ranges(
    chain_spec: &Value,
) -> Result<Vec<ValidatorDefinitionRange>, ChainSpecError> {
    let multi = chain_spec
        .pointer("/engine/authorityRound/params/validators/multi")
        .ok_or_else(|| {
            ChainSpecError::Invalid(
                "missing engine.authorityRound.params.validators.multi".to_string(),
            )
        })?;

    let multi = multi
        .as_object()
        .ok_or_else(|| ChainSpecError::Invalid("multi list must be a mapping".to_string()))?;

    if !multi.contains_key("0") {
        return Err(ChainSpecError::Invalid(
            "multi list must contain validators for block number 0".to_string(),
        ));
    }

    let mut entries = Vec::with_capacity(multi.len());
    for (key, entry) in multi {
        let height: u64 = key.parse().map_err(|_| {
            ChainSpecError::Invalid(format!("multi list keys must be stringified ints, got {key}"))
        })?;
        entries.push((height, parse_entry(entry)?));
    }
    entries.sort_by_key(|(height, _)| *height);

    let mut ranges = Vec::with_capacity(entries.len());
    for (index, (height, kind)) in entries.iter().enumerate() {
        let leave_height = entries.get(index + 1).map(|(next_height, _)| *next_height);
        ranges.push(ValidatorDefinitionRange {
            enter_height: *height,
            leave_height,
            kind: kind.clone(),
        });
    }
    Ok(ranges)
}

fn parse_entry(entry: &Value) -> Result<ValidatorDefinitionKind, ChainSpecError> {
    let object = entry
        .as_object()
        .ok_or_else(|| ChainSpecError::Invalid("multi list entries must be a mapping".to_string()))?;

    if object.len() != 1 {
        return Err(ChainSpecError::Invalid(
            "multi list entries must have exactly one key".to_string(),
        ));
    }
    let (kind, data) = object.iter().next().expect("checked len == 1 above");

    match kind.as_str() {
        "list" => {
            let addresses = data
                .as_array()
                .ok_or_else(|| {
                    ChainSpecError::Invalid("static validator list definition must be a list".to_string())
                })?;
            if addresses.is_empty() {
                return Err(ChainSpecError::Invalid(
                    "static validator list must not be empty".to_string(),
                ));
            }
            let parsed = addresses
                .iter()
                .map(parse_hex_address)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ValidatorDefinitionKind::List(parsed))
        }
        "contract" => parse_hex_address(data).map(ValidatorDefinitionKind::Contract),
        "safeContract" => parse_hex_address(data).map(ValidatorDefinitionKind::SafeContract),
        other => Err(ChainSpecError::Invalid(format!(
            "multi list entries must be one of list, safeContract or contract, got {other}"
        ))),
    }
}

fn parse_hex_address(value: &Value) -> Result<Address, ChainSpecError> {
    let s = value
        .as_str()
        .ok_or_else(|| ChainSpecError::Invalid("expected a hex address string".to_string()))?;
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = rustc_hex::FromHex::from_hex(trimmed)
        .map_err(|_| ChainSpecError::Invalid(format!("not a valid hex address: {s}")))?;
    let bytes: Vec<u8> = bytes;
    if bytes.len() != 20 {
        return Err(ChainSpecError::Invalid(format!(
            "hex address must be 20 bytes, found {}",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wrap(multi: Value) -> Value {
        json!({ "engine": { "authorityRound": { "params": { "validators": { "multi": multi } } } } })
    }

    #[test]
    fn parses_single_static_list() {
        let spec = wrap(json!({ "0": { "list": ["0x".to_string() + &"00".repeat(20)] } }));
        let ranges = parse_validator_definition_ranges(&spec).unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].enter_height, 0);
        assert_eq!(ranges[0].leave_height, None);
        assert!(!ranges[0].kind.is_contract());
    }

    #[test]
    fn parses_multiple_ranges_sorted_by_height() {
        let spec = wrap(json!({
            "100": { "list": ["0x".to_string() + &"11".repeat(20)] },
            "0": { "list": ["0x".to_string() + &"00".repeat(20)] },
        }));
        let ranges = parse_validator_definition_ranges(&spec).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].enter_height, 0);
        assert_eq!(ranges[0].leave_height, Some(100));
        assert_eq!(ranges[1].enter_height, 100);
        assert_eq!(ranges[1].leave_height, None);
    }

    #[test]
    fn rejects_missing_zero_height() {
        let spec = wrap(json!({ "1": { "list": ["0x".to_string() + &"00".repeat(20)] } }));
        assert!(parse_validator_definition_ranges(&spec).is_err());
    }

    #[test]
    fn rejects_empty_static_list() {
        let spec = wrap(json!({ "0": { "list": [] } }));
        assert!(parse_validator_definition_ranges(&spec).is_err());
    }

    #[test]
    fn rejects_non_digit_height_key() {
        let spec = wrap(json!({ "zero": { "list": ["0x".to_string() + &"00".repeat(20)] } }));
        assert!(parse_validator_definition_ranges(&spec).is_err());
    }

    #[test]
    fn rejects_non_hex_address() {
        let spec = wrap(json!({ "0": { "list": ["0x" .to_string() + &"gg".repeat(20)] } }));
        assert!(parse_validator_definition_ranges(&spec).is_err());
    }

    #[test]
    fn rejects_multiple_keys_in_entry() {
        let spec = wrap(json!({
            "0": { "list": ["0x".to_string() + &"00".repeat(20)], "another_key": [] }
        }));
        assert!(parse_validator_definition_ranges(&spec).is_err());
    }

    #[test]
    fn parses_contract_entry() {
        let addr = "0x".to_string() + &"05".repeat(20);
        let spec = wrap(json!({ "0": { "contract": addr } }));
        let ranges = parse_validator_definition_ranges(&spec).unwrap();
        assert!(ranges[0].kind.is_contract());
        assert!(ranges[0].kind.contract_address().is_some());
    }
}
