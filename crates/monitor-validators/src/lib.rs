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

//! Chain-spec parsing (C3's static half), the primary oracle, and the
//! on-chain epoch fetchers (C3/C4 of the misbehavior monitor).

mod chainspec;
mod error;
mod fetcher;
mod oracle;

pub use chainspec::{
    parse_validator_definition_ranges, ValidatorDefinitionKind, ValidatorDefinitionRange,
};
pub use error::{ChainSpecError, FetchError, OracleError};
pub use fetcher::{ContractEpochFetcher, EpochFetcher};
pub use oracle::{static_epochs, Epoch, PrimaryOracle};

/// Builds a [`PrimaryOracle`] seeded with the static epochs of a chain
/// spec's validator definition, and an [`EpochFetcher`] for its contract
/// ranges, if any.
pub fn build_from_ranges(ranges: &[ValidatorDefinitionRange]) -> (PrimaryOracle, EpochFetcher) {
    let mut oracle = PrimaryOracle::new();
    for epoch in static_epochs(ranges) {
        oracle.add_epoch(epoch);
    }
    let fetcher = EpochFetcher::new(ranges);
    (oracle, fetcher)
}

/// Polls `fetcher` for new epochs, feeds them into `oracle`, and updates
/// `oracle.max_height` from the fetcher's current reach.
pub fn refresh(
    oracle: &mut PrimaryOracle,
    fetcher: &mut EpochFetcher,
    rpc: &dyn monitor_rpc::NodeRpc,
) -> Result<(), FetchError> {
    let new_epochs = fetcher.fetch_new_epochs(rpc)?;
    for epoch in new_epochs {
        oracle.add_epoch(epoch);
    }
    if let Some(max_height) = fetcher.max_height() {
        oracle.max_height = Some(max_height);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::Address;
    use serde_json::json;

    #[test]
    fn build_from_ranges_seeds_static_epochs() {
        let spec = json!({
            "engine": { "authorityRound": { "params": { "validators": { "multi": {
                "0": { "list": ["0x".to_string() + &"00".repeat(20)] }
            } } } } }
        });
        let ranges = parse_validator_definition_ranges(&spec).unwrap();
        let (oracle, _fetcher) = build_from_ranges(&ranges);
        assert_eq!(oracle.primary(0, 0).unwrap(), Address::zero());
    }

    #[test]
    fn no_contract_ranges_means_unbounded_max_height() {
        let spec = json!({
            "engine": { "authorityRound": { "params": { "validators": { "multi": {
                "0": { "list": ["0x".to_string() + &"00".repeat(20)] }
            } } } } }
        });
        let ranges = parse_validator_definition_ranges(&spec).unwrap();
        let (_oracle, fetcher) = build_from_ranges(&ranges);
        assert_eq!(fetcher.max_height(), None);
    }
}
