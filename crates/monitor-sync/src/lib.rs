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

mod error;
mod fetcher;
mod resolver;
mod state;

pub use error::SyncError;
pub use fetcher::BlockFetcher;
pub use resolver::InitialBlockResolver;
pub use state::{BlockFetcherState, BlockFetcherStateV1, BLOCK_FETCHER_STATE_BLOB_NAME};

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{Bloom, H256, U256};
    use monitor_db::BlockStore;
    use monitor_rpc::{NodeRpc, RpcError};
    use monitor_types::RawBlock;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// An in-memory fake node for exercising the sync state machine without
    /// a network: blocks are keyed by number, forming one canonical chain.
    struct FakeRpc {
        blocks_by_number: RefCell<HashMap<u64, RawBlock>>,
        tip: RefCell<u64>,
    }

    impl FakeRpc {
        fn new() -> Self {
            FakeRpc {
                blocks_by_number: RefCell::new(HashMap::new()),
                tip: RefCell::new(0),
            }
        }

        fn push_block(&self, number: u64, parent_hash: H256) -> RawBlock {
            use rlp::RlpStream;
            let mut step_stream = RlpStream::new();
            step_stream.append(&number.to_string().into_bytes());
            let mut sig_stream = RlpStream::new();
            sig_stream.append(&vec![0u8; 65]);

            let raw = RawBlock {
                hash: H256::repeat_byte((number % 250) as u8 + 1),
                parent_hash,
                sha3_uncles: H256::zero(),
                author: ethereum_types::Address::zero(),
                state_root: H256::zero(),
                transactions_root: H256::zero(),
                receipts_root: H256::zero(),
                logs_bloom: Bloom::zero(),
                difficulty: U256::from(1),
                number: U256::from(number),
                gas_limit: U256::from(8_000_000u64),
                gas_used: U256::zero(),
                timestamp: U256::from(1_700_000_000u64 + number),
                extra_data: vec![],
                seal_fields: vec![step_stream.out().to_vec(), sig_stream.out().to_vec()],
                signature: vec![0u8; 65],
            };
            self.blocks_by_number.borrow_mut().insert(number, raw.clone());
            *self.tip.borrow_mut() = number;
            raw
        }

        /// Like [`Self::push_block`], but lets the caller pick a `fork_tag`
        /// byte so two blocks at the same height end up with distinct
        /// hashes. Used to simulate the node switching to a competing fork
        /// at the same height: a later call with the same `number` replaces
        /// the canonical view at that height, while the previous occupant's
        /// hash is gone from `blocks_by_number` (and so from `get_block_by_hash`
        /// too), matching how a reorg makes the old fork's blocks
        /// unreachable from a node that no longer considers them canonical.
        fn push_block_forked(&self, number: u64, parent_hash: H256, step: u64, fork_tag: u8) -> RawBlock {
            use rlp::RlpStream;
            let mut step_stream = RlpStream::new();
            step_stream.append(&step.to_string().into_bytes());
            let mut sig_stream = RlpStream::new();
            sig_stream.append(&vec![0u8; 65]);

            let mut hash_bytes = [0u8; 32];
            hash_bytes[0] = fork_tag;
            hash_bytes[31] = (number % 250) as u8 + 1;

            let raw = RawBlock {
                hash: H256::from(hash_bytes),
                parent_hash,
                sha3_uncles: H256::zero(),
                author: ethereum_types::Address::zero(),
                state_root: H256::zero(),
                transactions_root: H256::zero(),
                receipts_root: H256::zero(),
                logs_bloom: Bloom::zero(),
                difficulty: U256::from(1),
                number: U256::from(number),
                gas_limit: U256::from(8_000_000u64),
                gas_used: U256::zero(),
                timestamp: U256::from(1_700_000_000u64 + number),
                extra_data: vec![],
                seal_fields: vec![step_stream.out().to_vec(), sig_stream.out().to_vec()],
                signature: vec![0u8; 65],
            };
            self.blocks_by_number.borrow_mut().insert(number, raw.clone());
            if number > *self.tip.borrow() {
                *self.tip.borrow_mut() = number;
            }
            raw
        }
    }

    impl NodeRpc for FakeRpc {
        fn block_number(&self) -> Result<u64, RpcError> {
            Ok(*self.tip.borrow())
        }

        fn get_block_by_number(&self, number: u64) -> Result<Option<RawBlock>, RpcError> {
            Ok(self.blocks_by_number.borrow().get(&number).cloned())
        }

        fn get_block_by_hash(&self, hash: H256) -> Result<Option<RawBlock>, RpcError> {
            Ok(self
                .blocks_by_number
                .borrow()
                .values()
                .find(|b| b.hash == hash)
                .cloned())
        }

        fn get_epoch_start_heights(&self, _contract: ethereum_types::Address) -> Result<Vec<u64>, RpcError> {
            Ok(vec![])
        }

        fn get_validators(&self, _contract: ethereum_types::Address, _h: u64) -> Result<Vec<ethereum_types::Address>, RpcError> {
            Ok(vec![])
        }
    }

    #[test]
    fn syncs_forward_from_genesis() {
        let rpc = FakeRpc::new();
        rpc.push_block(0, H256::zero());
        let mut prev_hash = rpc.blocks_by_number.borrow()[&0].hash;
        for n in 1..=5u64 {
            let raw = rpc.push_block(n, prev_hash);
            prev_hash = raw.hash;
        }

        let mut db = BlockStore::open_in_memory().unwrap();
        let tick = db.begin_tick().unwrap();
        let mut fetcher = BlockFetcher::new(
            &rpc,
            &tick,
            1000,
            InitialBlockResolver::Genesis,
            BlockFetcherStateV1::default(),
        );

        let mut seen = Vec::new();
        let synced = fetcher
            .fetch_and_insert_new_blocks(500, None, |h| seen.push(h.number))
            .unwrap();
        assert_eq!(synced, 6);
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
        tick.commit().unwrap();
    }

    #[test]
    fn second_tick_with_no_new_blocks_inserts_nothing() {
        let rpc = FakeRpc::new();
        rpc.push_block(0, H256::zero());

        let mut db = BlockStore::open_in_memory().unwrap();
        let state = {
            let tick = db.begin_tick().unwrap();
            let mut fetcher = BlockFetcher::new(
                &rpc,
                &tick,
                1000,
                InitialBlockResolver::Genesis,
                BlockFetcherStateV1::default(),
            );
            fetcher
                .fetch_and_insert_new_blocks(500, None, |_| {})
                .unwrap();
            let state = fetcher.state();
            tick.commit().unwrap();
            state
        };

        let tick = db.begin_tick().unwrap();
        let mut fetcher = BlockFetcher::new(&rpc, &tick, 1000, InitialBlockResolver::Genesis, state);
        let synced = fetcher
            .fetch_and_insert_new_blocks(500, None, |_| {})
            .unwrap();
        assert_eq!(synced, 0);
        tick.commit().unwrap();
    }

    #[test]
    fn resumes_from_persisted_state_without_reinserting() {
        let rpc = FakeRpc::new();
        rpc.push_block(0, H256::zero());

        let mut db = BlockStore::open_in_memory().unwrap();
        let state = {
            let tick = db.begin_tick().unwrap();
            let mut fetcher = BlockFetcher::new(
                &rpc,
                &tick,
                1000,
                InitialBlockResolver::Genesis,
                BlockFetcherStateV1::default(),
            );
            fetcher
                .fetch_and_insert_new_blocks(500, None, |_| {})
                .unwrap();
            let state = fetcher.state();
            tick.commit().unwrap();
            state
        };

        let tick = db.begin_tick().unwrap();
        let mut fetcher = BlockFetcher::new(&rpc, &tick, 1000, InitialBlockResolver::Genesis, state);
        let synced = fetcher
            .fetch_and_insert_new_blocks(500, None, |_| {})
            .unwrap();
        assert_eq!(synced, 0);
        tick.commit().unwrap();
    }

    /// Simulates a crash after a tick's blocks (and the block fetcher's own
    /// state blob, written in the same transaction) have committed, but
    /// before anything else in that tick ran. A fresh fetcher built from the
    /// blob reloaded straight off the store must have a `head` equal to the
    /// last block actually committed, and must not re-fetch it.
    #[test]
    fn crash_after_commit_resumes_with_no_duplicate_refetch() {
        let rpc = FakeRpc::new();
        let mut prev_hash = H256::zero();
        for n in 0..=3u64 {
            let raw = rpc.push_block(n, prev_hash);
            prev_hash = raw.hash;
        }

        let mut db = BlockStore::open_in_memory().unwrap();
        {
            let tick = db.begin_tick().unwrap();
            let mut fetcher = BlockFetcher::new(
                &rpc,
                &tick,
                1000,
                InitialBlockResolver::Genesis,
                BlockFetcherStateV1::default(),
            );
            let synced = fetcher
                .fetch_and_insert_new_blocks(500, None, |_| {})
                .unwrap();
            assert_eq!(synced, 4);
            tick.commit().unwrap();
        }

        // Reload state the way `main` does on restart: straight from the
        // blob the last commit wrote, not from the in-memory `fetcher`.
        let reloaded = db
            .load_blob(BLOCK_FETCHER_STATE_BLOB_NAME)
            .unwrap()
            .expect("state blob committed alongside the blocks");
        let state: BlockFetcherState = serde_json::from_slice(&reloaded).unwrap();
        let state = state.into_v1();
        assert_eq!(state.head.as_ref().unwrap().number, 3);

        for n in 4..=6u64 {
            let raw = rpc.push_block(n, prev_hash);
            prev_hash = raw.hash;
        }

        let tick = db.begin_tick().unwrap();
        let mut fetcher = BlockFetcher::new(&rpc, &tick, 1000, InitialBlockResolver::Genesis, state);
        let mut seen = Vec::new();
        let synced = fetcher
            .fetch_and_insert_new_blocks(500, None, |h| seen.push(h.number))
            .unwrap();
        assert_eq!(synced, 3);
        assert_eq!(seen, vec![4, 5, 6]);
        tick.commit().unwrap();
    }

    /// Two common blocks, then a fork; the node later reorganizes onto a
    /// competing fork at the same heights. The fetcher must walk backward
    /// from the new tip to the shared ancestor, insert only the blocks the
    /// store doesn't already have, and leave both forks' hashes behind it.
    #[test]
    fn reorg_onto_competing_fork_inserts_only_the_new_branch() {
        let rpc = FakeRpc::new();
        let genesis = rpc.push_block_forked(0, H256::zero(), 0, 0);
        let common1 = rpc.push_block_forked(1, genesis.hash, 1, 0);
        let common2 = rpc.push_block_forked(2, common1.hash, 2, 0);
        let fork_a_3 = rpc.push_block_forked(3, common2.hash, 3, 0xA);
        let fork_a_4 = rpc.push_block_forked(4, fork_a_3.hash, 4, 0xA);

        let mut db = BlockStore::open_in_memory().unwrap();
        let state = {
            let tick = db.begin_tick().unwrap();
            let mut fetcher = BlockFetcher::new(
                &rpc,
                &tick,
                1000,
                InitialBlockResolver::Genesis,
                BlockFetcherStateV1::default(),
            );
            let mut seen = Vec::new();
            let synced = fetcher
                .fetch_and_insert_new_blocks(500, None, |h| seen.push(h.hash))
                .unwrap();
            assert_eq!(synced, 5);
            assert_eq!(
                seen,
                vec![genesis.hash, common1.hash, common2.hash, fork_a_3.hash, fork_a_4.hash]
            );
            let state = fetcher.state();
            tick.commit().unwrap();
            state
        };

        // The node reorganizes: heights 3 and 4 are replaced by a competing
        // fork with steps far from fork A's so the equivocation index (keyed
        // on proposer+step) doesn't see these as the same contest.
        let fork_b_3 = rpc.push_block_forked(3, common2.hash, 103, 0xB);
        let fork_b_4 = rpc.push_block_forked(4, fork_b_3.hash, 104, 0xB);

        let tick = db.begin_tick().unwrap();
        let mut fetcher = BlockFetcher::new(&rpc, &tick, 1000, InitialBlockResolver::Genesis, state);
        let mut seen = Vec::new();
        let synced = fetcher
            .fetch_and_insert_new_blocks(500, None, |h| seen.push(h.hash))
            .unwrap();
        assert_eq!(synced, 2);
        assert_eq!(seen, vec![fork_b_3.hash, fork_b_4.hash]);
        tick.commit().unwrap();

        for hash in [
            genesis.hash,
            common1.hash,
            common2.hash,
            fork_a_3.hash,
            fork_a_4.hash,
            fork_b_3.hash,
            fork_b_4.hash,
        ] {
            assert!(db.contains(&hash).unwrap(), "missing {hash:?}");
        }
    }
}
