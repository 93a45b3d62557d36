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

//! Detects two distinct blocks signed by the same proposer at the same
//! step (C8). Stateless: correctness relies entirely on the block store's
//! (proposer, step) secondary index, so the block must already have been
//! committed before this is called.

use ethereum_types::H256;

use monitor_db::BlockLookup;
use monitor_types::{decode_step, recover_proposer, CodecError, Header};

use crate::event_sink::EventSink;

/// Generic over [`BlockLookup`] so the same reporter logic runs both
/// standalone against a committed [`monitor_db::BlockStore`] (tests, and any
/// read-only use) and mid-tick against a still-open
/// `monitor_db::TickTransaction`, where it must see blocks inserted earlier
/// in the same, not-yet-committed transaction.
pub struct EquivocationReporter<'a, L: BlockLookup> {
    db: &'a L,
}

impl<'a, L: BlockLookup> EquivocationReporter<'a, L> {
    pub fn new(db: &'a L) -> Self {
        EquivocationReporter { db }
    }

    pub fn on_block(
        &self,
        header: &Header,
        sink: &mut impl EventSink<Vec<H256>>,
    ) -> Result<(), CodecError> {
        let proposer = recover_proposer(header)?;
        let step = decode_step(header)?;

        let rows = self
            .db
            .get_by_proposer_and_step(&proposer, step)
            .expect("block store read failed");
        let hashes: Vec<H256> = rows.iter().map(|row| row.hash).collect();

        debug_assert!(
            hashes.contains(&header.hash),
            "block must already be committed before the equivocation reporter runs"
        );

        if hashes.len() >= 2 {
            log::info!(
                "detected equivocation by {:?} at step {}: {:?}",
                proposer,
                step,
                hashes
            );
            sink.on_event(hashes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{Address, Bloom, U256};
    use monitor_db::BlockStore;
    use rlp::RlpStream;

    fn header_at_step(number: u64, step: u64, extra_data: Vec<u8>) -> Header {
        let mut step_stream = RlpStream::new();
        step_stream.append(&step.to_string().into_bytes());
        let mut sig_stream = RlpStream::new();
        sig_stream.append(&vec![0u8; 65]);

        let mut header = Header {
            parent_hash: H256::repeat_byte(0x01),
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
            extra_data,
            seal_fields: vec![step_stream.out().to_vec(), sig_stream.out().to_vec()],
            signature: [0u8; 65],
            hash: H256::zero(),
        };
        header.hash = monitor_types::bare_hash(&header).unwrap();
        header
    }

    #[test]
    fn two_blocks_same_proposer_and_step_trigger_one_event() {
        let mut db = BlockStore::open_in_memory().unwrap();
        let b1 = header_at_step(5, 3, vec![1]);
        let b2 = header_at_step(5, 3, vec![2]);
        db.insert_branch(&[b1.clone()]).unwrap();

        let reporter = EquivocationReporter::new(&db);
        let mut events = Vec::new();
        reporter.on_block(&b1, &mut |e| events.push(e)).unwrap();
        assert!(events.is_empty());

        // b2 has a distinct hash (different extra_data) but identical
        // proposer+step; insert it into a fresh branch keyed off its own
        // parent so insertion succeeds independent of b1.
        let mut db2_insert = vec![b2.clone()];
        db2_insert[0].parent_hash = H256::repeat_byte(0x02);
        db.insert_branch(&db2_insert).unwrap();

        reporter.on_block(&b2, &mut |e| events.push(e)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].len(), 2);
    }

    #[test]
    fn single_block_triggers_no_event() {
        let mut db = BlockStore::open_in_memory().unwrap();
        let b1 = header_at_step(5, 3, vec![1]);
        db.insert_branch(&[b1.clone()]).unwrap();

        let reporter = EquivocationReporter::new(&db);
        let mut events = Vec::new();
        reporter.on_block(&b1, &mut |e| events.push(e)).unwrap();
        assert!(events.is_empty());
    }
}
