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

//! Forward and backward chain synchronization with reorg tolerance and
//! crash-safe, bounded-per-tick resumption (C5).

use monitor_db::TickTransaction;
use monitor_rpc::NodeRpc;
use monitor_types::{canonicalize, Header};

use crate::error::SyncError;
use crate::resolver::InitialBlockResolver;
use crate::state::BlockFetcherStateV1;

/// Fetches new blocks from an RPC node and inserts them into the given
/// tick's transaction, firing `on_block` for every block in the order it
/// was inserted. Never commits on its own — the caller commits once, after
/// every component for the tick has written into the same transaction.
pub struct BlockFetcher<'a, 'tx> {
    rpc: &'a dyn NodeRpc,
    db: &'a TickTransaction<'tx>,
    max_reorg_depth: u64,
    initial_block_resolver: InitialBlockResolver,

    head: Option<Header>,
    current_branch: Vec<Header>,
    initial_blocknr: u64,

    start_sync_number: u64,
    syncing: bool,
}

impl<'a, 'tx> BlockFetcher<'a, 'tx> {
    pub fn new(
        rpc: &'a dyn NodeRpc,
        db: &'a TickTransaction<'tx>,
        max_reorg_depth: u64,
        initial_block_resolver: InitialBlockResolver,
        state: BlockFetcherStateV1,
    ) -> Self {
        BlockFetcher {
            rpc,
            db,
            max_reorg_depth,
            initial_block_resolver,
            head: state.head,
            current_branch: state.current_branch,
            initial_blocknr: state.initial_blocknr,
            start_sync_number: 0,
            syncing: false,
        }
    }

    pub fn state(&self) -> BlockFetcherStateV1 {
        BlockFetcherStateV1 {
            head: self.head.clone(),
            current_branch: self.current_branch.clone(),
            initial_blocknr: self.initial_blocknr,
        }
    }

    fn backwards_sync_in_progress(&self) -> bool {
        !self.current_branch.is_empty()
    }

    fn head_number(&self) -> u64 {
        self.head.as_ref().map(|h| h.number).unwrap_or(0)
    }

    /// Fetches and inserts up to `max_blocks` new blocks, at most up to
    /// `max_height` if given. Returns the number of blocks inserted.
    pub fn fetch_and_insert_new_blocks(
        &mut self,
        max_blocks: u64,
        max_height: Option<u64>,
        mut on_block: impl FnMut(&Header),
    ) -> Result<u64, SyncError> {
        if max_blocks == 0 {
            return Ok(0);
        }

        let mut synced = 0u64;

        if self.db.is_empty()? {
            self.insert_first_block(&mut on_block)?;
            synced += 1;
        }

        self.update_sync_progress()?;

        if !self.backwards_sync_in_progress() {
            let forward_target = self.forward_sync_target()?;
            let max_forward_height = match max_height {
                Some(h) => forward_target.min(h),
                None => forward_target,
            };
            let forward_budget = max_blocks.saturating_sub(synced);
            synced += self.sync_forwards(forward_budget, max_forward_height, &mut on_block)?;
        }

        let backward_budget = max_blocks.saturating_sub(synced);
        synced += self.sync_backwards(backward_budget, max_height, &mut on_block)?;

        Ok(synced)
    }

    fn forward_sync_target(&self) -> Result<u64, SyncError> {
        let head_number = self.rpc.block_number()?;
        Ok(head_number.saturating_sub(self.max_reorg_depth))
    }

    fn sync_forwards(
        &mut self,
        max_blocks: u64,
        max_height: u64,
        on_block: &mut impl FnMut(&Header),
    ) -> Result<u64, SyncError> {
        if max_blocks == 0 {
            return Ok(0);
        }
        let start = self.head_number() + 1;
        let mut blocks = Vec::new();
        let mut number = start;
        while blocks.len() < max_blocks as usize && number <= max_height {
            let Some(raw) = self.rpc.get_block_by_number(number)? else {
                break;
            };
            blocks.push(canonicalize(&raw)?);
            number += 1;
        }
        let count = blocks.len() as u64;
        self.insert_branch(blocks, on_block)?;
        Ok(count)
    }

    fn sync_backwards(
        &mut self,
        max_blocks: u64,
        max_height: Option<u64>,
        on_block: &mut impl FnMut(&Header),
    ) -> Result<u64, SyncError> {
        let before = self.current_branch.len();
        let complete = self.fetch_branch(max_blocks, max_height)?;
        let fetched = self.current_branch.len().saturating_sub(before) as u64;

        if complete && !self.current_branch.is_empty() {
            let mut branch = std::mem::take(&mut self.current_branch);
            branch.reverse();
            self.insert_branch(branch, on_block)?;
        }
        Ok(fetched)
    }

    /// Walks parent links starting from `max_height` (or "latest"),
    /// appending to `current_branch`, until either the parent is already
    /// known (branch complete) or `max_blocks` is exhausted.
    fn fetch_branch(&mut self, max_blocks: u64, max_height: Option<u64>) -> Result<bool, SyncError> {
        if max_blocks == 0 {
            return Ok(false);
        }

        let mut fetched = 0u64;
        if self.current_branch.is_empty() {
            let head = self.get_block(max_height)?;
            if self.db.contains(&head.hash)? {
                return Ok(true);
            }
            self.current_branch.push(head);
            fetched += 1;
        }

        while fetched < max_blocks {
            let tail_parent = self.current_branch.last().expect("just pushed above").parent_hash;
            if self.db.contains(&tail_parent)? {
                break;
            }
            let parent = self.get_block_by_hash(tail_parent)?;
            self.current_branch.push(parent);
            fetched += 1;
        }

        let tail_parent = self.current_branch.last().expect("non-empty by construction").parent_hash;
        self.db.contains(&tail_parent).map_err(SyncError::from)
    }

    fn get_block(&self, height: Option<u64>) -> Result<Header, SyncError> {
        let raw = match height {
            Some(h) => self.rpc.get_block_by_number(h)?,
            None => {
                let latest = self.rpc.block_number()?;
                self.rpc.get_block_by_number(latest)?
            }
        };
        let header = canonicalize(&raw.ok_or(SyncError::ForkWithUnknownBase)?)?;
        self.check_not_below_initial(&header)
    }

    fn get_block_by_hash(&self, hash: ethereum_types::H256) -> Result<Header, SyncError> {
        let raw = self
            .rpc
            .get_block_by_hash(hash)?
            .ok_or(SyncError::ForkWithUnknownBase)?;
        let header = canonicalize(&raw)?;
        self.check_not_below_initial(&header)
    }

    fn check_not_below_initial(&self, header: &Header) -> Result<Header, SyncError> {
        if header.number < self.initial_blocknr {
            log::error!(
                "fetched block {} < {} (initial block number) while syncing backwards",
                header.number,
                self.initial_blocknr
            );
            return Err(SyncError::ForkBelowInitial);
        }
        Ok(header.clone())
    }

    fn insert_first_block(&mut self, on_block: &mut impl FnMut(&Header)) -> Result<(), SyncError> {
        let block = self.initial_block_resolver.resolve(self.rpc)?;

        let latest = self.rpc.get_block_by_number(self.rpc.block_number()?)?
            .ok_or(SyncError::NoInitialBlock)
            .and_then(|raw| Ok(canonicalize(&raw)?))?;

        let safe_initial_blocknr = latest.number.saturating_sub(self.max_reorg_depth);
        let block = if block.number > safe_initial_blocknr {
            log::warn!(
                "choosing block {} instead of {} as the initial block (max reorg depth {})",
                safe_initial_blocknr,
                block.number,
                self.max_reorg_depth
            );
            let raw = self
                .rpc
                .get_block_by_number(safe_initial_blocknr)?
                .ok_or(SyncError::NoInitialBlock)?;
            canonicalize(&raw)?
        } else {
            block
        };

        self.initial_blocknr = block.number;
        log::info!(
            "starting initial sync from block {}, latest {}",
            block.number,
            latest.number
        );
        self.insert_branch(vec![block], on_block)
    }

    /// Inserts `blocks` and persists the resulting `head`/`currentBranch`
    /// into the tick's shared transaction, without committing it: the
    /// orchestrator commits once, after every component has written its
    /// half of the tick, so a crash can never leave committed blocks whose
    /// state write (or any other component's, or a report file) didn't also
    /// land.
    fn insert_branch(
        &mut self,
        blocks: Vec<Header>,
        on_block: &mut impl FnMut(&Header),
    ) -> Result<(), SyncError> {
        if blocks.is_empty() {
            return Ok(());
        }

        let first = &blocks[0];
        if first.number != 0 && first.number != self.initial_blocknr && !self.db.contains(&first.parent_hash)? {
            return Err(SyncError::ForkWithUnknownBase);
        }

        let state_after = BlockFetcherStateV1 {
            head: blocks.last().cloned(),
            current_branch: Vec::new(),
            initial_blocknr: self.initial_blocknr,
        };
        let blob = serde_json::to_vec(&crate::state::BlockFetcherState::V1(state_after))
            .expect("state serialization cannot fail");
        self.db.insert_branch(&blocks)?;
        self.db
            .store_blob(crate::state::BLOCK_FETCHER_STATE_BLOB_NAME, &blob)?;

        self.head = blocks.last().cloned();
        self.current_branch.clear();

        for block in &blocks {
            on_block(block);
        }
        Ok(())
    }

    /// Tracks an approximate sync-progress fraction for logging only; never
    /// persisted (see `startSyncNumber` in the design notes).
    fn update_sync_progress(&mut self) -> Result<(), SyncError> {
        let tip = self.rpc.block_number()?;
        if !self.syncing && self.head_number() + 5 < tip {
            self.start_sync_number = self.head_number();
            self.syncing = true;
        }
        if self.syncing && self.head_number() + 1 >= tip {
            self.syncing = false;
        }
        Ok(())
    }

    /// Fraction of the distance between `start_sync_number` and the node's
    /// current tip that has been covered so far, clamped to `[0, 1]`. Used
    /// only for a log line; not part of any persisted state.
    pub fn sync_progress(&self) -> Result<f64, SyncError> {
        let tip = self.rpc.block_number()?;
        if tip <= self.start_sync_number {
            return Ok(1.0);
        }
        let branch_correction = (self.current_branch.len() as u64).min(tip.saturating_sub(self.head_number()));
        let covered = (self
            .head_number()
            .saturating_sub(self.start_sync_number)
            + branch_correction) as f64;
        Ok((covered / (tip - self.start_sync_number) as f64).min(1.0))
    }
}
