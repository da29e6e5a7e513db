//! The Database facade: composes WAL append, page write, and index update
//! into the engine's durability protocol. `set`/`delete` always append to
//! the WAL before touching page 0; `open` replays the WAL to rebuild the
//! index before any caller-visible state exists.

use std::path::Path;

use tracing::{info, info_span};

use crate::btree::BTree;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pager::{PageStore, Pager};
use crate::record_ref::RecordRef;
use crate::wal::{WalHandler, WalOp};

const MAX_VALUE_LEN: usize = 65535;

/// An embedded key/value store: slotted page 0, a WAL, and an in-memory
/// B-tree index, composed behind set/get/delete and ordered iteration.
pub struct Database {
    pager: Pager,
    index: BTree,
}

impl Database {
    /// Open (creating if absent) the data file and WAL at `path`, replaying
    /// the WAL into a fresh index.
    pub fn open(path: &Path, config: Config) -> Result<Self> {
        let _span = info_span!("database_open", path = %path.display()).entered();
        let mut pager = Pager::open(path, config)?;
        let mut index = BTree::new();
        {
            let (wal, store) = pager.parts_mut();
            let mut handler = |op: WalOp<'_>| -> Result<()> {
                match op {
                    WalOp::Set { key, value } => {
                        let slot = write_page0(store, value)?;
                        index.insert(key, RecordRef { page_id: 0, slot }.encode());
                        Ok(())
                    }
                    WalOp::Delete { key } => {
                        index.delete(key);
                        Ok(())
                    }
                }
            };
            wal.replay(&mut handler)?;
        }
        info!(path = %path.display(), "database opened");
        Ok(Database { pager, index })
    }

    pub fn open_default(path: &Path) -> Result<Self> {
        Database::open(path, Config::default())
    }

    /// Append-then-write: log the SET, then materialize it on page 0 and
    /// upsert the index.
    pub fn set(&mut self, key: u64, value: &[u8]) -> Result<()> {
        if value.len() > MAX_VALUE_LEN {
            return Err(Error::ValueTooLarge { len: value.len() });
        }
        self.pager.wal().append_set(key, value)?;
        let slot = write_page0(&mut self.pager, value)?;
        self.index.insert(key, RecordRef { page_id: 0, slot }.encode());
        Ok(())
    }

    pub fn get(&mut self, key: u64) -> Result<Option<Vec<u8>>> {
        let Some(encoded) = self.index.search(key) else {
            return Ok(None);
        };
        let rref = RecordRef::decode(encoded);
        let handle = self.pager.get(rref.page_id)?;
        Ok(handle.page().get(rref.slot).map(|bytes| bytes.to_vec()))
    }

    /// Logs the delete unconditionally (idempotent on replay), then removes
    /// the on-page record and index entry if the key was present.
    pub fn delete(&mut self, key: u64) -> Result<()> {
        self.pager.wal().append_delete(key)?;
        if let Some(encoded) = self.index.search(key) {
            let rref = RecordRef::decode(encoded);
            {
                let mut handle = self.pager.get(rref.page_id)?;
                handle.page_mut().delete(rref.slot)?;
                handle.mark_dirty();
            }
            self.index.delete(key);
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.pager.flush()
    }

    pub fn close(self) -> Result<()> {
        self.pager.close()
    }

    /// Visit every entry in ascending key order.
    pub fn for_each(&mut self, mut visitor: impl FnMut(u64, &[u8])) -> Result<()> {
        let mut error = None;
        let pager = &mut self.pager;
        self.index.for_each(|key, encoded| {
            if error.is_some() {
                return;
            }
            let rref = RecordRef::decode(encoded);
            match pager.get(rref.page_id) {
                Ok(handle) => {
                    if let Some(bytes) = handle.page().get(rref.slot) {
                        visitor(key, bytes);
                    }
                }
                Err(e) => error = Some(e),
            }
        });
        error.map_or(Ok(()), Err)
    }

    /// Visit entries with keys in `[lo, hi]`, ascending.
    pub fn range(&mut self, lo: u64, hi: u64, mut visitor: impl FnMut(u64, &[u8])) -> Result<()> {
        let mut error = None;
        let pager = &mut self.pager;
        self.index.range(lo, hi, |key, encoded| {
            if error.is_some() {
                return;
            }
            let rref = RecordRef::decode(encoded);
            match pager.get(rref.page_id) {
                Ok(handle) => {
                    if let Some(bytes) = handle.page().get(rref.slot) {
                        visitor(key, bytes);
                    }
                }
                Err(e) => error = Some(e),
            }
        });
        error.map_or(Ok(()), Err)
    }

    pub fn cursor(&mut self) -> DbCursor<'_> {
        DbCursor {
            inner: self.index.cursor_first(),
            db: self,
        }
    }
}

fn write_page0(store: &mut PageStore, value: &[u8]) -> Result<u16> {
    let mut handle = store.get(0)?;
    if !handle.page().can_insert(value.len()) {
        handle.page_mut().defragment();
        if !handle.page().can_insert(value.len()) {
            return Err(Error::OutOfSpace);
        }
    }
    let slot = handle.page_mut().insert(value)?;
    handle.mark_dirty();
    Ok(slot)
}

/// Ascending-order cursor over a `Database`'s index, decoding each page
/// reference lazily as the caller advances.
pub struct DbCursor<'a> {
    db: &'a mut Database,
    inner: crate::btree::Cursor,
}

impl DbCursor<'_> {
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    pub fn key(&self) -> Option<u64> {
        self.inner.key()
    }

    pub fn value(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(encoded) = self.inner.value() else {
            return Ok(None);
        };
        let rref = RecordRef::decode(encoded);
        let handle = self.db.pager.get(rref.page_id)?;
        Ok(handle.page().get(rref.slot).map(|bytes| bytes.to_vec()))
    }

    pub fn advance(&mut self) {
        self.inner.advance();
    }
}
