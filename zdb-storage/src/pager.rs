use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::page::{Page, PAGE_SIZE};
use crate::wal::Wal;

#[cfg(unix)]
fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(unix)]
fn write_at(file: &File, offset: u64, buf: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn write_at(file: &File, offset: u64, buf: &[u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    let mut written = 0usize;
    while written < buf.len() {
        let n = file.seek_write(&buf[written..], offset + written as u64)?;
        written += n;
    }
    Ok(())
}

struct CacheEntry {
    page: Page,
    is_dirty: bool,
    ref_cnt: u32,
    next_dirty: Option<u32>,
}

pub struct PageStore {
    data_file: File,
    config: Config,
    cache: HashMap<u32, CacheEntry>,
    dirty_head: Option<u32>,
}

impl PageStore {
    fn open(path: &Path, config: Config) -> Result<Self> {
        let data_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(PageStore {
            data_file,
            config,
            cache: HashMap::new(),
            dirty_head: None,
        })
    }

    pub fn get(&mut self, page_id: u32) -> Result<PageHandle<'_>> {
        if !self.cache.contains_key(&page_id) {
            let mut buf = Box::new([0u8; PAGE_SIZE]);
            let n = read_at(&self.data_file, page_id as u64 * PAGE_SIZE as u64, &mut buf[..])?;
            let page = if n == 0 { Page::new() } else { Page::from_bytes(buf) };
            self.cache.insert(
                page_id,
                CacheEntry {
                    page,
                    is_dirty: false,
                    ref_cnt: 0,
                    next_dirty: None,
                },
            );
        }
        let entry = self.cache.get_mut(&page_id).expect("just inserted");
        entry.ref_cnt += 1;
        Ok(PageHandle { store: self, id: page_id })
    }

    fn unpin(&mut self, page_id: u32) {
        let entry = self.cache.get_mut(&page_id).expect("unpin of uncached page");
        debug_assert!(entry.ref_cnt > 0, "unpin called more often than get");
        entry.ref_cnt -= 1;
    }

    fn make_dirty(&mut self, page_id: u32) {
        let head = self.dirty_head;
        let entry = self.cache.get_mut(&page_id).expect("mark_dirty of uncached page");
        if entry.is_dirty {
            return;
        }
        entry.is_dirty = true;
        entry.next_dirty = head;
        self.dirty_head = Some(page_id);
    }

    pub fn flush(&mut self) -> Result<()> {
        let mut cur = self.dirty_head.take();
        let mut count = 0u32;
        while let Some(page_id) = cur {
            let next = self.cache.get(&page_id).and_then(|e| e.next_dirty);
            {
                let entry = self.cache.get_mut(&page_id).expect("dirty list points at live entry");
                write_at(&self.data_file, page_id as u64 * PAGE_SIZE as u64, entry.page.as_bytes())?;
                entry.is_dirty = false;
                entry.next_dirty = None;
            }
            count += 1;
            cur = next;
        }
        if self.config.sync_on_flush {
            self.data_file.sync_all()?;
        }
        debug!(dirty_pages = count, "pager flush");
        Ok(())
    }
}

fn wal_path_for(data_path: &Path, extension: &str) -> PathBuf {
    let mut os = data_path.as_os_str().to_owned();
    os.push(".");
    os.push(extension);
    PathBuf::from(os)
}

pub struct PageHandle<'a> {
    store: &'a mut PageStore,
    id: u32,
}

impl PageHandle<'_> {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn page(&self) -> &Page {
        &self.store.cache.get(&self.id).expect("handle outlives its entry").page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.store.cache.get_mut(&self.id).expect("handle outlives its entry").page
    }

    pub fn mark_dirty(&mut self) {
        self.store.make_dirty(self.id);
    }
}

impl Drop for PageHandle<'_> {
    fn drop(&mut self) {
        self.store.unpin(self.id);
    }
}

pub struct Pager {
    store: PageStore,
    wal: Wal,
}

impl Pager {
    pub fn open(path: &Path, config: Config) -> Result<Self> {
        let store = PageStore::open(path, config)?;
        let wal_path = wal_path_for(path, config.wal_extension);
        let wal = Wal::open(&wal_path)?;
        Ok(Pager { store, wal })
    }

    pub fn wal(&mut self) -> &mut Wal {
        &mut self.wal
    }

    pub fn parts_mut(&mut self) -> (&mut Wal, &mut PageStore) {
        (&mut self.wal, &mut self.store)
    }

    pub fn get(&mut self, page_id: u32) -> Result<PageHandle<'_>> {
        self.store.get(page_id)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }

    pub fn close(mut self) -> Result<()> {
        if let Err(err) = self.store.flush() {
            tracing::warn!(%err, "pager close: flush failed, continuing best-effort");
        }
        debug_assert!(
            self.store.cache.values().all(|entry| entry.ref_cnt == 0),
            "pager closed with pages still pinned"
        );
        Ok(())
    }
}
