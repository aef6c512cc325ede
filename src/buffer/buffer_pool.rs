//! Buffer Pool - the page caching layer.
//!
//! The [`BufferPool`] provides:
//! - Page caching between table files and memory
//! - Dirty page write-back on eviction, removal and flush
//! - Pluggable eviction policies through [`ReplacementStrategy`]

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::buffer::replacer::ReplacementStrategy;
use crate::buffer::BufferPoolStats;
use crate::common::config::StorageConfig;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::FileManager;

/// Caches decoded pages keyed by `(table, page number)`.
///
/// # Architecture
/// ```text
/// ┌───────────────────────────────────────────────────────┐
/// │                      BufferPool                       │
/// │  ┌────────────────────┐   ┌────────────────────────┐  │
/// │  │ pages              │   │ strategy               │  │
/// │  │ PageId → Page      │   │ eviction order of ids  │  │
/// │  └────────────────────┘   └────────────────────────┘  │
/// │  ┌────────────────────┐   ┌────────────────────────┐  │
/// │  │ file_manager       │   │ stats                  │  │
/// │  │ Arc<FileManager>   │   │ atomic counters        │  │
/// │  └────────────────────┘   └────────────────────────┘  │
/// └───────────────────────────────────────────────────────┘
/// ```
///
/// The map and the strategy always hold the same ids. Room is made before
/// a new id is handed to the strategy, so the strategy never has to evict
/// on its own.
///
/// # Thread Safety
/// Single-threaded: every operation takes `&mut self`. Wrap the pool in a
/// lock to share it.
///
/// # Usage
/// ```ignore
/// let mut pool = BufferPool::open(StorageConfig::new("data"), LruStrategy::new(64))?;
///
/// let page = pool.get_page(&PageId::new("jazz", 3))?;
/// page.as_data_mut().unwrap().record_data_mut()[0] = 1;
///
/// pool.flush_all_pages()?;
/// ```
pub struct BufferPool {
    pages: HashMap<PageId, Page>,
    strategy: Box<dyn ReplacementStrategy<PageId> + Send>,
    file_manager: Arc<FileManager>,
    stats: BufferPoolStats,
}

impl BufferPool {
    /// Create a buffer pool over `file_manager` evicting by `strategy`.
    ///
    /// The pool holds at most `strategy.capacity()` pages.
    ///
    /// # Errors
    /// `Error::InvalidConfig` for a zero-capacity strategy.
    pub fn new<S>(file_manager: Arc<FileManager>, strategy: S) -> Result<Self>
    where
        S: ReplacementStrategy<PageId> + Send + 'static,
    {
        if strategy.capacity() == 0 {
            return Err(Error::InvalidConfig(
                "buffer pool capacity must be > 0".to_string(),
            ));
        }
        debug!("buffer pool with capacity {}", strategy.capacity());

        Ok(Self {
            pages: HashMap::with_capacity(strategy.capacity()),
            strategy: Box::new(strategy),
            file_manager,
            stats: BufferPoolStats::new(),
        })
    }

    /// Build the file manager (and its I/O buffer pool) from `config`.
    pub fn open<S>(config: StorageConfig, strategy: S) -> Result<Self>
    where
        S: ReplacementStrategy<PageId> + Send + 'static,
    {
        let file_manager = Arc::new(FileManager::open(config)?);
        Self::new(file_manager, strategy)
    }

    // ========================================================================
    // Public API
    // ========================================================================

    /// Return the cached page, loading it from disk on a miss.
    ///
    /// # Errors
    /// Anything [`FileManager::load_page`] or eviction write-back returns.
    /// A failed load leaves the pool unchanged.
    pub fn get_page(&mut self, id: &PageId) -> Result<&mut Page> {
        if self.pages.contains_key(id) {
            self.strategy.access(id);
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
            let page = self
                .file_manager
                .load_page(id.file_name(), id.page_number())?;
            self.stats.record_read();
            self.insert(id.clone(), page)?;
        }
        self.pages
            .get_mut(id)
            .ok_or_else(|| Error::PageNotCached(id.clone()))
    }

    /// Cache `page` under `id`, returning the cached page.
    ///
    /// If `id` is already cached this only counts as an access; the page
    /// passed in is dropped and the first one stays.
    ///
    /// # Errors
    /// - `Error::PageIdMismatch` if `page` carries another page number
    /// - write-back errors from eviction
    pub fn put_page(&mut self, id: PageId, page: Page) -> Result<&mut Page> {
        if page.page_number() != id.page_number() {
            return Err(Error::PageIdMismatch {
                page_number: page.page_number(),
                id,
            });
        }
        if self.pages.contains_key(&id) {
            self.strategy.access(&id);
        } else {
            self.insert(id.clone(), page)?;
        }
        self.pages
            .get_mut(&id)
            .ok_or(Error::PageNotCached(id))
    }

    /// Write the page back if it is cached and dirty.
    pub fn flush_page(&mut self, id: &PageId) -> Result<()> {
        if let Some(page) = self.pages.get_mut(id) {
            if page.is_dirty() {
                self.file_manager.write_page(id.file_name(), page)?;
                page.mark_clean();
                self.stats.record_write();
            }
        }
        Ok(())
    }

    /// Flush every page the strategy tracks.
    pub fn flush_all_pages(&mut self) -> Result<()> {
        for id in self.strategy.keys() {
            self.flush_page(&id)?;
        }
        Ok(())
    }

    /// Flush the page if dirty, then drop it from the cache.
    ///
    /// Returns the removed page, or `None` if it was not cached. On a
    /// write-back error the page stays cached.
    pub fn remove_page(&mut self, id: &PageId) -> Result<Option<Page>> {
        self.flush_page(id)?;
        self.strategy.remove(id);
        Ok(self.pages.remove(id))
    }

    #[inline]
    pub fn contains_page(&self, id: &PageId) -> bool {
        self.pages.contains_key(id)
    }

    /// Number of cached pages.
    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.strategy.capacity()
    }

    /// Cached ids in eviction-policy order.
    pub fn cached_page_ids(&self) -> Vec<PageId> {
        self.strategy.keys()
    }

    #[inline]
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    #[inline]
    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.file_manager
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn insert(&mut self, id: PageId, page: Page) -> Result<()> {
        self.make_room()?;
        let overflow = self.strategy.put(id.clone());
        debug_assert!(overflow.is_none(), "strategy evicted on its own");
        self.pages.insert(id, page);
        Ok(())
    }

    /// Evict until the strategy has room for one more id.
    ///
    /// A dirty victim is written back first. If that write fails the victim
    /// is handed back to the strategy and stays cached.
    fn make_room(&mut self) -> Result<()> {
        while self.strategy.should_evict() {
            let victim = match self.strategy.evict() {
                Some(victim) => victim,
                None => break,
            };

            match self.pages.get(&victim) {
                None => {
                    warn!("eviction victim {} was not cached, skipping", victim);
                    continue;
                }
                Some(page) if page.is_dirty() => {
                    if let Err(e) = self.file_manager.write_page(victim.file_name(), page) {
                        warn!("write-back of {} failed: {}", victim, e);
                        self.strategy.put(victim);
                        return Err(e);
                    }
                    self.stats.record_write();
                }
                Some(_) => {}
            }

            self.pages.remove(&victim);
            self.stats.record_eviction();
            debug!("evicted {}", victim);
        }
        Ok(())
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("cached", &self.pages.len())
            .field("capacity", &self.strategy.capacity())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
