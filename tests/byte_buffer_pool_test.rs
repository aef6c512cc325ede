//! Concurrency tests for the I/O buffer pool and the file manager on top of it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use extentdb::common::config::StorageConfig;
use extentdb::{ByteBufferPool, DataPage, Error, FileManager, Page, PAGE_SIZE};
use tempfile::tempdir;

/// Many threads share a two-buffer pool; no more than two buffers are ever
/// out at once and every thread eventually gets one.
#[test]
fn test_pool_bounds_concurrent_borrowers() {
    let pool = Arc::new(ByteBufferPool::new(2 * 64, 64).unwrap());
    let out = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let out = Arc::clone(&out);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for _ in 0..20 {
                    let buffer = pool.acquire(Duration::from_secs(5)).unwrap();
                    let now = out.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    assert!(buffer.iter().all(|&b| b == 0));
                    thread::yield_now();
                    out.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(pool.free_count(), 2);
    assert_eq!(pool.waiter_count(), 0);
}

/// Closing the pool releases a blocked borrower with `PoolClosed`.
#[test]
fn test_close_releases_waiter() {
    let pool = Arc::new(ByteBufferPool::new(64, 64).unwrap());
    let held = pool.allocate(Duration::ZERO).unwrap();

    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.allocate(Duration::from_secs(30)))
    };
    while pool.waiter_count() == 0 {
        thread::yield_now();
    }
    pool.close();

    assert!(matches!(waiter.join().unwrap(), Err(Error::PoolClosed)));
    assert!(matches!(pool.allocate(Duration::ZERO), Err(Error::PoolClosed)));
    pool.deallocate(held).unwrap();
}

/// Concurrent page writes and reads through one file manager whose I/O
/// pool holds a single buffer.
#[test]
fn test_file_manager_serialises_on_one_buffer() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let config = StorageConfig::new(dir.path())
        .with_io_memory(PAGE_SIZE)
        .with_max_block(Duration::from_secs(10))
        .with_sync_on_write(false);
    let file_manager = Arc::new(FileManager::open(config).unwrap());

    let handles: Vec<_> = (1u32..=6)
        .map(|page_number| {
            let file_manager = Arc::clone(&file_manager);
            thread::spawn(move || {
                let mut data = DataPage::new(page_number);
                data.record_data_mut()[0] = page_number as u8;
                file_manager.write_page("jazz", &Page::from(data)).unwrap();

                let page = file_manager.load_page("jazz", page_number).unwrap();
                assert_eq!(page.as_data().unwrap().record_data()[0], page_number as u8);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(file_manager.page_count("jazz").unwrap(), 7);
    assert_eq!(file_manager.buffer_pool().free_count(), 1);
}

/// A file manager whose buffer is held elsewhere times out instead of
/// blocking forever.
#[test]
fn test_file_manager_times_out_without_buffers() {
    let dir = tempdir().unwrap();
    let config = StorageConfig::new(dir.path())
        .with_io_memory(PAGE_SIZE)
        .with_max_block(Duration::from_millis(20));
    let file_manager = FileManager::open(config).unwrap();

    let held = file_manager.buffer_pool().allocate(Duration::ZERO).unwrap();
    let result = file_manager.write_page("jazz", &Page::from(DataPage::new(1)));
    assert!(matches!(result, Err(Error::AllocationTimeout { .. })));

    file_manager.buffer_pool().deallocate(held).unwrap();
    file_manager
        .write_page("jazz", &Page::from(DataPage::new(1)))
        .unwrap();
}
