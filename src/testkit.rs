//! In-memory stand-ins for the external collaborators of section 6,
//! grounded on the teacher's habit of building concrete test fixtures
//! directly (`Segment`/`AllocTable`/`SharedState` in `gc.rs`/`segment.rs`)
//! rather than mocking through a framework. Used only by `#[cfg(test)]`
//! modules across the crate.

#![cfg(test)]

use crate::collab::{
    CheckpointOps, DataPage, FreeSpaceOps, InodeHandle, InodeSource, IoSchedulerHook, NodeManager,
    NodePage, PageCache, SummarySource,
};
use crate::error::{Errno, Result};
use crate::summary::{DnodeInfo, SummaryBlock};
use crate::sync::{Arc, HashMap, Mutex};
use crate::types::{BlockAddr, Ino, Nid, Segno};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;

static INIT_LOG: Once = Once::new();

/// Call at the top of a test that wants its `log::debug!`/`trace!` output
/// visible under `cargo test -- --nocapture`.
pub fn init_logger() {
    INIT_LOG.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init()
            .unwrap();
    });
}

pub struct FakeNodePage {
    ofs_of_node: AtomicUsize,
    datablocks: Mutex<HashMap<usize, BlockAddr>>,
    writeback: AtomicBool,
    dirty: AtomicBool,
}

impl FakeNodePage {
    pub fn new(ofs_of_node: usize) -> Arc<Self> {
        Arc::new(Self {
            ofs_of_node: AtomicUsize::new(ofs_of_node),
            datablocks: Mutex::new(HashMap::new()),
            writeback: AtomicBool::new(false),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn set_datablock(&self, ofs_in_node: usize, addr: BlockAddr) {
        self.datablocks.lock().insert(ofs_in_node, addr);
    }

    pub fn set_writeback(&self, writeback: bool) {
        self.writeback.store(writeback, Ordering::SeqCst);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }
}

impl NodePage for FakeNodePage {
    fn ofs_of_node(&self) -> usize {
        self.ofs_of_node.load(Ordering::SeqCst)
    }

    fn datablock_addr(&self, ofs_in_node: usize) -> Option<BlockAddr> {
        self.datablocks.lock().get(&ofs_in_node).copied()
    }

    fn is_writeback(&self) -> bool {
        self.writeback.load(Ordering::SeqCst)
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }
}

pub struct FakeNodeManager {
    pages: Mutex<HashMap<Nid, Arc<FakeNodePage>>>,
    infos: Mutex<HashMap<Nid, DnodeInfo>>,
    get_node_page_calls: AtomicUsize,
    ra_calls: AtomicUsize,
    sync_calls: AtomicUsize,
}

impl FakeNodeManager {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            infos: Mutex::new(HashMap::new()),
            get_node_page_calls: AtomicUsize::new(0),
            ra_calls: AtomicUsize::new(0),
            sync_calls: AtomicUsize::new(0),
        }
    }

    fn page_for(&self, nid: Nid) -> Arc<FakeNodePage> {
        self.pages
            .lock()
            .entry(nid)
            .or_insert_with(|| FakeNodePage::new(0))
            .clone()
    }

    pub fn set_node_info(&self, nid: Nid, info: DnodeInfo) {
        self.infos.lock().insert(nid, info);
    }

    pub fn set_writeback(&self, nid: Nid, writeback: bool) {
        self.page_for(nid).set_writeback(writeback);
    }

    pub fn set_datablock(&self, nid: Nid, ofs_in_node: usize, addr: BlockAddr) {
        self.page_for(nid).set_datablock(ofs_in_node, addr);
    }

    pub fn is_dirty(&self, nid: Nid) -> bool {
        self.page_for(nid).is_dirty()
    }

    pub fn get_node_page_calls(&self) -> usize {
        self.get_node_page_calls.load(Ordering::SeqCst)
    }

    pub fn ra_calls(&self) -> usize {
        self.ra_calls.load(Ordering::SeqCst)
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }
}

impl NodeManager for FakeNodeManager {
    fn get_node_page(&self, nid: Nid) -> Result<Arc<dyn NodePage>> {
        self.get_node_page_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.page_for(nid) as Arc<dyn NodePage>)
    }

    fn ra_node_page(&self, _nid: Nid) {
        self.ra_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn get_node_info(&self, nid: Nid) -> Result<DnodeInfo> {
        match self.infos.lock().get(&nid).copied() {
            Some(info) => Ok(info),
            None => crate::return_errno_with_msg!(Errno::NotFound, "no such nid"),
        }
    }

    fn sync_node_pages(&self, _start: Nid, _timeout: Duration) -> Result<()> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeCheckpoint {
    should_checkpoint: AtomicBool,
    /// When set, `should_do_checkpoint` only starts returning true once it
    /// has been called this many times, so tests can target pressure
    /// appearing partway through a multi-phase reclaimer pass.
    trigger_after_calls: AtomicUsize,
    calls: AtomicUsize,
    cp_mutex_held: AtomicBool,
    checkpoint_calls: AtomicUsize,
}

impl FakeCheckpoint {
    pub fn new() -> Self {
        Self {
            should_checkpoint: AtomicBool::new(false),
            trigger_after_calls: AtomicUsize::new(usize::MAX),
            calls: AtomicUsize::new(0),
            cp_mutex_held: AtomicBool::new(false),
            checkpoint_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_should_checkpoint(&self, value: bool) {
        self.should_checkpoint.store(value, Ordering::SeqCst);
    }

    pub fn set_should_checkpoint_after(&self, calls: usize) {
        self.trigger_after_calls.store(calls, Ordering::SeqCst);
    }

    pub fn cp_mutex_held(&self) -> bool {
        self.cp_mutex_held.load(Ordering::SeqCst)
    }

    pub fn checkpoint_calls(&self) -> usize {
        self.checkpoint_calls.load(Ordering::SeqCst)
    }
}

impl CheckpointOps for FakeCheckpoint {
    fn should_do_checkpoint(&self) -> bool {
        let seen = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.should_checkpoint.load(Ordering::SeqCst) || seen > self.trigger_after_calls.load(Ordering::SeqCst)
    }

    fn acquire_cp_mutex(&self) {
        self.cp_mutex_held.store(true, Ordering::SeqCst);
    }

    fn block_operations(&self) -> Result<()> {
        Ok(())
    }

    fn write_checkpoint(&self, _unmount: bool, _blocked: bool) -> Result<()> {
        self.checkpoint_calls.fetch_add(1, Ordering::SeqCst);
        self.cp_mutex_held.store(false, Ordering::SeqCst);
        self.should_checkpoint.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn balance_fs(&self) {}
}

pub struct FakeDataPage {
    remapped: AtomicBool,
    writeback: AtomicBool,
    dirty: AtomicBool,
    cold: AtomicBool,
    write_sync_calls: AtomicUsize,
}

impl FakeDataPage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            remapped: AtomicBool::new(false),
            writeback: AtomicBool::new(false),
            dirty: AtomicBool::new(false),
            cold: AtomicBool::new(false),
            write_sync_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_remapped(&self, value: bool) {
        self.remapped.store(value, Ordering::SeqCst);
    }

    pub fn set_writeback_flag(&self, value: bool) {
        self.writeback.store(value, Ordering::SeqCst);
    }

    pub fn set_dirty_flag(&self, value: bool) {
        self.dirty.store(value, Ordering::SeqCst);
    }

    pub fn is_cold(&self) -> bool {
        self.cold.load(Ordering::SeqCst)
    }

    pub fn write_sync_calls(&self) -> usize {
        self.write_sync_calls.load(Ordering::SeqCst)
    }
}

impl DataPage for FakeDataPage {
    fn is_remapped(&self) -> bool {
        self.remapped.load(Ordering::SeqCst)
    }

    fn is_writeback(&self) -> bool {
        self.writeback.load(Ordering::SeqCst)
    }

    fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn set_cold(&self, cold: bool) {
        self.cold.store(cold, Ordering::SeqCst);
    }

    fn write_sync(&self) -> Result<()> {
        self.write_sync_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakePageCache {
    pages: Mutex<HashMap<(Ino, u64), Arc<FakeDataPage>>>,
    submit_calls: AtomicUsize,
}

impl FakePageCache {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            submit_calls: AtomicUsize::new(0),
        }
    }

    pub fn page_for(&self, ino: Ino, bidx: u64) -> Arc<FakeDataPage> {
        self.pages
            .lock()
            .entry((ino, bidx))
            .or_insert_with(FakeDataPage::new)
            .clone()
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }
}

impl PageCache for FakePageCache {
    fn find_data_page(&self, ino: Ino, bidx: u64) -> Result<Option<Arc<dyn DataPage>>> {
        Ok(Some(self.page_for(ino, bidx) as Arc<dyn DataPage>))
    }

    fn get_lock_data_page(&self, ino: Ino, bidx: u64) -> Result<Arc<dyn DataPage>> {
        Ok(self.page_for(ino, bidx) as Arc<dyn DataPage>)
    }

    fn submit_data_bio(&self) -> Result<()> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeInodeHandle {
    ino: Ino,
    is_dir: AtomicBool,
    dec_dirty_dentry_calls: AtomicUsize,
}

impl FakeInodeHandle {
    pub fn new(ino: Ino) -> Arc<Self> {
        Arc::new(Self {
            ino,
            is_dir: AtomicBool::new(false),
            dec_dirty_dentry_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_is_dir(&self, value: bool) {
        self.is_dir.store(value, Ordering::SeqCst);
    }

    pub fn dec_dirty_dentry_calls(&self) -> usize {
        self.dec_dirty_dentry_calls.load(Ordering::SeqCst)
    }
}

impl InodeHandle for FakeInodeHandle {
    fn ino(&self) -> Ino {
        self.ino
    }

    fn is_dir(&self) -> bool {
        self.is_dir.load(Ordering::SeqCst)
    }

    fn dec_dirty_dentry(&self) {
        self.dec_dirty_dentry_calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeInodeSource {
    handles: Mutex<HashMap<Ino, Arc<FakeInodeHandle>>>,
    live_refs: AtomicUsize,
}

impl FakeInodeSource {
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            live_refs: AtomicUsize::new(0),
        }
    }

    pub fn handle_for(&self, ino: Ino) -> Arc<FakeInodeHandle> {
        self.handles
            .lock()
            .entry(ino)
            .or_insert_with(|| FakeInodeHandle::new(ino))
            .clone()
    }

    /// Net outstanding `iget_nowait` references, for the inode-list-drain
    /// property (testable property #3).
    pub fn live_refs(&self) -> usize {
        self.live_refs.load(Ordering::SeqCst)
    }
}

impl InodeSource for FakeInodeSource {
    fn iget_nowait(&self, ino: Ino) -> Result<Arc<dyn InodeHandle>> {
        self.live_refs.fetch_add(1, Ordering::SeqCst);
        Ok(self.handle_for(ino) as Arc<dyn InodeHandle>)
    }
}

pub struct FakeFreeSpace {
    free_sections: AtomicUsize,
    free_segments: AtomicUsize,
    reserved_sections: AtomicUsize,
    not_enough: AtomicBool,
    idle: AtomicBool,
    enough_invalid: AtomicBool,
    mounted: AtomicBool,
}

impl FakeFreeSpace {
    pub fn new() -> Self {
        Self {
            free_sections: AtomicUsize::new(0),
            free_segments: AtomicUsize::new(0),
            reserved_sections: AtomicUsize::new(0),
            not_enough: AtomicBool::new(false),
            idle: AtomicBool::new(true),
            enough_invalid: AtomicBool::new(true),
            mounted: AtomicBool::new(true),
        }
    }

    pub fn set_free_sections(&self, value: usize) {
        self.free_sections.store(value, Ordering::SeqCst);
    }

    pub fn add_free_sections(&self, delta: usize) {
        self.free_sections.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set_reserved_sections(&self, value: usize) {
        self.reserved_sections.store(value, Ordering::SeqCst);
    }

    pub fn set_not_enough(&self, value: bool) {
        self.not_enough.store(value, Ordering::SeqCst);
    }

    pub fn set_mounted(&self, value: bool) {
        self.mounted.store(value, Ordering::SeqCst);
    }

    pub fn set_idle(&self, value: bool) {
        self.idle.store(value, Ordering::SeqCst);
    }

    pub fn set_enough_invalid(&self, value: bool) {
        self.enough_invalid.store(value, Ordering::SeqCst);
    }
}

impl FreeSpaceOps for FakeFreeSpace {
    fn free_sections(&self) -> usize {
        self.free_sections.load(Ordering::SeqCst)
    }

    fn free_segments(&self) -> usize {
        self.free_segments.load(Ordering::SeqCst)
    }

    fn reserved_sections(&self) -> usize {
        self.reserved_sections.load(Ordering::SeqCst)
    }

    fn has_not_enough_free_secs(&self) -> bool {
        self.not_enough.load(Ordering::SeqCst)
    }

    fn is_idle(&self) -> bool {
        self.idle.load(Ordering::SeqCst)
    }

    fn has_enough_invalid_blocks(&self) -> bool {
        self.enough_invalid.load(Ordering::SeqCst)
    }

    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}

pub struct FakeSummarySource {
    summaries: Mutex<HashMap<Segno, SummaryBlock>>,
    read_calls: AtomicUsize,
}

impl FakeSummarySource {
    pub fn new() -> Self {
        Self {
            summaries: Mutex::new(HashMap::new()),
            read_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_summary(&self, segno: Segno, summary: SummaryBlock) {
        self.summaries.lock().insert(segno, summary);
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }
}

impl SummarySource for FakeSummarySource {
    fn read_summary(&self, segno: Segno) -> Result<SummaryBlock> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        match self.summaries.lock().get(&segno).cloned() {
            Some(summary) => Ok(summary),
            None => crate::return_errno_with_msg!(Errno::IoError, "no summary for segment"),
        }
    }
}

pub struct FakeIoHook {
    freeze: AtomicBool,
    stop: AtomicBool,
    wait_calls: AtomicUsize,
}

impl FakeIoHook {
    pub fn new() -> Self {
        Self {
            freeze: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            wait_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_stop(&self, value: bool) {
        self.stop.store(value, Ordering::SeqCst);
    }

    pub fn set_freeze(&self, value: bool) {
        self.freeze.store(value, Ordering::SeqCst);
    }

    pub fn wait_calls(&self) -> usize {
        self.wait_calls.load(Ordering::SeqCst)
    }
}

impl IoSchedulerHook for FakeIoHook {
    fn try_to_freeze(&self) -> bool {
        self.freeze.load(Ordering::SeqCst)
    }

    fn wait_timeout(&self, _wait_ms: u64) -> bool {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        // Real implementations block on a condvar for up to `wait_ms`; this
        // fake sleeps a token amount so a background-thread lifecycle test
        // doesn't spin a tight loop between start and stop.
        std::thread::sleep(std::time::Duration::from_millis(1));
        self.stop.load(Ordering::SeqCst)
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}
