//! Data-segment reclaimer (C5, section 4.5): validates that a data block's
//! parent dnode still points at it, then relocates it. Four phases, encoded
//! as an explicit block-walk repeated with different bodies (section 9's
//! design note), each re-checking `valid_map` and the checkpoint budget.

use crate::collab::{CheckpointOps, DataPage, InodeHandle, InodeSource, NodeManager, PageCache};
use crate::error::Result;
use crate::sit::SitManager;
use crate::status::ReclaimStatus;
use crate::summary::{DnodeInfo, SummaryBlock};
use crate::sync::{Arc, CvarMutex};
use crate::types::{GcType, Ino, Segno};

/// Node count per indirect pointer block. Used only by `start_bidx_of_node`;
/// the value is a layout constant of the out-of-scope on-disk format, kept
/// here only because the offset arithmetic needs it.
pub const NIDS_PER_BLOCK: usize = 1018;
pub const ADDRS_PER_INODE: usize = 923;
pub const ADDRS_PER_BLOCK: usize = 1018;
pub const INDIRECT_BLKS: usize = 2 * NIDS_PER_BLOCK + 4;

// A node block holds the same number of slots whether it stores nids or
// block addresses; `start_bidx_of_node` relies on this to reuse one stride.
static_assertions::const_assert_eq!(NIDS_PER_BLOCK, ADDRS_PER_BLOCK);

/// Maps a node offset within an inode's node tree to the first block index
/// that node addresses (section 4.5). `node_ofs = 0` is the inode itself and
/// is special-cased rather than left as an uninitialized sentinel (section
/// 9's open question on the `start_bidx = 1` flag value).
pub fn start_bidx_of_node(node_ofs: usize) -> u64 {
    if node_ofs == 0 {
        return 0;
    }
    let n = node_ofs as i64;
    let nids = NIDS_PER_BLOCK as i64;
    let bidx = if node_ofs <= 2 {
        n - 1
    } else if node_ofs <= INDIRECT_BLKS {
        let dec = (n - 4) / (nids + 1);
        n - 2 - dec
    } else {
        let dec = (n - INDIRECT_BLKS as i64 - 3) / (nids + 1);
        n - 5 - dec
    };
    (bidx as u64) * ADDRS_PER_BLOCK as u64 + ADDRS_PER_INODE as u64
}

/// Ordered, deduplicated set of live inode references gathered during one
/// data-segment pass (section 3). A `Vec` suffices per section 9's design
/// note: the interesting property is lifetime (drained exactly once at the
/// end of a reclamation-loop call), not data-structure choice.
#[derive(Default)]
pub struct InodeWorkList {
    items: Vec<Arc<dyn InodeHandle>>,
}

impl InodeWorkList {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `inode` unless an entry for the same `ino` is already present.
    /// Returns `true` if a new entry was added.
    pub fn add(&mut self, inode: Arc<dyn InodeHandle>) -> bool {
        if self.items.iter().any(|i| i.ino() == inode.ino()) {
            return false;
        }
        self.items.push(inode);
        true
    }

    pub fn find(&self, ino: Ino) -> Option<Arc<dyn InodeHandle>> {
        self.items.iter().find(|i| i.ino() == ino).cloned()
    }

    /// Releases every reference and leaves the list empty (section 3's
    /// "must be fully drained on exit").
    pub fn drain(&mut self) -> Vec<Arc<dyn InodeHandle>> {
        std::mem::take(&mut self.items)
    }
}

struct PendingBlock {
    dni: DnodeInfo,
    nofs: usize,
    bidx: Option<u64>,
}

#[allow(clippy::too_many_arguments)]
pub fn reclaim_data_segment(
    sit: &SitManager,
    node_manager: &dyn NodeManager,
    page_cache: &dyn PageCache,
    inode_source: &dyn InodeSource,
    checkpoint: &dyn CheckpointOps,
    data_write_lock: &CvarMutex<()>,
    worklist: &mut InodeWorkList,
    summary: &SummaryBlock,
    segno: Segno,
    gc_type: GcType,
) -> Result<ReclaimStatus> {
    let blocks_per_seg = summary.entries.len();
    let start_addr = (segno * blocks_per_seg) as u64;
    let mut pending: Vec<Option<PendingBlock>> = (0..blocks_per_seg).map(|_| None).collect();

    // Phase 0: readahead.
    for off in 0..blocks_per_seg {
        if !sit.is_valid_block(segno, off) {
            continue;
        }
        if checkpoint.should_do_checkpoint() {
            checkpoint.acquire_cp_mutex();
            checkpoint.block_operations()?;
            return Ok(ReclaimStatus::Blocked);
        }
        node_manager.ra_node_page(summary.entries[off].nid);
    }

    // Phase 1: check_dnode.
    for off in 0..blocks_per_seg {
        if !sit.is_valid_block(segno, off) {
            continue;
        }
        if checkpoint.should_do_checkpoint() {
            checkpoint.acquire_cp_mutex();
            checkpoint.block_operations()?;
            return Ok(ReclaimStatus::Blocked);
        }
        let entry = summary.entries[off];
        let node_page = match node_manager.get_node_page(entry.nid) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let dni = match node_manager.get_node_info(entry.nid) {
            Ok(d) => d,
            Err(_) => continue,
        };
        if entry.version != dni.version {
            continue;
        }
        let nofs = node_page.ofs_of_node();
        let source_blkaddr = node_page.datablock_addr(entry.ofs_in_node as usize);
        if source_blkaddr != Some(start_addr + off as u64) {
            continue;
        }
        log::trace!("check_dnode: off={off} resolved ino={} nofs={nofs}", dni.ino);
        pending[off] = Some(PendingBlock { dni, nofs, bidx: None });
    }

    // Phase 2: warm the data page cache, build the inode work-list.
    for off in 0..blocks_per_seg {
        if !sit.is_valid_block(segno, off) || pending[off].is_none() {
            continue;
        }
        if checkpoint.should_do_checkpoint() {
            checkpoint.acquire_cp_mutex();
            checkpoint.block_operations()?;
            return Ok(ReclaimStatus::Blocked);
        }
        let entry = summary.entries[off];
        let pb = pending[off].as_mut().unwrap();
        let inode = match inode_source.iget_nowait(pb.dni.ino) {
            Ok(i) => i,
            Err(_) => {
                pending[off] = None;
                continue;
            }
        };
        let bidx = start_bidx_of_node(pb.nofs) + entry.ofs_in_node as u64;
        let _ = page_cache.find_data_page(inode.ino(), bidx)?;
        worklist.add(inode);
        pb.bidx = Some(bidx);
    }

    // Phase 3: relocate.
    for off in 0..blocks_per_seg {
        let Some(pb) = pending[off].as_ref() else { continue };
        if !sit.is_valid_block(segno, off) {
            continue;
        }
        let Some(bidx) = pb.bidx else { continue };
        if checkpoint.should_do_checkpoint() {
            checkpoint.acquire_cp_mutex();
            checkpoint.block_operations()?;
            return Ok(ReclaimStatus::Blocked);
        }
        let Some(inode) = worklist.find(pb.dni.ino) else { continue };
        let page = page_cache.get_lock_data_page(inode.ino(), bidx)?;
        move_data_page(&inode, &page, gc_type, data_write_lock)?;
    }

    if gc_type == GcType::Foreground {
        page_cache.submit_data_bio()?;
    }

    Ok(ReclaimStatus::Done)
}

/// Section 4.5's relocation body.
pub fn move_data_page(
    inode: &Arc<dyn InodeHandle>,
    page: &Arc<dyn DataPage>,
    gc_type: GcType,
    data_write_lock: &CvarMutex<()>,
) -> Result<()> {
    if page.is_remapped() || page.is_writeback() {
        return Ok(());
    }
    match gc_type {
        GcType::Background => {
            page.mark_dirty();
            page.set_cold(true);
        }
        GcType::Foreground => {
            let _guard = data_write_lock.lock().unwrap();
            if page.is_dirty() && inode.is_dir() {
                inode.dec_dirty_dentry();
            }
            page.set_cold(true);
            page.write_sync()?;
            page.set_cold(false);
        }
    }
    Ok(())
}
