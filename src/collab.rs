//! External interfaces the GC core consumes (section 6). None of these
//! traits define an on-disk format, implement the writeback pipeline, or
//! perform the actual block copy -- the core only arranges for it, per the
//! spec's non-goals. Concrete implementations live with whatever subsystem
//! owns the segment/SIT manager, the NAT/node manager, the page cache, and
//! the checkpoint path; `testkit` provides in-memory stand-ins for tests.

use crate::error::Result;
use crate::summary::SummaryBlock;
use crate::sync::Arc;
use crate::types::{BlockAddr, Ino, Nid, Segno};
use std::time::Duration;

/// Summary-page access, the one piece of the segment manager's interface
/// the reclamation loop calls directly (section 4.6 step 3a: "read the
/// summary page, error -> return Error").
pub trait SummarySource: Send + Sync {
    fn read_summary(&self, segno: Segno) -> Result<SummaryBlock>;
}

/// A node page retrieved through the node manager.
pub trait NodePage: Send + Sync {
    /// Position of this node within its inode's node tree (`nofs`).
    fn ofs_of_node(&self) -> usize;
    /// Physical address stored at `ofs_in_node`, or `None` if that slot was
    /// never written / has been invalidated.
    fn datablock_addr(&self, ofs_in_node: usize) -> Option<BlockAddr>;
    fn is_writeback(&self) -> bool;
    fn mark_dirty(&self);
}

/// `NM_I`: the node manager.
pub trait NodeManager: Send + Sync {
    fn get_node_page(&self, nid: Nid) -> Result<Arc<dyn NodePage>>;
    /// Best-effort readahead; failures are not fatal.
    fn ra_node_page(&self, nid: Nid);
    fn get_node_info(&self, nid: Nid) -> Result<crate::summary::DnodeInfo>;
    fn sync_node_pages(&self, start: Nid, timeout: Duration) -> Result<()>;
}

/// A data page retrieved through the page cache.
pub trait DataPage: Send + Sync {
    /// True once the logical block this page backs has been remapped to a
    /// different physical location (stale copy, should not be relocated).
    fn is_remapped(&self) -> bool;
    fn is_writeback(&self) -> bool;
    fn is_dirty(&self) -> bool;
    fn mark_dirty(&self);
    fn set_cold(&self, cold: bool);
    /// Synchronous write-out of this single page (foreground relocation).
    fn write_sync(&self) -> Result<()>;
}

/// Page cache / writeback collaborator.
pub trait PageCache: Send + Sync {
    /// Warm-cache lookup; does not lock the page.
    fn find_data_page(&self, ino: Ino, bidx: u64) -> Result<Option<Arc<dyn DataPage>>>;
    /// Acquire the data page locked, for relocation.
    fn get_lock_data_page(&self, ino: Ino, bidx: u64) -> Result<Arc<dyn DataPage>>;
    /// `f2fs_submit_bio(DATA, true)`: flush accumulated foreground data bio.
    fn submit_data_bio(&self) -> Result<()>;
}

/// A live inode handle, held for the duration of one data-segment phase.
pub trait InodeHandle: Send + Sync {
    fn ino(&self) -> Ino;
    fn is_dir(&self) -> bool;
    /// Decrement dirty-dentry counters; called when a dirty directory page
    /// is relocated in foreground mode.
    fn dec_dirty_dentry(&self);
}

/// Inode lookup, non-blocking.
pub trait InodeSource: Send + Sync {
    fn iget_nowait(&self, ino: Ino) -> Result<Arc<dyn InodeHandle>>;
}

/// Checkpoint collaborator. `acquire_cp_mutex` / `write_checkpoint` form the
/// acquire-on-block / release-on-checkpoint pairing called out in section 9:
/// a reclaimer takes the mutex before returning `Blocked`, and only
/// `write_checkpoint` releases it.
pub trait CheckpointOps: Send + Sync {
    fn should_do_checkpoint(&self) -> bool;
    fn acquire_cp_mutex(&self);
    fn block_operations(&self) -> Result<()>;
    fn write_checkpoint(&self, unmount: bool, blocked: bool) -> Result<()>;
    /// External hook the background driver calls every wake; may itself
    /// trigger a checkpoint.
    fn balance_fs(&self);
}

/// Free-space queries used by the reclamation loop and background driver.
pub trait FreeSpaceOps: Send + Sync {
    fn free_sections(&self) -> usize;
    fn free_segments(&self) -> usize;
    fn reserved_sections(&self) -> usize;
    fn has_not_enough_free_secs(&self) -> bool;
    fn is_idle(&self) -> bool;
    fn has_enough_invalid_blocks(&self) -> bool;
    /// Whether the filesystem is still mounted read-write (C6's loop
    /// condition).
    fn is_mounted(&self) -> bool;
}

/// The I/O-scheduler hook the background driver cooperates with: freeze
/// signal and interruptible wait/stop.
pub trait IoSchedulerHook: Send + Sync {
    /// Returns true if the host is frozen and the driver should yield and
    /// re-enter without doing any work this iteration.
    fn try_to_freeze(&self) -> bool;
    /// Wait up to `wait_ms`, returning early if a stop was requested.
    /// Returns `true` if woken by a stop request.
    fn wait_timeout(&self, wait_ms: u64) -> bool;
    fn should_stop(&self) -> bool;
}
