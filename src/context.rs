//! Bundles the GC core's state and its external collaborators (section 6)
//! into one handle, the way the teacher's `GcWorker<D>` bundles the tables,
//! stores and shared state it needs (`gc.rs`). Threaded through every
//! component from C3 down to C6 instead of passing eight parameters around.

use crate::collab::{CheckpointOps, FreeSpaceOps, InodeSource, IoSchedulerHook, NodeManager, PageCache, SummarySource};
use crate::config::GcConfig;
use crate::dirty::DirtyManager;
use crate::sit::SitManager;
use crate::sync::{Arc, CvarMutex};
use crate::victim::VictimOps;

pub struct GcContext {
    pub sit: Arc<SitManager>,
    pub dirty: Arc<DirtyManager>,
    pub node_manager: Arc<dyn NodeManager>,
    pub page_cache: Arc<dyn PageCache>,
    pub inode_source: Arc<dyn InodeSource>,
    pub checkpoint: Arc<dyn CheckpointOps>,
    pub free_space: Arc<dyn FreeSpaceOps>,
    pub io_hook: Arc<dyn IoSchedulerHook>,
    pub victim_ops: Arc<dyn VictimOps>,
    pub summary_source: Arc<dyn SummarySource>,
    pub config: GcConfig,
    /// `mutex_lock_op(DATA_WRITE)`: per-data-type write mutex, lock order #5.
    pub data_write_lock: Arc<CvarMutex<()>>,
    /// `gc_mutex`: serializes all GC activity, lock order #1.
    pub gc_mutex: Arc<CvarMutex<()>>,
}

impl GcContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sit: Arc<SitManager>,
        dirty: Arc<DirtyManager>,
        node_manager: Arc<dyn NodeManager>,
        page_cache: Arc<dyn PageCache>,
        inode_source: Arc<dyn InodeSource>,
        checkpoint: Arc<dyn CheckpointOps>,
        free_space: Arc<dyn FreeSpaceOps>,
        io_hook: Arc<dyn IoSchedulerHook>,
        victim_ops: Arc<dyn VictimOps>,
        summary_source: Arc<dyn SummarySource>,
        config: GcConfig,
    ) -> Self {
        Self {
            sit,
            dirty,
            node_manager,
            page_cache,
            inode_source,
            checkpoint,
            free_space,
            io_hook,
            victim_ops,
            summary_source,
            config,
            data_write_lock: Arc::new(CvarMutex::new(())),
            gc_mutex: Arc::new(CvarMutex::new(())),
        }
    }
}
