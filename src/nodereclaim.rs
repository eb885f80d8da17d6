//! Node-segment reclaimer (C4, section 4.4): walks a victim segment's
//! summary, readahead then mark-dirty, deferring to the checkpoint path
//! under pressure. Phases are encoded as an explicit enum per the design
//! note in section 9 rather than interleaved into the block-walk loop.

use crate::collab::{CheckpointOps, NodeManager};
use crate::error::Result;
use crate::sit::SitManager;
use crate::status::ReclaimStatus;
use crate::summary::SummaryBlock;
use crate::types::{GcType, Segno};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Readahead,
    Dirty,
}

/// `LONG_MAX`-equivalent timeout for the foreground flush on exit.
const SYNC_ALL_TIMEOUT: Duration = Duration::from_secs(3600);

pub fn reclaim_node_segment(
    sit: &SitManager,
    node_manager: &dyn NodeManager,
    checkpoint: &dyn CheckpointOps,
    summary: &SummaryBlock,
    segno: Segno,
    gc_type: GcType,
) -> Result<ReclaimStatus> {
    let blocks_per_seg = summary.entries.len();

    for phase in [Phase::Readahead, Phase::Dirty] {
        for off in 0..blocks_per_seg {
            if !sit.is_valid_block(segno, off) {
                continue;
            }
            let nid = summary.entries[off].nid;

            match phase {
                Phase::Readahead => node_manager.ra_node_page(nid),
                Phase::Dirty => {
                    if checkpoint.should_do_checkpoint() {
                        checkpoint.acquire_cp_mutex();
                        checkpoint.block_operations()?;
                        return Ok(ReclaimStatus::Blocked);
                    }
                    let node_page = node_manager.get_node_page(nid)?;
                    if !node_page.is_writeback() {
                        node_page.mark_dirty();
                    }
                }
            }
        }
    }

    if gc_type == GcType::Foreground {
        node_manager.sync_node_pages(0, SYNC_ALL_TIMEOUT)?;
    }

    Ok(ReclaimStatus::Done)
}
