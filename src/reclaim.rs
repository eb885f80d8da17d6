//! Reclamation loop (C6, section 4.6): orchestrates victim selection,
//! dispatch to the node/data reclaimers, and the checkpoint retry
//! handshake. Precondition: `gc_mutex` held for the duration of the call
//! (acquired here); postcondition: lock released, inode work-list drained,
//! on every exit path including early return via `?`.

use crate::context::GcContext;
use crate::datareclaim::{reclaim_data_segment, InodeWorkList};
use crate::error::Result;
use crate::nodereclaim::reclaim_node_segment;
use crate::status::{GcCycleStatus, ReclaimStatus};
use crate::summary::SummaryBlock;
use crate::types::{AllocMode, GcType, Segno, SummaryType};

fn do_garbage_collect(
    ctx: &GcContext,
    worklist: &mut InodeWorkList,
    segno: Segno,
    gc_type: GcType,
) -> Result<ReclaimStatus> {
    let summary: SummaryBlock = ctx.summary_source.read_summary(segno)?;
    match summary.footer {
        SummaryType::Node => {
            reclaim_node_segment(&ctx.sit, ctx.node_manager.as_ref(), ctx.checkpoint.as_ref(), &summary, segno, gc_type)
        }
        SummaryType::Data => reclaim_data_segment(
            &ctx.sit,
            ctx.node_manager.as_ref(),
            ctx.page_cache.as_ref(),
            ctx.inode_source.as_ref(),
            ctx.checkpoint.as_ref(),
            &ctx.data_write_lock,
            worklist,
            &summary,
            segno,
            gc_type,
        ),
    }
}

/// The C6 body proper. Precondition: `gc_guard` proves `gc_mutex` is held;
/// postcondition: `gc_guard` has been dropped (lock released) before this
/// returns on every path, including the early return via `?`. Taking the
/// guard by value rather than re-locking internally is what lets the
/// background driver (C2) take the lock itself at its try-acquire step and
/// still have this call be the one that releases it, per section 4.2's
/// concurrency contract.
pub fn run_reclamation_loop(
    ctx: &GcContext,
    gc_guard: std::sync::MutexGuard<'_, ()>,
    n_gc: usize,
) -> Result<GcCycleStatus> {
    let result = run_reclamation_loop_inner(ctx, n_gc);
    drop(gc_guard);
    result
}

/// `f2fs_gc(sbi, nGC)`: the foreground entry point. Acquires `gc_mutex`
/// itself (the caller does not already hold it, unlike the background
/// driver's path) and delegates to the shared loop body.
pub fn f2fs_gc(ctx: &GcContext, n_gc: usize) -> Result<GcCycleStatus> {
    let guard = ctx.gc_mutex.lock().unwrap();
    run_reclamation_loop(ctx, guard, n_gc)
}

/// Reclaim until `nGC` free sections have been gained or no victim remains.
/// Loops internally on the checkpoint-retry path (section 4.6 step 4: "if
/// `nfree > 0`, restart step 1").
fn run_reclamation_loop_inner(ctx: &GcContext, n_gc: usize) -> Result<GcCycleStatus> {
    loop {
        let mut worklist = InodeWorkList::new();
        let mut nfree = 0usize;
        let mut gc_type = GcType::Background;
        let mut status: Option<GcCycleStatus> = None;

        let old_free_secs = if ctx.free_space.has_not_enough_free_secs() {
            ctx.free_space.reserved_sections()
        } else {
            ctx.free_space.free_sections()
        };

        while ctx.free_space.is_mounted() {
            if ctx.free_space.has_not_enough_free_secs() {
                gc_type = GcType::Foreground;
            }
            if ctx.free_space.free_sections() + nfree >= old_free_secs + n_gc {
                break;
            }

            let segs_per_sec = ctx.sit.segs_per_sec();
            let victim = ctx.victim_ops.get_victim(&ctx.sit, &ctx.dirty, gc_type, AllocMode::Lfs, 0, &ctx.config);
            let Some(section_start) = victim else {
                status = Some(GcCycleStatus::NoVictim);
                break;
            };

            let mut blocked = false;
            for segno in section_start..section_start + segs_per_sec {
                match do_garbage_collect(ctx, &mut worklist, segno, gc_type)? {
                    ReclaimStatus::Done => nfree += 1,
                    ReclaimStatus::Blocked => {
                        status = Some(GcCycleStatus::Blocked);
                        blocked = true;
                        break;
                    }
                }
            }
            if blocked {
                break;
            }
        }

        let blocked = matches!(status, Some(GcCycleStatus::Blocked));
        if ctx.free_space.has_not_enough_free_secs() || blocked {
            ctx.checkpoint.write_checkpoint(false, blocked)?;
            if nfree > 0 {
                worklist.drain();
                continue;
            }
        }

        worklist.drain();
        return Ok(status.unwrap_or(GcCycleStatus::Done));
    }
}
