//! The status values threaded between the reclaimers and the reclamation
//! loop (section 7). `Error` is not a variant here -- it is the `Err` arm of
//! the `Result` every reclaimer call returns, so the `?` operator carries it
//! up naturally instead of requiring callers to match a third status.

/// Outcome of one `do_garbage_collect` call (C4 or C5) on a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimStatus {
    /// Every valid block in the segment was scheduled for relocation or had
    /// already been invalidated by the time it was checked.
    Done,
    /// The dirty-node-page budget was exhausted; `cp_mutex` has already been
    /// taken and `block_operations` invoked. The reclamation loop must
    /// checkpoint before retrying.
    Blocked,
}

/// Outcome of one reclamation-loop cycle (C6), the public `f2fs_gc` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcCycleStatus {
    Done,
    Blocked,
    /// No victim remained; distinct from `Done` so the background driver can
    /// select the `NOGC_SLEEP` interval.
    NoVictim,
}
