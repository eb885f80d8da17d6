//! Statistics read path (section 6's exported stat surface): section
//! utilization, dirty/free counts, per-temperature current segments, the
//! bimodal distribution factor `BDF`, and GC call counters. Grounded on the
//! teacher's `waf_stats.rs`/`cost_stats.rs` pattern -- an atomic counter
//! struct built once and read with a `report` method -- not on the core
//! algorithm itself; this module only renders state other modules already
//! own into operator-facing text.

use crate::context::GcContext;
use crate::status::GcCycleStatus;
use crate::types::{GcType, Temperature};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide GC call counters. Cheap to share: every field is a single
/// atomic, bumped from the reclamation loop and the background driver
/// without taking any of the GC core's own locks.
#[derive(Default)]
pub struct GcStats {
    pub foreground_calls: AtomicU64,
    pub background_calls: AtomicU64,
    pub segments_reclaimed: AtomicU64,
    pub checkpoints_forced: AtomicU64,
    pub blocked_cycles: AtomicU64,
    pub no_victim_cycles: AtomicU64,
}

impl GcStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self, gc_type: GcType, status: GcCycleStatus, segments_reclaimed: u64) {
        match gc_type {
            GcType::Foreground => self.foreground_calls.fetch_add(1, Ordering::Relaxed),
            GcType::Background => self.background_calls.fetch_add(1, Ordering::Relaxed),
        };
        self.segments_reclaimed.fetch_add(segments_reclaimed, Ordering::Relaxed);
        match status {
            GcCycleStatus::Blocked => self.blocked_cycles.fetch_add(1, Ordering::Relaxed),
            GcCycleStatus::NoVictim => self.no_victim_cycles.fetch_add(1, Ordering::Relaxed),
            GcCycleStatus::Done => 0,
        };
    }

    pub fn record_checkpoint(&self) {
        self.checkpoints_forced.fetch_add(1, Ordering::Relaxed);
    }

    /// `f2fs_stat_show`-style human-readable dump.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "gc calls: foreground={} background={}",
            self.foreground_calls.load(Ordering::Relaxed),
            self.background_calls.load(Ordering::Relaxed));
        let _ = writeln!(out, "segments reclaimed: {}", self.segments_reclaimed.load(Ordering::Relaxed));
        let _ = writeln!(out, "checkpoints forced: {}", self.checkpoints_forced.load(Ordering::Relaxed));
        let _ = writeln!(out, "blocked cycles: {}", self.blocked_cycles.load(Ordering::Relaxed));
        let _ = write!(out, "no-victim cycles: {}", self.no_victim_cycles.load(Ordering::Relaxed));
        out
    }
}

/// Number of dirty segments currently set in `dirty_segmap[dirty_type]`.
fn count_dirty(ctx: &GcContext, dirty_type: usize) -> usize {
    let mut count = 0;
    let mut from = 0;
    while let Some(segno) = ctx.dirty.next_dirty_from(dirty_type, from) {
        count += 1;
        from = segno + 1;
        if from >= ctx.dirty.total_segs() {
            break;
        }
    }
    count
}

/// `BDF`: `Σ (vblocks - blks_per_sec/2)²` over all sections, normalized by
/// the section count -- measures how bimodal utilization is across
/// sections (uniformly half-full sections score 0; a mix of empty and full
/// sections scores high).
pub fn bdf(ctx: &GcContext) -> f64 {
    let segs_per_sec = ctx.sit.segs_per_sec();
    let total_segs = ctx.sit.total_segs();
    let total_sections = total_segs / segs_per_sec;
    if total_sections == 0 {
        return 0.0;
    }
    let log_ofs_unit = segs_per_sec.trailing_zeros();
    let blks_per_sec = (ctx.sit.blocks_per_seg() * segs_per_sec) as f64;

    let sum: f64 = (0..total_sections)
        .map(|sec| {
            let segno = sec * segs_per_sec;
            let vblocks = ctx.sit.get_valid_blocks(segno, log_ofs_unit) as f64;
            (vblocks - blks_per_sec / 2.0).powi(2)
        })
        .sum();
    sum / total_sections as f64
}

/// Section utilization and free/dirty counts, the non-algorithmic half of
/// the operator-facing stat surface named in section 6.
pub struct UtilizationReport {
    pub total_sections: usize,
    pub free_sections: usize,
    pub dirty_sections: usize,
    pub bdf: f64,
}

pub fn utilization_report(ctx: &GcContext) -> UtilizationReport {
    let segs_per_sec = ctx.sit.segs_per_sec().max(1);
    UtilizationReport {
        total_sections: ctx.sit.total_segs() / segs_per_sec,
        free_sections: ctx.free_space.free_sections(),
        dirty_sections: count_dirty(ctx, 0),
        bdf: bdf(ctx),
    }
}

impl UtilizationReport {
    pub fn report(&self) -> String {
        format!(
            "sections: total={} free={} dirty={} bdf={:.2}",
            self.total_sections, self.free_sections, self.dirty_sections, self.bdf
        )
    }
}

/// Current-segment temperature labels, for the per-temperature line of the
/// stat surface. The GC core does not own current-segment assignment (the
/// segment manager does); this just names the buckets the dirty-type index
/// space reserves for them (section 3's "per-temperature sub-dirty
/// categories").
pub fn temperature_label(dirty_type: usize) -> Option<Temperature> {
    match dirty_type {
        1 => Some(Temperature::Hot),
        2 => Some(Temperature::Warm),
        3 => Some(Temperature::Cold),
        _ => None,
    }
}
