//! Segment information table: the out-of-scope "segment/SIT manager"
//! collaborator (`SIT_I` in section 6), reduced to the shape the GC core
//! actually calls through. Modeled on the teacher's `Segment` in
//! `segment.rs`, extended with a per-block `valid_map` and the `mtime`
//! bookkeeping the cost-benefit policy needs.

use crate::bitset::BitSet;
use crate::sync::Mutex;
use crate::types::{BlockOff, Mtime, Segno};

/// Per-segment metadata owned by the segment manager, read by GC.
#[derive(Debug, Clone)]
pub struct SegEntry {
    pub valid_map: BitSet,
    pub cur_valid_count: usize,
    pub ckpt_valid_count: usize,
    pub mtime: Mtime,
}

impl SegEntry {
    pub fn new(blocks_per_seg: usize, mtime: Mtime) -> Self {
        Self {
            valid_map: BitSet::repeat(false, blocks_per_seg),
            cur_valid_count: 0,
            ckpt_valid_count: 0,
            mtime,
        }
    }

    pub fn mark_valid(&mut self, off: BlockOff) {
        if !self.valid_map.test_bit(off) {
            self.valid_map.set(off, true);
            self.cur_valid_count += 1;
        }
    }

    pub fn mark_invalid(&mut self, off: BlockOff) {
        if self.valid_map.test_bit(off) {
            self.valid_map.set(off, false);
            self.cur_valid_count -= 1;
        }
    }
}

struct SitInner {
    entries: Vec<SegEntry>,
    min_mtime: Mtime,
    max_mtime: Mtime,
    mtime_initialized: bool,
}

/// Segment information table. `sentry_lock` (section 5, lock order #3)
/// guards both the per-segment entries and the mtime range used by the
/// cost-benefit policy, matching the spec's pairing of the two under one
/// lock.
pub struct SitManager {
    log_blocks_per_seg: u32,
    segs_per_sec: usize,
    inner: Mutex<SitInner>,
}

impl SitManager {
    pub fn new(total_segs: usize, log_blocks_per_seg: u32, segs_per_sec: usize) -> Self {
        let entries = (0..total_segs)
            .map(|_| SegEntry::new(1 << log_blocks_per_seg, 0))
            .collect();
        Self {
            log_blocks_per_seg,
            segs_per_sec,
            inner: Mutex::new(SitInner {
                entries,
                min_mtime: 0,
                max_mtime: 0,
                mtime_initialized: false,
            }),
        }
    }

    pub fn blocks_per_seg(&self) -> usize {
        1 << self.log_blocks_per_seg
    }

    pub fn segs_per_sec(&self) -> usize {
        self.segs_per_sec
    }

    pub fn total_segs(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Sum of valid blocks over the `2^log_unit` segments of the unit
    /// beginning at `segno` (section's greedy cost for LFS, or a single
    /// segment's count when `log_unit == 0`).
    pub fn get_valid_blocks(&self, segno: Segno, log_unit: u32) -> usize {
        let inner = self.inner.lock();
        let unit = 1usize << log_unit;
        let base = (segno / unit) * unit;
        (base..(base + unit).min(inner.entries.len()))
            .map(|s| inner.entries[s].cur_valid_count)
            .sum()
    }

    pub fn ckpt_valid_blocks(&self, segno: Segno) -> usize {
        self.inner.lock().entries[segno].ckpt_valid_count
    }

    pub fn mtime(&self, segno: Segno) -> Mtime {
        self.inner.lock().entries[segno].mtime
    }

    /// Average mtime over the section beginning at `segno`.
    pub fn avg_mtime(&self, segno: Segno, log_unit: u32) -> Mtime {
        let inner = self.inner.lock();
        let unit = 1usize << log_unit;
        let base = (segno / unit) * unit;
        let range = base..(base + unit).min(inner.entries.len());
        let n = range.len().max(1) as Mtime;
        let sum: Mtime = range.map(|s| inner.entries[s].mtime).sum();
        sum / n
    }

    pub fn min_max_mtime(&self) -> (Mtime, Mtime) {
        let inner = self.inner.lock();
        (inner.min_mtime, inner.max_mtime)
    }

    /// Widen (never narrow) the observed mtime range. See the spec's open
    /// question on mtime range reset: if the system clock moves backward
    /// permanently, `age` stays biased. Source behavior preserved here.
    pub fn observe_mtime(&self, mtime: Mtime) {
        let mut inner = self.inner.lock();
        if !inner.mtime_initialized {
            inner.min_mtime = mtime;
            inner.max_mtime = mtime;
            inner.mtime_initialized = true;
            return;
        }
        if mtime < inner.min_mtime {
            inner.min_mtime = mtime;
        }
        if mtime > inner.max_mtime {
            inner.max_mtime = mtime;
        }
    }

    pub fn set_mtime(&self, segno: Segno, mtime: Mtime) {
        self.inner.lock().entries[segno].mtime = mtime;
        self.observe_mtime(mtime);
    }

    pub fn is_valid_block(&self, segno: Segno, off: BlockOff) -> bool {
        self.inner.lock().entries[segno].valid_map.test_bit(off)
    }

    pub fn mark_valid(&self, segno: Segno, off: BlockOff) {
        self.inner.lock().entries[segno].mark_valid(off);
    }

    pub fn mark_invalid(&self, segno: Segno, off: BlockOff) {
        self.inner.lock().entries[segno].mark_invalid(off);
    }

    pub fn sync_ckpt_valid_count(&self, segno: Segno) {
        let mut inner = self.inner.lock();
        let cur = inner.entries[segno].cur_valid_count;
        inner.entries[segno].ckpt_valid_count = cur;
    }

    pub fn clear_segment(&self, segno: Segno) {
        let mut inner = self.inner.lock();
        let blocks_per_seg = 1usize << self.log_blocks_per_seg;
        let entry = &mut inner.entries[segno];
        entry.valid_map = BitSet::repeat(false, blocks_per_seg);
        entry.cur_valid_count = 0;
        entry.ckpt_valid_count = 0;
    }
}
