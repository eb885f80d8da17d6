//! Dirty segment manager: the out-of-scope `DIRTY_I` collaborator of
//! section 6, holding the dirty seglists, the two victim bitmaps, the
//! per-policy scan cursor, and the current-section set. Everything here is
//! protected by a single lock (`seglist_lock`, lock order #4 in section 5),
//! since every operation the selector performs touches more than one of
//! these fields atomically with respect to a concurrent selector call.

use crate::bitset::BitSet;
use crate::sync::Mutex;
use crate::types::{GcPolicyMode, GcType, Segno};

struct DirtyInner {
    /// `dirty_segmap[type]`; index 0 is the plain-dirty list used by LFS,
    /// indices `1..NR_DIRTY_TYPE` are per-temperature SSR sub-lists.
    dirty_segmap: Vec<BitSet>,
    /// `victim_segmap[gc_type]`.
    victim_segmap: [BitSet; 2],
    /// Segments belonging to an actively-writing section (current
    /// segments); never a valid victim.
    current_segmap: BitSet,
    /// `last_victim[gc_mode]`, `gc_mode ∈ {Greedy, CostBenefit}`.
    last_victim: [Segno; 2],
}

pub struct DirtyManager {
    total_segs: usize,
    inner: Mutex<DirtyInner>,
}

fn gc_type_idx(t: GcType) -> usize {
    match t {
        GcType::Background => 0,
        GcType::Foreground => 1,
    }
}

fn mode_idx(m: GcPolicyMode) -> usize {
    match m {
        GcPolicyMode::Greedy => 0,
        GcPolicyMode::CostBenefit => 1,
    }
}

impl DirtyManager {
    pub fn new(total_segs: usize, nr_dirty_type: usize) -> Self {
        Self {
            total_segs,
            inner: Mutex::new(DirtyInner {
                dirty_segmap: (0..nr_dirty_type)
                    .map(|_| BitSet::repeat(false, total_segs))
                    .collect(),
                victim_segmap: [
                    BitSet::repeat(false, total_segs),
                    BitSet::repeat(false, total_segs),
                ],
                current_segmap: BitSet::repeat(false, total_segs),
                last_victim: [0, 0],
            }),
        }
    }

    pub fn total_segs(&self) -> usize {
        self.total_segs
    }

    pub fn set_dirty(&self, dirty_type: usize, segno: Segno, dirty: bool) {
        self.inner.lock().dirty_segmap[dirty_type].set(segno, dirty);
    }

    pub fn is_dirty(&self, dirty_type: usize, segno: Segno) -> bool {
        self.inner.lock().dirty_segmap[dirty_type].test_bit(segno)
    }

    /// Next set bit in `dirty_segmap[dirty_type]` at or after `from`.
    pub fn next_dirty_from(&self, dirty_type: usize, from: Segno) -> Option<Segno> {
        self.inner.lock().dirty_segmap[dirty_type].next_one_from(from)
    }

    pub fn is_victim(&self, gc_type: GcType, segno: Segno) -> bool {
        self.inner.lock().victim_segmap[gc_type_idx(gc_type)].test_bit(segno)
    }

    pub fn set_victim(&self, gc_type: GcType, segno: Segno, victim: bool) {
        self.inner.lock().victim_segmap[gc_type_idx(gc_type)].set(segno, victim);
    }

    /// Test-and-clear: if `segno` is set in `victim_segmap[gc_type]`, clear
    /// it and return true. Used by foreground LFS to adopt a
    /// background-preselected segment (section 4.3).
    pub fn take_victim(&self, gc_type: GcType, segno: Segno) -> bool {
        let mut inner = self.inner.lock();
        let map = &mut inner.victim_segmap[gc_type_idx(gc_type)];
        if map.test_bit(segno) {
            map.set(segno, false);
            true
        } else {
            false
        }
    }

    /// First segment currently set in `victim_segmap[Background]`, if any.
    pub fn first_background_victim(&self) -> Option<Segno> {
        self.inner.lock().victim_segmap[gc_type_idx(GcType::Background)].first_one(0)
    }

    pub fn is_section_current(&self, segno: Segno, segs_per_sec: usize) -> bool {
        let inner = self.inner.lock();
        let base = (segno / segs_per_sec) * segs_per_sec;
        (base..(base + segs_per_sec).min(self.total_segs))
            .any(|s| inner.current_segmap.test_bit(s))
    }

    pub fn set_current(&self, segno: Segno, current: bool) {
        self.inner.lock().current_segmap.set(segno, current);
    }

    pub fn last_victim(&self, mode: GcPolicyMode) -> Segno {
        self.inner.lock().last_victim[mode_idx(mode)]
    }

    pub fn set_last_victim(&self, mode: GcPolicyMode, segno: Segno) {
        self.inner.lock().last_victim[mode_idx(mode)] = segno;
    }

    /// The whole selection algorithm of section 4.3, run under a single
    /// acquisition of `seglist_lock` so that two concurrent callers can
    /// never observe the same victim as available (testable property #1).
    /// `cost_fn` is expected to consult the segment manager; it is invoked
    /// while this lock is held, never the other way around, so there is no
    /// lock-order cycle with `sentry_lock`.
    #[allow(clippy::too_many_arguments)]
    pub fn select_and_claim<F: Fn(Segno) -> u64>(
        &self,
        gc_type: GcType,
        alloc_mode: crate::types::AllocMode,
        gc_mode: GcPolicyMode,
        dirty_type: usize,
        segs_per_sec: usize,
        log_ofs_unit: u32,
        max_cost: u64,
        max_search: usize,
        cost_fn: F,
    ) -> Option<Segno> {
        let mut inner = self.inner.lock();

        if gc_type == GcType::Foreground && alloc_mode == crate::types::AllocMode::Lfs {
            if let Some(segno) = inner.victim_segmap[gc_type_idx(GcType::Background)].first_one(0)
            {
                let base = (segno / segs_per_sec) * segs_per_sec;
                let range = base..(base + segs_per_sec).min(self.total_segs);
                for s in range.clone() {
                    inner.victim_segmap[gc_type_idx(GcType::Background)].set(s, false);
                }
                for s in range {
                    inner.victim_segmap[gc_type_idx(GcType::Foreground)].set(s, true);
                }
                return Some(base);
            }
        }

        let unit = 1usize << log_ofs_unit;
        let mode_i = mode_idx(gc_mode);
        let mut offset = inner.last_victim[mode_i];
        let mut min_segno: Option<Segno> = None;
        let mut min_cost = max_cost;
        let mut search_count = 0usize;

        loop {
            let Some(segno) = inner.dirty_segmap[dirty_type].next_one_from(offset) else {
                if inner.last_victim[mode_i] != 0 {
                    inner.last_victim[mode_i] = 0;
                    offset = 0;
                    continue;
                }
                break;
            };
            offset = ((segno / unit) + 1) * unit;

            let section_base = (segno / segs_per_sec) * segs_per_sec;
            let section_active = (section_base..(section_base + segs_per_sec).min(self.total_segs))
                .any(|s| inner.current_segmap.test_bit(s));
            let already_foreground =
                inner.victim_segmap[gc_type_idx(GcType::Foreground)].test_bit(segno);
            let already_background = gc_type == GcType::Background
                && inner.victim_segmap[gc_type_idx(GcType::Background)].test_bit(segno);
            if already_foreground || already_background || section_active {
                continue;
            }

            let cost = cost_fn(segno);
            if cost < min_cost {
                min_cost = cost;
                min_segno = Some(segno);
            }
            if cost == max_cost {
                continue;
            }
            search_count += 1;
            if search_count >= max_search {
                inner.last_victim[mode_i] = segno;
                break;
            }
        }

        let result = min_segno.map(|s| (s / unit) * unit);
        if let Some(segno) = result {
            let map = &mut inner.victim_segmap[gc_type_idx(gc_type)];
            for s in segno..(segno + unit).min(self.total_segs) {
                map.set(s, true);
            }
        }
        result
    }
}
