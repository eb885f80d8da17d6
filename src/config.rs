//! Runtime-tunable knobs for the GC core, in the style of the teacher
//! crate's `config.rs`: a plain struct with a `Default` impl.

/// Lower bound of the background worker's adaptive wait, in milliseconds.
pub const MIN_SLEEP: u64 = 10_000;
/// Upper bound of the background worker's adaptive wait, in milliseconds.
pub const MAX_SLEEP: u64 = 60_000;
/// Sleep interval used after a cycle that reclaimed nothing.
pub const NOGC_SLEEP: u64 = 120_000;
/// Cap on the number of dirty-segmap bits a single `get_victim` scan will
/// walk before giving up and persisting its cursor for the next call.
pub const MAX_VICTIM_SEARCH: usize = 20;
/// Number of current segments reserved at mount time (one per temperature
/// times data/node).
pub const DEFAULT_CURSEGS: usize = 6;
/// Number of dirty-type buckets tracked by the dirty segment manager.
pub const NR_DIRTY_TYPE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcConfig {
    /// Disables the background worker's reclamation pass (option 5 of C2);
    /// foreground GC through `f2fs_gc` is unaffected.
    pub no_background_gc: bool,
    pub min_sleep_ms: u64,
    pub max_sleep_ms: u64,
    pub nogc_sleep_ms: u64,
    pub max_victim_search: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            no_background_gc: false,
            min_sleep_ms: MIN_SLEEP,
            max_sleep_ms: MAX_SLEEP,
            nogc_sleep_ms: NOGC_SLEEP,
            max_victim_search: MAX_VICTIM_SEARCH,
        }
    }
}
