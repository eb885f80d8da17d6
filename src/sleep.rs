//! Adaptive sleep controller (C1, section 4.1): two pure clamped operations
//! plus the no-victim sentinel the background driver threads through them.

use crate::config::GcConfig;

pub fn increase(wait_ms: u64, config: &GcConfig) -> u64 {
    (wait_ms.saturating_mul(2)).min(config.max_sleep_ms)
}

pub fn decrease(wait_ms: u64, config: &GcConfig) -> u64 {
    (wait_ms / 2).max(config.min_sleep_ms)
}
