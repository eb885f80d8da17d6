//! Summary block layout (section 3): per-segment metadata mapping each
//! block slot to the node that owns it.

use crate::types::{Ino, Nid, SummaryType, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryEntry {
    pub nid: Nid,
    pub ofs_in_node: u16,
    pub version: Version,
}

#[derive(Debug, Clone)]
pub struct SummaryBlock {
    pub footer: SummaryType,
    pub entries: Vec<SummaryEntry>,
}

impl SummaryBlock {
    pub fn new(footer: SummaryType, blocks_per_seg: usize) -> Self {
        Self {
            footer,
            entries: vec![
                SummaryEntry {
                    nid: 0,
                    ofs_in_node: 0,
                    version: 0,
                };
                blocks_per_seg
            ],
        }
    }
}

/// `(ino, ofs_in_node, version)` resolved from the node manager for a given
/// nid (section 3's "Dnode info").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnodeInfo {
    pub ino: Ino,
    pub ofs_in_node: u32,
    pub version: Version,
}
