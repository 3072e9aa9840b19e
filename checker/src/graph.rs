// Derived block references: walk every inode's pointer structure and
// record, for each reachable block, who points at it and through which
// indirection path. The bitmaps are never consulted here; this table is
// the independent truth the cross-checks compare them against.

use std::collections::BTreeMap;

use solomon_core::{
    BlockNumber, BlockReference, FilesystemSummary, Finding, IndirectHop, IndirectionPath,
    InodeNumber, InodeRecord, Superblock, DIRECT_SLOTS,
};

use crate::indirect::IndirectBlockSource;

/// Every block reachable from the inode table, with all the pointers
/// that reach it, in the order the walk discovered them.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    blocks: BTreeMap<BlockNumber, Vec<BlockReference>>,
}

impl ReferenceGraph {
    /// Walk all inodes in ascending number order. Pointers outside the
    /// valid data-block range come back as findings instead of joining
    /// the graph; their targets are never descended into.
    pub fn build(
        summary: &FilesystemSummary,
        source: &dyn IndirectBlockSource,
    ) -> (Self, Vec<Finding>) {
        let mut walk = Walk {
            superblock: &summary.superblock,
            source,
            blocks: BTreeMap::new(),
            findings: Vec::new(),
        };
        for inode in summary.inodes.values() {
            walk.visit_inode(inode);
        }
        (ReferenceGraph { blocks: walk.blocks }, walk.findings)
    }

    pub fn contains(&self, block: BlockNumber) -> bool {
        self.blocks.contains_key(&block)
    }

    pub fn references(&self, block: BlockNumber) -> &[BlockReference] {
        self.blocks.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All referenced blocks in ascending block order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockNumber, &[BlockReference])> {
        self.blocks
            .iter()
            .map(|(block, refs)| (*block, refs.as_slice()))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

struct Walk<'a> {
    superblock: &'a Superblock,
    source: &'a dyn IndirectBlockSource,
    blocks: BTreeMap<BlockNumber, Vec<BlockReference>>,
    findings: Vec<Finding>,
}

impl Walk<'_> {
    fn visit_inode(&mut self, inode: &InodeRecord) {
        for (slot, &pointer) in inode.pointers.iter().enumerate() {
            // Slots past the direct dozen address one, two, and three
            // levels of indirection in turn.
            let depth = slot.saturating_sub(DIRECT_SLOTS - 1) as u8;
            self.visit_pointer(inode.number, slot as u32, pointer, &Vec::new(), depth);
        }
    }

    /// A zero pointer is a hole: skipped, and the scan of the remaining
    /// slots keeps going rather than stopping at the first one.
    fn visit_pointer(
        &mut self,
        inode: InodeNumber,
        entry_index: u32,
        pointer: BlockNumber,
        path: &IndirectionPath,
        depth: u8,
    ) {
        if pointer == 0 {
            return;
        }
        let reference = BlockReference {
            inode,
            entry_index,
            path: path.clone(),
        };
        if !self.superblock.valid_data_block(pointer) {
            self.findings.push(Finding::InvalidBlock {
                block: pointer,
                reference,
            });
            return;
        }
        self.blocks.entry(pointer).or_default().push(reference);
        if depth > 0 {
            let mut child_path = path.clone();
            child_path.push(IndirectHop {
                block: pointer,
                index: entry_index,
            });
            let slots = self.source.read_indirect_block(pointer);
            for (offset, &child) in slots.iter().enumerate() {
                self.visit_pointer(inode, offset as u32, child, &child_path, depth - 1);
            }
        }
    }
}
