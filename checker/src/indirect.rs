// Indirect block contents for the reference walk
// The walker asks for the pointer array behind any indirect block it
// reaches; the map answer comes from the decoded indirect-block stream.

use std::collections::BTreeMap;

use solomon_core::BlockNumber;

/// Supplies the pointer array stored in an indirect block.
///
/// The walk stays the same whether the pointers come from a decoded
/// dump, a fixture, or a live image reader, so tests can hand the walk
/// exactly the indirect contents they want to exercise.
pub trait IndirectBlockSource {
    /// The pointers stored in `block`, in slot order. Unknown blocks
    /// read as empty, which the walk treats as all-holes.
    fn read_indirect_block(&self, block: BlockNumber) -> &[BlockNumber];
}

/// Slot capacity of the largest indirect block the layout allows:
/// 64 KiB of 4-byte pointers.
pub const MAX_INDIRECT_SLOTS: usize = 16_384;

/// Indirect block contents collected from the decoded dump.
#[derive(Debug, Clone, Default)]
pub struct IndirectMap {
    contents: BTreeMap<BlockNumber, Vec<BlockNumber>>,
}

impl IndirectMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that slot `offset` of indirect block `block` holds
    /// `pointer`. Slots never mentioned stay zero (holes). `offset`
    /// must stay below [`MAX_INDIRECT_SLOTS`]; the loader rejects
    /// rows past that bound before they reach here.
    pub fn set_entry(&mut self, block: BlockNumber, offset: usize, pointer: BlockNumber) {
        debug_assert!(offset < MAX_INDIRECT_SLOTS);
        let slots = self.contents.entry(block).or_default();
        if slots.len() <= offset {
            slots.resize(offset + 1, 0);
        }
        slots[offset] = pointer;
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl IndirectBlockSource for IndirectMap {
    fn read_indirect_block(&self, block: BlockNumber) -> &[BlockNumber] {
        self.contents.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }
}
