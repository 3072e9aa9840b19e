// Consistency findings and their canonical one-line report format.
// The reporter prints findings verbatim, so the Display impls here are the
// output contract: identical input must always render identical lines.

use std::fmt;

use serde::Serialize;

use crate::records::{BlockNumber, InodeNumber};

/// One hop of an indirect-block descent: the indirect block that was
/// entered, and the slot or offset whose pointer selected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndirectHop {
    pub block: BlockNumber,
    pub index: u32,
}

/// The chain of indirect blocks walked to reach a pointer. Empty for
/// pointers stored in the inode's own slots.
pub type IndirectionPath = Vec<IndirectHop>;

/// A pointer to a block, as discovered by the inode walk: which inode it
/// belongs to, the slot or offset holding it, and the indirection path
/// that led there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReference {
    pub inode: InodeNumber,
    pub entry_index: u32,
    pub path: IndirectionPath,
}

impl BlockReference {
    pub fn direct(inode: InodeNumber, entry_index: u32) -> Self {
        Self {
            inode,
            entry_index,
            path: Vec::new(),
        }
    }

    /// The indirect block that physically holds this pointer, if any.
    pub fn containing_indirect(&self) -> Option<BlockNumber> {
        self.path.last().map(|hop| hop.block)
    }
}

impl fmt::Display for BlockReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INODE <{}> ", self.inode)?;
        if let Some(indirect) = self.containing_indirect() {
            write!(f, "INDIRECT BLOCK <{}> ", indirect)?;
        }
        write!(f, "ENTRY <{}>", self.entry_index)
    }
}

/// A directory entry referencing an inode: which directory lists it and at
/// which entry position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InodeReference {
    pub parent: InodeNumber,
    pub entry_number: u32,
}

/// One consistency violation discovered during an audit run. Every variant
/// renders as exactly one report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Finding {
    /// A nonzero pointer outside the valid data-block range.
    InvalidBlock {
        block: BlockNumber,
        reference: BlockReference,
    },
    /// A block on the free list that the inode walk still reaches.
    UnallocatedBlock {
        block: BlockNumber,
        references: Vec<BlockReference>,
    },
    /// A block reached through more than one pointer.
    MultiplyReferencedBlock {
        block: BlockNumber,
        references: Vec<BlockReference>,
    },
    /// A directory entry naming an inode absent from the inode table.
    UnallocatedInode {
        inode: InodeNumber,
        reference: InodeReference,
    },
    /// An inode with no references that the free list does not record.
    /// `free_list_block` names the inode bitmap of the group whose free
    /// list should hold it.
    MissingInode {
        inode: InodeNumber,
        free_list_block: BlockNumber,
    },
    /// Stored link count disagrees with the number of directory entries
    /// actually found.
    LinkCount {
        inode: InodeNumber,
        stored: u32,
        counted: u32,
    },
    /// A "." or ".." entry linking to the wrong inode.
    IncorrectEntry {
        directory: InodeNumber,
        name: String,
        linked: InodeNumber,
        expected: InodeNumber,
    },
    /// A block marked allocated that no inode's pointer structure reaches.
    AllocatedBlockUnreferenced { block: BlockNumber },
}

fn write_references(f: &mut fmt::Formatter<'_>, references: &[BlockReference]) -> fmt::Result {
    for (i, reference) in references.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", reference)?;
    }
    Ok(())
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::InvalidBlock { block, reference } => {
                write!(f, "INVALID BLOCK <{}> IN {}", block, reference)
            }
            Finding::UnallocatedBlock { block, references } => {
                write!(f, "UNALLOCATED BLOCK <{}> REFERENCED BY ", block)?;
                write_references(f, references)
            }
            Finding::MultiplyReferencedBlock { block, references } => {
                write!(f, "MULTIPLY REFERENCED BLOCK <{}> BY ", block)?;
                write_references(f, references)
            }
            Finding::UnallocatedInode { inode, reference } => {
                write!(
                    f,
                    "UNALLOCATED INODE <{}> REFERENCED BY DIRECTORY <{}> ENTRY <{}>",
                    inode, reference.parent, reference.entry_number
                )
            }
            Finding::MissingInode {
                inode,
                free_list_block,
            } => {
                write!(
                    f,
                    "MISSING INODE <{}> SHOULD BE IN FREE LIST <{}>",
                    inode, free_list_block
                )
            }
            Finding::LinkCount {
                inode,
                stored,
                counted,
            } => {
                write!(
                    f,
                    "LINKCOUNT <{}> IS <{}> SHOULD BE <{}>",
                    inode, stored, counted
                )
            }
            Finding::IncorrectEntry {
                directory,
                name,
                linked,
                expected,
            } => {
                write!(
                    f,
                    "INCORRECT ENTRY IN <{}> NAME <{}> LINK TO <{}> SHOULD BE <{}>",
                    directory, name, linked, expected
                )
            }
            Finding::AllocatedBlockUnreferenced { block } => {
                write!(f, "ALLOCATED BLOCK <{}> NOT REFERENCED", block)
            }
        }
    }
}
