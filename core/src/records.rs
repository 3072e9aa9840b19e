// Typed record model for the decoded filesystem summary.
// One type per record stream emitted by the image decoder; every field is
// validated exactly once at ingest, so the checking phases never parse.

/// Block number. On-disk pointers are 32-bit but all arithmetic here is
/// done widened, matching the superblock's block count domain.
pub type BlockNumber = u64;

/// Inode number.
pub type InodeNumber = u32;

/// Block group index.
pub type GroupNumber = u32;

/// Inode numbers 1..=10 are reserved by the filesystem layout. They never
/// appear in directory trees, so the missing-inode check skips them.
pub const LAST_RESERVED_INODE: InodeNumber = 10;

/// The root directory inode. Root is its own parent by convention.
pub const ROOT_INODE: InodeNumber = 2;

/// Direct pointer slots at the front of every inode's pointer array.
pub const DIRECT_SLOTS: usize = 12;

/// Total pointer slots per inode: 12 direct, then single-, double- and
/// triple-indirect.
pub const POINTER_SLOTS: usize = 15;

/// Basic filesystem parameters, read once from the superblock summary.
#[derive(Debug, Clone)]
pub struct Superblock {
    pub magic: u32,
    pub inode_count: u32,
    pub block_count: u64,
    pub block_size: u32,
    pub fragment_size: i32,
    pub blocks_per_group: u32,
    pub inodes_per_group: u32,
    pub fragments_per_group: u32,
    pub first_data_block: BlockNumber,
}

impl Superblock {
    /// Whether a nonzero pointer falls inside the valid data-block range.
    /// Blocks below the first data block are never legal pointer targets.
    pub fn valid_data_block(&self, block: BlockNumber) -> bool {
        block >= self.first_data_block && block < self.block_count
    }
}

/// Per-group allocation summary. Position in the descriptor table is the
/// group number.
#[derive(Debug, Clone)]
pub struct GroupDescriptor {
    pub free_block_count: u32,
    pub free_inode_count: u32,
    pub inode_bitmap_block: BlockNumber,
    pub block_bitmap_block: BlockNumber,
}

/// One bit read out of an allocation bitmap: which bitmap block it came
/// from and the inode or block number it marks free. Which of the two it
/// is gets decided during summary assembly, by matching the bitmap block
/// against the group descriptors.
#[derive(Debug, Clone, Copy)]
pub struct BitmapEntry {
    pub bitmap_block: BlockNumber,
    pub item: u64,
}

/// One row of the inode table summary.
#[derive(Debug, Clone)]
pub struct InodeRecord {
    pub number: InodeNumber,
    pub link_count: u32,
    pub pointers: [BlockNumber; POINTER_SLOTS],
}

impl InodeRecord {
    pub fn new(number: InodeNumber, link_count: u32, pointers: [BlockNumber; POINTER_SLOTS]) -> Self {
        Self {
            number,
            link_count,
            pointers,
        }
    }
}

/// One directory entry, positioned by (parent inode, entry number).
/// Entry 0 is the directory's self-entry and entry 1 its parent entry.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub parent: InodeNumber,
    pub entry_number: u32,
    pub child: InodeNumber,
    pub name: String,
}
