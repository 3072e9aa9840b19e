// The assembled, immutable record set for one audit run. Bitmap entries
// are partitioned into the two free sets here, once, so the checking
// phases only ever see typed, classified data.

use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::records::{
    BitmapEntry, BlockNumber, DirectoryEntry, GroupDescriptor, InodeNumber, InodeRecord,
    Superblock,
};

#[derive(Debug, Clone)]
pub struct FilesystemSummary {
    pub superblock: Superblock,
    pub groups: Vec<GroupDescriptor>,
    /// Inode numbers the bitmaps mark free, ascending.
    pub free_inodes: BTreeSet<InodeNumber>,
    /// Block numbers the bitmaps mark free, ascending.
    pub free_blocks: BTreeSet<BlockNumber>,
    /// The inode table, keyed by inode number.
    pub inodes: BTreeMap<InodeNumber, InodeRecord>,
    /// Directory entries in ascending (parent, entry number) order.
    pub entries: Vec<DirectoryEntry>,
}

impl FilesystemSummary {
    /// Build the record set from the five ingested streams.
    ///
    /// Bitmap entries whose bitmap block matches a group's inode bitmap
    /// become free inodes; everything else becomes a free block, which is
    /// also where entries from an unrecognized bitmap block land (the
    /// decoder only ever emits the two bitmap kinds).
    pub fn assemble(
        superblock: Superblock,
        groups: Vec<GroupDescriptor>,
        bitmap_entries: Vec<BitmapEntry>,
        inode_records: Vec<InodeRecord>,
        mut entries: Vec<DirectoryEntry>,
    ) -> Self {
        let inode_bitmaps: BTreeSet<BlockNumber> =
            groups.iter().map(|g| g.inode_bitmap_block).collect();
        let block_bitmaps: BTreeSet<BlockNumber> =
            groups.iter().map(|g| g.block_bitmap_block).collect();

        let mut free_inodes = BTreeSet::new();
        let mut free_blocks = BTreeSet::new();
        for entry in bitmap_entries {
            if inode_bitmaps.contains(&entry.bitmap_block) {
                match InodeNumber::try_from(entry.item) {
                    Ok(inode) => {
                        free_inodes.insert(inode);
                    }
                    Err(_) => {
                        warn!(
                            "free inode {} from bitmap block {} is out of inode range, dropped",
                            entry.item, entry.bitmap_block
                        );
                    }
                }
            } else {
                if !block_bitmaps.contains(&entry.bitmap_block) {
                    warn!(
                        "bitmap entry from block {} matches no group descriptor, treating as free block",
                        entry.bitmap_block
                    );
                }
                free_blocks.insert(entry.item);
            }
        }

        let mut inodes = BTreeMap::new();
        for record in inode_records {
            if let Some(previous) = inodes.insert(record.number, record) {
                warn!(
                    "duplicate inode table row for inode {}, keeping the later one",
                    previous.number
                );
            }
        }

        // The decoder emits entries in ascending (parent, entry) order
        // already; sorting makes that ordering a guarantee rather than an
        // assumption.
        entries.sort_by_key(|e| (e.parent, e.entry_number));

        FilesystemSummary {
            superblock,
            groups,
            free_inodes,
            free_blocks,
            inodes,
            entries,
        }
    }

    /// All bitmap blocks named by the group descriptors. These are
    /// allocated by definition and never pointed to by inodes.
    pub fn bitmap_blocks(&self) -> BTreeSet<BlockNumber> {
        self.groups
            .iter()
            .flat_map(|g| [g.inode_bitmap_block, g.block_bitmap_block])
            .collect()
    }
}
