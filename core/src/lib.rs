pub mod error;
pub mod findings;
pub mod records;
pub mod summary;

pub use error::IngestError;
pub use findings::{BlockReference, Finding, IndirectHop, IndirectionPath, InodeReference};
pub use records::{
    BitmapEntry, BlockNumber, DirectoryEntry, GroupDescriptor, GroupNumber, InodeNumber,
    InodeRecord, Superblock, DIRECT_SLOTS, LAST_RESERVED_INODE, POINTER_SLOTS, ROOT_INODE,
};
pub use summary::FilesystemSummary;
