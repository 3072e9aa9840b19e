// Derived inode references: walk the directory entries, count who links
// to each inode, and validate the "." and ".." structure against a parent
// map resolved up front.

use std::collections::BTreeMap;

use log::debug;

use solomon_core::{DirectoryEntry, FilesystemSummary, Finding, InodeNumber, InodeReference, ROOT_INODE};

/// Directory entry positions with fixed meaning: 0 is the self-entry,
/// 1 the parent-entry. Everything at 2 and beyond is a normal entry.
const SELF_ENTRY: u32 = 0;
const PARENT_ENTRY: u32 = 1;

/// Every inode referenced by a directory entry, with all the entries
/// that reference it, plus the resolved parent of each directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryTree {
    parent_of: BTreeMap<InodeNumber, InodeNumber>,
    inode_refs: BTreeMap<InodeNumber, Vec<InodeReference>>,
}

impl DirectoryTree {
    /// Walk all entries in ascending (directory, entry number) order.
    ///
    /// The parent map is resolved over the whole entry list before any
    /// ".." is validated, so validation never depends on how far the
    /// walk has progressed.
    pub fn build(summary: &FilesystemSummary) -> (Self, Vec<Finding>) {
        let parent_of = resolve_parents(&summary.entries);
        let mut inode_refs: BTreeMap<InodeNumber, Vec<InodeReference>> = BTreeMap::new();
        let mut findings = Vec::new();

        for entry in &summary.entries {
            let reference = InodeReference {
                parent: entry.parent,
                entry_number: entry.entry_number,
            };
            if summary.inodes.contains_key(&entry.child) {
                inode_refs.entry(entry.child).or_default().push(reference);
            } else {
                findings.push(Finding::UnallocatedInode {
                    inode: entry.child,
                    reference,
                });
            }

            match entry.entry_number {
                SELF_ENTRY => {
                    if entry.child != entry.parent {
                        findings.push(Finding::IncorrectEntry {
                            directory: entry.parent,
                            name: entry.name.clone(),
                            linked: entry.child,
                            expected: entry.parent,
                        });
                    }
                }
                PARENT_ENTRY => match parent_of.get(&entry.parent) {
                    Some(&expected) => {
                        if entry.child != expected {
                            findings.push(Finding::IncorrectEntry {
                                directory: entry.parent,
                                name: entry.name.clone(),
                                linked: entry.child,
                                expected,
                            });
                        }
                    }
                    None => {
                        // Nothing lists this directory, so there is no
                        // parent to hold its ".." against.
                        debug!(
                            "directory {} is not listed anywhere, skipping its parent-entry check",
                            entry.parent
                        );
                    }
                },
                _ => {}
            }
        }

        (
            DirectoryTree {
                parent_of,
                inode_refs,
            },
            findings,
        )
    }

    /// How many directory entries link to this inode. This is the value
    /// the stored link count is audited against.
    pub fn reference_count(&self, inode: InodeNumber) -> usize {
        self.inode_refs.get(&inode).map(Vec::len).unwrap_or(0)
    }

    pub fn references(&self, inode: InodeNumber) -> &[InodeReference] {
        self.inode_refs
            .get(&inode)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn parent_of(&self, inode: InodeNumber) -> Option<InodeNumber> {
        self.parent_of.get(&inode).copied()
    }

    pub fn referenced_inode_count(&self) -> usize {
        self.inode_refs.len()
    }
}

/// Resolve each directory's parent from the normal entries that list it.
///
/// Only entries at position 2 and beyond define parenthood; the "." and
/// ".." slots restate structure rather than establish it. Self-links are
/// ignored, the root is its own parent, and when corrupt input claims a
/// directory twice the first claim in entry order wins.
fn resolve_parents(entries: &[DirectoryEntry]) -> BTreeMap<InodeNumber, InodeNumber> {
    let mut parent_of = BTreeMap::new();
    parent_of.insert(ROOT_INODE, ROOT_INODE);
    for entry in entries {
        if entry.entry_number >= 2 && entry.child != entry.parent {
            parent_of.entry(entry.child).or_insert(entry.parent);
        }
    }
    parent_of
}
