// Cross-checks: diff the two derived reference tables against the free
// lists, the per-group counters, and the stored link counts. The checks
// run in a fixed order, each as one full pass, so identical input always
// yields the identical finding sequence.

use log::debug;

use solomon_core::{
    BlockReference, FilesystemSummary, Finding, InodeNumber, LAST_RESERVED_INODE,
};

use crate::dirtree::DirectoryTree;
use crate::graph::ReferenceGraph;

/// Run all five cross-checks over the completed reference tables.
pub fn cross_check(
    summary: &FilesystemSummary,
    graph: &ReferenceGraph,
    tree: &DirectoryTree,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    missing_inodes(summary, tree, &mut findings);
    link_counts(summary, tree, &mut findings);
    multiply_referenced(graph, &mut findings);
    unallocated_referenced(summary, graph, &mut findings);
    leaked_blocks(summary, graph, &mut findings);
    findings
}

/// The block group whose free list should record `inode`: the first
/// group whose cumulative free-inode count exceeds the inode number.
pub fn owning_group(free_inode_counts: &[u32], inode: InodeNumber) -> Option<usize> {
    let mut cumulative: u64 = 0;
    for (group, &count) in free_inode_counts.iter().enumerate() {
        cumulative += u64::from(count);
        if u64::from(inode) < cumulative {
            return Some(group);
        }
    }
    None
}

/// An allocated inode above the reserved range that nothing references
/// should at least be on some group's free list.
fn missing_inodes(summary: &FilesystemSummary, tree: &DirectoryTree, findings: &mut Vec<Finding>) {
    let free_counts: Vec<u32> = summary.groups.iter().map(|g| g.free_inode_count).collect();
    for &number in summary.inodes.keys() {
        if number <= LAST_RESERVED_INODE
            || tree.reference_count(number) > 0
            || summary.free_inodes.contains(&number)
        {
            continue;
        }
        match owning_group(&free_counts, number) {
            Some(group) => findings.push(Finding::MissingInode {
                inode: number,
                free_list_block: summary.groups[group].inode_bitmap_block,
            }),
            None => debug!(
                "inode {} is unreferenced and not free, but no group's free-inode count covers it",
                number
            ),
        }
    }
}

fn link_counts(summary: &FilesystemSummary, tree: &DirectoryTree, findings: &mut Vec<Finding>) {
    for (&number, record) in &summary.inodes {
        let counted = tree.reference_count(number) as u32;
        if counted > 0 && record.link_count != counted {
            findings.push(Finding::LinkCount {
                inode: number,
                stored: record.link_count,
                counted,
            });
        }
    }
}

fn multiply_referenced(graph: &ReferenceGraph, findings: &mut Vec<Finding>) {
    for (block, refs) in graph.iter() {
        if refs.len() > 1 {
            findings.push(Finding::MultiplyReferencedBlock {
                block,
                references: ordered_references(refs),
            });
        }
    }
}

fn unallocated_referenced(
    summary: &FilesystemSummary,
    graph: &ReferenceGraph,
    findings: &mut Vec<Finding>,
) {
    for &block in &summary.free_blocks {
        let refs = graph.references(block);
        if !refs.is_empty() {
            findings.push(Finding::UnallocatedBlock {
                block,
                references: ordered_references(refs),
            });
        }
    }
}

/// The dual of the unallocated scan: a block the bitmap holds as
/// allocated must be reachable from some inode. The bitmap blocks the
/// group descriptors name are metadata the record set accounts for, so
/// they are exempt.
fn leaked_blocks(summary: &FilesystemSummary, graph: &ReferenceGraph, findings: &mut Vec<Finding>) {
    let bitmap_blocks = summary.bitmap_blocks();
    for block in summary.superblock.first_data_block..summary.superblock.block_count {
        if summary.free_blocks.contains(&block)
            || graph.contains(block)
            || bitmap_blocks.contains(&block)
        {
            continue;
        }
        findings.push(Finding::AllocatedBlockUnreferenced { block });
    }
}

/// Referencer listing order within one finding line: ascending inode
/// number, then entry index.
fn ordered_references(refs: &[BlockReference]) -> Vec<BlockReference> {
    let mut ordered = refs.to_vec();
    ordered.sort_by_key(|r| (r.inode, r.entry_index));
    ordered
}
