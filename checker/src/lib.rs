pub mod audit;
pub mod dirtree;
pub mod graph;
pub mod indirect;
pub mod ingest;
pub mod report;

pub use audit::{cross_check, owning_group};
pub use dirtree::DirectoryTree;
pub use graph::ReferenceGraph;
pub use indirect::{IndirectBlockSource, IndirectMap, MAX_INDIRECT_SLOTS};
pub use ingest::{load_indirect, load_summary};
pub use report::{AuditReport, AuditStats};

use log::info;
use solomon_core::FilesystemSummary;

/// Run one complete audit over an assembled record set.
///
/// Builds both derived reference tables, then cross-checks them against
/// the free lists and stored counts. Findings land in the report in a
/// fixed order: invalid pointers from the block walk, directory-structure
/// findings, then the five cross-checks.
pub fn run_audit(summary: &FilesystemSummary, source: &dyn IndirectBlockSource) -> AuditReport {
    let (graph, graph_findings) = ReferenceGraph::build(summary, source);
    let (tree, tree_findings) = DirectoryTree::build(summary);

    let mut report = AuditReport {
        findings: Vec::new(),
        stats: AuditStats {
            inodes: summary.inodes.len(),
            directory_entries: summary.entries.len(),
            referenced_blocks: graph.block_count(),
            referenced_inodes: tree.referenced_inode_count(),
            free_inodes: summary.free_inodes.len(),
            free_blocks: summary.free_blocks.len(),
        },
    };
    for finding in graph_findings {
        report.push(finding);
    }
    for finding in tree_findings {
        report.push(finding);
    }
    for finding in audit::cross_check(summary, &graph, &tree) {
        report.push(finding);
    }
    info!(
        "audit complete: {} findings over {} inodes, {} referenced blocks",
        report.findings.len(),
        report.stats.inodes,
        report.stats.referenced_blocks
    );
    report
}
