// Audit outcome: the ordered findings plus the counters that describe
// what was examined.

use log::debug;
use serde::Serialize;
use solomon_core::Finding;

/// Everything one audit run produced, in report order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub findings: Vec<Finding>,
    pub stats: AuditStats,
}

/// Counters over the examined record set.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AuditStats {
    pub inodes: usize,
    pub directory_entries: usize,
    pub referenced_blocks: usize,
    pub referenced_inodes: usize,
    pub free_inodes: usize,
    pub free_blocks: usize,
}

impl AuditReport {
    pub fn push(&mut self, finding: Finding) {
        debug!("finding: {}", finding);
        self.findings.push(finding);
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}
