// Loads the decoded summary files produced by the image decoder. Every
// field is parsed and validated here, once; a malformed row aborts the
// run before any checking starts.
//
// Radix conventions follow the decoder's writers: bitmap block numbers
// and inode block pointers are hex, counts and inode numbers decimal.

use std::fs;
use std::path::Path;

use log::{debug, info};

use solomon_core::{
    BitmapEntry, DirectoryEntry, FilesystemSummary, GroupDescriptor, IngestError, InodeRecord,
    Superblock, POINTER_SLOTS,
};

use crate::indirect::{IndirectMap, MAX_INDIRECT_SLOTS};

pub const SUPER_CSV: &str = "super.csv";
pub const GROUP_CSV: &str = "group.csv";
pub const BITMAP_CSV: &str = "bitmap.csv";
pub const INODE_CSV: &str = "inode.csv";
pub const DIRECTORY_CSV: &str = "directory.csv";
pub const INDIRECT_CSV: &str = "indirect.csv";

/// Load the five summary files from `dir` and assemble the record set.
pub fn load_summary(dir: &Path) -> Result<FilesystemSummary, IngestError> {
    let superblock = read_superblock(dir)?;
    let groups = read_groups(dir)?;
    let bitmap = read_bitmap(dir)?;
    let inodes = read_inodes(dir)?;
    let entries = read_directory(dir)?;
    let summary = FilesystemSummary::assemble(superblock, groups, bitmap, inodes, entries);
    info!(
        "loaded {}: {} groups, {} inodes, {} directory entries, {} free inodes, {} free blocks",
        dir.display(),
        summary.groups.len(),
        summary.inodes.len(),
        summary.entries.len(),
        summary.free_inodes.len(),
        summary.free_blocks.len()
    );
    Ok(summary)
}

/// Load the indirect-block contents from `dir`. The file is optional:
/// without it every indirect block reads as empty.
pub fn load_indirect(dir: &Path) -> Result<IndirectMap, IngestError> {
    if !dir.join(INDIRECT_CSV).exists() {
        debug!("{} not present, indirect blocks read as empty", INDIRECT_CSV);
        return Ok(IndirectMap::new());
    }
    let mut map = IndirectMap::new();
    for row in read_rows(dir, INDIRECT_CSV)? {
        row.require(3)?;
        let block = row.hex_u64(0)?;
        // A slot offset past the largest block's capacity cannot come
        // from a real indirect block; treat it like any malformed field.
        let offset = row.dec_bounded(1, MAX_INDIRECT_SLOTS as u64 - 1)? as usize;
        let pointer = row.hex_u64(2)?;
        map.set_entry(block, offset, pointer);
    }
    debug!("{}: slots recorded for {} indirect blocks", INDIRECT_CSV, map.len());
    Ok(map)
}

fn read_superblock(dir: &Path) -> Result<Superblock, IngestError> {
    let rows = read_rows(dir, SUPER_CSV)?;
    let row = rows.first().ok_or_else(|| IngestError::MissingRecord {
        file: SUPER_CSV.to_string(),
    })?;
    if rows.len() > 1 {
        debug!("{} has {} rows, reading only the first", SUPER_CSV, rows.len());
    }
    row.require(9)?;
    Ok(Superblock {
        magic: row.hex_u32(0)?,
        inode_count: row.dec_u32(1)?,
        block_count: row.dec_u64(2)?,
        block_size: row.dec_u32(3)?,
        fragment_size: row.dec_i32(4)?,
        blocks_per_group: row.dec_u32(5)?,
        inodes_per_group: row.dec_u32(6)?,
        fragments_per_group: row.dec_u32(7)?,
        first_data_block: row.dec_u64(8)?,
    })
}

fn read_groups(dir: &Path) -> Result<Vec<GroupDescriptor>, IngestError> {
    let mut groups = Vec::new();
    for row in read_rows(dir, GROUP_CSV)? {
        row.require(6)?;
        groups.push(GroupDescriptor {
            free_block_count: row.dec_u32(1)?,
            free_inode_count: row.dec_u32(2)?,
            inode_bitmap_block: row.hex_u64(4)?,
            block_bitmap_block: row.hex_u64(5)?,
        });
    }
    Ok(groups)
}

fn read_bitmap(dir: &Path) -> Result<Vec<BitmapEntry>, IngestError> {
    let mut entries = Vec::new();
    for row in read_rows(dir, BITMAP_CSV)? {
        row.require(2)?;
        entries.push(BitmapEntry {
            bitmap_block: row.hex_u64(0)?,
            item: row.dec_u64(1)?,
        });
    }
    Ok(entries)
}

fn read_inodes(dir: &Path) -> Result<Vec<InodeRecord>, IngestError> {
    let mut records = Vec::new();
    for row in read_rows(dir, INODE_CSV)? {
        row.require(11 + POINTER_SLOTS)?;
        let number = row.dec_u32(0)?;
        let link_count = row.dec_u32(5)?;
        let mut pointers = [0; POINTER_SLOTS];
        for (slot, pointer) in pointers.iter_mut().enumerate() {
            *pointer = row.hex_u64(11 + slot)?;
        }
        records.push(InodeRecord::new(number, link_count, pointers));
    }
    Ok(records)
}

fn read_directory(dir: &Path) -> Result<Vec<DirectoryEntry>, IngestError> {
    let mut entries = Vec::new();
    for row in read_rows(dir, DIRECTORY_CSV)? {
        row.require(6)?;
        entries.push(DirectoryEntry {
            parent: row.dec_u32(0)?,
            entry_number: row.dec_u32(1)?,
            child: row.dec_u32(4)?,
            name: row.text(5),
        });
    }
    Ok(entries)
}

struct Row {
    file: &'static str,
    line: usize,
    fields: Vec<String>,
}

impl Row {
    fn require(&self, expected: usize) -> Result<(), IngestError> {
        if self.fields.len() < expected {
            return Err(IngestError::ShortRow {
                file: self.file.to_string(),
                line: self.line,
                expected,
                found: self.fields.len(),
            });
        }
        Ok(())
    }

    fn raw(&self, field: usize) -> &str {
        self.fields[field].trim()
    }

    fn text(&self, field: usize) -> String {
        self.fields[field].clone()
    }

    fn bad_number(&self, field: usize) -> IngestError {
        IngestError::BadNumber {
            file: self.file.to_string(),
            line: self.line,
            field,
            value: self.fields[field].clone(),
        }
    }

    fn dec_u32(&self, field: usize) -> Result<u32, IngestError> {
        self.raw(field).parse().map_err(|_| self.bad_number(field))
    }

    fn dec_u64(&self, field: usize) -> Result<u64, IngestError> {
        self.raw(field).parse().map_err(|_| self.bad_number(field))
    }

    /// Decimal field with an inclusive upper bound.
    fn dec_bounded(&self, field: usize, max: u64) -> Result<u64, IngestError> {
        let value = self.dec_u64(field)?;
        if value > max {
            return Err(IngestError::ValueOutOfRange {
                file: self.file.to_string(),
                line: self.line,
                field,
                value,
                max,
            });
        }
        Ok(value)
    }

    fn dec_i32(&self, field: usize) -> Result<i32, IngestError> {
        self.raw(field).parse().map_err(|_| self.bad_number(field))
    }

    fn hex_u32(&self, field: usize) -> Result<u32, IngestError> {
        u32::from_str_radix(self.raw(field), 16).map_err(|_| self.bad_number(field))
    }

    fn hex_u64(&self, field: usize) -> Result<u64, IngestError> {
        u64::from_str_radix(self.raw(field), 16).map_err(|_| self.bad_number(field))
    }
}

fn read_rows(dir: &Path, file: &'static str) -> Result<Vec<Row>, IngestError> {
    let contents = fs::read_to_string(dir.join(file)).map_err(|source| IngestError::Io {
        file: file.to_string(),
        source,
    })?;
    let mut rows = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        rows.push(Row {
            file,
            line: index + 1,
            fields: split_fields(line),
        });
    }
    Ok(rows)
}

/// Split one comma-separated line. A field may be wrapped in double
/// quotes, which protects embedded commas; entry names are written that
/// way. The quotes themselves are not part of the field.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in line.chars() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    fn populate_minimal(dir: &TempDir) {
        write_file(dir, SUPER_CSV, "ef53,32,64,1024,1024,64,32,64,1\n");
        write_file(dir, GROUP_CSV, "64,40,20,2,3,4,5\n");
        write_file(dir, BITMAP_CSV, "3,14\n4,30\n4,31\n");
        write_file(
            dir,
            INODE_CSV,
            "2,d,755,0,0,3,0,0,0,1024,2,14,0,0,0,0,0,0,0,0,0,0,0,0,0,0\n",
        );
        write_file(dir, DIRECTORY_CSV, "2,0,12,1,2,\".\"\n2,1,12,2,2,\"..\"\n");
    }

    #[test]
    fn loads_a_complete_summary() {
        let dir = TempDir::new().unwrap();
        populate_minimal(&dir);
        let summary = load_summary(dir.path()).unwrap();
        assert_eq!(summary.superblock.magic, 0xEF53);
        assert_eq!(summary.superblock.block_count, 64);
        assert_eq!(summary.groups.len(), 1);
        assert_eq!(summary.groups[0].inode_bitmap_block, 3);
        assert_eq!(summary.groups[0].block_bitmap_block, 4);
        assert_eq!(
            summary.free_inodes.iter().copied().collect::<Vec<_>>(),
            vec![14]
        );
        assert_eq!(
            summary.free_blocks.iter().copied().collect::<Vec<_>>(),
            vec![30, 31]
        );
        assert_eq!(summary.inodes[&2].link_count, 3);
        assert_eq!(summary.inodes[&2].pointers[0], 0x14);
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.entries[0].name, ".");
    }

    #[test]
    fn pointer_fields_decode_as_hex() {
        let dir = TempDir::new().unwrap();
        populate_minimal(&dir);
        write_file(
            &dir,
            INODE_CSV,
            "12,f,644,0,0,1,0,0,0,1024,1,a,0,0,0,0,0,0,0,0,0,0,0,1f,0,0\n",
        );
        let summary = load_summary(dir.path()).unwrap();
        let inode = &summary.inodes[&12];
        assert_eq!(inode.pointers[0], 10);
        assert_eq!(inode.pointers[12], 0x1f);
    }

    #[test]
    fn quoted_name_keeps_embedded_comma() {
        let dir = TempDir::new().unwrap();
        populate_minimal(&dir);
        write_file(&dir, DIRECTORY_CSV, "2,2,14,6,12,\"a,b\"\n");
        let summary = load_summary(dir.path()).unwrap();
        assert_eq!(summary.entries[0].child, 12);
        assert_eq!(summary.entries[0].name, "a,b");
    }

    #[test]
    fn bad_number_names_file_line_and_field() {
        let dir = TempDir::new().unwrap();
        populate_minimal(&dir);
        write_file(&dir, BITMAP_CSV, "3,14\n3,zzz\n");
        let err = load_summary(dir.path()).unwrap_err();
        match err {
            IngestError::BadNumber {
                file,
                line,
                field,
                value,
            } => {
                assert_eq!(file, BITMAP_CSV);
                assert_eq!(line, 2);
                assert_eq!(field, 1);
                assert_eq!(value, "zzz");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_row_is_fatal() {
        let dir = TempDir::new().unwrap();
        populate_minimal(&dir);
        write_file(&dir, GROUP_CSV, "64,40,20\n");
        let err = load_summary(dir.path()).unwrap_err();
        assert!(matches!(err, IngestError::ShortRow { line: 1, .. }));
    }

    #[test]
    fn empty_superblock_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        populate_minimal(&dir);
        write_file(&dir, SUPER_CSV, "");
        let err = load_summary(dir.path()).unwrap_err();
        assert!(matches!(err, IngestError::MissingRecord { .. }));
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        populate_minimal(&dir);
        fs::remove_file(dir.path().join(INODE_CSV)).unwrap();
        let err = load_summary(dir.path()).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[test]
    fn indirect_file_is_optional() {
        let dir = TempDir::new().unwrap();
        let map = load_indirect(dir.path()).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn indirect_rows_decode_block_and_pointer_as_hex() {
        use crate::indirect::IndirectBlockSource;

        let dir = TempDir::new().unwrap();
        write_file(&dir, INDIRECT_CSV, "28,0,32\n28,2,33\n");
        let map = load_indirect(dir.path()).unwrap();
        assert_eq!(map.read_indirect_block(0x28), &[0x32, 0, 0x33]);
    }

    #[test]
    fn indirect_slot_beyond_block_capacity_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, INDIRECT_CSV, "1,18446744073709551615,2\n");
        let err = load_indirect(dir.path()).unwrap_err();
        match err {
            IngestError::ValueOutOfRange {
                file,
                line,
                field,
                value,
                ..
            } => {
                assert_eq!(file, INDIRECT_CSV);
                assert_eq!(line, 1);
                assert_eq!(field, 1);
                assert_eq!(value, u64::MAX);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn indirect_slot_bound_is_inclusive_of_the_last_slot() {
        let dir = TempDir::new().unwrap();
        let last = MAX_INDIRECT_SLOTS - 1;
        write_file(&dir, INDIRECT_CSV, &format!("28,{last},32\n"));
        let map = load_indirect(dir.path()).unwrap();
        assert_eq!(map.len(), 1);

        write_file(&dir, INDIRECT_CSV, &format!("28,{MAX_INDIRECT_SLOTS},32\n"));
        assert!(matches!(
            load_indirect(dir.path()).unwrap_err(),
            IngestError::ValueOutOfRange { .. }
        ));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        populate_minimal(&dir);
        write_file(&dir, BITMAP_CSV, "3,14\n\n4,30\n");
        let summary = load_summary(dir.path()).unwrap();
        assert!(summary.free_inodes.contains(&14));
        assert!(summary.free_blocks.contains(&30));
    }
}
