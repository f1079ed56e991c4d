//! Structural integrity checking.
//!
//! Walks the whole file twice — once in allocation order, once from the
//! root — and cross-checks every structural invariant: ordering, AVL
//! balance, stored heights, header count, and the equality of the reachable
//! node set with the allocated node set. Backs the property tests and gives
//! operators a way to audit a file before trusting it.

use codec::PayloadCodec;

use crate::error::{Error, Result};
use crate::format::{node_len, HEADER_LEN, NIL};
use crate::tree::DiskSet;

/// Aggregate facts gathered by [`DiskSet::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes reachable from the root.
    pub nodes: u64,
    /// Height of the root subtree; −1 for an empty set.
    pub height: i32,
}

impl<C: PayloadCodec> DiskSet<C> {
    /// Audits the file's structural invariants.
    ///
    /// Fails with [`Error::Corrupt`] on the first violation found:
    /// - next-free must sit exactly at the end of the file and at the end
    ///   of the last allocated node;
    /// - an empty set's root must equal next-free (the root sentinel);
    /// - values must strictly increase in-order (which also rules out
    ///   duplicates);
    /// - every stored height must equal 1 + max(child heights) and the two
    ///   child heights may differ by at most 1;
    /// - the header count must equal the number of reachable nodes;
    /// - the set of nodes reachable from the root must equal the set of
    ///   allocated nodes (tree topology, no sharing, no orphans).
    pub fn verify(&mut self) -> Result<TreeStats> {
        let count = self.store().count()?;
        let next_free = self.store().next_free()?;
        let root = self.store().root()?;
        let file_len = self.store().file_len()?;

        if next_free as u64 != file_len {
            return Err(Error::Corrupt(format!(
                "next-free {next_free} does not match file length {file_len}"
            )));
        }

        // Scan nodes in allocation order.
        let mut allocated = Vec::new();
        let mut pos = HEADER_LEN as i64;
        while pos < next_free {
            allocated.push(pos);
            let len = self.store().payload_len(pos)?;
            if len < 0 {
                return Err(Error::Corrupt(format!(
                    "negative payload length at offset {pos}"
                )));
            }
            pos += node_len(len as u32) as i64;
        }
        if pos != next_free {
            return Err(Error::Corrupt(format!(
                "allocation scan ended at {pos}, expected next-free {next_free}"
            )));
        }

        if count == 0 {
            if root != next_free {
                return Err(Error::Corrupt(format!(
                    "empty set root {root} is not the next-free sentinel {next_free}"
                )));
            }
            if !allocated.is_empty() {
                return Err(Error::Corrupt(format!(
                    "empty set but {} nodes allocated",
                    allocated.len()
                )));
            }
            return Ok(TreeStats {
                nodes: 0,
                height: -1,
            });
        }

        // Walk the tree and check order, balance, and stored heights.
        let mut reachable = Vec::new();
        let (nodes, height) = self.verify_subtree(root, None, None, &mut reachable)?;

        if nodes != count as u64 {
            return Err(Error::Corrupt(format!(
                "header count {count} but {nodes} nodes reachable from root"
            )));
        }
        reachable.sort_unstable();
        if reachable != allocated {
            return Err(Error::Corrupt(
                "reachable node set differs from allocated node set".to_string(),
            ));
        }

        Ok(TreeStats { nodes, height })
    }

    /// Post-order check of one subtree; returns its node count and height.
    /// `lo`/`hi` are the exclusive bounds inherited from ancestors.
    fn verify_subtree(
        &mut self,
        off: i64,
        lo: Option<&C::Value>,
        hi: Option<&C::Value>,
        reachable: &mut Vec<i64>,
    ) -> Result<(u64, i32)> {
        if off == NIL {
            return Ok((0, -1));
        }
        reachable.push(off);

        let value = self.decode_at(off)?;
        if let Some(lo) = lo {
            if value <= *lo {
                return Err(Error::Corrupt(format!(
                    "ordering violation at offset {off}: value not above its lower bound"
                )));
            }
        }
        if let Some(hi) = hi {
            if value >= *hi {
                return Err(Error::Corrupt(format!(
                    "ordering violation at offset {off}: value not below its upper bound"
                )));
            }
        }

        let left = self.store().left(off)?;
        let right = self.store().right(off)?;
        let (ln, lh) = self.verify_subtree(left, lo, Some(&value), reachable)?;
        let (rn, rh) = self.verify_subtree(right, Some(&value), hi, reachable)?;

        if (lh - rh).abs() > 1 {
            return Err(Error::Corrupt(format!(
                "balance violation at offset {off}: child heights {lh} and {rh}"
            )));
        }
        let stored = self.store().height(off)?;
        if stored != 1 + lh.max(rh) {
            return Err(Error::Corrupt(format!(
                "stale height at offset {off}: stored {stored}, computed {}",
                1 + lh.max(rh)
            )));
        }

        Ok((ln + rn + 1, stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};
    use codec::I64Codec;
    use std::io::{Seek, SeekFrom};
    use tempfile::tempdir;

    #[test]
    fn fresh_file_verifies_empty() {
        let dir = tempdir().unwrap();
        let mut set = DiskSet::open(dir.path().join("t.set"), I64Codec).unwrap();
        let stats = set.verify().unwrap();
        assert_eq!(
            stats,
            TreeStats {
                nodes: 0,
                height: -1
            }
        );
    }

    #[test]
    fn populated_set_verifies() {
        let dir = tempdir().unwrap();
        let mut set = DiskSet::open(dir.path().join("t.set"), I64Codec).unwrap();
        for v in 0..64i64 {
            set.add(&v).unwrap();
            set.verify().unwrap();
        }
        let stats = set.verify().unwrap();
        assert_eq!(stats.nodes, 64);
        assert!(stats.height >= 6 && stats.height <= 8);
    }

    #[test]
    fn stale_height_is_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.set");
        let mut set = DiskSet::open(&path, I64Codec).unwrap();
        for v in [2i64, 1, 3] {
            set.add(&v).unwrap();
        }
        set.close().unwrap();

        // Clobber the root node's height field (offset 24 + 16).
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap();
        file.seek(SeekFrom::Start(24 + 16)).unwrap();
        file.write_i32::<LittleEndian>(9).unwrap();
        drop(file);

        let mut set = DiskSet::open(&path, I64Codec).unwrap();
        assert!(matches!(set.verify(), Err(Error::Corrupt(_))));
    }

    #[test]
    fn truncated_tail_is_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.set");
        let mut set = DiskSet::open(&path, I64Codec).unwrap();
        for v in [2i64, 1, 3] {
            set.add(&v).unwrap();
        }
        set.close().unwrap();

        // Chop off the last node; next-free now points past the end.
        let file = std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap();
        let len = file.metadata().unwrap().len();
        file.set_len(len - 8).unwrap();
        drop(file);

        let mut set = DiskSet::open(&path, I64Codec).unwrap();
        assert!(matches!(set.verify(), Err(Error::Corrupt(_))));
    }
}
