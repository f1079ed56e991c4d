//! Byte-addressed access to the set file: header fields, node fields, and
//! the bump allocator.
//!
//! Every accessor seeks to an absolute offset and reads or writes one
//! fixed-width little-endian integer (or the payload blob). Header fields are
//! re-read on every call — the file is the single source of truth, nothing is
//! cached across operations.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::Result;
use crate::format::{
    COUNT_POS, HEADER_LEN, NEXT_FREE_POS, NIL, NODE_HEIGHT, NODE_LEFT, NODE_PAYLOAD,
    NODE_PAYLOAD_LEN, NODE_RIGHT, ROOT_POS,
};

/// Random-access handle over the single set file.
///
/// Read accessors for node fields tolerate the [`NIL`] sentinel and answer
/// with the absent-child convention (`NIL` children, height −1). Writes
/// through `NIL` are a caller bug and are rejected in debug builds.
pub(crate) struct NodeStore {
    file: File,
}

impl NodeStore {
    /// Opens or creates the file. An empty file gets a fresh header: zero
    /// elements, next-free at the end of the header, and the root pointing
    /// at next-free (the sentinel for "first node goes here"). A non-empty
    /// file's header is trusted as-is.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let mut store = Self { file };
        if store.file_len()? == 0 {
            store.set_count(0)?;
            store.set_next_free(HEADER_LEN as i64)?;
            store.set_root(HEADER_LEN as i64)?;
        }
        Ok(store)
    }

    fn read_i64_at(&mut self, pos: u64) -> Result<i64> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(self.file.read_i64::<LittleEndian>()?)
    }

    fn write_i64_at(&mut self, pos: u64, value: i64) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_i64::<LittleEndian>(value)?;
        Ok(())
    }

    fn read_i32_at(&mut self, pos: u64) -> Result<i32> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(self.file.read_i32::<LittleEndian>()?)
    }

    fn write_i32_at(&mut self, pos: u64, value: i32) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_i32::<LittleEndian>(value)?;
        Ok(())
    }

    // -------------------- header fields --------------------

    pub fn count(&mut self) -> Result<i64> {
        self.read_i64_at(COUNT_POS)
    }

    pub fn set_count(&mut self, count: i64) -> Result<()> {
        self.write_i64_at(COUNT_POS, count)
    }

    pub fn next_free(&mut self) -> Result<i64> {
        self.read_i64_at(NEXT_FREE_POS)
    }

    pub fn set_next_free(&mut self, pos: i64) -> Result<()> {
        self.write_i64_at(NEXT_FREE_POS, pos)
    }

    pub fn root(&mut self) -> Result<i64> {
        self.read_i64_at(ROOT_POS)
    }

    pub fn set_root(&mut self, off: i64) -> Result<()> {
        self.write_i64_at(ROOT_POS, off)
    }

    // -------------------- node fields --------------------

    pub fn left(&mut self, off: i64) -> Result<i64> {
        if off < 0 {
            return Ok(NIL);
        }
        self.read_i64_at(off as u64 + NODE_LEFT)
    }

    pub fn set_left(&mut self, off: i64, child: i64) -> Result<()> {
        debug_assert!(off >= 0, "write through nil offset");
        self.write_i64_at(off as u64 + NODE_LEFT, child)
    }

    pub fn right(&mut self, off: i64) -> Result<i64> {
        if off < 0 {
            return Ok(NIL);
        }
        self.read_i64_at(off as u64 + NODE_RIGHT)
    }

    pub fn set_right(&mut self, off: i64, child: i64) -> Result<()> {
        debug_assert!(off >= 0, "write through nil offset");
        self.write_i64_at(off as u64 + NODE_RIGHT, child)
    }

    /// Stored height of the subtree rooted at `off`; −1 for an absent child.
    pub fn height(&mut self, off: i64) -> Result<i32> {
        if off < 0 {
            return Ok(-1);
        }
        self.read_i32_at(off as u64 + NODE_HEIGHT)
    }

    pub fn set_height(&mut self, off: i64, height: i32) -> Result<()> {
        debug_assert!(off >= 0, "write through nil offset");
        self.write_i32_at(off as u64 + NODE_HEIGHT, height)
    }

    /// Payload byte length of the node at `off`; −1 for an absent child.
    pub fn payload_len(&mut self, off: i64) -> Result<i32> {
        if off < 0 {
            return Ok(-1);
        }
        self.read_i32_at(off as u64 + NODE_PAYLOAD_LEN)
    }

    pub fn read_payload(&mut self, off: i64) -> Result<Vec<u8>> {
        debug_assert!(off >= 0, "payload read through nil offset");
        let len = self.payload_len(off)?;
        let mut buf = vec![0u8; len as usize];
        self.file.seek(SeekFrom::Start(off as u64 + NODE_PAYLOAD))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Writes the payload length and bytes at `off` and returns the offset
    /// of the first byte past the node's tail. Payload bytes are write-once.
    fn write_payload(&mut self, off: i64, payload: &[u8]) -> Result<i64> {
        debug_assert!(off >= 0, "write through nil offset");
        self.write_i32_at(off as u64 + NODE_PAYLOAD_LEN, payload.len() as i32)?;
        self.file.seek(SeekFrom::Start(off as u64 + NODE_PAYLOAD))?;
        self.file.write_all(payload)?;
        Ok(self.file.stream_position()? as i64)
    }

    // -------------------- allocation --------------------

    /// Appends a fresh leaf node (nil children, height 0) holding `payload`
    /// at the next-free offset, advances next-free past the node's tail, and
    /// returns the node's offset. Offsets are never reused and nothing is
    /// ever compacted.
    pub fn allocate(&mut self, payload: &[u8]) -> Result<i64> {
        let off = self.next_free()?;
        self.set_left(off, NIL)?;
        self.set_right(off, NIL)?;
        self.set_height(off, 0)?;
        let tail = self.write_payload(off, payload)?;
        self.set_next_free(tail)?;
        Ok(off)
    }

    // -------------------- misc --------------------

    pub fn file_len(&mut self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
