//! # DiskSet — a disk-resident, self-balancing ordered set
//!
//! A height-balanced (AVL) ordered set whose entire state — tree topology,
//! payloads, metadata — lives in a single append-growing file. No
//! significant portion of the tree is mirrored in memory, so the set scales
//! to workloads where an in-memory ordered set would not fit. Inserts,
//! membership tests, and ordered neighbor queries all cost O(log n) node
//! reads.
//!
//! Entries can never be removed: the node allocator only appends, and
//! freeing nodes would either leak file space or require compaction. The
//! removal-family operations exist but always fail with
//! [`Error::Unsupported`]. There is also no journaling and no cross-process
//! lock protocol — a torn write mid-insert can leave the file inconsistent,
//! and callers treat that as fatal for the file.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ HEADER (24 bytes)                             │
//! │                                               │
//! │ count (i64) | next_free (i64) | root (i64)    │
//! ├───────────────────────────────────────────────┤
//! │ NODE RECORDS (allocation order)               │
//! │                                               │
//! │ left (i64) | right (i64) | height (i32)       │
//! │ payload_len (i32) | payload bytes             │
//! │                                               │
//! │ ... repeated for each inserted element ...    │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Child pointers hold absolute byte
//! offsets; −1 marks an absent child. While the set is empty the root field
//! equals next-free (the offset the first node will be written to) and must
//! not be dereferenced.
//!
//! ## Example
//! ```rust
//! use codec::I64Codec;
//! use diskset::DiskSet;
//!
//! let dir = tempfile::tempdir()?;
//! let mut set = DiskSet::open(dir.path().join("ints.set"), I64Codec)?;
//!
//! assert!(set.add(&42)?);
//! assert!(!set.add(&42)?);
//! assert!(set.contains(&42)?);
//! assert_eq!(set.ceiling(&40)?, Some(42));
//! assert_eq!(set.higher(&42)?, None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Concurrency
//!
//! One logical actor drives one set at a time: every operation takes
//! `&mut self`, so exclusive access is enforced at compile time. Callers
//! that share a set across threads wrap it in a [`std::sync::Mutex`] and
//! hold the guard for whole operations, including each iterator step.
//! Opening the same file through two handles (or two processes) is
//! unsupported.

mod error;
pub mod format;
mod iter;
mod store;
mod tree;
mod verify;

pub use error::{Error, Result};
pub use iter::Iter;
pub use tree::DiskSet;
pub use verify::TreeStats;
