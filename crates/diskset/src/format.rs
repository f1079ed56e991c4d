//! Binary layout constants for the set file.
//!
//! The file is a single append-growing byte array: a fixed 24-byte header
//! followed by variable-sized node records in allocation order.
//!
//! ```text
//! [count: i64 LE][next_free: i64 LE][root: i64 LE]
//! ```
//!
//! Each node record, starting at the offset stored in the header's root
//! field or in another node's child pointer:
//!
//! ```text
//! [left: i64 LE][right: i64 LE][height: i32 LE][payload_len: i32 LE][payload]
//! ```
//!
//! All integers are fixed-width two's-complement little-endian. Offsets are
//! absolute byte positions; [`NIL`] marks an absent child.

/// Sentinel offset for an absent child; its conventional subtree height is −1.
pub const NIL: i64 = -1;

/// Size of the fixed header prefix. The first node lands immediately after.
pub const HEADER_LEN: u64 = 24;

/// Absolute position of the element count (i64).
pub const COUNT_POS: u64 = 0;

/// Absolute position of the next-free offset (i64), the first unused byte
/// past the highest-addressed node.
pub const NEXT_FREE_POS: u64 = 8;

/// Absolute position of the root node offset (i64). While the set is empty
/// this equals next-free and must not be dereferenced.
pub const ROOT_POS: u64 = 16;

/// Left child offset, relative to the node start (i64).
pub const NODE_LEFT: u64 = 0;

/// Right child offset, relative to the node start (i64).
pub const NODE_RIGHT: u64 = 8;

/// Subtree height, relative to the node start (i32). Leaf = 0.
pub const NODE_HEIGHT: u64 = 16;

/// Payload byte length, relative to the node start (i32).
pub const NODE_PAYLOAD_LEN: u64 = 20;

/// Payload bytes, relative to the node start.
pub const NODE_PAYLOAD: u64 = 24;

/// Total on-disk size of a node holding `payload_len` payload bytes.
pub fn node_len(payload_len: u32) -> u64 {
    NODE_PAYLOAD + payload_len as u64
}
