//! The canonical byte forms of trie nodes.
//!
//! Every node encodes to an RLP item: a leaf is the two-item list
//! `[HP(key, leaf), value]`, an extension is `[HP(key, ext), child]`, and a
//! branch is the 17-item list of its sixteen child references followed by an
//! always-empty value slot. A node's reference in its parent is the encoding
//! itself when strictly shorter than 32 bytes, and the 32-byte Keccak-256 of
//! the encoding otherwise (see [`RlpNode`]).

use core::ops::Range;
use nybbles::Nibbles;

#[allow(unused_imports)]
use alloc::vec::Vec;

mod branch;
pub use branch::BranchNodeRef;

mod extension;
pub use extension::{ExtensionNode, ExtensionNodeRef};

mod leaf;
pub use leaf::{LeafNode, LeafNodeRef};

mod rlp;
pub use rlp::RlpNode;

/// The range of valid child indexes.
pub const CHILD_INDEX_RANGE: Range<u8> = 0..16;

/// Unpack a Hex-Prefix encoded path to nibbles.
///
/// ## Arguments
///
/// `first` - first nibble of the path if its length is odd
/// `rest` - rest of the nibbles packed two per byte, high nibble first
pub(crate) fn unpack_path_to_nibbles(first: Option<u8>, rest: &[u8]) -> Nibbles {
    let rest = rest.iter().flat_map(|byte| [byte >> 4, byte & 0x0f]);
    Nibbles::from_vec_unchecked(first.into_iter().chain(rest).collect::<Vec<u8>>())
}
