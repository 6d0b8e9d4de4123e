#![doc = include_str!("../README.md")]
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

extern crate alloc;

pub mod nodes;

pub mod stack_trie;
pub use stack_trie::StackTrie;

pub mod root;

mod mask;
pub use mask::TrieMask;

mod error;
pub use error::StackTrieError;

#[cfg(test)]
pub(crate) mod triehash_compat;
#[cfg(test)]
pub(crate) use triehash_compat::triehash_trie_root;

pub use nybbles::Nibbles;

/// Root hash of an empty trie: the Keccak-256 of the RLP empty string.
pub const EMPTY_ROOT_HASH: alloy_primitives::B256 =
    alloy_primitives::b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");
