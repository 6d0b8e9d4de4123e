//! Roots of index-keyed tries, as used for transaction, receipt, and
//! withdrawal lists: item `i` is stored under the key `rlp(i)`.

use crate::{StackTrie, EMPTY_ROOT_HASH};
use alloy_primitives::B256;
use alloy_rlp::Encodable;

#[allow(unused_imports)]
use alloc::vec::Vec;

/// Adjust the index of an item for rlp encoding.
///
/// RLP-encoded indexes do not sort like the indexes themselves: `rlp(0)` is
/// `0x80`, which lands between the single-byte encodings `0x00..=0x7f` and
/// the multi-byte ones. Iterating `i` in `0..len` and inserting item
/// `adjust_index_for_rlp(i, len)` visits the items in ascending key order,
/// which is what [`StackTrie`] requires.
pub const fn adjust_index_for_rlp(i: usize, len: usize) -> usize {
    if i > 0x7f {
        i
    } else if i == 0x7f || i + 1 == len {
        0
    } else {
        i + 1
    }
}

/// Compute a trie root of the collection of rlp encodable items.
pub fn ordered_trie_root<T: Encodable>(items: &[T]) -> B256 {
    ordered_trie_root_with_encoder(items, |item, buf| item.encode(buf))
}

/// Compute a trie root of the collection of items with a custom encoder.
pub fn ordered_trie_root_with_encoder<T, F>(items: &[T], mut encode: F) -> B256
where
    F: FnMut(&T, &mut Vec<u8>),
{
    if items.is_empty() {
        return EMPTY_ROOT_HASH;
    }

    let mut value_buffer = Vec::new();

    let mut trie = StackTrie::new();
    let items_len = items.len();
    for i in 0..items_len {
        let index = adjust_index_for_rlp(i, items_len);

        let index_buffer = alloy_rlp::encode_fixed_size(&index);

        value_buffer.clear();
        encode(&items[index], &mut value_buffer);

        trie.update(&index_buffer, &value_buffer)
            .expect("index keys are distinct, prefix-free, and visited in order");
    }

    trie.root()
}

/// Compute a trie root of the collection of pre-encoded items.
///
/// This is an optimized version of [`ordered_trie_root_with_encoder`] for
/// items that are already encoded as rlp (for example EIP-2718 transactions).
///
/// Returns [`EMPTY_ROOT_HASH`] if the collection is empty.
pub fn ordered_trie_root_encoded<T>(items: &[T]) -> B256
where
    T: AsRef<[u8]>,
{
    if items.is_empty() {
        return EMPTY_ROOT_HASH;
    }

    let mut trie = StackTrie::new();
    let items_len = items.len();
    for i in 0..items_len {
        let index = adjust_index_for_rlp(i, items_len);

        let index_buffer = alloy_rlp::encode_fixed_size(&index);

        trie.update(&index_buffer, items[index].as_ref())
            .expect("index keys are distinct, prefix-free, and visited in order");
    }

    trie.root()
}
