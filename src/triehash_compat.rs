//! Implementation of hasher using our keccak256 hashing function for
//! compatibility with `triehash` crate, whose recursive builder serves as the
//! reference for root agreement tests.

use alloy_primitives::{keccak256, B256};
use hash_db::Hasher;
use plain_hasher::PlainHasher;

/// A [Hasher] that calculates a keccak256 hash of the given data.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub(crate) struct KeccakHasher;

impl Hasher for KeccakHasher {
    type Out = B256;
    type StdHasher = PlainHasher;

    const LENGTH: usize = 32;

    fn hash(x: &[u8]) -> Self::Out {
        keccak256(x)
    }
}

/// Computes the root of the given entries with `triehash`'s recursive
/// builder. Entries may arrive in any order.
pub(crate) fn triehash_trie_root<I, K, V>(iter: I) -> B256
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]> + Ord,
    V: AsRef<[u8]>,
{
    triehash::trie_root::<KeccakHasher, _, _, _>(iter)
}
