use thiserror::Error;

/// Errors produced by [`StackTrie`](crate::StackTrie) when the
/// insert-then-finalize contract is violated.
///
/// None of these is recoverable from inside the builder: every variant
/// corresponds to caller misuse, and the trie contents are unspecified after
/// an error is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackTrieError {
    /// Values must be non-empty; the builder does not support deletion.
    #[error("empty value: deletion is not supported")]
    EmptyValue,

    /// The exact key was already inserted. Overwriting is not supported.
    #[error("duplicate key")]
    DuplicateKey,

    /// The key is a strict prefix of an already-inserted key, or an
    /// already-inserted key is a strict prefix of it. Such pairs cannot
    /// coexist in a trie whose leaves carry a terminator flag.
    #[error("key is a prefix of another key")]
    PrefixKey,

    /// The insertion path descends into a subtree that was already collapsed
    /// to its hash, which happens when keys arrive out of order.
    #[error("cannot insert into hashed node")]
    HashedNode,
}
