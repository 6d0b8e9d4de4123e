use alloy_primitives::{hex, keccak256, B256};
use alloy_rlp::EMPTY_STRING_CODE;
use core::fmt;
use core::mem::MaybeUninit;

const MAX: usize = 33;

/// The reference form of an encoded node: either the node's raw encoding
/// (when strictly shorter than 32 bytes) or its 32-byte Keccak-256 prefixed
/// with the RLP string header `0xa0`.
///
/// Internally stores a `u8` length and a `[MaybeUninit<u8>; 33]` buffer, so
/// references are plain 34-byte values that can be copied into a parent's
/// payload without touching the allocator.
pub struct RlpNode {
    len: u8,
    buf: [MaybeUninit<u8>; MAX],
}

impl Copy for RlpNode {}

impl Clone for RlpNode {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl PartialEq for RlpNode {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for RlpNode {}

impl core::ops::Deref for RlpNode {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for RlpNode {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for RlpNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RlpNode({})", hex::encode_prefixed(self.as_slice()))
    }
}

impl RlpNode {
    /// Creates a new RLP-encoded node from the given data.
    ///
    /// Returns `None` if the data is too large (greater than 33 bytes).
    #[inline]
    pub const fn from_raw(data: &[u8]) -> Option<Self> {
        let len = data.len();
        if len > MAX {
            return None;
        }
        let mut buf = [MaybeUninit::uninit(); MAX];
        // SAFETY: `len <= MAX`, so `data` fits in `buf`.
        unsafe {
            core::ptr::copy_nonoverlapping(data.as_ptr(), buf.as_mut_ptr().cast(), len);
        }
        Some(Self { len: len as u8, buf })
    }

    /// Given an RLP-encoded node, returns it either as `rlp(node)` or
    /// `rlp(keccak(rlp(node)))`.
    #[inline]
    pub fn from_rlp(rlp: &[u8]) -> Self {
        if rlp.len() < 32 {
            // SAFETY: `rlp` is less than max capacity (33).
            unsafe { Self::from_raw(rlp).unwrap_unchecked() }
        } else {
            Self::word_rlp(&keccak256(rlp))
        }
    }

    /// RLP-encodes the given word and returns it as a new RLP node.
    #[inline]
    pub const fn word_rlp(word: &B256) -> Self {
        let mut buf = [MaybeUninit::uninit(); MAX];
        buf[0] = MaybeUninit::new(EMPTY_STRING_CODE + 32);
        // SAFETY: Writing 32 bytes at offset 1 within a 33-byte buffer.
        unsafe {
            core::ptr::copy_nonoverlapping(
                word.as_slice().as_ptr(),
                buf.as_mut_ptr().add(1).cast(),
                32,
            );
        }
        Self { len: MAX as u8, buf }
    }

    /// The RLP encoding of the empty string, i.e. the reference of an absent
    /// node.
    #[inline]
    pub const fn empty_string() -> Self {
        let mut buf = [MaybeUninit::uninit(); MAX];
        buf[0] = MaybeUninit::new(EMPTY_STRING_CODE);
        Self { len: 1, buf }
    }

    /// Returns true if this is an RLP-encoded hash.
    #[inline]
    pub fn is_hash(&self) -> bool {
        self.len() == B256::len_bytes() + 1
    }

    /// Returns the RLP-encoded node as a slice.
    #[inline]
    pub const fn as_slice(&self) -> &[u8] {
        // SAFETY: `self.buf[..self.len]` is always initialized.
        unsafe { core::slice::from_raw_parts(self.buf.as_ptr().cast(), self.len as usize) }
    }

    /// Returns hash if this is an RLP-encoded hash.
    #[inline]
    pub fn as_hash(&self) -> Option<B256> {
        if self.is_hash() {
            Some(B256::from_slice(&self.as_slice()[1..]))
        } else {
            None
        }
    }
}
