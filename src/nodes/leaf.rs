use super::{rlp::RlpNode, unpack_path_to_nibbles};
use alloy_primitives::{hex, Bytes};
use alloy_rlp::{length_of_length, BufMut, Decodable, Encodable, Header};
use core::fmt;
use nybbles::Nibbles;

#[allow(unused_imports)]
use alloc::vec::Vec;

/// A leaf node holds the tail end of a key together with the value stored
/// under the full key. The nibbles above the leaf are implied by its position
/// in the trie; the Hex-Prefix terminator flag marks the stored path as
/// complete.
#[derive(PartialEq, Eq, Clone)]
pub struct LeafNode {
    /// The key suffix for this leaf node.
    pub key: Nibbles,
    /// The value stored under the full key.
    pub value: Vec<u8>,
}

impl fmt::Debug for LeafNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafNode")
            .field("key", &self.key)
            .field("value", &hex::encode(&self.value))
            .finish()
    }
}

impl Encodable for LeafNode {
    fn encode(&self, out: &mut dyn BufMut) {
        self.as_ref().encode(out)
    }

    fn length(&self) -> usize {
        self.as_ref().length()
    }
}

impl Decodable for LeafNode {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut bytes = Header::decode_bytes(buf, true)?;

        let encoded_key = Bytes::decode(&mut bytes)?;
        if encoded_key.is_empty() {
            return Err(alloy_rlp::Error::Custom("leaf node key empty"));
        }

        // Retrieve first byte. If it's [Some], then the nibbles are odd.
        let first = match encoded_key[0] & 0xf0 {
            0x30 => Some(encoded_key[0] & 0x0f),
            0x20 => None,
            _ => return Err(alloy_rlp::Error::Custom("node is not leaf")),
        };

        let key = unpack_path_to_nibbles(first, &encoded_key[1..]);
        let value = Bytes::decode(&mut bytes)?.to_vec();
        Ok(Self { key, value })
    }
}

impl LeafNode {
    /// Creates a new leaf node with the given key and value.
    pub const fn new(key: Nibbles, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    /// Return leaf node as [LeafNodeRef].
    pub fn as_ref(&self) -> LeafNodeRef<'_> {
        LeafNodeRef { key: &self.key, value: &self.value }
    }
}

/// Reference to the leaf node. See [LeafNode] for more information.
pub struct LeafNodeRef<'a> {
    /// The key suffix for this leaf node.
    pub key: &'a Nibbles,
    /// The value stored under the full key.
    pub value: &'a [u8],
}

impl fmt::Debug for LeafNodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafNodeRef")
            .field("key", &self.key)
            .field("value", &hex::encode(self.value))
            .finish()
    }
}

impl Encodable for LeafNodeRef<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.rlp_payload_length() }.encode(out);
        self.key.encode_path_leaf(true).as_slice().encode(out);
        self.value.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + length_of_length(payload_length)
    }
}

impl<'a> LeafNodeRef<'a> {
    /// Creates a new leaf node with the given key and value.
    pub const fn new(key: &'a Nibbles, value: &'a [u8]) -> Self {
        Self { key, value }
    }

    /// RLP encodes the node and returns either `rlp(node)` or
    /// `rlp(keccak(rlp(node)))`.
    pub fn rlp(&self, buf: &mut Vec<u8>) -> RlpNode {
        self.encode(buf);
        RlpNode::from_rlp(buf)
    }

    /// Returns the length of RLP encoded fields of leaf node.
    fn rlp_payload_length(&self) -> usize {
        let mut encoded_key_len = self.key.len() / 2 + 1;
        // For leaf nodes the first byte cannot be greater than 0x80.
        if encoded_key_len != 1 {
            encoded_key_len += length_of_length(encoded_key_len);
        }
        encoded_key_len + Encodable::length(&self.value)
    }
}
