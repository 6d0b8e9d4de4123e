use super::{rlp::RlpNode, unpack_path_to_nibbles};
use alloy_primitives::{hex, Bytes};
use alloy_rlp::{length_of_length, BufMut, Decodable, Encodable, Header};
use core::fmt;
use nybbles::Nibbles;

#[allow(unused_imports)]
use alloc::vec::Vec;

/// An extension node carries a run of nibbles shared by every key below it,
/// followed by the reference of its single child. It compresses what would
/// otherwise be a chain of single-child branches into one node.
#[derive(PartialEq, Eq, Clone)]
pub struct ExtensionNode {
    /// The key for this extension node.
    pub key: Nibbles,
    /// A reference to the child node.
    pub child: Vec<u8>,
}

impl fmt::Debug for ExtensionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionNode")
            .field("key", &self.key)
            .field("child", &hex::encode(&self.child))
            .finish()
    }
}

impl Encodable for ExtensionNode {
    fn encode(&self, out: &mut dyn BufMut) {
        self.as_ref().encode(out)
    }

    fn length(&self) -> usize {
        self.as_ref().length()
    }
}

impl Decodable for ExtensionNode {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut bytes = Header::decode_bytes(buf, true)?;

        let encoded_key = Bytes::decode(&mut bytes)?;
        if encoded_key.is_empty() {
            return Err(alloy_rlp::Error::Custom("extension node key empty"));
        }

        // Retrieve first byte. If it's [Some], then the nibbles are odd.
        let first = match encoded_key[0] & 0xf0 {
            0x10 => Some(encoded_key[0] & 0x0f),
            0x00 => None,
            _ => return Err(alloy_rlp::Error::Custom("node is not extension")),
        };

        let key = unpack_path_to_nibbles(first, &encoded_key[1..]);
        let child = Vec::from(bytes);
        Ok(Self { key, child })
    }
}

impl ExtensionNode {
    /// Creates a new extension node with the given key and a reference to the
    /// child.
    pub const fn new(key: Nibbles, child: Vec<u8>) -> Self {
        Self { key, child }
    }

    /// Return extension node as [ExtensionNodeRef].
    pub fn as_ref(&self) -> ExtensionNodeRef<'_> {
        ExtensionNodeRef { key: &self.key, child: &self.child }
    }
}

/// Reference to the extension node. See [ExtensionNode] for more information.
pub struct ExtensionNodeRef<'a> {
    /// The key for this extension node.
    pub key: &'a Nibbles,
    /// A reference to the child node.
    pub child: &'a [u8],
}

impl fmt::Debug for ExtensionNodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionNodeRef")
            .field("key", &self.key)
            .field("child", &hex::encode(self.child))
            .finish()
    }
}

impl Encodable for ExtensionNodeRef<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.rlp_payload_length() }.encode(out);
        self.key.encode_path_leaf(false).as_slice().encode(out);
        // The child reference is already in RLP form, splice it in verbatim.
        out.put_slice(self.child);
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + length_of_length(payload_length)
    }
}

impl<'a> ExtensionNodeRef<'a> {
    /// Creates a new extension node with the given key and a reference to the
    /// child.
    pub const fn new(key: &'a Nibbles, child: &'a [u8]) -> Self {
        Self { key, child }
    }

    /// RLP encodes the node and returns either `rlp(node)` or
    /// `rlp(keccak(rlp(node)))`.
    pub fn rlp(&self, buf: &mut Vec<u8>) -> RlpNode {
        self.encode(buf);
        RlpNode::from_rlp(buf)
    }

    /// Returns the length of RLP encoded fields of extension node.
    fn rlp_payload_length(&self) -> usize {
        let mut encoded_key_len = self.key.len() / 2 + 1;
        // For extension nodes the first byte cannot be greater than 0x80.
        if encoded_key_len != 1 {
            encoded_key_len += length_of_length(encoded_key_len);
        }
        encoded_key_len + self.child.len()
    }
}
