use super::{rlp::RlpNode, CHILD_INDEX_RANGE};
use crate::TrieMask;
use alloy_rlp::{length_of_length, BufMut, Encodable, Header, EMPTY_STRING_CODE};
use core::fmt;

#[allow(unused_imports)]
use alloc::vec::Vec;

/// A reference to a branch node's children, ready for encoding.
///
/// A branch node encodes as a 17-item list: one slot per nibble holding the
/// child's reference (or the empty string for absent children) and a final
/// value slot. This builder never stores values at internal nodes, so the
/// value slot is always the empty string.
#[derive(Clone)]
pub struct BranchNodeRef<'a> {
    /// References of the present children, in ascending nibble order.
    pub stack: &'a [RlpNode],
    /// The bitmask indicating the presence of children at the respective
    /// nibble positions.
    pub state_mask: TrieMask,
}

impl fmt::Debug for BranchNodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchNodeRef")
            .field("stack", &self.stack)
            .field("state_mask", &self.state_mask)
            .finish()
    }
}

impl Encodable for BranchNodeRef<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        debug_assert_eq!(self.stack.len(), self.state_mask.count_ones() as usize);
        Header { list: true, payload_length: self.rlp_payload_length() }.encode(out);

        // Extend the RLP buffer with the present children.
        let mut stack_ptr = 0;
        for index in CHILD_INDEX_RANGE {
            if self.state_mask.is_bit_set(index) {
                out.put_slice(&self.stack[stack_ptr]);
                stack_ptr += 1;
            } else {
                out.put_u8(EMPTY_STRING_CODE);
            }
        }

        // The value slot.
        out.put_u8(EMPTY_STRING_CODE);
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        payload_length + length_of_length(payload_length)
    }
}

impl<'a> BranchNodeRef<'a> {
    /// Creates a new branch node reference from the child references and the
    /// mask of occupied slots.
    pub const fn new(stack: &'a [RlpNode], state_mask: TrieMask) -> Self {
        Self { stack, state_mask }
    }

    /// RLP encodes the node and returns either `rlp(node)` or
    /// `rlp(keccak(rlp(node)))`.
    pub fn rlp(&self, buf: &mut Vec<u8>) -> RlpNode {
        self.encode(buf);
        RlpNode::from_rlp(buf)
    }

    /// Returns the length of RLP encoded fields of branch node.
    fn rlp_payload_length(&self) -> usize {
        let mut payload_length = 1;
        let mut stack_ptr = 0;
        for digit in CHILD_INDEX_RANGE {
            if self.state_mask.is_bit_set(digit) {
                payload_length += self.stack[stack_ptr].len();
                stack_ptr += 1;
            } else {
                payload_length += 1;
            }
        }
        payload_length
    }
}
