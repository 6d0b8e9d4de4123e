use crate::{
    nodes::{BranchNodeRef, ExtensionNodeRef, LeafNode, RlpNode},
    Nibbles, TrieMask,
};
use core::fmt;
use smallvec::SmallVec;
use tracing::trace;

#[allow(unused_imports)]
use alloc::{boxed::Box, vec::Vec};

/// A resident node of the in-progress trie.
///
/// Every node is in one of five states. Insertion rewrites the states along
/// the descent path; the collapse step moves any of the first four states
/// into [`StackNode::Hashed`], which is terminal.
#[derive(Clone, PartialEq, Eq)]
pub(crate) enum StackNode {
    /// No entry has reached this position yet. Occurs only as the initial
    /// root and as a momentary intermediate during rewrites.
    Empty,
    /// The remaining key suffix below this position together with its value.
    Leaf(LeafNode),
    /// A run of nibbles shared by every key below, leading to a single child.
    Extension {
        /// The shared nibble run.
        key: Nibbles,
        /// The sole child, a branch or an already collapsed subtree.
        child: Box<StackNode>,
    },
    /// A fan-out over the next nibble of the key. Each slot exclusively owns
    /// its subtree.
    Branch {
        /// Child slots indexed by nibble.
        children: [Option<Box<StackNode>>; 16],
    },
    /// A collapsed subtree, reduced to its reference form: its Keccak-256
    /// when the encoding is 32 bytes or longer, the raw encoding otherwise.
    Hashed(RlpNode),
}

impl Default for StackNode {
    #[inline]
    fn default() -> Self {
        Self::Empty
    }
}

impl fmt::Debug for StackNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Leaf(leaf) => f.debug_tuple("Leaf").field(leaf).finish(),
            Self::Extension { key, child } => {
                f.debug_struct("Extension").field("key", key).field("child", child).finish()
            }
            Self::Branch { children } => {
                write!(f, "Branch ")?;
                f.debug_map()
                    .entries(
                        children.iter().enumerate().filter_map(|(i, c)| c.as_ref().map(|c| (i, c))),
                    )
                    .finish()
            }
            Self::Hashed(rlp) => f.debug_tuple("Hashed").field(rlp).finish(),
        }
    }
}

impl StackNode {
    /// Whether this subtree was already collapsed.
    #[inline]
    pub(crate) const fn is_hashed(&self) -> bool {
        matches!(self, Self::Hashed(_))
    }

    /// Collapses this subtree in place: computes its reference form and
    /// replaces the node with a terminal stub, releasing all descendants.
    pub(crate) fn commit(&mut self, rlp_buf: &mut Vec<u8>) {
        let rlp = self.rlp_node(rlp_buf);
        trace!(target: "trie::stacktrie", node = ?rlp, "collapsed subtree");
        *self = Self::Hashed(rlp);
    }

    /// Computes the canonical reference of this node, encoding it post-order.
    ///
    /// Branch children are released as soon as their reference has been
    /// taken; the caller is expected to replace `self` wholesale afterwards.
    pub(crate) fn rlp_node(&mut self, rlp_buf: &mut Vec<u8>) -> RlpNode {
        match self {
            Self::Empty => RlpNode::empty_string(),
            Self::Hashed(rlp) => *rlp,
            Self::Leaf(leaf) => {
                rlp_buf.clear();
                leaf.as_ref().rlp(rlp_buf)
            }
            Self::Extension { key, child } => {
                let child_rlp = child.rlp_node(rlp_buf);
                rlp_buf.clear();
                ExtensionNodeRef::new(key, &child_rlp).rlp(rlp_buf)
            }
            Self::Branch { children } => {
                let mut state_mask = TrieMask::default();
                let mut stack = SmallVec::<[RlpNode; 16]>::new();
                for (index, slot) in children.iter_mut().enumerate() {
                    if let Some(child) = slot {
                        stack.push(child.rlp_node(rlp_buf));
                        state_mask.set_bit(index as u8);
                        // The reference is all the parent needs.
                        *slot = None;
                    }
                }
                rlp_buf.clear();
                BranchNodeRef::new(&stack, state_mask).rlp(rlp_buf)
            }
        }
    }
}

#[cfg(test)]
impl StackNode {
    /// Number of resident nodes that still own their full representation.
    pub(crate) fn live_nodes(&self) -> usize {
        match self {
            Self::Empty | Self::Hashed(_) => 0,
            Self::Leaf(_) => 1,
            Self::Extension { child, .. } => 1 + child.live_nodes(),
            Self::Branch { children } => {
                1 + children.iter().flatten().map(|child| child.live_nodes()).sum::<usize>()
            }
        }
    }

    /// Asserts that in every branch, all occupied slots left of the rightmost
    /// occupied slot hold collapsed subtrees.
    pub(crate) fn assert_left_collapsed(&self) {
        match self {
            Self::Branch { children } => {
                let rightmost = children.iter().rposition(Option::is_some).unwrap();
                for (index, child) in children.iter().enumerate() {
                    if let Some(child) = child {
                        assert!(
                            index == rightmost || child.is_hashed(),
                            "live subtree at slot {index} left of the active slot {rightmost}",
                        );
                        child.assert_left_collapsed();
                    }
                }
            }
            Self::Extension { child, .. } => child.assert_left_collapsed(),
            _ => {}
        }
    }
}
