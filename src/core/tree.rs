//! Encoded ranked trees: nodes labelled with an extended-alphabet letter,
//! with exactly as many children as the base symbol's arity dictates.
//! Node ids are caller-assigned and stable, mirroring `Node(label, id,
//! children)` in the treewidth prototype this crate's tree pipeline is
//! grounded on.

use super::alphabet::Letter;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedTree {
    pub id: u32,
    pub label: Letter,
    pub children: Vec<EncodedTree>,
}

impl EncodedTree {
    pub fn leaf(id: u32, label: Letter) -> Self {
        Self {
            id,
            label,
            children: Vec::new(),
        }
    }

    pub fn node(id: u32, label: Letter, children: Vec<EncodedTree>) -> Self {
        Self {
            id,
            label,
            children,
        }
    }

    pub fn arity(&self) -> usize {
        self.children.len()
    }

    /// Post-order iterator: every child before its parent, matching the
    /// bottom-up evaluation order of a nondeterministic tree automaton.
    pub fn postorder(&self) -> Vec<&EncodedTree> {
        let mut out = Vec::new();
        self.postorder_into(&mut out);
        out
    }

    fn postorder_into<'a>(&'a self, out: &mut Vec<&'a EncodedTree>) {
        for child in &self.children {
            child.postorder_into(out);
        }
        out.push(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::Bits;

    #[test_log::test]
    fn postorder_visits_children_before_parent() {
        let leaf1 = EncodedTree::leaf(1, Letter::new('x', Bits::zeros(0)));
        let leaf2 = EncodedTree::leaf(2, Letter::new('x', Bits::zeros(0)));
        let root = EncodedTree::node(3, Letter::new('a', Bits::zeros(0)), vec![leaf1, leaf2]);
        let order: Vec<u32> = root.postorder().iter().map(|n| n.id).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
