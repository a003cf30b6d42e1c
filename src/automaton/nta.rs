//! A bottom-up nondeterministic tree automaton over an extended ranked
//! alphabet. Transitions map `(letter, child-state tuple)` to a set of
//! successor states; a leaf's transition key uses an empty child tuple.

use tracing::trace;

use crate::core::alphabet::{ExtendedTreeAlphabet, Letter, TreeAlphabet};
use crate::core::math::{Map, OrderedSet};
use crate::core::tree::EncodedTree;
use crate::error::{Error, Result};

pub type StateId = u32;

#[derive(Clone, Debug)]
pub struct Nta {
    pub base_alphabet: TreeAlphabet,
    pub track_width: usize,
    pub num_states: u32,
    pub accept: OrderedSet<StateId>,
    pub delta: Map<(Letter, Vec<StateId>), OrderedSet<StateId>>,
}

impl Nta {
    pub fn extended_alphabet(&self) -> ExtendedTreeAlphabet {
        ExtendedTreeAlphabet::new(self.base_alphabet.clone(), self.track_width)
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> {
        0..self.num_states
    }

    pub fn successors(&self, letter: &Letter, children: &[StateId]) -> OrderedSet<StateId> {
        self.delta
            .get(&(letter.clone(), children.to_vec()))
            .cloned()
            .unwrap_or_default()
    }

    /// Deterministic iff every `(letter, children)` combination has at
    /// most one successor state.
    pub fn is_deterministic(&self) -> bool {
        self.delta.values().all(|targets| targets.len() <= 1)
    }

    fn check_alphabet(&self, tree: &EncodedTree) -> Result<()> {
        let ext = self.extended_alphabet();
        for node in tree.postorder() {
            if !ext.contains(&node.label) {
                return Err(Error::AlphabetMismatch {
                    reason: format!(
                        "letter `{}` is not in the automaton's Sigma_{}",
                        node.label, self.track_width
                    ),
                });
            }
            match ext.arity(&node.label) {
                Some(declared) if declared == node.arity() => {}
                Some(declared) => {
                    return Err(Error::ArityMismatch {
                        reason: format!(
                            "node {} labelled `{}` has {} children, symbol declares arity {}",
                            node.id,
                            node.label.symbol,
                            node.arity(),
                            declared
                        ),
                    })
                }
                None => {
                    return Err(Error::AlphabetMismatch {
                        reason: format!("symbol `{}` has no declared arity", node.label.symbol),
                    })
                }
            }
        }
        Ok(())
    }

    /// State-set bottom-up run: every node carries the set of states
    /// reachable for the subtree rooted there.
    pub fn try_run(&self, tree: &EncodedTree) -> Result<bool> {
        self.check_alphabet(tree)?;
        let states = self.run_sets(tree);
        Ok(states.iter().any(|q| self.accept.contains(q)))
    }

    fn run_sets(&self, tree: &EncodedTree) -> OrderedSet<StateId> {
        use itertools::Itertools;

        if tree.children.is_empty() {
            return self.successors(&tree.label, &[]);
        }
        let child_sets: Vec<OrderedSet<StateId>> =
            tree.children.iter().map(|c| self.run_sets(c)).collect();
        let mut out = OrderedSet::new();
        for combo in child_sets
            .iter()
            .map(|s| s.iter().copied().collect::<Vec<_>>())
            .multi_cartesian_product()
        {
            out.extend(self.successors(&tree.label, &combo));
        }
        out
    }

    /// Single-path run valid only when the automaton is deterministic.
    pub fn try_run_deterministic(&self, tree: &EncodedTree) -> Result<bool> {
        if !self.is_deterministic() {
            return Err(Error::ArityMismatch {
                reason: "try_run_deterministic called on a nondeterministic automaton".into(),
            });
        }
        self.check_alphabet(tree)?;
        let state = self.run_single(tree);
        Ok(state.map(|q| self.accept.contains(&q)).unwrap_or(false))
    }

    fn run_single(&self, tree: &EncodedTree) -> Option<StateId> {
        let children: Option<Vec<StateId>> = tree
            .children
            .iter()
            .map(|c| self.run_single(c))
            .collect();
        let children = children?;
        self.successors(&tree.label, &children).into_iter().next()
    }

    pub fn accepts(&self, tree: &EncodedTree) -> Result<bool> {
        trace!(nodes = tree.postorder().len(), "running tree against nta");
        self.try_run(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::builder::NtaBuilder;
    use crate::core::alphabet::Bits;

    fn letter(c: char) -> Letter {
        Letter::new(c, Bits::zeros(0))
    }

    #[test_log::test]
    fn accepts_leaf_labelled_a() {
        let base = TreeAlphabet::new([('a', 0), ('b', 1)]);
        let mut b = NtaBuilder::new(base, 0);
        let q0 = b.add_state();
        b.mark_accept(q0);
        b.add_leaf_transition(letter('a'), [q0]);
        let nta = b.build();
        let tree = EncodedTree::leaf(1, letter('a'));
        assert!(nta.try_run(&tree).unwrap());
    }
}
