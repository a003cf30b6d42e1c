//! Base automata for the atomic tree predicates. Every construction
//! generalizes to arbitrary arity by taking the cross product of child
//! states over `r` children rather than hard-coding the unary/binary
//! cases; `left`/`right` stay binary-specific since they are only
//! meaningful for arity >= 2 symbols.

use itertools::Itertools;

use crate::automaton::builder::NtaBuilder;
use crate::automaton::nta::Nta;
use crate::core::alphabet::{Bits, Letter, TreeAlphabet};

fn all_letters(base: &TreeAlphabet, k: usize) -> impl Iterator<Item = Letter> + '_ {
    base.symbols()
        .flat_map(move |s| Bits::all(k).map(move |bits| Letter::new(s, bits)))
}

fn child_tuples(num_states: u32, arity: usize) -> Vec<Vec<u32>> {
    if arity == 0 {
        return vec![Vec::new()];
    }
    std::iter::repeat(0..num_states)
        .take(arity)
        .multi_cartesian_product()
        .collect()
}

/// `singl(i)`: exactly one node in the whole tree has track `i` set.
///
/// States: `s0` (zero marks below and here), `s1` (exactly one), `sink`
/// (two or more, rejecting and absorbing).
pub fn singl(track: usize, base: &TreeAlphabet, k: usize) -> Nta {
    const S0: u32 = 0;
    const S1: u32 = 1;
    const SINK: u32 = 2;

    let mut b = NtaBuilder::new(base.clone(), k);
    b.add_state();
    b.add_state();
    b.add_state();
    b.mark_accept(S1);

    for letter in all_letters(base, k) {
        let Some(arity) = base.arity(letter.symbol) else {
            continue;
        };
        let own = if letter.bits.get(track) { 1 } else { 0 };
        for children in child_tuples(3, arity) {
            let target = if children.contains(&SINK) {
                SINK
            } else {
                let below: u32 = children.iter().filter(|&&c| c == S1).count() as u32;
                match own + below {
                    0 => S0,
                    1 => S1,
                    _ => SINK,
                }
            };
            b.add_transition(letter.clone(), children, [target]);
        }
    }
    b.build()
}

/// `P_c(v)`: the node marked `i` carries base symbol `c`.
///
/// States: `p0` (no violation found below or here), `p1` (sink,
/// violation found).
pub fn symb(c: char, track: usize, base: &TreeAlphabet, k: usize) -> Nta {
    const P0: u32 = 0;
    const P1: u32 = 1;

    let mut b = NtaBuilder::new(base.clone(), k);
    b.add_state();
    b.add_state();
    b.mark_accept(P0);

    for letter in all_letters(base, k) {
        let Some(arity) = base.arity(letter.symbol) else {
            continue;
        };
        let own_violation = letter.bits.get(track) && letter.symbol != c;
        for children in child_tuples(2, arity) {
            let target = if own_violation || children.contains(&P1) {
                P1
            } else {
                P0
            };
            b.add_transition(letter.clone(), children, [target]);
        }
    }
    b.build()
}

/// `sub(X,Y)`: every node marked `i` is also marked `j`.
///
/// States: `ok`, `bad` (sink). `in(X,x)` is this specialized to a
/// first-order singleton track.
pub fn sub(i: usize, j: usize, base: &TreeAlphabet, k: usize) -> Nta {
    const OK: u32 = 0;
    const BAD: u32 = 1;

    let mut b = NtaBuilder::new(base.clone(), k);
    b.add_state();
    b.add_state();
    b.mark_accept(OK);

    for letter in all_letters(base, k) {
        let Some(arity) = base.arity(letter.symbol) else {
            continue;
        };
        let own_violation = letter.bits.get(i) && !letter.bits.get(j);
        for children in child_tuples(2, arity) {
            let target = if own_violation || children.contains(&BAD) {
                BAD
            } else {
                OK
            };
            b.add_transition(letter.clone(), children, [target]);
        }
    }
    b.build()
}

/// `in(X,x)`: `x` is a member of `X`. Exactly `sub(x_track, X_track)`.
pub fn in_track(elem_track: usize, set_track: usize, base: &TreeAlphabet, k: usize) -> Nta {
    sub(elem_track, set_track, base, k)
}

/// A node marked `i` whose left child is marked `j`.
///
/// State is a pair `(witnessed, this-node-has-j)` packed as
/// `witnessed*2 + has_j`: `has_j` is recomputed fresh at every node from
/// its own label bit (it says nothing about descendants), `witnessed`
/// is sticky once true.
pub fn left(i: usize, j: usize, base: &TreeAlphabet, k: usize) -> Nta {
    left_or_right(i, j, base, k, false)
}

/// Symmetric to [`left`], witnessing via the rightmost child; only
/// meaningful for arity >= 2 (a node with fewer than two children has no
/// right child).
pub fn right(i: usize, j: usize, base: &TreeAlphabet, k: usize) -> Nta {
    left_or_right(i, j, base, k, true)
}

fn left_or_right(i: usize, j: usize, base: &TreeAlphabet, k: usize, is_right: bool) -> Nta {
    let pack = |witnessed: bool, has_j: bool| -> u32 {
        (if witnessed { 2 } else { 0 }) + if has_j { 1 } else { 0 }
    };
    let unpack_witnessed = |s: u32| s >= 2;
    let unpack_has_j = |s: u32| s % 2 == 1;

    let mut b = NtaBuilder::new(base.clone(), k);
    for _ in 0..4 {
        b.add_state();
    }
    b.mark_accept(pack(true, false));
    b.mark_accept(pack(true, true));

    for letter in all_letters(base, k) {
        let Some(arity) = base.arity(letter.symbol) else {
            continue;
        };
        let vi = letter.bits.get(i);
        let has_j_here = letter.bits.get(j);
        for children in child_tuples(4, arity) {
            let witness_here = if is_right {
                arity >= 2 && vi && unpack_has_j(children[arity - 1])
            } else {
                arity >= 1 && vi && unpack_has_j(children[0])
            };
            let witnessed = witness_here || children.iter().any(|&c| unpack_witnessed(c));
            let target = pack(witnessed, has_j_here);
            b.add_transition(letter.clone(), children, [target]);
        }
    }
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::EncodedTree;

    fn letter(c: char, bits: &[bool]) -> Letter {
        let mut b = Bits::zeros(bits.len());
        for (idx, bit) in bits.iter().enumerate() {
            b = b.with_bit(idx, *bit);
        }
        Letter::new(c, b)
    }

    #[test_log::test]
    fn singl_accepts_exactly_one_mark() {
        let base = TreeAlphabet::new([('a', 2), ('x', 0)]);
        let nta = singl(0, &base, 1);
        let leaf_marked = EncodedTree::leaf(1, letter('x', &[true]));
        let leaf_unmarked = EncodedTree::leaf(2, letter('x', &[false]));
        let one_mark = EncodedTree::node(3, letter('a', &[false]), vec![leaf_marked.clone(), leaf_unmarked.clone()]);
        let two_marks = EncodedTree::node(4, letter('a', &[false]), vec![leaf_marked.clone(), leaf_marked.clone()]);
        assert!(nta.try_run(&one_mark).unwrap());
        assert!(!nta.try_run(&two_marks).unwrap());
    }

    #[test_log::test]
    fn left_witnesses_marked_left_child() {
        let base = TreeAlphabet::new([('a', 2), ('x', 0), ('y', 0)]);
        let nta = left(0, 1, &base, 2);
        let lx = EncodedTree::leaf(1, letter('x', &[false, true]));
        let ly = EncodedTree::leaf(2, letter('y', &[false, false]));
        let root = EncodedTree::node(3, letter('a', &[true, false]), vec![lx, ly]);
        assert!(nta.try_run(&root).unwrap());
    }

    #[test_log::test]
    fn right_does_not_witness_a_left_marked_child() {
        let base = TreeAlphabet::new([('a', 2), ('x', 0), ('y', 0)]);
        let nta = right(0, 1, &base, 2);
        let lx = EncodedTree::leaf(1, letter('x', &[false, true]));
        let ly = EncodedTree::leaf(2, letter('y', &[false, false]));
        let root = EncodedTree::node(3, letter('a', &[true, false]), vec![lx, ly]);
        assert!(!nta.try_run(&root).unwrap());
    }
}
