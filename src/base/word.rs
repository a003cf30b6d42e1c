//! Base automata for the atomic word predicates. Every automaton here
//! is deterministic and total by construction.

use crate::automaton::builder::NfaBuilder;
use crate::automaton::nfa::Nfa;
use crate::core::alphabet::{Bits, Letter, WordAlphabet};

/// `singl(i)`: exactly one position has track `i` set.
///
/// States: `q0` (no `i`-marked position seen yet), `q1` (seen exactly
/// one), `sink` (seen more than one, rejecting).
pub fn singl(track: usize, base: &WordAlphabet, k: usize) -> Nfa {
    let mut b = NfaBuilder::new(base.clone(), k);
    let q0 = b.add_state();
    let q1 = b.add_state();
    let sink = b.add_state();
    b.mark_start(q0);
    b.mark_accept(q1);
    for letter in all_letters(base, k) {
        let bit = letter.bits.get(track);
        b.add_transition(q0, letter.clone(), [if bit { q1 } else { q0 }]);
        b.add_transition(q1, letter.clone(), [if bit { sink } else { q1 }]);
        b.add_transition(sink, letter, [sink]);
    }
    b.build()
}

/// `le(i,j)`: the (unique, externally enforced) position marked `i` comes
/// at or before the position marked `j`.
///
/// States: `q0` (neither seen), `q1` (seen `i`, waiting on `j`), `acc`
/// (order satisfied), `sink` (`j` seen strictly before `i`).
pub fn le(i: usize, j: usize, base: &WordAlphabet, k: usize) -> Nfa {
    let mut b = NfaBuilder::new(base.clone(), k);
    let q0 = b.add_state();
    let q1 = b.add_state();
    let acc = b.add_state();
    let sink = b.add_state();
    b.mark_start(q0);
    b.mark_accept(acc);
    for letter in all_letters(base, k) {
        let vi = letter.bits.get(i);
        let vj = letter.bits.get(j);
        let from_q0 = match (vi, vj) {
            (false, false) => q0,
            (true, false) => q1,
            (false, true) => sink,
            (true, true) => acc,
        };
        b.add_transition(q0, letter.clone(), [from_q0]);
        let from_q1 = if vj { acc } else { q1 };
        b.add_transition(q1, letter.clone(), [from_q1]);
        b.add_transition(acc, letter.clone(), [acc]);
        b.add_transition(sink, letter, [sink]);
    }
    b.build()
}

/// `sub(X,Y)`: every position marked `i` (in `X`) is also marked `j` (in
/// `Y`) — i.e. track `i` is a subset of track `j`.
///
/// States: `ok`, `bad` (sink). `in(X,x)` is this construction specialized
/// to a first-order singleton track.
pub fn sub(i: usize, j: usize, base: &WordAlphabet, k: usize) -> Nfa {
    let mut b = NfaBuilder::new(base.clone(), k);
    let ok = b.add_state();
    let bad = b.add_state();
    b.mark_start(ok);
    b.mark_accept(ok);
    for letter in all_letters(base, k) {
        let violated = letter.bits.get(i) && !letter.bits.get(j);
        b.add_transition(ok, letter.clone(), [if violated { bad } else { ok }]);
        b.add_transition(bad, letter, [bad]);
    }
    b.build()
}

/// `in(X,x)`: `x` (a first-order singleton track) is a member of `X` (a
/// second-order track). Exactly `sub(x_track, X_track)`.
pub fn in_track(elem_track: usize, set_track: usize, base: &WordAlphabet, k: usize) -> Nfa {
    sub(elem_track, set_track, base, k)
}

/// `P_c(v)`: the position marked `i` carries base symbol `c`.
///
/// States: `p0` (no violation yet), `p1` (sink, violation found).
pub fn symb(c: char, track: usize, base: &WordAlphabet, k: usize) -> Nfa {
    let mut b = NfaBuilder::new(base.clone(), k);
    let p0 = b.add_state();
    let p1 = b.add_state();
    b.mark_start(p0);
    b.mark_accept(p0);
    for letter in all_letters(base, k) {
        let violated = letter.bits.get(track) && letter.symbol != c;
        b.add_transition(p0, letter.clone(), [if violated { p1 } else { p0 }]);
        b.add_transition(p1, letter, [p1]);
    }
    b.build()
}

fn all_letters(base: &WordAlphabet, k: usize) -> impl Iterator<Item = Letter> + '_ {
    base.symbols()
        .flat_map(move |s| Bits::all(k).map(move |bits| Letter::new(s, bits)))
}
