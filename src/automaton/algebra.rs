//! Product construction, reachable-subset determinization, complement
//! and projection — the automaton algebra shared by both the word and
//! tree sides. Word- and tree-side operations follow the same shape
//! (product construction, then a recolouring of accept states for
//! union/intersection); determinization explores only reachable
//! subsets rather than materializing the full powerset, since the full
//! powerset is exponentially worse and usually wasted work.

use std::collections::VecDeque;
use std::time::Instant;

use bimap::BiMap;
use itertools::Itertools;
use tracing::debug;

use crate::core::alphabet::Letter;
use crate::core::math::OrderedSet;
use crate::error::{Error, Result};

use super::builder::{NfaBuilder, NtaBuilder};
use super::nfa::{Nfa, StateId as WordStateId};
use super::nta::{Nta, StateId as TreeStateId};

fn check_word_alphabets(a: &Nfa, b: &Nfa) -> Result<()> {
    if a.base_alphabet != b.base_alphabet || a.track_width != b.track_width {
        return Err(Error::AlphabetMismatch {
            reason: "product of two nfas requires identical extended alphabets".into(),
        });
    }
    Ok(())
}

fn check_tree_alphabets(a: &Nta, b: &Nta) -> Result<()> {
    if a.base_alphabet != b.base_alphabet || a.track_width != b.track_width {
        return Err(Error::AlphabetMismatch {
            reason: "product of two ntas requires identical extended alphabets".into(),
        });
    }
    Ok(())
}

/// `a /\ b` when `intersect` is true, `a \/ b` otherwise. States are the
/// full cross product `Q_a x Q_b`; this does not restrict to reachable
/// pairs here since the cross product over two already-small automata
/// is cheap and the result is typically fed straight into a
/// determinization pass that does restrict to reachable states.
pub fn product(a: &Nfa, b: &Nfa, intersect: bool) -> Result<Nfa> {
    check_word_alphabets(a, b)?;
    let mut builder = NfaBuilder::new(a.base_alphabet.clone(), a.track_width);
    let id = |qa: WordStateId, qb: WordStateId| qa * b.num_states + qb;
    for _ in 0..(a.num_states * b.num_states) {
        builder.add_state();
    }
    for &qa in &a.start {
        for &qb in &b.start {
            builder.mark_start(id(qa, qb));
        }
    }
    for qa in a.states() {
        for qb in b.states() {
            let accept = if intersect {
                a.accept.contains(&qa) && b.accept.contains(&qb)
            } else {
                a.accept.contains(&qa) || b.accept.contains(&qb)
            };
            if accept {
                builder.mark_accept(id(qa, qb));
            }
        }
    }
    let ext = a.extended_alphabet();
    for letter in ext.letters() {
        for qa in a.states() {
            for qb in b.states() {
                let targets_a = a.successors(qa, &letter);
                let targets_b = b.successors(qb, &letter);
                let targets: OrderedSet<WordStateId> = targets_a
                    .iter()
                    .cartesian_product(targets_b.iter())
                    .map(|(&ta, &tb)| id(ta, tb))
                    .collect();
                if !targets.is_empty() {
                    builder.add_transition(id(qa, qb), letter.clone(), targets);
                }
            }
        }
    }
    debug!(
        states = a.num_states * b.num_states,
        intersect, "built word product automaton"
    );
    Ok(builder.build())
}

pub fn product_tree(a: &Nta, b: &Nta, intersect: bool) -> Result<Nta> {
    check_tree_alphabets(a, b)?;
    let mut builder = NtaBuilder::new(a.base_alphabet.clone(), a.track_width);
    let id = |qa: TreeStateId, qb: TreeStateId| qa * b.num_states + qb;
    for _ in 0..(a.num_states * b.num_states) {
        builder.add_state();
    }
    for qa in a.states() {
        for qb in b.states() {
            let accept = if intersect {
                a.accept.contains(&qa) && b.accept.contains(&qb)
            } else {
                a.accept.contains(&qa) || b.accept.contains(&qb)
            };
            if accept {
                builder.mark_accept(id(qa, qb));
            }
        }
    }
    let ext = a.extended_alphabet();
    for letter in ext.letters() {
        let Some(arity) = ext.arity(&letter) else {
            continue;
        };
        let pair_states: Vec<(TreeStateId, TreeStateId)> = a
            .states()
            .cartesian_product(b.states())
            .collect();
        for tuple in std::iter::repeat(pair_states.iter())
            .take(arity)
            .multi_cartesian_product()
        {
            let children_a: Vec<TreeStateId> = tuple.iter().map(|(qa, _)| *qa).collect();
            let children_b: Vec<TreeStateId> = tuple.iter().map(|(_, qb)| *qb).collect();
            let targets_a = a.successors(&letter, &children_a);
            let targets_b = b.successors(&letter, &children_b);
            let targets: OrderedSet<TreeStateId> = targets_a
                .iter()
                .cartesian_product(targets_b.iter())
                .map(|(&ta, &tb)| id(ta, tb))
                .collect();
            if !targets.is_empty() {
                let children: Vec<TreeStateId> = tuple.iter().map(|(qa, qb)| id(*qa, *qb)).collect();
                builder.add_transition(letter.clone(), children, targets);
            }
        }
    }
    debug!(
        states = a.num_states * b.num_states,
        intersect, "built tree product automaton"
    );
    Ok(builder.build())
}

/// Reachable-subset determinization for words: BFS from the start
/// subset, exploring only subsets actually reachable rather than the
/// full powerset. `bimap` canonicalizes each subset to a stable DFA
/// state id.
pub fn determinize_word(nfa: &Nfa) -> Nfa {
    let start = Timer::start();
    let mut canon: BiMap<OrderedSet<WordStateId>, WordStateId> = BiMap::new();
    let mut queue: VecDeque<OrderedSet<WordStateId>> = VecDeque::new();

    let start_subset = nfa.start.clone();
    canon.insert(start_subset.clone(), 0);
    queue.push_back(start_subset);

    let mut builder_states = 1u32;
    let mut accept: OrderedSet<WordStateId> = OrderedSet::new();
    let mut delta: Vec<(WordStateId, Letter, OrderedSet<WordStateId>)> = Vec::new();

    let ext = nfa.extended_alphabet();

    while let Some(subset) = queue.pop_front() {
        let &sid = canon.get_by_left(&subset).expect("subset enqueued without id");
        if subset.iter().any(|q| nfa.accept.contains(q)) {
            accept.insert(sid);
        }
        for letter in ext.letters() {
            let target = nfa.step(&subset, &letter);
            let tid = if let Some(&existing) = canon.get_by_left(&target) {
                existing
            } else {
                let new_id = builder_states;
                builder_states += 1;
                canon.insert(target.clone(), new_id);
                queue.push_back(target.clone());
                new_id
            };
            delta.push((sid, letter, [tid].into_iter().collect()));
        }
    }

    debug!(
        reachable_states = builder_states,
        elapsed_ms = start.elapsed_ms(),
        "determinized word automaton"
    );

    let mut builder = NfaBuilder::new(nfa.base_alphabet.clone(), nfa.track_width);
    for _ in 0..builder_states {
        builder.add_state();
    }
    builder.mark_start(0);
    for q in accept {
        builder.mark_accept(q);
    }
    for (from, letter, targets) in delta {
        builder.add_transition(from, letter, targets);
    }
    builder.build()
}

/// Reachable-subset determinization for ranked trees. Nullary letters
/// seed the worklist; whenever a subset is newly discovered, it is
/// combined (in every argument position) with every subset already
/// known, so a combination is generated the moment its last missing
/// piece becomes reachable.
pub fn determinize_tree(nta: &Nta) -> Nta {
    let start = Timer::start();
    let ext = nta.extended_alphabet();

    let mut canon: BiMap<OrderedSet<TreeStateId>, TreeStateId> = BiMap::new();
    let mut queue: VecDeque<OrderedSet<TreeStateId>> = VecDeque::new();
    let mut next_id: TreeStateId = 0;
    let mut new_delta: Vec<(Letter, Vec<TreeStateId>, TreeStateId)> = Vec::new();

    fn intern(
        subset: OrderedSet<TreeStateId>,
        canon: &mut BiMap<OrderedSet<TreeStateId>, TreeStateId>,
        queue: &mut VecDeque<OrderedSet<TreeStateId>>,
        next_id: &mut TreeStateId,
    ) -> TreeStateId {
        if let Some(&id) = canon.get_by_left(&subset) {
            return id;
        }
        let id = *next_id;
        *next_id += 1;
        canon.insert(subset.clone(), id);
        queue.push_back(subset);
        id
    }

    for letter in ext.letters() {
        if ext.arity(&letter) != Some(0) {
            continue;
        }
        let subset = nta.successors(&letter, &[]);
        let id = intern(subset, &mut canon, &mut queue, &mut next_id);
        new_delta.push((letter, Vec::new(), id));
    }

    while let Some(subset) = queue.pop_front() {
        let &sid = canon.get_by_left(&subset).expect("subset enqueued without id");
        let known_ids: Vec<TreeStateId> = canon.right_values().copied().sorted().collect();

        for letter in ext.letters() {
            let arity = match ext.arity(&letter) {
                Some(r) if r >= 1 => r,
                _ => continue,
            };
            for position in 0..arity {
                let others: Vec<Vec<TreeStateId>> = if arity == 1 {
                    vec![Vec::new()]
                } else {
                    std::iter::repeat(known_ids.iter().copied())
                        .take(arity - 1)
                        .multi_cartesian_product()
                        .collect()
                };
                for other in others {
                    let mut tuple = other;
                    tuple.insert(position, sid);
                    let subsets: Vec<&OrderedSet<TreeStateId>> = tuple
                        .iter()
                        .map(|id| canon.get_by_right(id).expect("known id has a subset"))
                        .collect();
                    let mut target_subset: OrderedSet<TreeStateId> = OrderedSet::new();
                    for combo in subsets
                        .iter()
                        .map(|s| s.iter().copied().collect::<Vec<_>>())
                        .multi_cartesian_product()
                    {
                        target_subset.extend(nta.successors(&letter, &combo));
                    }
                    let tid = intern(target_subset, &mut canon, &mut queue, &mut next_id);
                    new_delta.push((letter.clone(), tuple, tid));
                }
            }
        }
    }

    debug!(
        reachable_states = next_id,
        elapsed_ms = start.elapsed_ms(),
        "determinized tree automaton"
    );

    let mut accept: OrderedSet<TreeStateId> = OrderedSet::new();
    for (subset, id) in canon.iter() {
        if subset.iter().any(|q| nta.accept.contains(q)) {
            accept.insert(*id);
        }
    }

    let mut builder = NtaBuilder::new(nta.base_alphabet.clone(), nta.track_width);
    for _ in 0..next_id {
        builder.add_state();
    }
    for q in accept {
        builder.mark_accept(q);
    }
    for (letter, children, target) in new_delta {
        builder.add_transition(letter, children, [target]);
    }
    builder.build()
}

/// Complement: determinize first (the determinized automaton is total by
/// construction, since the worklist iterates the whole extended
/// alphabet), then flip accept states.
pub fn complement_word(nfa: &Nfa) -> Nfa {
    let det = determinize_word(nfa);
    let mut builder = NfaBuilder::new(det.base_alphabet.clone(), det.track_width);
    for _ in 0..det.num_states {
        builder.add_state();
    }
    for &s in &det.start {
        builder.mark_start(s);
    }
    for q in det.states() {
        if !det.accept.contains(&q) {
            builder.mark_accept(q);
        }
    }
    for ((from, letter), targets) in &det.delta {
        builder.add_transition(*from, letter.clone(), targets.clone());
    }
    builder.build()
}

pub fn complement_tree(nta: &Nta) -> Nta {
    let det = determinize_tree(nta);
    let mut builder = NtaBuilder::new(det.base_alphabet.clone(), det.track_width);
    for _ in 0..det.num_states {
        builder.add_state();
    }
    for q in det.states() {
        if !det.accept.contains(&q) {
            builder.mark_accept(q);
        }
    }
    for ((letter, children), targets) in &det.delta {
        builder.add_transition(letter.clone(), children.clone(), targets.clone());
    }
    builder.build()
}

/// Project away the track at `index`, unioning any transitions that
/// collapse onto the same remaining letter — this is where existential
/// quantification introduces nondeterminism.
pub fn project_word(nfa: &Nfa, index: usize) -> Result<Nfa> {
    if index >= nfa.track_width {
        return Err(Error::ArityMismatch {
            reason: format!(
                "cannot project track {} out of an automaton with track width {}",
                index, nfa.track_width
            ),
        });
    }
    let mut builder = NfaBuilder::new(nfa.base_alphabet.clone(), nfa.track_width - 1);
    for _ in 0..nfa.num_states {
        builder.add_state();
    }
    for &s in &nfa.start {
        builder.mark_start(s);
    }
    for &s in &nfa.accept {
        builder.mark_accept(s);
    }
    for ((from, letter), targets) in &nfa.delta {
        let projected = letter.without_index(index);
        builder.add_transition(*from, projected, targets.clone());
    }
    Ok(builder.build())
}

pub fn project_tree(nta: &Nta, index: usize) -> Result<Nta> {
    if index >= nta.track_width {
        return Err(Error::ArityMismatch {
            reason: format!(
                "cannot project track {} out of an automaton with track width {}",
                index, nta.track_width
            ),
        });
    }
    let mut builder = NtaBuilder::new(nta.base_alphabet.clone(), nta.track_width - 1);
    for _ in 0..nta.num_states {
        builder.add_state();
    }
    for &s in &nta.accept {
        builder.mark_accept(s);
    }
    for ((letter, children), targets) in &nta.delta {
        let projected = letter.without_index(index);
        builder.add_transition(projected, children.clone(), targets.clone());
    }
    Ok(builder.build())
}

struct Timer(Instant);

impl Timer {
    fn start() -> Self {
        Self(Instant::now())
    }

    fn elapsed_ms(&self) -> u128 {
        self.0.elapsed().as_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::{Bits, WordAlphabet};

    fn letter(c: char) -> Letter {
        Letter::new(c, Bits::zeros(0))
    }

    fn single_a_dfa() -> Nfa {
        let base = WordAlphabet::new(['a', 'b']);
        let mut b = NfaBuilder::new(base, 0);
        let q0 = b.add_state();
        let q1 = b.add_state();
        b.mark_start(q0);
        b.mark_accept(q1);
        b.add_transition(q0, letter('a'), [q1]);
        b.add_transition(q1, letter('a'), [q1]);
        b.add_transition(q1, letter('b'), [q1]);
        b.add_transition(q0, letter('b'), [q0]);
        b.build()
    }

    #[test_log::test]
    fn determinize_preserves_language_on_a_deterministic_input() {
        let nfa = single_a_dfa();
        let det = determinize_word(&nfa);
        assert!(det.is_deterministic());
        assert_eq!(
            nfa.try_run(&crate::core::word::EncodedWord::plain("bab")).unwrap(),
            det.try_run(&crate::core::word::EncodedWord::plain("bab")).unwrap()
        );
    }

    #[test_log::test]
    fn complement_flips_acceptance() {
        use crate::core::word::EncodedWord;
        let nfa = single_a_dfa();
        let comp = complement_word(&nfa);
        for w in ["", "a", "b", "ab", "bb"] {
            let word = EncodedWord::plain(w);
            assert_ne!(nfa.try_run(&word).unwrap(), comp.try_run(&word).unwrap());
        }
    }

    #[test_log::test]
    fn product_intersection_matches_conjunction() {
        use crate::core::word::EncodedWord;
        let a = single_a_dfa();
        let b = single_a_dfa();
        let both = product(&a, &b, true).unwrap();
        let word = EncodedWord::plain("ba");
        assert_eq!(
            both.try_run(&word).unwrap(),
            a.try_run(&word).unwrap() && b.try_run(&word).unwrap()
        );
    }
}
