//! Accumulate states and transitions, then freeze into an [`Nfa`]/[`Nta`]:
//! add states one at a time, mark start/accept as you go, add
//! transitions, then call `build()`.

use crate::core::alphabet::{Letter, TreeAlphabet, WordAlphabet};
use crate::core::math::{Map, OrderedSet};

use super::nfa::{Nfa, StateId as WordStateId};
use super::nta::{Nta, StateId as TreeStateId};

pub struct NfaBuilder {
    base_alphabet: WordAlphabet,
    track_width: usize,
    next_state: WordStateId,
    start: OrderedSet<WordStateId>,
    accept: OrderedSet<WordStateId>,
    delta: Map<(WordStateId, Letter), OrderedSet<WordStateId>>,
}

impl NfaBuilder {
    pub fn new(base_alphabet: WordAlphabet, track_width: usize) -> Self {
        Self {
            base_alphabet,
            track_width,
            next_state: 0,
            start: OrderedSet::new(),
            accept: OrderedSet::new(),
            delta: Map::new(),
        }
    }

    pub fn add_state(&mut self) -> WordStateId {
        let id = self.next_state;
        self.next_state += 1;
        id
    }

    pub fn mark_start(&mut self, state: WordStateId) {
        self.start.insert(state);
    }

    pub fn mark_accept(&mut self, state: WordStateId) {
        self.accept.insert(state);
    }

    pub fn add_transition(
        &mut self,
        from: WordStateId,
        letter: Letter,
        targets: impl IntoIterator<Item = WordStateId>,
    ) {
        self.delta
            .entry((from, letter))
            .or_default()
            .extend(targets);
    }

    pub fn build(self) -> Nfa {
        Nfa {
            base_alphabet: self.base_alphabet,
            track_width: self.track_width,
            num_states: self.next_state,
            start: self.start,
            accept: self.accept,
            delta: self.delta,
        }
    }
}

pub struct NtaBuilder {
    base_alphabet: TreeAlphabet,
    track_width: usize,
    next_state: TreeStateId,
    accept: OrderedSet<TreeStateId>,
    delta: Map<(Letter, Vec<TreeStateId>), OrderedSet<TreeStateId>>,
}

impl NtaBuilder {
    pub fn new(base_alphabet: TreeAlphabet, track_width: usize) -> Self {
        Self {
            base_alphabet,
            track_width,
            next_state: 0,
            accept: OrderedSet::new(),
            delta: Map::new(),
        }
    }

    pub fn add_state(&mut self) -> TreeStateId {
        let id = self.next_state;
        self.next_state += 1;
        id
    }

    pub fn mark_accept(&mut self, state: TreeStateId) {
        self.accept.insert(state);
    }

    pub fn add_leaf_transition(
        &mut self,
        letter: Letter,
        targets: impl IntoIterator<Item = TreeStateId>,
    ) {
        self.add_transition(letter, Vec::new(), targets);
    }

    pub fn add_transition(
        &mut self,
        letter: Letter,
        children: Vec<TreeStateId>,
        targets: impl IntoIterator<Item = TreeStateId>,
    ) {
        self.delta
            .entry((letter, children))
            .or_default()
            .extend(targets);
    }

    pub fn build(self) -> Nta {
        Nta {
            base_alphabet: self.base_alphabet,
            track_width: self.track_width,
            num_states: self.next_state,
            accept: self.accept,
            delta: self.delta,
        }
    }
}
