//! A nondeterministic finite automaton over an extended word alphabet.
//! States are opaque `u32` ids; transitions map `(state, letter)` to a
//! flat set of successor states rather than a generic trait object —
//! determinism is a property tested against that uniform representation,
//! not a separate type.

use tracing::trace;

use crate::core::alphabet::{ExtendedWordAlphabet, Letter, WordAlphabet};
use crate::core::math::{Map, OrderedSet};
use crate::core::word::EncodedWord;
use crate::error::{Error, Result};

pub type StateId = u32;

#[derive(Clone, Debug)]
pub struct Nfa {
    pub base_alphabet: WordAlphabet,
    pub track_width: usize,
    pub num_states: u32,
    pub start: OrderedSet<StateId>,
    pub accept: OrderedSet<StateId>,
    pub delta: Map<(StateId, Letter), OrderedSet<StateId>>,
}

impl Nfa {
    pub fn extended_alphabet(&self) -> ExtendedWordAlphabet {
        ExtendedWordAlphabet::new(self.base_alphabet.clone(), self.track_width)
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> {
        0..self.num_states
    }

    pub fn successors(&self, state: StateId, letter: &Letter) -> OrderedSet<StateId> {
        self.delta
            .get(&(state, letter.clone()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn step(&self, states: &OrderedSet<StateId>, letter: &Letter) -> OrderedSet<StateId> {
        let mut out = OrderedSet::new();
        for &q in states {
            out.extend(self.successors(q, letter));
        }
        out
    }

    /// Deterministic iff every state has exactly one start state and at
    /// most one successor per letter.
    pub fn is_deterministic(&self) -> bool {
        if self.start.len() != 1 {
            return false;
        }
        self.delta.values().all(|targets| targets.len() <= 1)
    }

    fn check_alphabet(&self, word: &EncodedWord) -> Result<()> {
        let ext = self.extended_alphabet();
        for letter in &word.letters {
            if !ext.contains(letter) {
                return Err(Error::AlphabetMismatch {
                    reason: format!(
                        "letter `{}` is not in the automaton's Sigma_{}",
                        letter, self.track_width
                    ),
                });
            }
        }
        Ok(())
    }

    /// General nondeterministic run: tracks the set of live states
    /// through the word, accepting iff some live state is final at the
    /// end. Always correct, regardless of determinism.
    pub fn try_run(&self, word: &EncodedWord) -> Result<bool> {
        self.check_alphabet(word)?;
        let mut live = self.start.clone();
        for letter in &word.letters {
            live = self.step(&live, letter);
            if live.is_empty() {
                break;
            }
        }
        Ok(live.iter().any(|q| self.accept.contains(q)))
    }

    /// Single-path run valid only when the automaton is known
    /// deterministic; errors out rather than silently falling back.
    pub fn try_run_deterministic(&self, word: &EncodedWord) -> Result<bool> {
        if !self.is_deterministic() {
            return Err(Error::ArityMismatch {
                reason: "try_run_deterministic called on a nondeterministic automaton".into(),
            });
        }
        self.check_alphabet(word)?;
        let mut state = *self.start.iter().next().expect("deterministic automaton has a start state");
        for letter in &word.letters {
            let targets = self.successors(state, letter);
            match targets.into_iter().next() {
                Some(next) => state = next,
                None => return Ok(false),
            }
        }
        Ok(self.accept.contains(&state))
    }

    pub fn accepts(&self, word: &EncodedWord) -> Result<bool> {
        trace!(len = word.len(), "running word against nfa");
        self.try_run(word)
    }
}
