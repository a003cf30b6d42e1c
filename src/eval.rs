//! Public entry points: `compile`, `run`, `accepts`. This module just
//! picks the word/tree mode and dispatches to [`Nfa`]/[`Nta`], which own
//! the deterministic-if-possible vs. subset-tracking run logic.

use crate::compile::{compile_tree, compile_word, Budget};
use crate::core::alphabet::{TreeAlphabet, WordAlphabet};
use crate::core::tree::EncodedTree;
use crate::core::word::EncodedWord;
use crate::error::{Error, Result};
use crate::formula::{self, Formula};

pub use crate::automaton::{Nfa, Nta};

/// The base alphabet a formula is compiled against: words carry an
/// unranked symbol set, trees a symbol-to-arity mapping.
#[derive(Clone, Debug)]
pub enum BaseAlphabet {
    Word(WordAlphabet),
    Tree(TreeAlphabet),
}

/// A concrete input to evaluate an automaton on.
#[derive(Clone, Debug)]
pub enum EncodedInput {
    Word(EncodedWord),
    Tree(EncodedTree),
}

/// The compiled automaton `compile` returns — either side of the
/// word/tree split, never both.
#[derive(Clone, Debug)]
pub enum Automaton {
    Word(Nfa),
    Tree(Nta),
}

impl Automaton {
    pub fn track_width(&self) -> usize {
        match self {
            Automaton::Word(nfa) => nfa.track_width,
            Automaton::Tree(nta) => nta.track_width,
        }
    }
}

/// Parse `formula` and compile it against `base_alphabet`, honoring
/// `budget`'s resource ceilings throughout.
pub fn compile(formula: &str, base_alphabet: BaseAlphabet, budget: &Budget) -> Result<Automaton> {
    let ast: Formula = formula::parse(formula)?;
    match base_alphabet {
        BaseAlphabet::Word(alphabet) => {
            compile_word(&ast, &alphabet, budget).map(Automaton::Word)
        }
        BaseAlphabet::Tree(alphabet) => {
            compile_tree(&ast, &alphabet, budget).map(Automaton::Tree)
        }
    }
}

/// Run a compiled automaton on a concrete input. Mismatched word/tree
/// modes are an `AlphabetMismatch`, not a panic.
pub fn run(automaton: &Automaton, input: &EncodedInput) -> Result<bool> {
    match (automaton, input) {
        (Automaton::Word(nfa), EncodedInput::Word(word)) => nfa.try_run(word),
        (Automaton::Tree(nta), EncodedInput::Tree(tree)) => nta.try_run(tree),
        _ => Err(Error::AlphabetMismatch {
            reason: "automaton and input disagree on word vs. tree mode".into(),
        }),
    }
}

/// Convenience combining `compile` and `run`.
pub fn accepts(
    formula: &str,
    base_alphabet: BaseAlphabet,
    input: &EncodedInput,
    budget: &Budget,
) -> Result<bool> {
    let automaton = compile(formula, base_alphabet, budget)?;
    run(&automaton, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::{Bits, Letter};

    fn word(symbols: &str) -> EncodedInput {
        EncodedInput::Word(EncodedWord::new(
            symbols.chars().map(|c| Letter::new(c, Bits::zeros(0))).collect(),
        ))
    }

    #[test_log::test]
    fn s1_end_to_end_via_accepts() {
        let alphabet = BaseAlphabet::Word(WordAlphabet::new(['a', 'b']));
        let budget = Budget::default();
        assert!(accepts("∃x(P_a(x))", alphabet.clone(), &word("ab"), &budget).unwrap());
        assert!(!accepts("∃x(P_a(x))", alphabet.clone(), &word("bb"), &budget).unwrap());
        assert!(!accepts("∃x(P_a(x))", alphabet, &word(""), &budget).unwrap());
    }

    #[test_log::test]
    fn s3_order_of_three_marked_positions() {
        let alphabet = BaseAlphabet::Word(WordAlphabet::new(['a', 'b']));
        let formula = "∃x(∃y(∃z(and(le(x,y),and(le(y,z),and(P_a(x),and(P_b(y),P_a(z))))))))";
        let budget = Budget::default();
        assert!(accepts(formula, alphabet.clone(), &word("aba"), &budget).unwrap());
        assert!(!accepts(formula, alphabet, &word("aab"), &budget).unwrap());
    }

    #[test_log::test]
    fn mismatched_input_mode_is_an_alphabet_mismatch() {
        let alphabet = BaseAlphabet::Word(WordAlphabet::new(['a']));
        let budget = Budget::default();
        let automaton = compile("P_a(x)", alphabet, &budget);
        // `x` is unbound at the top level; use a closed formula instead.
        assert!(automaton.is_err());

        let alphabet = BaseAlphabet::Word(WordAlphabet::new(['a']));
        let automaton = compile("∃x(P_a(x))", alphabet, &budget).unwrap();
        let tree_input = EncodedInput::Tree(EncodedTree::leaf(
            0,
            Letter::new('a', Bits::zeros(0)),
        ));
        assert!(matches!(run(&automaton, &tree_input), Err(Error::AlphabetMismatch { .. })));
    }
}
