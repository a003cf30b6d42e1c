//! The AST-to-automaton compilation driver. Two near-identical
//! recursive walkers, one for words and one for trees, share the same
//! structure (scope stack, track-width bookkeeping) but dispatch to the
//! word- and tree-side base automata and algebra respectively.

use tracing::{debug, span, Level};

use crate::automaton::algebra::{
    complement_tree, complement_word, product, product_tree, project_tree, project_word,
};
use crate::automaton::nfa::Nfa;
use crate::automaton::nta::Nta;
use crate::base;
use crate::core::alphabet::{TreeAlphabet, WordAlphabet};
use crate::error::{Error, Result};
use crate::formula::{Formula, Sort};

/// Caller-set ceiling on resource use: track width is a compile-time
/// budget, not a runtime knob. No environment variables, no config
/// files — the caller constructs this value directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budget {
    /// Ceiling on `|Sigma| * 2^k`, checked before building any base
    /// automaton or product at a given track width.
    pub max_extended_alphabet: usize,
    /// Ceiling on the number of states a single automaton (base,
    /// product, or determinized) may carry.
    pub max_automaton_states: usize,
}

impl Default for Budget {
    fn default() -> Self {
        // Generous but finite: a library must not silently hang a caller
        // on a pathological formula.
        Self {
            max_extended_alphabet: 1 << 20,
            max_automaton_states: 1 << 20,
        }
    }
}

impl Budget {
    fn check_alphabet(&self, base_size: usize, k: usize) -> Result<()> {
        let factor = 1usize.checked_shl(k as u32).unwrap_or(usize::MAX);
        let size = base_size.checked_mul(factor).unwrap_or(usize::MAX);
        if size > self.max_extended_alphabet {
            return Err(Error::ResourceExceeded {
                limit: "max_extended_alphabet",
                limit_value: self.max_extended_alphabet,
                requested: size,
            });
        }
        Ok(())
    }

    fn check_states(&self, states: usize) -> Result<()> {
        if states > self.max_automaton_states {
            return Err(Error::ResourceExceeded {
                limit: "max_automaton_states",
                limit_value: self.max_automaton_states,
                requested: states,
            });
        }
        Ok(())
    }
}

struct ScopeEntry {
    name: String,
    sort: Sort,
}

/// A variable's track index equals its position in the scope stack at
/// the moment it's pushed, which always equals the stack's length right
/// before the push — so the stack doubles as the index table. Pushed on
/// quantifier entry, popped immediately after that quantifier's own
/// `project` call. Using stack depth rather than a single mutable
/// counter is what makes sibling quantifiers (two `exists` under the
/// same `and`) reindex correctly: each branch's projection only ever
/// affects its own top-of-stack entry.
struct Scope {
    entries: Vec<ScopeEntry>,
}

impl Scope {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn k(&self) -> usize {
        self.entries.len()
    }

    fn lookup(&self, name: &str) -> Result<usize> {
        self.entries
            .iter()
            .rposition(|e| e.name == name)
            .ok_or_else(|| Error::UnboundVariable(name.to_string()))
    }

    fn push(&mut self, name: String, sort: Sort) {
        self.entries.push(ScopeEntry { name, sort });
    }

    fn pop(&mut self) {
        self.entries.pop();
    }
}

fn node_kind(f: &Formula) -> &'static str {
    match f {
        Formula::Exists(_, Sort::First, _) => "exists_first",
        Formula::Exists(_, Sort::Second, _) => "exists_second",
        Formula::Not(_) => "not",
        Formula::And(_, _) => "and",
        Formula::Or(_, _) => "or",
        Formula::Implies(_, _) => "implies",
        Formula::Predicate(_, _) => "predicate",
        Formula::Le(_, _) => "le",
        Formula::In(_, _) => "in",
        Formula::Left(_, _) => "left",
        Formula::Right(_, _) => "right",
        Formula::CardEq(_, _) => "card_eq",
    }
}

/// Compile a closed formula into a word automaton over `alphabet`.
pub fn compile_word(formula: &Formula, alphabet: &WordAlphabet, budget: &Budget) -> Result<Nfa> {
    let mut scope = Scope::new();
    compile_word_rec(formula, alphabet, budget, &mut scope)
}

fn compile_word_rec(
    formula: &Formula,
    alphabet: &WordAlphabet,
    budget: &Budget,
    scope: &mut Scope,
) -> Result<Nfa> {
    budget.check_alphabet(alphabet.len(), scope.k())?;
    let span = span!(Level::DEBUG, "compile_word", kind = node_kind(formula), k = scope.k());
    let _enter = span.enter();

    let automaton = match formula {
        Formula::Predicate(c, v) => {
            let idx = scope.lookup(v)?;
            base::word::symb(*c, idx, alphabet, scope.k())
        }
        Formula::Le(i, j) => {
            let a = scope.lookup(i)?;
            let b = scope.lookup(j)?;
            base::word::le(a, b, alphabet, scope.k())
        }
        Formula::In(set_var, elem_var) => {
            let set_idx = scope.lookup(set_var)?;
            let elem_idx = scope.lookup(elem_var)?;
            base::word::in_track(elem_idx, set_idx, alphabet, scope.k())
        }
        Formula::Left(_, _) | Formula::Right(_, _) => {
            return Err(Error::ArityMismatch {
                reason: "left/right are tree-only predicates and have no word-side automaton"
                    .into(),
            });
        }
        Formula::CardEq(_, _) => return Err(Error::CardinalityNotSupported),
        Formula::Not(inner) => {
            let sub = compile_word_rec(inner, alphabet, budget, scope)?;
            complement_word(&sub)
        }
        Formula::And(l, r) => {
            let left = compile_word_rec(l, alphabet, budget, scope)?;
            let right = compile_word_rec(r, alphabet, budget, scope)?;
            product(&left, &right, true)?
        }
        Formula::Or(l, r) => {
            let left = compile_word_rec(l, alphabet, budget, scope)?;
            let right = compile_word_rec(r, alphabet, budget, scope)?;
            product(&left, &right, false)?
        }
        Formula::Implies(l, r) => {
            // ->(A,B) == not(A) \/ B
            let left = compile_word_rec(l, alphabet, budget, scope)?;
            let right = compile_word_rec(r, alphabet, budget, scope)?;
            let not_left = complement_word(&left);
            product(&not_left, &right, false)?
        }
        Formula::Exists(name, sort, body) => {
            let idx = scope.k();
            scope.push(name.clone(), *sort);
            let sub = compile_word_rec(body, alphabet, budget, scope)?;
            scope.pop();
            let result = match sort {
                // First-order: cut with singl(idx) *then* project — the
                // extra intersection enforces "exactly one position".
                Sort::First => {
                    let singleton = base::word::singl(idx, alphabet, idx + 1);
                    let cut = product(&singleton, &sub, true)?;
                    project_word(&cut, idx)?
                }
                // Second-order: project directly, no singl cut.
                Sort::Second => project_word(&sub, idx)?,
            };
            debug!(projected_track = idx, new_width = scope.k(), "quantifier eliminated");
            result
        }
    };
    budget.check_states(automaton.num_states as usize)?;
    Ok(automaton)
}

/// Compile a closed formula into a tree automaton over `alphabet`.
pub fn compile_tree(formula: &Formula, alphabet: &TreeAlphabet, budget: &Budget) -> Result<Nta> {
    let mut scope = Scope::new();
    compile_tree_rec(formula, alphabet, budget, &mut scope)
}

fn compile_tree_rec(
    formula: &Formula,
    alphabet: &TreeAlphabet,
    budget: &Budget,
    scope: &mut Scope,
) -> Result<Nta> {
    budget.check_alphabet(alphabet.len(), scope.k())?;
    let span = span!(Level::DEBUG, "compile_tree", kind = node_kind(formula), k = scope.k());
    let _enter = span.enter();

    let automaton = match formula {
        Formula::Predicate(c, v) => {
            let idx = scope.lookup(v)?;
            base::tree::symb(*c, idx, alphabet, scope.k())
        }
        Formula::Le(_, _) => {
            return Err(Error::ArityMismatch {
                reason: "le is a word-order predicate and has no tree-side automaton".into(),
            });
        }
        Formula::In(set_var, elem_var) => {
            let set_idx = scope.lookup(set_var)?;
            let elem_idx = scope.lookup(elem_var)?;
            base::tree::in_track(elem_idx, set_idx, alphabet, scope.k())
        }
        Formula::Left(l, r) => {
            let li = scope.lookup(l)?;
            let ri = scope.lookup(r)?;
            base::tree::left(li, ri, alphabet, scope.k())
        }
        Formula::Right(l, r) => {
            let li = scope.lookup(l)?;
            let ri = scope.lookup(r)?;
            base::tree::right(li, ri, alphabet, scope.k())
        }
        Formula::CardEq(_, _) => return Err(Error::CardinalityNotSupported),
        Formula::Not(inner) => {
            let sub = compile_tree_rec(inner, alphabet, budget, scope)?;
            complement_tree(&sub)
        }
        Formula::And(l, r) => {
            let left = compile_tree_rec(l, alphabet, budget, scope)?;
            let right = compile_tree_rec(r, alphabet, budget, scope)?;
            product_tree(&left, &right, true)?
        }
        Formula::Or(l, r) => {
            let left = compile_tree_rec(l, alphabet, budget, scope)?;
            let right = compile_tree_rec(r, alphabet, budget, scope)?;
            product_tree(&left, &right, false)?
        }
        Formula::Implies(l, r) => {
            let left = compile_tree_rec(l, alphabet, budget, scope)?;
            let right = compile_tree_rec(r, alphabet, budget, scope)?;
            let not_left = complement_tree(&left);
            product_tree(&not_left, &right, false)?
        }
        Formula::Exists(name, sort, body) => {
            let idx = scope.k();
            scope.push(name.clone(), *sort);
            let sub = compile_tree_rec(body, alphabet, budget, scope)?;
            scope.pop();
            let result = match sort {
                Sort::First => {
                    let singleton = base::tree::singl(idx, alphabet, idx + 1);
                    let cut = product_tree(&singleton, &sub, true)?;
                    project_tree(&cut, idx)?
                }
                Sort::Second => project_tree(&sub, idx)?,
            };
            debug!(projected_track = idx, new_width = scope.k(), "quantifier eliminated");
            result
        }
    };
    budget.check_states(automaton.num_states as usize)?;
    Ok(automaton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alphabet::Bits;
    use crate::core::alphabet::Letter;
    use crate::core::tree::EncodedTree;
    use crate::core::word::EncodedWord;
    use crate::formula::parse;

    fn letter0(c: char) -> Letter {
        Letter::new(c, Bits::zeros(0))
    }

    #[test_log::test]
    fn s1_exists_predicate_a() {
        let alphabet = WordAlphabet::new(['a', 'b']);
        let formula = parse("∃x(P_a(x))").unwrap();
        let nfa = compile_word(&formula, &alphabet, &Budget::default()).unwrap();
        assert!(nfa.try_run(&EncodedWord::new(vec![letter0('a'), letter0('b')])).unwrap());
        assert!(!nfa.try_run(&EncodedWord::new(vec![letter0('b'), letter0('b')])).unwrap());
        assert!(!nfa.try_run(&EncodedWord::new(vec![])).unwrap());
    }

    #[test_log::test]
    fn s4_set_quantifier_witnesses_a_positions_on_every_word() {
        let alphabet = WordAlphabet::new(['a', 'b']);
        let formula = parse("∃X(∀x(<->(P_a(x),in(X,x))))").unwrap();
        let nfa = compile_word(&formula, &alphabet, &Budget::default()).unwrap();
        for w in ["", "a", "b", "ab", "ba", "aab", "bba"] {
            let word = EncodedWord::new(w.chars().map(letter0).collect());
            assert!(nfa.try_run(&word).unwrap(), "should accept {:?}", w);
        }
    }

    #[test_log::test]
    fn unbound_variable_is_rejected() {
        let alphabet = WordAlphabet::new(['a']);
        let formula = parse("P_a(x)").unwrap();
        assert!(matches!(
            compile_word(&formula, &alphabet, &Budget::default()),
            Err(Error::UnboundVariable(name)) if name == "x"
        ));
    }

    #[test_log::test]
    fn card_eq_is_rejected_not_approximated() {
        let alphabet = WordAlphabet::new(['a']);
        let formula = parse("card_eq(X,Y)").unwrap();
        assert!(matches!(
            compile_word(&formula, &alphabet, &Budget::default()),
            Err(Error::CardinalityNotSupported)
        ));
    }

    #[test_log::test]
    fn s5_tree_left_child_predicate() {
        let alphabet = TreeAlphabet::new([('a', 2), ('b', 2), ('x', 0)]);
        let formula = parse("∃x(∃y(and(P_a(x),and(P_b(y),left(x,y)))))").unwrap();
        let nta = compile_tree(&formula, &alphabet, &Budget::default()).unwrap();

        let left_child = EncodedTree::leaf(1, letter0('b'));
        let right_child = EncodedTree::leaf(2, letter0('x'));
        let tree = EncodedTree::node(3, letter0('a'), vec![left_child, right_child]);
        assert!(nta.try_run(&tree).unwrap());

        let left_child2 = EncodedTree::leaf(1, letter0('x'));
        let right_child2 = EncodedTree::leaf(2, letter0('b'));
        let swapped = EncodedTree::node(3, letter0('a'), vec![left_child2, right_child2]);
        assert!(!nta.try_run(&swapped).unwrap());
    }

    #[test_log::test]
    fn resource_exceeded_when_alphabet_ceiling_too_small() {
        let alphabet = WordAlphabet::new(['a', 'b']);
        let formula = parse("∃x(∃y(P_a(x)))").unwrap();
        let tight = Budget {
            max_extended_alphabet: 2,
            ..Budget::default()
        };
        assert!(matches!(
            compile_word(&formula, &alphabet, &tight),
            Err(Error::ResourceExceeded { .. })
        ));
    }
}
