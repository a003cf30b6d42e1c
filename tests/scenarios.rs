//! End-to-end acceptance scenarios, one `#[test_log::test]` per scenario, driven
//! entirely through the public `compile`/`run`/`accepts` surface (no
//! internal module access).

use mso_automata::core::alphabet::{Bits, Letter, TreeAlphabet, WordAlphabet};
use mso_automata::core::tree::EncodedTree;
use mso_automata::core::word::EncodedWord;
use mso_automata::treewidth::{decompose, Graph};
use mso_automata::{accepts, BaseAlphabet, Budget, EncodedInput};

fn word_letter(c: char) -> Letter {
    Letter::new(c, Bits::zeros(0))
}

fn word_input(symbols: &str) -> EncodedInput {
    EncodedInput::Word(EncodedWord::new(symbols.chars().map(word_letter).collect()))
}

fn word_alphabet() -> BaseAlphabet {
    BaseAlphabet::Word(WordAlphabet::new(['a', 'b']))
}

#[test_log::test]
fn s1_exists_predicate_a() {
    let budget = Budget::default();
    let formula = "∃x(P_a(x))";
    assert!(accepts(formula, word_alphabet(), &word_input("ab"), &budget).unwrap());
    assert!(!accepts(formula, word_alphabet(), &word_input("bb"), &budget).unwrap());
    assert!(!accepts(formula, word_alphabet(), &word_input(""), &budget).unwrap());
}

#[test_log::test]
fn s2_every_a_has_a_later_b() {
    let budget = Budget::default();
    let formula = "∀x(->(P_a(x),∃y(and(P_b(y),le(x,y)))))";
    assert!(accepts(formula, word_alphabet(), &word_input("aab"), &budget).unwrap());
    assert!(!accepts(formula, word_alphabet(), &word_input("aba"), &budget).unwrap());
}

#[test_log::test]
fn s3_ordered_a_b_a_witness() {
    let budget = Budget::default();
    let formula =
        "∃x(∃y(∃z(and(le(x,y),and(le(y,z),and(P_a(x),and(P_b(y),P_a(z))))))))";
    assert!(accepts(formula, word_alphabet(), &word_input("aba"), &budget).unwrap());
    assert!(!accepts(formula, word_alphabet(), &word_input("aab"), &budget).unwrap());
}

#[test_log::test]
fn s4_set_of_a_positions_always_witnesses_x() {
    let budget = Budget::default();
    let formula = "∃X(∀x(<->(P_a(x),in(X,x))))";
    for w in ["", "a", "b", "ab", "ba", "aab", "abba", "bbb"] {
        assert!(
            accepts(formula, word_alphabet(), &word_input(w), &budget).unwrap(),
            "expected ACCEPT on {:?}",
            w
        );
    }
}

#[test_log::test]
fn s5_tree_a_node_with_b_in_left_subtree() {
    let budget = Budget::default();
    // {a:2, b:2, leaf:0}
    let alphabet = BaseAlphabet::Tree(TreeAlphabet::new([('a', 2), ('b', 2), ('l', 0)]));
    let formula = "∃x(∃y(and(P_a(x),and(P_b(y),left(x,y)))))";

    let b_subtree = EncodedTree::node(
        2,
        word_letter('b'),
        vec![
            EncodedTree::leaf(0, word_letter('l')),
            EncodedTree::leaf(1, word_letter('l')),
        ],
    );
    let other_leaf = EncodedTree::leaf(3, word_letter('l'));

    let b_on_the_left = EncodedTree::node(4, word_letter('a'), vec![b_subtree.clone(), other_leaf.clone()]);
    assert!(accepts(formula, alphabet.clone(), &EncodedInput::Tree(b_on_the_left), &budget).unwrap());

    let b_on_the_right = EncodedTree::node(4, word_letter('a'), vec![other_leaf, b_subtree]);
    assert!(!accepts(formula, alphabet, &EncodedInput::Tree(b_on_the_right), &budget).unwrap());
}

#[test_log::test]
fn s6_three_cycle_decomposition_has_three_small_bags() {
    let graph = Graph::new(
        vec!["a".into(), "b".into(), "c".into()],
        [(0, 1), (1, 2), (0, 2)],
    );
    let decomposition = decompose(&graph);
    assert_eq!(decomposition.bags.len(), 3);
    for bag in &decomposition.bags {
        assert!(bag.vertices.len() <= 3);
    }
    decomposition.check_invariants(&graph).unwrap();
}
