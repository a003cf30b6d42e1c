//! Compiles closed Monadic Second-Order (MSO) formulas over finite
//! words and finite ranked trees into finite automata that accept
//! exactly the formula's models.
//!
//! The public surface is small: [`eval::compile`] turns a formula and a
//! base alphabet into an [`eval::Automaton`]; [`eval::run`] evaluates it
//! against an encoded word or tree; [`eval::accepts`] does both in one
//! call. Everything else — the automaton algebra, the base-predicate
//! library, the formula AST/parser, and the treewidth pipeline that
//! produces ranked-tree encodings for the tree case — is exposed for
//! callers who want to compose the pipeline themselves rather than
//! through the three convenience entry points.

pub mod automaton;
pub mod base;
pub mod compile;
pub mod core;
pub mod error;
pub mod eval;
pub mod formula;
pub mod treewidth;

pub use compile::Budget;
pub use error::{Error, Result};
pub use eval::{accepts, compile as compile_formula, run, Automaton, BaseAlphabet, EncodedInput};
pub use formula::Formula;
