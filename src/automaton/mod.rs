pub mod algebra;
pub mod builder;
pub mod nfa;
pub mod nta;

pub use nfa::Nfa;
pub use nta::Nta;
