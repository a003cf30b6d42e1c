//! Encoded words: finite sequences of extended-alphabet letters.

use super::alphabet::{Bits, Letter};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodedWord {
    pub letters: Vec<Letter>,
}

impl EncodedWord {
    pub fn new(letters: Vec<Letter>) -> Self {
        Self { letters }
    }

    /// A word over the bare base alphabet (track width 0), for the common
    /// case of evaluating a fully quantified (closed) formula.
    pub fn plain(symbols: &str) -> Self {
        Self {
            letters: symbols
                .chars()
                .map(|c| Letter::new(c, Bits::zeros(0)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn track_width(&self) -> Option<usize> {
        self.letters.first().map(|l| l.bits.len())
    }
}
