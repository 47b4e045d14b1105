//! Tokenizer errors.

use std::fmt;

/// Errors produced by the tokenizer module.
///
/// # Variants
///
/// - **UnknownSymbol**: The input contains a symbol that is not in the
///   vocabulary. Raised by [`encode`](super::Tokenizer::encode); build the
///   tokenizer from a corpus that covers the input to avoid it.
///
/// - **InvalidId**: A token id is outside `[0, vocab_size)`. Raised by
///   [`decode`](super::Tokenizer::decode); ids should come from this
///   tokenizer's `encode` (or the model's logit indices, which share the
///   range).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    /// A symbol not in the vocabulary was encountered during encode.
    UnknownSymbol(String),

    /// A token id is out of range during decode.
    InvalidId(usize),
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::UnknownSymbol(s) => write!(f, "tokenizer: unknown symbol {s:?}"),
            TokenizerError::InvalidId(id) => write!(f, "tokenizer: invalid id {id}"),
        }
    }
}

impl std::error::Error for TokenizerError {}
