//! Character-level tokenizer: one token per character.

use super::super::{Tokenizer, TokenizerError, Vocab};

/// Character-level tokenizer whose vocab is built from a corpus.
///
/// The BOS symbol takes id 0; the remaining ids follow the corpus's unique
/// characters in first-seen order.
#[derive(Clone, Debug)]
pub struct CharTokenizer {
    vocab: Vocab,
    bos_id: usize,
}

impl CharTokenizer {
    /// Builds a tokenizer from a corpus string.
    ///
    /// An empty corpus is fine; the vocab is then just the BOS symbol.
    #[must_use]
    pub fn from_corpus(corpus: &str, bos_symbol: &str) -> Self {
        let symbols = std::iter::once(bos_symbol.to_string())
            .chain(corpus.chars().map(|ch| ch.to_string()));
        CharTokenizer {
            vocab: Vocab::new(symbols),
            bos_id: 0,
        }
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, s: &str) -> Result<Vec<usize>, TokenizerError> {
        s.chars()
            .map(|ch| {
                let sym = ch.to_string();
                self.vocab
                    .get_id(&sym)
                    .ok_or(TokenizerError::UnknownSymbol(sym))
            })
            .collect()
    }

    fn decode(&self, ids: &[usize]) -> Result<String, TokenizerError> {
        let mut s = String::new();
        for &id in ids {
            let sym = self
                .vocab
                .get_symbol(id)
                .ok_or(TokenizerError::InvalidId(id))?;
            s.push_str(sym);
        }
        Ok(s)
    }

    fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    fn bos_id(&self) -> usize {
        self.bos_id
    }
}
