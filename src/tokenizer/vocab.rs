//! Vocabulary: mapping between token ids and symbols.
//!
//! Ids are contiguous from `0` to `len - 1`, assigned in insertion order.

use std::collections::HashMap;

/// Maps token ids to symbols and back.
///
/// Symbols are stored as strings so the same vocab serves single-character
/// tokens and multi-character ones (e.g. the BOS marker).
#[derive(Clone, Debug)]
pub struct Vocab {
    id_to_sym: Vec<String>,
    sym_to_id: HashMap<String, usize>,
}

impl Vocab {
    /// Builds a vocab from symbols in order. Duplicates are skipped (first
    /// occurrence keeps its id).
    #[must_use]
    pub fn new(symbols: impl IntoIterator<Item = String>) -> Self {
        let mut vocab = Vocab {
            id_to_sym: Vec::new(),
            sym_to_id: HashMap::new(),
        };
        for s in symbols {
            vocab.grow(s);
        }
        vocab
    }

    /// Number of symbols (vocab size).
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_sym.len()
    }

    /// Returns `true` if the vocab holds no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_sym.is_empty()
    }

    /// Returns the symbol for `id`, or `None` if out of range.
    #[must_use]
    pub fn get_symbol(&self, id: usize) -> Option<&str> {
        self.id_to_sym.get(id).map(String::as_str)
    }

    /// Returns the id for `symbol`, or `None` if not in the vocab.
    #[must_use]
    pub fn get_id(&self, symbol: &str) -> Option<usize> {
        self.sym_to_id.get(symbol).copied()
    }

    /// Adds a symbol and returns its id; an existing symbol keeps its id.
    pub fn grow(&mut self, symbol: String) -> usize {
        if let Some(&id) = self.sym_to_id.get(&symbol) {
            return id;
        }
        let id = self.id_to_sym.len();
        self.id_to_sym.push(symbol.clone());
        self.sym_to_id.insert(symbol, id);
        id
    }
}
