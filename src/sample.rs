//! Sampling: generate text one token at a time from a trained model.
//!
//! Starts from BOS and repeatedly feeds the last sampled token back through
//! the incremental forward pass, drawing each next token from the
//! temperature-scaled softmax distribution until BOS reappears or the block
//! is full.

use rand::rngs::StdRng;
use rand_distr::{weighted::WeightedIndex, Distribution};

use crate::autograd::{ScalarNode, ValueRef};
use crate::config::Config;
use crate::model::{softmax, Gpt};
use crate::tokenizer::{Tokenizer, TokenizerError};

/// Generates one sample string.
///
/// Each logit is divided by `cfg.temperature` before softmax (lower
/// temperature sharpens the distribution). If the weights ever degenerate to
/// an unsampleable distribution, the draw falls back to BOS and generation
/// stops.
///
/// # Errors
///
/// [`TokenizerError::InvalidId`] if a sampled id cannot be decoded (cannot
/// happen when the model's vocab size matches the tokenizer's).
pub fn sample<T: Tokenizer>(
    model: &Gpt,
    tokenizer: &T,
    cfg: &Config,
    rng: &mut StdRng,
) -> Result<String, TokenizerError> {
    let temperature = ValueRef::new(cfg.temperature);
    let mut cache = model.new_cache();
    let mut token_id = tokenizer.bos_id();
    let mut ids = Vec::new();

    for pos_id in 0..cfg.block_size {
        let logits = model.forward(token_id, pos_id, &mut cache);
        let scaled: Vec<ValueRef> = logits.iter().map(|l| l / &temperature).collect();
        let probs = softmax(&scaled);
        let weights: Vec<f64> = probs.iter().map(ScalarNode::data).collect();

        token_id = WeightedIndex::new(&weights)
            .ok()
            .map(|dist| dist.sample(rng))
            .unwrap_or(tokenizer.bos_id());

        if token_id == tokenizer.bos_id() {
            break;
        }
        ids.push(token_id);
    }
    tokenizer.decode(&ids)
}
