//! Pipeline: load data, build the tokenizer, train, checkpoint, sample.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::Config;
use crate::data::load_from_path;
use crate::model::Gpt;
use crate::sample::sample;
use crate::tokenizer::{CharTokenizer, Tokenizer};
use crate::train::train;

/// Symbol marking sequence boundaries in the vocabulary.
const BOS_SYMBOL: &str = "<BOS>";

/// Runs the full pipeline: load data, train, save a checkpoint, then sample.
///
/// Uses `cfg.input_path` for the dataset (one document per line). Prints
/// progress and samples to stdout.
///
/// # Errors
///
/// Propagates the first data, tokenizer, or checkpoint error.
pub fn run(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    run_impl(cfg, None)
}

/// Internal implementation: `max_steps = Some(n)` caps training at n steps
/// and the sample count at 2 (for tests).
pub(crate) fn run_impl(
    cfg: &Config,
    max_steps: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let data = load_from_path(&cfg.input_path)?;
    let mut docs = data.lines();
    docs.shuffle(&mut rng);
    println!("num docs: {}", docs.len());

    let corpus: String = docs.concat();
    let tokenizer = CharTokenizer::from_corpus(&corpus, BOS_SYMBOL);
    println!("vocab size: {}", tokenizer.vocab_size());

    let model = Gpt::new(cfg, tokenizer.vocab_size(), &mut rng);
    println!("num params: {}", model.weights().num_params());

    let steps = max_steps.unwrap_or(cfg.num_steps);
    train(&model, &tokenizer, &docs, cfg, steps)?;

    model.weights().export_values().save(&cfg.checkpoint_path)?;
    println!("checkpoint saved to {}", cfg.checkpoint_path.display());

    let samples = if max_steps.is_some() { 2 } else { cfg.sample_size };
    println!("\n--- inference ---");
    for sample_idx in 0..samples {
        let text = sample(&model, &tokenizer, cfg, &mut rng)?;
        println!("sample {:2}: {}", sample_idx + 1, text);
    }
    Ok(())
}
