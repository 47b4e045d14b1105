//! Training: per-document cross-entropy loss and the Adam update loop.
//!
//! One step consumes one document: tokenize with BOS on both sides, run the
//! incremental forward pass per position, average the per-position
//! `-log p(target)` losses, backprop once, then update every parameter. The
//! Adam moment buffers are indexed positionally against
//! [`WeightStore::parameters`](crate::model::WeightStore::parameters), whose
//! order is stable across calls.

use crate::autograd::{sum, Log, ScalarNode, ValueRef};
use crate::config::Config;
use crate::model::{softmax, Gpt};
use crate::tokenizer::{Tokenizer, TokenizerError};

/// Adam optimizer with linear learning-rate decay and optional gradient
/// clipping.
///
/// Holds first/second moment buffers (`m`, `v`) per parameter and a step
/// counter for bias correction. The buffers are positional: every
/// [`Adam::apply`] call must pass the same parameter list, in the same order,
/// as the one the optimizer was sized for.
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    grad_clip: f64,
    num_steps: usize,
    m: Vec<f64>,
    v: Vec<f64>,
    step: usize,
}

impl Adam {
    /// Creates an optimizer for `num_params` parameters with hyperparameters
    /// from `cfg`.
    #[must_use]
    pub fn new(cfg: &Config, num_params: usize) -> Self {
        Adam {
            learning_rate: cfg.learning_rate,
            beta1: cfg.beta1,
            beta2: cfg.beta2,
            epsilon: cfg.epsilon,
            grad_clip: cfg.grad_clip,
            num_steps: cfg.num_steps,
            m: vec![0.0; num_params],
            v: vec![0.0; num_params],
            step: 0,
        }
    }

    /// One optimizer step: clip gradients (if enabled), update every
    /// parameter's value from its gradient, then zero the gradients.
    ///
    /// The learning rate decays linearly to zero over `num_steps`.
    ///
    /// # Panics
    ///
    /// Panics if `params` does not match the length the optimizer was built
    /// for; a shorter or reordered list would corrupt the moment buffers.
    pub fn apply(&mut self, params: &[ValueRef]) {
        assert_eq!(
            params.len(),
            self.m.len(),
            "adam: parameter count changed between steps"
        );

        if self.grad_clip > 0.0 {
            clip_gradients(params, self.grad_clip);
        }

        let lr_t = self.learning_rate * (1.0 - self.step as f64 / self.num_steps as f64);
        for (i, p) in params.iter().enumerate() {
            let grad = p.grad();
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * grad;
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * grad * grad;

            let m_hat = self.m[i] / (1.0 - self.beta1.powi(self.step as i32 + 1));
            let v_hat = self.v[i] / (1.0 - self.beta2.powi(self.step as i32 + 1));

            p.set_data(p.data() - lr_t * m_hat / (v_hat.sqrt() + self.epsilon));
            p.zero_grad();
        }
        self.step += 1;
    }
}

/// Rescales gradients so their global L2 norm does not exceed `max_norm`.
///
/// A no-op when the norm is already within bounds.
pub fn clip_gradients(params: &[ValueRef], max_norm: f64) {
    let norm = params
        .iter()
        .map(|p| p.grad() * p.grad())
        .sum::<f64>()
        .sqrt();
    if norm > max_norm {
        let scale = max_norm / norm;
        for p in params {
            p.set_grad(p.grad() * scale);
        }
    }
}

/// Mean next-token cross-entropy over one tokenized document.
///
/// Walks up to `block_size` transitions through a fresh cache: at each
/// position the model predicts the next token, and the position's loss is
/// `-log p(target)`.
///
/// # Panics
///
/// Panics if `tokens` has fewer than two entries (no transition to learn
/// from) or a token id is out of the model's vocabulary range.
#[must_use]
pub fn document_loss(model: &Gpt, tokens: &[usize], block_size: usize) -> ValueRef {
    assert!(
        tokens.len() >= 2,
        "document_loss: need at least two tokens, got {}",
        tokens.len()
    );
    let n = (tokens.len() - 1).min(block_size);

    let mut cache = model.new_cache();
    let mut losses = Vec::with_capacity(n);
    for pos_id in 0..n {
        let logits = model.forward(tokens[pos_id], pos_id, &mut cache);
        let probs = softmax(&logits);
        losses.push(-&(&probs[tokens[pos_id + 1]]).log());
    }
    &sum(&losses) / &ValueRef::new(n as f64)
}

/// Trains `model` for `num_steps` steps, cycling through `docs` in order.
///
/// Prints the loss at step 1 and every `cfg.loss_log_every` steps.
///
/// # Errors
///
/// [`TokenizerError`] if a document contains a symbol the tokenizer does not
/// know (cannot happen when the tokenizer was built from the same corpus).
pub fn train<T: Tokenizer>(
    model: &Gpt,
    tokenizer: &T,
    docs: &[&str],
    cfg: &Config,
    num_steps: usize,
) -> Result<(), TokenizerError> {
    let params = model.weights().parameters();
    let mut adam = Adam::new(cfg, params.len());
    let log_every = cfg.loss_log_every.max(1);

    for step in 0..num_steps {
        let doc = docs[step % docs.len()];
        let mut tokens = vec![tokenizer.bos_id()];
        tokens.extend(tokenizer.encode(doc)?);
        tokens.push(tokenizer.bos_id());

        let loss = document_loss(model, &tokens, cfg.block_size);
        loss.backward();
        adam.apply(&params);

        if (step + 1) % log_every == 0 || step == 0 {
            println!(
                "step {:4} / {:4} | loss {:.4}",
                step + 1,
                num_steps,
                loss.data()
            );
        }
    }
    Ok(())
}
