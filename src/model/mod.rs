//! Model: the forward-graph builder.
//!
//! Composes linear projections, RMS normalization, causal multi-head
//! attention with an incremental key/value cache, and a feed-forward block
//! into one per-token forward pass producing vocabulary logits. Each call to
//! [`Gpt::forward`] handles a single sequence position; callers walk
//! positions in increasing order against the same [`KvCache`].

mod weights;

use rand::rngs::StdRng;

use crate::autograd::{dot, dot_slice, max, sum, Exp, Matrix, Pow, ScalarNode, ValueRef, Vector};
use crate::config::Config;

pub use weights::WeightStore;

/// Per-layer history of key and value vectors, one entry per processed
/// position.
///
/// Append-only within a sequence; causality falls out of the structure, since
/// attention at position `p` can only see entries appended at positions
/// `<= p`. Call [`KvCache::reset`] before starting a new sequence.
pub struct KvCache {
    keys: Vec<Vec<Vector>>,
    values: Vec<Vec<Vector>>,
}

impl KvCache {
    /// Creates an empty cache for `n_layer` layers.
    #[must_use]
    pub fn new(n_layer: usize) -> Self {
        KvCache {
            keys: vec![Vec::new(); n_layer],
            values: vec![Vec::new(); n_layer],
        }
    }

    /// Number of positions cached so far (uniform across layers).
    #[must_use]
    pub fn seq_len(&self) -> usize {
        self.keys.first().map_or(0, Vec::len)
    }

    /// Empties every layer's history; the next forward call starts a new
    /// sequence at position 0.
    pub fn reset(&mut self) {
        for layer in &mut self.keys {
            layer.clear();
        }
        for layer in &mut self.values {
            layer.clear();
        }
    }

    fn push(&mut self, layer: usize, k: Vector, v: Vector) {
        self.keys[layer].push(k);
        self.values[layer].push(v);
    }
}

/// Matrix-vector multiply: one fused dot product per row of `w`.
///
/// # Panics
///
/// Panics if any row of `w` differs in length from `x`.
#[must_use]
pub fn linear(x: &[ValueRef], w: &Matrix) -> Vector {
    w.iter()
        .map(|row| {
            assert_eq!(row.len(), x.len(), "linear: row length mismatch");
            dot(row, x)
        })
        .collect()
}

/// Logits to probabilities in [0, 1] summing to 1.
///
/// The raw maximum is subtracted before exponentiation for numerical
/// stability; it enters the graph as a constant leaf (see
/// [`max`](crate::autograd::max)), so gradients flow only through the logits
/// themselves.
#[must_use]
pub fn softmax(logits: &[ValueRef]) -> Vector {
    let max_v = max(logits);
    let exps: Vec<ValueRef> = logits.iter().map(|l| (&(l - &max_v)).exp()).collect();
    let total = sum(&exps);
    exps.iter().map(|e| e / &total).collect()
}

/// Root-mean-square normalization: scales `x` by `(mean(x^2) + eps)^(-1/2)`.
///
/// One scale node is shared by every output element, so during backward its
/// gradient accumulates from all consumers before flowing into `dot(x, x)`
/// and from there into each element. The epsilon keeps an all-zero input
/// finite.
#[must_use]
pub fn rms_norm(x: &[ValueRef], eps: f64) -> Vector {
    let n = ValueRef::new(x.len() as f64);
    let mean_square = &dot(x, x) / &n;
    let scale = (&(&mean_square + &ValueRef::new(eps))).pow(-0.5);
    x.iter().map(|xi| xi * &scale).collect()
}

/// The transformer model: configuration plus its weight store.
///
/// Stateless between calls apart from the weights; all per-sequence state
/// lives in the caller's [`KvCache`].
pub struct Gpt {
    cfg: Config,
    vocab_size: usize,
    weights: WeightStore,
}

impl Gpt {
    /// Initializes a model with freshly sampled weights.
    ///
    /// `cfg` must already be validated (in particular `n_embed % n_head == 0`).
    #[must_use]
    pub fn new(cfg: &Config, vocab_size: usize, rng: &mut StdRng) -> Self {
        let weights = WeightStore::new(cfg, vocab_size, rng);
        Gpt {
            cfg: cfg.clone(),
            vocab_size,
            weights,
        }
    }

    /// The weight store (e.g. for the optimizer or checkpointing).
    #[must_use]
    pub fn weights(&self) -> &WeightStore {
        &self.weights
    }

    /// Vocabulary size the model was built for (logit vector length).
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Creates an empty KV cache sized for this model's layer count.
    #[must_use]
    pub fn new_cache(&self) -> KvCache {
        KvCache::new(self.cfg.n_layer)
    }

    /// One incremental forward pass: token at `pos_id` to next-token logits.
    ///
    /// Embeddings (token row + position row) -> RMSNorm -> per layer:
    /// pre-norm attention with residual, pre-norm MLP with residual ->
    /// lm_head. Appends this position's key/value to `cache`; `pos_id` must
    /// equal `cache.seq_len()` so positions are processed in order.
    #[must_use]
    pub fn forward(&self, token_id: usize, pos_id: usize, cache: &mut KvCache) -> Vector {
        assert!(
            token_id < self.vocab_size,
            "forward: token id {token_id} out of range for vocab {}",
            self.vocab_size
        );
        assert!(
            pos_id < self.cfg.block_size,
            "forward: position {pos_id} exceeds block size {}",
            self.cfg.block_size
        );
        assert_eq!(
            pos_id,
            cache.seq_len(),
            "forward: positions must be processed in order against one cache"
        );

        let head_dim = self.cfg.head_dim();
        let wte = self.weights.matrix("wte");
        let wpe = self.weights.matrix("wpe");

        // Embeddings: what the token is + where it sits in the sequence.
        let mut x: Vector = wte[token_id]
            .iter()
            .zip(wpe[pos_id].iter())
            .map(|(t, p)| t + p)
            .collect();
        x = rms_norm(&x, self.cfg.rmsnorm_eps);

        for li in 0..self.cfg.n_layer {
            let prefix = format!("layer{li}_");

            // Attention block: project q/k/v, extend the cache, score every
            // cached position per head, mix values, project, residual.
            let x_residual = x.clone();
            x = rms_norm(&x, self.cfg.rmsnorm_eps);

            let q = linear(&x, self.weights.matrix(&format!("{prefix}attn_wq")));
            let k = linear(&x, self.weights.matrix(&format!("{prefix}attn_wk")));
            let v = linear(&x, self.weights.matrix(&format!("{prefix}attn_wv")));
            cache.push(li, k, v);

            let scale = ValueRef::new((head_dim as f64).sqrt());
            let mut x_attn = Vector::with_capacity(self.cfg.n_embed);
            for h in 0..self.cfg.n_head {
                let hs = h * head_dim;

                let attn_logits: Vector = cache.keys[li]
                    .iter()
                    .map(|k_t| &dot_slice(&q, hs, k_t, hs, head_dim) / &scale)
                    .collect();
                let attn_weights = softmax(&attn_logits);

                for j in 0..head_dim {
                    let mut head_out = ValueRef::new(0.0);
                    for (v_t, w_t) in cache.values[li].iter().zip(attn_weights.iter()) {
                        head_out = &head_out + &(w_t * &v_t[hs + j]);
                    }
                    x_attn.push(head_out);
                }
            }

            x = linear(&x_attn, self.weights.matrix(&format!("{prefix}attn_wo")));
            x = x
                .iter()
                .zip(x_residual.iter())
                .map(|(a, b)| a + b)
                .collect();

            // MLP block: expand 4x, ReLU, project back, residual.
            let x_residual = x.clone();
            x = rms_norm(&x, self.cfg.rmsnorm_eps);
            x = linear(&x, self.weights.matrix(&format!("{prefix}mlp_fc1")));
            x = x.iter().map(ValueRef::relu).collect();
            x = linear(&x, self.weights.matrix(&format!("{prefix}mlp_fc2")));
            x = x
                .iter()
                .zip(x_residual.iter())
                .map(|(a, b)| a + b)
                .collect();
        }

        linear(&x, self.weights.matrix("lm_head"))
    }
}
