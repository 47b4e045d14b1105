//! Weight store: named parameter matrices with seeded Gaussian initialization.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::autograd::{Matrix, ScalarNode, ValueRef};
use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::config::Config;

/// Gaussian init mean; only the standard deviation is configurable.
const INIT_MEAN: f64 = 0.0;

/// All model parameters, keyed by matrix name.
///
/// Built once at model construction. Every scalar entry is its own leaf node
/// sampled independently, so no two parameters ever share a gradient
/// accumulator. A `BTreeMap` keeps enumeration deterministic: [`parameters`]
/// walks names lexicographically and each matrix row-major, and that order is
/// identical on every call within a run — the optimizer's moment buffers are
/// indexed positionally against it.
///
/// [`parameters`]: WeightStore::parameters
pub struct WeightStore {
    weights: BTreeMap<String, Matrix>,
}

impl WeightStore {
    /// Samples a fresh weight store for the given vocabulary size.
    ///
    /// Matrix names follow the GPT layout: `wte` (vocab x n_embed), `wpe`
    /// (block_size x n_embed), `lm_head` (vocab x n_embed), and per layer
    /// `layer{i}_attn_wq/wk/wv/wo`, `layer{i}_mlp_fc1/fc2`.
    #[must_use]
    pub fn new(cfg: &Config, vocab_size: usize, rng: &mut StdRng) -> Self {
        let normal = Normal::new(INIT_MEAN, cfg.init_std).unwrap();
        let mut init_matrix = |n_out: usize, n_in: usize| -> Matrix {
            (0..n_out)
                .map(|_| {
                    (0..n_in)
                        .map(|_| ValueRef::new(normal.sample(rng)))
                        .collect()
                })
                .collect()
        };

        let mut weights = BTreeMap::new();
        weights.insert("wte".to_string(), init_matrix(vocab_size, cfg.n_embed));
        weights.insert("wpe".to_string(), init_matrix(cfg.block_size, cfg.n_embed));
        weights.insert("lm_head".to_string(), init_matrix(vocab_size, cfg.n_embed));
        for li in 0..cfg.n_layer {
            let prefix = format!("layer{li}_");
            for name in ["attn_wq", "attn_wk", "attn_wv", "attn_wo"] {
                weights.insert(
                    format!("{prefix}{name}"),
                    init_matrix(cfg.n_embed, cfg.n_embed),
                );
            }
            weights.insert(
                format!("{prefix}mlp_fc1"),
                init_matrix(4 * cfg.n_embed, cfg.n_embed),
            );
            weights.insert(
                format!("{prefix}mlp_fc2"),
                init_matrix(cfg.n_embed, 4 * cfg.n_embed),
            );
        }

        WeightStore { weights }
    }

    /// Returns the matrix registered under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` was never registered; matrix names are fixed at
    /// construction, so a miss is a bug in the forward pass.
    #[must_use]
    pub fn matrix(&self, name: &str) -> &Matrix {
        self.weights
            .get(name)
            .unwrap_or_else(|| panic!("unknown weight matrix {name:?}"))
    }

    /// Returns every parameter node in a fixed, reproducible order
    /// (lexicographic by matrix name, row-major within each matrix).
    #[must_use]
    pub fn parameters(&self) -> Vec<ValueRef> {
        let mut params = Vec::new();
        for matrix in self.weights.values() {
            for row in matrix {
                params.extend(row.iter().cloned());
            }
        }
        params
    }

    /// Total number of scalar parameters.
    #[must_use]
    pub fn num_params(&self) -> usize {
        self.weights
            .values()
            .map(|m| m.iter().map(Vec::len).sum::<usize>())
            .sum()
    }

    /// Snapshots every matrix's current values into a [`Checkpoint`].
    #[must_use]
    pub fn export_values(&self) -> Checkpoint {
        let weights = self
            .weights
            .iter()
            .map(|(name, matrix)| {
                let rows = matrix
                    .iter()
                    .map(|row| row.iter().map(ScalarNode::data).collect())
                    .collect();
                (name.clone(), rows)
            })
            .collect();
        Checkpoint { weights }
    }

    /// Writes checkpointed values back into the existing parameter leaves.
    ///
    /// The graph nodes keep their identity — anything holding a parameter
    /// reference (an optimizer, a cached graph) observes the new values.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::ShapeMismatch`] when the checkpoint's names
    /// or matrix dimensions differ from this store's.
    pub fn import_values(&self, ckpt: &Checkpoint) -> Result<(), CheckpointError> {
        if ckpt.weights.len() != self.weights.len()
            || !ckpt.weights.keys().eq(self.weights.keys())
        {
            return Err(CheckpointError::ShapeMismatch {
                name: "<names>".to_string(),
                message: format!(
                    "checkpoint has {} matrices, model has {}",
                    ckpt.weights.len(),
                    self.weights.len()
                ),
            });
        }
        for (name, matrix) in &self.weights {
            let rows = &ckpt.weights[name];
            if rows.len() != matrix.len() {
                return Err(CheckpointError::ShapeMismatch {
                    name: name.clone(),
                    message: format!("expected {} rows, found {}", matrix.len(), rows.len()),
                });
            }
            for (row_values, row_nodes) in rows.iter().zip(matrix.iter()) {
                if row_values.len() != row_nodes.len() {
                    return Err(CheckpointError::ShapeMismatch {
                        name: name.clone(),
                        message: format!(
                            "expected row length {}, found {}",
                            row_nodes.len(),
                            row_values.len()
                        ),
                    });
                }
            }
        }
        for (name, matrix) in &self.weights {
            for (row_values, row_nodes) in ckpt.weights[name].iter().zip(matrix.iter()) {
                for (&value, node) in row_values.iter().zip(row_nodes.iter()) {
                    node.set_data(value);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn small_config() -> Config {
        Config {
            n_embed: 8,
            n_head: 2,
            n_layer: 1,
            block_size: 4,
            ..Config::default()
        }
    }

    #[test]
    fn num_params_matches_layout() {
        let cfg = small_config();
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let store = WeightStore::new(&cfg, 10, &mut rng);
        let expected = 10 * cfg.n_embed // wte
            + cfg.block_size * cfg.n_embed // wpe
            + 10 * cfg.n_embed // lm_head
            + cfg.n_layer
                * (4 * cfg.n_embed * cfg.n_embed
                    + (4 * cfg.n_embed) * cfg.n_embed
                    + cfg.n_embed * (4 * cfg.n_embed));
        assert_eq!(store.num_params(), expected);
        assert_eq!(store.parameters().len(), expected);
    }

    #[test]
    fn same_seed_gives_bit_identical_values() {
        let cfg = small_config();
        let mut rng_a = StdRng::seed_from_u64(123);
        let mut rng_b = StdRng::seed_from_u64(123);
        let a = WeightStore::new(&cfg, 7, &mut rng_a);
        let b = WeightStore::new(&cfg, 7, &mut rng_b);
        let pa = a.parameters();
        let pb = b.parameters();
        assert_eq!(pa.len(), pb.len());
        for (x, y) in pa.iter().zip(pb.iter()) {
            assert_eq!(x.data().to_bits(), y.data().to_bits());
        }
    }

    #[test]
    fn parameter_order_is_stable_across_calls() {
        let cfg = small_config();
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let store = WeightStore::new(&cfg, 5, &mut rng);
        let first = store.parameters();
        let second = store.parameters();
        for (x, y) in first.iter().zip(second.iter()) {
            // Same node, not merely the same value.
            x.set_grad(1.25);
            assert_eq!(y.grad(), 1.25);
            x.zero_grad();
        }
    }

    #[test]
    fn matrices_do_not_alias_each_other() {
        let cfg = small_config();
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let store = WeightStore::new(&cfg, 5, &mut rng);
        let wq = &store.matrix("layer0_attn_wq")[0][0];
        let wk = &store.matrix("layer0_attn_wk")[0][0];
        wq.set_grad(3.0);
        assert_eq!(wk.grad(), 0.0);
        wq.zero_grad();
    }

    #[test]
    fn export_then_import_round_trips() {
        let cfg = small_config();
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let store = WeightStore::new(&cfg, 6, &mut rng);
        let snapshot = store.export_values();

        // Perturb, restore, compare.
        for p in store.parameters() {
            p.set_data(0.0);
        }
        store.import_values(&snapshot).unwrap();
        for (p, original) in store
            .parameters()
            .iter()
            .zip(snapshot.weights.values().flatten().flatten())
        {
            assert_eq!(p.data(), *original);
        }
    }

    #[test]
    fn import_rejects_row_count_mismatch() {
        let cfg = small_config();
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let store = WeightStore::new(&cfg, 6, &mut rng);
        let mut snapshot = store.export_values();
        snapshot.weights.get_mut("wte").unwrap().pop();
        let result = store.import_values(&snapshot);
        assert!(matches!(
            result,
            Err(CheckpointError::ShapeMismatch { ref name, .. }) if name == "wte"
        ));
    }

    #[test]
    fn import_rejects_unknown_names() {
        let cfg = small_config();
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let store = WeightStore::new(&cfg, 6, &mut rng);
        let mut snapshot = store.export_values();
        let rows = snapshot.weights.remove("wte").unwrap();
        snapshot.weights.insert("wte_renamed".to_string(), rows);
        assert!(store.import_values(&snapshot).is_err());
    }
}
