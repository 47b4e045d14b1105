//! Fused reductions over vectors of nodes: `dot`, `dot_slice`, `sum`, `max`.
//!
//! `dot` and `dot_slice` collapse what would be n multiplies and n-1 adds into
//! a single graph node with 2n children, which keeps the attention and linear
//! layers from dominating graph size. They are gradient-equivalent to the
//! naive expansion (see the tests).

use crate::autograd::{ScalarNode, ValueRef};

/// Fused dot product of two equal-length vectors.
///
/// Produces one node whose children interleave `a[i], b[i]` with local grads
/// `b[i].data, a[i].data`, so after backward every element receives the same
/// gradient the elementwise multiply-add expansion would give it.
///
/// # Panics
///
/// Panics if the vectors differ in length.
#[must_use]
pub fn dot(a: &[ValueRef], b: &[ValueRef]) -> ValueRef {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");
    dot_slice(a, 0, b, 0, a.len())
}

/// Fused dot product over contiguous sub-ranges of two vectors.
///
/// Equivalent to `dot(&a[a_offset..a_offset + len], &b[b_offset..b_offset + len])`
/// without materializing the sub-vectors; attention uses this to address one
/// head's slice of the full-width query/key vectors in place.
///
/// # Panics
///
/// Panics if either range is out of bounds.
#[must_use]
pub fn dot_slice(
    a: &[ValueRef],
    a_offset: usize,
    b: &[ValueRef],
    b_offset: usize,
    len: usize,
) -> ValueRef {
    assert!(
        a_offset + len <= a.len(),
        "dot_slice: range {}..{} out of bounds for length {}",
        a_offset,
        a_offset + len,
        a.len()
    );
    assert!(
        b_offset + len <= b.len(),
        "dot_slice: range {}..{} out of bounds for length {}",
        b_offset,
        b_offset + len,
        b.len()
    );

    let mut data = 0.0;
    let mut children = Vec::with_capacity(2 * len);
    let mut local_grads = Vec::with_capacity(2 * len);
    for j in 0..len {
        let aj = &a[a_offset + j];
        let bj = &b[b_offset + j];
        data += aj.data() * bj.data();
        children.push(aj.clone());
        children.push(bj.clone());
        local_grads.push(bj.data());
        local_grads.push(aj.data());
    }
    ValueRef::new_with_graph(data, children, local_grads)
}

/// Differentiable sum of a non-empty vector (a chain of adds).
///
/// # Panics
///
/// Panics if `vec` is empty.
#[must_use]
pub fn sum(vec: &[ValueRef]) -> ValueRef {
    assert!(!vec.is_empty(), "sum: empty vector");
    let mut total = vec[0].clone();
    for v in &vec[1..] {
        total = &total + v;
    }
    total
}

/// Maximum of a non-empty vector, as a fresh leaf.
///
/// Deliberately non-differentiable: the result has no children, so no
/// gradient flows through the arg-max selection. Softmax subtracts this
/// constant for numerical stability, and its output is invariant to that
/// constant, so omitting the path leaves the true gradient unchanged. Do not
/// "fix" this into a differentiable max.
///
/// # Panics
///
/// Panics if `vec` is empty.
#[must_use]
pub fn max(vec: &[ValueRef]) -> ValueRef {
    assert!(!vec.is_empty(), "max: empty vector");
    let max_val = vec
        .iter()
        .map(ScalarNode::data)
        .fold(f64::NEG_INFINITY, f64::max);
    ValueRef::new(max_val)
}
