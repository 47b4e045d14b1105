//! Tests for the scalar autograd engine and fused reductions.
//!
//! Covers backward correctness for every elementary op (against closed forms
//! and centered finite differences), gradient accumulation through shared
//! nodes, and value/gradient equivalence of the fused reductions with their
//! naive expansions.

use crate::autograd::{dot, dot_slice, max, sum, Exp, Log, Pow, ScalarNode, ValueRef};

#[test]
fn scalar_add_backward() {
    let a = ValueRef::new(2.0);
    let b = ValueRef::new(3.0);
    let c = &a + &b;
    assert_eq!(c.data(), 5.0);
    c.backward();
    assert_eq!(a.grad(), 1.0);
    assert_eq!(b.grad(), 1.0);
}

#[test]
fn scalar_mul_backward() {
    let a = ValueRef::new(2.0);
    let b = ValueRef::new(3.0);
    let c = &a * &b;
    assert_eq!(c.data(), 6.0);
    c.backward();
    assert_eq!(a.grad(), 3.0);
    assert_eq!(b.grad(), 2.0);
}

#[test]
fn scalar_pow_backward() {
    let a = ValueRef::new(2.0);
    let b = (&a).pow(3.0);
    assert!((b.data() - 8.0).abs() < 1e-10);
    b.backward();
    // d/dx x^3 = 3x^2 = 12 at x=2
    assert!((a.grad() - 12.0).abs() < 1e-10);
}

#[test]
fn scalar_log_backward() {
    let a = ValueRef::new(std::f64::consts::E);
    let b = (&a).log();
    assert!((b.data() - 1.0).abs() < 1e-10);
    b.backward();
    assert!((a.grad() - 1.0 / std::f64::consts::E).abs() < 1e-10);
}

#[test]
#[should_panic(expected = "log: operand must be positive")]
fn scalar_log_rejects_non_positive() {
    let a = ValueRef::new(0.0);
    let _ = (&a).log();
}

#[test]
fn scalar_exp_backward() {
    let a = ValueRef::new(1.0);
    let b = (&a).exp();
    assert!((b.data() - std::f64::consts::E).abs() < 1e-10);
    b.backward();
    assert!((a.grad() - std::f64::consts::E).abs() < 1e-10);
}

#[test]
fn scalar_relu_backward_positive() {
    let a = ValueRef::new(1.5);
    let b = a.relu();
    assert_eq!(b.data(), 1.5);
    b.backward();
    assert_eq!(a.grad(), 1.0);
}

#[test]
fn scalar_relu_backward_negative() {
    let a = ValueRef::new(-0.5);
    let b = a.relu();
    assert_eq!(b.data(), 0.0);
    b.backward();
    assert_eq!(a.grad(), 0.0);
}

#[test]
fn scalar_relu_zero_boundary_has_zero_grad() {
    let a = ValueRef::new(0.0);
    let b = a.relu();
    assert_eq!(b.data(), 0.0);
    b.backward();
    assert_eq!(a.grad(), 0.0);
}

#[test]
fn scalar_neg_backward() {
    let a = ValueRef::new(3.0);
    let b = -&a;
    assert_eq!(b.data(), -3.0);
    b.backward();
    assert_eq!(a.grad(), -1.0);
}

#[test]
fn scalar_sub_backward() {
    let a = ValueRef::new(5.0);
    let b = ValueRef::new(2.0);
    let c = &a - &b;
    assert_eq!(c.data(), 3.0);
    c.backward();
    assert_eq!(a.grad(), 1.0);
    assert_eq!(b.grad(), -1.0);
}

#[test]
fn scalar_div_backward() {
    let a = ValueRef::new(6.0);
    let b = ValueRef::new(2.0);
    let c = &a / &b;
    assert_eq!(c.data(), 3.0);
    c.backward();
    assert_eq!(a.grad(), 0.5);
    assert_eq!(b.grad(), -1.5); // d/db (a/b) = -a/b^2 = -6/4
}

/// Centered finite difference of a scalar function at `x`.
fn finite_diff(f: impl Fn(f64) -> f64, x: f64) -> f64 {
    let h = 1e-6;
    (f(x + h) - f(x - h)) / (2.0 * h)
}

#[test]
fn elementary_ops_match_finite_differences() {
    // (point, analytic-grad builder, plain-float version of the op)
    let cases: Vec<(f64, fn(&ValueRef) -> ValueRef, fn(f64) -> f64)> = vec![
        (0.7, |a| (a).pow(2.5), |x| x.powf(2.5)),
        (1.3, |a| (a).exp(), f64::exp),
        (2.1, |a| (a).log(), f64::ln),
        (0.4, |a| a.relu(), |x| x.max(0.0)),
        (-0.9, |a| a.relu(), |x| x.max(0.0)),
        (1.8, |a| -a, |x| -x),
    ];
    for (x, build, plain) in cases {
        let a = ValueRef::new(x);
        let out = build(&a);
        out.backward();
        let numeric = finite_diff(plain, x);
        assert!(
            (a.grad() - numeric).abs() < 1e-4,
            "grad mismatch at x={x}: analytic {} vs numeric {numeric}",
            a.grad()
        );
    }
}

#[test]
fn binary_ops_match_finite_differences() {
    let (x, y) = (1.7, -0.6);
    let cases: Vec<(fn(&ValueRef, &ValueRef) -> ValueRef, fn(f64, f64) -> f64)> = vec![
        (|a, b| a + b, |a, b| a + b),
        (|a, b| a - b, |a, b| a - b),
        (|a, b| a * b, |a, b| a * b),
        (|a, b| a / b, |a, b| a / b),
    ];
    for (build, plain) in cases {
        let a = ValueRef::new(x);
        let b = ValueRef::new(y);
        let out = build(&a, &b);
        out.backward();
        let da = finite_diff(|v| plain(v, y), x);
        let db = finite_diff(|v| plain(x, v), y);
        assert!((a.grad() - da).abs() < 1e-4, "lhs grad: {} vs {da}", a.grad());
        assert!((b.grad() - db).abs() < 1e-4, "rhs grad: {} vs {db}", b.grad());
    }
}

#[test]
fn gradient_accumulates_when_node_reused() {
    // c = a + a => dc/da = 2
    let a = ValueRef::new(3.0);
    let c = &a + &a;
    assert_eq!(c.data(), 6.0);
    c.backward();
    assert_eq!(a.grad(), 2.0);
}

#[test]
fn diamond_graph_sums_both_paths() {
    // c = a*b; d = a + c; backward(d) => a.grad = b + 1, b.grad = a
    let a = ValueRef::new(2.0);
    let b = ValueRef::new(3.0);
    let c = &a * &b;
    let d = &a + &c;
    d.backward();
    assert!((a.grad() - (b.data() + 1.0)).abs() < 1e-10);
    assert!((b.grad() - a.data()).abs() < 1e-10);
}

#[test]
fn product_plus_term_scenario() {
    // c = a*b + a with a=2, b=3: c = 8, dc/da = b + 1 = 4, dc/db = a = 2
    let a = ValueRef::new(2.0);
    let b = ValueRef::new(3.0);
    let c = &(&a * &b) + &a;
    assert_eq!(c.data(), 8.0);
    c.backward();
    assert!((a.grad() - 4.0).abs() < 1e-10);
    assert!((b.grad() - 2.0).abs() < 1e-10);
}

#[test]
fn backward_does_not_clear_existing_grads() {
    let a = ValueRef::new(2.0);
    let b = &a * &ValueRef::new(3.0);
    b.backward();
    assert_eq!(a.grad(), 3.0);
    // Second backward on a fresh expression accumulates on top; zeroing
    // between steps is the caller's responsibility.
    let c = &a * &ValueRef::new(5.0);
    c.backward();
    assert_eq!(a.grad(), 8.0);
    a.zero_grad();
    assert_eq!(a.grad(), 0.0);
}

#[test]
fn backward_survives_deep_chains() {
    // A chain long enough to overflow the call stack if the topological walk
    // were recursive.
    let leaf = ValueRef::new(1.0);
    let mut node = leaf.clone();
    for _ in 0..200_000 {
        node = &node + &ValueRef::new(0.0);
    }
    node.backward();
    assert_eq!(leaf.grad(), 1.0);
}

// --- fused reductions ---

#[test]
fn dot_value_and_gradients() {
    // dot([1,2],[3,4]) = 11; grads (3,4) and (1,2)
    let a = vec![ValueRef::new(1.0), ValueRef::new(2.0)];
    let b = vec![ValueRef::new(3.0), ValueRef::new(4.0)];
    let d = dot(&a, &b);
    assert!((d.data() - 11.0).abs() < 1e-10);
    d.backward();
    assert_eq!(a[0].grad(), 3.0);
    assert_eq!(a[1].grad(), 4.0);
    assert_eq!(b[0].grad(), 1.0);
    assert_eq!(b[1].grad(), 2.0);
}

#[test]
fn dot_matches_naive_expansion() {
    let xs = [0.5, -1.25, 2.0, 3.75];
    let ys = [1.5, 0.25, -2.5, 0.125];

    let a: Vec<ValueRef> = xs.iter().map(|&x| ValueRef::new(x)).collect();
    let b: Vec<ValueRef> = ys.iter().map(|&y| ValueRef::new(y)).collect();
    let fused = dot(&a, &b);
    fused.backward();

    let a2: Vec<ValueRef> = xs.iter().map(|&x| ValueRef::new(x)).collect();
    let b2: Vec<ValueRef> = ys.iter().map(|&y| ValueRef::new(y)).collect();
    let mut naive = &a2[0] * &b2[0];
    for (ai, bi) in a2.iter().zip(b2.iter()).skip(1) {
        naive = &naive + &(ai * bi);
    }
    naive.backward();

    assert_eq!(fused.data(), naive.data());
    for (fa, na) in a.iter().zip(a2.iter()) {
        assert_eq!(fa.grad(), na.grad());
    }
    for (fb, nb) in b.iter().zip(b2.iter()) {
        assert_eq!(fb.grad(), nb.grad());
    }
}

#[test]
fn dot_slice_matches_dot_on_subranges() {
    let xs = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let ys = [0.5, 1.5, 2.5, 3.5, 4.5, 5.5];

    let a: Vec<ValueRef> = xs.iter().map(|&x| ValueRef::new(x)).collect();
    let b: Vec<ValueRef> = ys.iter().map(|&y| ValueRef::new(y)).collect();
    let sliced = dot_slice(&a, 2, &b, 1, 3);
    sliced.backward();

    let a2: Vec<ValueRef> = xs[2..5].iter().map(|&x| ValueRef::new(x)).collect();
    let b2: Vec<ValueRef> = ys[1..4].iter().map(|&y| ValueRef::new(y)).collect();
    let full = dot(&a2, &b2);
    full.backward();

    assert_eq!(sliced.data(), full.data());
    for j in 0..3 {
        assert_eq!(a[2 + j].grad(), a2[j].grad());
        assert_eq!(b[1 + j].grad(), b2[j].grad());
    }
    // Elements outside the slices receive nothing.
    assert_eq!(a[0].grad(), 0.0);
    assert_eq!(b[5].grad(), 0.0);
}

#[test]
#[should_panic(expected = "dot: length mismatch")]
fn dot_rejects_length_mismatch() {
    let a = vec![ValueRef::new(1.0)];
    let b = vec![ValueRef::new(1.0), ValueRef::new(2.0)];
    let _ = dot(&a, &b);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn dot_slice_rejects_out_of_bounds_range() {
    let a = vec![ValueRef::new(1.0), ValueRef::new(2.0)];
    let b = vec![ValueRef::new(3.0), ValueRef::new(4.0)];
    let _ = dot_slice(&a, 1, &b, 0, 2);
}

#[test]
fn sum_is_differentiable() {
    let v = vec![ValueRef::new(1.0), ValueRef::new(2.0), ValueRef::new(3.0)];
    let s = sum(&v);
    assert_eq!(s.data(), 6.0);
    s.backward();
    for x in &v {
        assert_eq!(x.grad(), 1.0);
    }
}

#[test]
#[should_panic(expected = "sum: empty vector")]
fn sum_rejects_empty() {
    let _ = sum(&[]);
}

#[test]
fn max_is_a_leaf_without_gradient_path() {
    let v = vec![ValueRef::new(1.0), ValueRef::new(5.0), ValueRef::new(3.0)];
    let m = max(&v);
    assert_eq!(m.data(), 5.0);
    // Using the max downstream must not route gradient into v.
    let out = &v[0] * &m;
    out.backward();
    assert_eq!(v[0].grad(), 5.0);
    assert_eq!(v[1].grad(), 0.0);
    assert_eq!(v[2].grad(), 0.0);
}

#[test]
fn max_handles_all_negative_inputs() {
    let v = vec![ValueRef::new(-4.0), ValueRef::new(-1.5), ValueRef::new(-9.0)];
    assert_eq!(max(&v).data(), -1.5);
}

#[test]
#[should_panic(expected = "max: empty vector")]
fn max_rejects_empty() {
    let _ = max(&[]);
}
