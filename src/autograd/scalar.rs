//! Scalar autograd: computation graph of single float values with backpropagation.

use crate::autograd::{Exp, Log, Pow, ScalarNode};
use std::cell::RefCell;
use std::collections::HashSet;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

/// Internal scalar node: forward value, gradient, and graph edges for backprop.
///
/// `data` is fixed at construction; only `grad` mutates afterwards (during
/// backward, or when the optimizer overwrites a parameter via
/// [`ValueRef::set_data`]). `children` and `local_grads` always have the same
/// length: `local_grads[i]` is the partial derivative of this node with
/// respect to `children[i]`, evaluated at the operand values the node was
/// created with.
struct Value {
    /// Forward pass value.
    data: f64,
    /// Gradient of the loss with respect to this node; set during backward.
    grad: f64,
    /// Child nodes in the computation graph.
    children: Vec<ValueRef>,
    /// Local partial derivatives (one per child) for the chain rule.
    local_grads: Vec<f64>,
}

/// Handle to a scalar node in the autograd computation graph.
///
/// Wraps the node state in `Rc<RefCell<_>>`: the graph is a DAG in which the
/// same node (e.g. a weight) is legitimately a child of many parents, so
/// ownership is shared and gradients accumulate across all referencing
/// parents during backward.
#[derive(Clone)]
pub struct ValueRef(Rc<RefCell<Value>>);

impl ValueRef {
    /// Creates a leaf node (no children) with the given value and zero gradient.
    #[must_use]
    pub fn new(data: f64) -> Self {
        ValueRef(Rc::new(RefCell::new(Value {
            data,
            grad: 0.0,
            children: Vec::new(),
            local_grads: Vec::new(),
        })))
    }

    /// Creates a node that remembers its `children` and `local_grads` for backprop.
    pub(crate) fn new_with_graph(data: f64, children: Vec<ValueRef>, local_grads: Vec<f64>) -> Self {
        debug_assert_eq!(children.len(), local_grads.len());
        ValueRef(Rc::new(RefCell::new(Value {
            data,
            grad: 0.0,
            children,
            local_grads,
        })))
    }

    /// Overwrites the stored value.
    ///
    /// Only the optimizer calls this, between training steps, on parameter
    /// leaves. Non-leaf nodes belong to an already-built graph and their
    /// recorded local gradients would go stale.
    pub fn set_data(&self, data: f64) {
        self.0.borrow_mut().data = data;
    }

    /// Sets this node's gradient.
    ///
    /// Used to seed the backward root and by the optimizer when rescaling
    /// gradients (e.g. clipping).
    pub fn set_grad(&self, g: f64) {
        self.0.borrow_mut().grad = g;
    }

    /// Adds to this node's gradient (accumulation when a node has several parents).
    fn add_grad(&self, g: f64) {
        self.0.borrow_mut().grad += g;
    }

    /// ReLU: `max(0, self)`. Local grad is 1 if `self > 0`, else 0; the
    /// boundary `self == 0` yields gradient 0 by convention.
    #[must_use]
    pub fn relu(&self) -> ValueRef {
        let data = self.data().max(0.0);
        let local_grad = if self.data() > 0.0 { 1.0 } else { 0.0 };
        ValueRef::new_with_graph(data, vec![self.clone()], vec![local_grad])
    }

    fn key(&self) -> *const RefCell<Value> {
        Rc::as_ptr(&self.0)
    }
}

// -----------------------------------------------------------------------------
// std::ops — algebra: x + y, x - y, x * y, x / y, -x
// -----------------------------------------------------------------------------

impl Add for &ValueRef {
    type Output = ValueRef;

    fn add(self, rhs: Self) -> ValueRef {
        ValueRef::new_with_graph(
            self.data() + rhs.data(),
            vec![self.clone(), rhs.clone()],
            vec![1.0, 1.0],
        )
    }
}

impl Sub for &ValueRef {
    type Output = ValueRef;

    fn sub(self, rhs: Self) -> ValueRef {
        self + &(-rhs)
    }
}

impl Mul for &ValueRef {
    type Output = ValueRef;

    fn mul(self, rhs: Self) -> ValueRef {
        ValueRef::new_with_graph(
            self.data() * rhs.data(),
            vec![self.clone(), rhs.clone()],
            vec![rhs.data(), self.data()],
        )
    }
}

impl Div for &ValueRef {
    type Output = ValueRef;

    fn div(self, rhs: Self) -> ValueRef {
        self * &rhs.pow(-1.0)
    }
}

impl Neg for &ValueRef {
    type Output = ValueRef;

    fn neg(self) -> ValueRef {
        self * &ValueRef::new(-1.0)
    }
}

// -----------------------------------------------------------------------------
// Pow, Exp, Log — (&a).pow(exp), (&a).exp(), (&a).log()
// -----------------------------------------------------------------------------

impl Pow<f64> for &ValueRef {
    type Output = ValueRef;

    fn pow(self, exp: f64) -> ValueRef {
        let data = self.data().powf(exp);
        let local_grad = exp * self.data().powf(exp - 1.0);
        ValueRef::new_with_graph(data, vec![self.clone()], vec![local_grad])
    }
}

impl Exp for &ValueRef {
    type Output = ValueRef;

    fn exp(self) -> ValueRef {
        let data = self.data().exp();
        ValueRef::new_with_graph(data, vec![self.clone()], vec![data])
    }
}

impl Log for &ValueRef {
    type Output = ValueRef;

    fn log(self) -> ValueRef {
        assert!(
            self.data() > 0.0,
            "log: operand must be positive, got {}",
            self.data()
        );
        let data = self.data().ln();
        let local_grad = 1.0 / self.data();
        ValueRef::new_with_graph(data, vec![self.clone()], vec![local_grad])
    }
}

impl ScalarNode for ValueRef {
    fn data(&self) -> f64 {
        self.0.borrow().data
    }

    fn grad(&self) -> f64 {
        self.0.borrow().grad
    }

    /// Runs backprop: post-order topological sort, then chain rule from this
    /// node (e.g. the loss) down to all leaves.
    ///
    /// The walk is an explicit iterative DFS: the graph for one forward pass
    /// grows with sequence length x layers x heads, and recursing that deep
    /// can blow the call stack. Nodes are deduplicated by identity
    /// (`Rc::as_ptr`), never by value. Grads elsewhere in the graph are not
    /// cleared here; zeroing parameter grads between steps is the caller's
    /// job.
    fn backward(&self) {
        let mut topo: Vec<ValueRef> = Vec::new();
        let mut visited: HashSet<*const RefCell<Value>> = HashSet::new();

        // Each stack entry is (node, index of the next child to descend into).
        // A node is emitted to `topo` only once all its children have been.
        let mut stack: Vec<(ValueRef, usize)> = Vec::new();
        visited.insert(self.key());
        stack.push((self.clone(), 0));

        while let Some((node, child_idx)) = stack.pop() {
            let next_child = node.0.borrow().children.get(child_idx).cloned();
            match next_child {
                Some(child) => {
                    stack.push((node, child_idx + 1));
                    if visited.insert(child.key()) {
                        stack.push((child, 0));
                    }
                }
                None => topo.push(node),
            }
        }

        self.set_grad(1.0);

        // Reverse topological order: a node's grad is complete (all parents
        // have contributed) before it propagates to its own children.
        for v in topo.iter().rev() {
            let v_grad = v.grad();
            let v_borrowed = v.0.borrow();
            for (child, &local_grad) in v_borrowed
                .children
                .iter()
                .zip(v_borrowed.local_grads.iter())
            {
                child.add_grad(local_grad * v_grad);
            }
        }
    }

    fn zero_grad(&self) {
        self.set_grad(0.0);
    }
}
