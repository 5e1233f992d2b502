//! Error types for model construction, binding, and inference.

use thiserror::Error;

/// Errors raised while declaring the graph, binding observations, or
/// running inference. Structural problems (shape, cycle, dangling
/// reference, type mismatch, state) are raised at declaration or
/// binding time; only `Numerical` can surface during a sweep.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ModelError {
    /// Dimension or range mismatch, or a use of an unresolved range.
    #[error("shape error: {0}")]
    Shape(String),

    /// A declaration would make a node depend on itself.
    #[error("cycle detected: {0}")]
    GraphCycle(String),

    /// A reference to a variable name that was never declared.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// A bound value disagrees with the declared type or shape.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Re-binding, binding a computed node, or inference requested
    /// before every required observation is bound.
    #[error("invalid state: {0}")]
    State(String),

    /// A precision combination stayed non-positive-definite after the
    /// regularization budget was spent.
    #[error("numerical error at node '{node}' (iteration {iteration}): {message}")]
    Numerical {
        node: String,
        iteration: usize,
        message: String,
    },
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Non-fatal: the iteration budget ran out before the tolerance was
/// met. The best available estimate is still returned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceWarning {
    pub iterations: usize,
    pub max_delta: f32,
}

impl std::fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no convergence after {} iterations (last max delta {:.3e})",
            self.iterations, self.max_delta
        )
    }
}
