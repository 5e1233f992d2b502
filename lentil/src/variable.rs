//! Typed nodes of the variable graph.

use crate::common::{DVec, Mat};
use crate::factor::FactorId;
use crate::range::RangeId;

pub type VarId = usize;

/// A dimension is either a fixed constant or the extent of a declared
/// range (possibly jagged, in which case the concrete length depends
/// on the replica index of the range's outer plate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Fixed(usize),
    Ranged(RangeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    IntScalar,
    Vector(Dim),
    Matrix(Dim, Dim),
    /// Symmetric positive-definite square matrix
    Spd(Dim),
}

/// A concrete value attached to a node. Replicated nodes bind the
/// `*Array` variants, one entry per replica in plate order.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    IntArray(Vec<i64>),
    Vector(DVec),
    VectorArray(Vec<DVec>),
    Matrix(Mat),
    MatrixArray(Vec<Mat>),
    Spd(Mat),
    SpdArray(Vec<Mat>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::IntArray(_) => "int array",
            Value::Vector(_) => "vector",
            Value::VectorArray(_) => "vector array",
            Value::Matrix(_) => "matrix",
            Value::MatrixArray(_) => "matrix array",
            Value::Spd(_) => "spd matrix",
            Value::SpdArray(_) => "spd matrix array",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Declared input: must be bound before inference
    Free,
    /// Drawn from a generating factor; latent unless bound as evidence
    Stochastic { factor: FactorId },
    /// Computed from parents; never bound
    Deterministic { factor: FactorId },
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: Box<str>,
    pub vtype: VarType,
    /// Plate replication, outer to inner
    pub plates: Vec<RangeId>,
    pub role: NodeRole,
    pub binding: Option<Value>,
}

impl Variable {
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn is_latent(&self) -> bool {
        matches!(self.role, NodeRole::Stochastic { .. }) && !self.is_bound()
    }
}
