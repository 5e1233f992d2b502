//! Named index domains with extents resolved at binding time.
//!
//! A range goes through two phases: declared (tied to a scalar extent
//! variable) and resolved (the extent variable has been bound to a
//! concrete non-negative integer, or to one integer per index of an
//! outer range for jagged domains). Nothing replicated over a range
//! can be built until the range is resolved, and a resolved range
//! never changes.

use crate::errors::{ModelError, ModelResult};
use crate::variable::VarId;

pub type RangeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extents {
    Flat(usize),
    /// One extent per index of the outer range
    Jagged(Vec<usize>),
}

#[derive(Debug, Clone)]
pub struct Range {
    pub name: Box<str>,
    pub extent_var: VarId,
    pub outer: Option<RangeId>,
    pub extents: Option<Extents>,
}

impl Range {
    pub fn is_resolved(&self) -> bool {
        self.extents.is_some()
    }

    pub fn is_jagged(&self) -> bool {
        self.outer.is_some()
    }

    /// Extent of this domain at a given outer index (ignored for flat
    /// ranges).
    pub fn extent_at(&self, outer_idx: usize) -> ModelResult<usize> {
        match &self.extents {
            None => Err(ModelError::Shape(format!(
                "range '{}' is not resolved",
                self.name
            ))),
            Some(Extents::Flat(n)) => Ok(*n),
            Some(Extents::Jagged(v)) => v.get(outer_idx).copied().ok_or_else(|| {
                ModelError::Shape(format!(
                    "range '{}' has {} inner domains; outer index {} is out of bounds",
                    self.name,
                    v.len(),
                    outer_idx
                ))
            }),
        }
    }
}
