//! The model graph: ranges, variables, factors, and the binding API.
//!
//! A `Model` is built by one owner in phases: declare extent variables
//! and ranges, bind the extents (which resolves the ranges), then
//! declare the replicated variables and factors, and finally bind
//! hyperparameters and data. Structural problems are rejected at the
//! declaration or binding call that introduces them.

use std::collections::HashMap;

use crate::common::*;
use crate::factor::{Factor, FactorId, FactorKind};
use crate::range::{Extents, Range, RangeId};
use crate::variable::{Dim, NodeRole, Value, VarId, VarType, Variable};
use matrix_util::traits::SpdOps;

/// Deterministic expression kinds accepted by `declare_deterministic`
pub enum DetExpr<'a> {
    MatVec { matrix: &'a str, vector: &'a str },
    Sum(Vec<&'a str>),
}

/// Distribution kinds accepted by `declare_stochastic`
pub enum DistExpr<'a> {
    GaussianMeanPrecision { mean: &'a str, precision: &'a str },
}

#[derive(Debug, Default)]
pub struct Model {
    ranges: Vec<Range>,
    vars: Vec<Variable>,
    factors: Vec<Factor>,
    var_names: HashMap<Box<str>, VarId>,
    range_names: HashMap<Box<str>, RangeId>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    ////////////////////
    // lookup helpers //
    ////////////////////

    pub fn var_id(&self, name: &str) -> ModelResult<VarId> {
        self.var_names
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))
    }

    pub fn range_id(&self, name: &str) -> ModelResult<RangeId> {
        self.range_names
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownVariable(format!("range '{}'", name)))
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.vars[id]
    }

    pub fn range(&self, id: RangeId) -> &Range {
        &self.ranges[id]
    }

    pub fn factor(&self, id: FactorId) -> &Factor {
        &self.factors[id]
    }

    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// A dimension drawn from a declared range's extent
    pub fn dim(&self, range_name: &str) -> ModelResult<Dim> {
        Ok(Dim::Ranged(self.range_id(range_name)?))
    }

    /// Resolved extents of a range, for reading back bound sizes
    pub fn extents(&self, range_name: &str) -> ModelResult<Extents> {
        let range = &self.ranges[self.range_id(range_name)?];
        range.extents.clone().ok_or_else(|| {
            ModelError::Shape(format!("range '{}' is not resolved", range.name))
        })
    }

    ////////////////////////////
    // range registry surface //
    ////////////////////////////

    /// Declare a flat index domain whose extent is the (to-be-bound)
    /// scalar integer variable `extent_var`.
    pub fn declare_range(&mut self, name: &str, extent_var: &str) -> ModelResult<RangeId> {
        if self.range_names.contains_key(name) {
            return Err(ModelError::State(format!(
                "range '{}' is already declared",
                name
            )));
        }

        let ev = self.var_id(extent_var)?;
        let var = &self.vars[ev];
        if var.vtype != VarType::IntScalar || !var.plates.is_empty() {
            return Err(ModelError::Shape(format!(
                "extent variable '{}' must be an unreplicated integer scalar",
                extent_var
            )));
        }

        let rid = self.ranges.len();
        self.ranges.push(Range {
            name: name.into(),
            extent_var: ev,
            outer: None,
            extents: None,
        });
        self.range_names.insert(name.into(), rid);

        if let Some(value) = self.vars[ev].binding.clone() {
            self.resolve_range(rid, &value)?;
        }
        Ok(rid)
    }

    /// Declare a jagged domain: one inner extent per index of `outer`,
    /// drawn from the entries of the integer array variable
    /// `extent_var` (which must be replicated over `outer`).
    pub fn declare_jagged_range(
        &mut self,
        name: &str,
        outer: &str,
        extent_var: &str,
    ) -> ModelResult<RangeId> {
        if self.range_names.contains_key(name) {
            return Err(ModelError::State(format!(
                "range '{}' is already declared",
                name
            )));
        }

        let outer_id = self.range_id(outer)?;
        let ev = self.var_id(extent_var)?;
        let var = &self.vars[ev];
        if var.vtype != VarType::IntScalar || var.plates != vec![outer_id] {
            return Err(ModelError::Shape(format!(
                "extent variable '{}' must be an integer scalar replicated over '{}'",
                extent_var, outer
            )));
        }

        let rid = self.ranges.len();
        self.ranges.push(Range {
            name: name.into(),
            extent_var: ev,
            outer: Some(outer_id),
            extents: None,
        });
        self.range_names.insert(name.into(), rid);

        if let Some(value) = self.vars[ev].binding.clone() {
            self.resolve_range(rid, &value)?;
        }
        Ok(rid)
    }

    fn resolve_range(&mut self, rid: RangeId, value: &Value) -> ModelResult<()> {
        let extents = self.extents_from(rid, value)?;
        self.ranges[rid].extents = Some(extents);
        Ok(())
    }

    /// Validate an extent binding without committing anything.
    fn extents_from(&self, rid: RangeId, value: &Value) -> ModelResult<Extents> {
        if self.ranges[rid].is_resolved() {
            return Err(ModelError::State(format!(
                "extent of range '{}' is already resolved",
                self.ranges[rid].name
            )));
        }

        let extents = match (self.ranges[rid].outer, value) {
            (None, Value::Int(k)) => {
                if *k < 0 {
                    return Err(ModelError::Shape(format!(
                        "range '{}' extent must be non-negative, got {}",
                        self.ranges[rid].name, k
                    )));
                }
                Extents::Flat(*k as usize)
            }
            (Some(outer), Value::IntArray(v)) => {
                let outer_extent = match &self.ranges[outer].extents {
                    Some(Extents::Flat(n)) => *n,
                    _ => {
                        return Err(ModelError::Shape(format!(
                            "outer range '{}' must be resolved before '{}'",
                            self.ranges[outer].name, self.ranges[rid].name
                        )))
                    }
                };
                if v.len() != outer_extent {
                    return Err(ModelError::Shape(format!(
                        "range '{}' needs {} extents, got {}",
                        self.ranges[rid].name,
                        outer_extent,
                        v.len()
                    )));
                }
                if let Some(bad) = v.iter().find(|&&k| k < 0) {
                    return Err(ModelError::Shape(format!(
                        "range '{}' extent must be non-negative, got {}",
                        self.ranges[rid].name, bad
                    )));
                }
                Extents::Jagged(v.iter().map(|&k| k as usize).collect())
            }
            _ => {
                return Err(ModelError::Shape(format!(
                    "range '{}' extent must be bound to an integer value, got {}",
                    self.ranges[rid].name,
                    value.kind()
                )))
            }
        };

        Ok(extents)
    }

    ////////////////////////////
    // variable graph surface //
    ////////////////////////////

    /// Register a free (externally bound) node.
    pub fn declare_variable(
        &mut self,
        name: &str,
        vtype: VarType,
        plates: &[&str],
    ) -> ModelResult<VarId> {
        let plates = self.plate_ids(plates)?;
        self.check_dim_ranges(&vtype, &plates)?;
        self.insert_variable(name, vtype, plates, NodeRole::Free)
    }

    /// Register a node computed from its parents. The child's type and
    /// shape are derived from the expression, never declared.
    pub fn declare_deterministic(
        &mut self,
        name: &str,
        expr: DetExpr<'_>,
        plates: &[&str],
    ) -> ModelResult<VarId> {
        let plates = self.plate_ids(plates)?;
        self.require_resolved(&plates)?;

        let (kind, vtype) = match expr {
            DetExpr::MatVec { matrix, vector } => {
                let a = self.var_id(matrix)?;
                let v = self.var_id(vector)?;
                let (rows, cols) = match self.vars[a].vtype {
                    VarType::Matrix(r, c) => (r, c),
                    _ => {
                        return Err(ModelError::Shape(format!(
                            "'{}' must be matrix-typed to multiply",
                            matrix
                        )))
                    }
                };
                let vdim = self.vector_dim(v)?;
                self.check_parent_plates(&plates, &[a, v])?;
                self.check_dims_match(cols, matrix, vdim, vector, &plates)?;
                (FactorKind::MatVec { matrix: a, vector: v }, VarType::Vector(rows))
            }
            DetExpr::Sum(term_names) => {
                if term_names.is_empty() {
                    return Err(ModelError::Shape("sum needs at least one term".into()));
                }
                let terms: Vec<VarId> = term_names
                    .iter()
                    .map(|t| self.var_id(t))
                    .collect::<ModelResult<_>>()?;
                let dim0 = self.vector_dim(terms[0])?;
                self.check_parent_plates(&plates, &terms)?;
                for (pos, &t) in terms.iter().enumerate().skip(1) {
                    let dim_t = self.vector_dim(t)?;
                    self.check_dims_match(dim0, term_names[0], dim_t, term_names[pos], &plates)?;
                }
                (FactorKind::Sum { terms }, VarType::Vector(dim0))
            }
        };

        let child = self.insert_variable(name, vtype, plates, NodeRole::Free)?;
        let factor = self.push_factor(child, kind)?;
        self.vars[child].role = NodeRole::Deterministic { factor };
        Ok(child)
    }

    /// Register a generative node, or attach a generating distribution
    /// to an already-declared free node of identical type and plates.
    pub fn declare_stochastic(
        &mut self,
        name: &str,
        dist: DistExpr<'_>,
        vtype: VarType,
        plates: &[&str],
    ) -> ModelResult<VarId> {
        let plates = self.plate_ids(plates)?;
        self.require_resolved(&plates)?;
        self.check_dim_ranges(&vtype, &plates)?;

        let DistExpr::GaussianMeanPrecision { mean, precision } = dist;
        let mean_id = self.var_id(mean)?;
        let prec_id = self.var_id(precision)?;
        self.check_parent_plates(&plates, &[mean_id, prec_id])?;

        // row dimension of the draw: the whole vector, or each row of
        // a matrix-typed child
        let draw_dim = match vtype {
            VarType::Vector(d) => d,
            VarType::Matrix(_, c) => c,
            _ => {
                return Err(ModelError::Shape(format!(
                    "'{}': only vector- or matrix-typed nodes can be Gaussian",
                    name
                )))
            }
        };

        let mean_dim = self.vector_dim(mean_id)?;
        self.check_dims_match(draw_dim, name, mean_dim, mean, &plates)?;
        let prec_dim = match self.vars[prec_id].vtype {
            VarType::Spd(d) => d,
            _ => {
                return Err(ModelError::Shape(format!(
                    "precision '{}' must be SPD-typed",
                    precision
                )))
            }
        };
        self.check_dims_match(draw_dim, name, prec_dim, precision, &plates)?;

        let child = match self.var_names.get(name) {
            None => self.insert_variable(name, vtype, plates, NodeRole::Free)?,
            Some(&existing) => {
                let var = &self.vars[existing];
                if var.role != NodeRole::Free {
                    return Err(ModelError::State(format!(
                        "'{}' already has a generating or deterministic factor",
                        name
                    )));
                }
                if var.vtype != vtype || var.plates != plates {
                    return Err(ModelError::Shape(format!(
                        "'{}' was declared with a different type or plates",
                        name
                    )));
                }
                existing
            }
        };

        let factor = self.push_factor(
            child,
            FactorKind::GaussianMeanPrecision {
                mean: mean_id,
                precision: prec_id,
            },
        )?;
        self.vars[child].role = NodeRole::Stochastic { factor };
        Ok(child)
    }

    fn insert_variable(
        &mut self,
        name: &str,
        vtype: VarType,
        plates: Vec<RangeId>,
        role: NodeRole,
    ) -> ModelResult<VarId> {
        if self.var_names.contains_key(name) {
            return Err(ModelError::State(format!(
                "variable '{}' is already declared",
                name
            )));
        }
        let id = self.vars.len();
        self.vars.push(Variable {
            name: name.into(),
            vtype,
            plates,
            role,
            binding: None,
        });
        self.var_names.insert(name.into(), id);
        Ok(id)
    }

    /// Append a factor after verifying acyclicity: no parent may
    /// transitively depend on the child.
    fn push_factor(&mut self, child: VarId, kind: FactorKind) -> ModelResult<FactorId> {
        let factor = Factor { child, kind };
        for parent in factor.parents() {
            if parent == child || self.depends_on(parent, child) {
                return Err(ModelError::GraphCycle(format!(
                    "'{}' would depend on itself through '{}'",
                    self.vars[child].name, self.vars[parent].name
                )));
            }
        }
        let id = self.factors.len();
        self.factors.push(factor);
        Ok(id)
    }

    /// `true` when `a` transitively depends on `b` through generating
    /// or deterministic factors.
    fn depends_on(&self, a: VarId, b: VarId) -> bool {
        let mut visited = vec![false; self.vars.len()];
        let mut stack = vec![a];
        while let Some(x) = stack.pop() {
            if x == b {
                return true;
            }
            if visited[x] {
                continue;
            }
            visited[x] = true;
            match self.vars[x].role {
                NodeRole::Stochastic { factor } | NodeRole::Deterministic { factor } => {
                    stack.extend(self.factors[factor].parents());
                }
                NodeRole::Free => {}
            }
        }
        false
    }

    ////////////////////////
    // observation binder //
    ////////////////////////

    /// Attach a concrete value to a declared node. One-shot: binding
    /// again, or binding a computed node, is rejected.
    pub fn bind(&mut self, name: &str, value: Value) -> ModelResult<()> {
        let id = self.var_id(name)?;

        if matches!(self.vars[id].role, NodeRole::Deterministic { .. }) {
            return Err(ModelError::State(format!(
                "'{}' is computed from its parents and cannot be bound",
                name
            )));
        }
        if self.vars[id].is_bound() {
            return Err(ModelError::State(format!("'{}' is already bound", name)));
        }

        let dependent_ranges: Vec<RangeId> = (0..self.ranges.len())
            .filter(|&r| self.ranges[r].extent_var == id)
            .collect();

        if dependent_ranges.is_empty() {
            self.check_value(id, &value)?;
            self.vars[id].binding = Some(value);
            return Ok(());
        }

        // extents get their own, stricter validation, and nothing is
        // committed until every dependent range checks out
        self.check_extent_value(id, &value)?;
        let resolved: Vec<(RangeId, Extents)> = dependent_ranges
            .into_iter()
            .map(|rid| Ok((rid, self.extents_from(rid, &value)?)))
            .collect::<ModelResult<_>>()?;

        self.vars[id].binding = Some(value);
        for (rid, extents) in resolved {
            self.ranges[rid].extents = Some(extents);
        }
        Ok(())
    }

    fn check_extent_value(&self, id: VarId, value: &Value) -> ModelResult<()> {
        let var = &self.vars[id];
        match (var.plates.is_empty(), value) {
            (true, Value::Int(_)) => Ok(()),
            (false, Value::IntArray(_)) => Ok(()),
            _ => Err(ModelError::Shape(format!(
                "'{}' is a range extent and must be bound to an integer value, got {}",
                var.name,
                value.kind()
            ))),
        }
    }

    /// Type- and shape-check a bound value against the declaration,
    /// replica by replica.
    fn check_value(&self, id: VarId, value: &Value) -> ModelResult<()> {
        let var = &self.vars[id];
        let replicas = self.replica_indices(&var.plates)?;

        let mismatch = |detail: String| {
            Err(ModelError::TypeMismatch(format!(
                "'{}': {}",
                var.name, detail
            )))
        };

        if var.plates.is_empty() {
            match (&var.vtype, value) {
                (VarType::IntScalar, Value::Int(_)) => Ok(()),
                (VarType::Vector(d), Value::Vector(x)) => {
                    let dim = self.dim_value(*d, &var.plates, &replicas[0])?;
                    if x.len() != dim {
                        return mismatch(format!("expected {}-vector, got {}", dim, x.len()));
                    }
                    Ok(())
                }
                (VarType::Matrix(r, c), Value::Matrix(x)) => {
                    let rows = self.dim_value(*r, &var.plates, &replicas[0])?;
                    let cols = self.dim_value(*c, &var.plates, &replicas[0])?;
                    if x.nrows() != rows || x.ncols() != cols {
                        return mismatch(format!(
                            "expected {}x{} matrix, got {}x{}",
                            rows,
                            cols,
                            x.nrows(),
                            x.ncols()
                        ));
                    }
                    Ok(())
                }
                (VarType::Spd(d), Value::Spd(x)) => {
                    let dim = self.dim_value(*d, &var.plates, &replicas[0])?;
                    self.check_spd(&var.name, x, dim)
                }
                _ => mismatch(format!(
                    "declared {:?}, bound {}",
                    var.vtype,
                    value.kind()
                )),
            }
        } else {
            let count_ok = |n: usize| -> ModelResult<()> {
                if n != replicas.len() {
                    return mismatch(format!(
                        "expected {} replicas, got {}",
                        replicas.len(),
                        n
                    ));
                }
                Ok(())
            };

            match (&var.vtype, value) {
                (VarType::IntScalar, Value::IntArray(v)) => count_ok(v.len()),
                (VarType::Vector(d), Value::VectorArray(xs)) => {
                    count_ok(xs.len())?;
                    for (x, idx) in xs.iter().zip(replicas.iter()) {
                        let dim = self.dim_value(*d, &var.plates, idx)?;
                        if x.len() != dim {
                            return mismatch(format!(
                                "replica {:?} expected {}-vector, got {}",
                                idx,
                                dim,
                                x.len()
                            ));
                        }
                    }
                    Ok(())
                }
                (VarType::Matrix(r, c), Value::MatrixArray(xs)) => {
                    count_ok(xs.len())?;
                    for (x, idx) in xs.iter().zip(replicas.iter()) {
                        let rows = self.dim_value(*r, &var.plates, idx)?;
                        let cols = self.dim_value(*c, &var.plates, idx)?;
                        if x.nrows() != rows || x.ncols() != cols {
                            return mismatch(format!(
                                "replica {:?} expected {}x{} matrix, got {}x{}",
                                idx,
                                rows,
                                cols,
                                x.nrows(),
                                x.ncols()
                            ));
                        }
                    }
                    Ok(())
                }
                (VarType::Spd(d), Value::SpdArray(xs)) => {
                    count_ok(xs.len())?;
                    for (x, idx) in xs.iter().zip(replicas.iter()) {
                        let dim = self.dim_value(*d, &var.plates, idx)?;
                        self.check_spd(&var.name, x, dim)?;
                    }
                    Ok(())
                }
                _ => mismatch(format!(
                    "declared replicated {:?}, bound {}",
                    var.vtype,
                    value.kind()
                )),
            }
        }
    }

    fn check_spd(&self, name: &str, x: &Mat, dim: usize) -> ModelResult<()> {
        if x.nrows() != dim || x.ncols() != dim {
            return Err(ModelError::TypeMismatch(format!(
                "'{}': expected {}x{} SPD matrix, got {}x{}",
                name,
                dim,
                dim,
                x.nrows(),
                x.ncols()
            )));
        }
        if !x.is_spd() {
            return Err(ModelError::TypeMismatch(format!(
                "'{}': bound matrix is not symmetric positive-definite",
                name
            )));
        }
        Ok(())
    }

    //////////////////////////////////
    // replica and shape arithmetic //
    //////////////////////////////////

    fn plate_ids(&self, plates: &[&str]) -> ModelResult<Vec<RangeId>> {
        plates.iter().map(|p| self.range_id(p)).collect()
    }

    fn require_resolved(&self, plates: &[RangeId]) -> ModelResult<()> {
        for &rid in plates {
            if !self.ranges[rid].is_resolved() {
                return Err(ModelError::Shape(format!(
                    "range '{}' must be resolved before building over it",
                    self.ranges[rid].name
                )));
            }
        }
        Ok(())
    }

    /// A jagged range used as a dimension needs its outer range among
    /// the plates, otherwise the per-replica length is undefined.
    fn check_dim_ranges(&self, vtype: &VarType, plates: &[RangeId]) -> ModelResult<()> {
        let dims: Vec<Dim> = match vtype {
            VarType::IntScalar => vec![],
            VarType::Vector(d) | VarType::Spd(d) => vec![*d],
            VarType::Matrix(r, c) => vec![*r, *c],
        };
        for dim in dims {
            if let Dim::Ranged(rid) = dim {
                if let Some(outer) = self.ranges[rid].outer {
                    if !plates.contains(&outer) {
                        return Err(ModelError::Shape(format!(
                            "jagged range '{}' used as a dimension without its outer range '{}' among the plates",
                            self.ranges[rid].name, self.ranges[outer].name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn vector_dim(&self, id: VarId) -> ModelResult<Dim> {
        match self.vars[id].vtype {
            VarType::Vector(d) => Ok(d),
            _ => Err(ModelError::Shape(format!(
                "'{}' must be vector-typed here",
                self.vars[id].name
            ))),
        }
    }

    /// Every parent plate must appear among the child's plates; the
    /// parent replica is found by projecting the child's index.
    fn check_parent_plates(&self, child_plates: &[RangeId], parents: &[VarId]) -> ModelResult<()> {
        for &pid in parents {
            for &pr in &self.vars[pid].plates {
                if !child_plates.contains(&pr) {
                    return Err(ModelError::Shape(format!(
                        "parent '{}' is replicated over '{}', which the child does not carry",
                        self.vars[pid].name, self.ranges[pr].name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Compare two declared dimensions replica by replica under the
    /// child's plates.
    fn check_dims_match(
        &self,
        da: Dim,
        label_a: &str,
        db: Dim,
        label_b: &str,
        child_plates: &[RangeId],
    ) -> ModelResult<()> {
        if da == db {
            return Ok(());
        }
        for idx in self.replica_indices(child_plates)? {
            let na = self.dim_value(da, child_plates, &idx)?;
            let nb = self.dim_value(db, child_plates, &idx)?;
            if na != nb {
                return Err(ModelError::Shape(format!(
                    "dimension mismatch between '{}' ({}) and '{}' ({}) at replica {:?}",
                    label_a, na, label_b, nb, idx
                )));
            }
        }
        Ok(())
    }

    /// Enumerate every multi-index over the given plates, inner plates
    /// varying fastest. Jagged plates take their extent from the outer
    /// plate's index, so the outer range must come first.
    pub fn replica_indices(&self, plates: &[RangeId]) -> ModelResult<Vec<Vec<usize>>> {
        let mut ret: Vec<Vec<usize>> = vec![vec![]];
        for (pos, &rid) in plates.iter().enumerate() {
            let range = &self.ranges[rid];
            let mut next = Vec::new();
            for idx in &ret {
                let extent = match (&range.extents, range.outer) {
                    (None, _) => {
                        return Err(ModelError::Shape(format!(
                            "range '{}' is not resolved",
                            range.name
                        )))
                    }
                    (Some(Extents::Flat(n)), _) => *n,
                    (Some(Extents::Jagged(v)), Some(outer)) => {
                        let opos =
                            plates[..pos].iter().position(|&q| q == outer).ok_or_else(|| {
                                ModelError::Shape(format!(
                                    "jagged range '{}' needs its outer range '{}' as an earlier plate",
                                    range.name, self.ranges[outer].name
                                ))
                            })?;
                        v[idx[opos]]
                    }
                    (Some(Extents::Jagged(_)), None) => {
                        return Err(ModelError::Shape(format!(
                            "range '{}' has jagged extents but no outer range",
                            range.name
                        )))
                    }
                };
                for j in 0..extent {
                    let mut e = idx.clone();
                    e.push(j);
                    next.push(e);
                }
            }
            ret = next;
        }
        Ok(ret)
    }

    /// Concrete length of a dimension at one replica index.
    pub fn dim_value(&self, dim: Dim, plates: &[RangeId], idx: &[usize]) -> ModelResult<usize> {
        match dim {
            Dim::Fixed(n) => Ok(n),
            Dim::Ranged(rid) => {
                let range = &self.ranges[rid];
                match (&range.extents, range.outer) {
                    (None, _) => Err(ModelError::Shape(format!(
                        "range '{}' is not resolved",
                        range.name
                    ))),
                    (Some(Extents::Flat(n)), _) => Ok(*n),
                    (Some(Extents::Jagged(_)), Some(outer)) => {
                        let opos = plates.iter().position(|&q| q == outer).ok_or_else(|| {
                            ModelError::Shape(format!(
                                "jagged range '{}' used outside its outer plate '{}'",
                                range.name, self.ranges[outer].name
                            ))
                        })?;
                        range.extent_at(idx[opos])
                    }
                    (Some(Extents::Jagged(_)), None) => Err(ModelError::Shape(format!(
                        "range '{}' has jagged extents but no outer range",
                        range.name
                    ))),
                }
            }
        }
    }

    /// Project a child replica index onto a parent's plates.
    pub fn project_index(
        &self,
        child_plates: &[RangeId],
        child_idx: &[usize],
        parent_plates: &[RangeId],
    ) -> Vec<usize> {
        parent_plates
            .iter()
            .map(|pr| {
                let pos = child_plates
                    .iter()
                    .position(|q| q == pr)
                    .expect("parent plates were validated at declaration");
                child_idx[pos]
            })
            .collect()
    }

    /// Everything the engine needs must be in place: all free nodes
    /// bound, all ranges resolved, all precisions observed.
    pub fn validate_ready(&self) -> ModelResult<()> {
        for range in &self.ranges {
            if !range.is_resolved() {
                return Err(ModelError::State(format!(
                    "range '{}' was never resolved",
                    range.name
                )));
            }
        }
        for var in &self.vars {
            if var.role == NodeRole::Free && !var.is_bound() {
                return Err(ModelError::State(format!(
                    "'{}' must be bound before inference",
                    var.name
                )));
            }
        }
        for factor in &self.factors {
            if let FactorKind::GaussianMeanPrecision { precision, .. } = factor.kind {
                if !self.vars[precision].is_bound() {
                    return Err(ModelError::State(format!(
                        "precision '{}' must be observed before inference",
                        self.vars[precision].name
                    )));
                }
            }
        }
        Ok(())
    }
}
