//! Variational message passing over the declared graph.
//!
//! The engine expands plate replication (jagged extents included),
//! folds fully-observed priors into each latent parameter's natural
//! statistics, and then sweeps: a forward pass refreshing the
//! expectations of deterministic nodes, a backward pass turning each
//! factor's downstream beliefs into natural-parameter messages for its
//! latent neighbours, and a calibration pass recombining every latent
//! node's statistics. Messages within one factor are computed in
//! parallel and applied in replica order, so the schedule is
//! deterministic regardless of thread count.

use std::collections::HashMap;

use crate::common::*;
use crate::factor::{self, FactorId, FactorKind, GaussianMessage};
use crate::model::Model;
use crate::variable::{NodeRole, Value, VarId, VarType};

use matrix_param::dmatrix_gaussian::GaussianMatrix;
use matrix_param::dvector_gaussian::GaussianVector;
use matrix_param::traits::{Inference, NaturalStatParam};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy)]
pub struct InferenceOptions {
    /// Sweep budget
    pub max_iter: usize,
    /// Convergence tolerance on the max posterior-mean change
    pub tol: f32,
    /// Diagonal ridge used when a precision combination fails to
    /// factorize; escalates tenfold before giving up
    pub jitter: f32,
    /// Seed for the symmetry-breaking initialization
    pub rseed: u64,
    /// Scale of the initial posterior-mean noise
    pub init_sd: f32,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-4,
            jitter: 1e-6,
            rseed: 42,
            init_sd: 1e-2,
        }
    }
}

/// Outcome of one inference run. `warning` is set when the sweep
/// budget ran out before the tolerance was met; the posteriors still
/// hold the best available estimate.
#[derive(Debug, Clone)]
pub struct FitSummary {
    pub iterations: usize,
    pub max_delta: f32,
    pub warning: Option<ConvergenceWarning>,
}

#[derive(Debug)]
enum Belief {
    ObservedInt(i64),
    ObservedVector(DVec),
    ObservedMatrix(Mat),
    ObservedSpd(Mat),
    /// Current expectation of a computed node
    Determ(DVec),
    LatentVector(GaussianVector),
    LatentMatrix(GaussianMatrix),
}

#[derive(Debug)]
struct NodeState {
    name: Box<str>,
    indices: Vec<Vec<usize>>,
    index_of: HashMap<Vec<usize>, usize>,
    beliefs: Vec<Belief>,
    /// Downstream beliefs waiting at a deterministic node
    inbox: Vec<Vec<GaussianMessage>>,
}

#[derive(Debug)]
struct FactorInstance {
    child: usize,
    /// One replica per entry of `Factor::parents()`
    parent_replicas: Vec<usize>,
}

#[derive(Debug)]
struct FactorState {
    id: FactorId,
    instances: Vec<FactorInstance>,
    /// Gaussian factor whose mean and precision are both observed:
    /// folded into the child's prior naturals, skipped during sweeps
    static_prior: bool,
}

/// A message contribution produced during the backward pass, applied
/// in order after the parallel computation.
enum Contrib {
    Stat {
        var: VarId,
        replica: usize,
        msg: GaussianMessage,
    },
    StatRow {
        var: VarId,
        replica: usize,
        row: usize,
        msg: GaussianMessage,
    },
    Inbox {
        var: VarId,
        replica: usize,
        msg: GaussianMessage,
    },
}

#[derive(Debug)]
pub struct InferenceEngine<'a> {
    model: &'a Model,
    options: InferenceOptions,
    nodes: Vec<NodeState>,
    factor_states: Vec<FactorState>,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(model: &'a Model, options: InferenceOptions) -> ModelResult<Self> {
        model.validate_ready()?;

        let mut nodes = Vec::with_capacity(model.variables().len());
        for var in model.variables() {
            let indices = model.replica_indices(&var.plates)?;
            let index_of: HashMap<Vec<usize>, usize> = indices
                .iter()
                .enumerate()
                .map(|(i, idx)| (idx.clone(), i))
                .collect();

            let beliefs = Self::build_beliefs(model, var, &indices)?;
            let inbox = vec![vec![]; indices.len()];

            nodes.push(NodeState {
                name: var.name.clone(),
                indices,
                index_of,
                beliefs,
                inbox,
            });
        }

        let mut factor_states = Vec::with_capacity(model.factors().len());
        for (fid, fac) in model.factors().iter().enumerate() {
            let child_var = fac.child;
            let child_plates = &model.variable(child_var).plates;
            let parents = fac.parents();

            let instances = nodes[child_var]
                .indices
                .iter()
                .enumerate()
                .map(|(rep, idx)| {
                    let parent_replicas = parents
                        .iter()
                        .map(|&p| {
                            let pidx = model.project_index(
                                child_plates,
                                idx,
                                &model.variable(p).plates,
                            );
                            nodes[p].index_of[&pidx]
                        })
                        .collect();
                    FactorInstance {
                        child: rep,
                        parent_replicas,
                    }
                })
                .collect();

            let static_prior = match fac.kind {
                FactorKind::GaussianMeanPrecision { mean, precision } => {
                    model.variable(mean).is_bound() && model.variable(precision).is_bound()
                }
                _ => false,
            };

            factor_states.push(FactorState {
                id: fid,
                instances,
                static_prior,
            });
        }

        let mut engine = Self {
            model,
            options,
            nodes,
            factor_states,
        };
        engine.fold_static_priors()?;
        engine.seed_posterior_means();
        Ok(engine)
    }

    pub fn options(&self) -> &InferenceOptions {
        &self.options
    }

    fn build_beliefs(
        model: &Model,
        var: &crate::variable::Variable,
        indices: &[Vec<usize>],
    ) -> ModelResult<Vec<Belief>> {
        if let Some(value) = &var.binding {
            let beliefs = match value {
                Value::Int(k) => vec![Belief::ObservedInt(*k)],
                Value::IntArray(v) => v.iter().map(|&k| Belief::ObservedInt(k)).collect(),
                Value::Vector(x) => vec![Belief::ObservedVector(x.clone())],
                Value::VectorArray(xs) => xs
                    .iter()
                    .map(|x| Belief::ObservedVector(x.clone()))
                    .collect(),
                Value::Matrix(x) => vec![Belief::ObservedMatrix(x.clone())],
                Value::MatrixArray(xs) => xs
                    .iter()
                    .map(|x| Belief::ObservedMatrix(x.clone()))
                    .collect(),
                Value::Spd(x) => vec![Belief::ObservedSpd(x.clone())],
                Value::SpdArray(xs) => {
                    xs.iter().map(|x| Belief::ObservedSpd(x.clone())).collect()
                }
            };
            return Ok(beliefs);
        }

        match var.role {
            NodeRole::Free => Err(ModelError::State(format!(
                "'{}' must be bound before inference",
                var.name
            ))),
            NodeRole::Deterministic { .. } => indices
                .iter()
                .map(|idx| {
                    let dim = match var.vtype {
                        VarType::Vector(d) => model.dim_value(d, &var.plates, idx)?,
                        _ => {
                            return Err(ModelError::Shape(format!(
                                "computed node '{}' must be vector-valued",
                                var.name
                            )))
                        }
                    };
                    Ok(Belief::Determ(DVec::zeros(dim)))
                })
                .collect(),
            NodeRole::Stochastic { .. } => indices
                .iter()
                .map(|idx| match var.vtype {
                    VarType::Vector(d) => {
                        let dim = model.dim_value(d, &var.plates, idx)?;
                        Ok(Belief::LatentVector(GaussianVector::flat(dim)))
                    }
                    VarType::Matrix(r, c) => {
                        let rows = model.dim_value(r, &var.plates, idx)?;
                        let cols = model.dim_value(c, &var.plates, idx)?;
                        Ok(Belief::LatentMatrix(GaussianMatrix::flat(rows, cols)))
                    }
                    _ => Err(ModelError::Shape(format!(
                        "latent node '{}' must be vector- or matrix-valued",
                        var.name
                    ))),
                })
                .collect(),
        }
    }

    /// Bake observed (mean, precision) priors into the latent child's
    /// natural parameters so sweeps only pass dynamic messages.
    fn fold_static_priors(&mut self) -> ModelResult<()> {
        for k in 0..self.factor_states.len() {
            if !self.factor_states[k].static_prior {
                continue;
            }
            let fid = self.factor_states[k].id;
            let fac = self.model.factor(fid);
            let (mean_var, prec_var) = match fac.kind {
                FactorKind::GaussianMeanPrecision { mean, precision } => (mean, precision),
                _ => continue,
            };

            for i in 0..self.factor_states[k].instances.len() {
                let (child_rep, mean_rep, prec_rep) = {
                    let inst = &self.factor_states[k].instances[i];
                    (inst.child, inst.parent_replicas[0], inst.parent_replicas[1])
                };
                let lambda = self.spd_value(prec_var, prec_rep)?.clone();
                let mean = self.vector_value(mean_var, mean_rep)?;
                let eta = &lambda * &mean;
                let node_name = self.nodes[fac.child].name.to_string();
                let jitter = self.options.jitter;

                let numerical = |e: anyhow::Error| ModelError::Numerical {
                    node: node_name.clone(),
                    iteration: 0,
                    message: e.to_string(),
                };

                match &mut self.nodes[fac.child].beliefs[child_rep] {
                    Belief::LatentVector(param) => {
                        param.set_prior(lambda, eta);
                        param.reset_stat();
                        param.calibrate(jitter).map_err(numerical)?;
                    }
                    Belief::LatentMatrix(param) => {
                        param.set_row_prior(lambda, eta);
                        param.reset_stat();
                        param.calibrate(jitter).map_err(numerical)?;
                    }
                    // evidence node: nothing to fold
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Perturb every latent mean with small seeded noise; without it
    /// the bilinear loading×latent updates start at a fixed point.
    fn seed_posterior_means(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.options.rseed);
        let sd = self.options.init_sd;
        for node in self.nodes.iter_mut() {
            for belief in node.beliefs.iter_mut() {
                match belief {
                    Belief::LatentVector(param) => {
                        let noise = DVec::from_fn(param.dim(), |_, _| {
                            let z: f32 = rng.sample(StandardNormal);
                            z * sd
                        });
                        let mean = param.posterior_mean() + noise;
                        param.set_posterior_mean(mean);
                    }
                    Belief::LatentMatrix(param) => {
                        let (r, c) = (param.nrows(), param.ncols());
                        let noise = Mat::from_fn(r, c, |_, _| {
                            let z: f32 = rng.sample(StandardNormal);
                            z * sd
                        });
                        let mean = param.posterior_mean() + noise;
                        param.set_posterior_mean(mean);
                    }
                    _ => {}
                }
            }
        }
    }

    ////////////////////
    // sweep mechanics //
    ////////////////////

    pub fn run(&mut self) -> ModelResult<FitSummary> {
        let mut max_delta = f32::INFINITY;

        for iter in 0..self.options.max_iter {
            self.forward_pass()?;
            self.reset_sweep();
            self.backward_pass()?;
            max_delta = self.calibrate_all(iter)?;

            if (iter + 1) % 10 == 0 {
                info!("sweep {}: max delta {:.3e}", iter + 1, max_delta);
            }

            if max_delta < self.options.tol {
                info!("converged after {} sweeps", iter + 1);
                return Ok(FitSummary {
                    iterations: iter + 1,
                    max_delta,
                    warning: None,
                });
            }
        }

        let warning = ConvergenceWarning {
            iterations: self.options.max_iter,
            max_delta,
        };
        warn!("{}", warning);
        Ok(FitSummary {
            iterations: self.options.max_iter,
            max_delta,
            warning: Some(warning),
        })
    }

    /// Refresh the expectations of computed nodes, parents first.
    fn forward_pass(&mut self) -> ModelResult<()> {
        for k in 0..self.factor_states.len() {
            let fid = self.factor_states[k].id;
            let fac = self.model.factor(fid);
            if !fac.is_deterministic() {
                continue;
            }

            let values: ModelResult<Vec<DVec>> = self.factor_states[k]
                .instances
                .par_iter()
                .map(|inst| self.eval_det_instance(fid, inst))
                .collect();
            let values = values?;

            let child = fac.child;
            for (pos, val) in values.into_iter().enumerate() {
                let rep = self.factor_states[k].instances[pos].child;
                if let Belief::Determ(v) = &mut self.nodes[child].beliefs[rep] {
                    *v = val;
                }
            }
        }
        Ok(())
    }

    fn eval_det_instance(&self, fid: FactorId, inst: &FactorInstance) -> ModelResult<DVec> {
        match &self.model.factor(fid).kind {
            FactorKind::MatVec { matrix, vector } => {
                let a_mean = self.matrix_value(*matrix, inst.parent_replicas[0])?;
                let v_mean = self.vector_value(*vector, inst.parent_replicas[1])?;
                Ok(a_mean * v_mean)
            }
            FactorKind::Sum { terms } => {
                let mut total = self.vector_value(terms[0], inst.parent_replicas[0])?;
                for (pos, &t) in terms.iter().enumerate().skip(1) {
                    total += self.vector_value(t, inst.parent_replicas[pos])?;
                }
                Ok(total)
            }
            FactorKind::GaussianMeanPrecision { .. } => Err(ModelError::Shape(
                "generative factors have no forward expectation".into(),
            )),
        }
    }

    fn reset_sweep(&mut self) {
        for node in self.nodes.iter_mut() {
            for belief in node.beliefs.iter_mut() {
                match belief {
                    Belief::LatentVector(param) => param.reset_stat(),
                    Belief::LatentMatrix(param) => param.reset_stat(),
                    _ => {}
                }
            }
            for inbox in node.inbox.iter_mut() {
                inbox.clear();
            }
        }
    }

    /// Walk the factors consumers-first so every deterministic node's
    /// inbox is complete before its own factor distributes it.
    fn backward_pass(&mut self) -> ModelResult<()> {
        for k in (0..self.factor_states.len()).rev() {
            if self.factor_states[k].static_prior {
                continue;
            }

            let fid = self.factor_states[k].id;
            let contribs: ModelResult<Vec<Vec<Contrib>>> = self.factor_states[k]
                .instances
                .par_iter()
                .map(|inst| self.factor_contribs(fid, inst))
                .collect();

            for contrib in contribs?.into_iter().flatten() {
                self.apply(contrib);
            }
        }
        Ok(())
    }

    fn factor_contribs(&self, fid: FactorId, inst: &FactorInstance) -> ModelResult<Vec<Contrib>> {
        let fac = self.model.factor(fid);
        let mut out = Vec::new();

        match &fac.kind {
            FactorKind::GaussianMeanPrecision { mean, precision } => {
                let lambda = self.spd_value(*precision, inst.parent_replicas[1])?;
                let mean_rep = inst.parent_replicas[0];

                // factor -> child
                let mean_val = self.vector_value(*mean, mean_rep)?;
                match &self.nodes[fac.child].beliefs[inst.child] {
                    Belief::LatentVector(_) => out.push(Contrib::Stat {
                        var: fac.child,
                        replica: inst.child,
                        msg: factor::gaussian_to_child(lambda, &mean_val),
                    }),
                    Belief::LatentMatrix(param) => {
                        let msg = factor::gaussian_to_child(lambda, &mean_val);
                        for row in 0..param.nrows() {
                            out.push(Contrib::StatRow {
                                var: fac.child,
                                replica: inst.child,
                                row,
                                msg: msg.clone(),
                            });
                        }
                    }
                    _ => {}
                }

                // factor -> mean parent (precision is always observed)
                if self.wants_message(*mean, mean_rep) {
                    let msg = match &self.nodes[fac.child].beliefs[inst.child] {
                        Belief::ObservedVector(x) => Some(factor::gaussian_to_mean(lambda, x)),
                        Belief::LatentVector(param) => {
                            Some(factor::gaussian_to_mean(lambda, param.posterior_mean()))
                        }
                        Belief::ObservedMatrix(x) => {
                            let mut sum_rows = DVec::zeros(x.ncols());
                            for i in 0..x.nrows() {
                                sum_rows += x.row(i).transpose();
                            }
                            Some(GaussianMessage {
                                lambda: lambda * x.nrows() as f32,
                                eta: lambda * sum_rows,
                            })
                        }
                        Belief::LatentMatrix(param) => {
                            let mm = param.posterior_mean();
                            let mut sum_rows = DVec::zeros(mm.ncols());
                            for i in 0..mm.nrows() {
                                sum_rows += mm.row(i).transpose();
                            }
                            Some(GaussianMessage {
                                lambda: lambda * mm.nrows() as f32,
                                eta: lambda * sum_rows,
                            })
                        }
                        _ => None,
                    };
                    if let Some(msg) = msg {
                        out.push(self.route(*mean, mean_rep, msg));
                    }
                }
            }

            FactorKind::MatVec { matrix, vector } => {
                let combined = match self.combined_inbox(fac.child, inst.child) {
                    Some(msg) => msg,
                    None => return Ok(out),
                };
                let a_rep = inst.parent_replicas[0];
                let v_rep = inst.parent_replicas[1];

                if self.wants_message(*vector, v_rep) {
                    let a_mean = self.matrix_value(*matrix, a_rep)?;
                    let a_rows = self.latent_matrix(*matrix, a_rep);
                    let msg = factor::matvec_to_vector(&a_mean, a_rows, &combined);
                    out.push(self.route(*vector, v_rep, msg));
                }

                if let Some(param) = self.latent_matrix(*matrix, a_rep) {
                    let v_mean = self.vector_value(*vector, v_rep)?;
                    let v_second = self.second_moment(*vector, v_rep)?;
                    let a_mean = param.posterior_mean();
                    let msgs =
                        factor::matvec_to_matrix_rows(&v_mean, &v_second, a_mean, &combined);
                    for (row, msg) in msgs.into_iter().enumerate() {
                        out.push(Contrib::StatRow {
                            var: *matrix,
                            replica: a_rep,
                            row,
                            msg,
                        });
                    }
                }
            }

            FactorKind::Sum { terms } => {
                let combined = match self.combined_inbox(fac.child, inst.child) {
                    Some(msg) => msg,
                    None => return Ok(out),
                };
                let total_mean = self.vector_value(fac.child, inst.child)?;

                for (pos, &term) in terms.iter().enumerate() {
                    let t_rep = inst.parent_replicas[pos];
                    if !self.wants_message(term, t_rep) {
                        continue;
                    }
                    let term_mean = self.vector_value(term, t_rep)?;
                    let msg = factor::sum_to_term(&combined, &total_mean, &term_mean);
                    out.push(self.route(term, t_rep, msg));
                }
            }
        }

        Ok(out)
    }

    /// Natural-parameter combination of everything waiting at a
    /// deterministic node.
    fn combined_inbox(&self, var: VarId, replica: usize) -> Option<GaussianMessage> {
        let inbox = &self.nodes[var].inbox[replica];
        if inbox.is_empty() {
            return None;
        }
        let dim = inbox[0].eta.len();
        Some(GaussianMessage::combine(dim, inbox))
    }

    /// Latent and deterministic nodes receive messages; observed ones
    /// absorb them.
    fn wants_message(&self, var: VarId, replica: usize) -> bool {
        matches!(
            self.nodes[var].beliefs[replica],
            Belief::LatentVector(_) | Belief::Determ(_)
        )
    }

    fn route(&self, var: VarId, replica: usize, msg: GaussianMessage) -> Contrib {
        match &self.nodes[var].beliefs[replica] {
            Belief::Determ(_) => Contrib::Inbox { var, replica, msg },
            _ => Contrib::Stat { var, replica, msg },
        }
    }

    fn apply(&mut self, contrib: Contrib) {
        match contrib {
            Contrib::Stat { var, replica, msg } => {
                if let Belief::LatentVector(param) = &mut self.nodes[var].beliefs[replica] {
                    param.add_stat(&msg.lambda, &msg.eta);
                }
            }
            Contrib::StatRow {
                var,
                replica,
                row,
                msg,
            } => {
                if let Belief::LatentMatrix(param) = &mut self.nodes[var].beliefs[replica] {
                    param.add_stat_row(row, &msg.lambda, &msg.eta);
                }
            }
            Contrib::Inbox { var, replica, msg } => {
                self.nodes[var].inbox[replica].push(msg);
            }
        }
    }

    /// Recombine statistics into posterior moments; returns the max
    /// ∞-norm change of the posterior means.
    fn calibrate_all(&mut self, iter: usize) -> ModelResult<f32> {
        let jitter = self.options.jitter;
        let deltas: ModelResult<Vec<f32>> = self
            .nodes
            .par_iter_mut()
            .map(|node| {
                let mut dmax = 0_f32;
                for belief in node.beliefs.iter_mut() {
                    match belief {
                        Belief::LatentVector(param) => {
                            let old = param.posterior_mean().clone();
                            param.calibrate(jitter).map_err(|e| ModelError::Numerical {
                                node: node.name.to_string(),
                                iteration: iter,
                                message: e.to_string(),
                            })?;
                            dmax = dmax.max((param.posterior_mean() - old).amax());
                        }
                        Belief::LatentMatrix(param) => {
                            let old = param.posterior_mean().clone();
                            param.calibrate(jitter).map_err(|e| ModelError::Numerical {
                                node: node.name.to_string(),
                                iteration: iter,
                                message: e.to_string(),
                            })?;
                            dmax = dmax.max((param.posterior_mean() - old).amax());
                        }
                        _ => {}
                    }
                }
                Ok(dmax)
            })
            .collect();

        Ok(deltas?.into_iter().fold(0_f32, f32::max))
    }

    //////////////////////
    // belief accessors //
    //////////////////////

    fn vector_value(&self, var: VarId, replica: usize) -> ModelResult<DVec> {
        match &self.nodes[var].beliefs[replica] {
            Belief::ObservedVector(x) => Ok(x.clone()),
            Belief::Determ(x) => Ok(x.clone()),
            Belief::LatentVector(param) => Ok(param.posterior_mean().clone()),
            _ => Err(ModelError::Shape(format!(
                "'{}' is not vector-valued here",
                self.nodes[var].name
            ))),
        }
    }

    fn matrix_value(&self, var: VarId, replica: usize) -> ModelResult<Mat> {
        match &self.nodes[var].beliefs[replica] {
            Belief::ObservedMatrix(x) => Ok(x.clone()),
            Belief::LatentMatrix(param) => Ok(param.posterior_mean().clone()),
            _ => Err(ModelError::Shape(format!(
                "'{}' is not matrix-valued here",
                self.nodes[var].name
            ))),
        }
    }

    fn spd_value(&self, var: VarId, replica: usize) -> ModelResult<&Mat> {
        match &self.nodes[var].beliefs[replica] {
            Belief::ObservedSpd(x) => Ok(x),
            _ => Err(ModelError::Shape(format!(
                "'{}' is not an observed SPD matrix",
                self.nodes[var].name
            ))),
        }
    }

    fn latent_matrix(&self, var: VarId, replica: usize) -> Option<&GaussianMatrix> {
        match &self.nodes[var].beliefs[replica] {
            Belief::LatentMatrix(param) => Some(param),
            _ => None,
        }
    }

    /// `E[vvᵀ]`: posterior second moment for latents, outer product of
    /// the value otherwise.
    fn second_moment(&self, var: VarId, replica: usize) -> ModelResult<Mat> {
        match &self.nodes[var].beliefs[replica] {
            Belief::LatentVector(param) => Ok(param.posterior_second_moment()),
            _ => {
                let v = self.vector_value(var, replica)?;
                Ok(&v * v.transpose())
            }
        }
    }

    ///////////////////////
    // posterior readout //
    ///////////////////////

    /// Posterior parameters for a vector-valued latent node, one per
    /// replica in plate order.
    pub fn vector_posteriors(&self, name: &str) -> ModelResult<Vec<&GaussianVector>> {
        let id = self.model.var_id(name)?;
        self.nodes[id]
            .beliefs
            .iter()
            .map(|b| match b {
                Belief::LatentVector(param) => Ok(param),
                _ => Err(ModelError::State(format!(
                    "'{}' has no vector posterior",
                    name
                ))),
            })
            .collect()
    }

    /// Posterior parameters for a matrix-valued latent node.
    pub fn matrix_posteriors(&self, name: &str) -> ModelResult<Vec<&GaussianMatrix>> {
        let id = self.model.var_id(name)?;
        self.nodes[id]
            .beliefs
            .iter()
            .map(|b| match b {
                Belief::LatentMatrix(param) => Ok(param),
                _ => Err(ModelError::State(format!(
                    "'{}' has no matrix posterior",
                    name
                ))),
            })
            .collect()
    }

    /// Stack the posterior means of a vector-valued latent node as the
    /// columns of one matrix (replicas in plate order). Replicas over
    /// a jagged axis have unequal lengths and cannot be stacked.
    pub fn posterior_mean_columns(&self, name: &str) -> ModelResult<Mat> {
        let posteriors = self.vector_posteriors(name)?;
        if posteriors.is_empty() {
            return Err(ModelError::State(format!("'{}' has no replicas", name)));
        }
        let dim = posteriors[0].dim();
        if posteriors.iter().any(|param| param.dim() != dim) {
            return Err(ModelError::Shape(format!(
                "'{}' has replicas of unequal dimension",
                name
            )));
        }
        let mut ret = Mat::zeros(dim, posteriors.len());
        for (j, param) in posteriors.iter().enumerate() {
            ret.column_mut(j).copy_from(param.posterior_mean());
        }
        Ok(ret)
    }
}
