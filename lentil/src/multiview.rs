//! The multi-view latent factor model.
//!
//! Each observed vector `x[n][p]` (example `n`, view `p`) decomposes
//! into a shared per-example factor pushed through a per-view loading,
//! a per-view private factor through its own loading, and a per-view
//! offset, with additive Gaussian noise:
//!
//! ```text
//! x[n][p] ~ N( W[p]·shared[n] + V[p]·view_factor[p] + offset[p],
//!              noise_precision[p]⁻¹ )
//! ```
//!
//! Latent dimensions are per-view (a jagged axis over views), as are
//! the observation dimensions. All prior precisions are required
//! inputs; the loadings and offsets carry zero-mean Gaussian priors.

use crate::common::*;
use crate::model::{DetExpr, DistExpr, Model};
use crate::variable::{Value, VarType};

#[derive(Debug, Clone)]
pub struct MultiviewDims {
    pub num_views: usize,
    pub num_examples: usize,
    pub shared_dim: usize,
    /// Private latent dimension per view
    pub view_dims: Vec<usize>,
    /// Observation dimension per view
    pub obs_dims: Vec<usize>,
}

/// Prior precision matrices, all supplied by the caller.
#[derive(Debug, Clone)]
pub struct MultiviewPriors {
    pub shared_precision: Mat,
    pub view_precisions: Vec<Mat>,
    /// Row prior of the shared-factor loading, per view
    pub loading_shared_precisions: Vec<Mat>,
    /// Row prior of the private-factor loading, per view
    pub loading_view_precisions: Vec<Mat>,
    pub offset_precisions: Vec<Mat>,
    pub noise_precisions: Vec<Mat>,
}

impl MultiviewPriors {
    /// Identity precisions everywhere, scaled by `prior_tau` for the
    /// latent and loading priors and `noise_tau` for the noise.
    pub fn scaled(dims: &MultiviewDims, prior_tau: f32, noise_tau: f32) -> Self {
        let eye = |d: usize, tau: f32| Mat::identity(d, d) * tau;
        Self {
            shared_precision: eye(dims.shared_dim, prior_tau),
            view_precisions: dims
                .view_dims
                .iter()
                .map(|&q| eye(q, prior_tau))
                .collect(),
            loading_shared_precisions: dims
                .obs_dims
                .iter()
                .map(|_| eye(dims.shared_dim, prior_tau))
                .collect(),
            loading_view_precisions: dims
                .view_dims
                .iter()
                .map(|&q| eye(q, prior_tau))
                .collect(),
            offset_precisions: dims.obs_dims.iter().map(|&d| eye(d, prior_tau)).collect(),
            noise_precisions: dims.obs_dims.iter().map(|&d| eye(d, noise_tau)).collect(),
        }
    }

    pub fn identity(dims: &MultiviewDims) -> Self {
        Self::scaled(dims, 1.0, 1.0)
    }
}

/// Declare the graph, resolve the index domains, and bind every prior.
/// Only the observations remain to be bound afterwards (plus any
/// latent node the caller wants to clamp as evidence).
pub fn multiview_model(dims: &MultiviewDims, priors: &MultiviewPriors) -> ModelResult<Model> {
    let mut model = Model::new();

    // index domains, resolved as soon as their extents are bound
    model.declare_variable("num_views", VarType::IntScalar, &[])?;
    model.declare_range("views", "num_views")?;
    model.bind("num_views", Value::Int(dims.num_views as i64))?;

    model.declare_variable("num_examples", VarType::IntScalar, &[])?;
    model.declare_range("examples", "num_examples")?;
    model.bind("num_examples", Value::Int(dims.num_examples as i64))?;

    model.declare_variable("shared_dim", VarType::IntScalar, &[])?;
    model.declare_range("shared_axis", "shared_dim")?;
    model.bind("shared_dim", Value::Int(dims.shared_dim as i64))?;

    model.declare_variable("view_dim", VarType::IntScalar, &["views"])?;
    model.declare_jagged_range("view_axis", "views", "view_dim")?;
    model.bind(
        "view_dim",
        Value::IntArray(dims.view_dims.iter().map(|&q| q as i64).collect()),
    )?;

    model.declare_variable("obs_dim", VarType::IntScalar, &["views"])?;
    model.declare_jagged_range("obs_axis", "views", "obs_dim")?;
    model.bind(
        "obs_dim",
        Value::IntArray(dims.obs_dims.iter().map(|&d| d as i64).collect()),
    )?;

    let q0 = model.dim("shared_axis")?;
    let qp = model.dim("view_axis")?;
    let dp = model.dim("obs_axis")?;

    // zero prior means
    model.declare_variable("zero_shared", VarType::Vector(q0), &[])?;
    model.bind(
        "zero_shared",
        Value::Vector(DVec::zeros(dims.shared_dim)),
    )?;

    model.declare_variable("zero_view", VarType::Vector(qp), &["views"])?;
    model.bind(
        "zero_view",
        Value::VectorArray(dims.view_dims.iter().map(|&q| DVec::zeros(q)).collect()),
    )?;

    model.declare_variable("zero_obs", VarType::Vector(dp), &["views"])?;
    model.bind(
        "zero_obs",
        Value::VectorArray(dims.obs_dims.iter().map(|&d| DVec::zeros(d)).collect()),
    )?;

    // required prior precisions
    model.declare_variable("shared_prior_precision", VarType::Spd(q0), &[])?;
    model.declare_variable("view_prior_precision", VarType::Spd(qp), &["views"])?;
    model.declare_variable("loading_shared_prior_precision", VarType::Spd(q0), &["views"])?;
    model.declare_variable("loading_view_prior_precision", VarType::Spd(qp), &["views"])?;
    model.declare_variable("offset_prior_precision", VarType::Spd(dp), &["views"])?;
    model.declare_variable("noise_precision", VarType::Spd(dp), &["views"])?;

    // the latent structure
    model.declare_stochastic(
        "shared",
        DistExpr::GaussianMeanPrecision {
            mean: "zero_shared",
            precision: "shared_prior_precision",
        },
        VarType::Vector(q0),
        &["examples"],
    )?;

    model.declare_stochastic(
        "view_factor",
        DistExpr::GaussianMeanPrecision {
            mean: "zero_view",
            precision: "view_prior_precision",
        },
        VarType::Vector(qp),
        &["views"],
    )?;

    model.declare_stochastic(
        "loading_shared",
        DistExpr::GaussianMeanPrecision {
            mean: "zero_shared",
            precision: "loading_shared_prior_precision",
        },
        VarType::Matrix(dp, q0),
        &["views"],
    )?;

    model.declare_stochastic(
        "loading_view",
        DistExpr::GaussianMeanPrecision {
            mean: "zero_view",
            precision: "loading_view_prior_precision",
        },
        VarType::Matrix(dp, qp),
        &["views"],
    )?;

    model.declare_stochastic(
        "offset",
        DistExpr::GaussianMeanPrecision {
            mean: "zero_obs",
            precision: "offset_prior_precision",
        },
        VarType::Vector(dp),
        &["views"],
    )?;

    model.declare_deterministic(
        "shared_part",
        DetExpr::MatVec {
            matrix: "loading_shared",
            vector: "shared",
        },
        &["examples", "views"],
    )?;

    model.declare_deterministic(
        "view_part",
        DetExpr::MatVec {
            matrix: "loading_view",
            vector: "view_factor",
        },
        &["views"],
    )?;

    model.declare_deterministic(
        "signal",
        DetExpr::Sum(vec!["shared_part", "view_part", "offset"]),
        &["examples", "views"],
    )?;

    model.declare_stochastic(
        "obs",
        DistExpr::GaussianMeanPrecision {
            mean: "signal",
            precision: "noise_precision",
        },
        VarType::Vector(dp),
        &["examples", "views"],
    )?;

    // bind the priors
    model.bind(
        "shared_prior_precision",
        Value::Spd(priors.shared_precision.clone()),
    )?;
    model.bind(
        "view_prior_precision",
        Value::SpdArray(priors.view_precisions.clone()),
    )?;
    model.bind(
        "loading_shared_prior_precision",
        Value::SpdArray(priors.loading_shared_precisions.clone()),
    )?;
    model.bind(
        "loading_view_prior_precision",
        Value::SpdArray(priors.loading_view_precisions.clone()),
    )?;
    model.bind(
        "offset_prior_precision",
        Value::SpdArray(priors.offset_precisions.clone()),
    )?;
    model.bind(
        "noise_precision",
        Value::SpdArray(priors.noise_precisions.clone()),
    )?;

    Ok(model)
}

/// Bind the observed data, example-major: `data[n][p]` is the view-`p`
/// vector of example `n`.
pub fn bind_observations(model: &mut Model, data: Vec<Vec<DVec>>) -> ModelResult<()> {
    let flat: Vec<DVec> = data.into_iter().flatten().collect();
    model.bind("obs", Value::VectorArray(flat))
}
