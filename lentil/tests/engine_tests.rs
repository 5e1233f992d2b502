use lentil::engine::{InferenceEngine, InferenceOptions};
use lentil::errors::ModelError;
use lentil::multiview::*;
use lentil::simulate::*;

use approx::assert_abs_diff_eq;
use matrix_param::traits::Inference;
use nalgebra::{DMatrix, DVector};

type Mat = DMatrix<f32>;
type DVec = DVector<f32>;

#[test]
fn zero_loadings_keep_the_prior() -> anyhow::Result<()> {
    // single view, single example, all loadings and offsets clamped to
    // zero, observation at the prior mean: no information flows to the
    // shared factor
    let dims = MultiviewDims {
        num_views: 1,
        num_examples: 1,
        shared_dim: 3,
        view_dims: vec![2],
        obs_dims: vec![4],
    };
    let mut model = multiview_model(&dims, &MultiviewPriors::identity(&dims))?;

    model.bind(
        "loading_shared",
        lentil::variable::Value::MatrixArray(vec![Mat::zeros(4, 3)]),
    )?;
    model.bind(
        "loading_view",
        lentil::variable::Value::MatrixArray(vec![Mat::zeros(4, 2)]),
    )?;
    model.bind(
        "offset",
        lentil::variable::Value::VectorArray(vec![DVec::zeros(4)]),
    )?;
    bind_observations(&mut model, vec![vec![DVec::zeros(4)]])?;

    let mut engine = InferenceEngine::new(&model, InferenceOptions::default())?;
    let summary = engine.run()?;
    assert!(summary.warning.is_none());

    let shared = engine.vector_posteriors("shared")?;
    assert_eq!(shared.len(), 1);
    for i in 0..3 {
        assert_abs_diff_eq!(shared[0].posterior_mean()[i], 0.0, epsilon = 1e-4);
        // prior precision was the identity and nothing was added
        assert_abs_diff_eq!(
            shared[0].posterior_precision()[(i, i)],
            1.0,
            epsilon = 1e-4
        );
    }
    Ok(())
}

fn simulated_model(rseed: u64) -> anyhow::Result<lentil::model::Model> {
    let dims = MultiviewDims {
        num_views: 2,
        num_examples: 5,
        shared_dim: 3,
        view_dims: vec![3, 3],
        obs_dims: vec![6, 8],
    };
    let sim = simulate_multiview(&SimArgs {
        num_views: dims.num_views,
        num_examples: dims.num_examples,
        shared_dim: dims.shared_dim,
        view_dims: dims.view_dims.clone(),
        obs_dims: dims.obs_dims.clone(),
        noise_sd: 0.3,
        rseed,
    })?;

    let mut model = multiview_model(&dims, &MultiviewPriors::identity(&dims))?;
    bind_observations(&mut model, sim.data)?;
    Ok(model)
}

#[test]
fn repeated_runs_are_identical() -> anyhow::Result<()> {
    let options = InferenceOptions {
        max_iter: 20,
        ..Default::default()
    };

    let model_a = simulated_model(11)?;
    let mut engine_a = InferenceEngine::new(&model_a, options)?;
    engine_a.run()?;
    let shared_a = engine_a.posterior_mean_columns("shared")?;

    let model_b = simulated_model(11)?;
    let mut engine_b = InferenceEngine::new(&model_b, options)?;
    engine_b.run()?;
    let shared_b = engine_b.posterior_mean_columns("shared")?;

    assert_eq!(shared_a.nrows(), shared_b.nrows());
    assert_eq!(shared_a.ncols(), shared_b.ncols());
    for i in 0..shared_a.nrows() {
        for j in 0..shared_a.ncols() {
            assert_abs_diff_eq!(shared_a[(i, j)], shared_b[(i, j)], epsilon = 1e-6);
        }
    }
    Ok(())
}

#[test]
fn exhausted_budget_returns_a_warning() -> anyhow::Result<()> {
    let model = simulated_model(7)?;
    let mut engine = InferenceEngine::new(
        &model,
        InferenceOptions {
            max_iter: 1,
            tol: 1e-12,
            ..Default::default()
        },
    )?;

    let summary = engine.run()?;
    assert!(summary.warning.is_some());
    assert_eq!(summary.iterations, 1);

    // the best estimate is still available
    let shared = engine.posterior_mean_columns("shared")?;
    assert!(shared.iter().all(|x| x.is_finite()));
    Ok(())
}

#[test]
fn jagged_latents_get_per_view_shapes() -> anyhow::Result<()> {
    let dims = MultiviewDims {
        num_views: 2,
        num_examples: 4,
        shared_dim: 2,
        view_dims: vec![3, 7],
        obs_dims: vec![5, 9],
    };
    let sim = simulate_multiview(&SimArgs {
        num_views: 2,
        num_examples: 4,
        shared_dim: 2,
        view_dims: vec![3, 7],
        obs_dims: vec![5, 9],
        noise_sd: 0.2,
        rseed: 3,
    })?;

    let mut model = multiview_model(&dims, &MultiviewPriors::identity(&dims))?;
    bind_observations(&mut model, sim.data)?;

    let mut engine = InferenceEngine::new(
        &model,
        InferenceOptions {
            max_iter: 5,
            ..Default::default()
        },
    )?;
    engine.run()?;

    let view_factors = engine.vector_posteriors("view_factor")?;
    assert_eq!(view_factors.len(), 2);
    assert_eq!(view_factors[0].dim(), 3);
    assert_eq!(view_factors[1].dim(), 7);

    let loadings = engine.matrix_posteriors("loading_view")?;
    assert_eq!(loadings[0].nrows(), 5);
    assert_eq!(loadings[0].ncols(), 3);
    assert_eq!(loadings[1].nrows(), 9);
    assert_eq!(loadings[1].ncols(), 7);
    Ok(())
}

#[test]
fn inference_before_binding_is_rejected() -> anyhow::Result<()> {
    use lentil::model::{DistExpr, Model};
    use lentil::variable::{Dim, Value, VarType};

    let mut model = Model::new();
    model.declare_variable("zero", VarType::Vector(Dim::Fixed(2)), &[])?;
    model.bind("zero", Value::Vector(DVec::zeros(2)))?;
    // prior precision declared but never observed
    model.declare_variable("prec", VarType::Spd(Dim::Fixed(2)), &[])?;
    model.declare_stochastic(
        "y",
        DistExpr::GaussianMeanPrecision {
            mean: "zero",
            precision: "prec",
        },
        VarType::Vector(Dim::Fixed(2)),
        &[],
    )?;

    let err = InferenceEngine::new(&model, InferenceOptions::default()).unwrap_err();
    assert!(matches!(err, ModelError::State(_)));
    Ok(())
}
