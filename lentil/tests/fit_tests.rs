use lentil::engine::{InferenceEngine, InferenceOptions};
use lentil::multiview::*;
use lentil::simulate::*;
use lentil::variable::Value;

use nalgebra::DMatrix;

type Mat = DMatrix<f32>;

fn average_cosine(inferred: &Mat, truth: &Mat) -> f32 {
    assert_eq!(inferred.ncols(), truth.ncols());
    let mut total = 0.0;
    for j in 0..inferred.ncols() {
        let a = inferred.column(j);
        let b = truth.column(j);
        total += a.dot(&b) / (a.norm() * b.norm()).max(1e-12);
    }
    total / inferred.ncols() as f32
}

#[test]
fn shared_factors_are_recovered() -> anyhow::Result<()> {
    let dims = MultiviewDims {
        num_views: 2,
        num_examples: 10,
        shared_dim: 5,
        view_dims: vec![5, 5],
        obs_dims: vec![8, 12],
    };

    let sim = simulate_multiview(&SimArgs {
        num_views: dims.num_views,
        num_examples: dims.num_examples,
        shared_dim: dims.shared_dim,
        view_dims: dims.view_dims.clone(),
        obs_dims: dims.obs_dims.clone(),
        noise_sd: 0.1,
        rseed: 1,
    })?;

    // identity latent priors, noise precision matching the simulation
    let noise_tau = 1.0 / (0.1_f32 * 0.1);
    let priors = MultiviewPriors::scaled(&dims, 1.0, noise_tau);
    let mut model = multiview_model(&dims, &priors)?;

    // clamp the generating loadings and offsets as evidence, so the
    // per-example shared factors are identified without rotation
    model.bind(
        "loading_shared",
        Value::MatrixArray(sim.loading_shared.clone()),
    )?;
    model.bind("loading_view", Value::MatrixArray(sim.loading_view.clone()))?;
    model.bind("offset", Value::VectorArray(sim.offsets.clone()))?;
    bind_observations(&mut model, sim.data.clone())?;

    let mut engine = InferenceEngine::new(
        &model,
        InferenceOptions {
            max_iter: 100,
            tol: 1e-5,
            ..Default::default()
        },
    )?;
    engine.run()?;

    let inferred = engine.posterior_mean_columns("shared")?;
    assert_eq!(inferred.nrows(), 5);
    assert_eq!(inferred.ncols(), 10);

    let cosine = average_cosine(&inferred, &sim.shared_qn);
    assert!(
        cosine > 0.8,
        "average cosine similarity too low: {}",
        cosine
    );
    Ok(())
}

#[test]
fn free_loadings_still_converge_to_finite_posteriors() -> anyhow::Result<()> {
    let dims = MultiviewDims {
        num_views: 2,
        num_examples: 12,
        shared_dim: 3,
        view_dims: vec![3, 3],
        obs_dims: vec![6, 7],
    };

    let sim = simulate_multiview(&SimArgs {
        num_views: dims.num_views,
        num_examples: dims.num_examples,
        shared_dim: dims.shared_dim,
        view_dims: dims.view_dims.clone(),
        obs_dims: dims.obs_dims.clone(),
        noise_sd: 0.2,
        rseed: 5,
    })?;

    let mut model = multiview_model(&dims, &MultiviewPriors::identity(&dims))?;
    bind_observations(&mut model, sim.data)?;

    let mut engine = InferenceEngine::new(
        &model,
        InferenceOptions {
            max_iter: 50,
            ..Default::default()
        },
    )?;
    let summary = engine.run()?;
    assert!(summary.max_delta.is_finite());

    use matrix_param::traits::Inference;
    for name in ["shared", "view_factor", "offset"] {
        for param in engine.vector_posteriors(name)? {
            assert!(
                param.posterior_mean().iter().all(|x| x.is_finite()),
                "{} diverged",
                name
            );
        }
    }
    for name in ["loading_shared", "loading_view"] {
        for param in engine.matrix_posteriors(name)? {
            assert!(param.posterior_mean().iter().all(|x| x.is_finite()));
        }
    }
    Ok(())
}
