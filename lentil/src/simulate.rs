#![allow(dead_code)]

use crate::common::*;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

pub struct SimArgs {
    pub num_views: usize,
    pub num_examples: usize,
    pub shared_dim: usize,
    pub view_dims: Vec<usize>,
    pub obs_dims: Vec<usize>,
    pub noise_sd: f32,
    pub rseed: u64,
}

pub struct SimOut {
    /// True shared factors, `shared_dim x num_examples`
    pub shared_qn: Mat,
    /// True private factor per view
    pub view_factors: Vec<DVec>,
    /// True shared-factor loading per view
    pub loading_shared: Vec<Mat>,
    /// True private-factor loading per view
    pub loading_view: Vec<Mat>,
    /// True offset per view
    pub offsets: Vec<DVec>,
    /// Observations, example-major: `data[n][p]`
    pub data: Vec<Vec<DVec>>,
}

/// Generate a multi-view dataset from known factors and loadings
///
/// ```text
/// x[n][p] = W[p] y[n] + V[p] u[p] + mu[p] + noise_sd * eps
/// ```
///
pub fn simulate_multiview(args: &SimArgs) -> anyhow::Result<SimOut> {
    if args.view_dims.len() != args.num_views || args.obs_dims.len() != args.num_views {
        anyhow::bail!("per-view dimension lists must have one entry per view");
    }

    let mut rng = StdRng::seed_from_u64(args.rseed);
    let normal = Normal::new(0.0_f32, 1.0_f32)?;
    let draw = |dd: usize, nn: usize, rng: &mut StdRng| {
        Mat::from_fn(dd, nn, |_, _| normal.sample(rng))
    };

    let shared_qn = draw(args.shared_dim, args.num_examples, &mut rng);

    let view_factors: Vec<DVec> = args
        .view_dims
        .iter()
        .map(|&q| draw(q, 1, &mut rng).column(0).into_owned())
        .collect();

    let loading_shared: Vec<Mat> = args
        .obs_dims
        .iter()
        .map(|&d| draw(d, args.shared_dim, &mut rng))
        .collect();

    let loading_view: Vec<Mat> = args
        .obs_dims
        .iter()
        .zip(args.view_dims.iter())
        .map(|(&d, &q)| draw(d, q, &mut rng))
        .collect();

    let offsets: Vec<DVec> = args
        .obs_dims
        .iter()
        .map(|&d| draw(d, 1, &mut rng).column(0).into_owned())
        .collect();

    let mut data = Vec::with_capacity(args.num_examples);
    for n in 0..args.num_examples {
        let y_n = shared_qn.column(n);
        let mut row = Vec::with_capacity(args.num_views);
        for p in 0..args.num_views {
            let noise = draw(args.obs_dims[p], 1, &mut rng).column(0).into_owned();
            let x_np = &loading_shared[p] * y_n
                + &loading_view[p] * &view_factors[p]
                + &offsets[p]
                + noise * args.noise_sd;
            row.push(x_np);
        }
        data.push(row);
    }

    Ok(SimOut {
        shared_qn,
        view_factors,
        loading_shared,
        loading_view,
        offsets,
        data,
    })
}
