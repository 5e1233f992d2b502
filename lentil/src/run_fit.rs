use crate::common::*;
use crate::engine::{InferenceEngine, InferenceOptions};
use crate::multiview::*;

use matrix_param::io::ParamIo;
use matrix_param::traits::Inference;
use matrix_util::dmatrix_util::concatenate_columns;
use matrix_util::traits::IoOps;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct FitArgs {
    /// Data files, one per view: tsv matrices with features in the
    /// rows and examples in the columns. All views must cover the
    /// same examples (equal column counts).
    #[arg(required = true)]
    data_files: Vec<Box<str>>,

    /// dimension of the shared factor
    #[arg(long, short = 'k', default_value_t = 5)]
    shared_dim: usize,

    /// per-view private factor dimensions (comma-separated). Defaults
    /// to the shared dimension for every view.
    #[arg(long, value_delimiter(','))]
    view_dims: Option<Vec<usize>>,

    /// precision scale of the latent and loading priors
    #[arg(long, default_value_t = 1.0)]
    prior_tau: f32,

    /// precision scale of the observation noise
    #[arg(long, default_value_t = 1.0)]
    noise_tau: f32,

    /// centre the data columns before fitting
    #[arg(long, default_value_t = false)]
    centre: bool,

    /// maximum message-passing sweeps
    #[arg(long, default_value_t = 100)]
    iter: usize,

    /// convergence tolerance on the posterior means
    #[arg(long, default_value_t = 1e-4)]
    tol: f32,

    /// diagonal ridge for non-positive-definite recoveries
    #[arg(long, default_value_t = 1e-6)]
    jitter: f32,

    /// random seed for the initialization
    #[arg(long, default_value_t = 42)]
    rseed: u64,

    /// number of worker threads (default: all logical CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// output header
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

/// Fit the multi-view factor model and write posterior summaries
pub fn run_fit(args: FitArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let num_threads = args.threads.unwrap_or_else(num_cpus::get);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .ok();

    // 1. Read one matrix per view
    let mut views: Vec<Mat> = Vec::with_capacity(args.data_files.len());
    for file in &args.data_files {
        info!("reading {}", file);
        let mut x_dn = Mat::from_tsv(file, None)?;
        if args.centre {
            use matrix_util::traits::MatOps;
            x_dn.centre_columns_inplace();
        }
        views.push(x_dn);
    }

    let num_views = views.len();
    let num_examples = views[0].ncols();
    if views.iter().any(|x| x.ncols() != num_examples) {
        anyhow::bail!("all views must have the same number of columns");
    }

    let dims = MultiviewDims {
        num_views,
        num_examples,
        shared_dim: args.shared_dim,
        view_dims: args
            .view_dims
            .clone()
            .unwrap_or_else(|| vec![args.shared_dim; num_views]),
        obs_dims: views.iter().map(|x| x.nrows()).collect(),
    };
    info!(
        "{} views, {} examples, shared dimension {}",
        dims.num_views, dims.num_examples, dims.shared_dim
    );

    // 2. Build the graph and bind the observations
    let priors = MultiviewPriors::scaled(&dims, args.prior_tau, args.noise_tau);
    let mut model = multiview_model(&dims, &priors)?;

    let data: Vec<Vec<DVec>> = (0..num_examples)
        .map(|n| views.iter().map(|x| x.column(n).into_owned()).collect())
        .collect();
    bind_observations(&mut model, data)?;

    // 3. Posterior estimation
    let options = InferenceOptions {
        max_iter: args.iter,
        tol: args.tol,
        jitter: args.jitter,
        rseed: args.rseed,
        ..Default::default()
    };

    let mut engine = InferenceEngine::new(&model, options)?;
    let summary = engine.run()?;

    match &summary.warning {
        Some(w) => warn!("{}", w),
        None => info!(
            "converged in {} sweeps (max delta {:.3e})",
            summary.iterations, summary.max_delta
        ),
    }

    // 4. Posterior summaries
    engine
        .posterior_mean_columns("shared")?
        .to_tsv(&format!("{}.shared.mean.gz", args.out))?;

    let shared_sd = concatenate_columns(
        &engine
            .vector_posteriors("shared")?
            .iter()
            .map(|p| p.posterior_sd().clone())
            .collect::<Vec<_>>(),
    )?;
    shared_sd.to_tsv(&format!("{}.shared.sd.gz", args.out))?;

    for (p, param) in engine.matrix_posteriors("loading_shared")?.iter().enumerate() {
        param.to_tsv(&format!("{}.loading_shared.{}", args.out, p))?;
    }
    for (p, param) in engine.matrix_posteriors("loading_view")?.iter().enumerate() {
        param.to_tsv(&format!("{}.loading_view.{}", args.out, p))?;
    }
    for (p, param) in engine.vector_posteriors("view_factor")?.iter().enumerate() {
        concatenate_columns(&[param.posterior_mean().clone()])?
            .to_tsv(&format!("{}.view_factor.{}.mean.gz", args.out, p))?;
    }
    for (p, param) in engine.vector_posteriors("offset")?.iter().enumerate() {
        concatenate_columns(&[param.posterior_mean().clone()])?
            .to_tsv(&format!("{}.offset.{}.mean.gz", args.out, p))?;
    }

    info!("done");
    Ok(())
}
