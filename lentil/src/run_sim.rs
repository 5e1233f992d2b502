use crate::common::*;
use crate::simulate::*;

use matrix_util::dmatrix_util::concatenate_columns;
use matrix_util::traits::IoOps;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// number of views
    #[arg(long, short = 'p', default_value_t = 2)]
    views: usize,

    /// number of examples
    #[arg(long, short = 'n', default_value_t = 100)]
    examples: usize,

    /// dimension of the shared factor
    #[arg(long, short = 'k', default_value_t = 5)]
    shared_dim: usize,

    /// per-view private factor dimensions (comma-separated). Defaults
    /// to the shared dimension for every view.
    #[arg(long, value_delimiter(','))]
    view_dims: Option<Vec<usize>>,

    /// per-view observation dimensions (comma-separated). Defaults to
    /// twice the shared dimension for every view.
    #[arg(long, value_delimiter(','))]
    obs_dims: Option<Vec<usize>>,

    /// observation noise standard deviation
    #[arg(long, default_value_t = 0.3)]
    noise_sd: f32,

    /// random seed
    #[arg(long, default_value_t = 42)]
    rseed: u64,

    /// output header
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

/// Simulate a multi-view dataset and write the data with the
/// generating parameters for later evaluation.
pub fn run_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let sim_args = SimArgs {
        num_views: args.views,
        num_examples: args.examples,
        shared_dim: args.shared_dim,
        view_dims: args
            .view_dims
            .clone()
            .unwrap_or_else(|| vec![args.shared_dim; args.views]),
        obs_dims: args
            .obs_dims
            .clone()
            .unwrap_or_else(|| vec![2 * args.shared_dim; args.views]),
        noise_sd: args.noise_sd,
        rseed: args.rseed,
    };

    let sim = simulate_multiview(&sim_args)?;

    for p in 0..args.views {
        let columns: Vec<DVec> = sim.data.iter().map(|row| row[p].clone()).collect();
        let x_dn = concatenate_columns(&columns)?;
        let data_file = format!("{}.view{}.data.gz", args.out, p);
        x_dn.to_tsv(&data_file)?;
        info!("view {}: {} x {} -> {}", p, x_dn.nrows(), x_dn.ncols(), data_file);

        sim.loading_shared[p].to_tsv(&format!("{}.view{}.loading_shared.truth.gz", args.out, p))?;
        sim.loading_view[p].to_tsv(&format!("{}.view{}.loading_view.truth.gz", args.out, p))?;
        concatenate_columns(&[sim.view_factors[p].clone()])?
            .to_tsv(&format!("{}.view{}.factor.truth.gz", args.out, p))?;
        concatenate_columns(&[sim.offsets[p].clone()])?
            .to_tsv(&format!("{}.view{}.offset.truth.gz", args.out, p))?;
    }

    sim.shared_qn
        .to_tsv(&format!("{}.shared.truth.gz", args.out))?;
    info!("wrote the generating parameters");

    Ok(())
}
