#![allow(dead_code)]

use crate::dvector_gaussian::GaussianVector;
use crate::traits::*;
use nalgebra::{DMatrix, DVector};

type Mat = DMatrix<f32>;
type DVec = DVector<f32>;

/// Gaussian posterior over a real matrix, factorized across rows: each
/// row is a `GaussianVector` and all rows share one prior. This is the
/// form a row-wise matrix prior (e.g. a loading matrix with i.i.d.
/// zero-mean Gaussian rows) keeps under mean-field updates.
#[derive(Debug, Clone)]
pub struct GaussianMatrix {
    num_rows: usize,
    num_cols: usize,
    rows: Vec<GaussianVector>,
    //////////////////////////
    // estimated parameters //
    //////////////////////////
    estimated_mean: Mat,
    estimated_sd: Mat,
}

impl GaussianMatrix {
    pub fn flat(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            rows: vec![GaussianVector::flat(num_cols); num_rows],
            estimated_mean: Mat::zeros(num_rows, num_cols),
            estimated_sd: Mat::zeros(num_rows, num_cols),
        }
    }

    /// All rows drawn from `N(Λ₀⁻¹η₀, Λ₀⁻¹)`
    pub fn with_row_prior(num_rows: usize, lambda0: Mat, eta0: DVec) -> Self {
        let num_cols = eta0.len();
        let mut ret = Self::flat(num_rows, num_cols);
        ret.set_row_prior(lambda0, eta0);
        ret.reset_stat();
        ret
    }

    pub fn set_row_prior(&mut self, lambda0: Mat, eta0: DVec) {
        for row in self.rows.iter_mut() {
            row.set_prior(lambda0.clone(), eta0.clone());
        }
    }

    pub fn reset_stat(&mut self) {
        for row in self.rows.iter_mut() {
            row.reset_stat();
        }
    }

    pub fn add_stat_row(&mut self, i: usize, add_lambda: &Mat, add_eta: &DVec) {
        self.rows[i].add_stat(add_lambda, add_eta);
    }

    pub fn calibrate(&mut self, jitter: f32) -> anyhow::Result<()> {
        for row in self.rows.iter_mut() {
            row.calibrate(jitter)?;
        }
        for (i, row) in self.rows.iter().enumerate() {
            self.estimated_mean
                .row_mut(i)
                .copy_from(&row.posterior_mean().transpose());
            self.estimated_sd
                .row_mut(i)
                .copy_from(&row.posterior_sd().transpose());
        }
        Ok(())
    }

    pub fn row(&self, i: usize) -> &GaussianVector {
        &self.rows[i]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut GaussianVector {
        &mut self.rows[i]
    }

    /// Seed the calibrated means, e.g. with small random values to
    /// break the symmetry of bilinear terms.
    pub fn set_posterior_mean(&mut self, mean: Mat) {
        debug_assert_eq!(mean.nrows(), self.num_rows);
        debug_assert_eq!(mean.ncols(), self.num_cols);
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.set_posterior_mean(mean.row(i).transpose());
        }
        self.estimated_mean = mean;
    }
}

impl Inference for GaussianMatrix {
    type Out = Mat;
    type Scalar = f32;

    fn posterior_mean(&self) -> &Self::Out {
        &self.estimated_mean
    }

    fn posterior_sd(&self) -> &Self::Out {
        &self.estimated_sd
    }

    fn posterior_sample<R: rand::Rng>(&self, rng: &mut R) -> anyhow::Result<Self::Out> {
        let mut ret = Mat::zeros(self.num_rows, self.num_cols);
        for (i, row) in self.rows.iter().enumerate() {
            let xx = row.posterior_sample(rng)?;
            ret.row_mut(i).copy_from(&xx.transpose());
        }
        Ok(ret)
    }

    fn nrows(&self) -> usize {
        self.num_rows
    }

    fn ncols(&self) -> usize {
        self.num_cols
    }
}
