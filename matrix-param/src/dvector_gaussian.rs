#![allow(dead_code)]

use crate::traits::*;
use matrix_util::traits::SpdOps;
use nalgebra::{DMatrix, DVector};

type Mat = DMatrix<f32>;
type DVec = DVector<f32>;

const MAX_RIDGE_TRIES: usize = 6;

/// Gaussian posterior over one real vector, kept in natural form.
#[derive(Debug, Clone)]
pub struct GaussianVector {
    dim: usize,
    //////////////////////////////
    // prior natural parameters //
    //////////////////////////////
    lambda0: Mat,
    eta0: DVec,
    ///////////////////////////
    // sufficient statistics //
    ///////////////////////////
    lambda_stat: Mat,
    eta_stat: DVec,
    //////////////////////////
    // estimated parameters //
    //////////////////////////
    estimated_mean: DVec,
    estimated_cov: Mat,
    estimated_sd: DVec,
}

impl GaussianVector {
    /// A parameter with no prior information; the caller must supply
    /// statistics before the first `calibrate`.
    pub fn flat(dim: usize) -> Self {
        Self {
            dim,
            lambda0: Mat::zeros(dim, dim),
            eta0: DVec::zeros(dim),
            lambda_stat: Mat::zeros(dim, dim),
            eta_stat: DVec::zeros(dim),
            estimated_mean: DVec::zeros(dim),
            estimated_cov: Mat::identity(dim, dim),
            estimated_sd: DVec::from_element(dim, 1.0),
        }
    }

    pub fn with_prior(lambda0: Mat, eta0: DVec) -> Self {
        debug_assert_eq!(lambda0.nrows(), lambda0.ncols());
        debug_assert_eq!(lambda0.nrows(), eta0.len());
        let dim = eta0.len();
        let mut ret = Self::flat(dim);
        ret.set_prior(lambda0, eta0);
        ret.reset_stat();
        ret
    }

    pub fn set_prior(&mut self, lambda0: Mat, eta0: DVec) {
        debug_assert_eq!(lambda0.nrows(), self.dim);
        debug_assert_eq!(eta0.len(), self.dim);
        self.lambda0 = lambda0;
        self.eta0 = eta0;
    }

    /// Overwrite the calibrated mean without touching the statistics.
    /// Used to seed latent estimates before the first sweep.
    pub fn set_posterior_mean(&mut self, mean: DVec) {
        debug_assert_eq!(mean.len(), self.dim);
        self.estimated_mean = mean;
    }

    pub fn posterior_precision(&self) -> &Mat {
        &self.lambda_stat
    }

    pub fn posterior_covariance(&self) -> &Mat {
        &self.estimated_cov
    }

    /// `E[x xᵀ] = Σ + μμᵀ`
    pub fn posterior_second_moment(&self) -> Mat {
        &self.estimated_cov + &self.estimated_mean * self.estimated_mean.transpose()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl NaturalStatParam for GaussianVector {
    type Mat = Mat;
    type Vec = DVec;
    type Scalar = f32;

    fn reset_stat(&mut self) {
        self.lambda_stat.copy_from(&self.lambda0);
        self.eta_stat.copy_from(&self.eta0);
    }

    fn add_stat(&mut self, add_lambda: &Self::Mat, add_eta: &Self::Vec) {
        self.lambda_stat += add_lambda;
        self.eta_stat += add_eta;
    }

    fn update_stat(&mut self, lambda: &Self::Mat, eta: &Self::Vec) {
        self.reset_stat();
        self.add_stat(lambda, eta);
    }

    fn calibrate(&mut self, jitter: Self::Scalar) -> anyhow::Result<()> {
        self.lambda_stat.symmetrize_inplace();
        self.estimated_cov = self
            .lambda_stat
            .chol_inverse_regularized(jitter, MAX_RIDGE_TRIES)?;
        self.estimated_mean = &self.estimated_cov * &self.eta_stat;
        self.estimated_sd = DVec::from_fn(self.dim, |i, _| self.estimated_cov[(i, i)].sqrt());
        Ok(())
    }
}

impl Inference for GaussianVector {
    type Out = DVec;
    type Scalar = f32;

    fn posterior_mean(&self) -> &Self::Out {
        &self.estimated_mean
    }

    fn posterior_sd(&self) -> &Self::Out {
        &self.estimated_sd
    }

    fn posterior_sample<R: rand::Rng>(&self, rng: &mut R) -> anyhow::Result<Self::Out> {
        let chol_l = self
            .estimated_cov
            .chol_lower()
            .ok_or(anyhow::anyhow!("covariance is not positive-definite"))?;

        let zz = DVec::from_fn(self.dim, |_, _| rng.sample(rand_distr::StandardNormal));
        Ok(&self.estimated_mean + chol_l * zz)
    }

    fn nrows(&self) -> usize {
        self.dim
    }

    fn ncols(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn conjugate_update_matches_closed_form() -> anyhow::Result<()> {
        // prior N(0, I), one observation y with unit precision:
        // posterior mean must be y/2, posterior variance 1/2
        let dim = 3;
        let eye = Mat::identity(dim, dim);
        let mut param = GaussianVector::with_prior(eye.clone(), DVec::zeros(dim));

        let yy = DVec::from_vec(vec![1.0, -2.0, 0.5]);
        param.add_stat(&eye, &yy);
        param.calibrate(1e-6)?;

        for i in 0..dim {
            assert_abs_diff_eq!(param.posterior_mean()[i], yy[i] / 2.0, epsilon = 1e-5);
            assert_abs_diff_eq!(
                param.posterior_covariance()[(i, i)],
                0.5,
                epsilon = 1e-5
            );
        }
        Ok(())
    }

    #[test]
    fn reset_restores_the_prior() -> anyhow::Result<()> {
        let dim = 2;
        let eye = Mat::identity(dim, dim);
        let mut param = GaussianVector::with_prior(eye.clone(), DVec::zeros(dim));

        param.add_stat(&eye, &DVec::from_element(dim, 3.0));
        param.reset_stat();
        param.calibrate(1e-6)?;

        for i in 0..dim {
            assert_abs_diff_eq!(param.posterior_mean()[i], 0.0);
            assert_abs_diff_eq!(param.posterior_covariance()[(i, i)], 1.0, epsilon = 1e-5);
        }
        Ok(())
    }
}
