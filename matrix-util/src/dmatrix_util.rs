#![allow(dead_code)]

use crate::traits::*;

pub use nalgebra::{DMatrix, DVector};
pub use rand::Rng;
pub use rand_distr::StandardNormal;
pub use rayon::prelude::*;

/// Sample d,n matrix from U(0,1)
pub fn runif(dd: usize, nn: usize) -> DMatrix<f32> {
    let rvec = (0..(dd * nn))
        .into_par_iter()
        .map_init(rand::rng, |rng, _| rng.random::<f32>())
        .collect();

    DMatrix::<f32>::from_vec(dd, nn, rvec)
}

/// Sample d,n matrix from N(0,1)
pub fn rnorm(dd: usize, nn: usize) -> DMatrix<f32> {
    let rvec = (0..(dd * nn))
        .into_par_iter()
        .map_init(rand::rng, |rng, _| rng.sample(StandardNormal))
        .collect();

    DMatrix::<f32>::from_vec(dd, nn, rvec)
}

impl SampleOps for DMatrix<f32> {
    type Mat = DMatrix<f32>;
    type Scalar = f32;

    fn runif(dd: usize, nn: usize) -> Self::Mat {
        runif(dd, nn)
    }

    fn rnorm(dd: usize, nn: usize) -> Self::Mat {
        rnorm(dd, nn)
    }
}

impl MatOps for DMatrix<f32> {
    type Mat = DMatrix<f32>;
    type Scalar = f32;

    /// Normalize d x m matrix X by columns
    /// `Y[,j] = X[,j] / max(1, norm(X[,j]))`
    fn normalize_columns_inplace(&mut self) {
        for mut x_j in self.column_iter_mut() {
            let denom = x_j.norm().max(1.0);
            x_j /= denom;
        }
    }

    fn normalize_columns(&self) -> Self::Mat {
        let mut ret = self.clone();
        ret.normalize_columns_inplace();
        ret
    }

    /// Remove the column means
    fn centre_columns_inplace(&mut self) {
        for mut x_j in self.column_iter_mut() {
            let mu = x_j.mean();
            x_j.add_scalar_mut(-mu);
        }
    }

    fn centre_columns(&self) -> Self::Mat {
        let mut ret = self.clone();
        ret.centre_columns_inplace();
        ret
    }
}

impl SpdOps for DMatrix<f32> {
    type Mat = DMatrix<f32>;
    type DVec = DVector<f32>;
    type Scalar = f32;

    fn symmetrize_inplace(&mut self) {
        let sym = (&*self + self.transpose()) * 0.5;
        self.copy_from(&sym);
    }

    fn is_spd(&self) -> bool {
        self.is_square() && self.clone().cholesky().is_some()
    }

    fn chol_solve(&self, b: &Self::DVec) -> Option<Self::DVec> {
        self.clone().cholesky().map(|chol| chol.solve(b))
    }

    fn chol_lower(&self) -> Option<Self::Mat> {
        self.clone().cholesky().map(|chol| chol.l())
    }

    fn chol_inverse(&self) -> Option<Self::Mat> {
        self.clone().cholesky().map(|chol| chol.inverse())
    }

    fn chol_inverse_regularized(
        &self,
        jitter: Self::Scalar,
        max_tries: usize,
    ) -> anyhow::Result<Self::Mat> {
        if let Some(inv) = self.chol_inverse() {
            return Ok(inv);
        }

        let mut ridge = jitter.max(f32::EPSILON);
        for _ in 0..max_tries {
            let mut guarded = self.clone();
            for i in 0..guarded.nrows() {
                guarded[(i, i)] += ridge;
            }
            if let Some(inv) = guarded.chol_inverse() {
                log::warn!("recovered a non-SPD matrix with ridge {:.3e}", ridge);
                return Ok(inv);
            }
            ridge *= 10.0;
        }

        Err(anyhow::anyhow!(
            "Cholesky failed after {} regularization attempts (last ridge {:.3e})",
            max_tries,
            ridge
        ))
    }
}

/// Stack column vectors side by side into a d x n matrix
pub fn concatenate_columns(columns: &[DVector<f32>]) -> anyhow::Result<DMatrix<f32>> {
    if columns.is_empty() {
        return Err(anyhow::anyhow!("no columns to concatenate"));
    }
    let dd = columns[0].len();
    if columns.iter().any(|x| x.len() != dd) {
        return Err(anyhow::anyhow!("columns differ in length"));
    }
    let mut ret = DMatrix::<f32>::zeros(dd, columns.len());
    for (j, x_j) in columns.iter().enumerate() {
        ret.column_mut(j).copy_from(x_j);
    }
    Ok(ret)
}
