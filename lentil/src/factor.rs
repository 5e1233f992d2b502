//! Factor kinds and their message algebra.
//!
//! Messages are Gaussian in natural form: a precision `Λ` and a
//! precision-weighted mean `η = Λμ`, so combining beliefs is addition.
//! All matrix algebra for the three factor kinds lives here; the
//! engine only routes messages and accumulates statistics.

use crate::common::{DVec, Mat};
use crate::variable::VarId;
use matrix_param::dmatrix_gaussian::GaussianMatrix;

pub type FactorId = usize;

#[derive(Debug, Clone)]
pub enum FactorKind {
    /// child ~ N(mean, precision⁻¹); for a matrix-typed child the rows
    /// are i.i.d. draws
    GaussianMeanPrecision { mean: VarId, precision: VarId },
    /// child = matrix · vector
    MatVec { matrix: VarId, vector: VarId },
    /// child = Σ terms
    Sum { terms: Vec<VarId> },
}

#[derive(Debug, Clone)]
pub struct Factor {
    pub child: VarId,
    pub kind: FactorKind,
}

impl Factor {
    pub fn parents(&self) -> Vec<VarId> {
        match &self.kind {
            FactorKind::GaussianMeanPrecision { mean, precision } => vec![*mean, *precision],
            FactorKind::MatVec { matrix, vector } => vec![*matrix, *vector],
            FactorKind::Sum { terms } => terms.clone(),
        }
    }

    pub fn is_deterministic(&self) -> bool {
        !matches!(self.kind, FactorKind::GaussianMeanPrecision { .. })
    }
}

/// One Gaussian belief contribution in natural parameters.
#[derive(Debug, Clone)]
pub struct GaussianMessage {
    pub lambda: Mat,
    pub eta: DVec,
}

impl GaussianMessage {
    pub fn zero(dim: usize) -> Self {
        Self {
            lambda: Mat::zeros(dim, dim),
            eta: DVec::zeros(dim),
        }
    }

    pub fn accumulate(&mut self, other: &GaussianMessage) {
        self.lambda += &other.lambda;
        self.eta += &other.eta;
    }

    /// Natural-parameter combination of several beliefs
    pub fn combine(dim: usize, messages: &[GaussianMessage]) -> Self {
        let mut ret = Self::zero(dim);
        for msg in messages {
            ret.accumulate(msg);
        }
        ret
    }
}

/// Message from a Gaussian factor to its child: `(Λ, Λ·E[mean])`
pub fn gaussian_to_child(lambda: &Mat, mean: &DVec) -> GaussianMessage {
    GaussianMessage {
        lambda: lambda.clone(),
        eta: lambda * mean,
    }
}

/// Message from a Gaussian factor to its mean parent: `(Λ, Λ·E[child])`
pub fn gaussian_to_mean(lambda: &Mat, child: &DVec) -> GaussianMessage {
    GaussianMessage {
        lambda: lambda.clone(),
        eta: lambda * child,
    }
}

/// Message through a sum node to one of its terms: the downstream
/// belief with the other terms' expectations subtracted out.
pub fn sum_to_term(msg: &GaussianMessage, total_mean: &DVec, term_mean: &DVec) -> GaussianMessage {
    GaussianMessage {
        lambda: msg.lambda.clone(),
        eta: &msg.eta - &msg.lambda * (total_mean - term_mean),
    }
}

/// Message through `d = A·v` to the vector side.
///
/// `E[AᵀΛA] = E[A]ᵀ Λ E[A] + Σᵢ Λᵢᵢ Cov(aᵢ)` for row-factorized `A`;
/// the correction vanishes when `A` is observed.
pub fn matvec_to_vector(
    a_mean: &Mat,
    a_rows: Option<&GaussianMatrix>,
    msg: &GaussianMessage,
) -> GaussianMessage {
    let mut lambda = a_mean.transpose() * &msg.lambda * a_mean;

    if let Some(aa) = a_rows {
        for i in 0..a_mean.nrows() {
            lambda += aa.row(i).posterior_covariance() * msg.lambda[(i, i)];
        }
    }

    GaussianMessage {
        lambda,
        eta: a_mean.transpose() * &msg.eta,
    }
}

/// Messages through `d = A·v` to each row of the matrix side, with the
/// co-parent's second moment `S = E[vvᵀ]` carrying its uncertainty and
/// the off-diagonal precision terms coupling the rows through their
/// current means.
pub fn matvec_to_matrix_rows(
    v_mean: &DVec,
    v_second: &Mat,
    a_mean: &Mat,
    msg: &GaussianMessage,
) -> Vec<GaussianMessage> {
    let num_rows = a_mean.nrows();

    // w[:,i] = Σ_j Λ_ij E[a_j]
    let cross = a_mean.transpose() * &msg.lambda;

    (0..num_rows)
        .map(|i| {
            let lambda_ii = msg.lambda[(i, i)];
            let m_i = a_mean.row(i).transpose();
            let w_i = cross.column(i) - &m_i * lambda_ii;

            GaussianMessage {
                lambda: v_second * lambda_ii,
                eta: v_mean * msg.eta[i] - v_second * w_i,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sum_message_removes_other_terms() {
        let lambda = Mat::identity(2, 2) * 2.0;
        let target = DVec::from_vec(vec![3.0, 1.0]);
        let msg = GaussianMessage {
            eta: &lambda * &target,
            lambda,
        };

        let total = DVec::from_vec(vec![5.0, 5.0]);
        let term = DVec::from_vec(vec![1.0, 2.0]);
        let out = sum_to_term(&msg, &total, &term);

        // implied target for the term: 3 - (5-1) = -1, 1 - (5-2) = -2
        let implied = out.lambda.clone().cholesky().map(|c| c.solve(&out.eta));
        let implied = implied.expect("spd");
        assert_abs_diff_eq!(implied[0], -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(implied[1], -2.0, epsilon = 1e-5);
    }

    #[test]
    fn matvec_message_is_the_normal_equation() {
        // A observed, downstream belief with unit precision: the
        // message to v must be (AᵀA, Aᵀ target)
        let a_mat = Mat::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 1.0]);
        let target = DVec::from_vec(vec![1.0, 1.0]);
        let msg = GaussianMessage {
            lambda: Mat::identity(2, 2),
            eta: target.clone(),
        };

        let out = matvec_to_vector(&a_mat, None, &msg);
        let expected_lambda = a_mat.transpose() * &a_mat;
        let expected_eta = a_mat.transpose() * &target;

        for i in 0..2 {
            assert_abs_diff_eq!(out.eta[i], expected_eta[i], epsilon = 1e-5);
            for j in 0..2 {
                assert_abs_diff_eq!(
                    out.lambda[(i, j)],
                    expected_lambda[(i, j)],
                    epsilon = 1e-5
                );
            }
        }
    }
}
