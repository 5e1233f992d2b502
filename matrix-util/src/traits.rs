use crate::common_io::Delimiter;

/// Normalize or scale columns
pub trait MatOps {
    type Mat;
    type Scalar;

    fn normalize_columns_inplace(&mut self);
    fn normalize_columns(&self) -> Self::Mat;
    fn centre_columns_inplace(&mut self);
    fn centre_columns(&self) -> Self::Mat;
}

/// Operations to sample random matrices
pub trait SampleOps {
    type Mat;
    type Scalar;

    /// Sample a matrix from a uniform distribution `U(0,1)`
    fn runif(dd: usize, nn: usize) -> Self::Mat;

    /// Sample a matrix from a normal distribution `N(0,1)`
    fn rnorm(dd: usize, nn: usize) -> Self::Mat;
}

/// Symmetric positive-definite routines the inference layer needs:
/// symmetrization, Cholesky solve/inverse, and an inverse that retries
/// with an escalating diagonal ridge when the factorization fails.
pub trait SpdOps {
    type Mat;
    type DVec;
    type Scalar;

    fn symmetrize_inplace(&mut self);

    /// `true` if a Cholesky factorization exists
    fn is_spd(&self) -> bool;

    /// Solve `self * x = b` by Cholesky
    fn chol_solve(&self, b: &Self::DVec) -> Option<Self::DVec>;

    /// Lower Cholesky factor `L` with `self = L Lᵀ`
    fn chol_lower(&self) -> Option<Self::Mat>;

    /// Inverse by Cholesky
    fn chol_inverse(&self) -> Option<Self::Mat>;

    /// Inverse by Cholesky, adding `jitter * I` and escalating tenfold
    /// up to `max_tries` times when the factorization fails.
    fn chol_inverse_regularized(
        &self,
        jitter: Self::Scalar,
        max_tries: usize,
    ) -> anyhow::Result<Self::Mat>;
}

/// Read and write matrices from and to files
pub trait IoOps {
    type Scalar;
    type Mat;

    fn read_file_delim(
        file: &str,
        delim: impl Into<Delimiter>,
        skip: Option<usize>,
    ) -> anyhow::Result<Self::Mat>;

    fn from_tsv(tsv_file: &str, skip: Option<usize>) -> anyhow::Result<Self::Mat> {
        Self::read_file_delim(tsv_file, "\t", skip)
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()>;

    fn to_tsv(&self, tsv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(tsv_file, "\t")
    }
}
