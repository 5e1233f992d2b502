/// A posterior parameter with calibrated summary statistics
pub trait Inference {
    type Out;
    type Scalar;

    fn posterior_mean(&self) -> &Self::Out;
    fn posterior_sd(&self) -> &Self::Out;
    fn posterior_sample<R: rand::Rng>(&self, rng: &mut R) -> anyhow::Result<Self::Out>;

    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
}

/// A Gaussian parameter kept in natural form: a precision statistic
/// `Λ` and a precision-weighted mean statistic `η = Λμ`, accumulated
/// on top of prior natural parameters `(Λ₀, η₀)`.
///
/// Lifecycle per update sweep: `reset_stat` back to the prior,
/// `add_stat` once per incoming message, then `calibrate` to solve for
/// the moment parameters.
pub trait NaturalStatParam {
    type Mat;
    type Vec;
    type Scalar;

    fn reset_stat(&mut self);
    fn add_stat(&mut self, add_lambda: &Self::Mat, add_eta: &Self::Vec);
    fn update_stat(&mut self, lambda: &Self::Mat, eta: &Self::Vec);

    /// Solve the accumulated naturals for mean/sd/covariance. The
    /// statistic is symmetrized first; if it is not positive-definite,
    /// an escalating `jitter * I` ridge is applied before giving up.
    fn calibrate(&mut self, jitter: Self::Scalar) -> anyhow::Result<()>;
}
