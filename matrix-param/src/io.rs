use crate::dmatrix_gaussian::GaussianMatrix;
use crate::traits::Inference;
use matrix_util::traits::IoOps;

/// consolidated posterior output
pub trait ParamIo {
    fn to_tsv(&self, header: &str) -> anyhow::Result<()>;
}

impl ParamIo for GaussianMatrix {
    fn to_tsv(&self, header: &str) -> anyhow::Result<()> {
        self.posterior_mean()
            .to_tsv(&(header.to_string() + ".mean.gz"))?;

        self.posterior_sd()
            .to_tsv(&(header.to_string() + ".sd.gz"))?;

        Ok(())
    }
}
