use approx::assert_abs_diff_eq;
use matrix_util::dmatrix_util::*;
use matrix_util::traits::IoOps;

#[test]
fn dmatrix_tsv_roundtrip() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let tsv_file = tmp
        .path()
        .join("test.tsv.gz")
        .to_str()
        .ok_or(anyhow::anyhow!("bad path"))?
        .to_string();

    let xx = rnorm(20, 5);
    xx.to_tsv(&tsv_file)?;

    let yy = DMatrix::<f32>::from_tsv(&tsv_file, None)?;

    assert_eq!(xx.nrows(), yy.nrows());
    assert_eq!(xx.ncols(), yy.ncols());

    for i in 0..xx.nrows() {
        for j in 0..xx.ncols() {
            assert_abs_diff_eq!(xx[(i, j)], yy[(i, j)], epsilon = 1e-4);
        }
    }
    Ok(())
}
