use approx::assert_abs_diff_eq;
use matrix_util::dmatrix_util::*;
use matrix_util::traits::SpdOps;

fn random_spd(dim: usize) -> DMatrix<f32> {
    let aa = rnorm(dim, dim);
    &aa * aa.transpose() + DMatrix::<f32>::identity(dim, dim)
}

#[test]
fn chol_inverse_test() -> anyhow::Result<()> {
    let aa = random_spd(7);
    assert!(aa.is_spd());

    let inv = aa.chol_inverse().ok_or(anyhow::anyhow!("not spd"))?;
    let eye = &aa * &inv;

    for i in 0..7 {
        for j in 0..7 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(eye[(i, j)], expected, epsilon = 1e-3);
        }
    }
    Ok(())
}

#[test]
fn chol_solve_test() -> anyhow::Result<()> {
    let aa = random_spd(5);
    let bb = DVector::<f32>::from_fn(5, |i, _| (i + 1) as f32);

    let xx = aa.chol_solve(&bb).ok_or(anyhow::anyhow!("not spd"))?;
    let recovered = &aa * &xx;

    for i in 0..5 {
        assert_abs_diff_eq!(recovered[i], bb[i], epsilon = 1e-3);
    }
    Ok(())
}

#[test]
fn regularized_inverse_recovers_semidefinite() -> anyhow::Result<()> {
    // rank-one, so plain Cholesky inversion must fail
    let vv = DVector::<f32>::from_fn(4, |i, _| (i + 1) as f32);
    let rank_one = &vv * vv.transpose();

    assert!(!rank_one.is_spd());
    assert!(rank_one.chol_inverse().is_none());

    let inv = rank_one.chol_inverse_regularized(1e-4, 10)?;
    assert_eq!(inv.nrows(), 4);
    assert!(inv.iter().all(|x| x.is_finite()));
    Ok(())
}

#[test]
fn symmetrize_test() {
    let mut aa = rnorm(6, 6);
    aa.symmetrize_inplace();

    for i in 0..6 {
        for j in 0..6 {
            assert_abs_diff_eq!(aa[(i, j)], aa[(j, i)]);
        }
    }
}
