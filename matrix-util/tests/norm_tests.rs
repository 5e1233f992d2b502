use approx::assert_abs_diff_eq;
use matrix_util::traits::MatOps;

#[test]
fn dmatrix_normalize_test() {
    use matrix_util::*;

    let mut xx = dmatrix_util::runif(100, 10);
    xx.normalize_columns_inplace();

    for j in 0..xx.ncols() {
        let norm = xx.column(j).norm();
        assert_abs_diff_eq!(norm, 1.0);
    }
}

#[test]
fn dmatrix_centre_test() {
    use matrix_util::*;

    let mut xx = dmatrix_util::rnorm(50, 7);
    xx.centre_columns_inplace();

    for j in 0..xx.ncols() {
        let mean = xx.column(j).mean();
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-5);
    }
}
