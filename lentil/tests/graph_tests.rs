use lentil::errors::ModelError;
use lentil::model::{DetExpr, DistExpr, Model};
use lentil::multiview::*;
use lentil::variable::{Dim, Value, VarType};

use nalgebra::{DMatrix, DVector};

type Mat = DMatrix<f32>;
type DVec = DVector<f32>;

fn gaussian<'a>(mean: &'a str, precision: &'a str) -> DistExpr<'a> {
    DistExpr::GaussianMeanPrecision { mean, precision }
}

#[test]
fn valid_model_builds() -> anyhow::Result<()> {
    let dims = MultiviewDims {
        num_views: 2,
        num_examples: 3,
        shared_dim: 2,
        view_dims: vec![2, 2],
        obs_dims: vec![4, 5],
    };
    let model = multiview_model(&dims, &MultiviewPriors::identity(&dims))?;

    assert!(model.var_id("shared").is_ok());
    assert!(model.var_id("obs").is_ok());
    Ok(())
}

#[test]
fn cyclic_declaration_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("prec", VarType::Spd(Dim::Fixed(2)), &[])?;
    model.bind("prec", Value::Spd(Mat::identity(2, 2)))?;

    model.declare_variable("a", VarType::Vector(Dim::Fixed(2)), &[])?;
    model.declare_stochastic("b", gaussian("a", "prec"), VarType::Vector(Dim::Fixed(2)), &[])?;

    let err = model
        .declare_stochastic("a", gaussian("b", "prec"), VarType::Vector(Dim::Fixed(2)), &[])
        .unwrap_err();
    assert!(matches!(err, ModelError::GraphCycle(_)));
    Ok(())
}

#[test]
fn self_reference_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("prec", VarType::Spd(Dim::Fixed(2)), &[])?;
    model.bind("prec", Value::Spd(Mat::identity(2, 2)))?;
    model.declare_variable("a", VarType::Vector(Dim::Fixed(2)), &[])?;

    let err = model
        .declare_stochastic("a", gaussian("a", "prec"), VarType::Vector(Dim::Fixed(2)), &[])
        .unwrap_err();
    assert!(matches!(err, ModelError::GraphCycle(_)));
    Ok(())
}

#[test]
fn dangling_parent_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("prec", VarType::Spd(Dim::Fixed(2)), &[])?;

    let err = model
        .declare_stochastic(
            "y",
            gaussian("ghost", "prec"),
            VarType::Vector(Dim::Fixed(2)),
            &[],
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::UnknownVariable(_)));
    Ok(())
}

#[test]
fn dimension_mismatch_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("zero2", VarType::Vector(Dim::Fixed(2)), &[])?;
    model.bind("zero2", Value::Vector(DVec::zeros(2)))?;
    model.declare_variable("prec3", VarType::Spd(Dim::Fixed(3)), &[])?;

    let err = model
        .declare_stochastic(
            "y",
            gaussian("zero2", "prec3"),
            VarType::Vector(Dim::Fixed(3)),
            &[],
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::Shape(_)));
    Ok(())
}

#[test]
fn sum_over_unequal_dimensions_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("a", VarType::Vector(Dim::Fixed(2)), &[])?;
    model.declare_variable("b", VarType::Vector(Dim::Fixed(3)), &[])?;

    let err = model
        .declare_deterministic("s", DetExpr::Sum(vec!["a", "b"]), &[])
        .unwrap_err();
    assert!(matches!(err, ModelError::Shape(_)));
    Ok(())
}

#[test]
fn factors_over_unresolved_ranges_are_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("n", VarType::IntScalar, &[])?;
    model.declare_range("examples", "n")?;
    model.declare_variable("zero", VarType::Vector(Dim::Fixed(2)), &[])?;
    model.declare_variable("prec", VarType::Spd(Dim::Fixed(2)), &[])?;

    let err = model
        .declare_stochastic(
            "y",
            gaussian("zero", "prec"),
            VarType::Vector(Dim::Fixed(2)),
            &["examples"],
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::Shape(_)));
    Ok(())
}
