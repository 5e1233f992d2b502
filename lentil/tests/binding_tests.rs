use lentil::errors::ModelError;
use lentil::model::{DetExpr, Model};
use lentil::range::Extents;
use lentil::variable::{Dim, Value, VarType};

use nalgebra::{DMatrix, DVector};

type Mat = DMatrix<f32>;
type DVec = DVector<f32>;

#[test]
fn negative_extent_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("n", VarType::IntScalar, &[])?;
    model.declare_range("examples", "n")?;

    let err = model.bind("n", Value::Int(-1)).unwrap_err();
    assert!(matches!(err, ModelError::Shape(_)));
    Ok(())
}

#[test]
fn non_integer_extent_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("n", VarType::IntScalar, &[])?;
    model.declare_range("examples", "n")?;

    let err = model
        .bind("n", Value::Vector(DVec::zeros(1)))
        .unwrap_err();
    assert!(matches!(err, ModelError::Shape(_)));
    Ok(())
}

#[test]
fn bound_extent_reads_back() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("n", VarType::IntScalar, &[])?;
    model.declare_range("examples", "n")?;
    model.bind("n", Value::Int(7))?;

    assert_eq!(model.extents("examples")?, Extents::Flat(7));
    Ok(())
}

fn jagged_model(extents: &[i64]) -> anyhow::Result<Model> {
    let mut model = Model::new();
    model.declare_variable("num_views", VarType::IntScalar, &[])?;
    model.declare_range("views", "num_views")?;
    model.bind("num_views", Value::Int(extents.len() as i64))?;

    model.declare_variable("view_dim", VarType::IntScalar, &["views"])?;
    model.declare_jagged_range("view_axis", "views", "view_dim")?;
    model.bind("view_dim", Value::IntArray(extents.to_vec()))?;
    Ok(model)
}

#[test]
fn jagged_range_keeps_equal_extents() -> anyhow::Result<()> {
    let model = jagged_model(&[5, 5])?;
    assert_eq!(model.extents("view_axis")?, Extents::Jagged(vec![5, 5]));
    Ok(())
}

#[test]
fn jagged_range_keeps_unequal_extents() -> anyhow::Result<()> {
    let mut model = jagged_model(&[3, 7])?;
    assert_eq!(model.extents("view_axis")?, Extents::Jagged(vec![3, 7]));

    // replicas over the jagged axis must match per-index shapes
    let qp = model.dim("view_axis")?;
    model.declare_variable("z", VarType::Vector(qp), &["views"])?;

    let err = model
        .bind(
            "z",
            Value::VectorArray(vec![DVec::zeros(3), DVec::zeros(3)]),
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::TypeMismatch(_)));

    model.bind(
        "z",
        Value::VectorArray(vec![DVec::zeros(3), DVec::zeros(7)]),
    )?;
    Ok(())
}

#[test]
fn jagged_extent_array_length_must_match_outer() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("num_views", VarType::IntScalar, &[])?;
    model.declare_range("views", "num_views")?;
    model.bind("num_views", Value::Int(2))?;

    model.declare_variable("view_dim", VarType::IntScalar, &["views"])?;
    model.declare_jagged_range("view_axis", "views", "view_dim")?;

    let err = model
        .bind("view_dim", Value::IntArray(vec![3, 7, 9]))
        .unwrap_err();
    assert!(matches!(err, ModelError::Shape(_)));
    Ok(())
}

#[test]
fn rebinding_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("n", VarType::IntScalar, &[])?;
    model.declare_range("examples", "n")?;
    model.bind("n", Value::Int(3))?;

    let err = model.bind("n", Value::Int(4)).unwrap_err();
    assert!(matches!(err, ModelError::State(_)));
    Ok(())
}

#[test]
fn binding_a_computed_node_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("a", VarType::Vector(Dim::Fixed(2)), &[])?;
    model.declare_variable("b", VarType::Vector(Dim::Fixed(2)), &[])?;
    model.declare_deterministic("s", DetExpr::Sum(vec!["a", "b"]), &[])?;

    let err = model.bind("s", Value::Vector(DVec::zeros(2))).unwrap_err();
    assert!(matches!(err, ModelError::State(_)));
    Ok(())
}

#[test]
fn binding_an_undeclared_name_is_rejected() {
    let mut model = Model::new();
    let err = model.bind("ghost", Value::Int(1)).unwrap_err();
    assert!(matches!(err, ModelError::UnknownVariable(_)));
}

#[test]
fn wrong_value_kind_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("x", VarType::Vector(Dim::Fixed(3)), &[])?;

    let err = model
        .bind("x", Value::Matrix(Mat::zeros(3, 3)))
        .unwrap_err();
    assert!(matches!(err, ModelError::TypeMismatch(_)));
    Ok(())
}

#[test]
fn non_spd_precision_is_rejected() -> anyhow::Result<()> {
    let mut model = Model::new();
    model.declare_variable("prec", VarType::Spd(Dim::Fixed(2)), &[])?;

    // symmetric but indefinite
    let indefinite = Mat::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
    let err = model.bind("prec", Value::Spd(indefinite)).unwrap_err();
    assert!(matches!(err, ModelError::TypeMismatch(_)));
    Ok(())
}
