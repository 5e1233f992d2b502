#![allow(dead_code)]

pub use log::{info, warn};

pub use crate::errors::{ConvergenceWarning, ModelError, ModelResult};

pub type Mat = nalgebra::DMatrix<f32>;
pub type DVec = nalgebra::DVector<f32>;
