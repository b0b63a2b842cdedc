//! Regularised linear regression, used as the stages of a regression cascade

#[macro_use]
extern crate log;

use nalgebra::{Const, DMatrix, Dyn, Matrix, MatrixView, Storage};

mod error;
mod linear_regressor;
mod regulariser;

pub use error::{Error, Result};
pub use linear_regressor::LinearRegressor;
pub use regulariser::{RegularisationType, Regulariser};

/// A view into a column major data matrix.
/// Rows are the examples, columns are the dimensions.
pub type DataView<'a> = MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>;

/// Generic way of learning a linear mapping from data to labels.
/// Every stage of a cascade has to provide these capabilities.
pub trait Regressor {
    /// Learn the mapping from `data` to `labels`
    ///
    /// # Parameters
    /// data: One row per training example, one column per feature
    /// labels: One row per training example, one column per output dimension
    ///
    /// # Returns
    /// Whether the learning was successful, i.e. the system could be solved.
    /// An unsuccessful solve still stores a best-effort result.
    fn learn(&mut self, data: &DataView<'_>, labels: &DataView<'_>) -> Result<bool>;

    /// The normalised least squares residual of the predictions for `data`
    fn test(&self, data: &DataView<'_>, labels: &DataView<'_>) -> Result<f64>;

    /// Predict one output row for every row of `values`
    fn predict(&self, values: &DataView<'_>) -> Result<DMatrix<f64>>;

    /// Predict from a single scalar.
    /// Only valid if the learned mapping is exactly 1x1.
    fn predict_scalar(&self, value: f64) -> Result<f64>;
}

/// Computes `‖prediction - ground_truth‖ / ‖ground_truth‖` using the L2 (Frobenius) norm
pub fn normalised_residual<S1, S2>(
    prediction: &Matrix<f64, Dyn, Dyn, S1>,
    ground_truth: &Matrix<f64, Dyn, Dyn, S2>,
) -> Result<f64>
where
    S1: Storage<f64, Dyn, Dyn>,
    S2: Storage<f64, Dyn, Dyn>,
{
    if prediction.shape() != ground_truth.shape() {
        return Err(Error::DimensionMismatch {
            operation: "normalised_residual",
            expected: ground_truth.shape(),
            found: prediction.shape(),
        });
    }
    let difference_norm = prediction
        .iter()
        .zip(ground_truth.iter())
        .map(|(p, g)| (p - g) * (p - g))
        .sum::<f64>()
        .sqrt();

    Ok(difference_norm / ground_truth.norm())
}
