use std::time::Instant;

use nalgebra::{DMatrix, Dyn, FullPivLU};

use crate::{normalised_residual, DataView, Error, Regressor, Regulariser, Result};

/// Regularised linear regression aka ridge regression, solved in closed form.
/// It is particularly useful to mitigate the problem of multicollinearity.
///
/// If a bias should be learned, add a column of 1s to the data.
#[derive(Debug, Clone, Default)]
pub struct LinearRegressor {
    /// Maps a row of data to a row of labels, has as many rows as the data has columns
    coefficients: Option<DMatrix<f64>>,
    regulariser: Regulariser,
}

impl LinearRegressor {
    /// Create a new regressor that has not learned anything yet
    pub fn new(regulariser: Regulariser) -> Self {
        Self {
            coefficients: None,
            regulariser,
        }
    }

    /// The learned coefficients, if `learn` has been called
    #[inline(always)]
    pub fn coefficients(&self) -> Option<&DMatrix<f64>> {
        self.coefficients.as_ref()
    }

    /// The regularisation applied in `learn`
    #[inline(always)]
    pub fn regulariser(&self) -> &Regulariser {
        &self.regulariser
    }
}

/// Pivots below this are treated as zero, same as the default of Eigen's FullPivLU
fn pivot_threshold(lu: &FullPivLU<f64, Dyn, Dyn>) -> f64 {
    let pivots = lu.lu_internal().diagonal();
    let max_pivot = pivots.iter().fold(0.0_f64, |m, p| m.max(p.abs()));

    f64::EPSILON * pivots.len() as f64 * max_pivot
}

/// Estimate the rank from the pivots of a full pivoting LU decomposition
fn rank(lu: &FullPivLU<f64, Dyn, Dyn>) -> usize {
    let threshold = pivot_threshold(lu);

    lu.lu_internal().diagonal().iter().filter(|p| p.abs() > threshold).count()
}

impl Regressor for LinearRegressor {
    fn learn(&mut self, data: &DataView<'_>, labels: &DataView<'_>) -> Result<bool> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(Error::NoExamples("learn"));
        }
        if labels.nrows() != data.nrows() {
            return Err(Error::DimensionMismatch {
                operation: "learn",
                expected: (data.nrows(), labels.ncols()),
                found: labels.shape(),
            });
        }

        let at = data.transpose();
        let at_a = &at * data;
        let reg_m = self.regulariser.get_matrix(&at_a, data.nrows());
        let at_a_reg = at_a + reg_m;

        let t0 = Instant::now();
        let lu = FullPivLU::new(at_a_reg.clone());
        let rank = rank(&lu);
        trace!("rank of the regularised AtA: {}", rank);

        let dim = at_a_reg.nrows();
        let invertible = rank == dim;
        if invertible {
            debug!("the regularised AtA is invertible");
        } else {
            error!(
                "the regularised AtA is not invertible (the rank is {}, full rank would be {}). \
                 Continuing with a best-effort inverse, the result is likely garbage. Increase lambda.",
                rank, dim
            );
        }

        let at_a_reg_inv = match lu.try_inverse() {
            Some(inv) => inv,
            None => {
                let eps = pivot_threshold(&lu);
                at_a_reg.pseudo_inverse(eps).map_err(Error::PseudoInverse)?
            }
        };
        debug!("inverting the regularised AtA took {}ms", t0.elapsed().as_millis());

        let coefficients = (at_a_reg_inv * at) * labels;
        trace!("coefficients: {}", coefficients);
        self.coefficients = Some(coefficients);

        Ok(invertible)
    }

    fn test(&self, data: &DataView<'_>, labels: &DataView<'_>) -> Result<f64> {
        let predictions = self.predict(data)?;

        normalised_residual(&predictions, labels)
    }

    fn predict(&self, values: &DataView<'_>) -> Result<DMatrix<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(Error::NotTrained)?;
        if values.ncols() != coefficients.nrows() {
            return Err(Error::DimensionMismatch {
                operation: "predict",
                expected: (values.nrows(), coefficients.nrows()),
                found: values.shape(),
            });
        }

        Ok(values * coefficients)
    }

    fn predict_scalar(&self, value: f64) -> Result<f64> {
        let coefficients = self.coefficients.as_ref().ok_or(Error::NotTrained)?;
        if coefficients.shape() != (1, 1) {
            return Err(Error::PredictShapeViolation {
                rows: coefficients.nrows(),
                cols: coefficients.ncols(),
            });
        }

        Ok(value * coefficients[(0, 0)])
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Dim, Matrix};
    use round::round;

    use super::*;
    use crate::RegularisationType;

    fn design_and_targets(scale: f64) -> (DMatrix<f64>, DMatrix<f64>) {
        // Note the first column being just ones
        let design: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(4),
            Dim::from_usize(3),
            vec![1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 2.0],
        );
        let targets: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(4),
            Dim::from_usize(1),
            vec![1.0, 2.0, 3.0, 4.0],
        );

        (design * scale, targets * scale)
    }

    #[test]
    fn linear_regressor() {
        let _ = pretty_env_logger::try_init();

        let (design, targets) = design_and_targets(1.0);
        info!("design: {}, targets: {}", design, targets);

        let mut regressor = LinearRegressor::default();
        let invertible = regressor
            .learn(&design.columns(0, design.ncols()), &targets.columns(0, targets.ncols()))
            .unwrap();
        assert!(invertible);

        let mut coefficients = regressor.coefficients().unwrap().clone();
        info!("coefficients: {}", coefficients);
        coefficients.iter_mut().for_each(|v| *v = round(*v, 1));

        assert_eq!(coefficients, DMatrix::from_vec(3, 1, vec![1.0, 1.0, 0.0]));
    }

    #[test]
    fn linear_regressor_shifted() {
        let _ = pretty_env_logger::try_init();

        let (design, targets) = design_and_targets(100.0);

        let mut regressor = LinearRegressor::default();
        assert!(regressor.learn(&design.rows(0, 4), &targets.rows(0, 4)).unwrap());

        let mut coefficients = regressor.coefficients().unwrap().clone();
        coefficients.iter_mut().for_each(|v| *v = round(*v, 1));

        assert_eq!(coefficients, DMatrix::from_vec(3, 1, vec![1.0, 1.0, 0.0]));
    }

    /// Tests a readout of the last observed row and the residual over all rows
    #[test]
    fn predict_from_row() {
        let _ = pretty_env_logger::try_init();

        let (design, targets) = design_and_targets(1.0);
        let mut regressor = LinearRegressor::default();
        regressor.learn(&design.rows(0, 4), &targets.rows(0, 4)).unwrap();

        let state = DMatrix::from_row_slice(1, 3, &[1.0, 3.0, 2.0]);
        let prediction = regressor.predict(&state.rows(0, 1)).unwrap();
        assert_eq!(prediction.shape(), (1, 1));
        assert!((prediction[(0, 0)] - 4.0).abs() < 1e-9);

        let residual = regressor.test(&design.rows(0, 4), &targets.rows(0, 4)).unwrap();
        assert!(residual < 1e-12);
    }

    #[test]
    fn manual_lambda_shrinks_coefficients() {
        let data = DMatrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]);
        let labels = &data * 2.0;

        let mut unregularised = LinearRegressor::default();
        unregularised.learn(&data.rows(0, 3), &labels.rows(0, 3)).unwrap();
        assert!((unregularised.predict_scalar(1.0).unwrap() - 2.0).abs() < 1e-12);

        // AtA = 14, Atb = 28
        let mut regressor =
            LinearRegressor::new(Regulariser::new(RegularisationType::Manual, 14.0, true));
        assert!(regressor.learn(&data.rows(0, 3), &labels.rows(0, 3)).unwrap());
        assert!((regressor.predict_scalar(1.0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn matrix_norm_lambda() {
        let data = DMatrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]);
        let labels = &data * 2.0;

        let mut regressor =
            LinearRegressor::new(Regulariser::new(RegularisationType::MatrixNorm, 0.5, true));
        assert!(regressor.learn(&data.rows(0, 3), &labels.rows(0, 3)).unwrap());

        let expected = 28.0 / (14.0 + 0.5 * 14.0 / 3.0);
        assert!((regressor.predict_scalar(1.0).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn bias_is_not_regularised() {
        let _ = pretty_env_logger::try_init();

        // y = 2x + 3, with the bias column last
        let data = DMatrix::from_row_slice(4, 2, &[1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0, 1.0]);
        let labels = DMatrix::from_vec(4, 1, vec![5.0, 7.0, 9.0, 11.0]);

        // AtA = [30 10; 10 4], Atb = [90; 32]
        let regulariser = Regulariser::new(RegularisationType::Manual, 5.0, false);
        let mut regressor = LinearRegressor::new(regulariser.clone());
        assert_eq!(regressor.regulariser(), &regulariser);
        assert!(regressor.learn(&data.rows(0, 4), &labels.rows(0, 4)).unwrap());
        let coefficients = regressor.coefficients().unwrap();
        assert!((coefficients[(0, 0)] - 1.0).abs() < 1e-9);
        assert!((coefficients[(1, 0)] - 5.5).abs() < 1e-9);

        let mut regressor =
            LinearRegressor::new(Regulariser::new(RegularisationType::Manual, 5.0, true));
        assert!(regressor.learn(&data.rows(0, 4), &labels.rows(0, 4)).unwrap());
        let coefficients = regressor.coefficients().unwrap();
        assert!((coefficients[(0, 0)] - 490.0 / 215.0).abs() < 1e-9);
        assert!((coefficients[(1, 0)] - 220.0 / 215.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_columns_are_not_invertible() {
        let _ = pretty_env_logger::try_init();

        let data = DMatrix::from_vec(4, 2, vec![1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0]);
        let labels = DMatrix::from_vec(4, 1, vec![2.0, 4.0, 6.0, 8.0]);

        let mut regressor = LinearRegressor::default();
        let invertible = regressor.learn(&data.rows(0, 4), &labels.rows(0, 4)).unwrap();
        assert!(!invertible);

        let coefficients = regressor.coefficients().unwrap();
        assert_eq!(coefficients.shape(), (2, 1));
        assert!(coefficients.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn regularisation_makes_duplicate_columns_invertible() {
        let data = DMatrix::from_vec(4, 2, vec![1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0]);
        let labels = DMatrix::from_vec(4, 1, vec![2.0, 4.0, 6.0, 8.0]);

        let mut regressor =
            LinearRegressor::new(Regulariser::new(RegularisationType::Manual, 0.1, true));
        assert!(regressor.learn(&data.rows(0, 4), &labels.rows(0, 4)).unwrap());

        // the weight is split evenly between the identical columns
        let coefficients = regressor.coefficients().unwrap();
        assert!((coefficients[(0, 0)] - coefficients[(1, 0)]).abs() < 1e-9);
    }

    #[test]
    fn predict_before_learn() {
        let regressor = LinearRegressor::default();
        let values = DMatrix::from_element(1, 1, 1.0);

        assert_eq!(regressor.predict(&values.rows(0, 1)), Err(Error::NotTrained));
        assert_eq!(regressor.predict_scalar(1.0), Err(Error::NotTrained));
    }

    #[test]
    fn predict_dimension_mismatch() {
        let (design, targets) = design_and_targets(1.0);
        let mut regressor = LinearRegressor::default();
        regressor.learn(&design.rows(0, 4), &targets.rows(0, 4)).unwrap();

        let values = DMatrix::from_element(2, 2, 1.0);
        assert_eq!(
            regressor.predict(&values.rows(0, 2)),
            Err(Error::DimensionMismatch {
                operation: "predict",
                expected: (2, 3),
                found: (2, 2),
            })
        );
    }

    #[test]
    fn predict_scalar_needs_one_by_one() {
        let (design, targets) = design_and_targets(1.0);
        let mut regressor = LinearRegressor::default();
        regressor.learn(&design.rows(0, 4), &targets.rows(0, 4)).unwrap();

        assert_eq!(
            regressor.predict_scalar(1.0),
            Err(Error::PredictShapeViolation { rows: 3, cols: 1 })
        );
    }

    #[test]
    fn learn_rejects_bad_input() {
        let data = DMatrix::from_element(3, 2, 1.0);
        let labels = DMatrix::from_element(2, 1, 1.0);
        let mut regressor = LinearRegressor::default();

        assert_eq!(
            regressor.learn(&data.rows(0, 3), &labels.rows(0, 2)),
            Err(Error::DimensionMismatch {
                operation: "learn",
                expected: (3, 1),
                found: (2, 1),
            })
        );

        let empty = DMatrix::<f64>::zeros(0, 2);
        assert_eq!(
            regressor.learn(&empty.rows(0, 0), &empty.rows(0, 0)),
            Err(Error::NoExamples("learn"))
        );
        assert!(regressor.coefficients().is_none());
    }
}
