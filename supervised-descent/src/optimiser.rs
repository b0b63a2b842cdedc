use std::time::Instant;

use lin_reg::{Error, Regressor, Result};
use nalgebra::{DMatrix, RowDVector};

use crate::FeatureFunction;

/// The default stage observer, does nothing
#[inline(always)]
pub fn no_eval(_current_x: &DMatrix<f64>) {}

/// Learns a cascade of regressors, each of which maps the difference between the
/// predicted and the observed measurement to a correction of the state estimate.
///
/// All matrices hold one example per row.
#[derive(Debug, Clone)]
pub struct SupervisedDescentOptimiser<R> {
    regressors: Vec<R>,
}

impl<R> SupervisedDescentOptimiser<R>
where
    R: Regressor,
{
    /// Create a new cascade. The stages are applied in the order given.
    pub fn new(regressors: Vec<R>) -> Self {
        Self { regressors }
    }

    /// The stages of the cascade
    #[inline(always)]
    pub fn regressors(&self) -> &[R] {
        &self.regressors
    }

    /// Train all stages, see [`Self::train_with_callback`]
    pub fn train<H>(
        &mut self,
        x: &DMatrix<f64>,
        y: &DMatrix<f64>,
        x0: &DMatrix<f64>,
        h: &H,
    ) -> Result<Vec<bool>>
    where
        H: FeatureFunction,
    {
        self.train_with_callback(x, y, x0, h, no_eval)
    }

    /// Train all stages of the cascade, one after another
    ///
    /// # Arguments:
    /// x: The ground truth states we want to learn
    /// y: The observed measurements of `x`
    /// x0: The initialisation, usually a constant
    /// h: The measurement function
    /// on_stage: Called with the current state estimate after every stage
    ///
    /// # Returns:
    /// Whether the regression problem of each stage could be solved.
    /// Training continues with a best-effort regressor for stages that could not.
    pub fn train_with_callback<H, C>(
        &mut self,
        x: &DMatrix<f64>,
        y: &DMatrix<f64>,
        x0: &DMatrix<f64>,
        h: &H,
        mut on_stage: C,
    ) -> Result<Vec<bool>>
    where
        H: FeatureFunction,
        C: FnMut(&DMatrix<f64>),
    {
        check_examples("train", y, x0)?;
        if x.shape() != x0.shape() {
            return Err(Error::DimensionMismatch {
                operation: "train",
                expected: x0.shape(),
                found: x.shape(),
            });
        }

        let num_stages = self.regressors.len();
        let mut solved = Vec::with_capacity(num_stages);
        let mut current_x = x0.clone();
        for (stage, regressor) in self.regressors.iter_mut().enumerate() {
            let t0 = Instant::now();
            let inside_regressor = observation_residual(h, &current_x, y)?;
            // Learn the direction from the current estimate towards the truth,
            // it gets subtracted in the update.
            let target = &current_x - x;

            let ok = regressor.learn(
                &inside_regressor.rows(0, inside_regressor.nrows()),
                &target.rows(0, target.nrows()),
            )?;
            if !ok {
                warn!("stage {} could not be solved, continuing with a best-effort regressor", stage);
            }
            solved.push(ok);

            current_x = descend(regressor, &current_x, &inside_regressor)?;
            info!(
                "trained stage {}/{} in {}ms",
                stage + 1,
                num_stages,
                t0.elapsed().as_millis()
            );
            on_stage(&current_x);
        }

        Ok(solved)
    }

    /// Apply the trained cascade, see [`Self::test_with_callback`]
    pub fn test<H>(&self, y: &DMatrix<f64>, x0: &DMatrix<f64>, h: &H) -> Result<DMatrix<f64>>
    where
        H: FeatureFunction,
    {
        self.test_with_callback(y, x0, h, no_eval)
    }

    /// Apply all trained stages to the initialisation `x0`
    ///
    /// # Arguments:
    /// y: The observed measurements, one row per example
    /// x0: The initialisation, one row per example
    /// h: The measurement function
    /// on_stage: Called with the current state estimate after every stage
    ///
    /// # Returns:
    /// The state estimate after the last stage
    pub fn test_with_callback<H, C>(
        &self,
        y: &DMatrix<f64>,
        x0: &DMatrix<f64>,
        h: &H,
        mut on_stage: C,
    ) -> Result<DMatrix<f64>>
    where
        H: FeatureFunction,
        C: FnMut(&DMatrix<f64>),
    {
        check_examples("test", y, x0)?;

        let mut current_x = x0.clone();
        for regressor in self.regressors.iter() {
            let inside_regressor = observation_residual(h, &current_x, y)?;
            current_x = descend(regressor, &current_x, &inside_regressor)?;
            on_stage(&current_x);
        }

        Ok(current_x)
    }

    /// Predicts the state of a single example with a known template measurement
    pub fn predict<H>(
        &self,
        x0: &RowDVector<f64>,
        template_y: &RowDVector<f64>,
        h: &H,
    ) -> Result<RowDVector<f64>>
    where
        H: FeatureFunction,
    {
        let x0 = DMatrix::from_row_slice(1, x0.ncols(), x0.as_slice());
        let y = DMatrix::from_row_slice(1, template_y.ncols(), template_y.as_slice());

        let prediction = self.test(&y, &x0, h)?;

        Ok(prediction.row(0).into_owned())
    }
}

/// Both matrices need the same, non-zero number of examples
fn check_examples(operation: &'static str, y: &DMatrix<f64>, x0: &DMatrix<f64>) -> Result<()> {
    if x0.nrows() == 0 {
        return Err(Error::NoExamples(operation));
    }
    if y.nrows() != x0.nrows() {
        return Err(Error::DimensionMismatch {
            operation,
            expected: (x0.nrows(), y.ncols()),
            found: y.shape(),
        });
    }

    Ok(())
}

/// h(current_x) - y, the input of a regressor
fn observation_residual<H>(h: &H, current_x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<DMatrix<f64>>
where
    H: FeatureFunction,
{
    let features = h.evaluate_batch(current_x)?;
    if features.shape() != y.shape() {
        return Err(Error::DimensionMismatch {
            operation: "feature function",
            expected: y.shape(),
            found: features.shape(),
        });
    }

    Ok(features - y)
}

/// x_k = current_x - R * (h(current_x) - y), for every example
fn descend<R>(
    regressor: &R,
    current_x: &DMatrix<f64>,
    inside_regressor: &DMatrix<f64>,
) -> Result<DMatrix<f64>>
where
    R: Regressor,
{
    let step = regressor.predict(&inside_regressor.rows(0, inside_regressor.nrows()))?;
    if step.shape() != current_x.shape() {
        return Err(Error::DimensionMismatch {
            operation: "descend",
            expected: current_x.shape(),
            found: step.shape(),
        });
    }

    Ok(current_x - step)
}
