use nalgebra::{DMatrix, Dim, Matrix};

/// Used by `EigenvalueThreshold` until a real threshold is computed
const EIGENVALUE_THRESHOLD_FALLBACK: f64 = 0.5;

/// How the ridge parameter lambda is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegularisationType {
    /// Use lambda as given
    #[default]
    Manual,
    /// Lambda is a factor, multiplied with the norm of the data divided by the
    /// number of training examples. If used, a suitable factor is 0.5.
    MatrixNorm,
    /// Not implemented yet, always uses a lambda of 0.5
    EigenvalueThreshold,
}

/// Builds the diagonal regularisation matrix of a ridge regression
#[derive(Debug, Clone, PartialEq)]
pub struct Regulariser {
    /// The policy for determining the effective lambda
    pub regularisation_type: RegularisationType,
    /// Either lambda itself or the factor of the `MatrixNorm` policy
    pub lambda: f64,
    /// If the last row of the data is a bias (offset), setting this to false
    /// excludes it from the regularisation
    pub regularise_last_row: bool,
}

impl Default for Regulariser {
    fn default() -> Self {
        Self {
            regularisation_type: RegularisationType::Manual,
            lambda: 0.0,
            regularise_last_row: true,
        }
    }
}

impl Regulariser {
    /// Create a new regulariser
    pub fn new(
        regularisation_type: RegularisationType,
        lambda: f64,
        regularise_last_row: bool,
    ) -> Self {
        Self {
            regularisation_type,
            lambda,
            regularise_last_row,
        }
    }

    /// The lambda that ends up on the diagonal for the given data.
    /// The configured lambda is left untouched.
    pub fn effective_lambda(&self, data: &DMatrix<f64>, num_training_examples: usize) -> f64 {
        match self.regularisation_type {
            RegularisationType::Manual => self.lambda,
            RegularisationType::MatrixNorm => {
                self.lambda * data.norm() / num_training_examples as f64
            }
            RegularisationType::EigenvalueThreshold => {
                warn!(
                    "the eigenvalue threshold is not implemented, falling back to a lambda of {}",
                    EIGENVALUE_THRESHOLD_FALLBACK
                );
                EIGENVALUE_THRESHOLD_FALLBACK
            }
        }
    }

    /// Returns a diagonal regularisation matrix with the same dimensions as `data`,
    /// which usually is the normal-equation matrix AtA
    ///
    /// # Parameters
    /// data: may be used to calculate an automatic lambda
    /// num_training_examples: the number of rows the normal equations were built from
    pub fn get_matrix(&self, data: &DMatrix<f64>, num_training_examples: usize) -> DMatrix<f64> {
        let lambda = self.effective_lambda(data, num_training_examples);
        debug!("lambda is: {}", lambda);

        let mut reg_m: DMatrix<f64> = Matrix::from_diagonal_element_generic(
            Dim::from_usize(data.nrows()),
            Dim::from_usize(data.ncols()),
            lambda,
        );

        if !self.regularise_last_row && data.nrows() > 0 && data.ncols() > 0 {
            // no lambda for the bias
            reg_m[(data.nrows() - 1, data.ncols() - 1)] = 0.0;
        }

        reg_m
    }
}
