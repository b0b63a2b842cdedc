use lin_reg::{Error, Result};
use nalgebra::DVector;

/// How often the descent map is applied
pub const NUM_ITERATIONS: usize = 25;

/// Applies one fixed, generic descent map to scalar examples, without learning anything.
///
/// # Example
/// ```
/// use nalgebra::DVector;
/// use supervised_descent::GenericDM1D;
///
/// // starting points in [-2, 4], all of them should end up at 1, as exp(1) = e
/// let x0 = DVector::from_fn(31, |i, _| -2.0 + 0.2 * i as f64);
/// let labels = DVector::from_element(31, std::f64::consts::E);
///
/// let x = GenericDM1D.train(&x0, &labels, 0.115, f64::exp).unwrap();
/// assert!(x.iter().all(|v| (v - 1.0).abs() < 0.01));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDM1D;

impl GenericDM1D {
    /// Runs `x_next = x_prev - r * (h(x_prev) - label)` for every example
    ///
    /// # Arguments:
    /// data: The starting positions
    /// labels: The observed measurement for each example
    /// generic_descent_map: The factor r
    /// h: The measurement function
    ///
    /// # Returns:
    /// The positions after the last iteration
    pub fn train<H>(
        &self,
        data: &DVector<f64>,
        labels: &DVector<f64>,
        generic_descent_map: f64,
        h: H,
    ) -> Result<DVector<f64>>
    where
        H: Fn(f64) -> f64,
    {
        if data.len() != labels.len() {
            return Err(Error::DimensionMismatch {
                operation: "generic descent map",
                expected: data.shape(),
                found: labels.shape(),
            });
        }
        info!("r is: {}", generic_descent_map);
        debug!("x_0: {}", data);

        let mut x_prev = data.clone();
        for iteration in 1..=NUM_ITERATIONS {
            let x_next = x_prev.zip_map(labels, |x, label| {
                x - generic_descent_map * (h(x) - label)
            });
            debug!("x_{}: {}", iteration, x_next);
            x_prev = x_next;
        }

        Ok(x_prev)
    }
}
