use std::{cmp::max, panic::resume_unwind};

use lin_reg::{Error, Result};
use nalgebra::{DMatrix, RowDVector};

/// The measurement function `h`, mapping a state estimate to its predicted observation.
/// Must be free of side effects, as it is evaluated once per example and stage.
///
/// Any `Fn(&RowDVector<f64>) -> RowDVector<f64>` is a feature function.
pub trait FeatureFunction {
    /// Map a single state row to an observation row
    fn evaluate(&self, x: &RowDVector<f64>) -> RowDVector<f64>;

    /// Map every row of `xs`, keeping the order of the rows.
    /// Override this if there is a faster way of processing many examples at once.
    fn evaluate_batch(&self, xs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let rows: Vec<RowDVector<f64>> =
            xs.row_iter().map(|x| self.evaluate(&x.into_owned())).collect();

        stack_rows(&rows)
    }
}

impl<F> FeatureFunction for F
where
    F: Fn(&RowDVector<f64>) -> RowDVector<f64>,
{
    #[inline(always)]
    fn evaluate(&self, x: &RowDVector<f64>) -> RowDVector<f64> {
        self(x)
    }
}

/// Stack the rows on top of each other, all of them need the same length
fn stack_rows(rows: &[RowDVector<f64>]) -> Result<DMatrix<f64>> {
    let ncols = rows.first().map(|r| r.ncols()).unwrap_or(0);
    if let Some(row) = rows.iter().find(|r| r.ncols() != ncols) {
        return Err(Error::DimensionMismatch {
            operation: "feature function",
            expected: (1, ncols),
            found: row.shape(),
        });
    }

    Ok(DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

/// Evaluates the wrapped feature function for chunks of examples on separate threads.
/// The output is identical to evaluating it sequentially.
#[derive(Debug, Clone)]
pub struct ParallelFeatures<F> {
    h: F,
    num_threads: usize,
}

impl<F> ParallelFeatures<F> {
    /// Use all available cpus
    pub fn new(h: F) -> Self {
        Self::with_num_threads(h, num_cpus::get())
    }

    /// Use at most `num_threads` threads, at least one
    pub fn with_num_threads(h: F, num_threads: usize) -> Self {
        Self {
            h,
            num_threads: max(num_threads, 1),
        }
    }

    /// The number of threads a batch is split across
    #[inline(always)]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

impl<F> FeatureFunction for ParallelFeatures<F>
where
    F: FeatureFunction + Sync,
{
    #[inline(always)]
    fn evaluate(&self, x: &RowDVector<f64>) -> RowDVector<f64> {
        self.h.evaluate(x)
    }

    fn evaluate_batch(&self, xs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let n = xs.nrows();
        if self.num_threads == 1 || n < 2 {
            return self.h.evaluate_batch(xs);
        }
        let chunk_len = (n + self.num_threads - 1) / self.num_threads;
        trace!("evaluating {} examples in chunks of {}", n, chunk_len);

        let h = &self.h;
        let chunks: Vec<Vec<RowDVector<f64>>> = crossbeam::scope(|s| {
            let handles: Vec<_> = (0..n)
                .step_by(chunk_len)
                .map(|start| {
                    let end = (start + chunk_len).min(n);
                    s.spawn(move |_| {
                        (start..end)
                            .map(|i| h.evaluate(&xs.row(i).into_owned()))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| resume_unwind(e)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|e| resume_unwind(e));

        let rows: Vec<RowDVector<f64>> = chunks.into_iter().flatten().collect();

        stack_rows(&rows)
    }
}
