//! Supervised descent: a cascade of learned linear descent maps that drives an
//! initial guess towards the unknown state, given a known measurement function.

#![warn(missing_docs)]

#[macro_use]
extern crate log;

mod feature;
mod generic_dm_1d;
mod optimiser;

pub use feature::{FeatureFunction, ParallelFeatures};
pub use generic_dm_1d::{GenericDM1D, NUM_ITERATIONS};
pub use lin_reg::{
    normalised_residual, DataView, Error, LinearRegressor, RegularisationType, Regulariser,
    Regressor, Result,
};
pub use optimiser::{no_eval, SupervisedDescentOptimiser};
