//! Plots the convergence of a supervised descent cascade

#[macro_use]
extern crate log;

mod plot;
mod plot_gather;

pub use plot::plot;
pub use plot_gather::PlotGather;

/// (observation, state) pairs
pub type Series = Vec<(f64, f64)>;
