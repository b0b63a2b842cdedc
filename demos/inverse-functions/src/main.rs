#[macro_use]
extern crate log;

use std::time::Instant;

use dialoguer::{theme::ColorfulTheme, Input, Select};
use nalgebra::{DMatrix, RowDVector};
use sdm_plot::{plot, PlotGather, Series};
use supervised_descent::{
    normalised_residual, FeatureFunction, LinearRegressor, ParallelFeatures, RegularisationType,
    Regulariser, SupervisedDescentOptimiser,
};

/// A measurement function together with its inverse, used to generate ground truth
struct Problem {
    name: &'static str,
    h: fn(&RowDVector<f64>) -> RowDVector<f64>,
    h_inv: fn(f64) -> f64,
    /// start, step and number of observations used in training
    train_range: (f64, f64, usize),
    /// start, step and number of observations used in testing
    test_range: (f64, f64, usize),
}

fn h_sin(x: &RowDVector<f64>) -> RowDVector<f64> {
    x.map(f64::sin)
}

fn h_cube(x: &RowDVector<f64>) -> RowDVector<f64> {
    x.map(|v| v.powi(3))
}

fn h_exp(x: &RowDVector<f64>) -> RowDVector<f64> {
    x.map(f64::exp)
}

/// The upper border can be exceeded a bit due to floating point representation
fn clamped_asin(value: f64) -> f64 {
    value.min(1.0).asin()
}

static PROBLEMS: [Problem; 3] = [
    Problem {
        name: "sin",
        h: h_sin,
        h_inv: clamped_asin,
        train_range: (-1.0, 0.2, 11),
        test_range: (-1.0, 0.05, 41),
    },
    Problem {
        name: "x^3",
        h: h_cube,
        h_inv: f64::cbrt,
        train_range: (-27.0, 3.0, 19),
        test_range: (-27.0, 0.5, 109),
    },
    Problem {
        name: "exp",
        h: h_exp,
        h_inv: f64::ln,
        train_range: (1.0, 3.0, 10),
        test_range: (1.0, 0.5, 55),
    },
];

const X0: f64 = 0.5;

fn strided_iota((start, step, n): (f64, f64, usize)) -> DMatrix<f64> {
    let mut values = Vec::with_capacity(n);
    let mut value = start;
    for _ in 0..n {
        values.push(value);
        value += step;
    }
    DMatrix::from_vec(n, 1, values)
}

fn to_series(y: &DMatrix<f64>, x: &DMatrix<f64>) -> Series {
    y.iter().cloned().zip(x.iter().cloned()).collect()
}

pub(crate) fn main() {
    pretty_env_logger::init();

    let names: Vec<&str> = PROBLEMS.iter().map(|p| p.name).collect();
    let p = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select the function to invert")
        .items(&names)
        .default(0)
        .interact()
        .unwrap();
    let problem = &PROBLEMS[p];

    let num_stages: usize = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Number of cascade stages")
        .default(10)
        .interact_text()
        .unwrap();

    let regularisations = vec!["none", "matrix norm (0.5)"];
    let r = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select the regularisation")
        .items(&regularisations)
        .default(0)
        .interact()
        .unwrap();
    let regulariser = match r {
        0 => Regulariser::default(),
        1 => Regulariser::new(RegularisationType::MatrixNorm, 0.5, true),
        _ => panic!("invalid regularisation selection"),
    };

    let y_tr = strided_iota(problem.train_range);
    let x_tr = y_tr.map(problem.h_inv);
    let x0_tr = DMatrix::from_element(y_tr.nrows(), 1, X0);
    info!("got {} training examples", y_tr.nrows());

    let h = ParallelFeatures::new(problem.h);
    let mut sdo =
        SupervisedDescentOptimiser::new(vec![LinearRegressor::new(regulariser); num_stages]);

    let mut gather = PlotGather::default();
    for (y, x) in to_series(&y_tr, &x_tr) {
        gather.push_target(y, x);
    }

    let t0 = Instant::now();
    let solved = sdo
        .train_with_callback(&x_tr, &y_tr, &x0_tr, &h, |current_x| {
            let residual = normalised_residual(current_x, &x_tr).unwrap();
            info!("stage {}: training residual {:.6}", gather.stages().len() + 1, residual);
            gather.push_stage(to_series(&y_tr, current_x));
        })
        .unwrap();
    info!("training done in: {}ms", t0.elapsed().as_millis());
    if solved.iter().any(|ok| !ok) {
        warn!("not every stage could be solved: {:?}", solved);
    }

    let y_ts = strided_iota(problem.test_range);
    let x_ts = y_ts.map(problem.h_inv);
    let x0_ts = DMatrix::from_element(y_ts.nrows(), 1, X0);
    let predictions = sdo.test(&y_ts, &x0_ts, &h).unwrap();
    info!(
        "test residual on {} examples: {:.6}",
        y_ts.nrows(),
        normalised_residual(&predictions, &x_ts).unwrap()
    );

    let y_last = y_ts[(y_ts.nrows() - 1, 0)];
    let single = sdo
        .predict(&RowDVector::from_element(1, X0), &RowDVector::from_element(1, y_last), &h)
        .unwrap();
    info!(
        "{}^-1({}) ~ {}, truth: {}, h(estimate): {}",
        problem.name,
        y_last,
        single[0],
        (problem.h_inv)(y_last),
        h.evaluate(&single)[0]
    );

    std::fs::create_dir_all("img").unwrap();
    let filename = format!("img/sdm_{}.png", problem.name.replace('^', ""));
    plot(&gather, &filename, (1080, 1080)).unwrap();
}
