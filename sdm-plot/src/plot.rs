use std::error::Error;

use plotters::prelude::*;

use super::PlotGather;

/// Draws the ground truth in black and the estimate of every stage in its own color
pub fn plot(gather: &PlotGather, filename: &str, dims: (u32, u32)) -> Result<(), Box<dyn Error>> {
    let targets = gather.targets();
    info!("n_targets: {}, n_stages: {}", targets.len(), gather.stages().len());
    if targets.is_empty() {
        return Err("there are no targets to plot".into());
    }

    let mut y_min = targets[0].0;
    let mut y_max = targets[0].0;
    let mut x_min = targets[0].1;
    let mut x_max = targets[0].1;
    for (y, x) in targets.iter().chain(gather.stages().iter().flatten()) {
        if *y < y_min {
            y_min = *y;
        }
        if *y > y_max {
            y_max = *y;
        }
        if *x < x_min {
            x_min = *x;
        }
        if *x > x_max {
            x_max = *x;
        }
    }
    info!("observations: [{}, {}], states: [{}, {}]", y_min, y_max, x_min, x_max);

    let root_area = BitMapBackend::new(filename, dims).into_drawing_area();
    root_area.fill(&WHITE)?;
    let root_area = root_area.titled(filename, ("sans-serif", 20).into_font())?;

    let mut cc0 = ChartBuilder::on(&root_area)
        .margin(5)
        .set_all_label_area_size(50)
        .caption("state over observation", ("sans-serif", 30).into_font().with_color(&BLACK))
        .build_cartesian_2d(y_min..y_max, x_min..x_max)?;
    cc0.configure_mesh()
        .x_labels(20)
        .y_labels(20)
        .x_label_formatter(&|v| format!("{:.2}", v))
        .y_label_formatter(&|v| format!("{:.4}", v))
        .draw()?;

    cc0.draw_series(LineSeries::new(targets.clone(), &BLACK))?
        .label("ground truth")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));
    for (i, estimates) in gather.stages().iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        cc0.draw_series(LineSeries::new(estimates.clone(), color))?
            .label(format!("stage {}", i + 1))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    cc0.configure_series_labels().border_style(&BLACK).draw()?;

    root_area.present()?;
    info!("successfully plotted to {}", filename);

    Ok(())
}
