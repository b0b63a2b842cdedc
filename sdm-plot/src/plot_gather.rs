use crate::Series;

/// Collects the ground truth and the estimate after every stage of a cascade
#[derive(Debug, Clone, Default)]
pub struct PlotGather {
    targets: Series,
    stages: Vec<Series>,
}

impl PlotGather {
    #[inline(always)]
    pub fn push_target(&mut self, y: f64, x: f64) {
        self.targets.push((y, x))
    }

    /// Add the estimates of the next stage
    #[inline(always)]
    pub fn push_stage(&mut self, estimates: Series) {
        self.stages.push(estimates)
    }

    #[inline(always)]
    pub fn targets(&self) -> &Series {
        &self.targets
    }

    #[inline(always)]
    pub fn stages(&self) -> &[Series] {
        &self.stages
    }
}
