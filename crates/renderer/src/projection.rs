//! Linear accumulation projected from `(rate, deadline, goal)`
//!
//! The mapping is pure: identical parameters always produce an identical
//! series.

use eco_chart_shared::{EcoChartResult, ProjectionConfig, Series, SeriesPoint};

/// Fewest intervals, for visual smoothness
pub const MIN_INTERVALS: usize = 20;

/// Most intervals, for rendering cost
pub const MAX_INTERVALS: usize = 100;

/// Number of intervals for a deadline in whole seconds
pub fn interval_count(deadline: f64) -> usize {
    (deadline.max(0.0).round() as usize).clamp(MIN_INTERVALS, MAX_INTERVALS)
}

/// Sample `value = rate * time` from zero to the deadline.
///
/// The series always ends exactly at `(deadline, round(rate * deadline))`
/// so goal markers drawn at the deadline line up with the endpoint.
pub fn project(config: &ProjectionConfig) -> EcoChartResult<Series> {
    let config = config.normalized()?;
    let intervals = interval_count(config.deadline);
    let step = config.deadline / intervals as f64;

    let mut points = Vec::with_capacity(intervals + 2);
    for i in 0..=intervals {
        let time = (i as f64 * step).round();
        points.push(SeriesPoint::new(time, (config.rate * time).round()));
    }

    if points.last().map(|p| p.time) != Some(config.deadline) {
        points.push(SeriesPoint::new(
            config.deadline,
            (config.rate * config.deadline).round(),
        ));
    }

    Ok(Series::new(points))
}

/// `ceil(max(peak, goal) * 1.1)`.
///
/// Computed as `* 11 / 10` so integer peaks stay exact: 3000 gives 3300, not
/// 3301 from the rounding error of `3000.0 * 1.1`.
pub fn y_axis_max(series: &Series, goal: f64) -> f64 {
    let peak = series.max_value().map_or(goal, |max| max.max(goal));
    (peak * 11.0 / 10.0).ceil()
}

/// Everything the projection view derives from one metric's parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub series: Series,
    pub goal: f64,
    pub final_value: f64,
    pub y_axis_max: f64,
}

impl Projection {
    pub fn compute(config: &ProjectionConfig) -> EcoChartResult<Self> {
        let series = project(config)?;
        let final_value = series.last().map_or(0.0, |p| p.value);
        let y_axis_max = y_axis_max(&series, config.goal);

        Ok(Self {
            series,
            goal: config.goal,
            final_value,
            y_axis_max,
        })
    }
}
