//! Shared types for the Eco Chart widget
//!
//! This crate contains the domain model that the renderer, the integration
//! layer and the wasm bridge all agree on: channels, series, projection
//! parameters and the host update payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod errors;
pub mod events;
pub mod payload;
pub mod tooltip;

pub use errors::{EcoChartError, EcoChartResult};

/// One named metric track. Declaration order is the series order in the chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ChannelName {
    Mass,
    Energy,
    BuildPower,
}

impl ChannelName {
    pub const ALL: [ChannelName; 3] = [ChannelName::Mass, ChannelName::Energy, ChannelName::BuildPower];

    /// Position of the channel's series in the engine option
    pub fn index(self) -> usize {
        match self {
            ChannelName::Mass => 0,
            ChannelName::Energy => 1,
            ChannelName::BuildPower => 2,
        }
    }

    /// Human readable series name, also used as the engine series name
    pub fn label(self) -> &'static str {
        match self {
            ChannelName::Mass => "Mass",
            ChannelName::Energy => "Energy",
            ChannelName::BuildPower => "Build Power",
        }
    }

    /// Dataset key carrying the channel values on the snapshot path
    pub fn snapshot_key(self) -> &'static str {
        match self {
            ChannelName::Mass => "mass",
            ChannelName::Energy => "energy",
            ChannelName::BuildPower => "buildPower",
        }
    }

    /// Payload key carrying the channel values on the message path
    pub fn message_key(self) -> &'static str {
        match self {
            ChannelName::Mass => "mass",
            ChannelName::Energy => "energy",
            ChannelName::BuildPower => "build_power",
        }
    }

    pub fn visibility_snapshot_key(self) -> &'static str {
        match self {
            ChannelName::Mass => "showMass",
            ChannelName::Energy => "showEnergy",
            ChannelName::BuildPower => "showBuildPower",
        }
    }

    pub fn visibility_message_key(self) -> &'static str {
        match self {
            ChannelName::Mass => "show_mass",
            ChannelName::Energy => "show_energy",
            ChannelName::BuildPower => "show_build_power",
        }
    }

    /// Parse either key spelling or the label
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "mass" | "Mass" => Some(ChannelName::Mass),
            "energy" | "Energy" => Some(ChannelName::Energy),
            "buildPower" | "build_power" | "Build Power" => Some(ChannelName::BuildPower),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single `(time, value)` sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub time: f64,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Every time is at least the one before it
pub fn is_ordered_axis(time: &[f64]) -> bool {
    time.windows(2).all(|pair| pair[0] <= pair[1])
}

/// Ordered time/value pairs forming one plotted line
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Series {
    points: Vec<SeriesPoint>,
}

impl Series {
    pub fn new(points: Vec<SeriesPoint>) -> Self {
        Self { points }
    }

    /// Zip a shared time axis with one channel's values.
    /// Returns `None` when the lengths disagree or time goes backwards.
    pub fn from_axis(time: &[f64], values: &[f64]) -> Option<Self> {
        if time.len() != values.len() || !is_ordered_axis(time) {
            return None;
        }
        Some(Self {
            points: time
                .iter()
                .zip(values)
                .map(|(&t, &v)| SeriesPoint::new(t, v))
                .collect(),
        })
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.time).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Largest value in the series, `None` when empty
    pub fn max_value(&self) -> Option<f64> {
        self.points.iter().map(|p| p.value).reduce(f64::max)
    }
}

/// One channel as the widget holds it between updates
#[derive(Debug, Clone, PartialEq)]
pub struct MetricChannel {
    pub name: ChannelName,
    pub series: Series,
    /// Host intent. A hidden channel keeps its series.
    pub visible: bool,
}

impl MetricChannel {
    pub fn empty(name: ChannelName) -> Self {
        Self {
            name,
            series: Series::default(),
            visible: true,
        }
    }
}

/// Which metric is in the foreground of the projection view
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    Mass,
    Energy,
}

impl ViewMode {
    pub fn channel(self) -> ChannelName {
        match self {
            ViewMode::Mass => ChannelName::Mass,
            ViewMode::Energy => ChannelName::Energy,
        }
    }

    /// The metric shown only as secondary title text
    pub fn other(self) -> ViewMode {
        match self {
            ViewMode::Mass => ViewMode::Energy,
            ViewMode::Energy => ViewMode::Mass,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "mass" | "Mass" => Some(ViewMode::Mass),
            "energy" | "Energy" => Some(ViewMode::Energy),
            _ => None,
        }
    }
}

/// Summary parameters used when the host does not send a full series.
///
/// Fields decode independently. A missing `rate` or `deadline` decodes as
/// NaN and is rejected by [`ProjectionConfig::normalized`]; a missing goal
/// is 0, meaning no goal marker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProjectionConfig {
    #[serde(default = "unset")]
    pub rate: f64,
    /// Seconds
    #[serde(default = "unset")]
    pub deadline: f64,
    #[serde(default)]
    pub goal: f64,
}

fn unset() -> f64 {
    f64::NAN
}

impl ProjectionConfig {
    pub fn new(rate: f64, deadline: f64, goal: f64) -> Self {
        Self { rate, deadline, goal }
    }

    /// Validate and snap the deadline to whole seconds
    pub fn normalized(&self) -> EcoChartResult<Self> {
        if !self.rate.is_finite() || !self.goal.is_finite() {
            return Err(EcoChartError::InvalidProjection {
                message: format!("rate {} and goal {} must be finite", self.rate, self.goal),
            });
        }
        if !self.deadline.is_finite() || self.deadline < 1.0 {
            return Err(EcoChartError::InvalidProjection {
                message: format!("deadline {} must be at least one second", self.deadline),
            });
        }
        Ok(Self {
            rate: self.rate,
            deadline: self.deadline.round(),
            goal: self.goal,
        })
    }
}

/// Which update shape a widget instance accepts
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateContract {
    /// Host pushes explicit time axis and per-channel values
    #[default]
    Timeline,
    /// Host pushes `ProjectionConfig` per metric and a `ViewMode`
    Projection,
}

/// Derived numbers for the projection view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub channel: ChannelName,
    pub final_value: f64,
    pub goal: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSummary {
    pub active: MetricSummary,
    pub y_axis_max: f64,
    /// The inactive metric, rendered as title text only
    pub secondary: Option<MetricSummary>,
}

/// Per-instance chart state
#[derive(Debug, Clone, PartialEq)]
pub struct ChartState {
    pub time_axis: Vec<f64>,
    pub channels: BTreeMap<ChannelName, MetricChannel>,
    pub active_view: Option<ViewMode>,
    pub projection: Option<ProjectionSummary>,
}

impl Default for ChartState {
    fn default() -> Self {
        Self {
            time_axis: Vec::new(),
            channels: ChannelName::ALL
                .iter()
                .map(|&name| (name, MetricChannel::empty(name)))
                .collect(),
            active_view: None,
            projection: None,
        }
    }
}

impl ChartState {
    pub fn channel(&self, name: ChannelName) -> Option<&MetricChannel> {
        self.channels.get(&name)
    }

    pub fn channel_mut(&mut self, name: ChannelName) -> &mut MetricChannel {
        self.channels
            .entry(name)
            .or_insert_with(|| MetricChannel::empty(name))
    }

    /// Channels that would show data right now
    pub fn displayed_channels(&self) -> impl Iterator<Item = &MetricChannel> {
        self.channels
            .values()
            .filter(|c| c.visible && !c.series.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_from_axis_rejects_mismatch() {
        assert!(Series::from_axis(&[1.0, 2.0], &[5.0]).is_none());

        let series = Series::from_axis(&[1.0, 2.0], &[5.0, 7.0]).unwrap();
        assert_eq!(series.len(), 2);
        assert!(Series::from_axis(&[0.0, 60.0, 30.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(Series::from_axis(&[0.0, f64::NAN], &[1.0, 2.0]).is_none());
        assert!(Series::from_axis(&[0.0, 0.0, 60.0], &[1.0, 2.0, 3.0]).is_some());
        assert_eq!(series.times(), vec![1.0, 2.0]);
        assert_eq!(series.max_value(), Some(7.0));
    }

    #[test]
    fn test_channel_keys() {
        assert_eq!(ChannelName::BuildPower.snapshot_key(), "buildPower");
        assert_eq!(ChannelName::BuildPower.message_key(), "build_power");
        assert_eq!(ChannelName::Energy.visibility_message_key(), "show_energy");
        assert_eq!(ChannelName::parse("build_power"), Some(ChannelName::BuildPower));
        assert_eq!(ChannelName::parse("fuel"), None);

        for (i, name) in ChannelName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
    }

    #[test]
    fn test_projection_config_normalization() {
        let config = ProjectionConfig::new(10.0, 299.6, 1000.0).normalized().unwrap();
        assert_eq!(config.deadline, 300.0);

        assert!(ProjectionConfig::new(10.0, 0.5, 1000.0).normalized().is_err());
        assert!(ProjectionConfig::new(f64::NAN, 10.0, 1000.0).normalized().is_err());
        assert!(ProjectionConfig::new(1.0, f64::INFINITY, 1.0).normalized().is_err());
    }

    #[test]
    fn test_projection_config_fields_default_independently() {
        let config: ProjectionConfig = serde_json::from_str(r#"{"rate": 10, "deadline": 300}"#).unwrap();
        assert_eq!(config.goal, 0.0);
        assert!(config.normalized().is_ok());

        let config: ProjectionConfig = serde_json::from_str(r#"{"deadline": 300, "goal": 5}"#).unwrap();
        assert!(config.rate.is_nan());
        assert!(config.normalized().is_err());

        let config: ProjectionConfig = serde_json::from_str(r#"{"rate": 10}"#).unwrap();
        assert!(config.normalized().is_err());
    }

    #[test]
    fn test_view_mode_other() {
        assert_eq!(ViewMode::Mass.other(), ViewMode::Energy);
        assert_eq!(ViewMode::Energy.channel(), ChannelName::Energy);
    }

    #[test]
    fn test_default_state_has_every_channel() {
        let state = ChartState::default();
        assert_eq!(state.channels.len(), 3);
        assert_eq!(state.displayed_channels().count(), 0);
    }
}
