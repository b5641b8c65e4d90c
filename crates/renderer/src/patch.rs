//! Incremental changes between what the engine shows and what it should show

use eco_chart_shared::{ChannelName, ChartState};
use std::collections::BTreeMap;

/// One series as the engine currently draws it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSeries {
    pub data: Vec<f64>,
    /// Line (and area) opacity, 0 when hidden
    pub opacity: f64,
    pub goal_marker: Option<f64>,
}

impl Default for RenderedSeries {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            opacity: 1.0,
            goal_marker: None,
        }
    }
}

/// The data-bearing part of the engine option
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub x_axis: Vec<f64>,
    pub series: BTreeMap<ChannelName, RenderedSeries>,
    pub title: String,
    pub y_axis_max: Option<f64>,
}

impl RenderedFrame {
    /// Frame matching a freshly installed base option
    pub fn blank(title: impl Into<String>) -> Self {
        Self {
            x_axis: Vec::new(),
            series: ChannelName::ALL
                .iter()
                .map(|&name| (name, RenderedSeries::default()))
                .collect(),
            title: title.into(),
            y_axis_max: None,
        }
    }

    /// Project chart state onto what should be drawn.
    ///
    /// Hidden channels keep their entry with no data and zero opacity.
    pub fn from_state(state: &ChartState, title: impl Into<String>) -> Self {
        let active = state
            .projection
            .as_ref()
            .map(|summary| (summary.active.channel, summary.active.goal));

        let series = ChannelName::ALL
            .iter()
            .map(|&name| {
                let rendered = match state.channel(name) {
                    Some(channel) if channel.visible => RenderedSeries {
                        data: channel.series.values(),
                        opacity: 1.0,
                        // A goal of 0 means no target
                        goal_marker: active
                            .filter(|&(channel, goal)| channel == name && goal > 0.0)
                            .map(|(_, goal)| goal),
                    },
                    _ => RenderedSeries {
                        data: Vec::new(),
                        opacity: 0.0,
                        goal_marker: None,
                    },
                };
                (name, rendered)
            })
            .collect();

        Self {
            x_axis: state.time_axis.clone(),
            series,
            title: title.into(),
            y_axis_max: state.projection.as_ref().map(|p| p.y_axis_max),
        }
    }
}

/// Changes to one series; `None` fields are untouched
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPatch {
    pub channel: ChannelName,
    pub data: Option<Vec<f64>>,
    pub opacity: Option<f64>,
    pub goal_marker: Option<Option<f64>>,
}

impl SeriesPatch {
    fn between(channel: ChannelName, prev: &RenderedSeries, next: &RenderedSeries) -> Option<Self> {
        let patch = Self {
            channel,
            data: (prev.data != next.data).then(|| next.data.clone()),
            opacity: (prev.opacity != next.opacity).then_some(next.opacity),
            goal_marker: (prev.goal_marker != next.goal_marker).then_some(next.goal_marker),
        };

        let changed = patch.data.is_some() || patch.opacity.is_some() || patch.goal_marker.is_some();
        changed.then_some(patch)
    }
}

/// Minimal update turning one frame into another
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartPatch {
    pub x_axis: Option<Vec<f64>>,
    pub series: Vec<SeriesPatch>,
    pub title: Option<String>,
    /// `Some(None)` clears a previously set bound
    pub y_axis_max: Option<Option<f64>>,
}

impl ChartPatch {
    pub fn between(prev: &RenderedFrame, next: &RenderedFrame) -> Self {
        let empty = RenderedSeries::default();

        let series = ChannelName::ALL
            .iter()
            .filter_map(|name| {
                let before = prev.series.get(name).unwrap_or(&empty);
                let after = next.series.get(name).unwrap_or(&empty);
                SeriesPatch::between(*name, before, after)
            })
            .collect();

        Self {
            x_axis: (prev.x_axis != next.x_axis).then(|| next.x_axis.clone()),
            series,
            title: (prev.title != next.title).then(|| next.title.clone()),
            y_axis_max: (prev.y_axis_max != next.y_axis_max).then_some(next.y_axis_max),
        }
    }

    /// Every field of `frame`, for when the engine's state is unknown
    pub fn full(frame: &RenderedFrame) -> Self {
        Self {
            x_axis: Some(frame.x_axis.clone()),
            series: ChannelName::ALL
                .iter()
                .map(|&channel| {
                    let series = frame.series.get(&channel).cloned().unwrap_or_default();
                    SeriesPatch {
                        channel,
                        data: Some(series.data),
                        opacity: Some(series.opacity),
                        goal_marker: Some(series.goal_marker),
                    }
                })
                .collect(),
            title: Some(frame.title.clone()),
            y_axis_max: Some(frame.y_axis_max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x_axis.is_none()
            && self.series.is_empty()
            && self.title.is_none()
            && self.y_axis_max.is_none()
    }

    pub fn series_patch(&self, channel: ChannelName) -> Option<&SeriesPatch> {
        self.series.iter().find(|s| s.channel == channel)
    }
}
