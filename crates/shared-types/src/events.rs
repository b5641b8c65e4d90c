//! Host update events
//!
//! Both transports (dataset snapshot and pushed message) decode into
//! [`HostUpdate`] so the widget has a single dispatch path.

use crate::{ChannelName, ProjectionConfig, UpdateContract, ViewMode};
use std::collections::BTreeMap;

/// Event carrying a full update on the message path
pub const UPDATE_EVENT: &str = "eco-chart:update";

/// Event carrying only visibility flags on the message path
pub const VISIBILITY_EVENT: &str = "eco-chart:visibility";

/// Values and visibility for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelUpdate {
    pub values: Vec<f64>,
    pub visible: bool,
}

impl Default for ChannelUpdate {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            visible: true,
        }
    }
}

/// Explicit time axis plus values per channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesUpdate {
    pub time: Vec<f64>,
    pub channels: BTreeMap<ChannelName, ChannelUpdate>,
}

impl SeriesUpdate {
    pub fn new(time: Vec<f64>) -> Self {
        Self {
            time,
            channels: BTreeMap::new(),
        }
    }

    pub fn with_channel(mut self, name: ChannelName, values: Vec<f64>, visible: bool) -> Self {
        self.channels.insert(name, ChannelUpdate { values, visible });
        self
    }
}

/// Summary parameters per metric plus the foreground selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionUpdate {
    pub mass: Option<ProjectionConfig>,
    pub energy: Option<ProjectionConfig>,
    pub view: ViewMode,
}

impl ProjectionUpdate {
    pub fn config_for(&self, view: ViewMode) -> Option<&ProjectionConfig> {
        match view {
            ViewMode::Mass => self.mass.as_ref(),
            ViewMode::Energy => self.energy.as_ref(),
        }
    }
}

/// Every shape of update the widget accepts
#[derive(Debug, Clone, PartialEq)]
pub enum HostUpdate {
    Series(SeriesUpdate),
    Projection(ProjectionUpdate),
    /// Flags only; channels not listed keep their current visibility
    Visibility(BTreeMap<ChannelName, bool>),
}

impl HostUpdate {
    /// Contract this update belongs to. Visibility toggles belong to timelines.
    pub fn contract(&self) -> UpdateContract {
        match self {
            HostUpdate::Series(_) | HostUpdate::Visibility(_) => UpdateContract::Timeline,
            HostUpdate::Projection(_) => UpdateContract::Projection,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HostUpdate::Series(_) => "series",
            HostUpdate::Projection(_) => "projection",
            HostUpdate::Visibility(_) => "visibility",
        }
    }
}
