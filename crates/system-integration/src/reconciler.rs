//! Reconciles host updates against the frame the engine currently shows

use eco_chart_config::PlaceholderPolicy;
use eco_chart_renderer::{ChartPatch, Projection, RenderPipeline, RenderedFrame};
use eco_chart_shared::events::{HostUpdate, ProjectionUpdate, SeriesUpdate};
use eco_chart_shared::{
    is_ordered_axis, ChannelName, ChartState, EcoChartError, MetricSummary, ProjectionSummary, Series, UpdateContract, ViewMode,
};
use std::collections::BTreeMap;

/// Reconciler states
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ReconcilerState {
    /// No engine yet: updates only change the cached state
    Idle,
    /// Updates become patches
    Ready,
    /// Everything is dropped
    Disposed,
}

pub struct SyncReconciler {
    contract: UpdateContract,
    placeholder: PlaceholderPolicy,
    pipeline: RenderPipeline,
    state: ReconcilerState,
    chart: ChartState,
    /// What the engine shows; `None` when unknown after a failed patch
    rendered: Option<RenderedFrame>,
}

impl SyncReconciler {
    pub fn new(contract: UpdateContract, placeholder: PlaceholderPolicy, pipeline: RenderPipeline) -> Self {
        let rendered = RenderedFrame::blank(&pipeline.appearance().title);
        Self {
            contract,
            placeholder,
            pipeline,
            state: ReconcilerState::Idle,
            chart: ChartState::default(),
            rendered: Some(rendered),
        }
    }

    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    pub fn contract(&self) -> UpdateContract {
        self.contract
    }

    pub fn chart(&self) -> &ChartState {
        &self.chart
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    /// Apply an update. In `Ready` this yields the patch to send, if any.
    pub fn reconcile(&mut self, update: HostUpdate) -> Option<ChartPatch> {
        if self.state == ReconcilerState::Disposed {
            log::debug!("Dropping {} update after disposal", update.kind());
            return None;
        }

        if update.contract() != self.contract {
            let error = EcoChartError::ContractMismatch {
                expected: format!("{:?}", self.contract),
                actual: update.kind().to_string(),
            };
            log::warn!("Dropping update: {}", error);
            return None;
        }

        match update {
            HostUpdate::Series(series) => self.apply_series(series),
            HostUpdate::Projection(projection) => self.apply_projection(projection),
            HostUpdate::Visibility(flags) => self.apply_visibility(flags),
        }

        match self.state {
            ReconcilerState::Ready => self.flush(),
            _ => {
                log::debug!("Engine not ready, update cached");
                None
            }
        }
    }

    /// The engine just received the base option; replay the cached state
    pub fn mark_ready(&mut self) -> Option<ChartPatch> {
        if self.state == ReconcilerState::Disposed {
            return None;
        }
        self.state = ReconcilerState::Ready;
        self.rendered = Some(RenderedFrame::blank(&self.pipeline.appearance().title));
        self.flush()
    }

    /// The engine went away; keep caching until the next `mark_ready`
    pub fn mark_idle(&mut self) {
        if self.state != ReconcilerState::Disposed {
            self.state = ReconcilerState::Idle;
        }
    }

    /// A patch did not reach the engine; the next flush sends everything
    pub fn invalidate(&mut self) {
        self.rendered = None;
    }

    pub fn dispose(&mut self) {
        self.state = ReconcilerState::Disposed;
    }

    fn flush(&mut self) -> Option<ChartPatch> {
        let next = RenderedFrame::from_state(&self.chart, self.pipeline.title_for(&self.chart));
        let patch = match &self.rendered {
            Some(prev) => ChartPatch::between(prev, &next),
            None => ChartPatch::full(&next),
        };
        self.rendered = Some(next);
        (!patch.is_empty()).then_some(patch)
    }

    fn apply_series(&mut self, update: SeriesUpdate) {
        let SeriesUpdate { time, channels } = update;
        let requested = |name: ChannelName| channels.get(&name).map_or(true, |c| c.visible);

        self.chart.projection = None;
        self.chart.active_view = None;

        if time.is_empty() {
            if self.placeholder.enabled {
                log::info!("No time axis yet, showing placeholder data");
                self.chart.time_axis = self.placeholder.time.clone();
            } else {
                self.chart.time_axis.clear();
            }
            for name in ChannelName::ALL {
                let values: &[f64] = if self.placeholder.enabled {
                    self.placeholder.values_for(name)
                } else {
                    &[]
                };
                let series = Series::from_axis(&self.chart.time_axis, values).unwrap_or_default();
                let visible = requested(name);
                let channel = self.chart.channel_mut(name);
                channel.series = series;
                channel.visible = visible;
            }
            return;
        }

        let ordered = is_ordered_axis(&time);
        if !ordered {
            log::warn!("Time axis is out of order, hiding every channel that has data");
        }

        for name in ChannelName::ALL {
            let update = channels.get(&name).cloned().unwrap_or_default();
            let channel = self.chart.channel_mut(name);

            if update.values.is_empty() {
                channel.series = Series::default();
                channel.visible = update.visible;
                continue;
            }

            match Series::from_axis(&time, &update.values) {
                Some(series) => {
                    channel.series = series;
                    channel.visible = update.visible;
                }
                None if !ordered => {
                    channel.series = Series::default();
                    channel.visible = false;
                }
                None => {
                    log::warn!(
                        "{} has {} values for {} time points, hiding it",
                        name,
                        update.values.len(),
                        time.len()
                    );
                    channel.series = Series::default();
                    channel.visible = false;
                }
            }
        }
        self.chart.time_axis = time;
    }

    fn apply_projection(&mut self, update: ProjectionUpdate) {
        let view = update.view;
        let active = update.config_for(view).and_then(|config| {
            Projection::compute(config)
                .map_err(|e| log::warn!("Ignoring {} projection: {}", view.channel(), e))
                .ok()
        });
        let secondary = update.config_for(view.other()).and_then(|config| {
            Projection::compute(config)
                .map_err(|e| log::warn!("Ignoring {} projection: {}", view.other().channel(), e))
                .ok()
                .map(|projection| MetricSummary {
                    channel: view.other().channel(),
                    final_value: projection.final_value,
                    goal: projection.goal,
                })
        });

        for name in ChannelName::ALL {
            let channel = self.chart.channel_mut(name);
            channel.series = Series::default();
            channel.visible = false;
        }
        self.chart.active_view = Some(view);

        let Some(projection) = active else {
            log::debug!("No {} projection to plot", view.channel());
            self.chart.time_axis.clear();
            self.chart.projection = None;
            return;
        };

        self.chart.time_axis = projection.series.times();
        let channel = self.chart.channel_mut(view.channel());
        channel.series = projection.series.clone();
        channel.visible = true;

        self.chart.projection = Some(ProjectionSummary {
            active: MetricSummary {
                channel: view.channel(),
                final_value: projection.final_value,
                goal: projection.goal,
            },
            y_axis_max: projection.y_axis_max,
            secondary,
        });
    }

    fn apply_visibility(&mut self, flags: BTreeMap<ChannelName, bool>) {
        for (name, visible) in flags {
            self.chart.channel_mut(name).visible = visible;
        }
    }

    pub fn active_view(&self) -> Option<ViewMode> {
        self.chart.active_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_chart_config::AppearanceConfig;
    use eco_chart_shared::ProjectionConfig;

    fn reconciler(contract: UpdateContract) -> SyncReconciler {
        SyncReconciler::new(
            contract,
            PlaceholderPolicy::default(),
            RenderPipeline::new(AppearanceConfig::default()),
        )
    }

    fn series_update() -> HostUpdate {
        HostUpdate::Series(
            SeriesUpdate::new(vec![0.0, 60.0, 120.0])
                .with_channel(ChannelName::Mass, vec![1.0, 2.0, 3.0], true)
                .with_channel(ChannelName::Energy, vec![10.0, 20.0, 30.0], true)
                .with_channel(ChannelName::BuildPower, vec![5.0, 5.0, 5.0], true),
        )
    }

    #[test]
    fn test_idle_caches_then_flushes_on_ready() {
        let mut reconciler = reconciler(UpdateContract::Timeline);
        assert!(reconciler.reconcile(series_update()).is_none());
        assert_eq!(reconciler.chart().time_axis, vec![0.0, 60.0, 120.0]);

        let patch = reconciler.mark_ready().unwrap();
        assert_eq!(patch.x_axis, Some(vec![0.0, 60.0, 120.0]));
        assert_eq!(patch.series.len(), 3);

        // Same update again changes nothing
        assert!(reconciler.reconcile(series_update()).is_none());
    }

    #[test]
    fn test_disposed_drops_everything() {
        let mut reconciler = reconciler(UpdateContract::Timeline);
        reconciler.dispose();
        assert!(reconciler.reconcile(series_update()).is_none());
        assert!(reconciler.mark_ready().is_none());
        assert_eq!(reconciler.state(), ReconcilerState::Disposed);
        assert!(reconciler.chart().time_axis.is_empty());
    }

    #[test]
    fn test_other_contract_is_dropped() {
        let mut reconciler = reconciler(UpdateContract::Projection);
        reconciler.mark_ready();
        assert!(reconciler.reconcile(series_update()).is_none());
        assert!(reconciler.chart().time_axis.is_empty());
    }

    #[test]
    fn test_visibility_toggle_is_idempotent() {
        let mut reconciler = reconciler(UpdateContract::Timeline);
        reconciler.mark_ready();
        reconciler.reconcile(series_update());

        let hide = HostUpdate::Visibility(BTreeMap::from([(ChannelName::Energy, false)]));
        let patch = reconciler.reconcile(hide.clone()).unwrap();
        assert_eq!(patch.series.len(), 1);
        assert!(patch.x_axis.is_none());
        assert!(reconciler.reconcile(hide).is_none());

        // Data is kept while hidden
        let energy = reconciler.chart().channel(ChannelName::Energy).unwrap();
        assert_eq!(energy.series.values(), vec![10.0, 20.0, 30.0]);

        let show = HostUpdate::Visibility(BTreeMap::from([(ChannelName::Energy, true)]));
        let patch = reconciler.reconcile(show).unwrap();
        let energy = patch.series_patch(ChannelName::Energy).unwrap();
        assert_eq!(energy.data, Some(vec![10.0, 20.0, 30.0]));
        assert_eq!(energy.opacity, Some(1.0));
    }

    #[test]
    fn test_empty_time_axis_uses_placeholder() {
        let mut reconciler = reconciler(UpdateContract::Timeline);
        reconciler.mark_ready();
        let update = HostUpdate::Series(
            SeriesUpdate::new(Vec::new()).with_channel(ChannelName::BuildPower, Vec::new(), false),
        );
        let patch = reconciler.reconcile(update).unwrap();

        assert_eq!(patch.x_axis, Some(vec![1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(
            patch.series_patch(ChannelName::Mass).unwrap().data,
            Some(vec![100.0, 150.0, 200.0, 250.0, 300.0])
        );
        assert_eq!(
            patch.series_patch(ChannelName::Energy).unwrap().data,
            Some(vec![1000.0, 1100.0, 1200.0, 1300.0, 1400.0])
        );
        assert_eq!(patch.series_patch(ChannelName::BuildPower).unwrap().opacity, Some(0.0));
    }

    #[test]
    fn test_disabled_placeholder_clears_chart() {
        let mut reconciler = SyncReconciler::new(
            UpdateContract::Timeline,
            PlaceholderPolicy::disabled(),
            RenderPipeline::new(AppearanceConfig::default()),
        );
        reconciler.mark_ready();
        reconciler.reconcile(series_update());

        let patch = reconciler
            .reconcile(HostUpdate::Series(SeriesUpdate::default()))
            .unwrap();
        assert_eq!(patch.x_axis, Some(Vec::new()));
        assert!(reconciler.chart().displayed_channels().next().is_none());
    }

    #[test]
    fn test_length_mismatch_hides_only_that_channel() {
        let mut reconciler = reconciler(UpdateContract::Timeline);
        let update = HostUpdate::Series(
            SeriesUpdate::new(vec![0.0, 60.0])
                .with_channel(ChannelName::Mass, vec![1.0, 2.0], true)
                .with_channel(ChannelName::Energy, vec![10.0], true),
        );
        reconciler.reconcile(update);

        let chart = reconciler.chart();
        assert!(chart.channel(ChannelName::Mass).unwrap().visible);
        let energy = chart.channel(ChannelName::Energy).unwrap();
        assert!(!energy.visible);
        assert!(energy.series.is_empty());
        let build_power = chart.channel(ChannelName::BuildPower).unwrap();
        assert!(build_power.visible);
        assert!(build_power.series.is_empty());
    }

    #[test]
    fn test_out_of_order_time_axis_hides_channels_with_data() {
        let mut reconciler = reconciler(UpdateContract::Timeline);
        let update = HostUpdate::Series(
            SeriesUpdate::new(vec![0.0, 120.0, 60.0])
                .with_channel(ChannelName::Mass, vec![1.0, 2.0, 3.0], true),
        );
        reconciler.reconcile(update);

        let chart = reconciler.chart();
        let mass = chart.channel(ChannelName::Mass).unwrap();
        assert!(!mass.visible);
        assert!(mass.series.is_empty());
        assert!(chart.displayed_channels().next().is_none());
    }

    #[test]
    fn test_projection_without_goal_has_no_marker() {
        let mut reconciler = reconciler(UpdateContract::Projection);
        reconciler.mark_ready();
        let update = HostUpdate::Projection(ProjectionUpdate {
            mass: serde_json::from_str(r#"{"rate": 10, "deadline": 300}"#).ok(),
            energy: None,
            view: ViewMode::Mass,
        });
        let patch = reconciler.reconcile(update).unwrap();

        let mass = patch.series_patch(ChannelName::Mass).unwrap();
        assert_eq!(mass.data.as_ref().and_then(|d| d.last().copied()), Some(3000.0));
        assert_eq!(mass.goal_marker.flatten(), None);
        assert_eq!(patch.y_axis_max, Some(Some(3300.0)));
        assert_eq!(reconciler.chart().projection.as_ref().unwrap().active.goal, 0.0);
    }

    #[test]
    fn test_projection_update() {
        let mut reconciler = reconciler(UpdateContract::Projection);
        reconciler.mark_ready();
        let update = HostUpdate::Projection(ProjectionUpdate {
            mass: Some(ProjectionConfig::new(10.0, 300.0, 1000.0)),
            energy: Some(ProjectionConfig::new(2.0, 600.0, 2000.0)),
            view: ViewMode::Mass,
        });

        let patch = reconciler.reconcile(update).unwrap();
        assert_eq!(patch.y_axis_max, Some(Some(3300.0)));
        assert_eq!(
            patch.title.as_deref(),
            Some("Eco Over Time | Mass: 3.0k / 1.0k | Energy: 1.2k / 2.0k")
        );
        let mass = patch.series_patch(ChannelName::Mass).unwrap();
        assert_eq!(mass.goal_marker, Some(Some(1000.0)));
        assert_eq!(mass.data.as_ref().and_then(|d| d.last()), Some(&3000.0));
        assert!(patch.series_patch(ChannelName::Energy).unwrap().data.is_none());
        assert_eq!(reconciler.active_view(), Some(ViewMode::Mass));

        // Switching the view swaps which metric is plotted
        let update = HostUpdate::Projection(ProjectionUpdate {
            mass: Some(ProjectionConfig::new(10.0, 300.0, 1000.0)),
            energy: Some(ProjectionConfig::new(2.0, 600.0, 2000.0)),
            view: ViewMode::Energy,
        });
        let patch = reconciler.reconcile(update).unwrap();
        assert_eq!(patch.y_axis_max, Some(Some(2200.0)));
        assert_eq!(patch.series_patch(ChannelName::Mass).unwrap().opacity, Some(0.0));
        assert_eq!(
            patch.series_patch(ChannelName::Energy).unwrap().goal_marker,
            Some(Some(2000.0))
        );
    }

    #[test]
    fn test_invalid_active_projection_plots_nothing() {
        let mut reconciler = reconciler(UpdateContract::Projection);
        reconciler.mark_ready();
        let update = HostUpdate::Projection(ProjectionUpdate {
            mass: Some(ProjectionConfig::new(10.0, 0.0, 1000.0)),
            energy: None,
            view: ViewMode::Mass,
        });
        reconciler.reconcile(update);

        assert!(reconciler.chart().projection.is_none());
        assert!(reconciler.chart().time_axis.is_empty());
    }

    #[test]
    fn test_invalidate_resends_everything() {
        let mut reconciler = reconciler(UpdateContract::Timeline);
        reconciler.mark_ready();
        reconciler.reconcile(series_update());
        reconciler.invalidate();

        let patch = reconciler.reconcile(series_update()).unwrap();
        assert!(patch.title.is_some());
        assert!(patch.y_axis_max.is_some());
        assert_eq!(patch.series.len(), 3);
    }
}
