//! One chart widget instance: lifecycle plus reconciliation

use crate::host::{TimerTask, WidgetHost};
use crate::lifecycle::{LifecycleManager, LifecyclePhase, LifecycleStats};
use crate::reconciler::{ReconcilerState, SyncReconciler};
use crate::Result;
use eco_chart_config::{ConfigValidator, WidgetConfig};
use eco_chart_renderer::{ChartEngine, ChartPatch, RenderPipeline};
use eco_chart_shared::events::HostUpdate;
use eco_chart_shared::payload::{decode_message, decode_update, RawFields};
use eco_chart_shared::tooltip::TooltipContent;
use eco_chart_shared::{ChartState, UpdateContract};
use serde_json::Value;
use std::collections::HashMap;

/// Diagnostics snapshot
#[derive(Debug, Clone, serde::Serialize)]
pub struct WidgetStats {
    pub phase: LifecyclePhase,
    pub reconciler: ReconcilerState,
    pub contract: UpdateContract,
    pub lifecycle: LifecycleStats,
}

/// Both update transports end up in [`EcoChartWidget::dispatch`].
pub struct EcoChartWidget<E: ChartEngine, H: WidgetHost> {
    config: WidgetConfig,
    lifecycle: LifecycleManager<E, H>,
    reconciler: SyncReconciler,
}

impl<E: ChartEngine, H: WidgetHost> EcoChartWidget<E, H> {
    pub fn new(config: WidgetConfig, engine: E, host: H) -> Result<Self> {
        ConfigValidator::validate(&config)?;

        let pipeline = RenderPipeline::new(config.appearance.clone());
        let lifecycle =
            LifecycleManager::new(engine, host, config.lifecycle.clone(), config.renderer);
        let reconciler =
            SyncReconciler::new(config.contract, config.placeholder.clone(), pipeline);

        Ok(Self {
            config,
            lifecycle,
            reconciler,
        })
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn chart(&self) -> &ChartState {
        self.reconciler.chart()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.lifecycle.phase()
    }

    pub fn host(&self) -> &H {
        self.lifecycle.host()
    }

    pub fn stats(&self) -> WidgetStats {
        WidgetStats {
            phase: self.lifecycle.phase(),
            reconciler: self.reconciler.state(),
            contract: self.reconciler.contract(),
            lifecycle: self.lifecycle.stats().clone(),
        }
    }

    pub fn mount(&mut self) {
        self.lifecycle.mount();
    }

    /// Entry point for timers scheduled through the host
    pub fn on_timer(&mut self, task: TimerTask) {
        if self.lifecycle.on_timer(task, self.reconciler.pipeline()) {
            let patch = self.reconciler.mark_ready();
            self.send(patch);
        }
    }

    pub fn on_window_resize(&mut self) {
        self.lifecycle.on_window_resize();
    }

    /// Apply one update from either transport
    pub fn dispatch(&mut self, update: HostUpdate) {
        match self.lifecycle.phase() {
            LifecyclePhase::TornDown => {
                log::debug!("Dropping {} update after teardown", update.kind());
                return;
            }
            LifecyclePhase::Failed => {
                self.lifecycle.retry_after_failure();
            }
            _ => {}
        }

        let patch = self.reconciler.reconcile(update);
        self.send(patch);
    }

    /// Snapshot transport: the container's current attributes
    pub fn dispatch_snapshot(&mut self, attributes: &HashMap<String, String>) {
        let update = decode_update(&RawFields::Attributes(attributes), self.reconciler.contract());
        self.dispatch(update);
    }

    /// Message transport: a named event with a JSON payload
    pub fn dispatch_message(&mut self, event: &str, payload: &Value) {
        if let Some(update) = decode_message(event, payload, self.reconciler.contract()) {
            self.dispatch(update);
        }
    }

    fn send(&mut self, patch: Option<ChartPatch>) {
        let Some(patch) = patch else {
            return;
        };

        let pipeline = self.reconciler.pipeline();
        let result = self
            .lifecycle
            .with_engine(|engine, handle| pipeline.apply(engine, handle, &patch));

        match result {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                log::warn!("Chart update failed: {}", e);
                self.reconciler.invalidate();
            }
            None => self.reconciler.invalidate(),
        }
    }

    /// Recreate the engine; cached state is replayed once it is ready
    pub fn reinitialize(&mut self) {
        if self.lifecycle.phase() == LifecyclePhase::TornDown {
            return;
        }
        self.reconciler.mark_idle();
        self.lifecycle.reinitialize();
    }

    /// Idempotent, and valid before initialization
    pub fn teardown(&mut self) {
        self.lifecycle.teardown();
        self.reconciler.dispose();
    }

    pub fn tooltip(&self, index: usize) -> Option<TooltipContent> {
        self.reconciler
            .pipeline()
            .tooltip(self.reconciler.chart(), index)
    }

    pub fn tooltip_html(&self, index: usize) -> Option<String> {
        self.tooltip(index).map(|content| content.to_html())
    }
}
