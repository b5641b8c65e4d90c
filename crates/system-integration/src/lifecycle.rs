//! Deferred engine creation, resize handling and teardown

use crate::host::{ListenerId, Schedule, TimerId, TimerTask, WidgetHost};
use eco_chart_config::{LifecycleConfig, RendererKind};
use eco_chart_renderer::{ChartEngine, RenderPipeline};

/// Lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum LifecyclePhase {
    /// Not mounted yet, or released for a fresh mount
    Unmounted,
    /// Waiting for a frame or for the container to get a size
    Pending,
    Ready,
    /// The last init attempt failed; the next update re-arms it
    Failed,
    TornDown,
}

/// Lifecycle statistics
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct LifecycleStats {
    pub init_attempts: u64,
    pub retries: u64,
    pub failures: u64,
    pub resizes: u64,
    pub disposals: u64,
}

/// Owns the engine handle and every timer and listener registered for it.
///
/// The handle only exists in `Ready`; it is released exactly once, either
/// by teardown or by reinitialization.
pub struct LifecycleManager<E: ChartEngine, H: WidgetHost> {
    engine: E,
    host: H,
    config: LifecycleConfig,
    renderer: RendererKind,
    phase: LifecyclePhase,
    handle: Option<E::Handle>,
    init_timer: Option<TimerId>,
    resize_timer: Option<TimerId>,
    resize_listener: Option<ListenerId>,
    stats: LifecycleStats,
}

impl<E: ChartEngine, H: WidgetHost> LifecycleManager<E, H> {
    pub fn new(engine: E, host: H, config: LifecycleConfig, renderer: RendererKind) -> Self {
        Self {
            engine,
            host,
            config,
            renderer,
            phase: LifecyclePhase::Unmounted,
            handle: None,
            init_timer: None,
            resize_timer: None,
            resize_listener: None,
            stats: LifecycleStats::default(),
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == LifecyclePhase::Ready
    }

    pub fn stats(&self) -> &LifecycleStats {
        &self.stats
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Schedule initialization for the next frame, never synchronously
    pub fn mount(&mut self) {
        match self.phase {
            LifecyclePhase::Unmounted | LifecyclePhase::Failed => {
                let id = self.host.schedule(TimerTask::Initialize, Schedule::NextFrame);
                self.init_timer = Some(id);
                self.phase = LifecyclePhase::Pending;
                log::debug!("Initialization scheduled for next frame");
            }
            phase => log::debug!("Mount ignored in phase {:?}", phase),
        }
    }

    /// Re-arm initialization after a failed attempt
    pub fn retry_after_failure(&mut self) -> bool {
        if self.phase != LifecyclePhase::Failed {
            return false;
        }
        log::info!("Retrying chart initialization");
        self.mount();
        true
    }

    /// Run a timer the host delivered. Returns true when the engine just
    /// became ready.
    pub fn on_timer(&mut self, task: TimerTask, pipeline: &RenderPipeline) -> bool {
        match task {
            TimerTask::Initialize => {
                self.init_timer = None;
                self.try_initialize(pipeline)
            }
            TimerTask::SettleResize => {
                self.resize_timer = None;
                self.resize();
                false
            }
        }
    }

    pub fn on_window_resize(&mut self) {
        self.resize();
    }

    fn try_initialize(&mut self, pipeline: &RenderPipeline) -> bool {
        if self.phase != LifecyclePhase::Pending {
            log::debug!("Stale initialization timer in phase {:?}", self.phase);
            return false;
        }

        let dimensions = self.host.container_dimensions();
        if dimensions.is_empty() {
            self.stats.retries += 1;
            log::debug!(
                "Container has no size ({}x{}), retrying in {}ms",
                dimensions.width,
                dimensions.height,
                self.config.retry_delay_ms
            );
            let id = self
                .host
                .schedule(TimerTask::Initialize, Schedule::After(self.config.retry_delay()));
            self.init_timer = Some(id);
            return false;
        }

        self.stats.init_attempts += 1;
        let handle = match self.engine.init(self.renderer) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("Chart engine initialization failed: {}", e);
                self.stats.failures += 1;
                self.phase = LifecyclePhase::Failed;
                return false;
            }
        };

        if let Err(e) = pipeline.install(&mut self.engine, &handle) {
            log::warn!("Installing the base chart option failed: {}", e);
            self.engine.dispose(handle);
            self.stats.disposals += 1;
            self.stats.failures += 1;
            self.phase = LifecyclePhase::Failed;
            return false;
        }

        self.handle = Some(handle);
        self.resize_listener = Some(self.host.add_resize_listener());
        self.resize_timer = Some(self.host.schedule(
            TimerTask::SettleResize,
            Schedule::After(self.config.post_init_resize_delay()),
        ));
        self.phase = LifecyclePhase::Ready;
        log::info!(
            "Chart initialized ({} renderer, {}x{})",
            self.renderer.as_str(),
            dimensions.width,
            dimensions.height
        );
        true
    }

    fn resize(&mut self) {
        let Some(handle) = self.handle.as_ref() else {
            return;
        };
        match self.engine.resize(handle) {
            Ok(()) => self.stats.resizes += 1,
            Err(e) => log::warn!("Chart resize failed: {}", e),
        }
    }

    /// Run `f` against the live engine; `None` when there is no handle
    pub fn with_engine<R>(&mut self, f: impl FnOnce(&mut E, &E::Handle) -> R) -> Option<R> {
        let handle = self.handle.as_ref()?;
        Some(f(&mut self.engine, handle))
    }

    /// Cancel timers, drop the listener and dispose the handle
    fn release(&mut self) {
        for id in [self.init_timer.take(), self.resize_timer.take()].into_iter().flatten() {
            self.host.cancel(id);
        }
        if let Some(id) = self.resize_listener.take() {
            self.host.remove_resize_listener(id);
        }
        if let Some(handle) = self.handle.take() {
            self.engine.dispose(handle);
            self.stats.disposals += 1;
        }
    }

    /// Dispose and mount again, for containers that need a fresh engine
    pub fn reinitialize(&mut self) {
        if self.phase == LifecyclePhase::TornDown {
            log::debug!("Reinitialize ignored after teardown");
            return;
        }
        log::info!("Reinitializing chart engine");
        self.release();
        self.phase = LifecyclePhase::Unmounted;
        self.mount();
    }

    /// Idempotent, and valid before initialization
    pub fn teardown(&mut self) {
        if self.phase == LifecyclePhase::TornDown {
            return;
        }
        self.release();
        self.phase = LifecyclePhase::TornDown;
        log::info!("Chart torn down");
    }
}

impl<E: ChartEngine, H: WidgetHost> Drop for LifecycleManager<E, H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
