//! Widget integration
//!
//! Ties the lifecycle of the external chart engine to the reconciliation of
//! host updates, behind a host abstraction for timers and window events.

pub mod host;
pub mod lifecycle;
pub mod reconciler;
pub mod widget;

use eco_chart_config::ConfigError;
use eco_chart_shared::EcoChartError;
use thiserror::Error;

pub use host::{Dimensions, ListenerId, ManualHost, Schedule, TimerId, TimerTask, WidgetHost};
pub use lifecycle::{LifecycleManager, LifecyclePhase, LifecycleStats};
pub use reconciler::{ReconcilerState, SyncReconciler};
pub use widget::{EcoChartWidget, WidgetStats};

/// Integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Shared error: {0}")]
    Shared(#[from] EcoChartError),
}

pub type Result<T> = std::result::Result<T, IntegrationError>;
