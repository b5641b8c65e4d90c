//! Seam to the external charting engine

use eco_chart_config::RendererKind;
use eco_chart_shared::EcoChartResult;
use serde_json::Value;

/// Operations the widget needs from a charting engine.
///
/// `dispose` consumes the handle, so a handle can be released at most once
/// and never used afterwards.
pub trait ChartEngine {
    type Handle;

    /// Create an engine instance bound to the widget's container
    fn init(&mut self, renderer: RendererKind) -> EcoChartResult<Self::Handle>;

    /// Merge `option` into the current option, or replace it outright
    fn set_option(&mut self, handle: &Self::Handle, option: &Value, replace: bool)
        -> EcoChartResult<()>;

    /// Re-measure the container
    fn resize(&mut self, handle: &Self::Handle) -> EcoChartResult<()>;

    fn dispose(&mut self, handle: Self::Handle);
}
