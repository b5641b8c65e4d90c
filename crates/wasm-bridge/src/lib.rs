//! Browser entry point for the Eco Chart widget
//!
//! `EcoChart` is what the page's hook code holds on to. Every call is routed
//! by instance id through the [`InstanceManager`].

use eco_chart_config::{ConfigError, ConfigFormat, WidgetConfig};
use eco_chart_shared::EcoChartError;
use eco_chart_integration::EcoChartWidget;
use serde_json::Value;
use std::sync::Once;
use uuid::Uuid;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

pub mod dataset;
pub mod echarts;
pub mod host;
pub mod instance_manager;

use dataset::read_dataset;
use echarts::EchartsEngine;
use host::BrowserHost;
use instance_manager::InstanceManager;

static INIT: Once = Once::new();

/// Panic hook and console logger, once per page
fn init_logging() {
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        // Fails only if a logger is already installed
        let _ = console_log::init_with_level(log::Level::Info);
    });
}

fn to_js_error(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Structured `{type, details}` error for the page
fn config_error(error: ConfigError) -> JsValue {
    JsValue::from_str(&EcoChartError::from(error).to_json())
}

#[wasm_bindgen]
pub struct EcoChart {
    instance_id: Uuid,
    element: HtmlElement,
}

#[wasm_bindgen]
impl EcoChart {
    /// Create the widget for `element` and schedule engine initialization.
    ///
    /// `config` is an optional JSON widget configuration. With `preset` set,
    /// the named preset is the base and `config` only overrides it.
    #[wasm_bindgen(constructor)]
    pub fn new(
        element: HtmlElement,
        config: Option<String>,
        preset: Option<String>,
    ) -> Result<EcoChart, JsValue> {
        init_logging();

        let config = match (preset, config) {
            (Some(preset), overrides) => {
                WidgetConfig::from_preset(&preset, overrides.as_deref(), ConfigFormat::Json)
                    .map_err(config_error)?
            }
            (None, Some(json)) => WidgetConfig::load(&json, ConfigFormat::Json).map_err(config_error)?,
            (None, None) => WidgetConfig::default(),
        };

        let instance_id = Uuid::new_v4();
        let engine = EchartsEngine::new(element.clone(), instance_id);
        let host = BrowserHost::new(element.clone(), instance_id)?;
        let mut widget = EcoChartWidget::new(config, engine, host).map_err(to_js_error)?;

        // Cached until the engine is ready
        widget.dispatch_snapshot(&read_dataset(&element));
        widget.mount();
        InstanceManager::insert(instance_id, widget);

        log::info!(
            "EcoChart {} mounted ({} live)",
            instance_id,
            InstanceManager::instance_count()
        );
        Ok(EcoChart {
            instance_id,
            element,
        })
    }

    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.instance_id.to_string()
    }

    /// The host re-rendered the container; re-read its attributes
    pub fn updated(&self) {
        let attributes = read_dataset(&self.element);
        InstanceManager::with_widget_mut(&self.instance_id, |widget| {
            widget.dispatch_snapshot(&attributes)
        });
    }

    /// A pushed event, e.g. `eco-chart:update` or `eco-chart:visibility`
    pub fn push_event(&self, event: &str, payload: JsValue) {
        let payload: Value = serde_wasm_bindgen::from_value(payload).unwrap_or_else(|e| {
            log::warn!("Payload of '{}' is not JSON compatible: {}", event, e);
            Value::Null
        });
        InstanceManager::with_widget_mut(&self.instance_id, |widget| {
            widget.dispatch_message(event, &payload)
        });
    }

    /// Recreate the engine, e.g. after the container was re-parented
    pub fn reinitialize(&self) {
        InstanceManager::with_widget_mut(&self.instance_id, |widget| widget.reinitialize());
    }

    /// Tooltip HTML for a hovered time index
    pub fn tooltip(&self, index: usize) -> Option<String> {
        InstanceManager::with_widget(&self.instance_id, |widget| widget.tooltip_html(index)).flatten()
    }

    pub fn stats(&self) -> Result<JsValue, JsValue> {
        let stats = InstanceManager::with_widget(&self.instance_id, |widget| widget.stats())
            .ok_or_else(|| JsValue::from_str("Chart instance not found"))?;
        serde_wasm_bindgen::to_value(&stats).map_err(to_js_error)
    }

    /// Idempotent
    pub fn destroy(&self) {
        if let Some(mut widget) = InstanceManager::remove(&self.instance_id) {
            widget.teardown();
            log::info!("EcoChart {} destroyed", self.instance_id);
        }
    }
}

impl Drop for EcoChart {
    fn drop(&mut self) {
        if InstanceManager::contains(&self.instance_id) {
            self.destroy();
        }
    }
}
