//! ECharts bindings behind the `ChartEngine` seam

use crate::instance_manager::InstanceManager;
use eco_chart_config::RendererKind;
use eco_chart_renderer::{format_time, format_value, ChartEngine};
use eco_chart_shared::{EcoChartError, EcoChartResult};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

#[wasm_bindgen]
extern "C" {
    /// A live `echarts.init` result
    #[wasm_bindgen(js_name = ECharts)]
    pub type EChartsInstance;

    #[wasm_bindgen(catch, js_namespace = echarts, js_name = init)]
    fn echarts_init(
        element: &HtmlElement,
        theme: &JsValue,
        opts: &JsValue,
    ) -> Result<EChartsInstance, JsValue>;

    #[wasm_bindgen(catch, method, js_name = setOption)]
    fn set_option(this: &EChartsInstance, option: &JsValue, not_merge: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, method)]
    fn resize(this: &EChartsInstance) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn dispose(this: &EChartsInstance);
}

/// Callbacks the option refers to; they live as long as the engine instance
struct Formatters {
    tooltip: Closure<dyn Fn(JsValue) -> String>,
    time_label: Closure<dyn Fn(JsValue) -> String>,
    value_label: Closure<dyn Fn(f64) -> String>,
}

impl Formatters {
    fn new(instance_id: Uuid) -> Self {
        let tooltip = Closure::wrap(Box::new(move |params: JsValue| {
            let Some(index) = hovered_index(&params) else {
                return String::new();
            };
            InstanceManager::with_widget(&instance_id, |widget| widget.tooltip_html(index))
                .flatten()
                .unwrap_or_default()
        }) as Box<dyn Fn(JsValue) -> String>);

        // Category axes hand labels over as strings
        let time_label = Closure::wrap(Box::new(|value: JsValue| {
            value
                .as_f64()
                .or_else(|| value.as_string().and_then(|s| s.parse().ok()))
                .map(format_time)
                .unwrap_or_default()
        }) as Box<dyn Fn(JsValue) -> String>);

        let value_label = Closure::wrap(Box::new(format_value) as Box<dyn Fn(f64) -> String>);

        Self {
            tooltip,
            time_label,
            value_label,
        }
    }

    /// Attach to the already converted base option
    fn attach(&self, option: &JsValue) -> Result<(), JsValue> {
        set_path(option, &["tooltip", "formatter"], self.tooltip.as_ref())?;
        set_path(option, &["xAxis", "axisLabel", "formatter"], self.time_label.as_ref())?;
        set_path(option, &["yAxis", "axisLabel", "formatter"], self.value_label.as_ref())?;
        Ok(())
    }
}

/// `dataIndex` of the first entry of an axis-trigger tooltip
fn hovered_index(params: &JsValue) -> Option<usize> {
    let first = if js_sys::Array::is_array(params) {
        params.unchecked_ref::<js_sys::Array>().get(0)
    } else {
        params.clone()
    };
    js_sys::Reflect::get(&first, &JsValue::from_str("dataIndex"))
        .ok()?
        .as_f64()
        .filter(|index| *index >= 0.0)
        .map(|index| index as usize)
}

/// Set `value` at a nested key path, creating objects on the way
fn set_path(target: &JsValue, path: &[&str], value: &JsValue) -> Result<(), JsValue> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };

    let mut current = target.clone();
    for key in parents {
        let key = JsValue::from_str(key);
        let mut next = js_sys::Reflect::get(&current, &key)?;
        if !next.is_object() {
            next = js_sys::Object::new().into();
            js_sys::Reflect::set(&current, &key, &next)?;
        }
        current = next;
    }
    js_sys::Reflect::set(&current, &JsValue::from_str(last), value)?;
    Ok(())
}

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

fn to_js(option: &Value) -> EcoChartResult<JsValue> {
    option
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| EcoChartError::JsInterop {
            message: e.to_string(),
        })
}

/// `ChartEngine` backed by the page's global `echarts`
pub struct EchartsEngine {
    element: HtmlElement,
    instance_id: Uuid,
    formatters: Option<Formatters>,
}

impl EchartsEngine {
    pub fn new(element: HtmlElement, instance_id: Uuid) -> Self {
        Self {
            element,
            instance_id,
            formatters: None,
        }
    }
}

impl ChartEngine for EchartsEngine {
    type Handle = EChartsInstance;

    fn init(&mut self, renderer: RendererKind) -> EcoChartResult<EChartsInstance> {
        let opts = js_sys::Object::new();
        js_sys::Reflect::set(
            &opts,
            &JsValue::from_str("renderer"),
            &JsValue::from_str(renderer.as_str()),
        )
        .map_err(|e| EcoChartError::JsInterop {
            message: js_message(&e),
        })?;

        echarts_init(&self.element, &JsValue::NULL, &opts).map_err(|e| EcoChartError::EngineInit {
            message: js_message(&e),
        })
    }

    fn set_option(&mut self, handle: &EChartsInstance, option: &Value, replace: bool) -> EcoChartResult<()> {
        let js_option = to_js(option)?;

        if replace {
            let formatters = self
                .formatters
                .get_or_insert_with(|| Formatters::new(self.instance_id));
            formatters
                .attach(&js_option)
                .map_err(|e| EcoChartError::JsInterop {
                    message: js_message(&e),
                })?;
        }

        handle
            .set_option(&js_option, replace)
            .map_err(|e| EcoChartError::engine_call("setOption", js_message(&e)))
    }

    fn resize(&mut self, handle: &EChartsInstance) -> EcoChartResult<()> {
        handle
            .resize()
            .map_err(|e| EcoChartError::engine_call("resize", js_message(&e)))
    }

    fn dispose(&mut self, handle: EChartsInstance) {
        handle.dispose();
        self.formatters = None;
    }
}
