//! Static option installation and incremental patch encoding

use crate::engine::ChartEngine;
use crate::format::format_value;
use crate::patch::ChartPatch;
use crate::tooltip::build_tooltip;
use eco_chart_config::{AppearanceConfig, ChannelStyle};
use eco_chart_shared::tooltip::TooltipContent;
use eco_chart_shared::{ChannelName, ChartState, EcoChartResult, ProjectionSummary};
use serde_json::{json, Map, Value};

const GOAL_LABEL: &str = "Goal";

/// Owns the cosmetic option, set once, and turns patches into option fragments
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    appearance: AppearanceConfig,
}

impl RenderPipeline {
    pub fn new(appearance: AppearanceConfig) -> Self {
        Self { appearance }
    }

    pub fn appearance(&self) -> &AppearanceConfig {
        &self.appearance
    }

    /// Complete cosmetic option; applied with `replace = true` right after init.
    ///
    /// Formatter callbacks are not representable here and are attached by
    /// the engine binding.
    pub fn base_option(&self) -> Value {
        let series: Vec<Value> = ChannelName::ALL
            .iter()
            .map(|&name| match self.appearance.style(name) {
                Some(style) => Self::series_option(style),
                None => json!({ "name": name.label(), "type": "line", "data": [] }),
            })
            .collect();

        json!({
            "title": {
                "text": self.appearance.title,
                "left": "center",
                "textStyle": { "fontSize": 16, "fontWeight": "bold" }
            },
            "tooltip": {
                "trigger": "axis",
                "axisPointer": { "type": "cross" }
            },
            "legend": {
                "data": ChannelName::ALL.iter().map(|c| c.label()).collect::<Vec<_>>(),
                "bottom": 0,
                "show": false
            },
            "grid": {
                "left": "3%",
                "right": "4%",
                "bottom": "10%",
                "top": "15%",
                "containLabel": true
            },
            "xAxis": {
                "type": "category",
                "name": self.appearance.x_axis_name,
                "nameLocation": "middle",
                "nameGap": 30,
                "boundaryGap": false,
                "data": [],
                "axisLine": { "lineStyle": { "color": "#666" } }
            },
            "yAxis": {
                "type": "value",
                "name": self.appearance.y_axis_name,
                "axisLine": { "lineStyle": { "color": "#666" } },
                "splitLine": { "lineStyle": { "color": "#eee" } }
            },
            "series": series,
            "animation": false
        })
    }

    fn series_option(style: &ChannelStyle) -> Value {
        let mut line_style = json!({ "color": style.color, "width": style.width });
        if style.dashed {
            line_style["type"] = json!("dashed");
        }

        let mut series = json!({
            "name": style.channel.label(),
            "type": "line",
            "smooth": true,
            "symbol": "none",
            "data": [],
            "lineStyle": line_style,
            "itemStyle": { "color": style.color },
            "markLine": {
                "silent": true,
                "symbol": "none",
                "lineStyle": { "color": style.color, "type": "dashed" },
                "label": { "formatter": GOAL_LABEL },
                "data": []
            }
        });

        if let Some(area) = &style.area {
            series["areaStyle"] = json!({
                "color": {
                    "type": "linear",
                    "x": 0, "y": 0, "x2": 0, "y2": 1,
                    "colorStops": [
                        { "offset": 0, "color": area.top },
                        { "offset": 1, "color": area.bottom }
                    ]
                }
            });
        }

        series
    }

    fn has_area(&self, channel: ChannelName) -> bool {
        self.appearance
            .style(channel)
            .map_or(false, |style| style.area.is_some())
    }

    /// Option fragment carrying exactly the patched fields.
    ///
    /// When any series changes, every series is listed by name so the
    /// engine's positional merge stays aligned; untouched entries carry only
    /// their name.
    pub fn encode_patch(&self, patch: &ChartPatch) -> Value {
        let mut option = Map::new();

        if let Some(title) = &patch.title {
            option.insert("title".to_string(), json!({ "text": title }));
        }

        if let Some(x_axis) = &patch.x_axis {
            option.insert("xAxis".to_string(), json!({ "data": x_axis }));
        }

        if let Some(y_axis_max) = patch.y_axis_max {
            option.insert("yAxis".to_string(), json!({ "max": y_axis_max }));
        }

        if !patch.series.is_empty() {
            let series: Vec<Value> = ChannelName::ALL
                .iter()
                .map(|&name| {
                    let mut entry = json!({ "name": name.label() });
                    let Some(change) = patch.series_patch(name) else {
                        return entry;
                    };

                    if let Some(data) = &change.data {
                        entry["data"] = json!(data);
                    }
                    if let Some(opacity) = change.opacity {
                        entry["lineStyle"] = json!({ "opacity": opacity });
                        if self.has_area(name) {
                            entry["areaStyle"] = json!({ "opacity": opacity });
                        }
                    }
                    if let Some(goal) = change.goal_marker {
                        let data = match goal {
                            Some(goal) => json!([{ "yAxis": goal, "name": GOAL_LABEL }]),
                            None => json!([]),
                        };
                        entry["markLine"] = json!({ "data": data });
                    }
                    entry
                })
                .collect();
            option.insert("series".to_string(), Value::Array(series));
        }

        Value::Object(option)
    }

    /// Install the static option on a fresh engine instance
    pub fn install<E: ChartEngine>(&self, engine: &mut E, handle: &E::Handle) -> EcoChartResult<()> {
        engine.set_option(handle, &self.base_option(), true)
    }

    /// Send a patch; returns whether the engine was called at all
    pub fn apply<E: ChartEngine>(
        &self,
        engine: &mut E,
        handle: &E::Handle,
        patch: &ChartPatch,
    ) -> EcoChartResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }
        let option = self.encode_patch(patch);
        log::trace!("Patching chart option: {}", option);
        engine.set_option(handle, &option, false)?;
        Ok(true)
    }

    /// Title text for the current state.
    ///
    /// Projection views append the active metric's outcome and, when present,
    /// the inactive metric, which is never plotted.
    pub fn title_for(&self, state: &ChartState) -> String {
        match &state.projection {
            Some(summary) => projection_title(&self.appearance.title, summary),
            None => self.appearance.title.clone(),
        }
    }

    pub fn tooltip(&self, state: &ChartState, index: usize) -> Option<TooltipContent> {
        build_tooltip(state, &self.appearance, index)
    }
}

fn projection_title(base: &str, summary: &ProjectionSummary) -> String {
    let mut title = format!(
        "{} | {}: {} / {}",
        base,
        summary.active.channel.label(),
        format_value(summary.active.final_value),
        format_value(summary.active.goal)
    );
    if let Some(secondary) = &summary.secondary {
        title.push_str(&format!(
            " | {}: {} / {}",
            secondary.channel.label(),
            format_value(secondary.final_value),
            format_value(secondary.goal)
        ));
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::SeriesPatch;
    use crate::testing::MockEngine;
    use eco_chart_config::RendererKind;
    use eco_chart_shared::MetricSummary;

    fn pipeline() -> RenderPipeline {
        RenderPipeline::new(AppearanceConfig::default())
    }

    #[test]
    fn test_base_option_layout() {
        let option = pipeline().base_option();

        assert_eq!(option["title"]["text"], "Eco Over Time");
        assert_eq!(option["tooltip"]["trigger"], "axis");
        assert_eq!(option["legend"]["show"], false);
        assert_eq!(option["xAxis"]["type"], "category");
        assert_eq!(option["xAxis"]["name"], "Time (seconds)");
        assert_eq!(option["yAxis"]["name"], "Amount");
        assert_eq!(option["animation"], false);

        let series = option["series"].as_array().unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0]["name"], "Mass");
        assert_eq!(series[0]["lineStyle"]["width"], 3.0);
        assert_eq!(series[0]["areaStyle"]["color"]["type"], "linear");
        assert_eq!(series[1]["name"], "Energy");
        assert!(series[1].get("areaStyle").is_none());
        assert_eq!(series[2]["name"], "Build Power");
        assert_eq!(series[2]["lineStyle"]["type"], "dashed");
    }

    #[test]
    fn test_encode_patch_only_touches_changed_fields() {
        let patch = ChartPatch {
            series: vec![SeriesPatch {
                channel: ChannelName::Mass,
                data: Some(Vec::new()),
                opacity: Some(0.0),
                goal_marker: None,
            }],
            ..ChartPatch::default()
        };

        let option = pipeline().encode_patch(&patch);
        let object = option.as_object().unwrap();
        assert_eq!(object.len(), 1);

        let series = option["series"].as_array().unwrap();
        assert_eq!(series[0]["data"], json!([]));
        assert_eq!(series[0]["lineStyle"]["opacity"], 0.0);
        assert_eq!(series[0]["areaStyle"]["opacity"], 0.0);
        assert_eq!(series[1], json!({ "name": "Energy" }));
        assert_eq!(series[2], json!({ "name": "Build Power" }));
    }

    #[test]
    fn test_encode_goal_marker_and_bound() {
        let patch = ChartPatch {
            y_axis_max: Some(None),
            title: Some("Eco".to_string()),
            series: vec![SeriesPatch {
                channel: ChannelName::Energy,
                data: None,
                opacity: None,
                goal_marker: Some(Some(500.0)),
            }],
            ..ChartPatch::default()
        };

        let option = pipeline().encode_patch(&patch);
        assert_eq!(option["yAxis"]["max"], Value::Null);
        assert_eq!(option["title"]["text"], "Eco");
        assert_eq!(
            option["series"][1]["markLine"]["data"],
            json!([{ "yAxis": 500.0, "name": "Goal" }])
        );
        assert!(option.get("xAxis").is_none());
    }

    #[test]
    fn test_empty_patch_skips_engine() {
        let mut engine = MockEngine::new();
        let handle = engine.init(RendererKind::Svg).unwrap();
        let pipeline = pipeline();

        pipeline.install(&mut engine, &handle).unwrap();
        assert!(!pipeline.apply(&mut engine, &handle, &ChartPatch::default()).unwrap());
        assert_eq!(engine.set_option_count(), 1);
        assert!(engine.calls()[1].is_replace());
    }

    #[test]
    fn test_projection_title() {
        let mut state = ChartState::default();
        assert_eq!(pipeline().title_for(&state), "Eco Over Time");

        state.projection = Some(ProjectionSummary {
            active: MetricSummary {
                channel: ChannelName::Mass,
                final_value: 3000.0,
                goal: 1000.0,
            },
            y_axis_max: 3300.0,
            secondary: Some(MetricSummary {
                channel: ChannelName::Energy,
                final_value: 1_500_000.0,
                goal: 800.0,
            }),
        });
        assert_eq!(
            pipeline().title_for(&state),
            "Eco Over Time | Mass: 3.0k / 1.0k | Energy: 1.5M / 800"
        );
    }
}
