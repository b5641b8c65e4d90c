//! Tooltip rows for a hovered time index

use crate::format::{format_time, round_for_display};
use eco_chart_config::AppearanceConfig;
use eco_chart_shared::tooltip::{TooltipContent, TooltipRow};
use eco_chart_shared::{ChannelName, ChartState};

const FALLBACK_COLOR: &str = "#666";

/// Visible channels only; hidden ones never appear even though their data is kept.
pub fn build_tooltip(
    state: &ChartState,
    appearance: &AppearanceConfig,
    index: usize,
) -> Option<TooltipContent> {
    let time = *state.time_axis.get(index)?;

    let rows = ChannelName::ALL
        .iter()
        .filter_map(|&name| {
            let channel = state.channel(name).filter(|c| c.visible)?;
            let point = channel.series.points().get(index)?;
            let color = appearance
                .style(name)
                .map_or(FALLBACK_COLOR, |style| style.color.as_str());

            Some(TooltipRow {
                series_name: name.label().to_string(),
                color: color.to_string(),
                value: round_for_display(point.value),
            })
        })
        .collect();

    Some(TooltipContent {
        time_label: format_time(time),
        rows,
    })
}
