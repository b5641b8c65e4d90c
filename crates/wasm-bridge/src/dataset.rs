//! Snapshot transport: the container's `data-*` attributes

use eco_chart_shared::payload::snapshot_keys;
use std::collections::HashMap;
use web_sys::HtmlElement;

/// Attributes the widget understands that are currently present
pub fn read_dataset(element: &HtmlElement) -> HashMap<String, String> {
    let dataset = element.dataset();
    snapshot_keys()
        .into_iter()
        .filter_map(|key| dataset.get(key).map(|value| (key.to_string(), value)))
        .collect()
}
