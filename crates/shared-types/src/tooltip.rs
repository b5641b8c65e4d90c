//! Tooltip content for the hovered time index

use serde::{Deserialize, Serialize};

/// One visible series in the tooltip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TooltipRow {
    pub series_name: String,
    /// CSS colour of the series marker
    pub color: String,
    /// Value rounded to the nearest integer
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TooltipContent {
    /// Hovered time, already formatted
    pub time_label: String,
    pub rows: Vec<TooltipRow>,
}

impl TooltipContent {
    pub fn row(&self, series_name: &str) -> Option<&TooltipRow> {
        self.rows.iter().find(|r| r.series_name == series_name)
    }

    /// HTML in the engine's tooltip style
    pub fn to_html(&self) -> String {
        let mut html = format!("<strong>Time: {}</strong><br/>", self.time_label);
        for row in &self.rows {
            html.push_str(&format!(
                "<span style=\"display:inline-block;margin-right:4px;border-radius:10px;width:10px;height:10px;background-color:{};\"></span> {}: {}<br/>",
                row.color, row.series_name, row.value
            ));
        }
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_lists_rows_in_order() {
        let content = TooltipContent {
            time_label: "1:30".to_string(),
            rows: vec![
                TooltipRow {
                    series_name: "Mass".to_string(),
                    color: "#10b981".to_string(),
                    value: 150,
                },
                TooltipRow {
                    series_name: "Build Power".to_string(),
                    color: "#3b82f6".to_string(),
                    value: 15,
                },
            ],
        };

        let html = content.to_html();
        assert!(html.starts_with("<strong>Time: 1:30</strong><br/>"));
        let mass = html.find("Mass: 150").unwrap();
        let build = html.find("Build Power: 15").unwrap();
        assert!(mass < build);
        assert!(content.row("Energy").is_none());
    }
}
