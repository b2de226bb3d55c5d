//! Self-contained interactive HTML report.
//!
//! The page loads Chart.js from a CDN and draws one line chart from a JSON
//! object embedded in the document. Hovering shows all four values for the
//! hovered timestamp.

use std::path::Path;

use serde::Serialize;

use super::{REPORT_TITLE, ReportError, SERIES_LABELS};
use crate::fmt::format_timestamp;
use crate::model::MemorySample;

/// CSS colors per series, same order and hues as the PNG chart.
const SERIES_COLORS: [&str; 4] = [
    "rgb(255, 0, 0)",
    "rgb(0, 255, 0)",
    "rgb(0, 0, 255)",
    "rgb(255, 255, 0)",
];

const DATA_PLACEHOLDER: &str = "__CHART_DATA__";
const TITLE_PLACEHOLDER: &str = "__TITLE__";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>__TITLE__</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; }
        .chart-container { width: 80%; margin: 0 auto; }
    </style>
</head>
<body>
    <h1>__TITLE__ (Interactive)</h1>
    <div class="chart-container">
        <canvas id="memoryChart"></canvas>
    </div>
    <script>
        const chartData = __CHART_DATA__;
        const ctx = document.getElementById('memoryChart').getContext('2d');
        new Chart(ctx, {
            type: 'line',
            data: chartData,
            options: {
                responsive: true,
                interaction: { mode: 'index', intersect: false },
                plugins: {
                    title: { display: true, text: '__TITLE__' },
                    tooltip: {
                        callbacks: {
                            label: (item) => item.dataset.label + ': ' + item.parsed.y.toFixed(2)
                        }
                    }
                },
                scales: {
                    x: { title: { display: true, text: 'Time' } },
                    y: { title: { display: true, text: 'Size (GB)' }, beginAtZero: true }
                }
            }
        });
    </script>
</body>
</html>
"#;

/// Data object handed to Chart.js.
#[derive(Debug, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: &'static str,
    pub data: Vec<f64>,
    pub border_color: &'static str,
    pub fill: bool,
    pub tension: f64,
}

/// Builds the timestamp labels and the four series.
pub fn chart_data(samples: &[MemorySample]) -> ChartData {
    let labels = samples
        .iter()
        .map(|s| format_timestamp(s.timestamp()))
        .collect();

    let columns: [fn(&MemorySample) -> f64; 4] = [
        MemorySample::memory_total,
        MemorySample::memory_free,
        MemorySample::swap_total,
        MemorySample::swap_free,
    ];

    let datasets = columns
        .into_iter()
        .zip(SERIES_LABELS)
        .zip(SERIES_COLORS)
        .map(|((column, label), color)| Dataset {
            label,
            data: samples.iter().map(column).collect(),
            border_color: color,
            fill: false,
            tension: 0.1,
        })
        .collect();

    ChartData { labels, datasets }
}

/// Renders the full HTML document.
pub fn render_html(samples: &[MemorySample]) -> Result<String, ReportError> {
    // "</" inside a <script> block would end it early.
    let json = serde_json::to_string(&chart_data(samples))?.replace("</", "<\\/");
    Ok(TEMPLATE
        .replace(TITLE_PLACEHOLDER, REPORT_TITLE)
        .replace(DATA_PLACEHOLDER, &json))
}

/// Writes the HTML report to `path`.
pub fn write_html_file(samples: &[MemorySample], path: &Path) -> Result<(), ReportError> {
    let html = render_html(samples)?;
    std::fs::write(path, html).map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;

    const LOG: &str = "\
ATOP - host  2024/01/15  10:00:00
MEM | tot 16.0G | free 4.0G |
SWP | tot 2.0G | free 2.0G |
ATOP - host  2024/01/15  10:00:10
MEM | tot 16.0G | free 3.5G |
SWP | tot 2.0G | free 1024.0M |
";

    #[test]
    fn test_chart_data_series() {
        let data = chart_data(&assemble(LOG));
        assert_eq!(data.labels, vec!["2024-01-15 10:00:00", "2024-01-15 10:00:10"]);
        assert_eq!(data.datasets.len(), 4);
        assert_eq!(data.datasets[0].label, "MEM Total (GB)");
        assert_eq!(data.datasets[0].data, vec![16.0, 16.0]);
        assert_eq!(data.datasets[1].data, vec![4.0, 3.5]);
        assert_eq!(data.datasets[2].data, vec![2.0, 2.0]);
        assert_eq!(data.datasets[3].label, "SWAP Free (GB)");
        assert_eq!(data.datasets[3].data, vec![2.0, 1.0]);
    }

    #[test]
    fn test_dataset_json_shape() {
        let data = chart_data(&assemble(LOG));
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["datasets"][0]["borderColor"], "rgb(255, 0, 0)");
        assert_eq!(value["datasets"][1]["fill"], false);
        assert_eq!(value["labels"][1], "2024-01-15 10:00:10");
    }

    #[test]
    fn test_render_html_embeds_data() {
        let html = render_html(&assemble(LOG)).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Memory/Swap Usage Over Time</title>"));
        assert!(html.contains(r#""labels":["2024-01-15 10:00:00","2024-01-15 10:00:10"]"#));
        assert!(html.contains(r#""data":[4.0,3.5]"#));
        assert!(!html.contains(DATA_PLACEHOLDER));
        assert!(!html.contains(TITLE_PLACEHOLDER));
    }

    #[test]
    fn test_write_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        write_html_file(&assemble(LOG), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("new Chart(ctx"));
    }
}
