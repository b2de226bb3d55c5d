//! Static PNG chart of the four memory/swap series.
//!
//! X axis is hours elapsed since the first sample, Y axis is GiB.
//! Text (caption, axis labels, legend) needs a TrueType font; when none can
//! be loaded the chart is still written with the data lines only.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use tracing::{debug, warn};

use super::{REPORT_TITLE, ReportError, SERIES_LABELS};
use crate::fmt::hours_since;
use crate::model::MemorySample;

/// Pixels per inch used to size the 8×4 inch canvas.
const CHART_DPI: u32 = 96;
const CHART_SIZE: (u32, u32) = (8 * CHART_DPI, 4 * CHART_DPI);

/// Family name the loaded font is registered under.
const FONT_FAMILY: &str = "sans-serif";

/// Fonts tried when no explicit font is given.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Series colors in [`SERIES_LABELS`] order; the HTML report uses the same.
const SERIES_COLORS: [RGBColor; 4] = [RED, GREEN, BLUE, YELLOW];

/// plotters keeps registered fonts process-wide, so the load state is too.
static FONT_CACHE: Mutex<FontCache> = Mutex::new(FontCache::new());

/// `(hours since first sample, GiB)` points for memory total, memory free,
/// swap total and swap free.
pub fn series_points(samples: &[MemorySample]) -> [Vec<(f64, f64)>; 4] {
    let mut series: [Vec<(f64, f64)>; 4] = Default::default();
    let Some(first) = samples.first() else {
        return series;
    };
    let base = first.timestamp();

    for s in samples {
        let x = hours_since(base, s.timestamp());
        series[0].push((x, s.memory_total()));
        series[1].push((x, s.memory_free()));
        series[2].push((x, s.swap_total()));
        series[3].push((x, s.swap_free()));
    }
    series
}

/// Axis upper bounds: `(hours, GiB)`. Both are at least 1 so a single
/// sample or an all-zero swap still gets a drawable range.
fn axis_bounds(series: &[Vec<(f64, f64)>; 4]) -> (f64, f64) {
    let points = series.iter().flatten();
    let x_max = points.clone().map(|p| p.0).fold(0.0, f64::max);
    let y_max = points.map(|p| p.1).fold(0.0, f64::max);
    let x_max = if x_max > 0.0 { x_max } else { 1.0 };
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };
    (x_max, y_max)
}

/// Registers the chart font, reloading only when a different font is
/// requested than on the previous call.
fn ensure_font(explicit: Option<&Path>) -> bool {
    let mut cache = FONT_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    cache.resolve(explicit, load_font)
}

/// Remembers which font was last requested and whether loading it worked.
#[derive(Debug, Default)]
struct FontCache {
    last: Option<(Option<PathBuf>, bool)>,
}

impl FontCache {
    const fn new() -> Self {
        Self { last: None }
    }

    fn resolve(
        &mut self,
        explicit: Option<&Path>,
        load: impl FnOnce(Option<&Path>) -> bool,
    ) -> bool {
        if let Some((requested, loaded)) = &self.last {
            if requested.as_deref() == explicit {
                return *loaded;
            }
        }
        let loaded = load(explicit);
        self.last = Some((explicit.map(Path::to_path_buf), loaded));
        loaded
    }
}

/// Tries `explicit` first, then the well-known system fonts.
fn load_font(explicit: Option<&Path>) -> bool {
    let candidates = explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

    for path in candidates {
        let is_explicit = explicit == Some(path.as_path());
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                if is_explicit {
                    warn!(path = %path.display(), error = %e, "cannot read chart font");
                }
                continue;
            }
        };
        // plotters keeps a 'static reference to registered font data
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                debug!(path = %path.display(), "loaded chart font");
                return true;
            }
            Err(_) => warn!(path = %path.display(), "not a usable font file"),
        }
    }

    warn!("no TrueType font found, chart is drawn without labels (see --chart-font)");
    false
}

fn chart_error(path: &Path, e: impl std::fmt::Display) -> ReportError {
    ReportError::Chart {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Renders the chart to `path` as PNG.
pub fn render_chart(
    samples: &[MemorySample],
    path: &Path,
    font: Option<&Path>,
) -> Result<(), ReportError> {
    let series = series_points(samples);
    let (x_max, y_max) = axis_bounds(&series);
    let with_text = ensure_font(font);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| chart_error(path, e))?;

    let mut builder = ChartBuilder::on(&root);
    builder.margin(12);
    if with_text {
        builder
            .caption(REPORT_TITLE, (FONT_FAMILY, 20))
            .x_label_area_size(35)
            .y_label_area_size(50);
    }
    let mut chart = builder
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(|e| chart_error(path, e))?;

    if with_text {
        chart
            .configure_mesh()
            .x_desc("Time (hours since first sample)")
            .y_desc("Size (GB)")
            .label_style((FONT_FAMILY, 12))
            .draw()
            .map_err(|e| chart_error(path, e))?;
    }

    for ((points, label), color) in series.into_iter().zip(SERIES_LABELS).zip(SERIES_COLORS) {
        let anno = chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(|e| chart_error(path, e))?;
        if with_text {
            anno.label(label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        }
    }

    if with_text {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT_FAMILY, 12))
            .draw()
            .map_err(|e| chart_error(path, e))?;
    }

    root.present().map_err(|e| chart_error(path, e))?;
    Ok(())
}
