//! Visualization: render bucket sequences and comparison series to **SVG** or **PNG**.
//!
//! - Bar, line and area charts over ordered buckets (`ChartKind`)
//! - Two-series line chart for current vs previous weekly counts
//! - Locale-aware tick labels (`30,000` vs `30.000`)
//! - Output format picked from the file extension (`.svg`, anything else -> PNG)

pub mod types;
pub mod util;

pub use types::ChartKind;

use crate::models::Bucket;
use anyhow::{Result, anyhow, bail};
use num_format::{Locale, ToFormattedString};

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::{AreaSeries, LineSeries};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;

use util::{ensure_fonts_registered, left_label_area_px, map_locale, office_color};

const FONT: &str = "sans-serif";

/// Render `buckets` as one chart.
pub fn plot_buckets<P: AsRef<Path>>(
    buckets: &[Bucket],
    out_path: P,
    width: u32,
    height: u32,
    title: &str,
    kind: ChartKind,
    locale_tag: &str,
) -> Result<()> {
    if buckets.is_empty() {
        bail!("no data to plot");
    }
    let series = [Series {
        label: title,
        buckets,
    }];
    render(out_path.as_ref(), width, height, title, kind, locale_tag, &series)
}

/// Render the current and previous weekly series as two lines over week position.
pub fn plot_comparison<P: AsRef<Path>>(
    current: &[Bucket],
    previous: &[Bucket],
    out_path: P,
    width: u32,
    height: u32,
    locale_tag: &str,
) -> Result<()> {
    if current.is_empty() && previous.is_empty() {
        bail!("no data to plot");
    }
    let series = [
        Series {
            label: "Current",
            buckets: current,
        },
        Series {
            label: "Previous",
            buckets: previous,
        },
    ];
    render(
        out_path.as_ref(),
        width,
        height,
        "Current vs previous (weekly)",
        ChartKind::Line,
        locale_tag,
        &series,
    )
}

struct Series<'a> {
    label: &'a str,
    buckets: &'a [Bucket],
}

fn render(
    out_path: &Path,
    width: u32,
    height: u32,
    title: &str,
    kind: ChartKind,
    locale_tag: &str,
    series: &[Series<'_>],
) -> Result<()> {
    ensure_fonts_registered();
    let locale = map_locale(locale_tag);
    let path_string = out_path.to_string_lossy().into_owned();

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw(root, title, kind, locale, series)
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw(root, title, kind, locale, series)
    }
}

/// Helper that draws to any Plotters backend.
fn draw<DB>(
    root: DrawingArea<DB, Shift>,
    title: &str,
    kind: ChartKind,
    locale: &Locale,
    series: &[Series<'_>],
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let y_max = series
        .iter()
        .flat_map(|s| s.buckets.iter().map(|b| b.count))
        .max()
        .unwrap_or(0)
        .max(1) as u32;
    // headroom above the tallest bar
    let y_top = y_max + y_max / 10 + 1;
    let n = series.iter().map(|s| s.buckets.len()).max().unwrap_or(0).max(1);
    let keys: Vec<&str> = series
        .iter()
        .max_by_key(|s| s.buckets.len())
        .map(|s| s.buckets.iter().map(|b| b.key.as_str()).collect())
        .unwrap_or_default();

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(20)
        .caption(title, (FONT, 24))
        .set_label_area_size(
            LabelAreaPosition::Left,
            left_label_area_px(&y_top.to_formatted_string(locale), 14) as i32,
        )
        .set_label_area_size(LabelAreaPosition::Bottom, 44);

    let y_fmt = |v: &u32| v.to_formatted_string(locale);

    match kind {
        ChartKind::Bar => {
            let mut chart = builder
                .build_cartesian_2d((0..n as i32).into_segmented(), 0u32..y_top)
                .map_err(|e| anyhow!("{:?}", e))?;
            let x_fmt = |v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(i) => {
                    keys.get(*i as usize).map(|k| k.to_string()).unwrap_or_default()
                }
                _ => String::new(),
            };
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(n.min(24))
                .y_labels(10)
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .label_style((FONT, 14))
                .draw()
                .map_err(|e| anyhow!("{:?}", e))?;
            for (idx, s) in series.iter().enumerate() {
                let color = office_color(idx);
                chart
                    .draw_series(s.buckets.iter().enumerate().map(|(i, b)| {
                        let x0 = SegmentValue::Exact(i as i32);
                        let x1 = SegmentValue::Exact(i as i32 + 1);
                        let mut bar = Rectangle::new([(x0, 0), (x1, b.count as u32)], color.filled());
                        bar.set_margin(0, 0, 4, 4);
                        bar
                    }))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
        }
        ChartKind::Line | ChartKind::Area => {
            let x_last = (n as i32 - 1).max(1);
            let mut chart = builder
                .build_cartesian_2d(0..x_last, 0u32..y_top)
                .map_err(|e| anyhow!("{:?}", e))?;
            let x_fmt = |i: &i32| keys.get(*i as usize).map(|k| k.to_string()).unwrap_or_default();
            chart
                .configure_mesh()
                .x_labels(n.min(12))
                .y_labels(10)
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .label_style((FONT, 14))
                .draw()
                .map_err(|e| anyhow!("{:?}", e))?;
            for (idx, s) in series.iter().enumerate() {
                let color = office_color(idx);
                let points: Vec<(i32, u32)> = s
                    .buckets
                    .iter()
                    .enumerate()
                    .map(|(i, b)| (i as i32, b.count as u32))
                    .collect();
                let drawn = if kind == ChartKind::Area {
                    chart
                        .draw_series(
                            AreaSeries::new(points, 0u32, color.mix(0.3)).border_style(color.stroke_width(2)),
                        )
                        .map_err(|e| anyhow!("{:?}", e))?
                } else {
                    chart
                        .draw_series(LineSeries::new(points, color.stroke_width(2)))
                        .map_err(|e| anyhow!("{:?}", e))?
                };
                drawn
                    .label(s.label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], color));
            }
            if series.len() > 1 {
                chart
                    .configure_series_labels()
                    .border_style(BLACK)
                    .position(SeriesLabelPosition::UpperLeft)
                    .background_style(WHITE.mix(0.85))
                    .label_font((FONT, 14))
                    .draw()
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
        }
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
