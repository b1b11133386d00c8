//! SVG rendering for [`Chart`]s.
//!
//! Categorical axes are drawn on a continuous range `[-0.5, n - 0.5]` with
//! one tick per integer and a formatter mapping the tick back to its label.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::charts::{BoxGroup, Chart, ChartData};
use crate::error::{DashboardError, Result};
use crate::stats::{Bin, Point};

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;
type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const SIZE: (u32, u32) = (720, 480);
const HEATMAP_SIZE: (u32, u32) = (720, 640);
const FONT: &str = "sans-serif";

const HIST_FILL: RGBColor = RGBColor(65, 105, 225);
const KDE_LINE: RGBColor = RGBColor(20, 40, 160);
const NAN_CELL: RGBColor = RGBColor(220, 220, 220);

/// Render one chart to a standalone SVG document.
pub fn render_svg(chart: &Chart) -> Result<String> {
    let size = match chart.data {
        ChartData::Heatmap { .. } => HEATMAP_SIZE,
        _ => SIZE,
    };
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw(&root, chart).map_err(|e| DashboardError::Render(e.to_string()))?;
    }
    Ok(svg)
}

fn draw(root: &Area<'_>, chart: &Chart) -> DrawResult {
    root.fill(&WHITE)?;
    match &chart.data {
        ChartData::Count { labels, counts } => {
            let values: Vec<f64> = counts.iter().map(|c| *c as f64).collect();
            draw_columns(root, chart, labels, &values)?
        }
        ChartData::Heatmap { labels, matrix } => draw_heatmap(root, chart, labels, matrix)?,
        ChartData::Histogram { bins, kde } => draw_histogram(root, chart, bins, kde)?,
        ChartData::Boxplot { groups } => draw_boxplot(root, chart, groups)?,
        ChartData::Bar { labels, values } => draw_bars(root, chart, labels, values)?,
    }
    root.present()?;
    Ok(())
}

/// Palette sampled from a diverging blue-red map, one color per category.
fn coolwarm(i: usize, n: usize) -> RGBColor {
    let t = if n <= 1 { 0.0 } else { i as f64 / (n - 1) as f64 };
    diverging(t * 2.0 - 1.0)
}

/// Diverging color for `v` in `[-1, 1]`: blue, through light gray, to red.
fn diverging(v: f64) -> RGBColor {
    const BLUE_END: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const RED_END: (f64, f64, f64) = (180.0, 4.0, 38.0);
    let v = v.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (MID, BLUE_END, -v)
    } else {
        (MID, RED_END, v)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

fn category_label(labels: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn upper_bound(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Vertical category columns starting at zero.
fn draw_columns(root: &Area<'_>, chart: &Chart, labels: &[String], values: &[f64]) -> DrawResult {
    let n = labels.len().max(1);
    let top = upper_bound(values.iter().cloned().fold(0.0, f64::max));
    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, (FONT, 22))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..top)?;

    let fmt = |v: &f64| category_label(labels, *v);
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&fmt)
        .y_label_formatter(&|v| format!("{v:.0}"))
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    ctx.draw_series(values.iter().enumerate().map(|(i, v)| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], coolwarm(i, n).filled())
    }))?;
    Ok(())
}

/// Horizontal bars, first label at the top.
fn draw_bars(root: &Area<'_>, chart: &Chart, labels: &[String], values: &[f64]) -> DrawResult {
    let n = labels.len().max(1);
    let right = upper_bound(values.iter().cloned().fold(0.0, f64::max));
    let reversed: Vec<String> = labels.iter().rev().cloned().collect();
    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, (FONT, 22))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(170)
        .build_cartesian_2d(0.0..right, -0.5..(n as f64 - 0.5))?;

    let fmt = |v: &f64| category_label(&reversed, *v);
    ctx.configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&fmt)
        .x_label_formatter(&|v| format!("{v:.2}"))
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    ctx.draw_series(values.iter().enumerate().map(|(i, v)| {
        let y = (n - 1 - i) as f64;
        Rectangle::new([(0.0, y - 0.4), (*v, y + 0.4)], coolwarm(i, n).filled())
    }))?;
    Ok(())
}

fn draw_heatmap(root: &Area<'_>, chart: &Chart, labels: &[String], matrix: &[Vec<f64>]) -> DrawResult {
    let n = labels.len().max(1);
    let hi = n as f64 - 0.5;
    let reversed: Vec<String> = labels.iter().rev().cloned().collect();
    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, (FONT, 22))
        .margin(16)
        .x_label_area_size(60)
        .y_label_area_size(170)
        .build_cartesian_2d(-0.5..hi, -0.5..hi)?;

    let x_fmt = |v: &f64| category_label(labels, *v);
    let y_fmt = |v: &f64| category_label(&reversed, *v);
    ctx.configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()?;

    let cells = matrix.iter().enumerate().flat_map(|(i, row)| {
        row.iter().enumerate().map(move |(j, r)| {
            let (x, y) = (j as f64, (n - 1 - i) as f64);
            (x, y, *r)
        })
    });
    let cells: Vec<(f64, f64, f64)> = cells.collect();

    ctx.draw_series(cells.iter().map(|(x, y, r)| {
        let color = if r.is_nan() { NAN_CELL } else { diverging(*r) };
        Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
    }))?;

    let annotation = (FONT, 14)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    ctx.draw_series(
        cells
            .iter()
            .filter(|(_, _, r)| !r.is_nan())
            .map(|(x, y, r)| Text::new(format!("{r:.2}"), (*x, *y), annotation.clone())),
    )?;
    Ok(())
}

fn draw_histogram(root: &Area<'_>, chart: &Chart, bins: &[Bin], kde: &[Point]) -> DrawResult {
    let (left, right) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (first.start, last.end),
        _ => (0.0, 1.0),
    };
    let peak = bins
        .iter()
        .map(|b| b.count as f64)
        .chain(kde.iter().map(|p| p.y))
        .fold(0.0, f64::max);
    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, (FONT, 22))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(left..right, 0.0..upper_bound(peak))?;

    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    ctx.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], HIST_FILL.mix(0.6).filled())
    }))?;
    ctx.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], WHITE.stroke_width(1))
    }))?;
    if !kde.is_empty() {
        ctx.draw_series(LineSeries::new(
            kde.iter().map(|p| (p.x, p.y)),
            KDE_LINE.stroke_width(2),
        ))?;
    }
    Ok(())
}

fn draw_boxplot(root: &Area<'_>, chart: &Chart, groups: &[BoxGroup]) -> DrawResult {
    let n = groups.len().max(1);
    let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
    let (lo, hi) = groups
        .iter()
        .flat_map(|g| {
            g.stats
                .outliers
                .iter()
                .copied()
                .chain([g.stats.whisker_low, g.stats.whisker_high])
        })
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let (lo, hi) = if lo.is_finite() && hi > lo {
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    } else if lo.is_finite() {
        (lo - 1.0, lo + 1.0)
    } else {
        (0.0, 1.0)
    };

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, (FONT, 22))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(-0.5..(n as f64 - 0.5), lo..hi)?;

    let fmt = |v: &f64| category_label(&labels, *v);
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&fmt)
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    for (i, group) in groups.iter().enumerate() {
        let s = &group.stats;
        let x = i as f64;
        let (l, r) = (x - 0.4, x + 0.4);
        ctx.draw_series(std::iter::once(Rectangle::new(
            [(l, s.q1), (r, s.q3)],
            coolwarm(i, n).filled(),
        )))?;
        ctx.draw_series(std::iter::once(Rectangle::new(
            [(l, s.q1), (r, s.q3)],
            BLACK.stroke_width(1),
        )))?;
        let lines = [
            vec![(l, s.median), (r, s.median)],
            vec![(x, s.q3), (x, s.whisker_high)],
            vec![(x, s.q1), (x, s.whisker_low)],
            vec![(x - 0.2, s.whisker_high), (x + 0.2, s.whisker_high)],
            vec![(x - 0.2, s.whisker_low), (x + 0.2, s.whisker_low)],
        ];
        ctx.draw_series(
            lines
                .into_iter()
                .map(|points| PathElement::new(points, BLACK.stroke_width(1))),
        )?;
        ctx.draw_series(
            s.outliers
                .iter()
                .map(|v| Circle::new((x, *v), 3, BLACK.stroke_width(1))),
        )?;
    }
    Ok(())
}
